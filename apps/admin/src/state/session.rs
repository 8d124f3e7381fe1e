//! # Session State
//!
//! Who is signed in. Implements [`AuthProvider`] so the command guards can
//! ask "is this caller authorized?" without knowing how sign-in works.
//!
//! Users come from `admin_users` in the config; passwords are checked
//! against argon2 PHC hashes.

use std::sync::RwLock;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use snack_core::{AuthProvider, User};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::ConfiguredUser;

/// Current session plus the users allowed to open one.
#[derive(Debug, Default)]
pub struct SessionState {
    users: Vec<ConfiguredUser>,
    current: RwLock<Option<User>>,
}

impl SessionState {
    pub fn new(users: Vec<ConfiguredUser>) -> Self {
        SessionState {
            users,
            current: RwLock::new(None),
        }
    }

    /// Signs in, replacing any previous session.
    ///
    /// ## Errors
    /// `UNAUTHORIZED` for an unknown user or a wrong password. The message
    /// does not say which.
    pub fn login(&self, username: &str, password: &str) -> ApiResult<User> {
        let entry = self
            .users
            .iter()
            .find(|u| u.username == username)
            .filter(|u| verify_password(password, &u.password_hash));

        let Some(entry) = entry else {
            warn!(%username, "Sign-in rejected");
            return Err(ApiError::new(
                ErrorCode::Unauthorized,
                "Invalid username or password",
            ));
        };

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: entry.username.clone(),
            role: entry.role,
        };
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Some(user.clone());

        info!(%username, role = ?user.role, "Signed in");
        Ok(user)
    }

    /// Ends the session. Signing out twice is harmless.
    pub fn logout(&self) {
        let previous = self.current.write().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(user) = previous {
            info!(username = %user.username, "Signed out");
        }
    }
}

impl AuthProvider for SessionState {
    fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn current_user(&self) -> Option<User> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Checks a password against a PHC hash. Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hashes a password for `admin_users[].password_hash`.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}
