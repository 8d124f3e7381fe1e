//! # Session Commands
//!
//! Sign in and out. These are the only commands that run without a guard.

use serde::Deserialize;
use snack_core::{AuthProvider, User};
use tracing::debug;

use crate::error::ApiResult;
use crate::state::SessionState;

/// Credentials from the sign-in form.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Signs in.
///
/// ## Errors
/// `UNAUTHORIZED` for unknown users and wrong passwords alike.
pub fn login(session: &SessionState, request: LoginRequest) -> ApiResult<User> {
    debug!(username = %request.username, "login command");
    session.login(request.username.trim(), &request.password)
}

/// Signs out.
pub fn logout(session: &SessionState) {
    debug!("logout command");
    session.logout();
}

/// The signed-in user, if any.
pub fn current_user(session: &SessionState) -> Option<User> {
    session.current_user()
}
