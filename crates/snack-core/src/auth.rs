//! # Auth Collaborator
//!
//! The workflows never check who is calling. The command layer asks an
//! [`AuthProvider`] before invoking them.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// What a signed-in user may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including every mutation.
    Admin,
    /// Read-only access to lists and reports.
    #[default]
    Viewer,
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// "Is this caller authorized?"
pub trait AuthProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;

    fn current_user(&self) -> Option<User>;
}

/// A provider that always answers with the same user (or nobody).
///
/// Used by maintenance tools and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth(pub Option<User>);

impl StaticAuth {
    pub fn admin(username: &str) -> Self {
        StaticAuth(Some(User {
            id: username.to_string(),
            username: username.to_string(),
            role: Role::Admin,
        }))
    }

    pub fn anonymous() -> Self {
        StaticAuth(None)
    }
}

impl AuthProvider for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    fn current_user(&self) -> Option<User> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_auth() {
        let auth = StaticAuth::admin("ana");
        assert!(auth.is_authenticated());
        assert!(auth.current_user().unwrap().is_admin());

        let nobody = StaticAuth::anonymous();
        assert!(!nobody.is_authenticated());
        assert!(nobody.current_user().is_none());
    }
}
