//! The acting identity threaded through every store operation

use serde::Serialize;

use crate::models::{Role, User};

/// Authenticated caller of an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn new(id: i64, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        is_admin(self)
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.username.clone(), user.role)
    }
}

/// Pure admin predicate
pub fn is_admin(identity: &Identity) -> bool {
    identity.role == Role::Admin
}
