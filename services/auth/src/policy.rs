//! Ownership-based authorization
//!
//! A caller may change a resource when it is an admin or when it created the
//! resource. Resources with no recorded creator are admin-only.

use common::{ServiceError, ServiceResult};
use tracing::warn;

use crate::identity::Identity;

/// Decide whether `acting` may update or delete a resource owned by `owner_id`
pub fn can_mutate(acting: &Identity, owner_id: Option<i64>) -> bool {
    acting.is_admin() || owner_id == Some(acting.id)
}

/// Like [`can_mutate`], surfacing a refusal as an authorization error
pub fn ensure_can_mutate(
    acting: &Identity,
    owner_id: Option<i64>,
    resource: &str,
) -> ServiceResult<()> {
    if can_mutate(acting, owner_id) {
        return Ok(());
    }

    warn!(
        "User {} ({}) denied access to {}",
        acting.id, acting.role, resource
    );
    Err(ServiceError::forbidden(format!(
        "You are not allowed to modify this {}",
        resource
    )))
}

/// Refuse anyone but an admin
pub fn ensure_admin(acting: &Identity) -> ServiceResult<()> {
    if acting.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::forbidden("Admin privileges required"))
    }
}
