//! # Identity and Role Checks
//!
//! The core never authenticates anyone. It receives a verified
//! `(user_id, role)` pair from an external collaborator and only decides
//! whether that role may run an operation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::Role;

/// A verified caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: i64, role: Role) -> Self {
        Identity { user_id, role }
    }
}

/// Roles allowed to commit sales and write quotations or margin ranges.
pub const SELLING_ROLES: &[Role] = &[Role::Admin, Role::Sales];

/// Roles allowed to restock.
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Every role; reads only need an identity.
pub const ANY_ROLE: &[Role] = &[Role::Admin, Role::Sales, Role::Viewer];

/// Checks that an identity is present and carries an allowed role.
///
/// ## Errors
/// - `Unauthenticated` when no identity was handed over
/// - `Forbidden` when the role is outside `allowed`
pub fn authorize<'a>(
    identity: Option<&'a Identity>,
    allowed: &[Role],
    operation: &str,
) -> CoreResult<&'a Identity> {
    let identity = identity.ok_or(CoreError::Unauthenticated)?;
    if !allowed.contains(&identity.role) {
        return Err(CoreError::Forbidden {
            role: identity.role.to_string(),
            operation: operation.to_string(),
        });
    }
    Ok(identity)
}
