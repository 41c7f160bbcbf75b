//! Permission resolution and the absolute guards of the RBAC graph.
//!
//! Everything here is pure: callers hand in fully loaded aggregates and get
//! answers back without touching the store.

use std::collections::HashSet;

use crate::domain::types::{Role, UserAggregate};
use crate::error::VaultError;

/// Union of permission names over every role `user` holds.
///
/// Grants are additive only; a user without roles resolves to the empty set.
pub fn resolve_permissions(user: &UserAggregate) -> HashSet<String> {
    user.roles
        .iter()
        .flat_map(|r| r.permissions.iter())
        .map(|p| p.name.clone())
        .collect()
}

pub fn has_permission(user: &UserAggregate, permission: &str) -> bool {
    user.roles
        .iter()
        .flat_map(|r| r.permissions.iter())
        .any(|p| p.name == permission)
}

/// The authenticated user making a request, with its resolved permission set.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user: UserAggregate,
    pub permissions: HashSet<String>,
}

impl Principal {
    pub fn new(user: UserAggregate) -> Self {
        let permissions = resolve_permissions(&user);
        Self { user, permissions }
    }

    pub fn id(&self) -> i32 {
        self.user.user.id
    }

    pub fn has(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Deny with [`VaultError::Forbidden`] naming the missing permission.
    pub fn require(&self, permission: &str) -> Result<(), VaultError> {
        if self.has(permission) {
            Ok(())
        } else {
            Err(VaultError::Forbidden(permission.to_owned()))
        }
    }

    /// Reject the operation when it targets the caller's own account.
    ///
    /// Holds regardless of the caller's permissions.
    pub fn ensure_not_self(&self, target_id: i32, error: VaultError) -> Result<(), VaultError> {
        if self.id() == target_id {
            Err(error)
        } else {
            Ok(())
        }
    }
}

/// System roles reject every mutation, whoever asks.
pub fn ensure_mutable(role: &Role) -> Result<(), VaultError> {
    if role.is_system {
        Err(VaultError::SystemRole)
    } else {
        Ok(())
    }
}

/// Match every requested name against what the store returned.
///
/// Returns the found items in request order (duplicates collapsed), or
/// `missing(name)` for the first requested name with no match.
pub fn resolve_names<T: Clone>(
    requested: &[String],
    found: &[T],
    name_of: impl Fn(&T) -> &str,
    missing: impl FnOnce(String) -> VaultError,
) -> Result<Vec<T>, VaultError> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(requested.len());
    for name in requested {
        if !seen.insert(name.as_str()) {
            continue;
        }
        match found.iter().find(|item| name_of(item) == name) {
            Some(item) => resolved.push(item.clone()),
            None => return Err(missing(name.clone())),
        }
    }
    Ok(resolved)
}
