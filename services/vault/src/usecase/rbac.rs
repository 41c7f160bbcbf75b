use tracing::info;

use vault_domain::rbac::permissions::{ROLE_CREATE, ROLE_DELETE, ROLE_EDIT, ROLE_VIEW};

use crate::domain::rbac::{Principal, ensure_mutable, resolve_names};
use crate::domain::repository::{PermissionRepository, RoleRepository};
use crate::domain::types::{
    NewRole, Permission, RoleChanges, RoleWithPermissions, validate_role_name,
};
use crate::error::VaultError;

async fn resolve_permission_ids<P: PermissionRepository>(
    permissions: &P,
    names: &[String],
) -> Result<Vec<i32>, VaultError> {
    let found = permissions.find_by_names(names).await?;
    let resolved = resolve_names(
        names,
        &found,
        |p| p.name.as_str(),
        VaultError::UnknownPermission,
    )?;
    Ok(resolved.iter().map(|p| p.id).collect())
}

// ── ListPermissions ──────────────────────────────────────────────────────────

pub struct ListPermissionsUseCase<P: PermissionRepository> {
    pub permissions: P,
}

impl<P: PermissionRepository> ListPermissionsUseCase<P> {
    pub async fn execute(
        &self,
        actor: &Principal,
        category: Option<&str>,
    ) -> Result<Vec<Permission>, VaultError> {
        actor.require(ROLE_VIEW)?;
        self.permissions.list(category).await
    }
}

// ── ListRoles / GetRole ──────────────────────────────────────────────────────

pub struct ListRolesUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> ListRolesUseCase<R> {
    pub async fn execute(&self, actor: &Principal) -> Result<Vec<RoleWithPermissions>, VaultError> {
        actor.require(ROLE_VIEW)?;
        self.roles.list().await
    }
}

pub struct GetRoleUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> GetRoleUseCase<R> {
    pub async fn execute(
        &self,
        actor: &Principal,
        id: i32,
    ) -> Result<RoleWithPermissions, VaultError> {
        actor.require(ROLE_VIEW)?;
        self.roles
            .find_by_id(id)
            .await?
            .ok_or(VaultError::RoleNotFound)
    }
}

// ── CreateRole ───────────────────────────────────────────────────────────────

pub struct CreateRoleInput {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub permission_names: Vec<String>,
}

pub struct CreateRoleUseCase<R: RoleRepository, P: PermissionRepository> {
    pub roles: R,
    pub permissions: P,
}

impl<R: RoleRepository, P: PermissionRepository> CreateRoleUseCase<R, P> {
    pub async fn execute(
        &self,
        actor: &Principal,
        input: CreateRoleInput,
    ) -> Result<RoleWithPermissions, VaultError> {
        actor.require(ROLE_CREATE)?;
        validate_role_name(&input.name)?;
        if input.display_name.trim().is_empty() {
            return Err(VaultError::InvalidInput("display name is required".into()));
        }
        if self.roles.find_by_name(&input.name).await?.is_some() {
            return Err(VaultError::RoleNameTaken);
        }
        let permission_ids =
            resolve_permission_ids(&self.permissions, &input.permission_names).await?;

        let id = self
            .roles
            .create(
                &NewRole {
                    name: input.name.clone(),
                    display_name: input.display_name,
                    description: input.description,
                },
                &permission_ids,
            )
            .await?;
        info!(actor_id = actor.id(), role_id = id, name = %input.name, "role created");

        self.roles
            .find_by_id(id)
            .await?
            .ok_or(VaultError::RoleNotFound)
    }
}

// ── UpdateRole ───────────────────────────────────────────────────────────────

pub struct UpdateRoleInput {
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// Full replacement of the role's permissions, by name.
    pub permission_names: Option<Vec<String>>,
}

pub struct UpdateRoleUseCase<R: RoleRepository, P: PermissionRepository> {
    pub roles: R,
    pub permissions: P,
}

impl<R: RoleRepository, P: PermissionRepository> UpdateRoleUseCase<R, P> {
    pub async fn execute(
        &self,
        actor: &Principal,
        id: i32,
        input: UpdateRoleInput,
    ) -> Result<RoleWithPermissions, VaultError> {
        actor.require(ROLE_EDIT)?;
        let current = self
            .roles
            .find_by_id(id)
            .await?
            .ok_or(VaultError::RoleNotFound)?;
        ensure_mutable(&current.role)?;

        if let Some(ref display_name) = input.display_name {
            if display_name.trim().is_empty() {
                return Err(VaultError::InvalidInput("display name is required".into()));
            }
        }
        let permission_ids = match input.permission_names {
            Some(ref names) => Some(resolve_permission_ids(&self.permissions, names).await?),
            None => None,
        };

        self.roles
            .update(
                id,
                &RoleChanges {
                    display_name: input.display_name,
                    description: input.description,
                    permission_ids,
                },
            )
            .await?;
        info!(actor_id = actor.id(), role_id = id, "role updated");

        self.roles
            .find_by_id(id)
            .await?
            .ok_or(VaultError::RoleNotFound)
    }
}

// ── DeleteRole ───────────────────────────────────────────────────────────────

pub struct DeleteRoleUseCase<R: RoleRepository> {
    pub roles: R,
}

impl<R: RoleRepository> DeleteRoleUseCase<R> {
    pub async fn execute(&self, actor: &Principal, id: i32) -> Result<(), VaultError> {
        actor.require(ROLE_DELETE)?;
        let current = self
            .roles
            .find_by_id(id)
            .await?
            .ok_or(VaultError::RoleNotFound)?;
        ensure_mutable(&current.role)?;

        let holders = self.roles.count_holders(id).await?;
        if holders > 0 {
            return Err(VaultError::RoleInUse(holders));
        }
        self.roles.delete(id).await?;
        info!(actor_id = actor.id(), role_id = id, name = %current.role.name, "role deleted");
        Ok(())
    }
}
