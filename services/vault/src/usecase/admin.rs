use anyhow::Context as _;
use tracing::info;

use vault_auth_types::password::hash_password;
use vault_domain::pagination::{Page, PageRequest};
use vault_domain::rbac::permissions::{USER_DELETE, USER_EDIT, USER_MANAGE_ROLES, USER_VIEW};
use vault_domain::rbac::roles;

use crate::domain::rbac::{Principal, resolve_names};
use crate::domain::repository::{RoleRepository, UserRepository};
use crate::domain::types::{
    NewUser, UserAggregate, UserChanges, UserFilter, UserStats, validate_password,
    validate_username,
};
use crate::error::VaultError;

// ── ListUsers ────────────────────────────────────────────────────────────────

pub struct ListUsersUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> ListUsersUseCase<U> {
    pub async fn execute(
        &self,
        actor: &Principal,
        filter: UserFilter,
        page: PageRequest,
    ) -> Result<Page<UserAggregate>, VaultError> {
        actor.require(USER_VIEW)?;
        let page = page.clamped();
        let (users, total) = self.users.list(&filter, page).await?;
        Ok(Page::new(users, total, page))
    }
}

// ── GetUser ──────────────────────────────────────────────────────────────────

pub struct GetUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> GetUserUseCase<U> {
    pub async fn execute(&self, actor: &Principal, id: i32) -> Result<UserAggregate, VaultError> {
        actor.require(USER_VIEW)?;
        self.users
            .find_by_id(id)
            .await?
            .ok_or(VaultError::UserNotFound)
    }
}

// ── UpdateUser ───────────────────────────────────────────────────────────────

pub struct UpdateUserInput {
    /// Full replacement of the user's roles, by name.
    pub role_names: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// Admin edits of another user's roles and active flag.
///
/// Check order: self-target, permissions, existence, role names. Nothing is
/// written unless every check passes, and the writes land in one transaction.
pub struct UpdateUserUseCase<U: UserRepository, R: RoleRepository> {
    pub users: U,
    pub roles: R,
}

impl<U: UserRepository, R: RoleRepository> UpdateUserUseCase<U, R> {
    pub async fn execute(
        &self,
        actor: &Principal,
        id: i32,
        input: UpdateUserInput,
    ) -> Result<UserAggregate, VaultError> {
        actor.ensure_not_self(id, VaultError::SelfModification)?;
        actor.require(USER_EDIT)?;
        if input.role_names.is_some() {
            actor.require(USER_MANAGE_ROLES)?;
        }

        let current = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(VaultError::UserNotFound)?;

        let role_ids = match input.role_names {
            Some(ref names) => {
                let found = self.roles.find_by_names(names).await?;
                let resolved =
                    resolve_names(names, &found, |r| r.name.as_str(), VaultError::UnknownRole)?;
                Some(resolved.iter().map(|r| r.id).collect())
            }
            None => None,
        };

        let changes = UserChanges {
            role_ids,
            is_active: input.is_active,
        };
        if changes == UserChanges::default() {
            return Ok(current);
        }
        self.users.apply_changes(id, &changes).await?;
        info!(
            actor_id = actor.id(),
            user_id = id,
            roles = ?input.role_names,
            is_active = ?input.is_active,
            "user updated"
        );

        self.users
            .find_by_id(id)
            .await?
            .ok_or(VaultError::UserNotFound)
    }

    /// Replace every role `id` holds with the named roles.
    pub async fn replace_roles(
        &self,
        actor: &Principal,
        id: i32,
        role_names: Vec<String>,
    ) -> Result<UserAggregate, VaultError> {
        self.execute(
            actor,
            id,
            UpdateUserInput {
                role_names: Some(role_names),
                is_active: None,
            },
        )
        .await
    }

    pub async fn set_active(
        &self,
        actor: &Principal,
        id: i32,
        is_active: bool,
    ) -> Result<UserAggregate, VaultError> {
        self.execute(
            actor,
            id,
            UpdateUserInput {
                role_names: None,
                is_active: Some(is_active),
            },
        )
        .await
    }
}

// ── DeleteUser ───────────────────────────────────────────────────────────────

pub struct DeleteUserUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> DeleteUserUseCase<U> {
    pub async fn execute(&self, actor: &Principal, id: i32) -> Result<(), VaultError> {
        actor.ensure_not_self(id, VaultError::SelfDeletion)?;
        actor.require(USER_DELETE)?;
        if !self.users.delete(id).await? {
            return Err(VaultError::UserNotFound);
        }
        info!(actor_id = actor.id(), user_id = id, "user deleted");
        Ok(())
    }
}

// ── AssignRole ───────────────────────────────────────────────────────────────

/// Add one role to a user. Used by provisioning paths, not by the admin API.
pub struct AssignRoleUseCase<U: UserRepository, R: RoleRepository> {
    pub users: U,
    pub roles: R,
}

impl<U: UserRepository, R: RoleRepository> AssignRoleUseCase<U, R> {
    pub async fn execute(&self, user_id: i32, role_id: i32) -> Result<(), VaultError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(VaultError::UserNotFound);
        }
        if self.roles.find_by_id(role_id).await?.is_none() {
            return Err(VaultError::RoleNotFound);
        }
        if self.users.has_role(user_id, role_id).await? {
            return Err(VaultError::RoleAlreadyAssigned);
        }
        self.users.add_role(user_id, role_id).await
    }
}

// ── UserStats ────────────────────────────────────────────────────────────────

pub struct UserStatsUseCase<U: UserRepository> {
    pub users: U,
}

impl<U: UserRepository> UserStatsUseCase<U> {
    pub async fn execute(&self, actor: &Principal) -> Result<UserStats, VaultError> {
        actor.require(USER_VIEW)?;
        self.users.stats().await
    }
}

// ── InitAdmin ────────────────────────────────────────────────────────────────

pub struct InitAdminInput {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitAdminOutcome {
    /// Some user already holds `admin`; nothing was changed.
    AlreadyProvisioned,
    /// The configured user existed and was given `admin`.
    Promoted { user_id: i32 },
    /// The configured user was created with `admin`.
    Created { user_id: i32 },
}

/// Idempotent bootstrap of the first administrator.
///
/// Fails with [`VaultError::RoleNotFound`] when the `admin` role has not been
/// seeded yet.
pub struct InitAdminUseCase<U, R>
where
    U: UserRepository + Clone,
    R: RoleRepository + Clone,
{
    pub users: U,
    pub roles: R,
}

impl<U, R> InitAdminUseCase<U, R>
where
    U: UserRepository + Clone,
    R: RoleRepository + Clone,
{
    pub async fn execute(&self, input: InitAdminInput) -> Result<InitAdminOutcome, VaultError> {
        let admin = self
            .roles
            .find_by_name(roles::ADMIN)
            .await?
            .ok_or(VaultError::RoleNotFound)?;
        if self.roles.count_holders(admin.id).await? > 0 {
            return Ok(InitAdminOutcome::AlreadyProvisioned);
        }

        if let Some(existing) = self.users.find_by_username(&input.username).await? {
            let user_id = existing.user.id;
            let assign = AssignRoleUseCase {
                users: self.users.clone(),
                roles: self.roles.clone(),
            };
            match assign.execute(user_id, admin.id).await {
                Ok(()) | Err(VaultError::RoleAlreadyAssigned) => {}
                Err(e) => return Err(e),
            }
            info!(user_id, "existing user promoted to admin");
            return Ok(InitAdminOutcome::Promoted { user_id });
        }

        validate_username(&input.username)?;
        validate_password(&input.password)?;
        let hashed_password = hash_password(&input.password).context("hash password")?;
        let user = self
            .users
            .create(
                &NewUser {
                    username: input.username,
                    email: input.email.filter(|e| !e.trim().is_empty()),
                    hashed_password,
                },
                &[admin.id],
            )
            .await?;
        info!(user_id = user.id, "admin user created");
        Ok(InitAdminOutcome::Created { user_id: user.id })
    }
}
