#![allow(async_fn_in_trait)]

use vault_domain::catalog::TagKind;
use vault_domain::pagination::PageRequest;

use crate::domain::types::{
    Favorite, FavoriteEntry, GenLog, GenLogChanges, LogDetail, LogFilter, NewGenLog, NewRole,
    NewUser, Permission, Role, RoleChanges, RoleWithPermissions, User, UserAggregate,
    UserChanges, UserFilter, UserStats,
};
use crate::error::VaultError;

/// Repository for accounts and their role links.
pub trait UserRepository: Send + Sync {
    /// Load a user with its roles and their permissions.
    async fn find_by_id(&self, id: i32) -> Result<Option<UserAggregate>, VaultError>;
    async fn find_by_username(&self, username: &str)
    -> Result<Option<UserAggregate>, VaultError>;
    async fn username_exists(&self, username: &str) -> Result<bool, VaultError>;
    async fn email_exists(&self, email: &str) -> Result<bool, VaultError>;

    /// Insert a user and its initial role links atomically.
    async fn create(&self, user: &NewUser, role_ids: &[i32]) -> Result<User, VaultError>;

    /// Newest first. Returns the page and the total matching count.
    async fn list(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> Result<(Vec<UserAggregate>, u64), VaultError>;

    /// Apply role replacement and active flag changes atomically.
    ///
    /// Fails with [`VaultError::UserNotFound`] if the row is gone by the time
    /// it is locked.
    async fn apply_changes(&self, id: i32, changes: &UserChanges) -> Result<(), VaultError>;

    async fn has_role(&self, user_id: i32, role_id: i32) -> Result<bool, VaultError>;
    async fn add_role(&self, user_id: i32, role_id: i32) -> Result<(), VaultError>;

    /// Delete a user. Role links and favorites cascade. Returns `true` if a row was deleted.
    async fn delete(&self, id: i32) -> Result<bool, VaultError>;

    async fn stats(&self) -> Result<UserStats, VaultError>;
}

/// Repository for roles and their permission links.
pub trait RoleRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<RoleWithPermissions>, VaultError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, VaultError>;
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Role>, VaultError>;

    /// Newest first, each with its permissions.
    async fn list(&self) -> Result<Vec<RoleWithPermissions>, VaultError>;

    /// Insert a non-system role and its permission links atomically.
    async fn create(&self, role: &NewRole, permission_ids: &[i32]) -> Result<i32, VaultError>;

    /// Fails with [`VaultError::RoleNotFound`] if the row is gone by the time
    /// it is locked.
    async fn update(&self, id: i32, changes: &RoleChanges) -> Result<(), VaultError>;

    /// Delete a role. Permission links cascade.
    ///
    /// Re-counts holders under a row lock and fails with
    /// [`VaultError::RoleInUse`] if any appeared since the caller checked, or
    /// [`VaultError::RoleNotFound`] if the row itself is gone.
    async fn delete(&self, id: i32) -> Result<(), VaultError>;

    /// Number of users holding the role.
    async fn count_holders(&self, id: i32) -> Result<u64, VaultError>;
}

/// Read-only access to the permission catalogue.
pub trait PermissionRepository: Send + Sync {
    /// Ordered by category, then name.
    async fn list(&self, category: Option<&str>) -> Result<Vec<Permission>, VaultError>;
    async fn find_by_names(&self, names: &[String]) -> Result<Vec<Permission>, VaultError>;
}

/// Repository for generation-log metadata.
pub trait LogRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<GenLog>, VaultError>;

    /// Load a log with its assets and output groups.
    async fn find_detail(&self, id: i32) -> Result<Option<LogDetail>, VaultError>;

    /// Newest first. Returns the page and the total matching count.
    async fn list(
        &self,
        filter: &LogFilter,
        page: PageRequest,
    ) -> Result<(Vec<GenLog>, u64), VaultError>;

    /// Insert a log with its assets and output groups atomically.
    async fn create(&self, log: &NewGenLog) -> Result<GenLog, VaultError>;
    async fn update(&self, id: i32, changes: &GenLogChanges) -> Result<(), VaultError>;

    /// Assets, output groups and favorites cascade. Returns `true` if a row was deleted.
    async fn delete(&self, id: i32) -> Result<bool, VaultError>;

    /// Sorted distinct non-blank values of one tag column.
    async fn distinct_tags(&self, kind: TagKind) -> Result<Vec<String>, VaultError>;

    /// `(tag, number of logs carrying it)` for one tag column.
    async fn tag_counts(&self, kind: TagKind) -> Result<Vec<(String, u64)>, VaultError>;
}

/// Repository for per-user log bookmarks.
pub trait FavoriteRepository: Send + Sync {
    async fn exists(&self, user_id: i32, log_id: i32) -> Result<bool, VaultError>;
    async fn create(&self, user_id: i32, log_id: i32) -> Result<Favorite, VaultError>;

    /// Returns `true` if a row was deleted.
    async fn delete(&self, user_id: i32, log_id: i32) -> Result<bool, VaultError>;

    /// Newest first, joined with the favorited log.
    async fn list(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<(Vec<FavoriteEntry>, u64), VaultError>;

    async fn count(&self, user_id: i32) -> Result<u64, VaultError>;
}

/// A math question handed to a client before register or login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captcha {
    pub id: String,
    pub question: String,
}

/// Issues single-use captchas and checks answers.
pub trait CaptchaStore: Send + Sync {
    fn issue(&self) -> Captcha;

    /// Consume the captcha `id`. Returns `true` only for a live captcha whose
    /// answer matches; the captcha is gone afterwards either way.
    fn verify(&self, id: &str, answer: &str) -> bool;
}
