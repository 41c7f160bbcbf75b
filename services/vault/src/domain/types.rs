use chrono::{DateTime, Utc};

use vault_domain::catalog::{AssetType, LogType, TITLE_MAX_LEN};
use vault_domain::rbac::ROLE_NAME_MAX_LEN;

use crate::error::VaultError;

// ── Accounts ─────────────────────────────────────────────────────────────────

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: Option<String>,
    pub hashed_password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of an account about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub hashed_password: String,
}

/// A user together with every role it holds and each role's permissions.
///
/// This is the fully materialized shape permission resolution works on; no
/// lazy loading happens behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAggregate {
    pub user: User,
    pub roles: Vec<RoleWithPermissions>,
}

impl UserAggregate {
    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.role.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring of username or email.
    pub search: Option<String>,
    /// Restrict to holders of this role name.
    pub role: Option<String>,
}

/// Row changes applied to one user in a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    /// Full replacement of the user's role set.
    pub role_ids: Option<Vec<i32>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub total_users: u64,
    pub active_users: u64,
    /// `(role name, holder count)` for every role, including unheld ones.
    pub role_counts: Vec<(String, u64)>,
}

pub fn validate_username(username: &str) -> Result<(), VaultError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(VaultError::InvalidInput(format!(
            "username must be {USERNAME_MIN_LEN}-{USERNAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), VaultError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(VaultError::InvalidInput(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    Ok(())
}

// ── Roles & permissions ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_system: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub id: i32,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleWithPermissions {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl RoleWithPermissions {
    pub fn permission_names(&self) -> Vec<String> {
        self.permissions.iter().map(|p| p.name.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
}

/// Role row changes. `permission_ids` is a full replacement when present.
#[derive(Debug, Clone, Default)]
pub struct RoleChanges {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub permission_ids: Option<Vec<i32>>,
}

pub fn validate_role_name(name: &str) -> Result<(), VaultError> {
    if name.trim().is_empty() || name.chars().count() > ROLE_NAME_MAX_LEN {
        return Err(VaultError::InvalidInput(format!(
            "role name must be 1-{ROLE_NAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenLog {
    pub id: i32,
    pub title: String,
    pub log_type: LogType,
    pub tools: Vec<String>,
    pub models: Vec<String>,
    pub prompt: Option<String>,
    pub params_note: Option<String>,
    /// Links logs that ran the same subject on different tools or models.
    pub comparison_group_id: Option<i32>,
    pub is_nsfw: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reference to a stored image. The bytes live in object storage under `file_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogAsset {
    pub id: i32,
    pub log_id: i32,
    pub file_key: String,
    pub asset_type: AssetType,
    pub note: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// One tool/model combination whose outputs are shown together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputGroup {
    pub id: i32,
    pub log_id: i32,
    pub tools: Vec<String>,
    pub models: Vec<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// A log with its attachments, each list in `sort_order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDetail {
    pub log: GenLog,
    pub assets: Vec<LogAsset>,
    pub output_groups: Vec<OutputGroup>,
}

impl LogDetail {
    pub fn assets_of(&self, asset_type: AssetType) -> impl Iterator<Item = &LogAsset> {
        self.assets.iter().filter(move |a| a.asset_type == asset_type)
    }
}

#[derive(Debug, Clone)]
pub struct NewLogAsset {
    pub file_key: String,
    pub asset_type: AssetType,
    pub note: Option<String>,
    /// Position among assets of the same type.
    pub sort_order: i32,
}

#[derive(Debug, Clone)]
pub struct NewOutputGroup {
    pub tools: Option<Vec<String>>,
    pub models: Option<Vec<String>>,
    pub sort_order: i32,
}

/// A log and its attachment rows, inserted together.
#[derive(Debug, Clone)]
pub struct NewGenLog {
    pub title: String,
    pub log_type: LogType,
    pub tools: Option<Vec<String>>,
    pub models: Option<Vec<String>>,
    pub prompt: Option<String>,
    pub params_note: Option<String>,
    pub comparison_group_id: Option<i32>,
    pub is_nsfw: bool,
    pub assets: Vec<NewLogAsset>,
    pub output_groups: Vec<NewOutputGroup>,
}

/// Partial log update. For the tag lists, `Some(None)` clears the column.
#[derive(Debug, Clone, Default)]
pub struct GenLogChanges {
    pub title: Option<String>,
    pub log_type: Option<LogType>,
    pub tools: Option<Option<Vec<String>>>,
    pub models: Option<Option<Vec<String>>>,
    pub prompt: Option<String>,
    pub params_note: Option<String>,
    pub comparison_group_id: Option<i32>,
    pub is_nsfw: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub search: Option<String>,
    pub log_type: Option<LogType>,
    pub tool: Option<String>,
    pub model: Option<String>,
}

pub fn validate_title(title: &str) -> Result<(), VaultError> {
    if title.trim().is_empty() || title.chars().count() > TITLE_MAX_LEN {
        return Err(VaultError::InvalidInput(format!(
            "title must be 1-{TITLE_MAX_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_file_key(file_key: &str) -> Result<(), VaultError> {
    if file_key.trim().is_empty() {
        return Err(VaultError::InvalidInput("file_key must not be empty".to_owned()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favorite {
    pub id: i32,
    pub user_id: i32,
    pub log_id: i32,
    pub created_at: DateTime<Utc>,
}

/// A favorite joined with the log it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteEntry {
    pub favorite: Favorite,
    pub log: GenLog,
}
