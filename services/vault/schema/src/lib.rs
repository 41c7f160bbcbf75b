//! sea-orm entities for the vault database.

pub mod favorites;
pub mod gen_logs;
pub mod log_assets;
pub mod log_output_groups;
pub mod permissions;
pub mod role_permissions;
pub mod roles;
pub mod user_roles;
pub mod users;
