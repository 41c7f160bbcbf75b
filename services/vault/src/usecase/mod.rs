pub mod admin;
pub mod auth;
pub mod favorite;
pub mod log;
pub mod rbac;
pub mod tag;
