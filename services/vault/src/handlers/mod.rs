pub mod admin;
pub mod auth;
pub mod favorite;
pub mod health;
pub mod json;
pub mod log;
pub mod rbac;
pub mod tag;
