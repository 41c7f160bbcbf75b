//! Framework-free domain types shared across the vault crates.

pub mod catalog;
pub mod pagination;
pub mod rbac;
