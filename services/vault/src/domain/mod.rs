pub mod rbac;
pub mod repository;
pub mod types;
