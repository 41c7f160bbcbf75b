//! Credential layer shared across vault binaries.
//!
//! Provides JWT issue/validation, bearer-header parsing and password hashing.

pub mod bearer;
pub mod password;
pub mod token;
