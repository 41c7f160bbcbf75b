//! Test utilities for vault services.
//!
//! Import in tests only, never in production code.

pub mod auth;
