//! # Taskify Shared Library
//!
//! This crate contains the data models, query engine, and authentication
//! primitives used by the Taskify API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models, the role-scoped task query engine, and the
//!   append-only activity log
//! - `auth`: JWT issuance/verification and password hashing
//! - `db`: Connection pool and schema migrations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskify shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
