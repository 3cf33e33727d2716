//! # Condo Shared Library
//!
//! Types, persistence and domain logic shared by the condominium API server
//! and the maintenance worker.
//!
//! ## Module Organization
//!
//! - `db`: connection pool, migrations and list helpers
//! - `models`: database models and their CRUD operations
//! - `reservations`: common-area reservation admission (midnight-aware)
//! - `recognition`: face-search reconciliation and biometric enrollment
//! - `vendors`: contracts and HTTP clients for external services
//! - `notifications`: push notifications fired by domain events
//! - `dashboard`: financial aggregation queries
//! - `error`: domain error type

pub mod dashboard;
pub mod db;
pub mod error;
pub mod models;
pub mod notifications;
pub mod recognition;
pub mod reservations;
pub mod vendors;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
