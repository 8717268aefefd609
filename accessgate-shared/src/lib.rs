//! # accessgate Shared Library
//!
//! Domain logic behind the accessgate API server: turning a confirmed
//! purchase into a user account and verifying that account's credentials.
//!
//! ## Module Organization
//!
//! - `auth`: password generation, hashing and verification
//! - `db`: PostgreSQL pool and migrations
//! - `models`: the user record
//! - `store`: the `UserStore` seam with Postgres and in-memory implementations
//! - `notify`: the `Notifier` seam with SMTP and disabled implementations
//! - `provisioning`: the idempotent provisioning workflow and its background dispatcher

pub mod auth;
pub mod db;
pub mod models;
pub mod notify;
pub mod provisioning;
pub mod store;

/// Current version of the accessgate shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
