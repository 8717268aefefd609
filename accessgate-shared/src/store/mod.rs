/// User record storage
///
/// The provisioning workflow and the login route only ever see the
/// [`UserStore`] trait. The concrete client is built once at startup and
/// injected, so tests can swap in [`MemoryUserStore`] without a database.
///
/// # Implementations
///
/// - [`PgUserStore`]: PostgreSQL via a shared sqlx pool
/// - [`MemoryUserStore`]: in-process map with the same uniqueness rule
///
/// # Uniqueness
///
/// At most one record exists per email. An insert for an email that is
/// already present fails with [`StoreError::DuplicateEmail`]; callers treat
/// that as "already provisioned" rather than as a failure.

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

use crate::models::user::{CreateUser, User};
use async_trait::async_trait;

/// Errors surfaced by a [`UserStore`]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with this email already exists
    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),

    /// The backing database reported an error
    #[error("Database error: {0}")]
    Database(String),

    /// The store did not answer in time
    #[error("Store operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The store has been closed or is otherwise unreachable
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence of user records keyed by normalized email
///
/// Failures are returned to the caller as hard errors; implementations do
/// not retry.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user by normalized email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DuplicateEmail`] if the email is already taken.
    async fn insert(&self, user: CreateUser) -> StoreResult<User>;

    /// Checks that the store is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Releases the underlying connections during shutdown
    async fn close(&self) {}
}
