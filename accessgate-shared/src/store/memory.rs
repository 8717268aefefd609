/// In-memory [`UserStore`]
///
/// Keeps records in a map keyed by email and enforces the same one-record-per-email
/// rule as the database constraint. It is used by the test suites and for
/// running the server locally without PostgreSQL.
///
/// Failure and latency can be injected to exercise the error paths of the
/// provisioning workflow:
///
/// ```
/// use accessgate_shared::store::{MemoryUserStore, UserStore};
/// use std::time::Duration;
///
/// # async fn example() {
/// let healthy = MemoryUserStore::new();
/// assert!(healthy.ping().await.is_ok());
///
/// let broken = MemoryUserStore::new().fail_inserts();
/// let slow = MemoryUserStore::new().with_latency(Duration::from_millis(50));
/// # }
/// ```

use super::{StoreError, StoreResult, UserStore};
use crate::models::user::{CreateUser, User};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    users: RwLock<HashMap<String, User>>,
    closed: AtomicBool,
    fail_lookups: AtomicBool,
    fail_inserts: AtomicBool,
    insert_attempts: AtomicUsize,
}

/// User store backed by a process-local map
#[derive(Debug, Clone, Default)]
pub struct MemoryUserStore {
    inner: Arc<Inner>,
    latency: Option<Duration>,
}

impl MemoryUserStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every lookup fail with a database error
    pub fn fail_lookups(self) -> Self {
        self.inner.fail_lookups.store(true, Ordering::SeqCst);
        self
    }

    /// Makes every insert fail with a database error
    pub fn fail_inserts(self) -> Self {
        self.inner.fail_inserts.store(true, Ordering::SeqCst);
        self
    }

    /// Delays every operation by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.inner.users.read().await.len()
    }

    /// Whether the store holds no users
    pub async fn is_empty(&self) -> bool {
        self.inner.users.read().await.is_empty()
    }

    /// Snapshot of every stored user
    pub async fn users(&self) -> Vec<User> {
        self.inner.users.read().await.values().cloned().collect()
    }

    /// Number of insert calls received, successful or not
    pub fn insert_attempts(&self) -> usize {
        self.inner.insert_attempts.load(Ordering::SeqCst)
    }

    async fn prepare(&self) -> StoreResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store closed".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.prepare().await?;

        if self.inner.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected lookup failure".to_string()));
        }

        Ok(self.inner.users.read().await.get(email).cloned())
    }

    async fn insert(&self, user: CreateUser) -> StoreResult<User> {
        self.inner.insert_attempts.fetch_add(1, Ordering::SeqCst);
        self.prepare().await?;

        if self.inner.fail_inserts.load(Ordering::SeqCst) {
            return Err(StoreError::Database("injected insert failure".to_string()));
        }

        let mut users = self.inner.users.write().await;
        if users.contains_key(&user.email) {
            return Err(StoreError::DuplicateEmail(user.email));
        }

        let record = User::from_create(user);
        users.insert(record.email.clone(), record.clone());

        Ok(record)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.prepare().await
    }

    async fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }
}
