/// PostgreSQL-backed [`UserStore`]
///
/// Wraps the process-wide `PgPool`. Cloning is cheap and every clone shares
/// the same pool.
///
/// # Example
///
/// ```no_run
/// use accessgate_shared::db::pool::{create_pool, DatabaseConfig};
/// use accessgate_shared::store::{PgUserStore, UserStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store = PgUserStore::new(pool);
///
/// let user = store.find_by_email("ana@example.com").await?;
/// store.close().await;
/// # Ok(())
/// # }
/// ```

use super::{StoreError, StoreResult, UserStore};
use crate::db::pool;
use crate::models::user::{CreateUser, User, EMAIL_UNIQUE_CONSTRAINT};
use async_trait::async_trait;
use sqlx::PgPool;

/// User store over a shared PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Creates a store over an already connected pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Borrows the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        User::find_by_email(&self.pool, email)
            .await
            .map_err(StoreError::from)
    }

    async fn insert(&self, user: CreateUser) -> StoreResult<User> {
        let email = user.email.clone();

        User::create(&self.pool, user).await.map_err(|err| {
            if is_email_conflict(&err) {
                StoreError::DuplicateEmail(email)
            } else {
                StoreError::from(err)
            }
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        pool::health_check(&self.pool)
            .await
            .map_err(StoreError::from)
    }

    async fn close(&self) {
        pool::close_pool(&self.pool).await;
    }
}

/// Whether an insert failed on the one-account-per-email constraint
fn is_email_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation()
                && db_err
                    .constraint()
                    .map_or(true, |constraint| constraint == EMAIL_UNIQUE_CONSTRAINT)
        }
        _ => false,
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => StoreError::Unavailable("connection pool closed".to_string()),
            sqlx::Error::PoolTimedOut => {
                StoreError::Unavailable("timed out acquiring a connection".to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}
