/// Database models for accessgate
///
/// # Models
///
/// - `user`: accounts provisioned from confirmed purchases
///
/// # Example
///
/// ```no_run
/// use accessgate_shared::models::user::{User, CreateUser};
/// use accessgate_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     name: "Ana Silva".to_string(),
///     email: "ana@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod user;
