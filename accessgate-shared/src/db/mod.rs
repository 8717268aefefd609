/// Database layer for accessgate
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks and shutdown
/// - `migrations`: embedded schema migrations
///
/// The user model lives in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
