use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::ErrorCode;

use crate::core::config;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Initializes a connection pool with up to 10 connections and runs schema
/// migrations on the first connection.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
///
/// # Example
///
/// ```no_run
/// use remeslo::storage::db;
///
/// let pool = db::create_pool("database.sqlite")?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn create_pool(database_path: &str) -> anyhow::Result<DbPool> {
    let manager = SqliteConnectionManager::file(database_path);
    let pool = Pool::builder()
        .max_size(10) // Maximum 10 connections in the pool
        .build(manager)?;

    // Ensure schema is up to date before anyone touches the pool
    let mut conn = pool.get()?;
    super::migrations::run_migrations(&mut conn)?;

    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is automatically returned to the pool when dropped.
pub fn get_connection(pool: &DbPool) -> Result<DbConnection, r2d2::Error> {
    pool.get()
}

/// Выполняет операцию с повтором при блокировке базы.
///
/// SQLite под BEGIN IMMEDIATE может вернуть `SQLITE_BUSY`, если другой
/// процесс держит write-lock. Повторяем до `retry::MAX_ATTEMPTS` раз с
/// линейной задержкой между попытками.
pub async fn with_busy_retry<T, F>(mut op: F) -> crate::core::AppResult<T>
where
    F: FnMut() -> crate::core::AppResult<T>,
{
    let mut attempt = 1;
    loop {
        match op() {
            Err(crate::core::AppError::Database(err)) if is_busy(&err) && attempt < config::retry::MAX_ATTEMPTS => {
                log::warn!("database is locked, retrying (attempt {attempt})");
                tokio::time::sleep(config::retry::backoff(attempt)).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AppError;

    #[tokio::test]
    async fn busy_retry_gives_up_after_max_attempts() {
        let mut calls = 0;
        let result: crate::core::AppResult<()> = with_busy_retry(|| {
            calls += 1;
            Err(AppError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
                None,
            )))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, crate::core::config::retry::MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn busy_retry_passes_through_success() {
        let result = with_busy_retry(|| Ok(42)).await;
        assert_eq!(result.ok(), Some(42));
    }
}
