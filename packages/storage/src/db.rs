// ABOUTME: SQLite pool bootstrap, embedded migrations and schema introspection
// ABOUTME: Connecting retries with exponential backoff until the database is reachable

use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::retry::{with_retry, RetryConfig};

/// Versioned schema shipped with the service
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connection settings for the service database
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
    pub retry: RetryConfig,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            busy_timeout_seconds: 30,
            retry: RetryConfig::default(),
        }
    }

    fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    fn connect_options(&self) -> StorageResult<SqliteConnectOptions> {
        let options = SqliteConnectOptions::from_str(&self.url)
            .map_err(StorageError::Sqlx)?
            .create_if_missing(true)
            .foreign_keys(true)
            .with_regexp()
            .busy_timeout(Duration::from_secs(self.busy_timeout_seconds));

        if self.is_in_memory() {
            return Ok(options);
        }

        Ok(options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal))
    }
}

/// Open a pool, retrying while the database is unreachable
pub async fn connect(config: &DatabaseConfig) -> StorageResult<SqlitePool> {
    let options = config.connect_options()?;
    debug!("Connecting to database: {}", config.url);

    let pool = with_retry(&config.retry, "Database connection", || {
        SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options.clone())
    })
    .await
    .map_err(StorageError::Sqlx)?;

    info!("Database connection established");
    Ok(pool)
}

/// Apply any pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> StorageResult<()> {
    MIGRATOR.run(pool).await.map_err(StorageError::Migration)?;
    debug!("Database migrations completed");
    Ok(())
}

/// Connect and bring the schema up to date
pub async fn init(config: &DatabaseConfig) -> StorageResult<SqlitePool> {
    let pool = connect(config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Names of the application tables, excluding SQLite and migration bookkeeping
pub async fn list_tables(pool: &SqlitePool) -> StorageResult<Vec<String>> {
    sqlx::query_scalar(
        r#"
        SELECT name FROM sqlite_master
        WHERE type = 'table'
          AND name NOT LIKE 'sqlite_%'
          AND name NOT LIKE '_sqlx_%'
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(StorageError::Sqlx)
}
