// ABOUTME: In-memory database helpers for test suites
// ABOUTME: Single-connection pool so every caller sees the same memory database

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::db::MIGRATOR;

/// In-memory pool without the service schema
pub async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid in-memory url")
        .foreign_keys(true)
        .with_regexp();

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory database")
}

/// In-memory pool with every migration applied
pub async fn migrated_pool() -> SqlitePool {
    let pool = memory_pool().await;
    MIGRATOR.run(&pool).await.expect("migrations apply cleanly");
    pool
}
