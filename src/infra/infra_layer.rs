// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "leveling/leveling_store.rs"]
pub mod leveling;

#[path = "moderation/sqlite_warning_store.rs"]
pub mod moderation;

#[path = "logging/sqlite_store.rs"]
pub mod logging;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Open the shared SQLite pool, creating the database file if it is missing.
pub async fn connect_pool(database_url: &str) -> anyhow::Result<Pool<Sqlite>> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    Ok(pool)
}

/// Fresh database in a temp dir. Keep the `TempDir` alive for the test's duration.
#[cfg(test)]
pub async fn test_pool() -> (tempfile::TempDir, Pool<Sqlite>) {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("test.db").display());
    let pool = connect_pool(&url).await.expect("test pool");
    (dir, pool)
}
