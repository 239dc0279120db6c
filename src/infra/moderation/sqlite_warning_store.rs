// SQLite-backed warning counters for the `warn` command.

use crate::core::moderation::{ModerationError, WarningRecord, WarningStore};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteWarningStore {
    pool: Pool<Sqlite>,
}

impl SqliteWarningStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS warnings (
                user_id INTEGER PRIMARY KEY,
                warnings INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl WarningStore for SqliteWarningStore {
    async fn get_warnings(&self, user_id: u64) -> Result<Option<WarningRecord>, ModerationError> {
        let row = sqlx::query("SELECT warnings FROM warnings WHERE user_id = ?")
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(row.map(|row| WarningRecord {
            user_id,
            warnings: row.get::<i64, _>("warnings") as u32,
        }))
    }

    async fn save_warnings(&self, record: WarningRecord) -> Result<(), ModerationError> {
        sqlx::query(
            r#"
            INSERT INTO warnings (user_id, warnings)
            VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                warnings = excluded.warnings
            "#,
        )
        .bind(record.user_id as i64)
        .bind(record.warnings as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| ModerationError::StorageError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{WarnOutcome, WarningService};
    use crate::infra::test_pool;

    #[tokio::test]
    async fn save_overwrites_counter() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteWarningStore::new(pool);
        store.migrate().await.unwrap();

        assert!(store.get_warnings(1).await.unwrap().is_none());

        store
            .save_warnings(WarningRecord {
                user_id: 1,
                warnings: 3,
            })
            .await
            .unwrap();
        store
            .save_warnings(WarningRecord {
                user_id: 1,
                warnings: 4,
            })
            .await
            .unwrap();

        assert_eq!(store.get_warnings(1).await.unwrap().unwrap().warnings, 4);
    }

    #[tokio::test]
    async fn five_warns_against_sqlite_end_in_ban() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteWarningStore::new(pool);
        store.migrate().await.unwrap();
        let service = WarningService::new(store);

        let mut outcomes = Vec::new();
        for _ in 0..5 {
            outcomes.push(service.warn(77).await.unwrap());
        }

        assert_eq!(outcomes[3], WarnOutcome::Warned { total: 4 });
        assert_eq!(outcomes[4], WarnOutcome::BanThreshold { warnings: 5 });
    }
}
