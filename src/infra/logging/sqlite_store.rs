use crate::core::logging::{DeletedMessageRecord, MessageLogError, MessageLogStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteMessageLogStore {
    pool: Pool<Sqlite>,
}

impl SqliteMessageLogStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS message_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id INTEGER NOT NULL,
                channel_id INTEGER NOT NULL,
                author_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_message_log_author ON message_log(author_id, recorded_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl MessageLogStore for SqliteMessageLogStore {
    async fn insert(&self, record: DeletedMessageRecord) -> Result<(), MessageLogError> {
        sqlx::query(
            r#"
            INSERT INTO message_log (message_id, channel_id, author_id, content, recorded_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.message_id as i64)
        .bind(record.channel_id as i64)
        .bind(record.author_id as i64)
        .bind(record.content)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| MessageLogError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn latest_for_author(
        &self,
        author_id: u64,
    ) -> Result<Option<DeletedMessageRecord>, MessageLogError> {
        // id breaks ties between snapshots recorded in the same instant
        let row = sqlx::query(
            r#"
            SELECT message_id, channel_id, author_id, content, recorded_at
            FROM message_log
            WHERE author_id = ?
            ORDER BY recorded_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(author_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| MessageLogError::StorageError(e.to_string()))?;

        Ok(row.map(|row| DeletedMessageRecord {
            message_id: row.get::<i64, _>("message_id") as u64,
            channel_id: row.get::<i64, _>("channel_id") as u64,
            author_id: row.get::<i64, _>("author_id") as u64,
            content: row.get("content"),
            recorded_at: row.get::<DateTime<Utc>, _>("recorded_at"),
        }))
    }

    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, MessageLogError> {
        let result = sqlx::query("DELETE FROM message_log WHERE recorded_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| MessageLogError::StorageError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::test_pool;

    fn record(message_id: u64, author_id: u64, content: &str, recorded_at: DateTime<Utc>) -> DeletedMessageRecord {
        DeletedMessageRecord {
            message_id,
            channel_id: 55,
            author_id,
            content: content.to_string(),
            recorded_at,
        }
    }

    #[tokio::test]
    async fn returns_most_recent_snapshot_for_author() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteMessageLogStore::new(pool);
        store.migrate().await.unwrap();

        let now = Utc::now();
        store
            .insert(record(1, 7, "older", now - chrono::Duration::minutes(5)))
            .await
            .unwrap();
        store.insert(record(2, 7, "newer", now)).await.unwrap();
        store.insert(record(3, 8, "someone else", now)).await.unwrap();

        let latest = store.latest_for_author(7).await.unwrap().unwrap();
        assert_eq!(latest.message_id, 2);
        assert_eq!(latest.content, "newer");
        assert_eq!(latest.channel_id, 55);

        assert!(store.latest_for_author(9).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn prune_removes_only_old_rows() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteMessageLogStore::new(pool);
        store.migrate().await.unwrap();

        let now = Utc::now();
        store
            .insert(record(1, 7, "ancient", now - chrono::Duration::days(30)))
            .await
            .unwrap();
        store.insert(record(2, 8, "fresh", now)).await.unwrap();

        let removed = store
            .prune_before(now - chrono::Duration::days(7))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.latest_for_author(7).await.unwrap().is_none());
        assert!(store.latest_for_author(8).await.unwrap().is_some());
    }
}
