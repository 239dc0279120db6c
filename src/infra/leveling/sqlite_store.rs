use crate::core::leveling::{ExperienceRecord, ExperienceStore, LevelingError};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteExperienceStore {
    pool: Pool<Sqlite>,
}

impl SqliteExperienceStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS experience (
                user_id INTEGER PRIMARY KEY,
                xp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 0
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> ExperienceRecord {
    // Level is recomputed rather than trusted, the column only mirrors it for queries
    ExperienceRecord::new(
        row.get::<i64, _>("user_id") as u64,
        row.get::<i64, _>("xp") as u64,
    )
}

#[async_trait]
impl ExperienceStore for SqliteExperienceStore {
    async fn get_record(&self, user_id: u64) -> Result<Option<ExperienceRecord>, LevelingError> {
        let row = sqlx::query("SELECT user_id, xp FROM experience WHERE user_id = ?")
            .bind(user_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LevelingError::StorageError(e.to_string()))?;

        Ok(row.as_ref().map(row_to_record))
    }

    async fn increment_xp(
        &self,
        user_id: u64,
        amount: u64,
    ) -> Result<ExperienceRecord, LevelingError> {
        // Single-statement UPSERT: the increment happens inside SQLite, so two
        // concurrent messages from the same user can't lose an update.
        let row = sqlx::query(
            r#"
            INSERT INTO experience (user_id, xp, level)
            VALUES (?1, ?2, ?2 / 100)
            ON CONFLICT(user_id) DO UPDATE SET
                xp = experience.xp + excluded.xp,
                level = (experience.xp + excluded.xp) / 100
            RETURNING user_id, xp
            "#,
        )
        .bind(user_id as i64)
        .bind(amount as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LevelingError::StorageError(e.to_string()))?;

        Ok(row_to_record(&row))
    }

    async fn top_records(&self, limit: usize) -> Result<Vec<ExperienceRecord>, LevelingError> {
        let rows = sqlx::query(
            "SELECT user_id, xp FROM experience ORDER BY xp DESC, rowid ASC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LevelingError::StorageError(e.to_string()))?;

        Ok(rows.iter().map(row_to_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::test_pool;

    #[tokio::test]
    async fn increment_creates_then_accumulates() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteExperienceStore::new(pool);
        store.migrate().await.unwrap();

        let first = store.increment_xp(10, 2).await.unwrap();
        assert_eq!(first.xp, 2);
        assert_eq!(first.level, 0);

        for _ in 0..49 {
            store.increment_xp(10, 2).await.unwrap();
        }
        let record = store.get_record(10).await.unwrap().unwrap();
        assert_eq!(record.xp, 100);
        assert_eq!(record.level, 1);
    }

    #[tokio::test]
    async fn leaderboard_orders_by_xp_then_insertion() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteExperienceStore::new(pool);
        store.migrate().await.unwrap();

        store.increment_xp(1, 500).await.unwrap();
        store.increment_xp(2, 300).await.unwrap();
        store.increment_xp(3, 700).await.unwrap();
        store.increment_xp(4, 300).await.unwrap();

        let board: Vec<u64> = store
            .top_records(10)
            .await
            .unwrap()
            .iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(board, vec![3, 1, 2, 4]);

        let top_two = store.top_records(2).await.unwrap();
        assert_eq!(top_two.len(), 2);
    }

    #[tokio::test]
    async fn missing_user_has_no_record() {
        let (_dir, pool) = test_pool().await;
        let store = SqliteExperienceStore::new(pool);
        store.migrate().await.unwrap();

        assert!(store.get_record(99).await.unwrap().is_none());
    }
}
