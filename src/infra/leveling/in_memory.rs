// In-memory implementation of ExperienceStore.
//
// Used by the core tests so the leveling rules can be exercised without SQLite.

use crate::core::leveling::{ExperienceRecord, ExperienceStore, LevelingError};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Clone, Debug)]
struct StoredXp {
    xp: u64,
    /// Insertion order, so leaderboard ties behave like the SQL rowid ordering.
    seq: u64,
}

pub struct InMemoryExperienceStore {
    data: DashMap<u64, StoredXp>,
    next_seq: AtomicU64,
}

impl InMemoryExperienceStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }
}

impl Default for InMemoryExperienceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExperienceStore for InMemoryExperienceStore {
    async fn get_record(&self, user_id: u64) -> Result<Option<ExperienceRecord>, LevelingError> {
        Ok(self
            .data
            .get(&user_id)
            .map(|entry| ExperienceRecord::new(user_id, entry.xp)))
    }

    async fn increment_xp(
        &self,
        user_id: u64,
        amount: u64,
    ) -> Result<ExperienceRecord, LevelingError> {
        // entry() holds the shard lock, so the read-modify-write is atomic
        let mut entry = self.data.entry(user_id).or_insert_with(|| StoredXp {
            xp: 0,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        });
        entry.xp = entry.xp.saturating_add(amount);

        Ok(ExperienceRecord::new(user_id, entry.xp))
    }

    async fn top_records(&self, limit: usize) -> Result<Vec<ExperienceRecord>, LevelingError> {
        let mut users: Vec<(u64, StoredXp)> = self
            .data
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        users.sort_by(|a, b| b.1.xp.cmp(&a.1.xp).then(a.1.seq.cmp(&b.1.seq)));
        users.truncate(limit);

        Ok(users
            .into_iter()
            .map(|(user_id, stored)| ExperienceRecord::new(user_id, stored.xp))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn increments_accumulate() {
        let store = InMemoryExperienceStore::new();

        assert!(store.get_record(123).await.unwrap().is_none());

        store.increment_xp(123, 60).await.unwrap();
        let record = store.increment_xp(123, 50).await.unwrap();
        assert_eq!(record.xp, 110);
        assert_eq!(record.level, 1);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let store = InMemoryExperienceStore::new();

        store.increment_xp(3, 10).await.unwrap();
        store.increment_xp(1, 10).await.unwrap();
        store.increment_xp(2, 30).await.unwrap();

        let top: Vec<u64> = store
            .top_records(10)
            .await
            .unwrap()
            .iter()
            .map(|r| r.user_id)
            .collect();
        assert_eq!(top, vec![2, 3, 1]);
    }
}
