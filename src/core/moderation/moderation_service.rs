// Warning service - core business logic for the `warn` escalation.
//
// NO Discord dependencies here - just the counter rules.

use super::moderation_models::{WarnOutcome, WarningRecord, WARN_BAN_THRESHOLD};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait WarningStore: Send + Sync {
    async fn get_warnings(&self, user_id: u64) -> Result<Option<WarningRecord>, ModerationError>;

    /// Insert or overwrite the user's counter.
    async fn save_warnings(&self, record: WarningRecord) -> Result<(), ModerationError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct WarningService<S: WarningStore> {
    store: S,
    ban_threshold: u32,
}

impl<S: WarningStore> WarningService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ban_threshold: WARN_BAN_THRESHOLD,
        }
    }

    /// Record a warning against `user_id`.
    ///
    /// Once the incremented count reaches the threshold the caller must ban.
    /// On that branch the incremented value is deliberately not saved, so the
    /// stored counter stays at `threshold - 1` and every further warn bans again.
    pub async fn warn(&self, user_id: u64) -> Result<WarnOutcome, ModerationError> {
        let Some(existing) = self.store.get_warnings(user_id).await? else {
            self.store
                .save_warnings(WarningRecord {
                    user_id,
                    warnings: 1,
                })
                .await?;
            return Ok(WarnOutcome::Warned { total: 1 });
        };

        let warnings = existing.warnings.saturating_add(1);
        if warnings >= self.ban_threshold {
            return Ok(WarnOutcome::BanThreshold { warnings });
        }

        self.store
            .save_warnings(WarningRecord { user_id, warnings })
            .await?;
        Ok(WarnOutcome::Warned { total: warnings })
    }

    #[cfg(test)]
    pub async fn get_warnings(&self, user_id: u64) -> Result<u32, ModerationError> {
        Ok(self
            .store
            .get_warnings(user_id)
            .await?
            .map(|r| r.warnings)
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    #[derive(Default)]
    struct MemoryWarningStore {
        data: DashMap<u64, u32>,
    }

    #[async_trait]
    impl WarningStore for MemoryWarningStore {
        async fn get_warnings(
            &self,
            user_id: u64,
        ) -> Result<Option<WarningRecord>, ModerationError> {
            Ok(self.data.get(&user_id).map(|w| WarningRecord {
                user_id,
                warnings: *w,
            }))
        }

        async fn save_warnings(&self, record: WarningRecord) -> Result<(), ModerationError> {
            self.data.insert(record.user_id, record.warnings);
            Ok(())
        }
    }

    #[tokio::test]
    async fn fifth_warning_requests_ban() {
        let service = WarningService::new(MemoryWarningStore::default());

        for expected in 1..=4 {
            assert_eq!(
                service.warn(9).await.unwrap(),
                WarnOutcome::Warned { total: expected }
            );
        }

        assert_eq!(
            service.warn(9).await.unwrap(),
            WarnOutcome::BanThreshold { warnings: 5 }
        );
    }

    #[tokio::test]
    async fn banning_branch_skips_the_save() {
        let service = WarningService::new(MemoryWarningStore::default());
        for _ in 0..5 {
            service.warn(9).await.unwrap();
        }

        // Counter was never written on the banning call
        assert_eq!(service.get_warnings(9).await.unwrap(), 4);
        // so the next warn bans again
        assert_eq!(
            service.warn(9).await.unwrap(),
            WarnOutcome::BanThreshold { warnings: 5 }
        );
    }

    #[tokio::test]
    async fn users_are_counted_separately() {
        let service = WarningService::new(MemoryWarningStore::default());
        service.warn(1).await.unwrap();
        service.warn(1).await.unwrap();
        service.warn(2).await.unwrap();

        assert_eq!(service.get_warnings(1).await.unwrap(), 2);
        assert_eq!(service.get_warnings(2).await.unwrap(), 1);
        assert_eq!(service.get_warnings(3).await.unwrap(), 0);
    }
}
