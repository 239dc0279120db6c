// This is the leveling module - it contains ALL the business logic for the XP ledger.
// Notice how this module has NO Discord-specific code (no serenity, no poise imports).
// It works with primitive types (u64) so the rules can be tested without a gateway.

use async_trait::async_trait;
use thiserror::Error;

/// XP awarded for every counted message.
pub const XP_PER_MESSAGE: u64 = 2;

/// XP needed per level. Level is always `xp / XP_PER_LEVEL`.
pub const XP_PER_LEVEL: u64 = 100;

/// Size of the `lb` leaderboard.
pub const LEADERBOARD_SIZE: usize = 10;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A user's XP ledger entry. One record per user across all guilds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceRecord {
    pub user_id: u64,
    pub xp: u64,
    pub level: u32,
}

impl ExperienceRecord {
    pub fn new(user_id: u64, xp: u64) -> Self {
        Self {
            user_id,
            xp,
            level: level_for_xp(xp),
        }
    }
}

/// Returned by the service when a message pushed the user over a level boundary,
/// so the Discord layer can announce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelUpEvent {
    pub user_id: u64,
    pub old_level: u32,
    pub new_level: u32,
    pub total_xp: u64,
}

/// Level is derived, never stored independently of XP.
pub fn level_for_xp(xp: u64) -> u32 {
    (xp / XP_PER_LEVEL) as u32
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum LevelingError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid user ID")]
    InvalidId,
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting the XP ledger.
#[async_trait]
pub trait ExperienceStore: Send + Sync {
    /// Fetch a user's record, `None` if they never sent a counted message.
    async fn get_record(&self, user_id: u64) -> Result<Option<ExperienceRecord>, LevelingError>;

    /// Add XP to a user's total, creating the record if needed, and return the
    /// updated record. Implementations must apply the increment atomically so
    /// two concurrent messages cannot both read the same starting value.
    async fn increment_xp(
        &self,
        user_id: u64,
        amount: u64,
    ) -> Result<ExperienceRecord, LevelingError>;

    /// Top records by XP, highest first. Ties keep storage (insertion) order.
    async fn top_records(&self, limit: usize) -> Result<Vec<ExperienceRecord>, LevelingError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct LevelingService<S: ExperienceStore> {
    store: S,
    xp_per_message: u64,
}

impl<S: ExperienceStore> LevelingService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            xp_per_message: XP_PER_MESSAGE,
        }
    }

    /// Award message XP and report a level-up if one happened.
    ///
    /// **Returns:**
    /// - `Ok(Some(LevelUpEvent))` if the user crossed a level boundary
    /// - `Ok(None)` if XP was awarded without a level change (including the first message)
    /// - `Err(...)` for storage errors
    pub async fn process_message(&self, user_id: u64) -> Result<Option<LevelUpEvent>, LevelingError> {
        if user_id == 0 {
            return Err(LevelingError::InvalidId);
        }

        let record = self.store.increment_xp(user_id, self.xp_per_message).await?;
        let old_level = level_for_xp(record.xp.saturating_sub(self.xp_per_message));

        if record.level > old_level {
            Ok(Some(LevelUpEvent {
                user_id,
                old_level,
                new_level: record.level,
                total_xp: record.xp,
            }))
        } else {
            Ok(None)
        }
    }

    pub async fn get_record(&self, user_id: u64) -> Result<Option<ExperienceRecord>, LevelingError> {
        self.store.get_record(user_id).await
    }

    pub async fn leaderboard(&self) -> Result<Vec<ExperienceRecord>, LevelingError> {
        self.store.top_records(LEADERBOARD_SIZE).await
    }

    /// XP gathered inside the current level, for progress bars.
    pub fn progress_in_level(&self, xp: u64) -> u64 {
        xp % XP_PER_LEVEL
    }
}
