// Moderation domain models - argument parsing and outcomes for moderation commands.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts them into role changes, bans and bulk deletes.

use std::time::Duration;
use thiserror::Error;

/// Warnings that trigger an automatic ban.
pub const WARN_BAN_THRESHOLD: u32 = 5;

/// Largest amount `purge` accepts.
pub const MAX_PURGE: u32 = 100;

/// Most message ids a single bulk-delete call accepts.
pub const BULK_DELETE_LIMIT: usize = 100;

/// How long the purge confirmation stays visible.
pub const PURGE_CONFIRMATION_TTL: Duration = Duration::from_millis(5000);

/// Messages older than this can't be bulk deleted.
pub const BULK_DELETE_MAX_AGE: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Stored warning counter for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningRecord {
    pub user_id: u64,
    pub warnings: u32,
}

/// What a `warn` invocation resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarnOutcome {
    /// Counter was persisted at `total`.
    Warned { total: u32 },
    /// Threshold reached. The member must be banned; the incremented count
    /// was NOT written back, so the stored counter stays one below.
    BanThreshold { warnings: u32 },
}

/// Mute length as parsed from the `mute` duration token.
///
/// Parsing follows `<integer><unit>` with unit `s`, `m` or `h` (minutes when absent),
/// found anywhere in the token. Seconds round UP to whole minutes, so `90s` is 2 minutes.
/// A token without digits yields zero minutes, which means "no automatic unmute".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuteDuration {
    minutes: u64,
}

impl MuteDuration {
    pub fn parse(token: &str) -> Self {
        let Some(start) = token.find(|c: char| c.is_ascii_digit()) else {
            return Self { minutes: 0 };
        };
        let rest = &token[start..];
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());

        // Absurd digit runs saturate instead of failing the whole command
        let value: u64 = rest[..digits_end].parse().unwrap_or(u64::MAX);
        let unit = rest[digits_end..]
            .chars()
            .next()
            .map(|c| c.to_ascii_lowercase());

        let minutes = match unit {
            Some('h') => value.saturating_mul(60),
            Some('s') => value.div_ceil(60),
            _ => value,
        };

        Self { minutes }
    }

    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    /// Delay before the automatic unmute, `None` when the mute is indefinite.
    pub fn unmute_after(&self) -> Option<Duration> {
        if self.minutes == 0 {
            None
        } else {
            Some(Duration::from_secs(self.minutes.saturating_mul(60)))
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PurgeError {
    /// Not an integer, or outside 1..=100.
    #[error("Please provide a number between 1 and 100.")]
    OutOfRange,
}

/// A validated purge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeAmount(u32);

impl PurgeAmount {
    pub fn parse(arg: Option<&str>) -> Result<Self, PurgeError> {
        let amount: i64 = arg
            .and_then(|a| a.trim().parse().ok())
            .ok_or(PurgeError::OutOfRange)?;

        if amount < 1 || amount > MAX_PURGE as i64 {
            return Err(PurgeError::OutOfRange);
        }
        Ok(Self(amount as u32))
    }

    /// Messages requested by the moderator, excluding the command itself.
    pub fn requested(&self) -> u32 {
        self.0
    }
}

/// Ids a purge deletes: the fetched history still young enough to bulk delete,
/// followed by the invoking command. `history` is `(message_id, sent_at_unix)`.
pub fn purge_targets(history: &[(u64, i64)], command_id: u64, now_unix: i64) -> Vec<u64> {
    let cutoff = now_unix - BULK_DELETE_MAX_AGE.as_secs() as i64;
    history
        .iter()
        .filter(|(_, sent_at)| *sent_at > cutoff)
        .map(|(id, _)| *id)
        .chain(std::iter::once(command_id))
        .collect()
}

/// Split message ids into bulk-delete sized batches.
/// Batches of one must be deleted individually by the caller.
pub fn plan_bulk_delete(ids: &[u64]) -> Vec<Vec<u64>> {
    ids.chunks(BULK_DELETE_LIMIT).map(|c| c.to_vec()).collect()
}
