// Deferred unmute bookkeeping.
//
// Each pending unmute is a spawned task keyed by (guild, user). Keeping the
// abort handle lets a manual unmute, a re-mute, or the member leaving cancel
// the timer instead of letting it fire against stale state.

use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;

#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub struct MuteKey {
    pub guild_id: u64,
    pub user_id: u64,
}

struct PendingUnmute {
    ticket: u64,
    handle: AbortHandle,
}

pub struct MuteScheduler {
    pending: Arc<DashMap<MuteKey, PendingUnmute>>,
    next_ticket: AtomicU64,
}

impl MuteScheduler {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Run `action` after `delay` unless cancelled first.
    /// Scheduling over an existing key replaces (and aborts) the older timer.
    pub fn schedule<F>(&self, key: MuteKey, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::clone(&self.pending);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Drop our own entry first; a newer ticket under the same key stays put.
            pending.remove_if(&key, |_, p| p.ticket == ticket);
            action.await;
        });

        let entry = PendingUnmute {
            ticket,
            handle: task.abort_handle(),
        };
        if let Some(previous) = self.pending.insert(key, entry) {
            previous.handle.abort();
            tracing::debug!(
                guild_id = key.guild_id,
                user_id = key.user_id,
                "Replaced pending unmute"
            );
        }
    }

    /// Cancel the pending unmute for `key`. Returns whether one was pending.
    pub fn cancel(&self, key: MuteKey) -> bool {
        match self.pending.remove(&key) {
            Some((_, pending)) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn is_pending(&self, key: MuteKey) -> bool {
        self.pending.contains_key(&key)
    }
}

impl Default for MuteScheduler {
    fn default() -> Self {
        Self::new()
    }
}
