use super::logging_models::{DeletedMessageRecord, DeletedSnapshot, GhostPing};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;

// Cap how many live messages we keep in memory for ghost-ping detection.
const MAX_TRACKED_MESSAGES: usize = 5_000;

#[derive(Debug, Error)]
pub enum MessageLogError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

#[async_trait]
pub trait MessageLogStore: Send + Sync {
    async fn insert(&self, record: DeletedMessageRecord) -> Result<(), MessageLogError>;

    /// Most recent snapshot written for `author_id`.
    async fn latest_for_author(
        &self,
        author_id: u64,
    ) -> Result<Option<DeletedMessageRecord>, MessageLogError>;

    /// Delete snapshots recorded before `cutoff`, returning how many went.
    async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, MessageLogError>;
}

pub struct MessageLogService<S: MessageLogStore> {
    store: S,
    /// Snapshots of live messages keyed by message id, so a delete can still be
    /// inspected after the gateway cache has dropped the message.
    recent: DashMap<u64, DeletedSnapshot>,
}

impl<S: MessageLogStore> MessageLogService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            recent: DashMap::new(),
        }
    }

    /// Keep an in-memory snapshot of a live message for delete handling.
    pub fn track_recent(&self, message_id: u64, snapshot: DeletedSnapshot) {
        self.recent.insert(message_id, snapshot);

        // Simple eviction: drop an arbitrary entry once we cross the cap.
        if self.recent.len() > MAX_TRACKED_MESSAGES {
            // The shard guard held by the iterator must be gone before `remove`.
            let first_key = self.recent.iter().next().map(|entry| *entry.key());
            if let Some(key) = first_key {
                self.recent.remove(&key);
            }
        }
    }

    /// Apply an edit to a tracked snapshot so a later delete sees the edited
    /// mentions. Returns false when the message is not tracked.
    pub fn refresh_recent(
        &self,
        message_id: u64,
        content: Option<&str>,
        mentions: Option<Vec<u64>>,
    ) -> bool {
        match self.recent.get_mut(&message_id) {
            Some(mut snapshot) => {
                snapshot.apply_edit(content, mentions);
                true
            }
            None => false,
        }
    }

    /// Remove and return the tracked snapshot of a deleted message.
    pub fn take_recent(&self, message_id: u64) -> Option<DeletedSnapshot> {
        self.recent.remove(&message_id).map(|(_, snapshot)| snapshot)
    }

    /// Persist a snapshot of a freshly sent message. Empty content is skipped.
    pub async fn remember_message(
        &self,
        message_id: u64,
        channel_id: u64,
        author_id: u64,
        content: &str,
    ) -> Result<bool, MessageLogError> {
        if content.is_empty() {
            return Ok(false);
        }

        self.store
            .insert(DeletedMessageRecord {
                message_id,
                channel_id,
                author_id,
                content: content.to_string(),
                recorded_at: Utc::now(),
            })
            .await?;
        Ok(true)
    }

    pub async fn latest_for_author(
        &self,
        author_id: u64,
    ) -> Result<Option<DeletedMessageRecord>, MessageLogError> {
        self.store.latest_for_author(author_id).await
    }

    pub async fn prune_older_than(&self, age: chrono::Duration) -> Result<u64, MessageLogError> {
        self.store.prune_before(Utc::now() - age).await
    }
}

/// Decide whether a deleted message was a ghost ping.
///
/// Fires only when the message was in the monitored channel, still had text
/// content in the cache, and mentioned at least one user.
pub fn detect_ghost_ping(
    snapshot: &DeletedSnapshot,
    monitored_channel_id: Option<u64>,
) -> Option<GhostPing> {
    if monitored_channel_id != Some(snapshot.channel_id) {
        return None;
    }
    if snapshot.content.is_empty() || snapshot.mentioned_user_ids.is_empty() {
        return None;
    }

    Some(GhostPing {
        channel_id: snapshot.channel_id,
        author_id: snapshot.author_id,
        author_tag: snapshot.author_tag.clone(),
        mentioned_user_ids: snapshot.mentioned_user_ids.clone(),
        detected_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct VecStore {
        records: Mutex<Vec<DeletedMessageRecord>>,
    }

    #[async_trait]
    impl MessageLogStore for VecStore {
        async fn insert(&self, record: DeletedMessageRecord) -> Result<(), MessageLogError> {
            self.records.lock().await.push(record);
            Ok(())
        }

        async fn latest_for_author(
            &self,
            author_id: u64,
        ) -> Result<Option<DeletedMessageRecord>, MessageLogError> {
            Ok(self
                .records
                .lock()
                .await
                .iter()
                .rev()
                .find(|r| r.author_id == author_id)
                .cloned())
        }

        async fn prune_before(&self, cutoff: DateTime<Utc>) -> Result<u64, MessageLogError> {
            let mut records = self.records.lock().await;
            let before = records.len();
            records.retain(|r| r.recorded_at >= cutoff);
            Ok((before - records.len()) as u64)
        }
    }

    fn snapshot(channel_id: u64, content: &str, mentions: Vec<u64>) -> DeletedSnapshot {
        DeletedSnapshot {
            channel_id,
            author_id: 5,
            author_tag: "someone".to_string(),
            content: content.to_string(),
            mentioned_user_ids: mentions,
        }
    }

    #[test]
    fn ghost_ping_requires_all_conditions() {
        let monitored = Some(100);

        let ping = detect_ghost_ping(&snapshot(100, "hey <@7>", vec![7]), monitored).unwrap();
        assert_eq!(ping.mentioned_user_ids, vec![7]);
        assert_eq!(ping.mention_list(), "<@7>");

        // wrong channel
        assert!(detect_ghost_ping(&snapshot(101, "hey <@7>", vec![7]), monitored).is_none());
        // no text content left in cache
        assert!(detect_ghost_ping(&snapshot(100, "", vec![7]), monitored).is_none());
        // no mentions
        assert!(detect_ghost_ping(&snapshot(100, "hello", vec![]), monitored).is_none());
        // detection disabled
        assert!(detect_ghost_ping(&snapshot(100, "hey <@7>", vec![7]), None).is_none());
    }

    #[test]
    fn mention_list_joins_all_targets() {
        let ping = detect_ghost_ping(&snapshot(1, "<@2> <@3>", vec![2, 3]), Some(1)).unwrap();
        assert_eq!(ping.mention_list(), "<@2>, <@3>");
    }

    #[tokio::test]
    async fn latest_snapshot_wins() {
        let service = MessageLogService::new(VecStore::default());

        assert!(service.remember_message(1, 10, 5, "first").await.unwrap());
        assert!(service.remember_message(2, 10, 5, "second").await.unwrap());
        assert!(service.remember_message(3, 10, 6, "other").await.unwrap());

        let latest = service.latest_for_author(5).await.unwrap().unwrap();
        assert_eq!(latest.content, "second");
        assert!(service.latest_for_author(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_messages_are_not_logged() {
        let service = MessageLogService::new(VecStore::default());
        assert!(!service.remember_message(1, 10, 5, "").await.unwrap());
        assert!(service.latest_for_author(5).await.unwrap().is_none());
    }

    #[test]
    fn tracked_snapshot_is_taken_once() {
        let service = MessageLogService::new(VecStore::default());
        service.track_recent(42, snapshot(100, "hey <@7>", vec![7]));

        let taken = service.take_recent(42).unwrap();
        assert_eq!(taken.mentioned_user_ids, vec![7]);
        assert!(service.take_recent(42).is_none());
        assert!(service.take_recent(43).is_none());
    }

    #[test]
    fn edit_that_adds_a_mention_is_caught_on_delete() {
        let service = MessageLogService::new(VecStore::default());
        service.track_recent(42, snapshot(100, "hello", vec![]));

        assert!(service.refresh_recent(42, Some("hello <@7>"), Some(vec![7])));

        let deleted = service.take_recent(42).unwrap();
        let ping = detect_ghost_ping(&deleted, Some(100)).unwrap();
        assert_eq!(ping.mentioned_user_ids, vec![7]);
    }

    #[test]
    fn edit_that_drops_the_mention_is_not_a_ghost_ping() {
        let service = MessageLogService::new(VecStore::default());
        service.track_recent(42, snapshot(100, "hey <@7>", vec![7]));

        assert!(service.refresh_recent(42, Some("hey"), Some(vec![])));

        let deleted = service.take_recent(42).unwrap();
        assert_eq!(deleted.content, "hey");
        assert!(detect_ghost_ping(&deleted, Some(100)).is_none());
    }

    #[test]
    fn partial_edit_keeps_missing_fields() {
        let mut tracked = snapshot(100, "hey <@7>", vec![7]);
        assert!(tracked.apply_edit(Some("hey <@7>!"), None));
        assert_eq!(tracked.mentioned_user_ids, vec![7]);
        assert!(!tracked.apply_edit(None, Some(vec![7])));
    }

    #[test]
    fn untracked_edit_is_reported() {
        let service = MessageLogService::new(VecStore::default());
        assert!(!service.refresh_recent(9, Some("late edit"), None));
        assert!(service.take_recent(9).is_none());
    }

    #[test]
    fn tracking_is_bounded() {
        let service = MessageLogService::new(VecStore::default());
        for id in 0..(MAX_TRACKED_MESSAGES as u64 + 10) {
            service.track_recent(id, snapshot(1, "x", vec![]));
        }
        assert_eq!(service.recent.len(), MAX_TRACKED_MESSAGES);
    }

    #[tokio::test]
    async fn prune_keeps_recent_snapshots() {
        let service = MessageLogService::new(VecStore::default());
        service.remember_message(1, 10, 5, "fresh").await.unwrap();

        let pruned = service
            .prune_older_than(chrono::Duration::days(1))
            .await
            .unwrap();
        assert_eq!(pruned, 0);
        assert!(service.latest_for_author(5).await.unwrap().is_some());
    }
}
