use chrono::{DateTime, Utc};

/// Snapshot of a sent message, written proactively so it can be looked up
/// after the message is gone. Content is captured at send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedMessageRecord {
    pub message_id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    pub content: String,
    pub recorded_at: DateTime<Utc>,
}

/// What the platform cache still knew about a message when it was deleted.
#[derive(Debug, Clone)]
pub struct DeletedSnapshot {
    pub channel_id: u64,
    pub author_id: u64,
    pub author_tag: String,
    pub content: String,
    pub mentioned_user_ids: Vec<u64>,
}

impl DeletedSnapshot {
    /// Fold an edit into the snapshot. Fields the edit leaves out keep their
    /// old value. Returns whether anything changed.
    pub fn apply_edit(&mut self, content: Option<&str>, mentions: Option<Vec<u64>>) -> bool {
        let mut changed = false;
        if let Some(content) = content {
            if self.content != content {
                self.content = content.to_string();
                changed = true;
            }
        }
        if let Some(mentions) = mentions {
            if self.mentioned_user_ids != mentions {
                self.mentioned_user_ids = mentions;
                changed = true;
            }
        }
        changed
    }
}

/// A detected ghost ping, ready to be rendered as an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostPing {
    pub channel_id: u64,
    pub author_id: u64,
    pub author_tag: String,
    pub mentioned_user_ids: Vec<u64>,
    pub detected_at: DateTime<Utc>,
}

impl GhostPing {
    /// `<@id>, <@id>` list of everyone the deleted message pinged.
    pub fn mention_list(&self) -> String {
        self.mentioned_user_ids
            .iter()
            .map(|id| format!("<@{}>", id))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
