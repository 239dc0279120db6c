// Discord layer - command handlers, event reactors and embeds.
//
// Everything here translates between serenity types and the core services.

use crate::config::BotConfig;
use crate::core::commands::CommandRegistry;
use crate::core::leveling::LevelingService;
use crate::core::logging::MessageLogService;
use crate::core::moderation::{MuteScheduler, WarningService};
use crate::infra::leveling::SqliteExperienceStore;
use crate::infra::logging::SqliteMessageLogStore;
use crate::infra::moderation::SqliteWarningStore;
use std::sync::Arc;

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "logging/mod.rs"]
pub mod logging;

#[path = "leveling/leveling_announcements.rs"]
pub mod leveling_announcements;

#[path = "events/message_pipeline.rs"]
pub mod message_pipeline;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Shared state handed to every event reactor and command handler.
/// Built once in `main` and owned by the framework for the process lifetime.
pub struct Data {
    pub config: Arc<BotConfig>,
    pub commands: Arc<CommandRegistry>,
    pub leveling: Arc<LevelingService<SqliteExperienceStore>>,
    pub warnings: Arc<WarningService<SqliteWarningStore>>,
    pub message_log: Arc<MessageLogService<SqliteMessageLogStore>>,
    pub mutes: Arc<MuteScheduler>,
}
