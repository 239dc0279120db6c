// Core moderation module - warning escalation, mute timing and purge rules.

pub mod moderation_models;
pub mod moderation_service;
pub mod moderation_targets;
pub mod mute_scheduler;

pub use moderation_models::*;
pub use moderation_service::*;
pub use moderation_targets::*;
pub use mute_scheduler::{MuteKey, MuteScheduler};
