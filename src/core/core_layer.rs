// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "leveling/leveling_service.rs"]
pub mod leveling;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "logging/mod.rs"]
pub mod logging;

#[path = "commands/command_registry.rs"]
pub mod commands;
