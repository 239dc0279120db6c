// Discord commands module.
// Each command family gets its own file; `dispatcher` routes `!name` messages to them.

pub mod dispatcher;

pub mod help;

pub mod info;

pub mod leveling;

pub mod moderation;

pub mod presence;

pub mod server_stats;

pub use dispatcher::{dispatch_command, CommandContext};
