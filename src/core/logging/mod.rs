// Message log: proactive snapshots for `stalk` lookups and ghost-ping detection.

pub mod logging_models;
pub mod logging_service;

pub use logging_models::*;
pub use logging_service::*;
