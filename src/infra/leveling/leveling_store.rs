// Implementations for the XP ledger.

#[cfg(test)]
pub mod in_memory;
pub mod sqlite_store;

#[cfg(test)]
pub use in_memory::InMemoryExperienceStore;
pub use sqlite_store::SqliteExperienceStore;
