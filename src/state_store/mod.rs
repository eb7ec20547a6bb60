mod sqlite_state_store;

pub use sqlite_state_store::SqliteStateStore;

use anyhow::Result;

/// Key-value store for transient per-user state and collector watermarks.
///
/// Values here live outside the team database's consistency domain: writes are
/// last-writer-wins and carry no ordering guarantee relative to concurrent
/// profile edits.
pub trait StateStore: Send + Sync {
    /// Returns the value for the key, or Ok(None) if absent.
    fn get_state(&self, key: &str) -> Result<Option<String>>;

    /// Unconditionally overwrites the value for the key.
    fn set_state(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the key. Removing an absent key is not an error.
    fn delete_state(&self, key: &str) -> Result<()>;
}
