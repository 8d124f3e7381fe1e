//! # Database State
//!
//! Wraps the `Database` handle for the command layer.
//!
//! The `Database` from `snack-db` holds a `SqlitePool`, which is already
//! thread-safe; commands share it without extra locking.

use snack_db::Database;

/// Wrapper around `Database` for state management.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let snacks = db_state.inner().snacks().search("dor").await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
