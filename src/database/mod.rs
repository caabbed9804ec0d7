//! SQLite storage for the customer flow report engine.
//!
//! ## Architecture
//!
//! The `Database` struct directly implements every storage trait, one
//! module per area:
//! - `ActivityOperations` - customer activity history (classification source)
//! - `SnapshotOperations` - per-period delta snapshots
//! - `DirtyPeriodOperations` - the recomputation queue
//! - `StatisticsOperations` - statistics and reporting

mod activity;
mod dirty;
pub mod query_helper; // Query helper utilities for common patterns
pub mod schema;
mod snapshots;
pub mod statistics;
pub mod traits;

// Re-export the main types and traits
pub use query_helper::QueryHelper;
pub use schema::setup_schema;
pub use statistics::DatabaseStats;
pub use traits::*;

use crate::errors::AppResult;
use rusqlite::Connection;
use tracing::info;

/// The main database interface that implements all storage traits.
///
/// Holds a single SQLite connection; callers that need concurrent access
/// open one `Database` per thread against the same file.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Open (or create) a database and initialise the schema
    ///
    /// `":memory:"` gives a private in-memory database.
    pub fn new(database_path: &str) -> AppResult<Self> {
        let connection = Connection::open(database_path)?;

        // Initialise the schema
        setup_schema(&connection)?;

        info!("Database initialised at: {}", database_path);
        Ok(Self { connection })
    }

    /// Get a reference to the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Execute a function within a database transaction
    pub fn execute_transaction<F, R>(&mut self, f: F) -> AppResult<R>
    where
        F: FnOnce(&rusqlite::Transaction) -> AppResult<R>,
    {
        let tx = self.connection.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}
