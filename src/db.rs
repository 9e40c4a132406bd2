mod schema;

use std::path::Path;

use rusqlite::{Connection, Transaction};
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use schema::INITIAL_SCHEMA;

/// Database wrapper providing connection management, schema initialization
/// and transaction boundaries.
///
/// Holds the single connection the store works against. After [`close`](Self::close)
/// every accessor reports [`StoreError::StorageUnavailable`].
pub struct Database {
    conn: Option<Connection>,
}

impl Database {
    /// Opens an in-memory SQLite database.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::StorageUnavailable(format!("in-memory database: {e}")))?;
        Self::initialize(conn, ":memory:")
    }

    /// Opens a file-based SQLite database at the given path.
    ///
    /// Creates the database file if it does not exist. Existing data is kept.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| StoreError::StorageUnavailable(format!("{}: {e}", path.display())))?;
        Self::initialize(conn, &path.display().to_string())
    }

    fn initialize(mut conn: Connection, location: &str) -> Result<Self> {
        initialize_schema(&mut conn).map_err(|e| {
            StoreError::StorageUnavailable(format!("{location}: schema initialization failed: {e}"))
        })?;
        info!(location, "database opened");
        Ok(Self { conn: Some(conn) })
    }

    /// Returns a reference to the underlying connection.
    ///
    /// Useful for executing custom queries in tests.
    pub fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(closed)
    }

    /// Begins a transaction.
    ///
    /// The transaction rolls back when dropped unless `commit()` is called.
    /// Nesting is not supported: the borrow on `self` rules it out.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        let conn = self.conn.as_mut().ok_or_else(closed)?;
        Ok(conn.transaction()?)
    }

    /// Runs `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`; rolls back and returns the original
    /// error otherwise.
    pub fn with_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let tx = self.transaction()?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, "rolling back transaction");
                if let Err(rollback) = tx.rollback() {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Closes the connection. Calling it again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| StoreError::Storage(e))?;
            debug!("database closed");
        }
        Ok(())
    }
}

/// Enables foreign keys, then creates every table and index in one transaction.
///
/// The pragma is a no-op inside a transaction, so it runs first.
fn initialize_schema(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    let tx = conn.transaction()?;
    tx.execute_batch(INITIAL_SCHEMA)?;
    tx.commit()
}

fn closed() -> StoreError {
    StoreError::StorageUnavailable("database is closed".to_string())
}
