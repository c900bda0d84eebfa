//! SQLite storage implementation

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use rusqlite::Connection;
use crate::{Error, Result};
use super::{ConnectionSource, StakeholderStore, schema};

/// Busy timeout applied to every opened connection
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed storage for stakeholders and their relations.
///
/// Owns its connection; callers share it through `Arc<SqliteStore>`.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self::from_connection(conn)?;
        tracing::debug!("Opened stakeholder database at {}", path.display());
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        configure_connection(&conn)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        self.with_conn(|conn| {
            for stmt in schema::all_schema_statements() {
                conn.execute(stmt, [])?;
            }
            Ok(())
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| Error::ConnectionPoisoned)
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}

impl ConnectionSource for SqliteStore {
    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }
}

impl StakeholderStore for SqliteStore {
    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StakeholderStore) -> Result<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let result = f(&TxScope::new(&tx));
        match result {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    tracing::error!("Rollback failed: {}", rollback_err);
                }
                tracing::debug!("Transaction rolled back: {}", err);
                Err(err)
            }
        }
    }
}

/// Store view bound to an open transaction.
pub struct TxScope<'a> {
    conn: &'a Connection,
}

impl<'a> TxScope<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ConnectionSource for TxScope<'_> {
    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        f(self.conn)
    }
}

impl StakeholderStore for TxScope<'_> {
    fn in_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StakeholderStore) -> Result<T>,
    {
        f(self)
    }
}
