pub mod config;
pub mod connection;
pub mod ledger;
pub mod schema;
pub mod table;
pub mod transfer;

use std::sync::Arc;

pub use pfstore_core::{
    Dialect, MatchPolicy, Order, PfidEntry, Predicate, Row, Selector, StorageError, TableKind,
    TableSpec, TableStore, Value,
};

pub use config::{Config, DatabaseConfig, DatabaseKind};
pub use connection::{ConnectionManager, TxnScope};
pub use ledger::LedgerStore;
pub use schema::SchemaManager;
pub use table::PfidTable;
pub use transfer::TransferCoordinator;

/// The storage service: one shared connection and the stores built on it.
///
/// Construction performs no I/O; the connection opens on `connect` or
/// lazily on first use.
pub struct Storage {
    conn: Arc<ConnectionManager>,
    pub schema: SchemaManager,
    pub ledger: LedgerStore,
    pub transfers: TransferCoordinator,
    pub pfids: PfidTable,
}

impl Storage {
    pub fn new(config: DatabaseConfig) -> Self {
        let conn = Arc::new(ConnectionManager::new(config));
        Self {
            schema: SchemaManager::new(conn.clone()),
            ledger: LedgerStore::new(conn.clone()),
            transfers: TransferCoordinator::new(conn.clone()),
            pfids: PfidTable::new(conn.clone()),
            conn,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.database.clone())
    }

    pub fn connect(&self) -> Result<(), StorageError> {
        self.conn.connect()
    }

    pub fn disconnect(&self) -> Result<(), StorageError> {
        self.conn.disconnect()
    }

    pub fn ping(&self) -> Result<(), StorageError> {
        self.conn.ping()
    }

    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.conn
    }
}
