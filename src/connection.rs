use std::sync::{Mutex, MutexGuard};

use pfstore_core::{Dialect, Driver, DriverError, Row, StorageError, Value};

use crate::config::{DatabaseConfig, DatabaseKind};

/// Owns the single shared database connection and its lifecycle.
///
/// The handle lives behind a mutex holding `Option<Box<dyn Driver>>`;
/// a `TxnScope` keeps the guard for its whole lifetime, so no two
/// transactions can ever interleave statements on the connection.
pub struct ConnectionManager {
    config: DatabaseConfig,
    handle: Mutex<Option<Box<dyn Driver>>>,
}

impl ConnectionManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            handle: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn Driver>>> {
        self.handle.lock().unwrap()
    }

    fn open_driver(config: &DatabaseConfig) -> Result<Box<dyn Driver>, StorageError> {
        let driver: Box<dyn Driver> = match config.kind {
            DatabaseKind::Sqlite => Box::new(
                pfstore_sqlite::SqliteDriver::open(&config.sqlite_path())
                    .map_err(|e| StorageError::Connection(e.to_string()))?,
            ),
            DatabaseKind::Mysql => Box::new(
                pfstore_mysql::MysqlDriver::connect(
                    &config.address,
                    &config.name,
                    &config.username,
                    &config.password,
                )
                .map_err(|e| StorageError::Connection(e.to_string()))?,
            ),
        };
        tracing::info!(kind = ?config.kind, "database connection established");
        Ok(driver)
    }

    /// Open the connection if none exists. Idempotent.
    pub fn connect(&self) -> Result<(), StorageError> {
        let mut handle = self.lock();
        if handle.is_none() {
            *handle = Some(Self::open_driver(&self.config)?);
        }
        Ok(())
    }

    /// Close and clear the handle. A close failure is terminal.
    pub fn disconnect(&self) -> Result<(), StorageError> {
        match self.lock().take() {
            Some(driver) => {
                driver
                    .close()
                    .map_err(|e| StorageError::Connection(format!("close failed: {e}")))?;
                tracing::info!("database connection closed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Keep-alive against an existing connection. Fails if none exists;
    /// never retries.
    pub fn ping(&self) -> Result<(), StorageError> {
        match self.lock().as_deref_mut() {
            Some(driver) => driver
                .ping()
                .map_err(|e| StorageError::Connection(format!("ping failed: {e}"))),
            None => Err(StorageError::Connection(
                "ping issued without an active connection".to_string(),
            )),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }

    /// Begin a transaction scope. This is the only lazy-reconnect point:
    /// a missing handle is opened here; every other failure is terminal.
    pub fn begin(&self) -> Result<TxnScope<'_>, StorageError> {
        let mut guard = self.lock();
        if guard.is_none() {
            *guard = Some(Self::open_driver(&self.config)?);
        }
        let dialect = match guard.as_deref_mut() {
            Some(driver) => {
                driver
                    .begin()
                    .map_err(|e| StorageError::Transaction(format!("begin failed: {e}")))?;
                driver.dialect()
            }
            None => return Err(StorageError::Connection("connection unavailable".to_string())),
        };
        tracing::debug!("transaction started");
        Ok(TxnScope {
            guard,
            dialect,
            state: TxnState::Active,
        })
    }

    /// Run `f` inside a transaction scope: commit on `Ok`, roll back on
    /// `Err`. Scopes must not nest; the scope holds the connection lock.
    pub fn with_txn<T>(
        &self,
        f: impl FnOnce(&mut TxnScope<'_>) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut tx = self.begin()?;
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback()?;
                Err(e)
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum TxnState {
    Active,
    Finished,
}

/// A transaction in flight. Dropping an active scope rolls it back, so an
/// early return or panic can never leave half a transaction committed.
pub struct TxnScope<'a> {
    guard: MutexGuard<'a, Option<Box<dyn Driver>>>,
    dialect: Dialect,
    state: TxnState,
}

impl TxnScope<'_> {
    fn driver(&mut self) -> Result<&mut (dyn Driver + '_), DriverError> {
        match self.guard.as_deref_mut() {
            Some(driver) => Ok(driver),
            None => Err(DriverError("connection unavailable".to_string())),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
        self.driver()?.execute(sql, params)
    }

    pub fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        self.driver()?.query(sql, params)
    }

    /// Commit the scope. A failed commit is rolled back before the error
    /// is reported; a rollback failure on top of that drops the handle,
    /// since the connection can no longer be trusted.
    pub fn commit(mut self) -> Result<(), StorageError> {
        self.state = TxnState::Finished;
        match self.driver().and_then(|d| d.commit()) {
            Ok(()) => {
                tracing::debug!("transaction committed");
                Ok(())
            }
            Err(commit_err) => match self.driver().and_then(|d| d.rollback()) {
                Ok(()) => Err(StorageError::Transaction(format!(
                    "commit failed and was rolled back: {commit_err}"
                ))),
                Err(rollback_err) => {
                    *self.guard = None;
                    Err(StorageError::Connection(format!(
                        "commit failed ({commit_err}) and rollback failed ({rollback_err}); connection dropped"
                    )))
                }
            },
        }
    }

    /// Roll the scope back. A rollback failure is terminal and drops the
    /// handle; the next operation reconnects from scratch.
    pub fn rollback(mut self) -> Result<(), StorageError> {
        self.state = TxnState::Finished;
        match self.driver().and_then(|d| d.rollback()) {
            Ok(()) => {
                tracing::debug!("transaction rolled back");
                Ok(())
            }
            Err(e) => {
                *self.guard = None;
                Err(StorageError::Connection(format!(
                    "rollback failed, connection dropped: {e}"
                )))
            }
        }
    }
}

impl Drop for TxnScope<'_> {
    fn drop(&mut self) {
        if self.state == TxnState::Active {
            match self.guard.as_deref_mut().map(|d| d.rollback()) {
                Some(Ok(())) => tracing::debug!("open transaction rolled back on drop"),
                Some(Err(e)) => {
                    tracing::error!(error = %e, "rollback on drop failed; dropping connection handle");
                    *self.guard = None;
                }
                None => {}
            }
        }
    }
}
