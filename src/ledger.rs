use std::sync::Arc;

use pfstore_core::{StorageError, Value};

use crate::connection::{ConnectionManager, TxnScope};
use crate::schema;

/// CRUD over the money table: one integer balance per unique name.
///
/// Balance policy (negative amounts, limits) belongs to the calling layer;
/// this store writes exactly what it is told.
pub struct LedgerStore {
    conn: Arc<ConnectionManager>,
}

impl LedgerStore {
    pub fn new(conn: Arc<ConnectionManager>) -> Self {
        Self { conn }
    }

    /// Open an account: insert `(name, 0)`. Fails with `DuplicateRecord`
    /// if the name already has a record, leaving it untouched.
    pub fn create_record(&self, name: &str) -> Result<(), StorageError> {
        self.conn.with_txn(|tx| create_record(tx, name))
    }

    /// Load a balance. `Ok(None)` means no record exists; a failed query
    /// is reported as `Err`, never mistaken for absence.
    pub fn load_amount(&self, name: &str) -> Result<Option<i64>, StorageError> {
        self.conn.with_txn(|tx| load_amount(tx, name))
    }
}

fn create_record(tx: &mut TxnScope<'_>, name: &str) -> Result<(), StorageError> {
    schema::ensure_money_table(tx)?;

    if load_amount(tx, name)?.is_some() {
        return Err(StorageError::DuplicateRecord(name.to_string()));
    }

    tx.execute(
        "INSERT INTO money (name, amount) VALUES (?, 0)",
        &[Value::from(name)],
    )
    .map_err(|e| StorageError::Transaction(format!("insert money record '{name}': {e}")))?;

    tracing::debug!(name, "money record created");
    Ok(())
}

pub(crate) fn load_amount(tx: &mut TxnScope<'_>, name: &str) -> Result<Option<i64>, StorageError> {
    schema::ensure_money_table(tx)?;

    let rows = tx
        .query(
            "SELECT amount FROM money WHERE name = ?",
            &[Value::from(name)],
        )
        .map_err(|e| StorageError::Query(format!("load money record '{name}': {e}")))?;

    Ok(rows.first().and_then(|row| row.get_int("amount")))
}

/// Rewrite one balance. Requires the record to exist. Deliberately does
/// not commit: the enclosing scope decides when the batch is durable.
pub(crate) fn update_amount(
    tx: &mut TxnScope<'_>,
    name: &str,
    amount: i64,
) -> Result<(), StorageError> {
    schema::ensure_money_table(tx)?;

    if load_amount(tx, name)?.is_none() {
        return Err(StorageError::MissingRecord(name.to_string()));
    }

    tx.execute(
        "UPDATE money SET amount = ? WHERE name = ?",
        &[Value::Int(amount), Value::from(name)],
    )
    .map_err(|e| StorageError::Transaction(format!("update money record '{name}': {e}")))?;

    Ok(())
}
