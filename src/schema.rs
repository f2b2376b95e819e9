use std::sync::Arc;

use pfstore_core::{Dialect, StorageError, TableKind, Value};

use crate::connection::{ConnectionManager, TxnScope};

/// Idempotently creates the tables the ledger needs. Safe to call before
/// every operation; a failed statement rolls the transaction back and is
/// reported, never fatal.
pub struct SchemaManager {
    conn: Arc<ConnectionManager>,
}

const MONEY_TABLE_DDL: &str = "CREATE TABLE IF NOT EXISTS money (\
     name VARCHAR(36) NOT NULL, \
     amount INT NOT NULL, \
     PRIMARY KEY (name))";

impl SchemaManager {
    pub fn new(conn: Arc<ConnectionManager>) -> Self {
        Self { conn }
    }

    pub fn ensure_money_table(&self) -> Result<(), StorageError> {
        self.conn.with_txn(ensure_money_table)
    }

    pub fn ensure_table(&self, kind: TableKind, drop_if_exists: bool) -> Result<(), StorageError> {
        self.conn
            .with_txn(|tx| ensure_table(tx, kind, drop_if_exists))
    }
}

/// MySQL implicitly commits around any DDL statement, even a redundant
/// `CREATE TABLE IF NOT EXISTS`, which would split an open multi-statement
/// transaction in two. Probing first keeps the steady-state path free of
/// DDL; the create only runs when the table is genuinely missing, before
/// any row of it can have been written.
fn table_exists(tx: &mut TxnScope<'_>, table: &str) -> Result<bool, StorageError> {
    let sql = match tx.dialect() {
        Dialect::Sqlite => "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?",
        Dialect::Mysql => {
            "SELECT 1 FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = ?"
        }
    };
    let rows = tx
        .query(sql, &[Value::from(table)])
        .map_err(|e| StorageError::Schema(format!("probe {table}: {e}")))?;
    Ok(!rows.is_empty())
}

pub(crate) fn ensure_money_table(tx: &mut TxnScope<'_>) -> Result<(), StorageError> {
    if table_exists(tx, "money")? {
        return Ok(());
    }
    tx.execute(MONEY_TABLE_DDL, &[])
        .map(|_| ())
        .map_err(|e| StorageError::Schema(format!("money table: {e}")))
}

pub(crate) fn ensure_table(
    tx: &mut TxnScope<'_>,
    kind: TableKind,
    drop_if_exists: bool,
) -> Result<(), StorageError> {
    let ddl = table_ddl(kind, tx.dialect())?;
    if drop_if_exists {
        tx.execute(&format!("DROP TABLE IF EXISTS {}", kind.table_name()), &[])
            .map_err(|e| StorageError::Schema(format!("drop {}: {e}", kind.table_name())))?;
    } else if table_exists(tx, kind.table_name())? {
        return Ok(());
    }
    tx.execute(&ddl, &[])
        .map(|_| ())
        .map_err(|e| StorageError::Schema(format!("create {}: {e}", kind.table_name())))
}

fn table_ddl(kind: TableKind, dialect: Dialect) -> Result<String, StorageError> {
    match kind {
        TableKind::ProfundusId => Ok(match dialect {
            Dialect::Sqlite => "CREATE TABLE IF NOT EXISTS profundus_id (\
                 seqID INTEGER PRIMARY KEY AUTOINCREMENT, \
                 mostSignificantPFID BIGINT NOT NULL, \
                 leastSignificantPFID BIGINT NOT NULL, \
                 type VARCHAR(64) NOT NULL)"
                .to_string(),
            Dialect::Mysql => "CREATE TABLE IF NOT EXISTS profundus_id (\
                 seqID INT AUTO_INCREMENT NOT NULL, \
                 mostSignificantPFID BIGINT NOT NULL, \
                 leastSignificantPFID BIGINT NOT NULL, \
                 type VARCHAR(64) NOT NULL, \
                 PRIMARY KEY (seqID))"
                .to_string(),
        }),
        // account/user/group layouts are a pending product decision;
        // refusing beats inventing a schema nobody agreed on
        other => Err(StorageError::SchemaUndefined(other)),
    }
}
