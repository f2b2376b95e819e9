use thiserror::Error;

use crate::kind::TableKind;

/// Failure taxonomy for every storage operation.
///
/// `Connection` is terminal for the calling operation; the record-level
/// variants are reported back to the caller after the enclosing transaction
/// has been rolled back. `Query` is distinct from an absent record: a read
/// that finds nothing returns `Ok(None)`, never this error.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("connection failure: {0}")]
    Connection(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("schema failure: {0}")]
    Schema(String),

    #[error("no schema defined for table kind '{0}'")]
    SchemaUndefined(TableKind),

    #[error("record already exists: {0}")]
    DuplicateRecord(String),

    #[error("record not found: {0}")]
    MissingRecord(String),

    #[error("predicate matches {0} rows where exactly one is required")]
    AmbiguousMatch(u64),

    #[error("transaction failure: {0}")]
    Transaction(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("invalid column '{column}' for table '{table}'")]
    InvalidColumn { table: &'static str, column: String },
}
