use crate::driver::Value;
use crate::error::StorageError;
use crate::kind::TableKind;
use crate::predicate::{Predicate, Selector};

/// What `delete_one`/`update_one` do when a predicate matches several rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Fail with `AmbiguousMatch` unless exactly one row matches.
    #[default]
    RequireUnique,
    /// Act on the row with the lowest primary key among the matches.
    FirstMatch,
}

/// CRUD contract over one keyed table.
///
/// Every write ensures the table exists first, runs inside an explicit
/// transaction, and rolls back on any driver-level failure rather than
/// leaving partial writes committed. The money ledger follows the same
/// pattern with its own fixed row shape.
pub trait TableStore {
    type Entry;

    fn kind(&self) -> TableKind;

    /// Idempotent table creation; `drop_if_exists` recreates it empty.
    fn ensure_schema(&self, drop_if_exists: bool) -> Result<(), StorageError>;

    fn add(&self, entry: &Self::Entry) -> Result<(), StorageError>;

    fn search(&self, selector: &Selector) -> Result<Vec<Self::Entry>, StorageError>;

    fn count(&self, filter: &Predicate) -> Result<u64, StorageError>;

    /// Remove exactly one matching row. Zero matches is `MissingRecord`;
    /// several matches defer to the store's `MatchPolicy`.
    fn delete_one(&self, filter: &Predicate) -> Result<(), StorageError>;

    /// Remove every matching row, returning how many went away.
    fn delete_all(&self, filter: &Predicate) -> Result<u64, StorageError>;

    /// Rewrite the named columns of exactly one matching row.
    fn update_one(
        &self,
        filter: &Predicate,
        patch: &[(&'static str, Value)],
    ) -> Result<(), StorageError>;

    /// Rewrite the named columns of every matching row, returning the count.
    fn update_all(
        &self,
        filter: &Predicate,
        patch: &[(&'static str, Value)],
    ) -> Result<u64, StorageError>;
}
