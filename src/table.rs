use std::sync::Arc;

use pfstore_core::{
    MatchPolicy, PfidEntry, Predicate, Row, Selector, StorageError, TableKind, TableSpec,
    TableStore, Value, PFID_SPEC,
};

use crate::connection::{ConnectionManager, TxnScope};
use crate::schema;

// Shared SQL assembly for the generalized keyed tables. Column names only
// ever come from a `TableSpec` or are validated against one; values always
// travel as bind parameters.

fn insert_sql(spec: &TableSpec) -> String {
    let columns = spec.columns.join(", ");
    let marks = vec!["?"; spec.columns.len()].join(", ");
    format!("INSERT INTO {} ({columns}) VALUES ({marks})", spec.table)
}

fn select_sql(
    spec: &TableSpec,
    selector: &Selector,
    params: &mut Vec<Value>,
) -> Result<String, StorageError> {
    let filter = selector.filter.render(spec, params)?;
    let mut sql = format!(
        "SELECT {}, {} FROM {} WHERE {filter}",
        spec.primary_key,
        spec.columns.join(", "),
        spec.table,
    );
    if let Some((column, order)) = selector.order_by {
        if !spec.has_column(column) {
            return Err(StorageError::InvalidColumn {
                table: spec.table,
                column: column.to_string(),
            });
        }
        sql.push_str(&format!(" ORDER BY {column} {}", order.as_sql()));
    }
    Ok(sql)
}

fn set_clause(
    spec: &TableSpec,
    patch: &[(&'static str, Value)],
    params: &mut Vec<Value>,
) -> Result<String, StorageError> {
    if patch.is_empty() {
        return Err(StorageError::Transaction(format!(
            "update of {} with no columns",
            spec.table
        )));
    }
    let mut pieces = Vec::with_capacity(patch.len());
    for (column, value) in patch {
        // the primary key is assigned by the database and never rewritten
        if !spec.columns.contains(column) {
            return Err(StorageError::InvalidColumn {
                table: spec.table,
                column: column.to_string(),
            });
        }
        pieces.push(format!("{column} = ?"));
        params.push(value.clone());
    }
    Ok(pieces.join(", "))
}

/// Sub-select picking the lowest primary key among the matches. The extra
/// derived-table wrapper keeps MySQL happy about modifying the table it
/// selects from.
fn pick_one_clause(spec: &TableSpec, filter_sql: &str) -> String {
    format!(
        "{pk} = (SELECT {pk} FROM (SELECT MIN({pk}) AS {pk} FROM {table} WHERE {filter_sql}) AS pick)",
        pk = spec.primary_key,
        table = spec.table,
    )
}

fn count_rows(
    tx: &mut TxnScope<'_>,
    spec: &TableSpec,
    filter: &Predicate,
) -> Result<u64, StorageError> {
    let mut params = Vec::new();
    let clause = filter.render(spec, &mut params)?;
    let rows = tx
        .query(
            &format!("SELECT COUNT(*) AS n FROM {} WHERE {clause}", spec.table),
            &params,
        )
        .map_err(|e| StorageError::Query(format!("count {}: {e}", spec.table)))?;
    Ok(rows.first().and_then(|row| row.get_int("n")).unwrap_or(0) as u64)
}

/// Enforce the single-row contract of `delete_one`/`update_one`.
fn require_one_match(
    tx: &mut TxnScope<'_>,
    spec: &TableSpec,
    filter: &Predicate,
    policy: MatchPolicy,
) -> Result<(), StorageError> {
    let matches = count_rows(tx, spec, filter)?;
    if matches == 0 {
        return Err(StorageError::MissingRecord(spec.table.to_string()));
    }
    if matches > 1 && policy == MatchPolicy::RequireUnique {
        return Err(StorageError::AmbiguousMatch(matches));
    }
    Ok(())
}

/// The issued-identifier table: the one kind whose schema is fully
/// specified today, and the reference instantiation of `TableStore`.
pub struct PfidTable {
    conn: Arc<ConnectionManager>,
    policy: MatchPolicy,
}

impl PfidTable {
    pub fn new(conn: Arc<ConnectionManager>) -> Self {
        Self::with_policy(conn, MatchPolicy::default())
    }

    pub fn with_policy(conn: Arc<ConnectionManager>, policy: MatchPolicy) -> Self {
        Self { conn, policy }
    }

    fn entry_values(entry: &PfidEntry) -> Vec<Value> {
        vec![
            Value::Int(entry.most_significant),
            Value::Int(entry.least_significant),
            Value::Text(entry.tag.clone()),
        ]
    }

    fn row_to_entry(row: &Row) -> Result<PfidEntry, StorageError> {
        let malformed = || StorageError::Query("malformed profundus_id row".to_string());
        Ok(PfidEntry {
            seq_id: row.get_int("seqID"),
            most_significant: row.get_int("mostSignificantPFID").ok_or_else(malformed)?,
            least_significant: row.get_int("leastSignificantPFID").ok_or_else(malformed)?,
            tag: row.get_text("type").ok_or_else(malformed)?.to_string(),
        })
    }
}

impl TableStore for PfidTable {
    type Entry = PfidEntry;

    fn kind(&self) -> TableKind {
        TableKind::ProfundusId
    }

    fn ensure_schema(&self, drop_if_exists: bool) -> Result<(), StorageError> {
        self.conn
            .with_txn(|tx| schema::ensure_table(tx, TableKind::ProfundusId, drop_if_exists))
    }

    fn add(&self, entry: &PfidEntry) -> Result<(), StorageError> {
        self.conn.with_txn(|tx| {
            schema::ensure_table(tx, TableKind::ProfundusId, false)?;
            tx.execute(&insert_sql(&PFID_SPEC), &Self::entry_values(entry))
                .map_err(|e| StorageError::Transaction(format!("insert profundus_id: {e}")))?;
            Ok(())
        })
    }

    fn search(&self, selector: &Selector) -> Result<Vec<PfidEntry>, StorageError> {
        self.conn.with_txn(|tx| {
            schema::ensure_table(tx, TableKind::ProfundusId, false)?;
            let mut params = Vec::new();
            let sql = select_sql(&PFID_SPEC, selector, &mut params)?;
            let rows = tx
                .query(&sql, &params)
                .map_err(|e| StorageError::Query(format!("search profundus_id: {e}")))?;
            rows.iter().map(Self::row_to_entry).collect()
        })
    }

    fn count(&self, filter: &Predicate) -> Result<u64, StorageError> {
        self.conn.with_txn(|tx| {
            schema::ensure_table(tx, TableKind::ProfundusId, false)?;
            count_rows(tx, &PFID_SPEC, filter)
        })
    }

    fn delete_one(&self, filter: &Predicate) -> Result<(), StorageError> {
        self.conn.with_txn(|tx| {
            schema::ensure_table(tx, TableKind::ProfundusId, false)?;
            require_one_match(tx, &PFID_SPEC, filter, self.policy)?;

            let mut params = Vec::new();
            let clause = filter.render(&PFID_SPEC, &mut params)?;
            let sql = format!(
                "DELETE FROM {} WHERE {}",
                PFID_SPEC.table,
                pick_one_clause(&PFID_SPEC, &clause),
            );
            tx.execute(&sql, &params)
                .map_err(|e| StorageError::Transaction(format!("delete from profundus_id: {e}")))?;
            Ok(())
        })
    }

    fn delete_all(&self, filter: &Predicate) -> Result<u64, StorageError> {
        self.conn.with_txn(|tx| {
            schema::ensure_table(tx, TableKind::ProfundusId, false)?;
            let mut params = Vec::new();
            let clause = filter.render(&PFID_SPEC, &mut params)?;
            tx.execute(
                &format!("DELETE FROM {} WHERE {clause}", PFID_SPEC.table),
                &params,
            )
            .map_err(|e| StorageError::Transaction(format!("delete from profundus_id: {e}")))
        })
    }

    fn update_one(
        &self,
        filter: &Predicate,
        patch: &[(&'static str, Value)],
    ) -> Result<(), StorageError> {
        self.conn.with_txn(|tx| {
            schema::ensure_table(tx, TableKind::ProfundusId, false)?;
            require_one_match(tx, &PFID_SPEC, filter, self.policy)?;

            let mut params = Vec::new();
            let sets = set_clause(&PFID_SPEC, patch, &mut params)?;
            let clause = filter.render(&PFID_SPEC, &mut params)?;
            let sql = format!(
                "UPDATE {} SET {sets} WHERE {}",
                PFID_SPEC.table,
                pick_one_clause(&PFID_SPEC, &clause),
            );
            tx.execute(&sql, &params)
                .map_err(|e| StorageError::Transaction(format!("update profundus_id: {e}")))?;
            Ok(())
        })
    }

    fn update_all(
        &self,
        filter: &Predicate,
        patch: &[(&'static str, Value)],
    ) -> Result<u64, StorageError> {
        self.conn.with_txn(|tx| {
            schema::ensure_table(tx, TableKind::ProfundusId, false)?;
            let mut params = Vec::new();
            let sets = set_clause(&PFID_SPEC, patch, &mut params)?;
            let clause = filter.render(&PFID_SPEC, &mut params)?;
            tx.execute(
                &format!("UPDATE {} SET {sets} WHERE {clause}", PFID_SPEC.table),
                &params,
            )
            .map_err(|e| StorageError::Transaction(format!("update profundus_id: {e}")))
        })
    }
}
