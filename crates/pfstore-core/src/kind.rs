use std::fmt;

use serde::{Deserialize, Serialize};

/// The generalized entity categories the keyed-table layer manages.
///
/// Only `ProfundusId` has a fully specified column set today; the schemas
/// for the other three kinds are a pending product decision and schema
/// creation refuses them rather than inventing columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Account,
    User,
    Group,
    ProfundusId,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::Account,
        TableKind::User,
        TableKind::Group,
        TableKind::ProfundusId,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            TableKind::Account => "account",
            TableKind::User => "user",
            TableKind::Group => "group",
            TableKind::ProfundusId => "profundus_id",
        }
    }

    /// Column layout for this kind, if one has been defined.
    pub fn spec(&self) -> Option<&'static TableSpec> {
        match self {
            TableKind::ProfundusId => Some(&PFID_SPEC),
            _ => None,
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Static description of a keyed table: its name, primary key, and the
/// insertable (non-key) columns. Predicate columns are validated against
/// this before any SQL is assembled.
#[derive(Debug)]
pub struct TableSpec {
    pub kind: TableKind,
    pub table: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [&'static str],
}

impl TableSpec {
    pub fn has_column(&self, name: &str) -> bool {
        name == self.primary_key || self.columns.contains(&name)
    }
}

/// The issued-identifier table: an auto-assigned sequence id plus a 128-bit
/// identifier split into two 64-bit halves and a type tag.
pub static PFID_SPEC: TableSpec = TableSpec {
    kind: TableKind::ProfundusId,
    table: "profundus_id",
    primary_key: "seqID",
    columns: &["mostSignificantPFID", "leastSignificantPFID", "type"],
};
