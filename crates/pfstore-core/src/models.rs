use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the issued-identifier table.
///
/// The 128-bit identifier is stored as two signed 64-bit halves; the halves
/// round-trip through bit casts so any `Uuid` survives intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PfidEntry {
    /// Assigned by the database on insert; `None` for entries not yet stored.
    pub seq_id: Option<i64>,
    pub most_significant: i64,
    pub least_significant: i64,
    pub tag: String,
}

impl PfidEntry {
    pub fn new(id: Uuid, tag: impl Into<String>) -> Self {
        let (hi, lo) = id.as_u64_pair();
        Self {
            seq_id: None,
            most_significant: hi as i64,
            least_significant: lo as i64,
            tag: tag.into(),
        }
    }

    pub fn uuid(&self) -> Uuid {
        Uuid::from_u64_pair(self.most_significant as u64, self.least_significant as u64)
    }
}
