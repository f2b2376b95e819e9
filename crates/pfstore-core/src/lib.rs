pub mod driver;
pub mod error;
pub mod kind;
pub mod models;
pub mod predicate;
pub mod store;

pub use driver::{Dialect, Driver, DriverError, Row, Value};
pub use error::StorageError;
pub use kind::{TableKind, TableSpec, PFID_SPEC};
pub use models::PfidEntry;
pub use predicate::{Order, Predicate, Selector};
pub use store::{MatchPolicy, TableStore};
