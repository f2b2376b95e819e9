use thiserror::Error;

/// Error raised by a concrete database driver. Converted into a
/// `StorageError` variant at the operation boundary.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DriverError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Mysql,
}

/// A parameter or result cell. The ledger schemas only carry integers and
/// strings; `Real` exists so drivers never have to drop a value on the floor.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// One result row, keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Int(i) => Some(*i),
            // text-protocol drivers may hand numeric columns back as strings
            Value::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One live database connection. All writes run between an explicit
/// `begin` and a `commit` or `rollback`; drivers never autocommit a
/// transaction-scoped statement.
pub trait Driver: Send {
    fn dialect(&self) -> Dialect;

    /// Execute a parameterized statement, returning the affected row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError>;

    /// Run a parameterized query and materialize every row.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError>;

    fn begin(&mut self) -> Result<(), DriverError>;
    fn commit(&mut self) -> Result<(), DriverError>;
    fn rollback(&mut self) -> Result<(), DriverError>;

    /// Keep-alive issued against a long-idle connection.
    fn ping(&mut self) -> Result<(), DriverError>;

    fn close(self: Box<Self>) -> Result<(), DriverError>;
}
