use crate::driver::Value;
use crate::error::StorageError;
use crate::kind::TableSpec;

/// Filter over the rows of one keyed table, compiled to a parameterized
/// WHERE clause. Column names are checked against the table's spec before
/// any SQL is assembled; values always travel as bind parameters.
#[derive(Debug, Clone)]
pub enum Predicate {
    All,
    Eq(&'static str, Value),
    Ne(&'static str, Value),
    Lt(&'static str, Value),
    Gt(&'static str, Value),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Render the clause body, appending bind values to `params` in
    /// placeholder order.
    pub fn render(
        &self,
        spec: &TableSpec,
        params: &mut Vec<Value>,
    ) -> Result<String, StorageError> {
        match self {
            Predicate::All => Ok("1 = 1".to_string()),
            Predicate::Eq(column, value) => comparison(spec, column, "=", value, params),
            Predicate::Ne(column, value) => comparison(spec, column, "<>", value, params),
            Predicate::Lt(column, value) => comparison(spec, column, "<", value, params),
            Predicate::Gt(column, value) => comparison(spec, column, ">", value, params),
            Predicate::And(a, b) => Ok(format!(
                "({} AND {})",
                a.render(spec, params)?,
                b.render(spec, params)?
            )),
            Predicate::Or(a, b) => Ok(format!(
                "({} OR {})",
                a.render(spec, params)?,
                b.render(spec, params)?
            )),
        }
    }
}

fn comparison(
    spec: &TableSpec,
    column: &str,
    op: &str,
    value: &Value,
    params: &mut Vec<Value>,
) -> Result<String, StorageError> {
    if !spec.has_column(column) {
        return Err(StorageError::InvalidColumn {
            table: spec.table,
            column: column.to_string(),
        });
    }
    params.push(value.clone());
    Ok(format!("{column} {op} ?"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Ascending => "ASC",
            Order::Descending => "DESC",
        }
    }
}

/// A search request: a filter plus an optional explicit ordering. Without
/// `order_by` the row order is whatever the database yields.
#[derive(Debug, Clone)]
pub struct Selector {
    pub filter: Predicate,
    pub order_by: Option<(&'static str, Order)>,
}

impl Selector {
    pub fn all() -> Self {
        Selector {
            filter: Predicate::All,
            order_by: None,
        }
    }

    pub fn matching(filter: Predicate) -> Self {
        Selector {
            filter,
            order_by: None,
        }
    }

    pub fn ordered_by(mut self, column: &'static str, order: Order) -> Self {
        self.order_by = Some((column, order));
        self
    }
}

impl From<Predicate> for Selector {
    fn from(filter: Predicate) -> Self {
        Selector::matching(filter)
    }
}
