use rusqlite::Connection;

use pfstore_core::{Dialect, Driver, DriverError, Row, Value};

/// SQLite-backed connection. `":memory:"` opens a private in-memory
/// database, which the tests lean on heavily.
pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    pub fn open(path: &str) -> Result<Self, DriverError> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| DriverError(e.to_string()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| DriverError(e.to_string()))?;

        tracing::debug!(path, "sqlite connection opened");
        Ok(Self { conn })
    }
}

fn to_sql(params: &[Value]) -> Vec<rusqlite::types::Value> {
    params
        .iter()
        .map(|v| match v {
            Value::Null => rusqlite::types::Value::Null,
            Value::Int(i) => rusqlite::types::Value::Integer(*i),
            Value::Real(f) => rusqlite::types::Value::Real(*f),
            Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
        })
        .collect()
}

fn from_sql(value: rusqlite::types::Value) -> Value {
    match value {
        rusqlite::types::Value::Null => Value::Null,
        rusqlite::types::Value::Integer(i) => Value::Int(i),
        rusqlite::types::Value::Real(f) => Value::Real(f),
        rusqlite::types::Value::Text(s) => Value::Text(s),
        // no blob columns exist in any of our schemas
        rusqlite::types::Value::Blob(_) => Value::Null,
    }
}

impl Driver for SqliteDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
        self.conn
            .execute(sql, rusqlite::params_from_iter(to_sql(params)))
            .map(|n| n as u64)
            .map_err(|e| DriverError(e.to_string()))
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DriverError(e.to_string()))?;
        let names: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();

        let mut rows = stmt
            .query(rusqlite::params_from_iter(to_sql(params)))
            .map_err(|e| DriverError(e.to_string()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DriverError(e.to_string()))? {
            let mut materialized = Row::new();
            for (i, name) in names.iter().enumerate() {
                let value: rusqlite::types::Value =
                    row.get(i).map_err(|e| DriverError(e.to_string()))?;
                materialized.push(name.clone(), from_sql(value));
            }
            out.push(materialized);
        }
        Ok(out)
    }

    fn begin(&mut self) -> Result<(), DriverError> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(|e| DriverError(e.to_string()))
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| DriverError(e.to_string()))
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| DriverError(e.to_string()))
    }

    fn ping(&mut self) -> Result<(), DriverError> {
        self.conn
            .query_row("SELECT 1", [], |_| Ok(()))
            .map_err(|e| DriverError(e.to_string()))
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.conn
            .close()
            .map_err(|(_, e)| DriverError(e.to_string()))
    }
}
