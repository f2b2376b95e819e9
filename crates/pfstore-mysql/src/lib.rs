use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Params};

use pfstore_core::{Dialect, Driver, DriverError, Row, Value};

/// MySQL-backed connection. Autocommit is switched off at connect time;
/// transaction boundaries are always explicit.
pub struct MysqlDriver {
    conn: Conn,
}

impl MysqlDriver {
    /// `address` may carry a port (`host:3306`). TLS is not negotiated; the
    /// ledger expects to sit next to its database.
    ///
    /// Credentials go into the builder as plain fields, never through a
    /// URL, so passwords containing `@`, `/` or `#` need no escaping.
    pub fn connect(
        address: &str,
        database: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, DriverError> {
        let (host, port) = split_address(address);
        let mut opts = OptsBuilder::new()
            .ip_or_hostname(Some(host))
            .db_name(Some(database))
            .user(Some(username))
            .pass(Some(password));
        if let Some(port) = port {
            opts = opts.tcp_port(port);
        }
        let mut conn = Conn::new(opts).map_err(|e| DriverError(e.to_string()))?;

        conn.query_drop("SET autocommit = 0")
            .map_err(|e| DriverError(e.to_string()))?;

        tracing::debug!(address, database, "mysql connection opened");
        Ok(Self { conn })
    }
}

fn split_address(address: &str) -> (&str, Option<u16>) {
    match address.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (host, Some(port)),
            Err(_) => (address, None),
        },
        None => (address, None),
    }
}

fn to_params(params: &[Value]) -> Params {
    if params.is_empty() {
        return Params::Empty;
    }
    Params::Positional(params.iter().map(to_my).collect())
}

fn to_my(value: &Value) -> mysql::Value {
    match value {
        Value::Null => mysql::Value::NULL,
        Value::Int(i) => mysql::Value::Int(*i),
        Value::Real(f) => mysql::Value::Double(*f),
        Value::Text(s) => mysql::Value::Bytes(s.clone().into_bytes()),
    }
}

fn from_my(value: mysql::Value) -> Value {
    match value {
        mysql::Value::NULL => Value::Null,
        mysql::Value::Int(i) => Value::Int(i),
        mysql::Value::UInt(u) => Value::Int(u as i64),
        mysql::Value::Float(f) => Value::Real(f as f64),
        mysql::Value::Double(f) => Value::Real(f),
        mysql::Value::Bytes(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
        other => Value::Text(other.as_sql(true)),
    }
}

impl Driver for MysqlDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, DriverError> {
        self.conn
            .exec_drop(sql, to_params(params))
            .map_err(|e| DriverError(e.to_string()))?;
        Ok(self.conn.affected_rows())
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Row>, DriverError> {
        let rows: Vec<mysql::Row> = self
            .conn
            .exec(sql, to_params(params))
            .map_err(|e| DriverError(e.to_string()))?;

        let mut out = Vec::new();
        for row in rows {
            let names: Vec<String> = row
                .columns_ref()
                .iter()
                .map(|c| c.name_str().into_owned())
                .collect();
            let mut materialized = Row::new();
            for (name, value) in names.into_iter().zip(row.unwrap()) {
                materialized.push(name, from_my(value));
            }
            out.push(materialized);
        }
        Ok(out)
    }

    fn begin(&mut self) -> Result<(), DriverError> {
        self.conn
            .query_drop("START TRANSACTION")
            .map_err(|e| DriverError(e.to_string()))
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.conn
            .query_drop("COMMIT")
            .map_err(|e| DriverError(e.to_string()))
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.conn
            .query_drop("ROLLBACK")
            .map_err(|e| DriverError(e.to_string()))
    }

    fn ping(&mut self) -> Result<(), DriverError> {
        self.conn
            .query_drop("SELECT 1")
            .map_err(|e| DriverError(e.to_string()))
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        // the protocol-level quit happens when the connection drops
        drop(self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_conversions() {
        assert_eq!(from_my(mysql::Value::Int(-3)), Value::Int(-3));
        assert_eq!(from_my(mysql::Value::UInt(7)), Value::Int(7));
        assert_eq!(
            from_my(mysql::Value::Bytes(b"alice".to_vec())),
            Value::Text("alice".to_string())
        );
        assert_eq!(from_my(mysql::Value::NULL), Value::Null);

        assert_eq!(to_my(&Value::Int(12)), mysql::Value::Int(12));
        assert_eq!(
            to_my(&Value::Text("x".to_string())),
            mysql::Value::Bytes(b"x".to_vec())
        );
    }

    #[test]
    fn addresses_split_into_host_and_port() {
        assert_eq!(split_address("db.internal:3307"), ("db.internal", Some(3307)));
        assert_eq!(split_address("db.internal"), ("db.internal", None));
        // a trailing non-numeric segment is part of the hostname
        assert_eq!(split_address("db.internal:prod"), ("db.internal:prod", None));
    }

    #[test]
    fn empty_params_collapse() {
        assert!(matches!(to_params(&[]), Params::Empty));
        assert!(matches!(
            to_params(&[Value::Int(1)]),
            Params::Positional(_)
        ));
    }
}
