//! MySQL store on `mysql_async`, driven from a private current-thread runtime.

use super::{begin_sql, create_database_sql, use_database_sql, InsertTemplate, Store, StoreError};
use crate::config::ConnectionConfig;
use bank_data_gen::{Dialect, Row, SqlValue};
use chrono::{Datelike, Timelike};
use mysql_async::{prelude::*, Conn, OptsBuilder, Params, Value};
use tokio::runtime::Runtime;
use tracing::debug;

/// Placeholder limit of the MySQL prepared-statement protocol
const MAX_PLACEHOLDERS: usize = 65_535;

// Server error codes for duplicate keys and FK violations
const CONSTRAINT_CODES: &[u16] = &[1062, 1216, 1217, 1451, 1452];

pub struct MySqlStore {
    runtime: Runtime,
    conn: Option<Conn>,
    in_transaction: bool,
}

impl MySqlStore {
    pub fn connect(config: &ConnectionConfig) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let opts = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()));

        let conn = runtime
            .block_on(Conn::new(opts))
            .map_err(|e| StoreError::Connection(format!("{}:{}: {}", config.host, config.port, e)))?;

        Ok(Self {
            runtime,
            conn: Some(conn),
            in_transaction: false,
        })
    }

    fn conn(&mut self) -> Result<&mut Conn, StoreError> {
        self.conn
            .as_mut()
            .ok_or_else(|| StoreError::Connection("connection already closed".to_string()))
    }

    fn query(&mut self, sql: &str) -> Result<(), StoreError> {
        debug!(sql, "mysql statement");
        let runtime = &self.runtime;
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| StoreError::Connection("connection already closed".to_string()))?;
        runtime.block_on(conn.query_drop(sql)).map_err(classify)
    }
}

fn classify(e: mysql_async::Error) -> StoreError {
    match e {
        mysql_async::Error::Server(ref server) if CONSTRAINT_CODES.contains(&server.code) => {
            StoreError::ConstraintViolation(e.to_string())
        }
        mysql_async::Error::Io(_) => StoreError::Connection(e.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

fn to_param(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Int(n) => Value::Int(*n),
        SqlValue::Float(f) => Value::Double(*f),
        SqlValue::String(s) => Value::Bytes(s.as_bytes().to_vec()),
        SqlValue::Date(d) => Value::Date(d.year() as u16, d.month() as u8, d.day() as u8, 0, 0, 0, 0),
        SqlValue::DateTime(ts) => Value::Date(
            ts.year() as u16,
            ts.month() as u8,
            ts.day() as u8,
            ts.hour() as u8,
            ts.minute() as u8,
            ts.second() as u8,
            0,
        ),
    }
}

impl Store for MySqlStore {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn create_database_if_absent(&mut self, name: &str) -> Result<(), StoreError> {
        self.query(&create_database_sql(Dialect::MySql, name))
    }

    fn use_database(&mut self, name: &str) -> Result<(), StoreError> {
        self.query(&use_database_sql(Dialect::MySql, name))
    }

    fn execute_ddl(&mut self, statement: &str) -> Result<(), StoreError> {
        self.query(statement)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        self.query(begin_sql(Dialect::MySql))?;
        self.in_transaction = true;
        Ok(())
    }

    fn execute_batch_insert(
        &mut self,
        template: &InsertTemplate,
        rows: &[Row],
    ) -> Result<u64, StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoActiveTransaction);
        }
        if rows.is_empty() {
            return Ok(0);
        }

        if rows.len() * template.columns.len() > MAX_PLACEHOLDERS {
            // Too many parameters for one prepared statement; inline the values.
            let sql = template.render_literal(Dialect::MySql, rows);
            self.query(&sql)?;
        } else {
            let sql = template.render_placeholders(Dialect::MySql, rows.len());
            let params: Vec<Value> = rows.iter().flatten().map(to_param).collect();
            let runtime = &self.runtime;
            let conn = self
                .conn
                .as_mut()
                .ok_or_else(|| StoreError::Connection("connection already closed".to_string()))?;
            runtime
                .block_on(conn.exec_drop(sql, Params::Positional(params)))
                .map_err(classify)?;
        }

        Ok(self.conn()?.affected_rows())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoActiveTransaction);
        }
        self.in_transaction = false;
        self.query("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoActiveTransaction);
        }
        self.in_transaction = false;
        self.query("ROLLBACK")
    }

    fn set_foreign_key_enforcement(&mut self, enabled: bool) -> Result<bool, StoreError> {
        let flag = if enabled { 1 } else { 0 };
        self.query(&format!("SET FOREIGN_KEY_CHECKS = {}", flag))?;
        Ok(true)
    }
}

impl Drop for MySqlStore {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            let _ = self.runtime.block_on(conn.disconnect());
        }
    }
}
