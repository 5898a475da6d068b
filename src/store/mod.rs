//! The relational store boundary.
//!
//! The loader talks to a store only through [`Store`]: database selection,
//! DDL, one multi-row insert per batch, commit and rollback. Three backends
//! implement it:
//!
//! - [`DuckDbStore`]: embedded DuckDB (default), in-memory or file-backed
//! - [`MySqlStore`]: a MySQL server via `mysql_async` (feature `mysql`)
//! - [`SqlScriptStore`]: writes the whole run as an SQL script

mod duckdb;
#[cfg(feature = "mysql")]
mod mysql;
mod script;

pub use self::duckdb::DuckDbStore;
#[cfg(feature = "mysql")]
pub use self::mysql::MySqlStore;
pub use self::script::SqlScriptStore;

use bank_data_gen::{columns_of, Dialect, Row, TableKind};
use thiserror::Error;

/// Errors reported by a store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("{0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no transaction is active")]
    NoActiveTransaction,

    #[error("insert affected {affected} of {expected} rows")]
    RowCountMismatch { expected: u64, affected: u64 },
}

/// Target of a multi-row insert: table plus the columns supplied per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTemplate {
    pub table: String,
    pub columns: Vec<String>,
}

impl InsertTemplate {
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    /// Template for one of the banking tables
    pub fn for_kind(kind: TableKind) -> Self {
        Self::new(
            kind.name(),
            columns_of(kind).iter().map(|c| c.to_string()).collect(),
        )
    }

    fn head(&self, dialect: Dialect) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| dialect.quote(c)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES",
            dialect.quote(&self.table),
            columns.join(", ")
        )
    }

    /// Render a multi-row INSERT with every value inlined as an escaped literal
    pub fn render_literal(&self, dialect: Dialect, rows: &[Row]) -> String {
        if rows.is_empty() {
            return String::new();
        }

        let mut sql = self.head(dialect);
        sql.push('\n');
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                sql.push_str(",\n");
            }
            sql.push('(');
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&value.to_sql(dialect));
            }
            sql.push(')');
        }
        sql
    }

    /// Render a multi-row INSERT with `?` placeholders for `row_count` rows
    pub fn render_placeholders(&self, dialect: Dialect, row_count: usize) -> String {
        let row = format!("({})", vec!["?"; self.columns.len()].join(", "));
        format!("{} {}", self.head(dialect), vec![row.as_str(); row_count].join(", "))
    }
}

/// Statement creating the run's database (a schema, for DuckDB)
pub fn create_database_sql(dialect: Dialect, name: &str) -> String {
    match dialect {
        Dialect::MySql => format!("CREATE DATABASE IF NOT EXISTS {}", dialect.quote(name)),
        Dialect::DuckDb => format!("CREATE SCHEMA IF NOT EXISTS {}", dialect.quote(name)),
    }
}

/// Statement selecting the run's database
pub fn use_database_sql(dialect: Dialect, name: &str) -> String {
    match dialect {
        Dialect::MySql => format!("USE {}", dialect.quote(name)),
        Dialect::DuckDb => format!("SET schema = '{}'", name.replace('\'', "''")),
    }
}

pub fn begin_sql(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::MySql => "START TRANSACTION",
        Dialect::DuckDb => "BEGIN TRANSACTION",
    }
}

/// The store operations the loader depends on.
///
/// Calls are synchronous and sequential: at most one transaction is open at
/// any time, and it is always ended by `commit` or `rollback` before the next
/// `begin`.
pub trait Store {
    /// Dialect used to render DDL for this store
    fn dialect(&self) -> Dialect;

    fn create_database_if_absent(&mut self, name: &str) -> Result<(), StoreError>;

    fn use_database(&mut self, name: &str) -> Result<(), StoreError>;

    fn execute_ddl(&mut self, statement: &str) -> Result<(), StoreError>;

    fn begin(&mut self) -> Result<(), StoreError>;

    /// Insert `rows` in one statement; returns the affected row count
    fn execute_batch_insert(
        &mut self,
        template: &InsertTemplate,
        rows: &[Row],
    ) -> Result<u64, StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;

    /// Toggle FK enforcement. `Ok(false)` means the store cannot do it.
    fn set_foreign_key_enforcement(&mut self, enabled: bool) -> Result<bool, StoreError>;

    /// Make everything written so far durable. Called once after a successful run.
    fn finish(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn create_database_if_absent(&mut self, name: &str) -> Result<(), StoreError> {
        (**self).create_database_if_absent(name)
    }

    fn use_database(&mut self, name: &str) -> Result<(), StoreError> {
        (**self).use_database(name)
    }

    fn execute_ddl(&mut self, statement: &str) -> Result<(), StoreError> {
        (**self).execute_ddl(statement)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        (**self).begin()
    }

    fn execute_batch_insert(
        &mut self,
        template: &InsertTemplate,
        rows: &[Row],
    ) -> Result<u64, StoreError> {
        (**self).execute_batch_insert(template, rows)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        (**self).rollback()
    }

    fn set_foreign_key_enforcement(&mut self, enabled: bool) -> Result<bool, StoreError> {
        (**self).set_foreign_key_enforcement(enabled)
    }

    fn finish(&mut self) -> Result<(), StoreError> {
        (**self).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bank_data_gen::SqlValue;

    fn template() -> InsertTemplate {
        InsertTemplate::new("branches", vec!["branch_name".into(), "branch_code".into()])
    }

    #[test]
    fn test_render_literal() {
        let rows = vec![
            vec![SqlValue::String("Pune Branch 1".into()), SqlValue::String("BR001".into())],
            vec![SqlValue::String("O'Hare".into()), SqlValue::Null],
        ];
        let sql = template().render_literal(Dialect::DuckDb, &rows);
        assert_eq!(
            sql,
            "INSERT INTO \"branches\" (\"branch_name\", \"branch_code\") VALUES\n('Pune Branch 1', 'BR001'),\n('O''Hare', NULL)"
        );
        assert!(template().render_literal(Dialect::MySql, &[]).is_empty());
    }

    #[test]
    fn test_render_placeholders() {
        assert_eq!(
            template().render_placeholders(Dialect::MySql, 2),
            "INSERT INTO `branches` (`branch_name`, `branch_code`) VALUES (?, ?), (?, ?)"
        );
    }

    #[test]
    fn test_database_statements() {
        assert_eq!(
            create_database_sql(Dialect::MySql, "BankOf420"),
            "CREATE DATABASE IF NOT EXISTS `BankOf420`"
        );
        assert_eq!(use_database_sql(Dialect::DuckDb, "BankOf420"), "SET schema = 'BankOf420'");
    }
}
