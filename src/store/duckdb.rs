//! Embedded DuckDB store.

use super::{begin_sql, create_database_sql, use_database_sql, InsertTemplate, Store, StoreError};
use bank_data_gen::{Dialect, Row};
use duckdb::Connection;
use std::path::Path;
use tracing::debug;

/// DuckDB-backed store. A "database" is a DuckDB schema.
pub struct DuckDbStore {
    conn: Connection,
    in_transaction: bool,
}

impl DuckDbStore {
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            StoreError::Connection(format!("failed to create in-memory DuckDB database: {}", e))
        })?;
        Ok(Self::from_connection(conn))
    }

    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| {
            StoreError::Connection(format!("failed to open DuckDB database {}: {}", path.display(), e))
        })?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            in_transaction: false,
        }
    }

    /// Number of committed rows in `table` of the current schema
    pub fn count_rows(&self, table: &str) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", Dialect::DuckDb.quote(table));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .map_err(classify)?;
        Ok(count as u64)
    }

    /// Smallest and largest value of an integer column, `None` for an empty table
    pub fn column_bounds(&self, table: &str, column: &str) -> Result<Option<(i64, i64)>, StoreError> {
        let sql = format!(
            "SELECT MIN({col}), MAX({col}) FROM {table}",
            col = Dialect::DuckDb.quote(column),
            table = Dialect::DuckDb.quote(table)
        );
        let bounds: (Option<i64>, Option<i64>) = self
            .conn
            .query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(classify)?;
        Ok(match bounds {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        })
    }

    fn exec(&self, sql: &str) -> Result<(), StoreError> {
        self.conn.execute_batch(sql).map_err(classify)
    }
}

/// Map a DuckDB error onto the store taxonomy
fn classify(e: duckdb::Error) -> StoreError {
    let message = e.to_string();
    if message.contains("Constraint Error") || message.contains("violates") {
        StoreError::ConstraintViolation(message)
    } else {
        StoreError::Backend(message)
    }
}

impl Store for DuckDbStore {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn create_database_if_absent(&mut self, name: &str) -> Result<(), StoreError> {
        self.exec(&create_database_sql(Dialect::DuckDb, name))
    }

    fn use_database(&mut self, name: &str) -> Result<(), StoreError> {
        self.exec(&use_database_sql(Dialect::DuckDb, name))
    }

    fn execute_ddl(&mut self, statement: &str) -> Result<(), StoreError> {
        debug!(statement, "duckdb ddl");
        self.exec(statement)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        self.exec(begin_sql(Dialect::DuckDb))?;
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
        let sql = template.render_literal(Dialect::DuckDb, rows);
        if sql.is_empty() {
            return Ok(0);
        }
        let affected = self.conn.execute(&sql, []).map_err(classify)?;
        Ok(affected as u64)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoActiveTransaction);
        }
        self.in_transaction = false;
        self.exec("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoActiveTransaction);
        }
        self.in_transaction = false;
        self.exec("ROLLBACK")
    }

    fn set_foreign_key_enforcement(&mut self, _enabled: bool) -> Result<bool, StoreError> {
        // DuckDB always enforces declared foreign keys.
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bank_data_gen::SqlValue;

    fn store_with_table() -> DuckDbStore {
        let mut store = DuckDbStore::open_in_memory().unwrap();
        store
            .execute_ddl("CREATE TABLE t (id INTEGER, name VARCHAR)")
            .unwrap();
        store
    }

    fn template() -> InsertTemplate {
        InsertTemplate::new("t", vec!["id".into(), "name".into()])
    }

    fn rows(n: i64) -> Vec<Row> {
        (1..=n)
            .map(|i| vec![SqlValue::Int(i), SqlValue::String(format!("row {}", i))])
            .collect()
    }

    #[test]
    fn test_insert_requires_transaction() {
        let mut store = store_with_table();
        assert!(matches!(
            store.execute_batch_insert(&template(), &rows(1)),
            Err(StoreError::NoActiveTransaction)
        ));
    }

    #[test]
    fn test_commit_and_rollback() {
        let mut store = store_with_table();
        store.begin().unwrap();
        assert_eq!(store.execute_batch_insert(&template(), &rows(3)).unwrap(), 3);
        store.commit().unwrap();

        store.begin().unwrap();
        store.execute_batch_insert(&template(), &rows(2)).unwrap();
        store.rollback().unwrap();

        assert_eq!(store.count_rows("t").unwrap(), 3);
        assert_eq!(store.column_bounds("t", "id").unwrap(), Some((1, 3)));
    }

    #[test]
    fn test_schema_as_database() {
        let mut store = DuckDbStore::open_in_memory().unwrap();
        store.create_database_if_absent("bank").unwrap();
        store.create_database_if_absent("bank").unwrap();
        store.use_database("bank").unwrap();
        store.execute_ddl("CREATE TABLE x (id INTEGER)").unwrap();
        assert_eq!(store.count_rows("x").unwrap(), 0);
    }

    #[test]
    fn test_fk_toggle_unsupported() {
        let mut store = DuckDbStore::open_in_memory().unwrap();
        assert!(!store.set_foreign_key_enforcement(false).unwrap());
    }
}
