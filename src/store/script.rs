//! Store that writes the run as an SQL script instead of executing it.

use super::{begin_sql, create_database_sql, use_database_sql, InsertTemplate, Store, StoreError};
use bank_data_gen::{Dialect, Row};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes every statement, terminated by `;`, to the wrapped writer.
pub struct SqlScriptStore {
    writer: Box<dyn Write>,
    dialect: Dialect,
    in_transaction: bool,
    statements: u64,
}

impl SqlScriptStore {
    pub fn new(writer: Box<dyn Write>, dialect: Dialect) -> Self {
        Self {
            writer,
            dialect,
            in_transaction: false,
            statements: 0,
        }
    }

    /// Script written to `path`, or to stdout for `-`
    pub fn create(path: &Path, dialect: Dialect) -> Result<Self, StoreError> {
        let writer: Box<dyn Write> = if path.as_os_str() == "-" {
            Box::new(BufWriter::new(io::stdout()))
        } else {
            let file = File::create(path).map_err(|e| {
                StoreError::Connection(format!("cannot create {}: {}", path.display(), e))
            })?;
            Box::new(BufWriter::new(file))
        };
        Ok(Self::new(writer, dialect))
    }

    /// Statements written so far
    pub fn statements(&self) -> u64 {
        self.statements
    }

    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.writer.flush()?;
        Ok(())
    }

    fn write_statement(&mut self, sql: &str) -> Result<(), StoreError> {
        writeln!(self.writer, "{};", sql)?;
        self.statements += 1;
        Ok(())
    }
}

impl Store for SqlScriptStore {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn create_database_if_absent(&mut self, name: &str) -> Result<(), StoreError> {
        self.write_statement(&create_database_sql(self.dialect, name))
    }

    fn use_database(&mut self, name: &str) -> Result<(), StoreError> {
        self.write_statement(&use_database_sql(self.dialect, name))
    }

    fn execute_ddl(&mut self, statement: &str) -> Result<(), StoreError> {
        self.write_statement(statement)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        self.write_statement(begin_sql(self.dialect))?;
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
        let sql = template.render_literal(self.dialect, rows);
        self.write_statement(&sql)?;
        Ok(rows.len() as u64)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoActiveTransaction);
        }
        self.in_transaction = false;
        self.write_statement("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.in_transaction {
            return Err(StoreError::NoActiveTransaction);
        }
        self.in_transaction = false;
        self.write_statement("ROLLBACK")
    }

    fn set_foreign_key_enforcement(&mut self, enabled: bool) -> Result<bool, StoreError> {
        match self.dialect {
            Dialect::MySql => {
                let flag = if enabled { 1 } else { 0 };
                self.write_statement(&format!("SET FOREIGN_KEY_CHECKS = {}", flag))?;
                Ok(true)
            }
            Dialect::DuckDb => Ok(false),
        }
    }

    fn finish(&mut self) -> Result<(), StoreError> {
        self.flush()
    }
}

impl Drop for SqlScriptStore {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
