//! Shared helpers for integration tests: a store wrapper that records every
//! call and can inject failures or cancellation.

#![allow(dead_code)]

use bank_data_gen::{Dialect, Row};
use bank_loader::config::LoadConfig;
use bank_loader::loader::CancelToken;
use bank_loader::store::{InsertTemplate, SqlScriptStore, Store, StoreError};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateDatabase(String),
    UseDatabase(String),
    Ddl(String),
    Begin,
    Insert { table: String, rows: Vec<Row> },
    Commit,
    Rollback,
    ForeignKeys(bool),
    Finish,
}

/// Wraps a real store, recording calls and optionally failing one insert.
pub struct RecordingStore<S: Store> {
    pub inner: S,
    pub calls: Vec<Call>,
    fail_insert: Option<(String, usize)>,
    cancel_after_commits: Option<(CancelToken, usize)>,
    short_by: u64,
    commits: usize,
}

impl RecordingStore<SqlScriptStore> {
    /// Recording store that executes nothing
    pub fn detached() -> Self {
        Self::new(SqlScriptStore::new(Box::new(std::io::sink()), Dialect::MySql))
    }
}

impl<S: Store> RecordingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: Vec::new(),
            fail_insert: None,
            cancel_after_commits: None,
            short_by: 0,
            commits: 0,
        }
    }

    /// Fail the `nth` (1-based) insert into `table`
    pub fn fail_insert(mut self, table: &str, nth: usize) -> Self {
        self.fail_insert = Some((table.to_string(), nth));
        self
    }

    /// Cancel `token` once `commits` commits have gone through
    pub fn cancel_after(mut self, token: CancelToken, commits: usize) -> Self {
        self.cancel_after_commits = Some((token, commits));
        self
    }

    /// Report `missing` fewer affected rows than the inner store did
    pub fn short_by(mut self, missing: u64) -> Self {
        self.short_by = missing;
        self
    }

    /// Row counts of each insert into `table`, in order
    pub fn insert_sizes(&self, table: &str) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Insert { table: t, rows } if t == table => Some(rows.len()),
                _ => None,
            })
            .collect()
    }

    /// All rows inserted into `table`, in order
    pub fn inserted_rows(&self, table: &str) -> Vec<Row> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Insert { table: t, rows } if t == table => Some(rows.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl<S: Store> Store for RecordingStore<S> {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    fn create_database_if_absent(&mut self, name: &str) -> Result<(), StoreError> {
        self.calls.push(Call::CreateDatabase(name.to_string()));
        self.inner.create_database_if_absent(name)
    }

    fn use_database(&mut self, name: &str) -> Result<(), StoreError> {
        self.calls.push(Call::UseDatabase(name.to_string()));
        self.inner.use_database(name)
    }

    fn execute_ddl(&mut self, statement: &str) -> Result<(), StoreError> {
        self.calls.push(Call::Ddl(statement.to_string()));
        self.inner.execute_ddl(statement)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        self.calls.push(Call::Begin);
        self.inner.begin()
    }

    fn execute_batch_insert(
        &mut self,
        template: &InsertTemplate,
        rows: &[Row],
    ) -> Result<u64, StoreError> {
        self.calls.push(Call::Insert {
            table: template.table.clone(),
            rows: rows.to_vec(),
        });
        if let Some((table, nth)) = &self.fail_insert {
            if *table == template.table && self.insert_sizes(table).len() == *nth {
                return Err(StoreError::ConstraintViolation("injected failure".to_string()));
            }
        }
        let affected = self.inner.execute_batch_insert(template, rows)?;
        Ok(affected.saturating_sub(self.short_by))
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.calls.push(Call::Commit);
        self.inner.commit()?;
        self.commits += 1;
        if let Some((token, after)) = &self.cancel_after_commits {
            if self.commits >= *after {
                token.cancel();
            }
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.calls.push(Call::Rollback);
        self.inner.rollback()
    }

    fn set_foreign_key_enforcement(&mut self, enabled: bool) -> Result<bool, StoreError> {
        self.calls.push(Call::ForeignKeys(enabled));
        self.inner.set_foreign_key_enforcement(enabled)
    }

    fn finish(&mut self) -> Result<(), StoreError> {
        self.calls.push(Call::Finish);
        self.inner.finish()
    }
}

pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

/// Small configuration with every table empty unless set, pinned dates
pub fn config_with(counts: &[(&str, i64)], batch_size: usize, seed: u64) -> LoadConfig {
    let mut config = LoadConfig::default();
    config.rows = bank_loader::config::TableCounts::uniform(0);
    for (table, rows) in counts {
        config.rows.set(table.parse().unwrap(), *rows);
    }
    config.batch_size = batch_size;
    config.seed = seed;
    config.reference_date = Some(reference_date());
    config
}

/// Rows `1..=n` of a single integer column
pub fn int_rows(n: i64) -> Vec<Row> {
    (1..=n).map(|i| vec![bank_data_gen::SqlValue::Int(i)]).collect()
}
