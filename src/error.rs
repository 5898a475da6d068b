//! Error taxonomy of a load run.

use crate::config::ConfigError;
use crate::store::StoreError;
use bank_data_gen::{GenerateError, PlanError, TableKind};
use thiserror::Error;

/// Every way a load run can end early. All of them are fatal to the run.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("invalid configuration")]
    Configuration(#[from] ConfigError),

    #[error("invalid schema")]
    Plan(#[from] PlanError),

    #[error("cannot connect to store")]
    Connection(#[source] StoreError),

    #[error("DDL failed for {table}")]
    Ddl {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("row generation failed for {table}")]
    Generate {
        table: TableKind,
        #[source]
        source: GenerateError,
    },

    #[error("batch insert failed for {table} at batch {batch} ({committed_rows} rows already committed)")]
    BatchInsert {
        table: String,
        batch: usize,
        committed_rows: u64,
        #[source]
        source: StoreError,
    },

    #[error("load cancelled during {table} ({committed_rows} rows already committed)")]
    Cancelled { table: String, committed_rows: u64 },

    #[error("store failed to finish the run")]
    Finish(#[source] StoreError),
}

impl LoadError {
    /// Stage of the run the error belongs to
    pub fn stage(&self) -> &'static str {
        match self {
            LoadError::Configuration(_) | LoadError::Plan(_) => "configuration",
            LoadError::Connection(_) => "connection",
            LoadError::Ddl { .. } => "schema",
            LoadError::Generate { .. } => "generation",
            LoadError::BatchInsert { .. } => "insert",
            LoadError::Cancelled { .. } => "cancelled",
            LoadError::Finish(_) => "finish",
        }
    }

    /// Table the error is attributed to, if any
    pub fn table(&self) -> Option<&str> {
        match self {
            LoadError::Ddl { table, .. }
            | LoadError::BatchInsert { table, .. }
            | LoadError::Cancelled { table, .. } => Some(table),
            LoadError::Generate { table, .. } => Some(table.name()),
            _ => None,
        }
    }
}
