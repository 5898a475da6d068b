//! Batched, transactional insertion of one table's rows.
//!
//! Rows are cut into contiguous chunks of at most `batch_size` rows. Each
//! chunk is one transaction: begin, one multi-row insert, commit. Chunks are
//! committed strictly in order and the first failure rolls back the open
//! transaction and ends the load.

use super::CancelToken;
use crate::error::LoadError;
use crate::store::{InsertTemplate, Store, StoreError};
use bank_data_gen::Row;
use tracing::{debug, warn};

/// Progress of a [`BatchLoader::load`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Pending,
    /// Batch `batch` (1-based) of `rows` rows is being inserted
    Inserting { batch: usize, rows: usize },
    /// Batch `batch` is durable; `committed_rows` rows are committed in total
    Committed { batch: usize, committed_rows: u64 },
    Done { batches: usize, committed_rows: u64 },
    /// Batch `batch` failed and was rolled back
    Failed { batch: usize, committed_rows: u64 },
}

/// Result of a completed table load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub rows: u64,
    pub batches: usize,
}

/// Loads a table in fixed-size, individually committed batches.
#[derive(Debug, Clone, Copy)]
pub struct BatchLoader {
    batch_size: usize,
}

impl BatchLoader {
    /// `batch_size` of 0 is treated as 1; configuration rejects it earlier.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Partition `rows` into contiguous batches
    pub fn chunks<'a>(&self, rows: &'a [Row]) -> std::slice::Chunks<'a, Row> {
        rows.chunks(self.batch_size)
    }

    /// Number of batches `rows` rows take
    pub fn batch_count(&self, rows: usize) -> usize {
        rows.div_ceil(self.batch_size)
    }

    /// Insert `rows` into `table`, reporting each state change to `observer`.
    pub fn load<S: Store + ?Sized>(
        &self,
        store: &mut S,
        template: &InsertTemplate,
        rows: &[Row],
        cancel: &CancelToken,
        observer: &mut dyn FnMut(BatchState),
    ) -> Result<BatchOutcome, LoadError> {
        let table = template.table.as_str();
        let mut committed_rows: u64 = 0;
        let mut batches = 0;
        observer(BatchState::Pending);

        for (idx, chunk) in self.chunks(rows).enumerate() {
            let batch = idx + 1;
            if cancel.is_cancelled() {
                return Err(LoadError::Cancelled {
                    table: table.to_string(),
                    committed_rows,
                });
            }

            observer(BatchState::Inserting {
                batch,
                rows: chunk.len(),
            });
            let inserted = match self.insert_one(store, template, chunk) {
                Ok(inserted) => inserted,
                Err(source) => {
                    Self::rollback(store, table, batch);
                    observer(BatchState::Failed {
                        batch,
                        committed_rows,
                    });
                    return Err(LoadError::BatchInsert {
                        table: table.to_string(),
                        batch,
                        committed_rows,
                        source,
                    });
                }
            };

            committed_rows += inserted;
            batches = batch;
            debug!(table, batch, rows = chunk.len(), committed_rows, "batch committed");
            observer(BatchState::Committed {
                batch,
                committed_rows,
            });
        }

        observer(BatchState::Done {
            batches,
            committed_rows,
        });
        Ok(BatchOutcome {
            rows: committed_rows,
            batches,
        })
    }

    fn insert_one<S: Store + ?Sized>(
        &self,
        store: &mut S,
        template: &InsertTemplate,
        chunk: &[Row],
    ) -> Result<u64, StoreError> {
        store.begin()?;
        let affected = store.execute_batch_insert(template, chunk)?;
        let expected = chunk.len() as u64;
        if affected != expected {
            return Err(StoreError::RowCountMismatch { expected, affected });
        }
        store.commit()?;
        Ok(affected)
    }

    fn rollback<S: Store + ?Sized>(store: &mut S, table: &str, batch: usize) {
        if let Err(e) = store.rollback() {
            // The insert error is the one worth reporting.
            warn!(table, batch, error = %e, "rollback failed");
        }
    }
}
