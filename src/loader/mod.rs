//! Load orchestration: schema reset, then generate-and-load each table in
//! dependency order.
//!
//! A table's rows are generated only after every parent table is fully
//! committed, and its committed row count becomes the identifier range its
//! children draw foreign keys from.
//!
//! # Example
//!
//! ```no_run
//! use bank_loader::config::LoadConfig;
//! use bank_loader::loader::LoadOrchestrator;
//! use bank_loader::store::DuckDbStore;
//!
//! let mut store = DuckDbStore::open_in_memory().unwrap();
//! let report = LoadOrchestrator::new(LoadConfig::default())
//!     .run(&mut store)
//!     .unwrap();
//! println!("{}", report);
//! ```

mod batch;
mod cancel;
mod schema;

pub use batch::{BatchLoader, BatchOutcome, BatchState};
pub use cancel::CancelToken;
pub use schema::SchemaManager;

use crate::config::{ConfigError, LoadConfig};
use crate::error::LoadError;
use crate::progress;
use crate::store::{InsertTemplate, Store};
use bank_data_gen::{DependencyPlan, Generator, Schema, TableKind};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Per-table result of a load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: TableKind,
    pub requested: u64,
    pub rows: u64,
    pub batches: usize,
}

/// Final report of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub database: String,
    pub seed: u64,
    pub reference_date: NaiveDate,
    pub batch_size: usize,
    pub tables: Vec<TableReport>,
    pub elapsed_secs: f64,
}

impl LoadReport {
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }

    pub fn rows_for(&self, kind: TableKind) -> Option<u64> {
        self.tables.iter().find(|t| t.table == kind).map(|t| t.rows)
    }
}

impl std::fmt::Display for LoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Loaded {} rows into {} ({} tables) in {:.2}s",
            self.total_rows(),
            self.database,
            self.tables.len(),
            self.elapsed_secs
        )?;
        for t in &self.tables {
            writeln!(f, "  {:<20} {:>10} rows  {:>6} batches", t.table.name(), t.rows, t.batches)?;
        }
        Ok(())
    }
}

/// Top-level driver of a load run.
pub struct LoadOrchestrator {
    config: LoadConfig,
    schema: Schema,
    cancel: CancelToken,
    progress: bool,
    today: Option<NaiveDate>,
}

impl LoadOrchestrator {
    pub fn new(config: LoadConfig) -> Self {
        let cancel = match config.timeout_secs {
            Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
            None => CancelToken::new(),
        };
        Self {
            config,
            schema: Schema::bank(),
            cancel,
            progress: false,
            today: None,
        }
    }

    /// Replace the cancellation token (the configured timeout is dropped)
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Override "today" when no reference date is configured
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Run the whole load against `store`. Any error aborts the run; tables and
    /// batches committed before the error stay committed.
    pub fn run<S: Store + ?Sized>(&self, store: &mut S) -> Result<LoadReport, LoadError> {
        let start = Instant::now();
        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        let settings = self.config.generation_settings(today)?;
        let plan = DependencyPlan::from_schema(&self.schema)?;
        let mut generator = Generator::new(plan, &settings).map_err(ConfigError::from)?;

        let database = self.config.connection.database.as_str();
        info!(
            database,
            seed = settings.seed,
            reference_date = %settings.reference_date,
            batch_size = self.config.batch_size,
            "starting load"
        );

        SchemaManager::new(&self.schema).reset(store, database)?;

        let fk_disabled = self.config.disable_fk_checks && SchemaManager::disable_fk_checks(store);
        let result = self.load_tables(store, &mut generator);
        if fk_disabled {
            SchemaManager::restore_fk_checks(store);
        }
        let tables = result?;
        store.finish().map_err(LoadError::Finish)?;

        let report = LoadReport {
            database: database.to_string(),
            seed: settings.seed,
            reference_date: settings.reference_date,
            batch_size: self.config.batch_size,
            tables,
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        info!(rows = report.total_rows(), elapsed_secs = report.elapsed_secs, "load complete");
        Ok(report)
    }

    fn load_tables<S: Store + ?Sized>(
        &self,
        store: &mut S,
        generator: &mut Generator,
    ) -> Result<Vec<TableReport>, LoadError> {
        let loader = BatchLoader::new(self.config.batch_size);
        let order = generator.plan().order().to_vec();
        let mut reports = Vec::with_capacity(order.len());

        for kind in order {
            let requested = self.config.rows.get(kind).max(0) as u64;
            let mut data = generator
                .build_table(kind)
                .map_err(|source| LoadError::Generate { table: kind, source })?;
            if requested > 0 && data.is_empty() {
                warn!(table = %kind, requested, "parent table is empty; generating no rows");
            }
            info!(table = %kind, rows = data.len(), batches = loader.batch_count(data.len()), "loading table");

            let template = InsertTemplate::for_kind(kind);
            let bar = self.progress.then(|| progress::table_bar(kind.name(), data.len() as u64));
            let mut observer = |state: BatchState| {
                if let (Some(pb), BatchState::Committed { committed_rows, .. }) = (&bar, state) {
                    pb.set_position(committed_rows);
                }
            };
            let outcome = loader.load(store, &template, &data.rows, &self.cancel, &mut observer);
            if let Some(pb) = &bar {
                pb.finish_and_clear();
            }
            let outcome = outcome?;

            generator.resolve(kind, outcome.rows, std::mem::take(&mut data.anchors));
            info!(table = %kind, rows = outcome.rows, batches = outcome.batches, "table committed");
            reports.push(TableReport {
                table: kind,
                requested,
                rows: outcome.rows,
                batches: outcome.batches,
            });
        }

        Ok(reports)
    }
}
