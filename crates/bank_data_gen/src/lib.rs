//! Synthetic data generator for the ten-table banking schema.
//!
//! Generates deterministic, FK-consistent rows for branches, employees,
//! customers, accounts, transactions, loans, loan payments, cards, card
//! transactions and ATM locations. Rows are produced one table at a time,
//! in dependency order, so a loader can commit each parent before its
//! children are built.
//!
//! # Example
//!
//! ```rust
//! use bank_data_gen::{
//!     AccountPolicy, ChronologyPolicy, DependencyPlan, DomainConfig, GenerationSettings,
//!     Generator, RowCounts,
//! };
//! use chrono::NaiveDate;
//!
//! let settings = GenerationSettings {
//!     seed: 42,
//!     reference_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
//!     counts: RowCounts::uniform(10),
//!     domains: DomainConfig::default(),
//!     account_policy: AccountPolicy::Independent,
//!     chronology: ChronologyPolicy::Unconstrained,
//! };
//!
//! let mut gen = Generator::new(DependencyPlan::bank().unwrap(), &settings).unwrap();
//! let tables = gen.generate_all().unwrap();
//! assert_eq!(tables.len(), 10);
//! ```

pub mod domain;
pub mod fake;
pub mod generator;
pub mod plan;
pub mod rng;
pub mod schema;

pub use domain::{DateWindow, DomainConfig, DomainError, Domains, IntRange, RateRange, WindowSpec};
pub use generator::{
    columns_of, AccountPolicy, ChronologyPolicy, GenerateError, GenerationSettings, Generator,
    IdRange, ParentRanges, Row, RowBuilder, RowCounts, SqlValue, TableData,
};
pub use plan::{DependencyPlan, PlanError, TableKind};
pub use rng::SeedSource;
pub use schema::{Column, Dialect, ForeignKey, Schema, SqlType, Table};
