//! Load configuration: connection, seed, batch size, row counts and value domains.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! command-line flags. Nothing touches a store until [`LoadConfig::validate`]
//! has accepted the result.

use bank_data_gen::{
    AccountPolicy, ChronologyPolicy, DomainConfig, DomainError, GenerationSettings, RowCounts,
    TableKind,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Invalid or unreadable configuration. Always reported before any store call.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("batch size must be at least 1")]
    InvalidBatchSize,

    #[error("row count for {table} must not be negative (got {count})")]
    NegativeRowCount { table: TableKind, count: i64 },

    #[error("database name must not be empty")]
    EmptyDatabaseName,

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("cannot read config file {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },
}

/// Store connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: "root".to_string(),
            database: "BankOf420".to_string(),
        }
    }
}

/// Requested rows per table. Signed so a negative count is a validation
/// error rather than a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableCounts {
    pub branches: i64,
    pub employees: i64,
    pub customers: i64,
    pub accounts: i64,
    pub transactions: i64,
    pub loans: i64,
    pub loan_payments: i64,
    pub cards: i64,
    pub card_transactions: i64,
    #[serde(alias = "atms")]
    pub atm_locations: i64,
}

impl Default for TableCounts {
    fn default() -> Self {
        Self {
            branches: 100,
            employees: 500,
            customers: 500_000,
            accounts: 500_000,
            transactions: 1_000_000,
            loans: 5_000,
            loan_payments: 20_000,
            cards: 100_000,
            card_transactions: 50_000,
            atm_locations: 100,
        }
    }
}

impl TableCounts {
    /// Same count for every table
    pub fn uniform(rows: i64) -> Self {
        let mut counts = Self::default();
        for kind in TableKind::ALL {
            counts.set(kind, rows);
        }
        counts
    }

    pub fn get(&self, kind: TableKind) -> i64 {
        match kind {
            TableKind::Branches => self.branches,
            TableKind::Employees => self.employees,
            TableKind::Customers => self.customers,
            TableKind::Accounts => self.accounts,
            TableKind::Transactions => self.transactions,
            TableKind::Loans => self.loans,
            TableKind::LoanPayments => self.loan_payments,
            TableKind::Cards => self.cards,
            TableKind::CardTransactions => self.card_transactions,
            TableKind::AtmLocations => self.atm_locations,
        }
    }

    pub fn set(&mut self, kind: TableKind, rows: i64) {
        let slot = match kind {
            TableKind::Branches => &mut self.branches,
            TableKind::Employees => &mut self.employees,
            TableKind::Customers => &mut self.customers,
            TableKind::Accounts => &mut self.accounts,
            TableKind::Transactions => &mut self.transactions,
            TableKind::Loans => &mut self.loans,
            TableKind::LoanPayments => &mut self.loan_payments,
            TableKind::Cards => &mut self.cards,
            TableKind::CardTransactions => &mut self.card_transactions,
            TableKind::AtmLocations => &mut self.atm_locations,
        };
        *slot = rows;
    }

    fn validate(&self) -> Result<RowCounts, ConfigError> {
        let mut counts = RowCounts::default();
        for kind in TableKind::ALL {
            let count = self.get(kind);
            let rows =
                usize::try_from(count).map_err(|_| ConfigError::NegativeRowCount { table: kind, count })?;
            counts.set(kind, rows);
        }
        Ok(counts)
    }
}

/// Complete configuration of a load run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub connection: ConnectionConfig,
    pub seed: u64,
    pub batch_size: usize,
    /// "Today" for relative date windows; defaults to the current UTC date
    pub reference_date: Option<NaiveDate>,
    pub rows: TableCounts,
    pub account_policy: AccountPolicy,
    pub chronology: ChronologyPolicy,
    /// Turn FK checks off for the load where the store supports it
    pub disable_fk_checks: bool,
    /// Stop issuing batches after this many seconds
    pub timeout_secs: Option<u64>,
    pub domains: DomainConfig,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            seed: 42,
            batch_size: 2_000,
            reference_date: None,
            rows: TableCounts::default(),
            account_policy: AccountPolicy::default(),
            chronology: ChronologyPolicy::default(),
            disable_fk_checks: false,
            timeout_secs: None,
            domains: DomainConfig::default(),
        }
    }
}

impl LoadConfig {
    /// Load configuration from a YAML file, on top of the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check everything that can be checked without a store
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation_settings(Utc::now().date_naive()).map(|_| ())
    }

    /// Reference date for this run, falling back to `today`
    pub fn reference_date_or(&self, today: NaiveDate) -> NaiveDate {
        self.reference_date.unwrap_or(today)
    }

    /// Validate and convert into generator settings, pinning dates to `today`
    /// unless a reference date is configured.
    pub fn generation_settings(&self, today: NaiveDate) -> Result<GenerationSettings, ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize);
        }
        if self.connection.database.trim().is_empty() {
            return Err(ConfigError::EmptyDatabaseName);
        }
        let counts = self.rows.validate()?;

        let reference_date = self.reference_date_or(today);
        // Only for validation; the generator resolves its own copy.
        self.domains.resolve(reference_date)?;

        Ok(GenerationSettings {
            seed: self.seed,
            reference_date,
            counts,
            domains: self.domains.clone(),
            account_policy: self.account_policy,
            chronology: self.chronology,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let config = LoadConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rows.transactions, 1_000_000);
        assert_eq!(config.batch_size, 2_000);
    }

    #[test]
    fn test_uniform_counts() {
        let counts = TableCounts::uniform(50_000);
        for kind in TableKind::ALL {
            assert_eq!(counts.get(kind), 50_000);
        }
    }
}
