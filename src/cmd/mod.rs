mod fingerprint;
mod load;
mod plan;

use bank_data_gen::{AccountPolicy, ChronologyPolicy, TableKind};
use bank_loader::config::{ConfigError, LoadConfig};
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bank-loader")]
#[command(version)]
#[command(about = "Generate and bulk-load a deterministic, FK-consistent banking dataset", long_about = None)]
pub struct Cli {
    /// Verbose logging (debug level unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Generation options shared by `load` and `fingerprint`
#[derive(Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// YAML configuration file (flags override its values)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Date that relative windows count from (YYYY-MM-DD, default: today, UTC)
    #[arg(long)]
    pub reference_date: Option<NaiveDate>,

    /// Set every table's row count (per-table flags still win)
    #[arg(long, allow_negative_numbers = true)]
    pub rows: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub branches: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub employees: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub customers: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub accounts: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub transactions: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub loans: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub loan_payments: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub cards: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    pub card_transactions: Option<i64>,

    #[arg(long, alias = "atm-locations", allow_negative_numbers = true)]
    pub atms: Option<i64>,

    /// Account policy: independent or one-per-customer
    #[arg(long)]
    pub account_policy: Option<AccountPolicy>,

    /// Date policy: unconstrained or parent-first
    #[arg(long)]
    pub chronology: Option<ChronologyPolicy>,
}

impl GenerateArgs {
    /// Defaults, then the YAML file, then these flags
    pub fn resolve(&self) -> Result<LoadConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => LoadConfig::load(path)?,
            None => LoadConfig::default(),
        };
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut LoadConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(date) = self.reference_date {
            config.reference_date = Some(date);
        }
        if let Some(rows) = self.rows {
            for kind in TableKind::ALL {
                config.rows.set(kind, rows);
            }
        }
        let per_table = [
            (TableKind::Branches, self.branches),
            (TableKind::Employees, self.employees),
            (TableKind::Customers, self.customers),
            (TableKind::Accounts, self.accounts),
            (TableKind::Transactions, self.transactions),
            (TableKind::Loans, self.loans),
            (TableKind::LoanPayments, self.loan_payments),
            (TableKind::Cards, self.cards),
            (TableKind::CardTransactions, self.card_transactions),
            (TableKind::AtmLocations, self.atms),
        ];
        for (kind, rows) in per_table {
            if let Some(rows) = rows {
                config.rows.set(kind, rows);
            }
        }
        if let Some(policy) = self.account_policy {
            config.account_policy = policy;
        }
        if let Some(policy) = self.chronology {
            config.chronology = policy;
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reset the schema and load every table in dependency order
    Load {
        #[command(flatten)]
        generate: GenerateArgs,

        /// DuckDB database file (in-memory when omitted)
        #[arg(long, conflicts_with_all = ["output", "mysql"])]
        duckdb: Option<PathBuf>,

        /// Load into a MySQL server instead of DuckDB
        #[arg(long, conflicts_with = "output")]
        mysql: bool,

        /// Write the run as an SQL script instead (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// SQL dialect of the script written by --output: mysql or duckdb
        #[arg(long, default_value = "mysql", requires = "output")]
        dialect: String,

        /// Store host
        #[arg(long)]
        host: Option<String>,

        /// Store port
        #[arg(long)]
        port: Option<u16>,

        /// Store user
        #[arg(short, long)]
        user: Option<String>,

        /// Store password
        #[arg(long, env = "BANK_LOADER_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Target database (a schema in DuckDB)
        #[arg(long)]
        database: Option<String>,

        /// Rows per insert batch (one transaction each)
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Disable FK checks during the load where the store supports it
        #[arg(long)]
        disable_fk_checks: bool,

        /// Stop issuing batches after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Show a progress bar per table
        #[arg(short, long)]
        progress: bool,

        /// Output the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the table creation/load order and foreign keys
    Plan {
        /// Show the drop order (children first) instead
        #[arg(long)]
        reverse: bool,

        /// Print the DDL for this dialect: mysql or duckdb
        #[arg(long)]
        ddl: Option<String>,
    },

    /// Generate without a store and print a SHA-256 digest per table
    Fingerprint {
        #[command(flatten)]
        generate: GenerateArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Load {
            generate,
            duckdb,
            mysql,
            output,
            dialect,
            host,
            port,
            user,
            password,
            database,
            batch_size,
            disable_fk_checks,
            timeout,
            progress,
            json,
        } => {
            let mut config = generate.resolve()?;
            let connection = &mut config.connection;
            if let Some(host) = host {
                connection.host = host;
            }
            if let Some(port) = port {
                connection.port = port;
            }
            if let Some(user) = user {
                connection.user = user;
            }
            if let Some(password) = password {
                connection.password = password;
            }
            if let Some(database) = database {
                connection.database = database;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            if disable_fk_checks {
                config.disable_fk_checks = true;
            }
            if timeout.is_some() {
                config.timeout_secs = timeout;
            }

            let target = match (output, mysql) {
                (Some(path), _) => load::Target::Script {
                    path,
                    dialect: dialect.parse().map_err(anyhow::Error::msg)?,
                },
                (None, true) => load::Target::MySql,
                (None, false) => load::Target::DuckDb(duckdb),
            };
            load::run(config, target, progress, json)
        }
        Commands::Plan { reverse, ddl } => plan::run(reverse, ddl),
        Commands::Fingerprint { generate, json } => fingerprint::run(&generate, json),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "bank-loader", &mut io::stdout());
            Ok(())
        }
    }
}
