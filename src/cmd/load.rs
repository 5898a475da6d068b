use bank_data_gen::Dialect;
use bank_loader::config::LoadConfig;
use bank_loader::error::LoadError;
use bank_loader::loader::{LoadOrchestrator, LoadReport};
use bank_loader::store::{DuckDbStore, SqlScriptStore, Store};
use std::path::PathBuf;
use tracing::info;

/// Where the rows go
pub enum Target {
    DuckDb(Option<PathBuf>),
    MySql,
    Script { path: PathBuf, dialect: Dialect },
}

pub fn run(config: LoadConfig, target: Target, progress: bool, json: bool) -> anyhow::Result<()> {
    // Reject bad configuration before opening anything.
    config.validate().map_err(LoadError::from)?;

    let mut store = open(&config, &target)?;
    let orchestrator = LoadOrchestrator::new(config).with_progress(progress && !json);
    let report = orchestrator.run(&mut store)?;
    drop(store);

    print_report(&report, &target, json)
}

fn open(config: &LoadConfig, target: &Target) -> Result<Box<dyn Store>, LoadError> {
    let store: Box<dyn Store> = match target {
        Target::DuckDb(Some(path)) => {
            info!(path = %path.display(), "opening DuckDB database");
            Box::new(DuckDbStore::open(path).map_err(LoadError::Connection)?)
        }
        Target::DuckDb(None) => Box::new(DuckDbStore::open_in_memory().map_err(LoadError::Connection)?),
        Target::Script { path, dialect } => {
            Box::new(SqlScriptStore::create(path, *dialect).map_err(LoadError::Connection)?)
        }
        Target::MySql => open_mysql(config)?,
    };
    Ok(store)
}

#[cfg(feature = "mysql")]
fn open_mysql(config: &LoadConfig) -> Result<Box<dyn Store>, LoadError> {
    let conn = &config.connection;
    info!(host = %conn.host, port = conn.port, user = %conn.user, "connecting to MySQL");
    let store = bank_loader::store::MySqlStore::connect(conn).map_err(LoadError::Connection)?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "mysql"))]
fn open_mysql(_config: &LoadConfig) -> Result<Box<dyn Store>, LoadError> {
    Err(LoadError::Connection(bank_loader::store::StoreError::Connection(
        "this build has no MySQL support; rebuild with --features mysql".to_string(),
    )))
}

fn print_report(report: &LoadReport, target: &Target, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    // Keep stdout clean when the script itself goes there.
    if let Target::Script { path, .. } = target {
        if path.as_os_str() == "-" {
            eprint!("{}", report);
            return Ok(());
        }
    }
    print!("{}", report);
    Ok(())
}
