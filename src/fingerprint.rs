//! Store-free generation with a SHA-256 digest per table.
//!
//! Two runs with the same seed, reference date, counts and domains must print
//! identical digests; this is the cheap way to check that without a database.

use bank_data_gen::{Dialect, GenerationSettings, Generator, TableData, TableKind, DependencyPlan};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::ConfigError;
use crate::error::LoadError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableFingerprint {
    pub table: TableKind,
    pub rows: usize,
    pub sha256: String,
}

/// Digest of a table's rows, in order, rendered as DuckDB literals
pub fn digest(data: &TableData) -> String {
    let mut hasher = Sha256::new();
    for row in &data.rows {
        for (i, value) in row.iter().enumerate() {
            if i > 0 {
                hasher.update(b"\t");
            }
            hasher.update(value.to_sql(Dialect::DuckDb).as_bytes());
        }
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Generate every table in dependency order and digest each one
pub fn fingerprint(settings: &GenerationSettings) -> Result<Vec<TableFingerprint>, LoadError> {
    let plan = DependencyPlan::bank()?;
    let mut generator = Generator::new(plan, settings).map_err(ConfigError::from)?;
    let mut fingerprints = Vec::with_capacity(TableKind::ALL.len());

    for kind in generator.plan().order().to_vec() {
        let mut data = generator
            .build_table(kind)
            .map_err(|source| LoadError::Generate { table: kind, source })?;
        fingerprints.push(TableFingerprint {
            table: kind,
            rows: data.len(),
            sha256: digest(&data),
        });
        generator.resolve(kind, data.len() as u64, std::mem::take(&mut data.anchors));
    }

    Ok(fingerprints)
}
