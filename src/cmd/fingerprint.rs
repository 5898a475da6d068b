use super::GenerateArgs;
use bank_loader::error::LoadError;
use bank_loader::fingerprint::fingerprint;
use chrono::Utc;

pub fn run(args: &GenerateArgs, json: bool) -> anyhow::Result<()> {
    let config = args.resolve()?;
    let settings = config
        .generation_settings(Utc::now().date_naive())
        .map_err(LoadError::from)?;
    let tables = fingerprint(&settings)?;

    if json {
        let output = serde_json::json!({
            "seed": settings.seed,
            "reference_date": settings.reference_date,
            "tables": tables,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("seed {} / reference date {}", settings.seed, settings.reference_date);
    for t in &tables {
        println!("  {:<20} {:>10} rows  {}", t.table.name(), t.rows, t.sha256);
    }
    Ok(())
}
