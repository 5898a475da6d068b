use bank_data_gen::{Dialect, Schema};

pub fn run(reverse: bool, ddl: Option<String>) -> anyhow::Result<()> {
    let schema = Schema::bank();
    let tables = if reverse {
        schema.drop_order()?
    } else {
        schema.dependency_order()?
    };

    if let Some(dialect) = ddl {
        let dialect: Dialect = dialect.parse().map_err(anyhow::Error::msg)?;
        for table in tables {
            let statements = if reverse {
                table.drop_statements(dialect)
            } else {
                table.create_statements(dialect)
            };
            for statement in statements {
                println!("{};", statement);
            }
            println!();
        }
        return Ok(());
    }

    let label = if reverse { "Drop order" } else { "Load order" };
    println!("{} ({} tables):", label, tables.len());
    for (idx, table) in tables.iter().enumerate() {
        let refs: Vec<String> = table
            .foreign_keys()
            .iter()
            .map(|(col, fk)| format!("{} -> {}.{}", col, fk.to_table, fk.to_column))
            .collect();
        if refs.is_empty() {
            println!("  {:>2}. {}", idx + 1, table.name);
        } else {
            println!("  {:>2}. {:<18} {}", idx + 1, table.name, refs.join(", "));
        }
    }
    Ok(())
}
