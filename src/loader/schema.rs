use crate::error::LoadError;
use crate::store::Store;
use bank_data_gen::Schema;
use tracing::{info, warn};

/// Issues the DDL that gives every run a clean database.
pub struct SchemaManager<'a> {
    schema: &'a Schema,
}

impl<'a> SchemaManager<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Create the database if needed, drop every table children-first, then
    /// create every table parents-first.
    pub fn reset<S: Store + ?Sized>(&self, store: &mut S, database: &str) -> Result<(), LoadError> {
        let dialect = store.dialect();
        let ddl_error = |table: &str| {
            let table = table.to_string();
            move |source| LoadError::Ddl { table, source }
        };

        store
            .create_database_if_absent(database)
            .map_err(ddl_error(database))?;
        store.use_database(database).map_err(ddl_error(database))?;

        for table in self.schema.drop_order()? {
            for statement in table.drop_statements(dialect) {
                store.execute_ddl(&statement).map_err(ddl_error(&table.name))?;
            }
        }

        let order = self.schema.dependency_order()?;
        for table in &order {
            for statement in table.create_statements(dialect) {
                store.execute_ddl(&statement).map_err(ddl_error(&table.name))?;
            }
        }

        info!(database, tables = order.len(), %dialect, "schema reset");
        Ok(())
    }

    /// Turn FK enforcement off for the load. Returns whether it was changed.
    pub fn disable_fk_checks<S: Store + ?Sized>(store: &mut S) -> bool {
        match store.set_foreign_key_enforcement(false) {
            Ok(true) => {
                info!("foreign key checks disabled for the load");
                true
            }
            Ok(false) => {
                warn!("store cannot toggle foreign key checks; loading with checks enabled");
                false
            }
            Err(e) => {
                warn!(error = %e, "failed to disable foreign key checks; loading with checks enabled");
                false
            }
        }
    }

    /// Turn FK enforcement back on after [`SchemaManager::disable_fk_checks`]
    pub fn restore_fk_checks<S: Store + ?Sized>(store: &mut S) {
        match store.set_foreign_key_enforcement(true) {
            Ok(_) => info!("foreign key checks restored"),
            Err(e) => warn!(error = %e, "failed to restore foreign key checks"),
        }
    }
}
