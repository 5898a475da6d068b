//! Schema model for the banking dataset.
//!
//! Tables, columns and foreign keys are declared once, dialect-agnostic, and
//! rendered to MySQL or DuckDB DDL. The declared FK edges also drive the
//! dependency order used for creating, dropping and loading tables.

use crate::plan::PlanError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Target SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    DuckDb,
}

impl Dialect {
    /// Quote an identifier for this dialect
    pub fn quote(&self, ident: &str) -> String {
        match self {
            Dialect::MySql => format!("`{}`", ident),
            Dialect::DuckDb => format!("\"{}\"", ident),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "duckdb" | "duck" => Ok(Dialect::DuckDb),
            _ => Err(format!("Unknown dialect: {}. Use mysql or duckdb", s)),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::MySql => write!(f, "mysql"),
            Dialect::DuckDb => write!(f, "duckdb"),
        }
    }
}

/// SQL data types (dialect-agnostic)
#[derive(Debug, Clone, PartialEq)]
pub enum SqlType {
    /// Store-assigned 32-bit key
    Serial,
    /// Store-assigned 64-bit key
    BigSerial,
    Integer,
    VarChar(u16),
    Decimal(u8, u8),
    Float,
    Date,
    Timestamp,
}

impl SqlType {
    /// Returns the MySQL type string
    pub fn to_mysql(&self) -> String {
        match self {
            SqlType::Serial => "INT AUTO_INCREMENT".to_string(),
            SqlType::BigSerial => "BIGINT AUTO_INCREMENT".to_string(),
            SqlType::Integer => "INT".to_string(),
            SqlType::VarChar(n) => format!("VARCHAR({})", n),
            SqlType::Decimal(p, s) => format!("DECIMAL({},{})", p, s),
            SqlType::Float => "FLOAT".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Timestamp => "DATETIME".to_string(),
        }
    }

    /// Returns the DuckDB type string.
    ///
    /// Serial keys render as plain integers; the default from the table's
    /// sequence is attached by [`Table::create_statements`].
    pub fn to_duckdb(&self) -> String {
        match self {
            SqlType::Serial => "INTEGER".to_string(),
            SqlType::BigSerial => "BIGINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::VarChar(n) => format!("VARCHAR({})", n),
            SqlType::Decimal(p, s) => format!("DECIMAL({},{})", p, s),
            SqlType::Float => "FLOAT".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        match dialect {
            Dialect::MySql => self.to_mysql(),
            Dialect::DuckDb => self.to_duckdb(),
        }
    }

    pub fn is_serial(&self) -> bool {
        matches!(self, SqlType::Serial | SqlType::BigSerial)
    }
}

/// Foreign key constraint
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKey {
    pub to_table: String,
    pub to_column: String,
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            primary_key: false,
            foreign_key: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKey {
            to_table: table.into(),
            to_column: column.into(),
        });
        self
    }
}

/// Table definition
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, col: Column) -> Self {
        self.columns.push(col);
        self
    }

    /// Get the primary key column name (assumes single-column PK)
    pub fn primary_key_column(&self) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name.as_str())
    }

    /// Get all foreign key relationships
    pub fn foreign_keys(&self) -> Vec<(&str, &ForeignKey)> {
        self.columns
            .iter()
            .filter_map(|c| c.foreign_key.as_ref().map(|fk| (c.name.as_str(), fk)))
            .collect()
    }

    /// Distinct parent tables, in column order
    pub fn parents(&self) -> Vec<&str> {
        let mut parents: Vec<&str> = Vec::new();
        for (_, fk) in self.foreign_keys() {
            if fk.to_table != self.name && !parents.contains(&fk.to_table.as_str()) {
                parents.push(fk.to_table.as_str());
            }
        }
        parents
    }

    /// Columns supplied on insert (everything except store-assigned keys)
    pub fn insert_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| !c.sql_type.is_serial())
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Name of the DuckDB sequence backing the serial key
    pub fn sequence_name(&self) -> String {
        format!("{}_id_seq", self.name)
    }

    fn has_serial_key(&self) -> bool {
        self.columns.iter().any(|c| c.sql_type.is_serial())
    }

    /// Statements that create this table, in execution order
    pub fn create_statements(&self, dialect: Dialect) -> Vec<String> {
        let mut statements = Vec::new();
        let serial_default = match dialect {
            Dialect::DuckDb if self.has_serial_key() => {
                statements.push(format!(
                    "CREATE SEQUENCE {} START 1",
                    dialect.quote(&self.sequence_name())
                ));
                Some(format!(" DEFAULT nextval('{}')", self.sequence_name()))
            }
            _ => None,
        };

        let mut defs: Vec<String> = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let mut def = format!("    {} {}", dialect.quote(&col.name), col.sql_type.to_sql(dialect));
            if col.primary_key {
                def.push_str(" PRIMARY KEY");
            }
            if col.sql_type.is_serial() {
                if let Some(ref default) = serial_default {
                    def.push_str(default);
                }
            }
            defs.push(def);
        }
        for (column, fk) in self.foreign_keys() {
            defs.push(format!(
                "    FOREIGN KEY ({}) REFERENCES {}({})",
                dialect.quote(column),
                dialect.quote(&fk.to_table),
                dialect.quote(&fk.to_column)
            ));
        }

        statements.push(format!(
            "CREATE TABLE {} (\n{}\n)",
            dialect.quote(&self.name),
            defs.join(",\n")
        ));
        statements
    }

    /// Statements that drop this table if present, in execution order
    pub fn drop_statements(&self, dialect: Dialect) -> Vec<String> {
        let mut statements = vec![format!("DROP TABLE IF EXISTS {}", dialect.quote(&self.name))];
        if dialect == Dialect::DuckDb && self.has_serial_key() {
            statements.push(format!(
                "DROP SEQUENCE IF EXISTS {}",
                dialect.quote(&self.sequence_name())
            ));
        }
        statements
    }
}

/// Complete schema definition
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub tables: Vec<Table>,
    table_index: HashMap<String, usize>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: Table) -> Self {
        let idx = self.tables.len();
        self.table_index.insert(table.name.clone(), idx);
        self.tables.push(table);
        self
    }

    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.table_index.get(name).map(|&idx| &self.tables[idx])
    }

    /// Get tables in dependency order (parents before children).
    ///
    /// Depth-first over the declared FK edges, visiting tables in declaration
    /// order, so a schema already declared parents-first comes back unchanged.
    pub fn dependency_order(&self) -> Result<Vec<&Table>, PlanError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Visiting,
            Done,
        }

        fn visit<'a>(
            idx: usize,
            schema: &'a Schema,
            marks: &mut [Mark],
            result: &mut Vec<&'a Table>,
        ) -> Result<(), PlanError> {
            match marks[idx] {
                Mark::Done => return Ok(()),
                Mark::Visiting => {
                    return Err(PlanError::Cycle {
                        table: schema.tables[idx].name.clone(),
                    })
                }
                Mark::Unvisited => {}
            }
            marks[idx] = Mark::Visiting;

            let table = &schema.tables[idx];
            for parent in table.parents() {
                let dep_idx = schema.table_index.get(parent).copied().ok_or_else(|| {
                    PlanError::UnknownReference {
                        table: table.name.clone(),
                        references: parent.to_string(),
                    }
                })?;
                visit(dep_idx, schema, marks, result)?;
            }

            marks[idx] = Mark::Done;
            result.push(table);
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.tables.len()];
        let mut result = Vec::with_capacity(self.tables.len());
        for idx in 0..self.tables.len() {
            visit(idx, self, &mut marks, &mut result)?;
        }
        Ok(result)
    }

    /// Drop order: the exact reverse of the dependency order
    pub fn drop_order(&self) -> Result<Vec<&Table>, PlanError> {
        let mut order = self.dependency_order()?;
        order.reverse();
        Ok(order)
    }

    /// The ten-table banking schema
    pub fn bank() -> Self {
        Schema::new()
            .table(
                Table::new("branches")
                    .column(Column::new("branch_id", SqlType::Serial).primary_key())
                    .column(Column::new("branch_name", SqlType::VarChar(100)))
                    .column(Column::new("branch_code", SqlType::VarChar(20)))
                    .column(Column::new("city", SqlType::VarChar(50)))
                    .column(Column::new("ifsc_code", SqlType::VarChar(20))),
            )
            .table(
                Table::new("employees")
                    .column(Column::new("emp_id", SqlType::Serial).primary_key())
                    .column(Column::new("emp_name", SqlType::VarChar(100)))
                    .column(Column::new("designation", SqlType::VarChar(50)))
                    .column(
                        Column::new("branch_id", SqlType::Integer)
                            .references("branches", "branch_id"),
                    )
                    .column(Column::new("salary", SqlType::Decimal(10, 2)))
                    .column(Column::new("doj", SqlType::Date)),
            )
            .table(
                Table::new("customers")
                    .column(Column::new("customer_id", SqlType::Serial).primary_key())
                    .column(Column::new("full_name", SqlType::VarChar(100)))
                    .column(Column::new("dob", SqlType::Date))
                    .column(Column::new("gender", SqlType::VarChar(10)))
                    .column(Column::new("city", SqlType::VarChar(50)))
                    .column(Column::new("contact_no", SqlType::VarChar(30)))
                    .column(Column::new("email", SqlType::VarChar(100))),
            )
            .table(
                Table::new("accounts")
                    .column(Column::new("account_id", SqlType::Serial).primary_key())
                    .column(
                        Column::new("customer_id", SqlType::Integer)
                            .references("customers", "customer_id"),
                    )
                    .column(
                        Column::new("branch_id", SqlType::Integer)
                            .references("branches", "branch_id"),
                    )
                    .column(Column::new("account_type", SqlType::VarChar(20)))
                    .column(Column::new("balance", SqlType::Decimal(12, 2)))
                    .column(Column::new("opening_date", SqlType::Date)),
            )
            .table(
                Table::new("transactions")
                    .column(Column::new("txn_id", SqlType::BigSerial).primary_key())
                    .column(
                        Column::new("account_id", SqlType::Integer)
                            .references("accounts", "account_id"),
                    )
                    .column(Column::new("txn_type", SqlType::VarChar(20)))
                    .column(Column::new("amount", SqlType::Decimal(12, 2)))
                    .column(Column::new("txn_date", SqlType::Timestamp))
                    .column(Column::new("description", SqlType::VarChar(200))),
            )
            .table(
                Table::new("loans")
                    .column(Column::new("loan_id", SqlType::Serial).primary_key())
                    .column(
                        Column::new("customer_id", SqlType::Integer)
                            .references("customers", "customer_id"),
                    )
                    .column(
                        Column::new("branch_id", SqlType::Integer)
                            .references("branches", "branch_id"),
                    )
                    .column(Column::new("loan_type", SqlType::VarChar(50)))
                    .column(Column::new("loan_amount", SqlType::Decimal(12, 2)))
                    .column(Column::new("interest_rate", SqlType::Float))
                    .column(Column::new("start_date", SqlType::Date)),
            )
            .table(
                Table::new("loan_payments")
                    .column(Column::new("payment_id", SqlType::Serial).primary_key())
                    .column(
                        Column::new("loan_id", SqlType::Integer).references("loans", "loan_id"),
                    )
                    .column(Column::new("payment_date", SqlType::Date))
                    .column(Column::new("payment_amount", SqlType::Decimal(12, 2))),
            )
            .table(
                Table::new("cards")
                    .column(Column::new("card_id", SqlType::Serial).primary_key())
                    .column(
                        Column::new("customer_id", SqlType::Integer)
                            .references("customers", "customer_id"),
                    )
                    .column(Column::new("card_type", SqlType::VarChar(20)))
                    .column(Column::new("card_number", SqlType::VarChar(20)))
                    .column(Column::new("expiry_date", SqlType::Date))
                    .column(Column::new("cvv", SqlType::VarChar(4))),
            )
            .table(
                Table::new("card_transactions")
                    .column(Column::new("card_txn_id", SqlType::BigSerial).primary_key())
                    .column(Column::new("card_id", SqlType::Integer).references("cards", "card_id"))
                    .column(Column::new("amount", SqlType::Decimal(12, 2)))
                    .column(Column::new("txn_date", SqlType::Timestamp))
                    .column(Column::new("merchant_name", SqlType::VarChar(100)))
                    .column(Column::new("city", SqlType::VarChar(50))),
            )
            .table(
                Table::new("atm_locations")
                    .column(Column::new("atm_id", SqlType::Serial).primary_key())
                    .column(
                        Column::new("branch_id", SqlType::Integer)
                            .references("branches", "branch_id"),
                    )
                    .column(Column::new("location", SqlType::VarChar(100)))
                    .column(Column::new("city", SqlType::VarChar(50)))
                    .column(Column::new("status", SqlType::VarChar(20))),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tables: &[&Table]) -> Vec<String> {
        tables.iter().map(|t| t.name.clone()).collect()
    }

    #[test]
    fn test_table_builder() {
        let table = Table::new("employees")
            .column(Column::new("emp_id", SqlType::Serial).primary_key())
            .column(Column::new("branch_id", SqlType::Integer).references("branches", "branch_id"))
            .column(Column::new("emp_name", SqlType::VarChar(100)));

        assert_eq!(table.primary_key_column(), Some("emp_id"));
        assert_eq!(table.foreign_keys().len(), 1);
        assert_eq!(table.parents(), vec!["branches"]);
        assert_eq!(table.insert_columns(), vec!["branch_id", "emp_name"]);
    }

    #[test]
    fn test_bank_schema_dependency_order() {
        let schema = Schema::bank();
        let order = schema.dependency_order().unwrap();
        assert_eq!(
            names(&order),
            vec![
                "branches",
                "employees",
                "customers",
                "accounts",
                "transactions",
                "loans",
                "loan_payments",
                "cards",
                "card_transactions",
                "atm_locations",
            ]
        );
    }

    #[test]
    fn test_parents_precede_children() {
        let schema = Schema::bank();
        let order = names(&schema.dependency_order().unwrap());
        for table in &schema.tables {
            let child_idx = order.iter().position(|n| *n == table.name).unwrap();
            for parent in table.parents() {
                let parent_idx = order.iter().position(|n| n == parent).unwrap();
                assert!(parent_idx < child_idx, "{} before {}", parent, table.name);
            }
        }
    }

    #[test]
    fn test_drop_order_is_reverse() {
        let schema = Schema::bank();
        let mut forward = names(&schema.dependency_order().unwrap());
        forward.reverse();
        assert_eq!(names(&schema.drop_order().unwrap()), forward);
    }

    #[test]
    fn test_children_declared_first_are_reordered() {
        let schema = Schema::new()
            .table(
                Table::new("loan_payments")
                    .column(Column::new("loan_id", SqlType::Integer).references("loans", "loan_id")),
            )
            .table(Table::new("loans").column(Column::new("loan_id", SqlType::Serial).primary_key()));

        assert_eq!(
            names(&schema.dependency_order().unwrap()),
            vec!["loans", "loan_payments"]
        );
    }

    #[test]
    fn test_cycle_is_rejected() {
        let schema = Schema::new()
            .table(Table::new("a").column(Column::new("b_id", SqlType::Integer).references("b", "id")))
            .table(Table::new("b").column(Column::new("a_id", SqlType::Integer).references("a", "id")));

        assert!(matches!(
            schema.dependency_order(),
            Err(PlanError::Cycle { .. })
        ));
    }

    #[test]
    fn test_unknown_reference_is_rejected() {
        let schema = Schema::new().table(
            Table::new("cards")
                .column(Column::new("customer_id", SqlType::Integer).references("customers", "customer_id")),
        );

        match schema.dependency_order() {
            Err(PlanError::UnknownReference { table, references }) => {
                assert_eq!(table, "cards");
                assert_eq!(references, "customers");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_mysql_ddl() {
        let schema = Schema::bank();
        let stmts = schema.get_table("employees").unwrap().create_statements(Dialect::MySql);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].starts_with("CREATE TABLE `employees`"));
        assert!(stmts[0].contains("`emp_id` INT AUTO_INCREMENT PRIMARY KEY"));
        assert!(stmts[0].contains("`salary` DECIMAL(10,2)"));
        assert!(stmts[0].contains("FOREIGN KEY (`branch_id`) REFERENCES `branches`(`branch_id`)"));
    }

    #[test]
    fn test_duckdb_ddl_uses_sequence() {
        let schema = Schema::bank();
        let table = schema.get_table("transactions").unwrap();
        let stmts = table.create_statements(Dialect::DuckDb);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "CREATE SEQUENCE \"transactions_id_seq\" START 1");
        assert!(stmts[1].contains("\"txn_id\" BIGINT PRIMARY KEY DEFAULT nextval('transactions_id_seq')"));
        assert!(stmts[1].contains("\"txn_date\" TIMESTAMP"));

        let drops = table.drop_statements(Dialect::DuckDb);
        assert_eq!(
            drops,
            vec![
                "DROP TABLE IF EXISTS \"transactions\"".to_string(),
                "DROP SEQUENCE IF EXISTS \"transactions_id_seq\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_dialect_parsing() {
        assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("duckdb".parse::<Dialect>().unwrap(), Dialect::DuckDb);
        assert!("oracle".parse::<Dialect>().is_err());
    }
}
