//! Dependency-ordered plan over the ten banking tables.

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while ordering tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("foreign keys form a cycle through table '{table}'")]
    Cycle { table: String },

    #[error("table '{table}' references undeclared table '{references}'")]
    UnknownReference { table: String, references: String },

    #[error("table '{0}' is not one of the banking tables")]
    UnknownTable(String),
}

/// The ten entity kinds, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Branches,
    Employees,
    Customers,
    Accounts,
    Transactions,
    Loans,
    LoanPayments,
    Cards,
    CardTransactions,
    AtmLocations,
}

impl TableKind {
    pub const ALL: [TableKind; 10] = [
        TableKind::Branches,
        TableKind::Employees,
        TableKind::Customers,
        TableKind::Accounts,
        TableKind::Transactions,
        TableKind::Loans,
        TableKind::LoanPayments,
        TableKind::Cards,
        TableKind::CardTransactions,
        TableKind::AtmLocations,
    ];

    /// Table name in the store
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Branches => "branches",
            TableKind::Employees => "employees",
            TableKind::Customers => "customers",
            TableKind::Accounts => "accounts",
            TableKind::Transactions => "transactions",
            TableKind::Loans => "loans",
            TableKind::LoanPayments => "loan_payments",
            TableKind::Cards => "cards",
            TableKind::CardTransactions => "card_transactions",
            TableKind::AtmLocations => "atm_locations",
        }
    }

    /// Stable position in [`TableKind::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::str::FromStr for TableKind {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        TableKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == normalized || (normalized == "atms" && *kind == TableKind::AtmLocations))
            .ok_or_else(|| PlanError::UnknownTable(s.to_string()))
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A parent-before-child ordering of the banking tables, with each table's
/// parent kinds resolved from the schema's FK declarations.
#[derive(Debug, Clone)]
pub struct DependencyPlan {
    order: Vec<TableKind>,
    parents: Vec<Vec<TableKind>>,
}

impl DependencyPlan {
    /// Order the tables of `schema`, which must all be banking tables.
    pub fn from_schema(schema: &Schema) -> Result<Self, PlanError> {
        let ordered = schema.dependency_order()?;
        let mut order = Vec::with_capacity(ordered.len());
        let mut parents = vec![Vec::new(); TableKind::ALL.len()];

        for table in ordered {
            let kind: TableKind = table.name.parse()?;
            for parent in table.parents() {
                parents[kind.index()].push(parent.parse()?);
            }
            order.push(kind);
        }

        Ok(Self { order, parents })
    }

    /// Plan for [`Schema::bank`]
    pub fn bank() -> Result<Self, PlanError> {
        Self::from_schema(&Schema::bank())
    }

    /// Creation and load order
    pub fn order(&self) -> &[TableKind] {
        &self.order
    }

    /// Drop order: children before parents
    pub fn drop_order(&self) -> Vec<TableKind> {
        self.order.iter().rev().copied().collect()
    }

    /// Tables `kind` references through foreign keys
    pub fn parents_of(&self, kind: TableKind) -> &[TableKind] {
        &self.parents[kind.index()]
    }

    /// True if every table's parents appear earlier in the order
    pub fn is_consistent(&self) -> bool {
        self.order.iter().enumerate().all(|(idx, kind)| {
            self.parents_of(*kind)
                .iter()
                .all(|p| self.order[..idx].contains(p))
        })
    }
}
