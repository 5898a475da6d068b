//! Row builders for the ten banking tables.
//!
//! Generation is pure: a table's rows are a function of the seed, the
//! validated domains, the requested count and the identifier ranges of the
//! parent tables resolved before it. Foreign keys are drawn uniformly from
//! `[1, parent_count]`.

use crate::domain::{
    DomainConfig, DomainError, Domains, ACCOUNT_TYPES, ATM_STATUSES, CARD_TYPES, DESIGNATIONS,
    GENDERS, LOAN_TYPES, TXN_TYPES,
};
use crate::fake::FakeData;
use crate::plan::{DependencyPlan, TableKind};
use crate::rng::SeedSource;
use crate::schema::Dialect;
use chrono::{NaiveDate, NaiveDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while building rows.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerateError {
    #[error("cannot build {child}: parent table {parent} has not been resolved")]
    UnresolvedParent { child: TableKind, parent: TableKind },

    #[error("cannot build {count} {child} rows: parent table {parent} has no rows")]
    EmptyParent {
        child: TableKind,
        parent: TableKind,
        count: usize,
    },
}

/// SQL value representation
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Format as an SQL literal for `dialect`
    pub fn to_sql(&self, dialect: Dialect) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(n) => format!("{:.2}", n),
            SqlValue::String(s) => match dialect {
                Dialect::MySql => format!("'{}'", escape_mysql_string(s)),
                Dialect::DuckDb => format!("'{}'", s.replace('\'', "''")),
            },
            SqlValue::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            SqlValue::DateTime(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

fn escape_mysql_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// A row of generated data
pub type Row = Vec<SqlValue>;

/// Generated data for a single table
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub kind: TableKind,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Row>,
    /// Per-row creation dates, kept only when children need them
    pub anchors: Vec<NaiveDate>,
}

impl TableData {
    pub fn table_name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The identifiers a parent table occupies: `[1, count]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    pub table: TableKind,
    pub count: u64,
}

impl IdRange {
    pub fn new(table: TableKind, count: u64) -> Self {
        Self { table, count }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn contains(&self, id: i64) -> bool {
        id >= 1 && (id as u64) <= self.count
    }
}

#[derive(Debug, Clone)]
struct Resolved {
    range: IdRange,
    anchors: Vec<NaiveDate>,
}

/// Identifier ranges of tables already generated (and, when loading, committed).
#[derive(Debug, Clone, Default)]
pub struct ParentRanges {
    resolved: HashMap<TableKind, Resolved>,
}

impl ParentRanges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `kind` now holds `count` rows; `anchors` are its creation dates, if kept.
    pub fn record(&mut self, kind: TableKind, count: u64, anchors: Vec<NaiveDate>) {
        self.resolved.insert(
            kind,
            Resolved {
                range: IdRange::new(kind, count),
                anchors,
            },
        );
    }

    pub fn range(&self, kind: TableKind) -> Option<IdRange> {
        self.resolved.get(&kind).map(|r| r.range)
    }

    /// Creation date of parent row `id`, if recorded
    pub fn anchor(&self, kind: TableKind, id: i64) -> Option<NaiveDate> {
        let resolved = self.resolved.get(&kind)?;
        let idx = usize::try_from(id).ok()?.checked_sub(1)?;
        resolved.anchors.get(idx).copied()
    }
}

/// How accounts relate to customers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountPolicy {
    /// Account count is configured on its own; owners drawn uniformly
    #[default]
    Independent,
    /// Exactly one account per customer, account i owned by customer i
    OnePerCustomer,
}

/// Whether child dates must follow their parent's creation date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChronologyPolicy {
    /// Child dates are drawn from their own window only
    #[default]
    Unconstrained,
    /// Transactions follow the account's opening date, payments the loan's start date
    ParentFirst,
}

impl std::str::FromStr for AccountPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "independent" => Ok(AccountPolicy::Independent),
            "one-per-customer" | "one_per_customer" => Ok(AccountPolicy::OnePerCustomer),
            _ => Err(format!(
                "Unknown account policy: {}. Valid options: independent, one-per-customer",
                s
            )),
        }
    }
}

impl std::fmt::Display for AccountPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountPolicy::Independent => write!(f, "independent"),
            AccountPolicy::OnePerCustomer => write!(f, "one-per-customer"),
        }
    }
}

impl std::str::FromStr for ChronologyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unconstrained" => Ok(ChronologyPolicy::Unconstrained),
            "parent-first" | "parent_first" => Ok(ChronologyPolicy::ParentFirst),
            _ => Err(format!(
                "Unknown chronology policy: {}. Valid options: unconstrained, parent-first",
                s
            )),
        }
    }
}

impl std::fmt::Display for ChronologyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChronologyPolicy::Unconstrained => write!(f, "unconstrained"),
            ChronologyPolicy::ParentFirst => write!(f, "parent-first"),
        }
    }
}

impl ChronologyPolicy {
    /// Whether rows of `kind` must keep their creation dates for children
    fn keeps_anchors(&self, kind: TableKind) -> bool {
        *self == ChronologyPolicy::ParentFirst
            && matches!(kind, TableKind::Accounts | TableKind::Loans)
    }
}

/// Requested row count per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowCounts([usize; 10]);

impl RowCounts {
    pub fn uniform(rows: usize) -> Self {
        Self([rows; 10])
    }

    pub fn get(&self, kind: TableKind) -> usize {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: TableKind, rows: usize) {
        self.0[kind.index()] = rows;
    }

    pub fn with(mut self, kind: TableKind, rows: usize) -> Self {
        self.set(kind, rows);
        self
    }
}

/// Builds rows for one table at a time.
#[derive(Debug, Clone)]
pub struct RowBuilder {
    domains: Domains,
    account_policy: AccountPolicy,
    chronology: ChronologyPolicy,
}

impl RowBuilder {
    pub fn new(domains: Domains, account_policy: AccountPolicy, chronology: ChronologyPolicy) -> Self {
        Self {
            domains,
            account_policy,
            chronology,
        }
    }

    /// Number of rows `kind` will actually get.
    ///
    /// A table whose parent resolved to zero rows gets zero rows, and under
    /// [`AccountPolicy::OnePerCustomer`] accounts follow the customer count.
    pub fn effective_count(
        &self,
        kind: TableKind,
        requested: usize,
        plan: &DependencyPlan,
        parents: &ParentRanges,
    ) -> Result<usize, GenerateError> {
        let mut count = requested;
        if kind == TableKind::Accounts && self.account_policy == AccountPolicy::OnePerCustomer {
            count = self.parent(kind, TableKind::Customers, parents)?.count as usize;
        }
        for &parent in plan.parents_of(kind) {
            if self.parent(kind, parent, parents)?.is_empty() {
                count = 0;
            }
        }
        Ok(count)
    }

    fn parent(
        &self,
        child: TableKind,
        parent: TableKind,
        parents: &ParentRanges,
    ) -> Result<IdRange, GenerateError> {
        parents
            .range(parent)
            .ok_or(GenerateError::UnresolvedParent { child, parent })
    }

    fn non_empty_parent(
        &self,
        child: TableKind,
        parent: TableKind,
        count: usize,
        parents: &ParentRanges,
    ) -> Result<IdRange, GenerateError> {
        let range = self.parent(child, parent, parents)?;
        if range.is_empty() && count > 0 {
            return Err(GenerateError::EmptyParent {
                child,
                parent,
                count,
            });
        }
        Ok(range)
    }

    /// Build exactly `count` rows for `kind`.
    pub fn build<R: Rng>(
        &self,
        kind: TableKind,
        count: usize,
        parents: &ParentRanges,
        fake: &mut FakeData<R>,
    ) -> Result<TableData, GenerateError> {
        let mut data = TableData {
            kind,
            columns: columns_of(kind).to_vec(),
            rows: Vec::with_capacity(count),
            anchors: Vec::new(),
        };
        let keep_anchors = self.chronology.keeps_anchors(kind);
        let d = &self.domains;

        match kind {
            TableKind::Branches => {
                for i in 1..=count {
                    let name = format!("{} Branch {}", fake.city(), i);
                    data.rows.push(vec![
                        SqlValue::String(name),
                        SqlValue::String(format!("BR{:03}", i)),
                        SqlValue::String(fake.city().to_string()),
                        SqlValue::String(format!("MAHB{:07}", i)),
                    ]);
                }
            }
            TableKind::Employees => {
                let branches = self.non_empty_parent(kind, TableKind::Branches, count, parents)?;
                for _ in 0..count {
                    data.rows.push(vec![
                        SqlValue::String(fake.full_name()),
                        SqlValue::String(fake.pick(DESIGNATIONS).to_string()),
                        SqlValue::Int(fake.id_up_to(branches.count)),
                        SqlValue::Int(fake.int_in(d.salary)),
                        SqlValue::Date(fake.date_in(d.hire_window)),
                    ]);
                }
            }
            TableKind::Customers => {
                for _ in 0..count {
                    data.rows.push(vec![
                        SqlValue::String(fake.full_name()),
                        SqlValue::Date(fake.date_in(d.birth_window)),
                        SqlValue::String(fake.pick(GENDERS).to_string()),
                        SqlValue::String(fake.city().to_string()),
                        SqlValue::String(fake.phone()),
                        SqlValue::String(fake.email()),
                    ]);
                }
            }
            TableKind::Accounts => {
                let customers = self.non_empty_parent(kind, TableKind::Customers, count, parents)?;
                let branches = self.non_empty_parent(kind, TableKind::Branches, count, parents)?;
                for i in 0..count {
                    let customer_id = match self.account_policy {
                        AccountPolicy::OnePerCustomer => (i as u64 % customers.count) as i64 + 1,
                        AccountPolicy::Independent => fake.id_up_to(customers.count),
                    };
                    let opened = fake.date_in(d.opening_window);
                    if keep_anchors {
                        data.anchors.push(opened);
                    }
                    data.rows.push(vec![
                        SqlValue::Int(customer_id),
                        SqlValue::Int(fake.id_up_to(branches.count)),
                        SqlValue::String(fake.pick(ACCOUNT_TYPES).to_string()),
                        SqlValue::Int(fake.int_in(d.balance)),
                        SqlValue::Date(opened),
                    ]);
                }
            }
            TableKind::Transactions => {
                let accounts = self.non_empty_parent(kind, TableKind::Accounts, count, parents)?;
                for _ in 0..count {
                    let account_id = fake.id_up_to(accounts.count);
                    let window = match parents.anchor(TableKind::Accounts, account_id) {
                        Some(opened) if self.chronology == ChronologyPolicy::ParentFirst => {
                            d.transaction_window.not_before(opened)
                        }
                        _ => d.transaction_window,
                    };
                    data.rows.push(vec![
                        SqlValue::Int(account_id),
                        SqlValue::String(fake.pick(TXN_TYPES).to_string()),
                        SqlValue::Int(fake.int_in(d.transaction_amount)),
                        SqlValue::DateTime(fake.datetime_in(window)),
                        SqlValue::String(fake.sentence(d.description_words)),
                    ]);
                }
            }
            TableKind::Loans => {
                let customers = self.non_empty_parent(kind, TableKind::Customers, count, parents)?;
                let branches = self.non_empty_parent(kind, TableKind::Branches, count, parents)?;
                for _ in 0..count {
                    let customer_id = fake.id_up_to(customers.count);
                    let branch_id = fake.id_up_to(branches.count);
                    let loan_type = fake.pick(LOAN_TYPES).to_string();
                    let principal = fake.int_in(d.loan_amount);
                    let rate = fake.rate_in(d.interest_rate);
                    let started = fake.date_in(d.loan_start_window);
                    if keep_anchors {
                        data.anchors.push(started);
                    }
                    data.rows.push(vec![
                        SqlValue::Int(customer_id),
                        SqlValue::Int(branch_id),
                        SqlValue::String(loan_type),
                        SqlValue::Int(principal),
                        SqlValue::Float(rate),
                        SqlValue::Date(started),
                    ]);
                }
            }
            TableKind::LoanPayments => {
                let loans = self.non_empty_parent(kind, TableKind::Loans, count, parents)?;
                for _ in 0..count {
                    let loan_id = fake.id_up_to(loans.count);
                    let window = match parents.anchor(TableKind::Loans, loan_id) {
                        Some(started) if self.chronology == ChronologyPolicy::ParentFirst => {
                            d.payment_window.not_before(started)
                        }
                        _ => d.payment_window,
                    };
                    data.rows.push(vec![
                        SqlValue::Int(loan_id),
                        SqlValue::Date(fake.date_in(window)),
                        SqlValue::Int(fake.int_in(d.payment_amount)),
                    ]);
                }
            }
            TableKind::Cards => {
                let customers = self.non_empty_parent(kind, TableKind::Customers, count, parents)?;
                for _ in 0..count {
                    data.rows.push(vec![
                        SqlValue::Int(fake.id_up_to(customers.count)),
                        SqlValue::String(fake.pick(CARD_TYPES).to_string()),
                        SqlValue::String(fake.card_number()),
                        SqlValue::Date(fake.date_in(d.card_expiry_window)),
                        SqlValue::String(fake.int_in(d.cvv).to_string()),
                    ]);
                }
            }
            TableKind::CardTransactions => {
                let cards = self.non_empty_parent(kind, TableKind::Cards, count, parents)?;
                for _ in 0..count {
                    data.rows.push(vec![
                        SqlValue::Int(fake.id_up_to(cards.count)),
                        SqlValue::Int(fake.int_in(d.card_transaction_amount)),
                        SqlValue::DateTime(fake.datetime_in(d.card_transaction_window)),
                        SqlValue::String(fake.company_name()),
                        SqlValue::String(fake.city().to_string()),
                    ]);
                }
            }
            TableKind::AtmLocations => {
                let branches = self.non_empty_parent(kind, TableKind::Branches, count, parents)?;
                for _ in 0..count {
                    data.rows.push(vec![
                        SqlValue::Int(fake.id_up_to(branches.count)),
                        SqlValue::String(fake.street_address()),
                        SqlValue::String(fake.city().to_string()),
                        SqlValue::String(fake.pick(ATM_STATUSES).to_string()),
                    ]);
                }
            }
        }

        Ok(data)
    }
}

/// Insert column list for each table, matching [`crate::Schema::bank`]
pub fn columns_of(kind: TableKind) -> &'static [&'static str] {
    match kind {
        TableKind::Branches => &["branch_name", "branch_code", "city", "ifsc_code"],
        TableKind::Employees => &["emp_name", "designation", "branch_id", "salary", "doj"],
        TableKind::Customers => &["full_name", "dob", "gender", "city", "contact_no", "email"],
        TableKind::Accounts => &[
            "customer_id",
            "branch_id",
            "account_type",
            "balance",
            "opening_date",
        ],
        TableKind::Transactions => &["account_id", "txn_type", "amount", "txn_date", "description"],
        TableKind::Loans => &[
            "customer_id",
            "branch_id",
            "loan_type",
            "loan_amount",
            "interest_rate",
            "start_date",
        ],
        TableKind::LoanPayments => &["loan_id", "payment_date", "payment_amount"],
        TableKind::Cards => &["customer_id", "card_type", "card_number", "expiry_date", "cvv"],
        TableKind::CardTransactions => &["card_id", "amount", "txn_date", "merchant_name", "city"],
        TableKind::AtmLocations => &["branch_id", "location", "city", "status"],
    }
}

/// Everything needed to generate a dataset
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub seed: u64,
    pub reference_date: NaiveDate,
    pub counts: RowCounts,
    pub domains: DomainConfig,
    pub account_policy: AccountPolicy,
    pub chronology: ChronologyPolicy,
}

/// Generates whole tables in dependency order without touching a store.
pub struct Generator {
    plan: DependencyPlan,
    builder: RowBuilder,
    seeds: SeedSource,
    counts: RowCounts,
    parents: ParentRanges,
}

impl Generator {
    /// Validate `settings` and prepare a generator; fails before any row is built.
    pub fn new(plan: DependencyPlan, settings: &GenerationSettings) -> Result<Self, DomainError> {
        let domains = settings.domains.resolve(settings.reference_date)?;
        Ok(Self {
            plan,
            builder: RowBuilder::new(domains, settings.account_policy, settings.chronology),
            seeds: SeedSource::new(settings.seed),
            counts: settings.counts,
            parents: ParentRanges::new(),
        })
    }

    pub fn plan(&self) -> &DependencyPlan {
        &self.plan
    }

    /// Ranges resolved so far
    pub fn parents(&self) -> &ParentRanges {
        &self.parents
    }

    /// Rows `kind` will get given the ranges resolved so far
    pub fn effective_count(&self, kind: TableKind) -> Result<usize, GenerateError> {
        self.builder
            .effective_count(kind, self.counts.get(kind), &self.plan, &self.parents)
    }

    /// Build `kind` from the ranges resolved so far. Does not record its range.
    pub fn build_table(&self, kind: TableKind) -> Result<TableData, GenerateError> {
        let count = self.effective_count(kind)?;
        let mut fake = FakeData::new(self.seeds.for_table(kind));
        self.builder.build(kind, count, &self.parents, &mut fake)
    }

    /// Record `kind` as holding `count` rows so children can reference it.
    pub fn resolve(&mut self, kind: TableKind, count: u64, anchors: Vec<NaiveDate>) {
        self.parents.record(kind, count, anchors);
    }

    /// Generate every table in plan order, resolving each range as it goes
    pub fn generate_all(&mut self) -> Result<Vec<TableData>, GenerateError> {
        let order = self.plan.order().to_vec();
        let mut tables = Vec::with_capacity(order.len());
        for kind in order {
            let mut data = self.build_table(kind)?;
            let anchors = std::mem::take(&mut data.anchors);
            self.resolve(kind, data.len() as u64, anchors);
            tables.push(data);
        }
        Ok(tables)
    }
}
