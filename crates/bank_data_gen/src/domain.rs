//! Value domains: the ranges, windows and candidate sets each column draws from.
//!
//! A [`DomainConfig`] is the user-facing, serde-friendly description. It is
//! resolved against a pinned reference date into [`Domains`], validating every
//! range up front so that generation itself cannot fail on bad parameters.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid value-domain parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid range for {field}: min {min} is greater than max {max}")]
    InvalidRange {
        field: &'static str,
        min: String,
        max: String,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Fixed city list used by branches, customers, card transactions and ATMs.
pub const CITIES: &[&str] = &[
    "Pune",
    "Mumbai",
    "Nagpur",
    "Nashik",
    "Aurangabad",
    "Kolhapur",
    "Solapur",
    "Thane",
    "Ahmednagar",
    "Satara",
];

pub const DESIGNATIONS: &[&str] = &["Manager", "Clerk", "Cashier", "Officer"];
pub const GENDERS: &[&str] = &["Male", "Female"];
pub const ACCOUNT_TYPES: &[&str] = &["Saving", "Current"];
pub const TXN_TYPES: &[&str] = &["Credit", "Debit"];
pub const LOAN_TYPES: &[&str] = &["Home Loan", "Personal Loan", "Car Loan", "Education Loan"];
pub const CARD_TYPES: &[&str] = &["Debit", "Credit"];
pub const ATM_STATUSES: &[&str] = &["Active", "Inactive"];

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    pub const fn new_unchecked(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn validate(&self, field: &'static str) -> Result<Self, DomainError> {
        if self.min > self.max {
            return Err(DomainError::InvalidRange {
                field,
                min: self.min.to_string(),
                max: self.max.to_string(),
            });
        }
        Ok(*self)
    }

    fn validate_non_negative(&self, field: &'static str) -> Result<Self, DomainError> {
        let range = self.validate(field)?;
        if range.min < 0 {
            return Err(DomainError::InvalidValue {
                field,
                reason: format!("must not be negative (got {})", range.min),
            });
        }
        Ok(range)
    }
}

/// Half-open float range `[min, max)`; `min == max` always yields `min`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateRange {
    pub min: f64,
    pub max: f64,
}

impl RateRange {
    pub fn validate(&self, field: &'static str) -> Result<Self, DomainError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(DomainError::InvalidValue {
                field,
                reason: "bounds must be finite".to_string(),
            });
        }
        if self.min > self.max {
            return Err(DomainError::InvalidRange {
                field,
                min: self.min.to_string(),
                max: self.max.to_string(),
            });
        }
        if self.min < 0.0 {
            return Err(DomainError::InvalidValue {
                field,
                reason: format!("must not be negative (got {})", self.min),
            });
        }
        Ok(*self)
    }
}

/// Inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(field: &'static str, start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidRange {
                field,
                min: start.to_string(),
                max: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Narrow the window to start no earlier than `date`.
    ///
    /// If `date` is past the end, the window collapses to its last day.
    pub fn not_before(&self, date: NaiveDate) -> Self {
        let start = date.clamp(self.start, self.end);
        Self { start, end: self.end }
    }
}

/// How a date window is declared relative to the run's reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WindowSpec {
    /// Absolute bounds
    Between { start: NaiveDate, end: NaiveDate },
    /// From `years_back` years before the reference date up to it
    YearsBack { years_back: u32 },
    /// From the reference date up to `years_ahead` years after it
    YearsAhead { years_ahead: u32 },
}

impl WindowSpec {
    pub fn resolve(&self, field: &'static str, reference: NaiveDate) -> Result<DateWindow, DomainError> {
        match *self {
            WindowSpec::Between { start, end } => DateWindow::new(field, start, end),
            WindowSpec::YearsBack { years_back } => {
                let start = shift_years(field, reference, years_back, false)?;
                DateWindow::new(field, start, reference)
            }
            WindowSpec::YearsAhead { years_ahead } => {
                let end = shift_years(field, reference, years_ahead, true)?;
                DateWindow::new(field, reference, end)
            }
        }
    }
}

fn shift_years(
    field: &'static str,
    date: NaiveDate,
    years: u32,
    forward: bool,
) -> Result<NaiveDate, DomainError> {
    let months = Months::new(years.saturating_mul(12));
    let shifted = if forward {
        date.checked_add_months(months)
    } else {
        date.checked_sub_months(months)
    };
    shifted.ok_or_else(|| DomainError::InvalidValue {
        field,
        reason: format!("{} years from {} is out of range", years, date),
    })
}

/// User-facing domain parameters; every field has the loader's default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    pub salary: IntRange,
    pub hire_window: WindowSpec,
    pub customer_age: IntRange,
    pub balance: IntRange,
    pub opening_window: WindowSpec,
    pub transaction_amount: IntRange,
    pub transaction_window: WindowSpec,
    pub description_words: usize,
    pub loan_amount: IntRange,
    pub interest_rate: RateRange,
    pub loan_start_window: WindowSpec,
    pub payment_amount: IntRange,
    pub payment_window: WindowSpec,
    pub card_expiry_window: WindowSpec,
    pub cvv: IntRange,
    pub card_transaction_amount: IntRange,
    pub card_transaction_window: WindowSpec,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            salary: IntRange::new_unchecked(30_000, 90_000),
            hire_window: WindowSpec::YearsBack { years_back: 5 },
            customer_age: IntRange::new_unchecked(18, 75),
            balance: IntRange::new_unchecked(1_000, 100_000),
            opening_window: WindowSpec::YearsBack { years_back: 5 },
            transaction_amount: IntRange::new_unchecked(100, 50_000),
            transaction_window: WindowSpec::YearsBack { years_back: 2 },
            description_words: 6,
            loan_amount: IntRange::new_unchecked(100_000, 2_000_000),
            interest_rate: RateRange { min: 6.5, max: 12.5 },
            loan_start_window: WindowSpec::YearsBack { years_back: 5 },
            payment_amount: IntRange::new_unchecked(2_000, 50_000),
            payment_window: WindowSpec::YearsBack { years_back: 3 },
            card_expiry_window: WindowSpec::YearsAhead { years_ahead: 5 },
            cvv: IntRange::new_unchecked(100, 999),
            card_transaction_amount: IntRange::new_unchecked(100, 10_000),
            card_transaction_window: WindowSpec::YearsBack { years_back: 2 },
        }
    }
}

impl DomainConfig {
    /// Validate every parameter and pin windows to `reference`.
    pub fn resolve(&self, reference: NaiveDate) -> Result<Domains, DomainError> {
        let customer_age = self.customer_age.validate_non_negative("customer_age")?;
        let oldest = shift_years("customer_age", reference, customer_age.max as u32, false)?;
        let youngest = shift_years("customer_age", reference, customer_age.min as u32, false)?;

        if self.description_words == 0 {
            return Err(DomainError::InvalidValue {
                field: "description_words",
                reason: "must be at least 1".to_string(),
            });
        }

        let cvv = self.cvv.validate_non_negative("cvv")?;
        if cvv.max > 9_999 {
            return Err(DomainError::InvalidValue {
                field: "cvv",
                reason: format!("must fit in 4 digits (got {})", cvv.max),
            });
        }

        Ok(Domains {
            reference,
            salary: self.salary.validate_non_negative("salary")?,
            hire_window: self.hire_window.resolve("hire_window", reference)?,
            birth_window: DateWindow::new("customer_age", oldest, youngest)?,
            balance: self.balance.validate_non_negative("balance")?,
            opening_window: self.opening_window.resolve("opening_window", reference)?,
            transaction_amount: self
                .transaction_amount
                .validate_non_negative("transaction_amount")?,
            transaction_window: self
                .transaction_window
                .resolve("transaction_window", reference)?,
            description_words: self.description_words,
            loan_amount: self.loan_amount.validate_non_negative("loan_amount")?,
            interest_rate: self.interest_rate.validate("interest_rate")?,
            loan_start_window: self.loan_start_window.resolve("loan_start_window", reference)?,
            payment_amount: self.payment_amount.validate_non_negative("payment_amount")?,
            payment_window: self.payment_window.resolve("payment_window", reference)?,
            card_expiry_window: self
                .card_expiry_window
                .resolve("card_expiry_window", reference)?,
            cvv,
            card_transaction_amount: self
                .card_transaction_amount
                .validate_non_negative("card_transaction_amount")?,
            card_transaction_window: self
                .card_transaction_window
                .resolve("card_transaction_window", reference)?,
        })
    }
}

/// Validated domains, pinned to a reference date
#[derive(Debug, Clone, PartialEq)]
pub struct Domains {
    pub reference: NaiveDate,
    pub salary: IntRange,
    pub hire_window: DateWindow,
    pub birth_window: DateWindow,
    pub balance: IntRange,
    pub opening_window: DateWindow,
    pub transaction_amount: IntRange,
    pub transaction_window: DateWindow,
    pub description_words: usize,
    pub loan_amount: IntRange,
    pub interest_rate: RateRange,
    pub loan_start_window: DateWindow,
    pub payment_amount: IntRange,
    pub payment_window: DateWindow,
    pub card_expiry_window: DateWindow,
    pub cvv: IntRange,
    pub card_transaction_amount: IntRange,
    pub card_transaction_window: DateWindow,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_domains_resolve() {
        let domains = DomainConfig::default().resolve(date(2025, 6, 15)).unwrap();
        assert_eq!(domains.hire_window.start(), date(2020, 6, 15));
        assert_eq!(domains.hire_window.end(), date(2025, 6, 15));
        assert_eq!(domains.card_expiry_window.start(), date(2025, 6, 15));
        assert_eq!(domains.card_expiry_window.end(), date(2030, 6, 15));
        assert_eq!(domains.birth_window.start(), date(1950, 6, 15));
        assert_eq!(domains.birth_window.end(), date(2007, 6, 15));
    }

    #[test]
    fn test_inverted_amount_range_rejected() {
        let config = DomainConfig {
            salary: IntRange::new_unchecked(90_000, 30_000),
            ..Default::default()
        };
        match config.resolve(date(2025, 1, 1)) {
            Err(DomainError::InvalidRange { field, .. }) => assert_eq!(field, "salary"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_inverted_date_window_rejected() {
        let config = DomainConfig {
            payment_window: WindowSpec::Between {
                start: date(2025, 1, 1),
                end: date(2024, 1, 1),
            },
            ..Default::default()
        };
        assert!(matches!(
            config.resolve(date(2025, 1, 1)),
            Err(DomainError::InvalidRange { field: "payment_window", .. })
        ));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let config = DomainConfig {
            balance: IntRange::new_unchecked(-5, 10),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve(date(2025, 1, 1)),
            Err(DomainError::InvalidValue { field: "balance", .. })
        ));
    }

    #[test]
    fn test_inverted_rate_rejected() {
        let config = DomainConfig {
            interest_rate: RateRange { min: 12.5, max: 6.5 },
            ..Default::default()
        };
        assert!(config.resolve(date(2025, 1, 1)).is_err());
    }

    #[test]
    fn test_window_not_before() {
        let window = DateWindow::new("w", date(2024, 1, 1), date(2024, 12, 31)).unwrap();
        assert_eq!(window.not_before(date(2023, 5, 1)).start(), date(2024, 1, 1));
        assert_eq!(window.not_before(date(2024, 6, 1)).start(), date(2024, 6, 1));
        assert_eq!(window.not_before(date(2026, 1, 1)).start(), date(2024, 12, 31));
    }
}
