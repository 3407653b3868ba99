// 📐 Entry Validation - New expense / payment requests
// Checks a request BEFORE anything is written to the store.
//
// Rejections never reach the balance engine: a request either becomes a
// complete row or a list of every problem found.

use crate::records::{
    coerce_amount, encode_percentages, parse_participants, ExpenseRecord, ExpenseRow,
    PaymentRecord, PaymentRow, SplitType, DATE_FORMAT,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Custom percentages must add up to 100 within this tolerance
pub const PERCENTAGE_TOLERANCE: f64 = 0.01;

/// Smallest amount that survives the two-decimal write
pub const MIN_AMOUNT: f64 = 0.01;

/// Largest amount accepted for a single record
pub const MAX_AMOUNT: f64 = 1_000_000_000_000.0;

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please enter the payer's name.")]
    MissingPayer,
    #[error("Please enter the payee's name.")]
    MissingPayee,
    #[error("Amount must be at least 0.01.")]
    AmountTooSmall,
    #[error("Amount must not exceed 1000000000000.")]
    AmountTooLarge,
    #[error("Please enter at least one participant.")]
    NoParticipants,
    #[error("For custom splits, the total percentage must equal 100% (got {0}%).")]
    PercentageTotal(f64),
    #[error("Percentage for {name} must be between 0 and 100 (got {value}).")]
    PercentageOutOfRange { name: String, value: f64 },
    #[error("{0} has a percentage but is not a participant.")]
    UnknownParticipant(String),
}

pub type ValidationResult<T> = Result<T, Vec<ValidationError>>;

// ============================================================================
// REQUESTS
// ============================================================================

/// A new expense as entered by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseRequest {
    /// Defaults to today when absent
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub payer: String,
    pub amount: f64,
    /// Comma-separated names
    pub participants: String,
    #[serde(default)]
    pub split_type: SplitType,
    #[serde(default)]
    pub percentages: BTreeMap<String, f64>,
    #[serde(default)]
    pub notes: String,
}

/// A new payment as entered by the user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub payer: String,
    pub amount: f64,
    pub payee: String,
    #[serde(default)]
    pub notes: String,
}

impl ExpenseRequest {
    /// Validate and build the row to append, plus the record it reads back as
    pub fn validate(&self) -> ValidationResult<(ExpenseRow, ExpenseRecord)> {
        let mut errors = Vec::new();

        let payer = self.payer.trim();
        if payer.is_empty() {
            errors.push(ValidationError::MissingPayer);
        }

        if let Some(error) = check_amount(self.amount) {
            errors.push(error);
        }

        let participants = parse_participants(&self.participants);
        if participants.is_empty() {
            errors.push(ValidationError::NoParticipants);
        }

        // Percentages only matter (and are only stored) for Custom splits
        let percentages: BTreeMap<String, f64> = match self.split_type {
            SplitType::Custom => self
                .percentages
                .iter()
                .map(|(name, pct)| (name.trim().to_string(), *pct))
                .collect(),
            SplitType::Equal => BTreeMap::new(),
        };

        if self.split_type == SplitType::Custom && !participants.is_empty() {
            for (name, value) in &percentages {
                if !participants.contains(name) {
                    errors.push(ValidationError::UnknownParticipant(name.clone()));
                }
                if !(0.0..=100.0).contains(value) {
                    errors.push(ValidationError::PercentageOutOfRange {
                        name: name.clone(),
                        value: *value,
                    });
                }
            }

            let total: f64 = percentages.values().sum();
            if (total - 100.0).abs() > PERCENTAGE_TOLERANCE {
                errors.push(ValidationError::PercentageTotal(total));
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let row = ExpenseRow {
            date: format_date(self.date),
            payer: payer.to_string(),
            amount: format!("{:.2}", self.amount),
            participants: participants.join(", "),
            split_type: self.split_type.name().to_string(),
            percentages: if percentages.is_empty() {
                String::new()
            } else {
                encode_percentages(&percentages)
            },
            notes: self.notes.trim().to_string(),
        };
        let record = ExpenseRecord {
            date: row.date.clone(),
            payer: row.payer.clone(),
            amount: coerce_amount(&row.amount),
            participants,
            split_type: self.split_type,
            percentages,
            notes: row.notes.clone(),
        };

        Ok((row, record))
    }
}

impl PaymentRequest {
    /// Validate and build the row to append, plus the record it reads back as
    pub fn validate(&self) -> ValidationResult<(PaymentRow, PaymentRecord)> {
        let mut errors = Vec::new();

        let payer = self.payer.trim();
        let payee = self.payee.trim();

        if payer.is_empty() {
            errors.push(ValidationError::MissingPayer);
        }
        if payee.is_empty() {
            errors.push(ValidationError::MissingPayee);
        }
        if let Some(error) = check_amount(self.amount) {
            errors.push(error);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let row = PaymentRow {
            date: format_date(self.date),
            payer: payer.to_string(),
            amount: format!("{:.2}", self.amount),
            payee: payee.to_string(),
            notes: self.notes.trim().to_string(),
        };
        let record = PaymentRecord {
            date: row.date.clone(),
            payer: row.payer.clone(),
            amount: coerce_amount(&row.amount),
            payee: row.payee.clone(),
            notes: row.notes.clone(),
        };

        Ok((row, record))
    }
}

/// Amounts are stored with two decimals, so anything under a cent becomes 0
fn check_amount(amount: f64) -> Option<ValidationError> {
    if amount.is_nan() || amount < MIN_AMOUNT {
        Some(ValidationError::AmountTooSmall)
    } else if amount > MAX_AMOUNT {
        Some(ValidationError::AmountTooLarge)
    } else {
        None
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.unwrap_or_else(|| Local::now().date_naive())
        .format(DATE_FORMAT)
        .to_string()
}

/// Join validation errors for display (one per line)
pub fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
