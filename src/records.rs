// 🧾 Record Layer - Expense & Payment rows
// Raw store rows (loosely typed) → typed records (validated shape)
//
// This is the ONLY place where the coerce-or-default policy lives:
//   - Amount that is not a finite number → 0.0
//   - Participants → comma-separated, trimmed, blanks & duplicates removed
//   - Percentages that are not a JSON object of numbers → ignored
// Everything downstream (balance, settlement) works on typed records only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Date format used when writing rows (same as the shared sheet)
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Column headers, in write order
pub const EXPENSE_COLUMNS: [&str; 7] = [
    "Date",
    "Payer",
    "Amount",
    "Participants",
    "Split Type",
    "Percentages",
    "Notes",
];

pub const PAYMENT_COLUMNS: [&str; 5] = ["Date", "Payer", "Amount", "Payee", "Notes"];

// ============================================================================
// SPLIT TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SplitType {
    #[default]
    Equal,
    Custom,
}

impl SplitType {
    /// Value stored in the "Split Type" column
    pub fn name(&self) -> &str {
        match self {
            SplitType::Equal => "Equal",
            SplitType::Custom => "Custom",
        }
    }

    /// Anything that isn't "Custom" is treated as an equal split
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("custom") {
            SplitType::Custom
        } else {
            SplitType::Equal
        }
    }
}

// ============================================================================
// RAW ROWS (what the store reads and appends)
// ============================================================================

/// Expense row exactly as stored. Every column is text so a broken cell
/// never prevents the rest of the sheet from loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRow {
    #[serde(rename = "Date", default)]
    pub date: String,

    #[serde(rename = "Payer", default)]
    pub payer: String,

    #[serde(rename = "Amount", default)]
    pub amount: String,

    #[serde(rename = "Participants", default)]
    pub participants: String,

    #[serde(rename = "Split Type", default)]
    pub split_type: String,

    #[serde(rename = "Percentages", default)]
    pub percentages: String,

    #[serde(rename = "Notes", default)]
    pub notes: String,
}

/// Payment row exactly as stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentRow {
    #[serde(rename = "Date", default)]
    pub date: String,

    #[serde(rename = "Payer", default)]
    pub payer: String,

    #[serde(rename = "Amount", default)]
    pub amount: String,

    #[serde(rename = "Payee", default)]
    pub payee: String,

    #[serde(rename = "Notes", default)]
    pub notes: String,
}

// ============================================================================
// TYPED RECORDS (what the engine consumes)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub date: String,
    pub payer: String,
    pub amount: f64,
    pub participants: Vec<String>,
    pub split_type: SplitType,
    /// Only meaningful for Custom splits. Recorded, never used for balances.
    pub percentages: BTreeMap<String, f64>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub date: String,
    /// Who pays down debt
    pub payer: String,
    pub amount: f64,
    /// Who receives
    pub payee: String,
    pub notes: String,
}

impl ExpenseRecord {
    /// Build a record from a stored row.
    ///
    /// Returns None only when the payer is blank: such a row can't be
    /// attributed to anyone and would break the zero-sum invariant.
    pub fn from_row(row: &ExpenseRow) -> Option<Self> {
        let payer = row.payer.trim();
        if payer.is_empty() {
            tracing::warn!(date = %row.date, amount = %row.amount, "skipping expense row without payer");
            return None;
        }

        Some(ExpenseRecord {
            date: row.date.trim().to_string(),
            payer: payer.to_string(),
            amount: coerce_amount(&row.amount),
            participants: parse_participants(&row.participants),
            split_type: SplitType::parse(&row.split_type),
            percentages: parse_percentages(&row.percentages),
            notes: row.notes.clone(),
        })
    }

    /// Every person this expense mentions (payer first)
    pub fn persons(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.payer.as_str()).chain(self.participants.iter().map(String::as_str))
    }
}

impl PaymentRecord {
    /// Build a record from a stored row; None when payer or payee is blank
    pub fn from_row(row: &PaymentRow) -> Option<Self> {
        let payer = row.payer.trim();
        let payee = row.payee.trim();
        if payer.is_empty() || payee.is_empty() {
            tracing::warn!(date = %row.date, amount = %row.amount, "skipping payment row without payer or payee");
            return None;
        }

        Some(PaymentRecord {
            date: row.date.trim().to_string(),
            payer: payer.to_string(),
            amount: coerce_amount(&row.amount),
            payee: payee.to_string(),
            notes: row.notes.clone(),
        })
    }
}

/// Parse every expense row, dropping the ones that can't be attributed
pub fn expenses_from_rows(rows: &[ExpenseRow]) -> Vec<ExpenseRecord> {
    rows.iter().filter_map(ExpenseRecord::from_row).collect()
}

/// Parse every payment row, dropping the ones that can't be attributed
pub fn payments_from_rows(rows: &[PaymentRow]) -> Vec<PaymentRecord> {
    rows.iter().filter_map(PaymentRecord::from_row).collect()
}

// ============================================================================
// COERCION HELPERS
// ============================================================================

/// Coerce an Amount cell to a number. Non-numeric or non-finite → 0.0
pub fn coerce_amount(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            tracing::warn!(amount = %raw, "non-numeric amount treated as 0");
            0.0
        }
    }
}

/// Split a comma-separated participant list.
///
/// "Alice, Bob,,Alice , Carol" → ["Alice", "Bob", "Carol"]
pub fn parse_participants(raw: &str) -> Vec<String> {
    let mut participants: Vec<String> = Vec::new();

    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !participants.iter().any(|p| p == name) {
            participants.push(name.to_string());
        }
    }

    participants
}

/// Parse the Percentages payload (JSON object, name → number).
///
/// Numbers stored as strings ("70") are accepted. Anything unparseable is
/// dropped silently; percentages never affect balances.
pub fn parse_percentages(raw: &str) -> BTreeMap<String, f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return BTreeMap::new();
    }

    let parsed: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        Err(_) => {
            tracing::debug!(percentages = %raw, "ignoring unparseable percentages");
            return BTreeMap::new();
        }
    };

    let Some(object) = parsed.as_object() else {
        return BTreeMap::new();
    };

    object
        .iter()
        .filter_map(|(name, value)| {
            let pct = match value {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }?;
            let name = name.trim();
            if name.is_empty() || !pct.is_finite() {
                return None;
            }
            Some((name.to_string(), pct))
        })
        .collect()
}

/// Serialize percentages for the "Percentages" column
pub fn encode_percentages(percentages: &BTreeMap<String, f64>) -> String {
    // A map of String → f64 always serializes
    serde_json::to_string(percentages).unwrap_or_default()
}
