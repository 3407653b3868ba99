// 📒 Ledger - snapshot → balances → settlement
//
// Every read recomputes from the full current snapshot of the store.
// Nothing derived is ever persisted.

use crate::balance::{compute_balances, NetBalance};
use crate::records::{expenses_from_rows, payments_from_rows, ExpenseRecord, PaymentRecord};
use crate::settlement::{plan_settlement, Transaction};
use crate::store::RecordStore;
use crate::validation::{ExpenseRequest, PaymentRequest, ValidationError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything the presentation layer shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerView {
    pub expenses: Vec<ExpenseRecord>,
    pub payments: Vec<PaymentRecord>,
    pub balances: NetBalance,
    pub settlement: Vec<Transaction>,
}

impl LedgerView {
    /// Pure pipeline over already-parsed records
    pub fn compute(expenses: Vec<ExpenseRecord>, payments: Vec<PaymentRecord>) -> Self {
        let balances = compute_balances(&expenses, &payments);
        let settlement = plan_settlement(&balances);

        LedgerView {
            expenses,
            payments,
            balances,
            settlement,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settlement.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} expenses, {} payments, {} people, {} settlement transactions",
            self.expenses.len(),
            self.payments.len(),
            self.balances.len(),
            self.settlement.len()
        )
    }
}

/// Read the current snapshot and derive the full view
pub fn load_view(store: &dyn RecordStore) -> Result<LedgerView> {
    let expense_rows = store.load_expenses().context("Failed to load expenses")?;
    let payment_rows = store.load_payments().context("Failed to load payments")?;

    let view = LedgerView::compute(
        expenses_from_rows(&expense_rows),
        payments_from_rows(&payment_rows),
    );
    tracing::debug!(store = store.name(), "{}", view.summary());

    Ok(view)
}

// ============================================================================
// RECORD CREATION
// ============================================================================

/// Why a new record was not written
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("invalid record: {}", crate::validation::describe(.0))]
    Invalid(Vec<ValidationError>),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Validate, then append. Nothing is written when validation fails.
pub fn record_expense(
    store: &mut dyn RecordStore,
    request: &ExpenseRequest,
) -> Result<ExpenseRecord, RecordError> {
    let (row, record) = request.validate().map_err(RecordError::Invalid)?;
    store
        .append_expense(&row)
        .context("Failed to append expense")?;

    Ok(record)
}

/// Validate, then append. Nothing is written when validation fails.
pub fn record_payment(
    store: &mut dyn RecordStore,
    request: &PaymentRequest,
) -> Result<PaymentRecord, RecordError> {
    let (row, record) = request.validate().map_err(RecordError::Invalid)?;
    store
        .append_payment(&row)
        .context("Failed to append payment")?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::SplitType;
    use crate::store::SqliteStore;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn expense_request(payer: &str, amount: f64, participants: &str) -> ExpenseRequest {
        ExpenseRequest {
            date: NaiveDate::from_ymd_opt(2025, 1, 10),
            payer: payer.to_string(),
            amount,
            participants: participants.to_string(),
            split_type: SplitType::Equal,
            percentages: BTreeMap::new(),
            notes: String::new(),
        }
    }

    fn payment_request(payer: &str, amount: f64, payee: &str) -> PaymentRequest {
        PaymentRequest {
            date: NaiveDate::from_ymd_opt(2025, 1, 11),
            payer: payer.to_string(),
            amount,
            payee: payee.to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_empty_store_is_settled() {
        let store = SqliteStore::in_memory().unwrap();
        let view = load_view(&store).unwrap();

        assert!(view.balances.is_empty());
        assert!(view.is_settled());
    }

    #[test]
    fn test_dinner_then_payment() {
        let mut store = SqliteStore::in_memory().unwrap();

        record_expense(&mut store, &expense_request("Alice", 90.0, "Alice, Bob, Carol")).unwrap();
        let view = load_view(&store).unwrap();
        assert_eq!(view.settlement.len(), 2);
        assert_eq!(view.settlement[0].debtor, "Bob");
        assert_eq!(view.settlement[1].debtor, "Carol");

        record_payment(&mut store, &payment_request("Bob", 30.0, "Alice")).unwrap();
        let view = load_view(&store).unwrap();

        assert!((view.balances["Alice"] - 30.0).abs() < 1e-9);
        assert!(view.balances["Bob"].abs() < 1e-9);
        assert!((view.balances["Carol"] + 30.0).abs() < 1e-9);
        assert_eq!(view.settlement, vec![Transaction::new("Carol", "Alice", 30.0)]);

        println!("✅ {}", view.summary());
    }

    #[test]
    fn test_custom_expense_round_trip_keeps_percentages() {
        let mut store = SqliteStore::in_memory().unwrap();

        let mut request = expense_request("Alice", 100.0, "Alice, Bob");
        request.split_type = SplitType::Custom;
        request.percentages.insert("Alice".to_string(), 70.0);
        request.percentages.insert("Bob".to_string(), 30.0);

        let recorded = record_expense(&mut store, &request).unwrap();
        assert_eq!(recorded.percentages.get("Alice"), Some(&70.0));

        let view = load_view(&store).unwrap();
        assert_eq!(view.expenses[0], recorded);
        // Still an equal split for balances
        assert!((view.balances["Bob"] + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_request_writes_nothing() {
        let mut store = SqliteStore::in_memory().unwrap();

        let result = record_expense(&mut store, &expense_request("", 0.0, ""));
        match result {
            Err(RecordError::Invalid(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation failure, got {:?}", other),
        }

        let result = record_payment(&mut store, &payment_request("Bob", 5.0, " "));
        assert!(matches!(result, Err(RecordError::Invalid(_))));

        assert!(store.load_expenses().unwrap().is_empty());
        assert!(store.load_payments().unwrap().is_empty());
    }

    #[test]
    fn test_stale_rows_are_coerced() {
        use crate::records::ExpenseRow;

        let mut store = SqliteStore::in_memory().unwrap();
        store
            .append_expense(&ExpenseRow {
                payer: "Alice".to_string(),
                amount: "n/a".to_string(),
                participants: "Bob".to_string(),
                percentages: "{broken".to_string(),
                ..Default::default()
            })
            .unwrap();
        record_expense(&mut store, &expense_request("Bob", 20.0, "Alice, Bob")).unwrap();

        let view = load_view(&store).unwrap();
        assert_eq!(view.expenses[0].amount, 0.0);
        assert!((view.balances["Alice"] + 10.0).abs() < 1e-9);
        assert!((view.balances["Bob"] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_recorded_matches_reloaded() {
        let mut store = SqliteStore::in_memory().unwrap();

        let expense = record_expense(&mut store, &expense_request(" Dana ", 12.345, "Dana, Eve, Dana")).unwrap();
        let payment = record_payment(&mut store, &payment_request("Eve", 6.17, "Dana")).unwrap();

        let view = load_view(&store).unwrap();
        assert_eq!(view.expenses, vec![expense]);
        assert_eq!(view.payments, vec![payment]);
    }

    #[test]
    fn test_oversized_amounts_never_reach_the_planner() {
        let mut store = SqliteStore::in_memory().unwrap();
        let huge = expense_request("Alice", 1e308, "Bob");

        assert!(matches!(record_expense(&mut store, &huge), Err(RecordError::Invalid(_))));
        assert!(matches!(record_expense(&mut store, &huge), Err(RecordError::Invalid(_))));
        assert!(store.load_expenses().unwrap().is_empty());
    }

    #[test]
    fn test_overflowing_stored_rows_still_load() {
        use crate::records::ExpenseRow;

        let mut store = SqliteStore::in_memory().unwrap();
        for _ in 0..2 {
            store
                .append_expense(&ExpenseRow {
                    payer: "Alice".to_string(),
                    amount: "1e308".to_string(),
                    participants: "Bob".to_string(),
                    ..Default::default()
                })
                .unwrap();
        }
        record_expense(&mut store, &expense_request("Carol", 10.0, "Dana")).unwrap();

        // Alice/Bob overflow to ±inf and are left out; the rest still settles
        let view = load_view(&store).unwrap();
        assert!(view.balances["Alice"].is_infinite());
        assert_eq!(view.settlement, vec![Transaction::new("Dana", "Carol", 10.0)]);
    }

    #[test]
    fn test_view_is_idempotent() {
        let mut store = SqliteStore::in_memory().unwrap();
        record_expense(&mut store, &expense_request("Carol", 31.0, "Alice, Bob, Carol")).unwrap();

        assert_eq!(load_view(&store).unwrap(), load_view(&store).unwrap());
    }
}
