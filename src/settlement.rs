// 🤝 Settlement Planner - Net Balance → who pays whom
//
// Greedy two-pointer sweep:
//   creditors sorted by balance DESC (largest credit first)
//   debtors   sorted by balance ASC  (largest debt first)
//   settle min(credit, -debt), advance whichever side hit zero
//
// Not provably minimal, but pairing largest debt with largest credit keeps
// the transaction count low: at most (debtors + creditors - 1).

use crate::balance::NetBalance;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Balances within EPSILON of zero count as settled
pub const EPSILON: f64 = 1e-9;

/// "debtor pays creditor amount"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub debtor: String,
    pub creditor: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(debtor: &str, creditor: &str, amount: f64) -> Self {
        Transaction {
            debtor: debtor.to_string(),
            creditor: creditor.to_string(),
            amount,
        }
    }
}

/// Produce the payment plan that zeroes every balance.
///
/// Returns an empty list when nobody owes anything.
pub fn plan_settlement(balance: &NetBalance) -> Vec<Transaction> {
    // inf/NaN balances can't be settled with finite payments
    for (person, amount) in balance.iter().filter(|(_, amount)| !amount.is_finite()) {
        tracing::warn!(person = %person, amount = *amount, "leaving non-finite balance out of settlement");
    }

    let mut creditors: Vec<(&str, f64)> = balance
        .iter()
        .filter(|(_, amount)| amount.is_finite() && **amount > EPSILON)
        .map(|(person, amount)| (person.as_str(), *amount))
        .collect();

    let mut debtors: Vec<(&str, f64)> = balance
        .iter()
        .filter(|(_, amount)| amount.is_finite() && **amount < -EPSILON)
        .map(|(person, amount)| (person.as_str(), *amount))
        .collect();

    // Stable sorts: ties keep name order
    creditors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    debtors.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut transactions = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < debtors.len() && j < creditors.len() {
        let (debtor, debt) = debtors[i];
        let (creditor, credit) = creditors[j];

        let amount = credit.min(-debt);
        if !amount.is_finite() {
            break;
        }
        transactions.push(Transaction::new(debtor, creditor, amount));

        debtors[i].1 = debt + amount;
        creditors[j].1 = credit - amount;

        if debtors[i].1.abs() < EPSILON {
            i += 1;
        }
        if creditors[j].1.abs() < EPSILON {
            j += 1;
        }
    }

    tracing::debug!(
        creditors = creditors.len(),
        debtors = debtors.len(),
        transactions = transactions.len(),
        "planned settlement"
    );

    transactions
}

/// Replay a plan against a balance: debtor pays (+amount), creditor is paid (-amount)
pub fn apply_transactions(balance: &NetBalance, transactions: &[Transaction]) -> NetBalance {
    let mut result = balance.clone();
    for tx in transactions {
        *result.entry(tx.debtor.clone()).or_insert(0.0) += tx.amount;
        *result.entry(tx.creditor.clone()).or_insert(0.0) -= tx.amount;
    }
    result
}

/// Largest absolute balance left after replaying the plan
pub fn residual(balance: &NetBalance, transactions: &[Transaction]) -> f64 {
    apply_transactions(balance, transactions)
        .values()
        .fold(0.0, |acc: f64, v| acc.max(v.abs()))
}
