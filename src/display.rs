// 🖥️ Display helpers - plain-text tables for the CLI
// Presentation only: nothing here feeds back into balances or settlement.

use crate::balance::NetBalance;
use crate::records::{ExpenseRecord, PaymentRecord, SplitType};
use crate::settlement::Transaction;
use std::collections::BTreeMap;

/// "Alice: 70.0%, Bob: 30.0%" for Custom splits, "" otherwise
pub fn format_percentages(split_type: SplitType, percentages: &BTreeMap<String, f64>) -> String {
    if split_type == SplitType::Equal || percentages.is_empty() {
        return String::new();
    }

    percentages
        .iter()
        // {:?} keeps the ".0" on whole percentages
        .map(|(name, pct)| format!("{}: {:?}%", name, pct))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn expense_table(expenses: &[ExpenseRecord]) -> String {
    if expenses.is_empty() {
        return "No expense records found.".to_string();
    }

    let mut out = format!(
        "{:<12} {:<12} {:>10}  {:<28} {:<7} {:<24} {}\n",
        "Date", "Payer", "Amount", "Participants", "Split", "Percentages", "Notes"
    );
    for e in expenses {
        out.push_str(&format!(
            "{:<12} {:<12} {:>10.2}  {:<28} {:<7} {:<24} {}\n",
            e.date,
            e.payer,
            e.amount,
            e.participants.join(", "),
            e.split_type.name(),
            format_percentages(e.split_type, &e.percentages),
            e.notes
        ));
    }
    out
}

pub fn payment_table(payments: &[PaymentRecord]) -> String {
    if payments.is_empty() {
        return "No payment records found.".to_string();
    }

    let mut out = format!(
        "{:<12} {:<12} {:>10}  {:<12} {}\n",
        "Date", "Payer", "Amount", "Payee", "Notes"
    );
    for p in payments {
        out.push_str(&format!(
            "{:<12} {:<12} {:>10.2}  {:<12} {}\n",
            p.date, p.payer, p.amount, p.payee, p.notes
        ));
    }
    out
}

pub fn balance_table(balance: &NetBalance) -> String {
    if balance.is_empty() {
        return "No balances yet.".to_string();
    }

    let mut out = format!("{:<16} {:>12}\n", "Person", "Balance");
    for (person, amount) in balance {
        // -0.00 reads badly
        let shown = if amount.abs() < 0.005 { 0.0 } else { *amount };
        out.push_str(&format!("{:<16} {:>12.2}\n", person, shown));
    }
    out
}

pub fn settlement_table(transactions: &[Transaction]) -> String {
    if transactions.is_empty() {
        return "No settlement needed! Everyone is even.".to_string();
    }

    let mut out = format!("{:<16} {:<16} {:>10}\n", "Debtor", "Creditor", "Amount");
    for tx in transactions {
        out.push_str(&format!(
            "{:<16} {:<16} {:>10.2}\n",
            tx.debtor, tx.creditor, tx.amount
        ));
    }
    out
}
