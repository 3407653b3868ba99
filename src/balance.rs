// ⚖️ Balance Engine - Expenses + Payments → Net Balance
//
// For every expense:
//   payer        += amount
//   participant  -= amount / |participants|   (payer included if listed)
// For every payment:
//   payer        += amount   (paying down debt)
//   payee        -= amount
//
// Positive balance = is owed money, negative = owes money.
// The sum over all persons stays at 0 because every step is balance-neutral.

use crate::records::{ExpenseRecord, PaymentRecord};
use std::collections::BTreeMap;

/// Person → signed net balance, ordered by name
pub type NetBalance = BTreeMap<String, f64>;

/// Compute the net balance for the full record set.
///
/// Every person mentioned anywhere (payer, participant, payee) gets an
/// entry, even if it nets to zero.
///
/// Split type is NOT consulted: Custom expenses are balanced as an equal
/// split across the listed participants, exactly like Equal ones.
pub fn compute_balances(expenses: &[ExpenseRecord], payments: &[PaymentRecord]) -> NetBalance {
    let mut balance = NetBalance::new();

    for expense in expenses {
        for person in expense.persons() {
            balance.entry(person.to_string()).or_insert(0.0);
        }
    }
    for payment in payments {
        balance.entry(payment.payer.clone()).or_insert(0.0);
        balance.entry(payment.payee.clone()).or_insert(0.0);
    }

    apply_expenses(&mut balance, expenses);
    let balance = adjust_for_payments(balance, payments);

    tracing::debug!(
        persons = balance.len(),
        expenses = expenses.len(),
        payments = payments.len(),
        "computed balances"
    );

    balance
}

/// Balances from expense records alone
pub fn expense_balances(expenses: &[ExpenseRecord]) -> NetBalance {
    compute_balances(expenses, &[])
}

/// Fold payment records into an existing balance
pub fn adjust_for_payments(mut balance: NetBalance, payments: &[PaymentRecord]) -> NetBalance {
    for payment in payments {
        *balance.entry(payment.payer.clone()).or_insert(0.0) += payment.amount;
        *balance.entry(payment.payee.clone()).or_insert(0.0) -= payment.amount;
    }
    balance
}

fn apply_expenses(balance: &mut NetBalance, expenses: &[ExpenseRecord]) {
    for expense in expenses {
        *balance.entry(expense.payer.clone()).or_insert(0.0) += expense.amount;

        // No participants: the payer keeps the credit, nobody is charged
        if expense.participants.is_empty() {
            tracing::warn!(payer = %expense.payer, amount = expense.amount, "expense without participants");
            continue;
        }

        let share = expense.amount / expense.participants.len() as f64;
        for participant in &expense.participants {
            *balance.entry(participant.clone()).or_insert(0.0) -= share;
        }
    }
}

/// Sum of all balances (≈ 0 for a consistent record set)
pub fn total(balance: &NetBalance) -> f64 {
    balance.values().sum()
}
