// Bill Splitter - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod records;    // Raw rows, typed records, coerce-or-default parsing
pub mod validation; // New-record requests and rejections
pub mod balance;    // Balance Engine
pub mod settlement; // Settlement Planner
pub mod store;      // CSV / SQLite record stores
pub mod ledger;     // Snapshot → view pipeline
pub mod display;    // CLI tables

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use records::{
    ExpenseRecord, PaymentRecord, ExpenseRow, PaymentRow, SplitType,
    coerce_amount, parse_participants, parse_percentages,
    expenses_from_rows, payments_from_rows,
};
pub use validation::{
    ExpenseRequest, PaymentRequest, ValidationError, ValidationResult,
};
pub use balance::{
    NetBalance, compute_balances, expense_balances, adjust_for_payments,
};
pub use settlement::{
    Transaction, plan_settlement, apply_transactions, residual, EPSILON,
};
pub use store::{
    RecordStore, CsvStore, SqliteStore, Backend, open_store,
};
pub use ledger::{
    LedgerView, RecordError, load_view, record_expense, record_payment,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the tracing subscriber shared by both binaries.
/// `RUST_LOG` wins; otherwise `default_filter` is used.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    // A second init (tests, embedding) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
