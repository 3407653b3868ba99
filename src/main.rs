use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::PathBuf;

// Use library instead of local modules
use bill_splitter::display::{balance_table, expense_table, payment_table, settlement_table};
use bill_splitter::records::DATE_FORMAT;
use bill_splitter::{
    init_tracing, load_view, open_store, record_expense, record_payment, residual, Backend,
    ExpenseRequest, PaymentRequest, RecordError, SplitType,
};

#[derive(Parser, Debug)]
#[command(name = "bill-splitter", version, about = "Split shared expenses and settle up")]
struct Cli {
    /// Directory holding the ledger files
    #[arg(long, env = "BILL_SPLITTER_DATA", default_value = ".")]
    data: PathBuf,

    /// Record store backing
    #[arg(long, env = "BILL_SPLITTER_BACKEND", value_enum, default_value_t = BackendArg::Csv)]
    backend: BackendArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum BackendArg {
    Csv,
    Sqlite,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Csv => Backend::Csv,
            BackendArg::Sqlite => Backend::Sqlite,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SplitArg {
    Equal,
    Custom,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all expense records
    Expenses,
    /// List all payment records
    Payments,
    /// Net balance per person
    Balances,
    /// Who pays whom to get everyone even
    Settle {
        /// Replay the plan and report what is left over
        #[arg(long)]
        verify: bool,
    },
    /// Record a new expense
    AddExpense {
        #[arg(long)]
        payer: String,
        #[arg(long)]
        amount: f64,
        /// Comma-separated names
        #[arg(long)]
        participants: String,
        #[arg(long, value_enum, default_value_t = SplitArg::Equal)]
        split: SplitArg,
        /// NAME=PERCENT, repeat per participant (custom splits)
        #[arg(long = "pct", value_parser = parse_pct)]
        percentages: Vec<(String, f64)>,
        /// MM/DD/YYYY, defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Record a new payment
    AddPayment {
        /// Who pays
        #[arg(long)]
        payer: String,
        #[arg(long)]
        amount: f64,
        /// Who receives
        #[arg(long)]
        payee: String,
        /// MM/DD/YYYY, defaults to today
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        notes: String,
    },
}

fn parse_pct(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PERCENT, got '{}'", raw))?;
    let value: f64 = value
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| format!("'{}' is not a percentage", value))?;
    Ok((name.trim().to_string(), value))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|e| format!("expected MM/DD/YYYY: {}", e))
}

fn main() -> Result<()> {
    init_tracing("bill_splitter=warn");
    let cli = Cli::parse();

    let mut store = open_store(cli.backend.into(), &cli.data)
        .with_context(|| format!("Failed to open ledger in {}", cli.data.display()))?;

    match cli.command {
        Command::Expenses => {
            let view = load_view(store.as_ref())?;
            println!("🧾 All Expense Records\n");
            println!("{}", expense_table(&view.expenses));
        }
        Command::Payments => {
            let view = load_view(store.as_ref())?;
            println!("💸 All Payment Records\n");
            println!("{}", payment_table(&view.payments));
        }
        Command::Balances => {
            let view = load_view(store.as_ref())?;
            println!("⚖️  Net Balances\n");
            println!("{}", balance_table(&view.balances));
        }
        Command::Settle { verify } => {
            let view = load_view(store.as_ref())?;
            println!("🤝 Settlement Chart\n");
            println!("{}", settlement_table(&view.settlement));

            if verify {
                let left = residual(&view.balances, &view.settlement);
                println!("✓ Largest balance after settling: {:.9}", left);
            }
        }
        Command::AddExpense {
            payer,
            amount,
            participants,
            split,
            percentages,
            date,
            notes,
        } => {
            let request = ExpenseRequest {
                date,
                payer,
                amount,
                participants,
                split_type: match split {
                    SplitArg::Equal => SplitType::Equal,
                    SplitArg::Custom => SplitType::Custom,
                },
                percentages: percentages.into_iter().collect::<BTreeMap<_, _>>(),
                notes,
            };

            match record_expense(store.as_mut(), &request) {
                Ok(_) => println!("✅ Expense added successfully!"),
                Err(e) => return reject(e),
            }
        }
        Command::AddPayment {
            payer,
            amount,
            payee,
            date,
            notes,
        } => {
            let request = PaymentRequest {
                date,
                payer,
                amount,
                payee,
                notes,
            };

            match record_payment(store.as_mut(), &request) {
                Ok(_) => println!("✅ Payment added successfully!"),
                Err(e) => return reject(e),
            }
        }
    }

    Ok(())
}

/// Validation problems are printed and exit non-zero; store failures propagate
fn reject(e: RecordError) -> Result<()> {
    match e {
        RecordError::Invalid(errors) => {
            for error in &errors {
                eprintln!("❌ {}", error);
            }
            std::process::exit(2);
        }
        RecordError::Store(e) => Err(e),
    }
}
