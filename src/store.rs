// 🗄️ Record Store - where expense & payment rows live
//
// Two backings, same contract:
//   CsvStore    → <dir>/expenses.csv + <dir>/payments.csv
//   SqliteStore → <dir>/ledger.db (WAL mode)
//
// The store only reads full snapshots and appends rows verbatim.
// No update/delete path exists.

use crate::records::{ExpenseRow, PaymentRow, EXPENSE_COLUMNS, PAYMENT_COLUMNS};
use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const EXPENSES_FILE: &str = "expenses.csv";
pub const PAYMENTS_FILE: &str = "payments.csv";
pub const DATABASE_FILE: &str = "ledger.db";

/// Read/append access to the two record collections
pub trait RecordStore: Send {
    /// All expense rows, in insertion order
    fn load_expenses(&self) -> Result<Vec<ExpenseRow>>;

    /// All payment rows, in insertion order
    fn load_payments(&self) -> Result<Vec<PaymentRow>>;

    /// Append one expense row
    fn append_expense(&mut self, row: &ExpenseRow) -> Result<()>;

    /// Append one payment row
    fn append_payment(&mut self, row: &PaymentRow) -> Result<()>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Which backing to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Csv,
    Sqlite,
}

impl Backend {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "csv" => Ok(Backend::Csv),
            "sqlite" | "db" => Ok(Backend::Sqlite),
            other => Err(anyhow!("Unknown backend: {} (expected csv or sqlite)", other)),
        }
    }
}

/// Open a store of the given kind inside `data_dir`
pub fn open_store(backend: Backend, data_dir: &Path) -> Result<Box<dyn RecordStore>> {
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

    let store: Box<dyn RecordStore> = match backend {
        Backend::Csv => Box::new(CsvStore::new(data_dir)),
        Backend::Sqlite => Box::new(SqliteStore::open(&data_dir.join(DATABASE_FILE))?),
    };

    tracing::info!(store = store.name(), dir = %data_dir.display(), "opened record store");
    Ok(store)
}

// ============================================================================
// CSV STORE
// ============================================================================

pub struct CsvStore {
    expenses_path: PathBuf,
    payments_path: PathBuf,
}

impl CsvStore {
    pub fn new(data_dir: &Path) -> Self {
        CsvStore {
            expenses_path: data_dir.join(EXPENSES_FILE),
            payments_path: data_dir.join(PAYMENTS_FILE),
        }
    }

    pub fn expenses_path(&self) -> &Path {
        &self.expenses_path
    }

    pub fn payments_path(&self) -> &Path {
        &self.payments_path
    }
}

impl RecordStore for CsvStore {
    fn load_expenses(&self) -> Result<Vec<ExpenseRow>> {
        load_csv_rows(&self.expenses_path)
    }

    fn load_payments(&self) -> Result<Vec<PaymentRow>> {
        load_csv_rows(&self.payments_path)
    }

    fn append_expense(&mut self, row: &ExpenseRow) -> Result<()> {
        append_csv_row(&self.expenses_path, &EXPENSE_COLUMNS, row)
    }

    fn append_payment(&mut self, row: &PaymentRow) -> Result<()> {
        append_csv_row(&self.payments_path, &PAYMENT_COLUMNS, row)
    }

    fn name(&self) -> &str {
        "csv"
    }
}

/// Read every row of a CSV file. A missing file is an empty collection.
/// Short rows are padded with empty cells so hand-edited sheets still load;
/// rows that don't deserialize even then are skipped with a warning.
fn load_csv_rows<T>(path: &Path) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
{
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .clone();

    let mut rows = Vec::new();
    for (line_num, result) in reader.records().enumerate() {
        // +2 because: 1-indexed + header row
        let line = line_num + 2;

        let mut record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(file = %path.display(), line, error = %e, "skipping unreadable row");
                continue;
            }
        };

        if record.len() != headers.len() {
            tracing::debug!(file = %path.display(), line, cells = record.len(), "padding ragged row");
            record.truncate(headers.len());
            while record.len() < headers.len() {
                record.push_field("");
            }
        }

        match record.deserialize(Some(&headers)) {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!(file = %path.display(), line, error = %e, "skipping unreadable row");
            }
        }
    }

    Ok(rows)
}

fn append_csv_row<T: Serialize>(path: &Path, columns: &[&str], row: &T) -> Result<()> {
    let is_new = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open CSV file for append: {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    if is_new {
        writer.write_record(columns)?;
    }
    writer
        .serialize(row)
        .with_context(|| format!("Failed to append row to {}", path.display()))?;
    writer.flush()?;

    tracing::info!(file = %path.display(), "appended row");
    Ok(())
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::with_connection(conn)
    }

    /// In-memory database (tests, throwaway sessions)
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // Amounts stay TEXT: rows are stored verbatim, coercion happens on read
    conn.execute(
        "CREATE TABLE IF NOT EXISTS expenses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            payer TEXT NOT NULL,
            amount TEXT NOT NULL,
            participants TEXT NOT NULL,
            split_type TEXT NOT NULL,
            percentages TEXT NOT NULL,
            notes TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            payer TEXT NOT NULL,
            amount TEXT NOT NULL,
            payee TEXT NOT NULL,
            notes TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

impl RecordStore for SqliteStore {
    fn load_expenses(&self) -> Result<Vec<ExpenseRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, payer, amount, participants, split_type, percentages, notes
             FROM expenses
             ORDER BY id ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(ExpenseRow {
                    date: row.get(0)?,
                    payer: row.get(1)?,
                    amount: row.get(2)?,
                    participants: row.get(3)?,
                    split_type: row.get(4)?,
                    percentages: row.get(5)?,
                    notes: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read expenses")?;

        Ok(rows)
    }

    fn load_payments(&self) -> Result<Vec<PaymentRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, payer, amount, payee, notes
             FROM payments
             ORDER BY id ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(PaymentRow {
                    date: row.get(0)?,
                    payer: row.get(1)?,
                    amount: row.get(2)?,
                    payee: row.get(3)?,
                    notes: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read payments")?;

        Ok(rows)
    }

    fn append_expense(&mut self, row: &ExpenseRow) -> Result<()> {
        self.conn.execute(
            "INSERT INTO expenses (date, payer, amount, participants, split_type, percentages, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                row.date,
                row.payer,
                row.amount,
                row.participants,
                row.split_type,
                row.percentages,
                row.notes,
            ],
        )?;

        tracing::info!(payer = %row.payer, amount = %row.amount, "appended expense");
        Ok(())
    }

    fn append_payment(&mut self, row: &PaymentRow) -> Result<()> {
        self.conn.execute(
            "INSERT INTO payments (date, payer, amount, payee, notes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![row.date, row.payer, row.amount, row.payee, row.notes],
        )?;

        tracing::info!(payer = %row.payer, payee = %row.payee, amount = %row.amount, "appended payment");
        Ok(())
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Fresh, empty directory under the system temp dir
    fn scratch_dir(label: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!(
            "bill_splitter_{}_{}_{}",
            label,
            std::process::id(),
            nanos
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn dinner_row() -> ExpenseRow {
        ExpenseRow {
            date: "03/07/2025".to_string(),
            payer: "Alice".to_string(),
            amount: "90.00".to_string(),
            participants: "Alice, Bob, Carol".to_string(),
            split_type: "Custom".to_string(),
            percentages: r#"{"Alice":50.0,"Bob":25.0,"Carol":25.0}"#.to_string(),
            notes: "Dinner, with drinks".to_string(),
        }
    }

    fn refund_row() -> PaymentRow {
        PaymentRow {
            date: "03/08/2025".to_string(),
            payer: "Bob".to_string(),
            amount: "30.00".to_string(),
            payee: "Alice".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(Backend::parse("csv").unwrap(), Backend::Csv);
        assert_eq!(Backend::parse("SQLite").unwrap(), Backend::Sqlite);
        assert!(Backend::parse("sheets").is_err());
    }

    #[test]
    fn test_csv_missing_files_are_empty() {
        let dir = scratch_dir("empty");
        let store = CsvStore::new(&dir);

        assert!(store.load_expenses().unwrap().is_empty());
        assert!(store.load_payments().unwrap().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_csv_append_then_load() {
        let dir = scratch_dir("append");
        let mut store = CsvStore::new(&dir);

        store.append_expense(&dinner_row()).unwrap();
        store.append_expense(&dinner_row()).unwrap();
        store.append_payment(&refund_row()).unwrap();

        let expenses = store.load_expenses().unwrap();
        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0], dinner_row());

        let payments = store.load_payments().unwrap();
        assert_eq!(payments, vec![refund_row()]);

        // Header written exactly once
        let raw = std::fs::read_to_string(store.expenses_path()).unwrap();
        assert!(raw.starts_with("Date,Payer,Amount,Participants,Split Type,Percentages,Notes"));
        assert_eq!(raw.matches("Split Type").count(), 1);

        store.append_payment(&refund_row()).unwrap();
        let raw = std::fs::read_to_string(store.payments_path()).unwrap();
        assert!(raw.starts_with("Date,Payer,Amount,Payee,Notes"));
        assert_eq!(raw.matches("Payee").count(), 1);
        assert_eq!(raw.lines().count(), 3);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_csv_tolerates_hand_edited_sheet() {
        let dir = scratch_dir("hand_edited");
        std::fs::write(
            dir.join(EXPENSES_FILE),
            "Date, Payer ,Amount,Participants\n01/01/2025,Alice,abc,\"Bob, Carol\"\n01/02/2025,Bob,12\n",
        )
        .unwrap();

        let store = CsvStore::new(&dir);
        let rows = store.load_expenses().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].payer, "Alice");
        assert_eq!(rows[0].amount, "abc");
        assert_eq!(rows[0].participants, "Bob, Carol");
        assert_eq!(rows[0].split_type, "");
        assert_eq!(rows[1].participants, "");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_csv_short_rows_still_count_toward_balances() {
        use crate::ledger::load_view;

        let dir = scratch_dir("short_rows");
        std::fs::write(
            dir.join(EXPENSES_FILE),
            "Date,Payer,Amount,Participants,Split Type,Percentages,Notes\n\
             01/01/2025,Alice,30,\"Alice, Bob\"\n\
             01/02/2025,Bob,12\n",
        )
        .unwrap();
        std::fs::write(
            dir.join(PAYMENTS_FILE),
            "Date,Payer,Amount,Payee,Notes\n01/03/2025,Bob,5,Alice,extra,cells\n",
        )
        .unwrap();

        let store = CsvStore::new(&dir);
        let view = load_view(&store).unwrap();

        assert_eq!(view.expenses.len(), 2);
        assert_eq!(view.payments.len(), 1);
        // Alice +30 -15 -5, Bob -15 +12 +5
        assert!((view.balances["Alice"] - 10.0).abs() < 1e-9);
        assert!((view.balances["Bob"] - 2.0).abs() < 1e-9);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_sqlite_append_then_load() {
        let mut store = SqliteStore::in_memory().unwrap();

        store.append_expense(&dinner_row()).unwrap();
        store.append_payment(&refund_row()).unwrap();
        store.append_payment(&refund_row()).unwrap();

        assert_eq!(store.load_expenses().unwrap(), vec![dinner_row()]);
        assert_eq!(store.load_payments().unwrap().len(), 2);

        println!("✅ SQLite store round trip");
    }

    #[test]
    fn test_open_store_creates_directory() {
        let dir = scratch_dir("open").join("nested");
        let store = open_store(Backend::Sqlite, &dir).unwrap();

        assert_eq!(store.name(), "sqlite");
        assert!(dir.join(DATABASE_FILE).exists());

        std::fs::remove_dir_all(dir.parent().unwrap()).ok();
    }
}
