use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::service::TransactionSink;
use crate::transaction::{Money, Transaction};

/// Transaction as persisted, with the identity the database assigned to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub id: i64,
    /// UUID shared by every row of one upload
    pub import_id: String,
    pub created_at: String,
    #[serde(flatten)]
    pub transaction: Transaction,
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Transactions Table
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            import_id TEXT NOT NULL,
            date TEXT NOT NULL,
            description TEXT NOT NULL,
            amount_minor INTEGER NOT NULL,
            currency TEXT NOT NULL,
            bank TEXT NOT NULL,
            category TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_date ON transactions(date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_bank ON transactions(bank)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_import_id ON transactions(import_id)",
        [],
    )?;

    Ok(())
}

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    setup_database(&conn).context("Failed to set up database schema")?;
    Ok(conn)
}

/// Insert one upload's transactions inside a single SQL transaction.
///
/// Any failing insert rolls the whole batch back.
pub fn insert_transactions(conn: &mut Connection, transactions: &[Transaction]) -> Result<usize> {
    let import_id = uuid::Uuid::new_v4().to_string();
    let db_tx = conn.transaction()?;

    {
        let mut stmt = db_tx.prepare(
            "INSERT INTO transactions (
                import_id, date, description, amount_minor, currency, bank, category
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;

        for tx in transactions {
            stmt.execute(params![
                import_id,
                tx.date,
                tx.description,
                tx.amount.minor_units,
                tx.amount.currency,
                tx.bank,
                tx.category,
            ])
            .with_context(|| format!("Failed to insert transaction {:?}", tx.description))?;
        }
    }

    db_tx.commit().context("Failed to commit import")?;

    tracing::debug!(import_id = %import_id, inserted = transactions.len(), "transactions inserted");

    Ok(transactions.len())
}

const SELECT_COLUMNS: &str = "SELECT id, import_id, created_at, date, description,
        amount_minor, currency, bank, category
 FROM transactions";

fn stored_from_row(row: &Row<'_>) -> rusqlite::Result<StoredTransaction> {
    let date: NaiveDate = row.get(3)?;
    let minor_units: i64 = row.get(5)?;
    let currency: String = row.get(6)?;

    Ok(StoredTransaction {
        id: row.get(0)?,
        import_id: row.get(1)?,
        created_at: row.get(2)?,
        transaction: Transaction {
            date,
            description: row.get(4)?,
            amount: Money::new(minor_units, currency),
            bank: row.get(7)?,
            category: row.get(8)?,
        },
    })
}

/// Every stored transaction, newest first
pub fn get_all_transactions(conn: &Connection) -> Result<Vec<StoredTransaction>> {
    let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY date DESC, id DESC"))?;

    let transactions = stmt
        .query_map([], stored_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

pub fn get_transactions_by_bank(conn: &Connection, bank: &str) -> Result<Vec<StoredTransaction>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE bank = ?1 ORDER BY date DESC, id DESC"
    ))?;

    let transactions = stmt
        .query_map([bank.to_lowercase()], stored_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(transactions)
}

pub fn count_transactions(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?;

    Ok(count)
}

/// `TransactionSink` backed by an open SQLite connection
pub struct SqliteSink<'a> {
    conn: &'a mut Connection,
}

impl<'a> SqliteSink<'a> {
    pub fn new(conn: &'a mut Connection) -> Self {
        SqliteSink { conn }
    }
}

impl TransactionSink for SqliteSink<'_> {
    fn store(&mut self, transactions: &[Transaction]) -> Result<usize> {
        insert_transactions(self.conn, transactions)
    }
}
