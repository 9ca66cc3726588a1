use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};
use rust_decimal::Decimal;

use crate::error::{Result, TallyError};
use crate::keys::transaction_key;
use crate::models::{
    BalanceEntry, CategoryLink, Direction, ManualOverride, Origin, Rule, Transaction,
};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS raw_records (
    id INTEGER PRIMARY KEY,
    txn_key TEXT NOT NULL UNIQUE,
    transaction_date TEXT NOT NULL,
    effective_date TEXT NOT NULL,
    bank TEXT NOT NULL,
    account TEXT NOT NULL,
    description TEXT NOT NULL,
    direction TEXT NOT NULL,
    amount TEXT NOT NULL,
    balance TEXT,
    source_file TEXT,
    loaded_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS ledger (
    id INTEGER PRIMARY KEY,
    txn_key TEXT NOT NULL,
    transaction_date TEXT NOT NULL,
    effective_date TEXT NOT NULL,
    bank TEXT NOT NULL,
    account TEXT NOT NULL,
    description TEXT NOT NULL,
    direction TEXT NOT NULL,
    amount TEXT NOT NULL,
    balance TEXT,
    category TEXT NOT NULL,
    sub_category TEXT NOT NULL DEFAULT '',
    origin TEXT NOT NULL,
    source_file TEXT
);

CREATE TABLE IF NOT EXISTS rules (
    id INTEGER PRIMARY KEY,
    pattern TEXT NOT NULL,
    category TEXT NOT NULL,
    sub_category TEXT NOT NULL DEFAULT '',
    direction TEXT NOT NULL DEFAULT 'None',
    priority INTEGER NOT NULL,
    is_wildcard INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS overrides (
    txn_key TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    sub_category TEXT NOT NULL DEFAULT '',
    direction TEXT NOT NULL DEFAULT 'None',
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS category_links (
    id INTEGER PRIMARY KEY,
    bank TEXT NOT NULL,
    account TEXT NOT NULL,
    sources TEXT NOT NULL DEFAULT '',
    UNIQUE(bank, account)
);

CREATE TABLE IF NOT EXISTS balance_entries (
    id INTEGER PRIMARY KEY,
    bank TEXT NOT NULL,
    account TEXT NOT NULL,
    snapshot_date TEXT NOT NULL,
    balance TEXT NOT NULL,
    entered_at TEXT DEFAULT (datetime('now')),
    UNIQUE(bank, account, snapshot_date)
);
";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn decimal_col(row: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    Decimal::from_str(&s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn opt_decimal_col(row: &Row, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    let s: Option<String> = row.get(idx)?;
    match s {
        Some(s) if !s.is_empty() => Decimal::from_str(&s)
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
        _ => Ok(None),
    }
}

fn date_col(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn direction_col(row: &Row, idx: usize) -> rusqlite::Result<Direction> {
    let s: String = row.get(idx)?;
    Direction::parse(&s).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown direction '{s}'").into(),
        )
    })
}

// Shared column order for raw_records and ledger reads (ledger adds
// category/sub_category/origin on top).
const TX_COLS: &str =
    "transaction_date, effective_date, bank, account, description, direction, amount, balance, source_file";

fn tx_from_row(row: &Row, category: String, sub_category: String, origin: Origin) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        transaction_date: date_col(row, 0)?,
        effective_date: date_col(row, 1)?,
        bank: row.get(2)?,
        account: row.get(3)?,
        description: row.get(4)?,
        direction: direction_col(row, 5)?,
        amount: decimal_col(row, 6)?,
        balance: opt_decimal_col(row, 7)?,
        category,
        sub_category,
        origin,
        source_file: row.get(8)?,
    })
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

pub fn raw_key_exists(conn: &Connection, key: &str) -> Result<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM raw_records WHERE txn_key = ?1")?;
    Ok(stmt.exists([key])?)
}

pub fn insert_raw_record(conn: &Connection, tx: &Transaction) -> Result<()> {
    conn.execute(
        "INSERT INTO raw_records (txn_key, transaction_date, effective_date, bank, account, description, direction, amount, balance, source_file) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            transaction_key(tx),
            tx.transaction_date.to_string(),
            tx.effective_date.to_string(),
            tx.bank,
            tx.account,
            tx.description,
            tx.direction.as_str(),
            tx.amount.to_string(),
            tx.balance.map(|b| b.to_string()),
            tx.source_file,
        ],
    )?;
    Ok(())
}

/// Load order is insertion order (rowid), which `tally load` makes
/// deterministic by processing files in lexicographic path order.
pub fn load_raw_records(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TX_COLS} FROM raw_records ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([], |row| {
            tx_from_row(
                row,
                crate::models::UNCATEGORIZED.to_string(),
                String::new(),
                Origin::File,
            )
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

pub fn insert_rule(conn: &Connection, rule: &Rule) -> Result<i64> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM rules WHERE lower(pattern) = lower(?1)")?
        .exists([&rule.pattern])?;
    if exists {
        return Err(TallyError::Other(format!(
            "A rule with pattern '{}' already exists",
            rule.pattern
        )));
    }
    conn.execute(
        "INSERT INTO rules (pattern, category, sub_category, direction, priority, is_wildcard) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            rule.pattern,
            rule.category,
            rule.sub_category,
            rule.direction.as_str(),
            rule.priority,
            rule.is_wildcard as i32,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insertion order, so equal priorities tie-break deterministically.
pub fn load_rules(conn: &Connection) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(
        "SELECT id, pattern, category, sub_category, direction, priority, is_wildcard FROM rules ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Rule {
                id: Some(row.get(0)?),
                pattern: row.get(1)?,
                category: row.get(2)?,
                sub_category: row.get(3)?,
                direction: direction_col(row, 4)?,
                priority: row.get(5)?,
                is_wildcard: row.get::<_, i64>(6)? != 0,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_rule(conn: &Connection, id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM rules WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(TallyError::Other(format!("No rule with ID {id}")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

pub fn upsert_override(conn: &Connection, ov: &ManualOverride) -> Result<()> {
    conn.execute(
        "INSERT INTO overrides (txn_key, category, sub_category, direction, created_at) \
         VALUES (?1, ?2, ?3, ?4, datetime('now')) \
         ON CONFLICT(txn_key) DO UPDATE SET \
             category = excluded.category, \
             sub_category = excluded.sub_category, \
             direction = excluded.direction, \
             created_at = excluded.created_at",
        rusqlite::params![ov.txn_key, ov.category, ov.sub_category, ov.direction.as_str()],
    )?;
    Ok(())
}

pub fn remove_override(conn: &Connection, txn_key: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM overrides WHERE txn_key = ?1", [txn_key])?;
    if changed == 0 {
        return Err(TallyError::Other(format!("No override for key {txn_key}")));
    }
    Ok(())
}

pub fn load_overrides(conn: &Connection) -> Result<HashMap<String, ManualOverride>> {
    let mut stmt = conn.prepare(
        "SELECT txn_key, category, sub_category, direction, created_at FROM overrides",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ManualOverride {
                txn_key: row.get(0)?,
                category: row.get(1)?,
                sub_category: row.get(2)?,
                direction: direction_col(row, 3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().map(|ov| (ov.txn_key.clone(), ov)).collect())
}

// ---------------------------------------------------------------------------
// Category links and balance entries
// ---------------------------------------------------------------------------

pub fn upsert_link(conn: &Connection, bank: &str, account: &str, sources: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO category_links (bank, account, sources) VALUES (?1, ?2, ?3) \
         ON CONFLICT(bank, account) DO UPDATE SET sources = excluded.sources",
        rusqlite::params![bank, account, sources],
    )?;
    Ok(())
}

pub fn load_links(conn: &Connection) -> Result<Vec<CategoryLink>> {
    let mut stmt = conn.prepare("SELECT bank, account, sources FROM category_links ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            let sources: String = row.get(2)?;
            Ok(CategoryLink {
                bank: row.get(0)?,
                account: row.get(1)?,
                pairs: CategoryLink::parse_sources(&sources),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn upsert_balance_entry(conn: &Connection, entry: &BalanceEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO balance_entries (bank, account, snapshot_date, balance, entered_at) \
         VALUES (?1, ?2, ?3, ?4, datetime('now')) \
         ON CONFLICT(bank, account, snapshot_date) DO UPDATE SET \
             balance = excluded.balance, entered_at = excluded.entered_at",
        rusqlite::params![
            entry.bank,
            entry.account,
            entry.snapshot_date.to_string(),
            entry.balance,
        ],
    )?;
    Ok(())
}

pub fn remove_balance_entry(conn: &Connection, bank: &str, account: &str, date: NaiveDate) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM balance_entries WHERE bank = ?1 AND account = ?2 AND snapshot_date = ?3",
        rusqlite::params![bank, account, date.to_string()],
    )?;
    if changed == 0 {
        return Err(TallyError::Other(format!(
            "No balance entry for {bank} {account} on {date}"
        )));
    }
    Ok(())
}

pub fn load_balance_entries(conn: &Connection) -> Result<Vec<BalanceEntry>> {
    let mut stmt = conn.prepare(
        "SELECT bank, account, snapshot_date, balance, entered_at FROM balance_entries ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(BalanceEntry {
                bank: row.get(0)?,
                account: row.get(1)?,
                snapshot_date: date_col(row, 2)?,
                balance: row.get(3)?,
                entered_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Replace the persisted ledger in one SQLite transaction: the old rows stay
/// visible until commit, and any failure rolls back to the previous ledger.
pub fn replace_ledger(conn: &mut Connection, transactions: &[Transaction]) -> Result<()> {
    let db_tx = conn.transaction()?;
    db_tx.execute("DELETE FROM ledger", [])?;
    {
        let mut stmt = db_tx.prepare(
            "INSERT INTO ledger (txn_key, transaction_date, effective_date, bank, account, description, direction, amount, balance, category, sub_category, origin, source_file) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )?;
        for tx in transactions {
            stmt.execute(rusqlite::params![
                transaction_key(tx),
                tx.transaction_date.to_string(),
                tx.effective_date.to_string(),
                tx.bank,
                tx.account,
                tx.description,
                tx.direction.as_str(),
                tx.amount.to_string(),
                tx.balance.map(|b| b.to_string()),
                tx.category,
                tx.sub_category,
                tx.origin.as_str(),
                tx.source_file,
            ])?;
        }
    }
    db_tx.commit()?;
    Ok(())
}

/// Ledger rows in stored order (the consolidation sort), with each row's key.
pub fn load_ledger(conn: &Connection) -> Result<Vec<(String, Transaction)>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TX_COLS}, txn_key, category, sub_category, origin FROM ledger ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([], |row| {
            let key: String = row.get(9)?;
            let category: String = row.get(10)?;
            let sub_category: String = row.get(11)?;
            let origin_s: String = row.get(12)?;
            let origin = Origin::parse(&origin_s).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    12,
                    Type::Text,
                    format!("unknown origin '{origin_s}'").into(),
                )
            })?;
            Ok((key, tx_from_row(row, category, sub_category, origin)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
