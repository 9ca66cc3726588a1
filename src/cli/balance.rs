use std::str::FromStr;

use chrono::NaiveDate;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::db::{get_connection, load_balance_entries, remove_balance_entry, upsert_balance_entry};
use crate::error::{Result, TallyError};
use crate::fmt::money;
use crate::models::BalanceEntry;
use crate::settings::db_path;

fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| TallyError::Other(format!("Invalid date '{date}'; expected YYYY-MM-DD")))
}

pub fn add(bank: &str, account: &str, date: &str, amount: &str) -> Result<()> {
    let snapshot_date = parse_date(date)?;
    let balance = Decimal::from_str(amount.trim())
        .map_err(|_| TallyError::InvalidBalanceEntry(format!("non-numeric balance '{amount}'")))?;

    let conn = get_connection(&db_path())?;
    upsert_balance_entry(
        &conn,
        &BalanceEntry {
            bank: bank.to_string(),
            account: account.to_string(),
            snapshot_date,
            balance: balance.to_string(),
            entered_at: String::new(),
        },
    )?;
    println!("Balance checkpoint: {bank} {account} = {} on {snapshot_date}", money(&balance));
    Ok(())
}

pub fn remove(bank: &str, account: &str, date: &str) -> Result<()> {
    let snapshot_date = parse_date(date)?;
    let conn = get_connection(&db_path())?;
    remove_balance_entry(&conn, bank, account, snapshot_date)?;
    println!("Removed checkpoint for {bank} {account} on {snapshot_date}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut entries = load_balance_entries(&conn)?;
    entries.sort_by(|a, b| {
        (&a.bank, &a.account, a.snapshot_date).cmp(&(&b.bank, &b.account, b.snapshot_date))
    });

    let mut table = Table::new();
    table.set_header(vec!["Bank", "Account", "Date", "Balance", "Entered"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.bank),
            Cell::new(&entry.account),
            Cell::new(entry.snapshot_date),
            Cell::new(&entry.balance),
            Cell::new(&entry.entered_at),
        ]);
    }
    println!("Balance checkpoints\n{table}");
    Ok(())
}
