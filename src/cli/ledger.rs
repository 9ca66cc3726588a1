use comfy_table::{Cell, Table};

use crate::db::{get_connection, load_ledger};
use crate::error::Result;
use crate::fmt::money;
use crate::keys::short_key;
use crate::settings::db_path;

pub fn run(bank: Option<&str>, account: Option<&str>, limit: usize) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let rows = load_ledger(&conn)?;

    let filtered: Vec<_> = rows
        .iter()
        .filter(|(_, tx)| bank.map_or(true, |b| tx.bank == b))
        .filter(|(_, tx)| account.map_or(true, |a| tx.account == a))
        .collect();

    let mut table = Table::new();
    table.set_header(vec![
        "Date", "Bank", "Account", "Description", "Dir", "Amount", "Category", "Sub-category", "Origin", "Key",
    ]);
    for (key, tx) in filtered.iter().take(limit) {
        table.add_row(vec![
            Cell::new(tx.transaction_date),
            Cell::new(&tx.bank),
            Cell::new(&tx.account),
            Cell::new(&tx.description),
            Cell::new(tx.direction.as_str()),
            Cell::new(money(&tx.amount)),
            Cell::new(&tx.category),
            Cell::new(&tx.sub_category),
            Cell::new(tx.origin.as_str()),
            Cell::new(short_key(key)),
        ]);
    }
    println!("Ledger ({} of {} rows)\n{table}", filtered.len().min(limit), filtered.len());
    if filtered.is_empty() {
        println!("Nothing here yet. Load files and run `tally consolidate`.");
    }
    Ok(())
}
