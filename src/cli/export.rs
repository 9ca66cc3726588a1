use crate::db::{get_connection, load_ledger};
use crate::error::Result;
use crate::settings::db_path;

/// Flat-table CSV of the consolidated ledger, one row per transaction.
pub fn run(output: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let rows = load_ledger(&conn)?;

    let mut wtr = csv::Writer::from_path(output)?;
    wtr.write_record([
        "Transaction Date",
        "Effective Date",
        "Bank",
        "Account",
        "Description",
        "Direction",
        "Amount",
        "Balance",
        "Category",
        "Sub-Category",
        "Origin",
        "Source File",
        "Key",
    ])?;
    for (key, tx) in &rows {
        wtr.write_record([
            tx.transaction_date.to_string(),
            tx.effective_date.to_string(),
            tx.bank.clone(),
            tx.account.clone(),
            tx.description.clone(),
            tx.direction.as_str().to_string(),
            tx.amount.to_string(),
            tx.balance.map(|b| b.to_string()).unwrap_or_default(),
            tx.category.clone(),
            tx.sub_category.clone(),
            tx.origin.as_str().to_string(),
            tx.source_file.clone().unwrap_or_default(),
            key.clone(),
        ])?;
    }
    wtr.flush()?;
    println!("Exported {} rows to {output}", rows.len());
    Ok(())
}
