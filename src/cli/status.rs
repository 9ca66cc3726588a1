use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::format_bytes;
use crate::settings::get_data_dir;

pub fn run() -> Result<()> {
    let data_dir = get_data_dir();
    let db_path = data_dir.join("tally.db");

    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let size = std::fs::metadata(&db_path)?.len();
        println!("DB size:    {}", format_bytes(size));

        let conn = get_connection(&db_path)?;
        let raw: i64 = conn.query_row("SELECT count(*) FROM raw_records", [], |r| r.get(0))?;
        let ledger: i64 = conn.query_row("SELECT count(*) FROM ledger", [], |r| r.get(0))?;
        let uncategorized: i64 = conn.query_row(
            "SELECT count(*) FROM ledger WHERE category = ?1",
            [crate::models::UNCATEGORIZED],
            |r| r.get(0),
        )?;
        let rules: i64 = conn.query_row("SELECT count(*) FROM rules", [], |r| r.get(0))?;
        let overrides: i64 = conn.query_row("SELECT count(*) FROM overrides", [], |r| r.get(0))?;
        let entries: i64 = conn.query_row("SELECT count(*) FROM balance_entries", [], |r| r.get(0))?;

        println!();
        println!("Raw records:    {raw}");
        println!("Ledger rows:    {ledger}");
        println!("Uncategorized:  {uncategorized}");
        println!("Rules:          {rules}");
        println!("Overrides:      {overrides}");
        println!("Checkpoints:    {entries}");
    } else {
        println!();
        println!("Database not found. Run `tally init` to set up.");
    }

    Ok(())
}
