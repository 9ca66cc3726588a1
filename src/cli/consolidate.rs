use crate::consolidator::consolidate;
use crate::db::{
    get_connection, load_balance_entries, load_links, load_overrides, load_raw_records,
    load_rules, replace_ledger,
};
use crate::error::{Result, TallyError};
use crate::settings::db_path;

pub fn run() -> Result<()> {
    let mut conn = get_connection(&db_path())?;

    // One consistent snapshot of every input before any processing starts.
    let raw_records = load_raw_records(&conn)?;
    let rules = load_rules(&conn)?;
    let overrides = load_overrides(&conn)?;
    let links = load_links(&conn)?;
    let entries = load_balance_entries(&conn)?;

    let (ledger, report) = consolidate(raw_records, &rules, &overrides, &links, &entries);
    // The swap is one SQLite transaction; on failure the previous ledger is
    // still in place.
    replace_ledger(&mut conn, &ledger)
        .map_err(|e| TallyError::Consolidation(e.to_string()))?;

    println!("Consolidated {} ledger rows:", ledger.len());
    println!("  File:      {}", report.file_rows);
    println!("  Captured:  {}", report.captured_rows);
    println!("  Synthetic: {}", report.synthetic_rows);
    if report.duplicates_dropped > 0 {
        println!("  Duplicates dropped: {}", report.duplicates_dropped);
    }
    for warning in &report.rule_conflicts {
        println!("  Warning: {warning}");
    }
    for skipped in &report.skipped_entries {
        println!("  Skipped balance entry: {skipped}");
    }
    Ok(())
}
