use std::path::Path;

use crate::db::{get_connection, insert_raw_record, raw_key_exists};
use crate::error::Result;
use crate::keys::transaction_key;
use crate::loader::read_file;
use crate::settings::db_path;

pub fn run(files: &[String], bank: &str, account: &str) -> Result<()> {
    let mut conn = get_connection(&db_path())?;

    // Lexicographic order keeps the raw-record store deterministic no matter
    // how the shell expanded the arguments.
    let mut sorted = files.to_vec();
    sorted.sort();

    let mut loaded = 0usize;
    let mut skipped = 0usize;
    let mut malformed = Vec::new();

    // All files commit together; a structural error in any of them leaves
    // the raw-record store untouched.
    let txn = conn.transaction()?;
    for file in &sorted {
        let result = read_file(Path::new(file), bank, account)?;
        malformed.extend(result.malformed);
        for tx in &result.records {
            if raw_key_exists(&txn, &transaction_key(tx))? {
                skipped += 1;
                continue;
            }
            insert_raw_record(&txn, tx)?;
            loaded += 1;
        }
    }
    txn.commit()?;

    println!("Loaded {loaded} records for {bank} {account} ({skipped} duplicates skipped)");
    if !malformed.is_empty() {
        println!("{} malformed rows excluded:", malformed.len());
        for issue in &malformed {
            println!("  {issue}");
        }
    }
    println!("Run `tally consolidate` to rebuild the ledger.");
    Ok(())
}
