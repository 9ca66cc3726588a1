use comfy_table::{Cell, Table};

use crate::db::{get_connection, load_links, upsert_link};
use crate::error::{Result, TallyError};
use crate::models::CategoryLink;
use crate::settings::db_path;

pub fn set(bank: &str, account: &str, sources: &str) -> Result<()> {
    let pairs = CategoryLink::parse_sources(sources);
    if pairs.is_empty() && !sources.trim().is_empty() {
        return Err(TallyError::Other(format!(
            "No valid pairs in '{sources}'; expected \"(Category,Sub)|(Category2,Sub2)\""
        )));
    }
    let conn = get_connection(&db_path())?;
    // Store the canonical form, not whatever spacing the user typed.
    upsert_link(&conn, bank, account, &CategoryLink::format_sources(&pairs))?;
    println!("Linked {} categor{} to {bank} {account}", pairs.len(), if pairs.len() == 1 { "y" } else { "ies" });
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let links = load_links(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["Bank", "Account", "Linked categories"]);
    for link in links {
        table.add_row(vec![
            Cell::new(&link.bank),
            Cell::new(&link.account),
            Cell::new(CategoryLink::format_sources(&link.pairs)),
        ]);
    }
    println!("Category links\n{table}");
    Ok(())
}
