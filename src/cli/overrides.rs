use comfy_table::{Cell, Table};

use crate::db::{get_connection, load_overrides, remove_override, upsert_override};
use crate::error::{Result, TallyError};
use crate::keys::short_key;
use crate::models::{Direction, ManualOverride};
use crate::settings::db_path;

pub fn add(key: &str, category: &str, sub: &str, direction: &str) -> Result<()> {
    let direction = Direction::parse(direction)
        .ok_or_else(|| TallyError::Other(format!("Unknown direction: {direction}")))?;
    let conn = get_connection(&db_path())?;
    upsert_override(
        &conn,
        &ManualOverride {
            txn_key: key.to_string(),
            category: category.to_string(),
            sub_category: sub.to_string(),
            direction,
            created_at: String::new(),
        },
    )?;
    println!("Override set for {} \u{2192} {category}", short_key(key));
    println!("Run `tally consolidate` to apply it.");
    Ok(())
}

pub fn remove(key: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    remove_override(&conn, key)?;
    println!("Override removed for {}", short_key(key));
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let overrides = load_overrides(&conn)?;
    let mut rows: Vec<_> = overrides.into_values().collect();
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let mut table = Table::new();
    table.set_header(vec!["Key", "Category", "Sub-category", "Direction", "Created"]);
    for ov in rows {
        table.add_row(vec![
            Cell::new(&ov.txn_key),
            Cell::new(&ov.category),
            Cell::new(&ov.sub_category),
            Cell::new(ov.direction.as_str()),
            Cell::new(&ov.created_at),
        ]);
    }
    println!("Overrides\n{table}");
    Ok(())
}
