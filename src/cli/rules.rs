use comfy_table::{Cell, Table};

use crate::db::{delete_rule, get_connection, insert_rule, load_rules};
use crate::error::{Result, TallyError};
use crate::models::{Direction, Rule};
use crate::settings::db_path;

pub fn add(pattern: &str, category: &str, sub: &str, direction: &str, priority: Option<i64>) -> Result<()> {
    let direction = Direction::parse(direction)
        .ok_or_else(|| TallyError::Other(format!("Unknown direction: {direction}")))?;
    let rule = Rule {
        id: None,
        pattern: pattern.to_string(),
        category: category.to_string(),
        sub_category: sub.to_string(),
        direction,
        priority: priority.unwrap_or_else(|| Rule::default_priority(pattern)),
        is_wildcard: pattern.contains('*'),
    };

    let conn = get_connection(&db_path())?;
    insert_rule(&conn, &rule)?;
    println!("Added rule: '{pattern}' \u{2192} {category} (priority {})", rule.priority);
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut rules = load_rules(&conn)?;
    rules.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut table = Table::new();
    table.set_header(vec!["ID", "Pattern", "Category", "Sub-category", "Direction", "Priority"]);
    for rule in rules {
        table.add_row(vec![
            Cell::new(rule.id.unwrap_or_default()),
            Cell::new(rule.pattern),
            Cell::new(rule.category),
            Cell::new(rule.sub_category),
            Cell::new(rule.direction.as_str()),
            Cell::new(rule.priority),
        ]);
    }
    println!("Rules\n{table}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    delete_rule(&conn, id)?;
    println!("Deleted rule {id}");
    Ok(())
}
