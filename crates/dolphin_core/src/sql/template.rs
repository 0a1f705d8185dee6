//! Authoring templates and mutating statements.
//!
//! Templates are opened in an editor for the user to complete. Values are
//! written as `[column]` placeholders, which the server rejects if the
//! statement is run unedited.

use super::{qualified, quote_identifier};
use crate::models::ColumnMeta;

/// Placeholder for a value the user fills in.
fn placeholder(name: &str) -> String {
    format!("[{name}]")
}

/// `SELECT *` with a row limit.
pub fn select(database: &str, table: &str, limit: u32) -> String {
    format!("SELECT * FROM {} LIMIT {limit};", qualified(database, table))
}

/// INSERT listing every column once as a target and once as a placeholder.
pub fn insert(database: &str, table: &str, columns: &[ColumnMeta]) -> String {
    let names = columns
        .iter()
        .map(|c| format!("\n    {}", quote_identifier(&c.name)))
        .collect::<Vec<_>>()
        .join(",");
    let values = columns
        .iter()
        .map(|c| format!("\n    {}", placeholder(&c.name)))
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "INSERT INTO\n  {} ({names}\n  )\nVALUES\n  ({values}\n  );",
        qualified(database, table)
    )
}

/// DELETE whose WHERE clause is built from key columns only.
///
/// Without key columns the condition is left as a single `[condition]`
/// placeholder.
pub fn delete(database: &str, table: &str, columns: &[ColumnMeta]) -> String {
    format!(
        "DELETE FROM\n  {}\nWHERE\n  {};",
        qualified(database, table),
        key_condition(columns)
    )
}

/// UPDATE setting non-key columns, filtered by key columns.
pub fn update(database: &str, table: &str, columns: &[ColumnMeta]) -> String {
    let sets = columns
        .iter()
        .filter(|c| !c.is_key())
        .map(|c| format!("{} = {}", quote_identifier(&c.name), placeholder(&c.name)))
        .collect::<Vec<_>>();
    let sets = if sets.is_empty() {
        "[column] = [value]".to_string()
    } else {
        sets.join(",\n  ")
    };
    format!(
        "UPDATE\n  {}\nSET\n  {sets}\nWHERE\n  {};",
        qualified(database, table),
        key_condition(columns)
    )
}

fn key_condition(columns: &[ColumnMeta]) -> String {
    let keys = columns
        .iter()
        .filter(|c| c.is_key())
        .map(|c| format!("{} = {}", quote_identifier(&c.name), placeholder(&c.name)))
        .collect::<Vec<_>>();
    if keys.is_empty() {
        "[condition]".to_string()
    } else {
        keys.join("\n  AND ")
    }
}

/// Commented skeletons for dropping and adding an index.
pub fn index(database: &str, table: &str) -> String {
    let target = qualified(database, table);
    format!(
        "-- ALTER TABLE {target} DROP INDEX [indexName];\n\
         -- ALTER TABLE {target} ADD [UNIQUE|KEY|PRIMARY KEY] INDEX ([column]);"
    )
}

/// `ALTER TABLE ... ADD COLUMN` skeleton.
pub fn add_column(database: &str, table: &str) -> String {
    format!(
        "ALTER TABLE\n  {}\nADD\n  COLUMN [column] [type] NOT NULL COMMENT '';",
        qualified(database, table)
    )
}

/// Rename a table within its database.
pub fn rename_table(database: &str, table: &str, new_name: &str) -> String {
    format!(
        "RENAME TABLE {} TO {};",
        qualified(database, table),
        qualified(database, new_name)
    )
}

/// Drop a table.
pub fn drop_table(database: &str, table: &str) -> String {
    format!("DROP TABLE {};", qualified(database, table))
}

/// Remove all rows from a table.
pub fn truncate_table(database: &str, table: &str) -> String {
    format!("TRUNCATE TABLE {};", qualified(database, table))
}
