//! Discovery queries.
//!
//! Column aliases are part of the contract with `ColumnMeta::from_row` and the
//! node loaders.

use super::{qualified, quote_literal};

/// List databases visible to the user. Rows carry `Database`.
pub fn databases() -> String {
    "SHOW DATABASES;".to_string()
}

/// List base tables of a database. Rows carry `name`.
pub fn tables(database: &str) -> String {
    format!(
        "SELECT TABLE_NAME name FROM information_schema.TABLES \
         WHERE TABLE_SCHEMA = {} AND TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME;",
        quote_literal(database)
    )
}

/// List columns of a table in declaration order.
///
/// Rows carry `name`, `type`, `comment`, `key`, `nullable`, `maxLength`.
pub fn columns(database: &str, table: &str) -> String {
    format!(
        "SELECT COLUMN_NAME name, COLUMN_TYPE type, COLUMN_COMMENT comment, \
         COLUMN_KEY `key`, IS_NULLABLE nullable, CHARACTER_MAXIMUM_LENGTH maxLength \
         FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {} ORDER BY ORDINAL_POSITION;",
        quote_literal(database),
        quote_literal(table)
    )
}

/// List index membership of a table's columns.
pub fn indexes(database: &str, table: &str) -> String {
    format!(
        "SELECT COLUMN_NAME name, TABLE_SCHEMA table_schema, INDEX_NAME index_name, \
         NON_UNIQUE non_unique FROM information_schema.STATISTICS \
         WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {};",
        quote_literal(database),
        quote_literal(table)
    )
}

/// Fetch the DDL of a table. The row carries `Create Table`.
pub fn show_create_table(database: &str, table: &str) -> String {
    format!("SHOW CREATE TABLE {};", qualified(database, table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_query_quotes_values() {
        let sql = columns("shop", "o'rders");
        assert!(sql.contains("TABLE_SCHEMA = 'shop'"));
        assert!(sql.contains("TABLE_NAME = 'o''rders'"));
        assert!(sql.contains("ORDER BY ORDINAL_POSITION"));
    }

    #[test]
    fn test_tables_query_filters_base_tables() {
        let sql = tables("shop");
        assert!(sql.contains("TABLE_SCHEMA = 'shop'"));
        assert!(sql.contains("'BASE TABLE'"));
    }

    #[test]
    fn test_show_create_table_quotes_identifiers() {
        assert_eq!(show_create_table("shop", "orders"), "SHOW CREATE TABLE `shop`.`orders`;");
    }
}
