//! SQL text synthesis for the MySQL dialect.
//!
//! Everything here is pure: no I/O, no connection state. Identifiers are
//! always backtick-quoted and values always single-quoted, so node names never
//! reach a statement unescaped.
//!
//! - `template` - authoring templates and mutating statements
//! - `discovery` - `information_schema` queries that enumerate children

pub mod discovery;
pub mod template;

/// Default row limit for select templates.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Quote an identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote a `database`.`table` pair.
pub fn qualified(database: &str, table: &str) -> String {
    format!("{}.{}", quote_identifier(database), quote_identifier(table))
}

/// Quote a string literal, escaping backslashes and single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}
