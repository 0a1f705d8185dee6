//! Schema introspection models.
//!
//! Data structures describing MySQL objects discovered through
//! `information_schema`.

use serde::{Deserialize, Serialize};

use super::query::{self, Row};

/// Index participation of a column, from `COLUMNS.COLUMN_KEY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKey {
    /// Part of the primary key (`PRI`)
    Primary,
    /// Part of a unique index (`UNI`)
    Unique,
    /// First column of a non-unique index (`MUL`)
    Multiple,
    /// Not indexed
    #[default]
    None,
}

impl ColumnKey {
    /// Parse the `COLUMN_KEY` value.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PRI" => Self::Primary,
            "UNI" => Self::Unique,
            "MUL" => Self::Multiple,
            _ => Self::None,
        }
    }

    /// Whether the column identifies a row (primary or unique).
    pub fn is_key(&self) -> bool {
        matches!(self, Self::Primary | Self::Unique)
    }
}

/// A MySQL column. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Column name.
    pub name: String,
    /// Declared type (e.g., "int(11)", "varchar(255)").
    pub column_type: String,
    /// Column comment, empty when none.
    pub comment: String,
    /// Index participation.
    pub key: ColumnKey,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Maximum character length, for string types.
    pub max_length: Option<u64>,
}

impl ColumnMeta {
    /// Map one row of the column discovery query.
    ///
    /// Returns `None` when the row has no column name.
    pub fn from_row(row: &Row) -> Option<Self> {
        Some(Self {
            name: query::text(row, "name")?,
            column_type: query::text(row, "type").unwrap_or_default(),
            comment: query::text(row, "comment").unwrap_or_default(),
            key: ColumnKey::parse(&query::text(row, "key").unwrap_or_default()),
            nullable: query::text(row, "nullable").is_some_and(|v| v.eq_ignore_ascii_case("YES")),
            max_length: query::unsigned(row, "maxLength"),
        })
    }

    /// Whether the column identifies a row.
    pub fn is_key(&self) -> bool {
        self.key.is_key()
    }
}
