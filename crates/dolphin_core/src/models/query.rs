//! Query result rows.

use serde_json::Value;

/// One result row: column label to value, in select-list order.
pub type Row = serde_json::Map<String, Value>;

/// Read a column as text.
///
/// Numbers are rendered with `to_string`; `NULL` and missing columns are `None`.
pub fn text(row: &Row, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Read a column as an unsigned integer.
///
/// Drivers that return numbers as text (the MySQL text protocol does) are
/// handled too.
pub fn unsigned(row: &Row, column: &str) -> Option<u64> {
    match row.get(column)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_text_reads_strings_and_numbers() {
        let r = row(json!({"name": "id", "len": 11, "gone": null}));
        assert_eq!(text(&r, "name").as_deref(), Some("id"));
        assert_eq!(text(&r, "len").as_deref(), Some("11"));
        assert_eq!(text(&r, "gone"), None);
        assert_eq!(text(&r, "missing"), None);
    }

    #[test]
    fn test_unsigned_parses_text_protocol_numbers() {
        let r = row(json!({"a": 255, "b": "65535", "c": "n/a", "d": null}));
        assert_eq!(unsigned(&r, "a"), Some(255));
        assert_eq!(unsigned(&r, "b"), Some(65535));
        assert_eq!(unsigned(&r, "c"), None);
        assert_eq!(unsigned(&r, "d"), None);
    }
}
