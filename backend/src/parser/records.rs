//! JSON records decoding: an array of objects, one object per row.
//!
//! The header is the union of object keys in first-seen order. JSON numbers
//! become [`Cell::Number`], `null` becomes [`Cell::Empty`], booleans become
//! text and nested values are kept as their JSON text.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::codec::table_from_raw;
use crate::error::{DecodeError, DecodeResult};
use crate::models::{Cell, Row, Table};

/// One object with its keys in document order.
struct OrderedRecord(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for OrderedRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = OrderedRecord;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<OrderedRecord, A::Error> {
                let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    fields.push((key, value));
                }
                Ok(OrderedRecord(fields))
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

fn value_cell(value: Value) -> Cell {
    match value {
        Value::Null => Cell::Empty,
        Value::String(s) => Cell::text(s),
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or_else(|| Cell::Text(n.to_string())),
        Value::Bool(b) => Cell::Text(b.to_string()),
        nested => Cell::Text(nested.to_string()),
    }
}

/// Decode a JSON array of objects.
pub fn decode_records(bytes: &[u8]) -> DecodeResult<Table> {
    let records: Vec<OrderedRecord> =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Json(e.to_string()))?;
    if records.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    let mut header: Vec<String> = Vec::new();
    for record in &records {
        for (key, _) in &record.0 {
            if !header.contains(key) {
                header.push(key.clone());
            }
        }
    }

    let rows: Vec<Row> = records
        .into_iter()
        .map(|record| {
            let mut row: Row = vec![Cell::Empty; header.len()];
            for (key, value) in record.0 {
                if let Some(i) = header.iter().position(|h| *h == key) {
                    row[i] = value_cell(value);
                }
            }
            row
        })
        .collect();

    Ok(table_from_raw(header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_keep_key_order() {
        let json = br#"[{"zeta": "a", "alpha": 1}, {"alpha": 2.5, "mid": null, "zeta": "b"}]"#;
        let table = decode_records(json).unwrap();
        assert_eq!(table.header(), &["zeta", "alpha", "mid"]);
        assert_eq!(
            table.rows()[0],
            vec![Cell::from("a"), Cell::Number(1.0), Cell::Empty]
        );
        assert_eq!(
            table.rows()[1],
            vec![Cell::from("b"), Cell::Number(2.5), Cell::Empty]
        );
    }

    #[test]
    fn test_nested_and_bool_values() {
        let json = br#"[{"ok": true, "tags": ["x", "y"]}]"#;
        let table = decode_records(json).unwrap();
        assert_eq!(table.rows()[0][0], Cell::from("true"));
        assert_eq!(table.rows()[0][1], Cell::from(r#"["x","y"]"#));
    }

    #[test]
    fn test_invalid_records() {
        assert!(matches!(decode_records(b"{\"a\": 1}"), Err(DecodeError::Json(_))));
        assert!(matches!(decode_records(b"[1, 2]"), Err(DecodeError::Json(_))));
        assert!(matches!(decode_records(b"[]"), Err(DecodeError::EmptyInput)));
    }
}
