//! Row codec: positional rows <-> named records.
//!
//! Also owns the conversion from raw decoder output (possibly ragged, possibly
//! with duplicate or blank header names) into a valid [`Table`].

use std::collections::{HashMap, HashSet};

use crate::models::{Cell, ColumnName, Row, Table};

/// A row addressed by column name.
pub type Record = HashMap<ColumnName, Cell>;

/// Build a record from a positional row.
///
/// With duplicate header names the later column wins; deduplicate the
/// header first (see [`dedupe_header`]) when named lookup matters.
pub fn normalize(row: &[Cell], header: &[ColumnName]) -> Record {
    let mut record = Record::with_capacity(header.len());
    for (i, name) in header.iter().enumerate() {
        record.insert(name.clone(), row.get(i).cloned().unwrap_or_default());
    }
    record
}

/// Project a record back into `header` order. Absent names become empty cells.
pub fn denormalize(record: &Record, header: &[ColumnName]) -> Row {
    header
        .iter()
        .map(|name| record.get(name).cloned().unwrap_or_default())
        .collect()
}

/// Pad with empty cells or truncate so the row is exactly `width` wide.
pub fn conform_row(mut row: Row, width: usize) -> Row {
    row.resize(width, Cell::Empty);
    row
}

/// Make header names unique and non-blank.
///
/// Blank names become `col_N` (1-based position); repeated names get a
/// numeric suffix: `name`, `name_2`, `name_3`.
pub fn dedupe_header(header: Vec<String>) -> Vec<ColumnName> {
    let mut seen: HashSet<String> = HashSet::with_capacity(header.len());
    let mut out = Vec::with_capacity(header.len());

    for (i, raw) in header.into_iter().enumerate() {
        let base = if raw.trim().is_empty() {
            format!("col_{}", i + 1)
        } else {
            raw
        };

        let mut name = base.clone();
        let mut n = 2;
        while seen.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        seen.insert(name.clone());
        out.push(name);
    }

    out
}

/// Synthesized header `col_1..col_N` for header-less input.
pub fn generated_header(width: usize) -> Vec<ColumnName> {
    (1..=width).map(|i| format!("col_{}", i)).collect()
}

/// Turn raw decoder output into a valid table.
///
/// Rows are padded or truncated to the header width and header names are
/// made unique, so this never fails.
pub fn table_from_raw(header: Vec<String>, rows: Vec<Row>) -> Table {
    let header = dedupe_header(header);
    let width = header.len();
    let rows = rows.into_iter().map(|r| conform_row(r, width)).collect();
    Table::from_parts_unchecked(header, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<ColumnName> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(values: &[&str]) -> Row {
        values.iter().map(|v| Cell::from(*v)).collect()
    }

    #[test]
    fn test_round_trip() {
        let h = header(&["id", "name", "age"]);
        let r = vec![Cell::from("1"), Cell::Empty, Cell::Number(30.0)];
        let record = normalize(&r, &h);
        assert_eq!(denormalize(&record, &h), r);
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let h = header(&["a", "a"]);
        let record = normalize(&row(&["first", "second"]), &h);
        assert_eq!(record["a"], Cell::from("second"));
    }

    #[test]
    fn test_denormalize_absent_key() {
        let mut record = Record::new();
        record.insert("a".into(), Cell::from("1"));
        let r = denormalize(&record, &header(&["a", "missing"]));
        assert_eq!(r, vec![Cell::from("1"), Cell::Empty]);
    }

    #[test]
    fn test_conform_row() {
        assert_eq!(conform_row(row(&["1"]), 3).len(), 3);
        assert_eq!(conform_row(row(&["1", "2", "3", "4"]), 2), row(&["1", "2"]));
    }

    #[test]
    fn test_dedupe_header() {
        let h = dedupe_header(vec!["a".into(), "a".into(), "".into(), "a".into()]);
        assert_eq!(h, header(&["a", "a_2", "col_3", "a_3"]));
    }

    #[test]
    fn test_table_from_raw_pads_and_truncates() {
        let table = table_from_raw(
            vec!["a".into(), "b".into()],
            vec![row(&["1"]), row(&["1", "2", "3"])],
        );
        assert_eq!(table.rows()[0], vec![Cell::from("1"), Cell::Empty]);
        assert_eq!(table.rows()[1], row(&["1", "2"]));
    }
}
