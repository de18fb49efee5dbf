//! Stable single-column sort.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::numeric::cell_number;
use crate::error::{ValidationError, ValidationResult};
use crate::models::{Cell, ColumnName, Row, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "ascending",
            SortDirection::Desc => "descending",
        })
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: ColumnName,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    pub fn label(&self) -> String {
        format!("sort: {} ({})", self.column, self.direction)
    }
}

/// Sort key of one cell.
///
/// Variants are ranked in declaration order. Text is split around the
/// numbers at the position plain text comparison would put it (`"#3"` before
/// `"1"`, `"x"` after), which keeps the order total.
#[derive(Debug)]
enum SortKey {
    Blank,
    TextBeforeDigits(String),
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(cell: &Cell) -> Self {
        if cell.is_blank() {
            return SortKey::Blank;
        }
        if let Some(n) = cell_number(cell) {
            return SortKey::Number(n);
        }
        let text = cell.as_string().to_lowercase();
        if text.as_str() < "0" {
            SortKey::TextBeforeDigits(text)
        } else {
            SortKey::Text(text)
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Blank => 0,
            SortKey::TextBeforeDigits(_) => 1,
            SortKey::Number(_) => 2,
            SortKey::Text(_) => 3,
        }
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (SortKey::TextBeforeDigits(a), SortKey::TextBeforeDigits(b))
            | (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Sort rows by one column.
///
/// Two numeric cells compare as numbers, text compares lowercased and blank
/// cells come first. Ties keep their original relative order in both
/// directions.
pub fn sort_table(table: &Table, spec: &SortSpec) -> ValidationResult<Table> {
    let col = table
        .column_index(&spec.column)
        .ok_or_else(|| ValidationError::UnknownColumn {
            column: spec.column.clone(),
            context: "sort".to_string(),
        })?;

    let mut keyed: Vec<(SortKey, &Row)> = table
        .rows()
        .iter()
        .map(|row| (SortKey::of(&row[col]), row))
        .collect();

    match spec.direction {
        SortDirection::Asc => keyed.sort_by(|a, b| a.0.compare(&b.0)),
        SortDirection::Desc => keyed.sort_by(|a, b| b.0.compare(&a.0)),
    }

    let rows = keyed.into_iter().map(|(_, row)| row.clone()).collect();
    Ok(table.with_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[[&str; 2]]) -> Table {
        Table::new(
            vec!["k".into(), "tag".into()],
            rows.iter()
                .map(|r| r.iter().map(|v| Cell::from(*v)).collect())
                .collect(),
        )
        .unwrap()
    }

    fn column(table: &Table, i: usize) -> Vec<String> {
        table.rows().iter().map(|r| r[i].as_string()).collect()
    }

    #[test]
    fn test_numeric_sort() {
        let t = table(&[["10", "a"], ["9", "b"], ["100", "c"]]);
        let sorted = sort_table(&t, &SortSpec::new("k", SortDirection::Asc)).unwrap();
        assert_eq!(column(&sorted, 0), vec!["9", "10", "100"]);

        let sorted = sort_table(&t, &SortSpec::new("k", SortDirection::Desc)).unwrap();
        assert_eq!(column(&sorted, 0), vec!["100", "10", "9"]);
    }

    #[test]
    fn test_text_sort_case_insensitive() {
        let t = table(&[["banana", "1"], ["Apple", "2"], ["cherry", "3"]]);
        let sorted = sort_table(&t, &SortSpec::new("k", SortDirection::Asc)).unwrap();
        assert_eq!(column(&sorted, 0), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn test_stable_ties() {
        let t = table(&[["b", "1"], ["a", "2"], ["B", "3"], ["a", "4"]]);
        let asc = sort_table(&t, &SortSpec::new("k", SortDirection::Asc)).unwrap();
        assert_eq!(column(&asc, 1), vec!["2", "4", "1", "3"]);

        let desc = sort_table(&t, &SortSpec::new("k", SortDirection::Desc)).unwrap();
        assert_eq!(column(&desc, 1), vec!["1", "3", "2", "4"]);
    }

    #[test]
    fn test_mixed_column_order() {
        let t = table(&[["2", "a"], ["", "b"], ["1", "c"], ["#3", "d"], ["x", "e"]]);
        let sorted = sort_table(&t, &SortSpec::new("k", SortDirection::Asc)).unwrap();
        assert_eq!(column(&sorted, 0), vec!["", "#3", "1", "2", "x"]);

        let sorted = sort_table(&t, &SortSpec::new("k", SortDirection::Desc)).unwrap();
        assert_eq!(column(&sorted, 0), vec!["x", "2", "1", "#3", ""]);
    }

    #[test]
    fn test_blanks_first_ascending() {
        let t = table(&[["2", "a"], ["", "b"], ["1", "c"], ["#3", "d"]]);
        let sorted = sort_table(&t, &SortSpec::new("k", SortDirection::Asc)).unwrap();
        assert_eq!(column(&sorted, 1)[0], "b");
    }

    #[test]
    fn test_unknown_column() {
        let t = table(&[["1", "a"]]);
        assert!(sort_table(&t, &SortSpec::new("zzz", SortDirection::Asc)).is_err());
    }

    #[test]
    fn test_label() {
        assert_eq!(SortSpec::new("age", SortDirection::Desc).label(), "sort: age (descending)");
    }
}
