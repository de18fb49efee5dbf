//! Domain models for the SheetJoin engine.
//!
//! This module contains the data structures shared by every stage:
//!
//! - [`Cell`] - a single value (empty, text, or number)
//! - [`Table`] - header plus rows, with the row-width invariant enforced
//! - [`JoinType`] - inner / left / right / full
//! - [`JoinSpec`] - key columns, join type and fill value
//! - [`JoinStats`] / [`JoinResult`] - output of the join engine

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{ValidationError, ValidationResult};

/// A column name as it appears in a table header.
pub type ColumnName = String;

/// A positional row, aligned to a table header.
pub type Row = Vec<Cell>;

// =============================================================================
// Cell
// =============================================================================

/// A single table value.
///
/// Delimited text only ever yields [`Cell::Text`] and [`Cell::Empty`];
/// spreadsheets and JSON records can also carry [`Cell::Number`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// No value.
    #[default]
    Empty,
    /// Text, including number-like text such as `"42"`.
    Text(String),
    /// Native numeric value.
    Number(f64),
}

impl Cell {
    /// Text cell, or [`Cell::Empty`] for an empty string.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value)
        }
    }

    /// True for [`Cell::Empty`] only.
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Empty, or text made only of whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Borrow the text content, if this is a text cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// String form used for keys, comparisons and export.
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", format_number(*n)),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::text(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Integral values print without a fractional part (`3`, not `3.0`).
fn format_number(n: f64) -> String {
    match integral_value(n) {
        Some(i) => i.to_string(),
        None => n.to_string(),
    }
}

/// `n` as an integer when it has no fractional part and fits exactly.
pub(crate) fn integral_value(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15).then_some(n as i64)
}

// =============================================================================
// Table
// =============================================================================

/// Header plus rows.
///
/// Construction through [`Table::new`] guarantees unique header names and
/// that every row is exactly as wide as the header. Cloning a table is a
/// full structural copy.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    header: Vec<ColumnName>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table, rejecting duplicate column names and ragged rows.
    ///
    /// Use [`crate::codec::table_from_raw`] for decoder output that may be
    /// ragged.
    pub fn new(header: Vec<ColumnName>, rows: Vec<Row>) -> ValidationResult<Self> {
        let mut seen = HashSet::with_capacity(header.len());
        for name in &header {
            if !seen.insert(name.as_str()) {
                return Err(ValidationError::DuplicateColumn(name.clone()));
            }
        }

        let width = header.len();
        if let Some((row, actual)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != width)
            .map(|(i, r)| (i, r.len()))
        {
            return Err(ValidationError::RaggedRow {
                row,
                expected: width,
                actual,
            });
        }

        Ok(Self { header, rows })
    }

    /// Table with a header and no rows.
    pub fn with_header(header: Vec<ColumnName>) -> ValidationResult<Self> {
        Self::new(header, Vec::new())
    }

    /// Same header, different rows. Rows must already match the header width.
    pub(crate) fn with_rows(&self, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == self.header.len()));
        Self {
            header: self.header.clone(),
            rows,
        }
    }

    /// Internal constructor for engine output that is correct by construction.
    pub(crate) fn from_parts_unchecked(header: Vec<ColumnName>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == header.len()));
        Self { header, rows }
    }

    pub fn header(&self) -> &[ColumnName] {
        &self.header
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn into_parts(self) -> (Vec<ColumnName>, Vec<Row>) {
        (self.header, self.rows)
    }
}

// =============================================================================
// Join Spec
// =============================================================================

/// Which unmatched rows a join keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// Matched pairs only.
    #[default]
    Inner,
    /// Matched pairs plus unmatched left rows.
    Left,
    /// Matched pairs plus unmatched right rows.
    Right,
    /// Matched pairs plus unmatched rows from both sides.
    Full,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Full => "full",
        }
    }

    /// Emits left rows that found no match.
    pub fn keeps_left(&self) -> bool {
        matches!(self, JoinType::Left | JoinType::Full)
    }

    /// Emits right rows that found no match.
    pub fn keeps_right(&self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inner" => Ok(JoinType::Inner),
            "left" => Ok(JoinType::Left),
            "right" => Ok(JoinType::Right),
            "full" | "outer" => Ok(JoinType::Full),
            other => Err(format!(
                "unknown join type '{}' (expected inner, left, right or full)",
                other
            )),
        }
    }
}

/// Parameters of a two-table join.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSpec {
    /// Key columns of the left table.
    pub keys_left: Vec<ColumnName>,
    /// Key columns of the right table, paired positionally with `keys_left`.
    pub keys_right: Vec<ColumnName>,
    /// Join type.
    #[serde(rename = "type")]
    pub join_type: JoinType,
    /// Value written into columns of the side that had no match.
    #[serde(default)]
    pub fill_value: Cell,
}

impl JoinSpec {
    pub fn new(
        keys_left: Vec<ColumnName>,
        keys_right: Vec<ColumnName>,
        join_type: JoinType,
    ) -> Self {
        Self {
            keys_left,
            keys_right,
            join_type,
            fill_value: Cell::Empty,
        }
    }

    /// Same key column names on both sides.
    pub fn on(keys: &[&str], join_type: JoinType) -> Self {
        let keys: Vec<ColumnName> = keys.iter().map(|k| k.to_string()).collect();
        Self::new(keys.clone(), keys, join_type)
    }

    pub fn with_fill(mut self, fill_value: impl Into<Cell>) -> Self {
        self.fill_value = fill_value.into();
        self
    }

    /// Both key lists are empty: every row matches every row.
    pub fn is_cartesian(&self) -> bool {
        self.keys_left.is_empty() && self.keys_right.is_empty()
    }
}

// =============================================================================
// Join Result
// =============================================================================

/// Counters produced by a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinStats {
    /// Emitted (left, right) pairs. A left row matching three right rows counts three.
    pub matched_count: usize,
    /// Emitted left rows without a match.
    pub only_left_count: usize,
    /// Emitted right rows without a match.
    pub only_right_count: usize,
    /// Total emitted rows.
    pub total_count: usize,
}

impl fmt::Display for JoinStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matched, {} only left, {} only right, {} total",
            self.matched_count, self.only_left_count, self.only_right_count, self.total_count
        )
    }
}

/// Output of the join engine.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinResult {
    pub table: Table,
    pub stats: JoinStats,
}

impl JoinResult {
    pub fn header(&self) -> &[ColumnName] {
        self.table.header()
    }

    pub fn rows(&self) -> &[Row] {
        self.table.rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<ColumnName> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_table_rejects_ragged_rows() {
        let err = Table::new(header(&["a", "b"]), vec![vec![Cell::from("1")]]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::RaggedRow {
                row: 0,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_table_rejects_duplicate_header() {
        let err = Table::new(header(&["a", "a"]), vec![]).unwrap_err();
        assert_eq!(err, ValidationError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_column_index() {
        let table = Table::with_header(header(&["id", "name"])).unwrap();
        assert_eq!(table.column_index("name"), Some(1));
        assert_eq!(table.column_index("Name"), None);
        assert_eq!(table.width(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(Cell::Number(3.0).to_string(), "3");
        assert_eq!(Cell::Number(2.5).to_string(), "2.5");
        assert_eq!(Cell::Empty.to_string(), "");
        assert_eq!(Cell::from("x").to_string(), "x");
        assert_eq!(Cell::from(""), Cell::Empty);
    }

    #[test]
    fn test_cell_blank() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::from("   ").is_blank());
        assert!(!Cell::from(" a ").is_blank());
        assert!(!Cell::Number(0.0).is_blank());
    }

    #[test]
    fn test_join_type_parse() {
        assert_eq!("FULL".parse::<JoinType>().unwrap(), JoinType::Full);
        assert_eq!("outer".parse::<JoinType>().unwrap(), JoinType::Full);
        assert!("cross".parse::<JoinType>().is_err());
        assert!(JoinType::Left.keeps_left());
        assert!(!JoinType::Left.keeps_right());
    }

    #[test]
    fn test_join_spec_serde() {
        let spec = JoinSpec::on(&["id"], JoinType::Left).with_fill("N/A");
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "left");
        assert_eq!(json["keysLeft"][0], "id");
        assert_eq!(json["fillValue"], "N/A");

        let back: JoinSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }
}
