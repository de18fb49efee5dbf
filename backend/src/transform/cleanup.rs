//! Whole-table cleanup operations.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::{Cell, Row, Table};

/// A cleanup operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CleanupOp {
    /// Drop rows identical to an earlier row.
    RemoveDuplicates,
    /// Drop rows whose cells are all blank.
    RemoveEmptyRows,
    /// Trim leading/trailing whitespace of text cells.
    TrimWhitespace,
    /// Replace blank cells with a value.
    FillEmpty { value: String },
}

impl CleanupOp {
    pub fn label(&self) -> String {
        match self {
            CleanupOp::RemoveDuplicates => "cleanup: remove duplicates".to_string(),
            CleanupOp::RemoveEmptyRows => "cleanup: remove empty rows".to_string(),
            CleanupOp::TrimWhitespace => "cleanup: trim whitespace".to_string(),
            CleanupOp::FillEmpty { value } => format!("cleanup: fill empty with '{}'", value),
        }
    }

    /// Parse a CLI name: `remove_duplicates`, `remove_empty_rows`,
    /// `trim_whitespace`, `fill_empty=<value>`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let (name, arg) = match s.split_once('=') {
            Some((n, a)) => (n, Some(a)),
            None => (s, None),
        };
        match name.trim().replace('-', "_").as_str() {
            "remove_duplicates" | "dedupe" => Ok(CleanupOp::RemoveDuplicates),
            "remove_empty_rows" => Ok(CleanupOp::RemoveEmptyRows),
            "trim_whitespace" | "trim" => Ok(CleanupOp::TrimWhitespace),
            "fill_empty" => Ok(CleanupOp::FillEmpty {
                value: arg.unwrap_or_default().to_string(),
            }),
            other => Err(format!("unknown cleanup operation '{}'", other)),
        }
    }
}

/// Cleaned table and how many rows were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanupOutcome {
    pub table: Table,
    pub removed: usize,
}

pub fn cleanup_table(table: &Table, op: &CleanupOp) -> CleanupOutcome {
    let before = table.len();
    let rows: Vec<Row> = match op {
        CleanupOp::RemoveDuplicates => {
            let mut seen: HashSet<Vec<String>> = HashSet::with_capacity(before);
            table
                .rows()
                .iter()
                .filter(|row| seen.insert(row.iter().map(Cell::as_string).collect()))
                .cloned()
                .collect()
        }
        CleanupOp::RemoveEmptyRows => table
            .rows()
            .iter()
            .filter(|row| !row.iter().all(Cell::is_blank))
            .cloned()
            .collect(),
        CleanupOp::TrimWhitespace => table
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Cell::Text(s) => Cell::text(s.trim()),
                        other => other.clone(),
                    })
                    .collect()
            })
            .collect(),
        CleanupOp::FillEmpty { value } => {
            let fill = Cell::text(value.as_str());
            table
                .rows()
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|cell| if cell.is_blank() { fill.clone() } else { cell.clone() })
                        .collect()
                })
                .collect()
        }
    };

    CleanupOutcome {
        removed: before - rows.len(),
        table: table.with_rows(rows),
    }
}
