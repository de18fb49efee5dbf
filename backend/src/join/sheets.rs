//! Merging several sheets of one workbook into a single table.

use serde::Serialize;

use super::engine::join;
use crate::codec::{denormalize, normalize};
use crate::error::{ValidationError, ValidationResult};
use crate::models::{ColumnName, JoinSpec, JoinStats, Table};

/// A decoded sheet with its name.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTable {
    pub name: String,
    pub table: Table,
}

impl NamedTable {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

/// How the sheets were combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMode {
    /// Two sheets joined on key columns.
    Join,
    /// Rows stacked under the union of all headers.
    Union,
}

/// Summary of a sheet merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub mode: MergeMode,
    pub sheets: usize,
    /// Sum of the input sheets' row counts.
    pub source_rows: usize,
    pub total_rows: usize,
    /// Present for [`MergeMode::Join`].
    pub join_stats: Option<JoinStats>,
}

/// Stack sheets under the union of their headers.
///
/// Columns appear in first-seen order; a sheet lacking a column contributes
/// empty cells.
pub fn union_sheets(sheets: &[&Table]) -> Table {
    let mut header: Vec<ColumnName> = Vec::new();
    for sheet in sheets {
        for name in sheet.header() {
            if !header.contains(name) {
                header.push(name.clone());
            }
        }
    }

    let rows = sheets
        .iter()
        .flat_map(|sheet| {
            let header = &header;
            sheet
                .rows()
                .iter()
                .map(move |row| denormalize(&normalize(row, sheet.header()), header))
        })
        .collect();

    Table::from_parts_unchecked(header, rows)
}

/// Combine the selected sheets.
///
/// Exactly two sheets with non-empty key lists are joined; anything else is
/// a union merge.
pub fn merge_sheets(
    sheets: &[&Table],
    spec: Option<&JoinSpec>,
    collision_suffix: &str,
) -> ValidationResult<(Table, MergeSummary)> {
    if sheets.is_empty() {
        return Err(ValidationError::EmptySelection(
            "select at least one sheet".to_string(),
        ));
    }

    let source_rows = sheets.iter().map(|s| s.len()).sum();

    let keyed = spec.filter(|s| !s.keys_left.is_empty() && !s.keys_right.is_empty());
    if let (2, Some(spec)) = (sheets.len(), keyed) {
        if spec.keys_left.len() != spec.keys_right.len() {
            return Err(ValidationError::KeyCountMismatch {
                left: spec.keys_left.len(),
                right: spec.keys_right.len(),
            });
        }

        let result = join(sheets[0], sheets[1], spec, collision_suffix)?;
        let summary = MergeSummary {
            mode: MergeMode::Join,
            sheets: 2,
            source_rows,
            total_rows: result.table.len(),
            join_stats: Some(result.stats),
        };
        return Ok((result.table, summary));
    }

    let table = union_sheets(sheets);
    let summary = MergeSummary {
        mode: MergeMode::Union,
        sheets: sheets.len(),
        source_rows,
        total_rows: table.len(),
        join_stats: None,
    };
    Ok((table, summary))
}
