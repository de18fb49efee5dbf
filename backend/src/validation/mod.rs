//! Pre-flight validation and data-quality warnings.
//!
//! Checks run before the session touches the working table. Hard failures are
//! [`ValidationError`]s; suspicious but usable input produces warnings in a
//! [`ValidationReport`].
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetjoin::validation::validate_join;
//!
//! let report = validate_join(&left, &right, &spec, false)?;
//! for warning in &report.warnings {
//!     println!("{}", warning);
//! }
//! ```

use serde::Serialize;

use crate::error::{ValidationError, ValidationResult};
use crate::models::{JoinSpec, Table};
use crate::transform::{parse_number, FilterSpec, SortSpec};

/// Warnings collected by a successful validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    fn warn(&mut self, message: String) {
        self.warnings.push(message);
    }
}

/// Check that `name` is a column of `table`.
pub fn validate_column(table: &Table, name: &str, context: &str) -> ValidationResult<usize> {
    table.column_index(name).ok_or_else(|| ValidationError::UnknownColumn {
        column: name.to_string(),
        context: context.to_string(),
    })
}

/// Validate a join before running it.
///
/// Errors: an empty key list (unless `allow_empty_keys`, in which case both
/// lists must be empty), key lists of different length, key names absent from
/// their table. Warnings: a table without rows, blank rows, rows with a blank
/// key cell.
pub fn validate_join(
    left: &Table,
    right: &Table,
    spec: &JoinSpec,
    allow_empty_keys: bool,
) -> ValidationResult<ValidationReport> {
    if !allow_empty_keys {
        if spec.keys_left.is_empty() {
            return Err(ValidationError::EmptyKeys { side: "left" });
        }
        if spec.keys_right.is_empty() {
            return Err(ValidationError::EmptyKeys { side: "right" });
        }
    }

    if spec.keys_left.len() != spec.keys_right.len() {
        return Err(ValidationError::KeyCountMismatch {
            left: spec.keys_left.len(),
            right: spec.keys_right.len(),
        });
    }

    let left_keys = spec
        .keys_left
        .iter()
        .map(|k| validate_column(left, k, "left join keys"))
        .collect::<ValidationResult<Vec<_>>>()?;
    let right_keys = spec
        .keys_right
        .iter()
        .map(|k| validate_column(right, k, "right join keys"))
        .collect::<ValidationResult<Vec<_>>>()?;

    let mut report = ValidationReport::default();
    if spec.is_cartesian() {
        report.warn(format!(
            "No join keys: every row is paired with every row ({} x {})",
            left.len(),
            right.len()
        ));
    }
    check_quality(left, &left_keys, "left", &mut report);
    check_quality(right, &right_keys, "right", &mut report);
    Ok(report)
}

fn check_quality(table: &Table, keys: &[usize], side: &str, report: &mut ValidationReport) {
    if table.is_empty() {
        report.warn(format!("The {} table has no data rows", side));
        return;
    }

    let blank_rows = table
        .rows()
        .iter()
        .filter(|row| row.iter().all(|c| c.is_blank()))
        .count();
    if blank_rows > 0 {
        report.warn(format!("The {} table has {} empty rows", side, blank_rows));
    }

    if keys.is_empty() {
        return;
    }
    let blank_keys = table
        .rows()
        .iter()
        .filter(|row| keys.iter().any(|&k| row[k].is_blank()))
        .count();
    if blank_keys > 0 {
        report.warn(format!(
            "The {} table has {} rows with an empty key value",
            side, blank_keys
        ));
    }
}

/// Data-quality warnings for a single table.
pub fn table_warnings(table: &Table, name: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_quality(table, &[], name, &mut report);
    report
}

/// Validate a filter against the table it would run on.
pub fn validate_filter(table: &Table, spec: &FilterSpec) -> ValidationResult<()> {
    validate_column(table, &spec.column, "filter")?;
    if spec.condition.is_numeric() && parse_number(&spec.value).is_none() {
        return Err(ValidationError::NotNumeric {
            condition: spec.condition.to_string(),
            value: spec.value.clone(),
        });
    }
    Ok(())
}

pub fn validate_sort(table: &Table, spec: &SortSpec) -> ValidationResult<()> {
    validate_column(table, &spec.column, "sort").map(|_| ())
}
