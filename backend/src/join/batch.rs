//! Pairwise joins over a batch of tables.

use super::engine::join;
use super::sheets::NamedTable;
use crate::error::ValidationResult;
use crate::models::{Cell, JoinResult, JoinSpec, JoinType};

/// One pairwise result.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub left_name: String,
    pub right_name: String,
    pub result: JoinResult,
}

/// Inner-join every pair `(i, j)` with `i < j`, keyed on each table's first column.
///
/// Tables without columns are skipped.
pub fn batch_join(tables: &[NamedTable], collision_suffix: &str) -> ValidationResult<Vec<BatchResult>> {
    let mut results = Vec::new();

    for i in 0..tables.len() {
        for j in (i + 1)..tables.len() {
            let (left, right) = (&tables[i], &tables[j]);
            let (Some(key_left), Some(key_right)) =
                (left.table.header().first(), right.table.header().first())
            else {
                continue;
            };

            let spec = JoinSpec {
                keys_left: vec![key_left.clone()],
                keys_right: vec![key_right.clone()],
                join_type: JoinType::Inner,
                fill_value: Cell::Empty,
            };
            let result = join(&left.table, &right.table, &spec, collision_suffix)?;
            results.push(BatchResult {
                left_name: left.name.clone(),
                right_name: right.name.clone(),
                result,
            });
        }
    }

    Ok(results)
}
