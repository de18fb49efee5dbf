//! Hash join over two tables.
//!
//! The right table is indexed by composite key, then left rows are probed in
//! order. Right/full joins add a second pass over the right table for rows
//! whose key never appears on the left.

use std::collections::{HashMap, HashSet};

use super::header::{reconcile, HeaderPlan};
use crate::error::{ValidationError, ValidationResult};
use crate::models::{Cell, ColumnName, JoinResult, JoinSpec, JoinStats, Row, Table};

/// Separator between key parts. Control characters do not occur in ordinary
/// cell text, so `("a", "bc")` and `("ab", "c")` stay distinct.
pub const KEY_SEPARATOR: char = '\u{1}';

/// Key shared by every row when no key columns are given.
const SINGLE_PARTITION_KEY: &str = "__ALL__";

/// Composite key of one row.
fn composite_key(row: &[Cell], key_columns: &[usize]) -> String {
    if key_columns.is_empty() {
        return SINGLE_PARTITION_KEY.to_string();
    }

    let mut key = String::new();
    for (i, &col) in key_columns.iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(&row[col].as_string());
    }
    key
}

fn resolve_keys(table: &Table, keys: &[ColumnName], side: &str) -> ValidationResult<Vec<usize>> {
    keys.iter()
        .map(|k| {
            table
                .column_index(k)
                .ok_or_else(|| ValidationError::UnknownColumn {
                    column: k.clone(),
                    context: format!("{} join keys", side),
                })
        })
        .collect()
}

/// Composite key -> right row indices, in source order.
fn index_by_key(table: &Table, key_columns: &[usize]) -> HashMap<String, Vec<usize>> {
    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in table.rows().iter().enumerate() {
        index
            .entry(composite_key(row, key_columns))
            .or_default()
            .push(i);
    }
    index
}

/// Join two tables.
///
/// Output order: rows originating from the left table (matched pairs and
/// unmatched left rows) in left order, then unmatched right rows in right
/// order. The key lists are expected to be validated already; only unknown
/// key names are reported here.
pub fn join(
    left: &Table,
    right: &Table,
    spec: &JoinSpec,
    collision_suffix: &str,
) -> ValidationResult<JoinResult> {
    let left_keys = resolve_keys(left, &spec.keys_left, "left")?;
    let right_keys = resolve_keys(right, &spec.keys_right, "right")?;

    let plan = reconcile(
        left.header(),
        right.header(),
        &spec.keys_left,
        &spec.keys_right,
        collision_suffix,
    );

    let right_index = index_by_key(right, &right_keys);
    let mut rows: Vec<Row> = Vec::with_capacity(left.len().max(right.len()));
    let mut stats = JoinStats::default();

    for left_row in left.rows() {
        let key = composite_key(left_row, &left_keys);
        match right_index.get(&key) {
            Some(matches) => {
                for &ri in matches {
                    rows.push(merge_pair(&plan, left_row, &right.rows()[ri]));
                    stats.matched_count += 1;
                }
            }
            None => {
                if spec.join_type.keeps_left() {
                    rows.push(left_only(&plan, left_row, &spec.fill_value));
                    stats.only_left_count += 1;
                }
            }
        }
    }

    if spec.join_type.keeps_right() {
        let left_index: HashSet<String> = left
            .rows()
            .iter()
            .map(|row| composite_key(row, &left_keys))
            .collect();

        let shared = shared_key_sources(left, right, spec);

        for right_row in right.rows() {
            if left_index.contains(&composite_key(right_row, &right_keys)) {
                continue;
            }
            rows.push(right_only(&plan, &shared, right_row, &spec.fill_value));
            stats.only_right_count += 1;
        }
    }

    stats.total_count = rows.len();

    Ok(JoinResult {
        table: Table::from_parts_unchecked(plan.header, rows),
        stats,
    })
}

/// For each left column: the right column feeding it in right-only rows.
///
/// Only left columns whose name is a key on both sides are fed.
fn shared_key_sources(left: &Table, right: &Table, spec: &JoinSpec) -> Vec<Option<usize>> {
    left.header()
        .iter()
        .map(|name| {
            let shared = spec.keys_left.contains(name) && spec.keys_right.contains(name);
            if shared {
                right.column_index(name)
            } else {
                None
            }
        })
        .collect()
}

fn place_right(plan: &HeaderPlan, merged: &mut [Cell], right_row: &[Cell]) {
    for (j, target) in plan.right_targets.iter().enumerate() {
        if let Some(t) = target {
            merged[*t] = right_row[j].clone();
        }
    }
}

fn merge_pair(plan: &HeaderPlan, left_row: &[Cell], right_row: &[Cell]) -> Row {
    let mut merged = left_row.to_vec();
    merged.resize(plan.header.len(), Cell::Empty);
    place_right(plan, &mut merged, right_row);
    merged
}

fn left_only(plan: &HeaderPlan, left_row: &[Cell], fill: &Cell) -> Row {
    let mut merged = left_row.to_vec();
    merged.resize(plan.header.len(), fill.clone());
    merged
}

fn right_only(
    plan: &HeaderPlan,
    shared: &[Option<usize>],
    right_row: &[Cell],
    fill: &Cell,
) -> Row {
    let mut merged = vec![fill.clone(); plan.header.len()];
    for (i, source) in shared.iter().enumerate() {
        if let Some(j) = source {
            merged[i] = right_row[*j].clone();
        }
    }
    place_right(plan, &mut merged, right_row);
    merged
}
