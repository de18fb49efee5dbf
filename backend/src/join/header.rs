//! Header reconciliation for two-table joins.

use std::collections::HashSet;

use crate::models::ColumnName;

/// Merged header plus where each right column lands in it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderPlan {
    /// Left header followed by the kept right columns.
    pub header: Vec<ColumnName>,
    /// `right_targets[j]` is the merged position of right column `j`,
    /// `None` when it is a key shared with the left side.
    pub right_targets: Vec<Option<usize>>,
}

impl HeaderPlan {
    /// Right column positions that are skipped as shared keys.
    pub fn shared_key_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.right_targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_none())
            .map(|(j, _)| j)
    }
}

/// Compute the merged header of a join.
///
/// The left header is kept as is. A right column is dropped when its name
/// appears in both key lists; otherwise it is appended, with `suffix` added
/// (repeatedly, if needed) while the name is already taken.
pub fn reconcile(
    header_left: &[ColumnName],
    header_right: &[ColumnName],
    keys_left: &[ColumnName],
    keys_right: &[ColumnName],
    suffix: &str,
) -> HeaderPlan {
    let keys_left: HashSet<&str> = keys_left.iter().map(String::as_str).collect();
    let keys_right: HashSet<&str> = keys_right.iter().map(String::as_str).collect();

    let mut header: Vec<ColumnName> = header_left.to_vec();
    let mut taken: HashSet<ColumnName> = header.iter().cloned().collect();
    let mut right_targets = Vec::with_capacity(header_right.len());

    for name in header_right {
        if keys_right.contains(name.as_str()) && keys_left.contains(name.as_str()) {
            right_targets.push(None);
            continue;
        }

        let mut target = name.clone();
        while taken.contains(&target) {
            target.push_str(suffix);
        }

        taken.insert(target.clone());
        right_targets.push(Some(header.len()));
        header.push(target);
    }

    HeaderPlan {
        header,
        right_targets,
    }
}

/// Names-only form of [`reconcile`].
pub fn reconcile_header(
    header_left: &[ColumnName],
    header_right: &[ColumnName],
    keys_left: &[ColumnName],
    keys_right: &[ColumnName],
    suffix: &str,
) -> Vec<ColumnName> {
    reconcile(header_left, header_right, keys_left, keys_right, suffix).header
}
