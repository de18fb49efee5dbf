//! Undo/redo history of the working table.
//!
//! A bounded list of snapshots with a cursor. Each snapshot owns its own copy
//! of the table, so later changes to the working table never reach it.
//! Snapshots committed inside a filter chain also remember the chain's
//! unfiltered table, shared between them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::models::Table;

/// Label of the first snapshot after a dataset is loaded or merged.
pub const BASELINE_LABEL: &str = "initial data";

/// A committed state of the working table.
#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub table: Table,
    /// Unfiltered table of the filter chain this snapshot belongs to.
    pub filter_baseline: Option<Arc<Table>>,
}

/// Snapshot metadata, without the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInfo {
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub rows: usize,
    pub columns: usize,
    /// The cursor points at this snapshot.
    pub current: bool,
}

#[derive(Debug, Clone)]
pub struct History {
    snapshots: VecDeque<HistorySnapshot>,
    /// `None` when empty.
    cursor: Option<usize>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::new(),
            cursor: None,
            capacity: capacity.max(1),
        }
    }

    /// Record a new state.
    ///
    /// Snapshots after the cursor are discarded first. When the capacity is
    /// exceeded the oldest snapshot is evicted and the cursor still points at
    /// the new one.
    pub fn commit(&mut self, table: &Table, label: impl Into<String>) {
        self.commit_filtered(table, label, None);
    }

    /// Record a state produced by a filter running on `filter_baseline`.
    pub fn commit_filtered(
        &mut self,
        table: &Table,
        label: impl Into<String>,
        filter_baseline: Option<Arc<Table>>,
    ) {
        if let Some(cursor) = self.cursor {
            self.snapshots.truncate(cursor + 1);
        }

        self.snapshots.push_back(HistorySnapshot {
            label: label.into(),
            created_at: Utc::now(),
            table: table.clone(),
            filter_baseline,
        });

        if self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
        self.cursor = Some(self.snapshots.len() - 1);
    }

    /// Step back. Returns the label of the undone snapshot and a copy of the
    /// table now current, or `None` at the oldest snapshot.
    pub fn undo(&mut self) -> Option<(String, Table)> {
        let cursor = self.cursor.filter(|&c| c > 0)?;
        let undone = self.snapshots[cursor].label.clone();
        self.cursor = Some(cursor - 1);
        Some((undone, self.snapshots[cursor - 1].table.clone()))
    }

    /// Step forward. Returns the label and a copy of the redone table, or
    /// `None` at the newest snapshot.
    pub fn redo(&mut self) -> Option<(String, Table)> {
        let cursor = self.cursor?;
        if cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor = Some(cursor + 1);
        let snapshot = &self.snapshots[cursor + 1];
        Some((snapshot.label.clone(), snapshot.table.clone()))
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.snapshots.len())
    }

    pub fn current(&self) -> Option<&HistorySnapshot> {
        self.cursor.map(|c| &self.snapshots[c])
    }

    /// Filter baseline of the current snapshot.
    pub fn filter_baseline(&self) -> Option<&Arc<Table>> {
        self.current().and_then(|s| s.filter_baseline.as_ref())
    }

    /// Cursor position, `None` when empty.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn entries(&self) -> Vec<SnapshotInfo> {
        self.snapshots
            .iter()
            .enumerate()
            .map(|(i, s)| SnapshotInfo {
                label: s.label.clone(),
                created_at: s.created_at,
                rows: s.table.len(),
                columns: s.table.width(),
                current: self.cursor == Some(i),
            })
            .collect()
    }

    /// `current: <label> (n/m)`, or empty when there is no history.
    pub fn status(&self) -> String {
        match self.current() {
            Some(snapshot) => format!(
                "current: {} ({}/{})",
                snapshot.label,
                self.cursor.map_or(0, |c| c + 1),
                self.snapshots.len()
            ),
            None => String::new(),
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn table(n: usize) -> Table {
        Table::new(
            vec!["v".into()],
            (0..n).map(|i| vec![Cell::from(i.to_string())]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_undo_redo_inverse() {
        let mut history = History::new(50);
        history.commit(&table(0), BASELINE_LABEL);
        for i in 1..=5 {
            history.commit(&table(i), format!("step {}", i));
        }

        let mut last = None;
        for _ in 0..5 {
            last = history.undo();
        }
        let (label, t) = last.clone().unwrap();
        assert_eq!(label, "step 1");
        assert_eq!(t, table(0));
        assert!(history.undo().is_none());

        for _ in 0..5 {
            last = history.redo();
        }
        assert_eq!(last.unwrap().1, table(5));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_commit_prunes_redo_branch() {
        let mut history = History::new(50);
        history.commit(&table(0), BASELINE_LABEL);
        history.commit(&table(1), "a");
        history.commit(&table(2), "b");
        history.undo();
        history.undo();
        history.commit(&table(9), "c");

        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        let labels: Vec<_> = history.entries().into_iter().map(|e| e.label).collect();
        assert_eq!(labels, vec![BASELINE_LABEL, "c"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new(3);
        for i in 0..5 {
            history.commit(&table(i), format!("s{}", i));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), Some(2));
        assert_eq!(history.current().unwrap().label, "s4");

        history.undo();
        history.undo();
        assert!(!history.can_undo());
        assert_eq!(history.current().unwrap().label, "s2");
    }

    #[test]
    fn test_snapshots_are_independent() {
        let mut history = History::new(5);
        let mut working = table(1);
        history.commit(&working, BASELINE_LABEL);
        working = table(7);
        history.commit(&working, "grow");

        let (_, restored) = history.undo().unwrap();
        assert_eq!(restored, table(1));
        assert_eq!(working.len(), 7);
    }

    #[test]
    fn test_clear_and_status() {
        let mut history = History::new(5);
        assert_eq!(history.status(), "");
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());

        history.commit(&table(1), BASELINE_LABEL);
        history.commit(&table(2), "sort: v (ascending)");
        assert_eq!(history.status(), "current: sort: v (ascending) (2/2)");

        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.cursor(), None);
    }

    #[test]
    fn test_filter_baseline_follows_cursor() {
        let mut history = History::new(5);
        let base = Arc::new(table(4));
        history.commit(&base, BASELINE_LABEL);
        history.commit_filtered(&table(2), "filter", Some(Arc::clone(&base)));
        assert_eq!(history.filter_baseline().map(|b| b.len()), Some(4));

        history.undo();
        assert!(history.filter_baseline().is_none());
        history.redo();
        assert!(Arc::ptr_eq(history.filter_baseline().unwrap(), &base));

        history.commit(&table(1), "sort");
        assert!(history.filter_baseline().is_none());
    }
}
