//! Join run history: what was joined, when, and how many rows came out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Store, RUN_HISTORY_KEY};
use crate::error::StoreResult;
use crate::models::{ColumnName, JoinSpec, JoinType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRunRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub join_type: JoinType,
    pub keys_left: Vec<ColumnName>,
    pub keys_right: Vec<ColumnName>,
    /// Name of the left input (file or sheet).
    pub left_source: String,
    pub right_source: String,
    pub result_rows: usize,
}

impl JoinRunRecord {
    pub fn new(
        spec: &JoinSpec,
        left_source: impl Into<String>,
        right_source: impl Into<String>,
        result_rows: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            join_type: spec.join_type,
            keys_left: spec.keys_left.clone(),
            keys_right: spec.keys_right.clone(),
            left_source: left_source.into(),
            right_source: right_source.into(),
            result_rows,
        }
    }
}

/// Run records stored under [`RUN_HISTORY_KEY`], newest first.
pub struct RunHistory<'a> {
    store: &'a Store,
    limit: usize,
}

impl<'a> RunHistory<'a> {
    pub fn new(store: &'a Store, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    pub fn list(&self) -> Vec<JoinRunRecord> {
        self.store.load_or_default(RUN_HISTORY_KEY)
    }

    pub fn record(&self, run: JoinRunRecord) -> StoreResult<()> {
        let mut runs = self.list();
        runs.insert(0, run);
        runs.truncate(self.limit);
        self.store.save(RUN_HISTORY_KEY, &runs)
    }

    pub fn clear(&self) -> StoreResult<bool> {
        self.store.remove(RUN_HISTORY_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_record_keeps_newest() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let runs = store.runs(2);
        let spec = JoinSpec::on(&["id"], JoinType::Left);

        runs.record(JoinRunRecord::new(&spec, "a.csv", "b.csv", 10)).unwrap();
        runs.record(JoinRunRecord::new(&spec, "a.csv", "c.csv", 20)).unwrap();
        runs.record(JoinRunRecord::new(&spec, "a.csv", "d.csv", 30)).unwrap();

        let listed = runs.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].right_source, "d.csv");
        assert_eq!(listed[1].result_rows, 20);
        assert_eq!(listed[0].join_type, JoinType::Left);
    }

    #[test]
    fn test_clear() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let runs = store.runs(10);
        assert!(runs.list().is_empty());

        runs.record(JoinRunRecord::new(&JoinSpec::on(&["k"], JoinType::Inner), "l", "r", 1))
            .unwrap();
        assert!(runs.clear().unwrap());
        assert!(runs.list().is_empty());
    }
}
