//! Session: the working table, its filter chain and its history.
//!
//! Every command computes its result before touching any state, so a failed
//! command leaves the working table and the history exactly as they were.
//!
//! ```text
//! load_table / run_join / merge_sheets
//!        │  (clears history, commits "initial data")
//!        ▼
//!   working table ──► apply_filter / apply_sort / apply_cleanup ──► commit
//!        ▲                                                            │
//!        └────────────────────── undo / redo ◄────────────────────────┘
//! ```

pub mod worker;

pub use worker::SharedSession;

use serde::Serialize;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, ValidationError};
use crate::history::{History, BASELINE_LABEL};
use crate::join::{self, MergeMode, MergeSummary, NamedTable};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::{JoinSpec, JoinStats, Table};
use crate::transform::{
    cleanup_table, filter_table, profile_table, sort_table, CleanupOp, FilterSpec, SortSpec,
    TableProfile,
};
use crate::validation::{validate_filter, validate_join, validate_sort, ValidationReport};

/// Label committed when a filter chain is cleared.
pub const CLEAR_FILTER_LABEL: &str = "clear filter";

/// Result of [`Session::apply_filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOutcome {
    /// Rows that satisfied the condition.
    pub kept: usize,
    /// Rows of the table the filter ran on.
    pub baseline_rows: usize,
}

#[derive(Debug, Clone)]
pub struct Session {
    config: EngineConfig,
    current: Option<Table>,
    /// Table as it was before the first filter of the active chain.
    filter_baseline: Option<Arc<Table>>,
    history: History,
    last_stats: Option<JoinStats>,
    last_merge: Option<MergeSummary>,
}

impl Session {
    pub fn new(config: EngineConfig) -> Self {
        let history = History::new(config.history_capacity);
        Self {
            config,
            current: None,
            filter_baseline: None,
            history,
            last_stats: None,
            last_merge: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current(&self) -> Option<&Table> {
        self.current.as_ref()
    }

    /// Stats of the join that produced the current dataset, if any.
    pub fn join_stats(&self) -> Option<&JoinStats> {
        self.last_stats.as_ref()
    }

    pub fn last_merge(&self) -> Option<&MergeSummary> {
        self.last_merge.as_ref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn filter_active(&self) -> bool {
        self.filter_baseline.is_some()
    }

    // =========================================================================
    // Datasets
    // =========================================================================

    /// Replace the dataset. History restarts from `initial data`.
    pub fn load_table(&mut self, table: Table, source: &str) {
        log_info(format!(
            "Loaded {}: {} rows, {} columns",
            source,
            table.len(),
            table.width()
        ));
        self.last_stats = None;
        self.last_merge = None;
        self.reset(table);
    }

    /// Validate and join two tables, then load the result.
    pub fn run_join(&mut self, left: &Table, right: &Table, spec: &JoinSpec) -> EngineResult<JoinStats> {
        let report = validate_join(left, right, spec, self.config.allow_empty_keys)?;
        log_report(&report);

        log_info(format!(
            "Running {} join on [{}] = [{}]",
            spec.join_type,
            spec.keys_left.join(", "),
            spec.keys_right.join(", ")
        ));
        let result = join::join(left, right, spec, &self.config.collision_suffix)?;
        log_success(format!("Join complete: {}", result.stats));

        let stats = result.stats;
        self.last_stats = Some(stats);
        self.last_merge = None;
        self.reset(result.table);
        Ok(stats)
    }

    /// Combine sheets into the dataset.
    ///
    /// Exactly two sheets with non-empty key lists are joined, anything else
    /// is stacked under the union of the headers.
    pub fn merge_sheets(&mut self, sheets: &[NamedTable], spec: Option<&JoinSpec>) -> EngineResult<MergeSummary> {
        let tables: Vec<&Table> = sheets.iter().map(|s| &s.table).collect();
        let (table, summary) = join::merge_sheets(&tables, spec, &self.config.collision_suffix)?;

        let names: Vec<&str> = sheets.iter().map(|s| s.name.as_str()).collect();
        match summary.mode {
            MergeMode::Join => log_success(format!(
                "Joined sheets {}: {} rows",
                names.join(" + "),
                summary.total_rows
            )),
            MergeMode::Union => log_success(format!(
                "Merged {} sheets ({}): {} rows",
                summary.sheets,
                names.join(", "),
                summary.total_rows
            )),
        }

        self.last_stats = summary.join_stats;
        self.last_merge = Some(summary.clone());
        self.reset(table);
        Ok(summary)
    }

    fn reset(&mut self, table: Table) {
        self.history.clear();
        self.history.commit(&table, BASELINE_LABEL);
        self.filter_baseline = None;
        self.current = Some(table);
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Filter the chain's baseline.
    ///
    /// Filters do not stack: each one runs on the table as it was before the
    /// first filter of the chain.
    pub fn apply_filter(&mut self, spec: &FilterSpec) -> EngineResult<FilterOutcome> {
        let base = match self.filter_baseline.as_deref() {
            Some(baseline) => baseline,
            None => self.loaded()?,
        };
        validate_filter(base, spec)?;
        let filtered = filter_table(base, spec)?;

        let outcome = FilterOutcome {
            kept: filtered.len(),
            baseline_rows: base.len(),
        };
        log_info(format!(
            "{}: kept {} of {} rows",
            spec.label(),
            outcome.kept,
            outcome.baseline_rows
        ));

        if self.filter_baseline.is_none() {
            self.filter_baseline = self.current.take().map(Arc::new);
        }
        self.history
            .commit_filtered(&filtered, spec.label(), self.filter_baseline.clone());
        self.current = Some(filtered);
        Ok(outcome)
    }

    /// Restore the table from before the filter chain.
    pub fn clear_filter(&mut self) -> EngineResult<()> {
        let baseline = self.filter_baseline.take().ok_or(EngineError::NoActiveFilter)?;
        let baseline = Arc::try_unwrap(baseline).unwrap_or_else(|shared| (*shared).clone());
        log_info(format!("Filter cleared: {} rows", baseline.len()));
        self.commit(baseline, CLEAR_FILTER_LABEL.to_string());
        Ok(())
    }

    pub fn apply_sort(&mut self, spec: &SortSpec) -> EngineResult<()> {
        let table = self.loaded()?;
        validate_sort(table, spec)?;
        let sorted = sort_table(table, spec)?;

        log_info(spec.label());
        self.filter_baseline = None;
        self.commit(sorted, spec.label());
        Ok(())
    }

    /// Run a cleanup operation. Returns the number of rows removed.
    pub fn apply_cleanup(&mut self, op: &CleanupOp) -> EngineResult<usize> {
        let outcome = cleanup_table(self.loaded()?, op);
        log_info(format!("{}: {} rows removed", op.label(), outcome.removed));

        self.filter_baseline = None;
        self.commit(outcome.table, op.label());
        Ok(outcome.removed)
    }

    /// Profile the current table.
    pub fn profile(&self) -> EngineResult<TableProfile> {
        Ok(profile_table(self.loaded()?, self.config.profile_sample_rows))
    }

    fn commit(&mut self, table: Table, label: String) {
        self.history.commit(&table, label);
        self.current = Some(table);
    }

    fn loaded(&self) -> EngineResult<&Table> {
        self.current
            .as_ref()
            .ok_or_else(|| ValidationError::EmptySelection("no table loaded".to_string()).into())
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Step back one snapshot. Returns the label of the undone operation.
    ///
    /// Landing on a filtered snapshot resumes its filter chain.
    pub fn undo(&mut self) -> EngineResult<String> {
        let (label, table) = self.history.undo().ok_or(EngineError::NothingToUndo)?;
        log_info(format!("Undo: {}", label));
        log_info_indent(self.history.status(), 1);
        self.filter_baseline = self.history.filter_baseline().cloned();
        self.current = Some(table);
        Ok(label)
    }

    /// Step forward one snapshot. Returns the label of the redone operation.
    pub fn redo(&mut self) -> EngineResult<String> {
        let (label, table) = self.history.redo().ok_or(EngineError::NothingToRedo)?;
        log_info(format!("Redo: {}", label));
        log_info_indent(self.history.status(), 1);
        self.filter_baseline = self.history.filter_baseline().cloned();
        self.current = Some(table);
        Ok(label)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        log_warning(warning.clone());
    }
}
