//! Join module.
//!
//! - `header`: merged column set and name collision handling
//! - `engine`: hash join for inner/left/right/full
//! - `sheets`: single-workbook sheet merging (join or union)
//! - `batch`: pairwise joins over many tables

pub mod batch;
pub mod engine;
pub mod header;
pub mod sheets;

pub use batch::{batch_join, BatchResult};
pub use engine::{join, KEY_SEPARATOR};
pub use header::{reconcile, reconcile_header, HeaderPlan};
pub use sheets::{merge_sheets, union_sheets, MergeMode, MergeSummary, NamedTable};
