//! Transform pipeline.
//!
//! Stateless operations over a [`crate::models::Table`]; each returns a new
//! table and leaves its input untouched:
//! - Filter: keep rows matching a condition on one column
//! - Sort: stable single-column sort
//! - Cleanup: duplicates, empty rows, whitespace, fill
//! - Profile: column type sniffing

pub mod cleanup;
pub mod filter;
pub mod numeric;
pub mod profile;
pub mod sort;

pub use cleanup::{cleanup_table, CleanupOp, CleanupOutcome};
pub use filter::{filter_table, FilterCondition, FilterSpec};
pub use numeric::{cell_number, parse_number};
pub use profile::{profile_table, ColumnKind, ColumnProfile, TableProfile};
pub use sort::{sort_table, SortDirection, SortSpec};
