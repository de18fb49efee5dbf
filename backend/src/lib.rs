//! # SheetJoin - relational joins and cleanup for spreadsheet data
//!
//! SheetJoin joins two tables on key columns (inner, left, right, full),
//! merges workbook sheets, and runs filter/sort/cleanup transforms over the
//! result with bounded undo/redo.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ CSV / XLSX  │────▶│   Parser    │────▶│   Session   │────▶│   Export    │
//! │   / JSON    │     │ (auto-enc)  │     │ join + xform│     │ csv/xlsx/js │
//! └─────────────┘     └─────────────┘     └──────┬──────┘     └─────────────┘
//!                                                │
//!                                         ┌──────┴──────┐
//!                                         │   History   │
//!                                         │ (undo/redo) │
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sheetjoin::{decode_file, DecodeOptions, JoinSpec, JoinType, Session};
//!
//! let left = decode_file("customers.csv", &DecodeOptions::default())?.into_table(None)?;
//! let right = decode_file("orders.xlsx", &DecodeOptions::default())?.into_table(None)?;
//!
//! let mut session = Session::default();
//! let stats = session.run_join(&left, &right, &JoinSpec::on(&["id"], JoinType::Left))?;
//! println!("{}", stats);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cells, tables, join parameters and results
//! - [`codec`] - Row/record conversion and raw table construction
//! - [`join`] - Header reconciliation, join engine, sheet merging
//! - [`transform`] - Filter, sort, cleanup, profiling
//! - [`history`] - Undo/redo snapshots
//! - [`validation`] - Pre-flight checks and data-quality warnings
//! - [`session`] - Command API over the working table
//! - [`parser`] - File decoding with auto-detection
//! - [`export`] - CSV, JSON and xlsx encoding
//! - [`store`] - Settings, templates and run history on disk
//! - [`config`] - Engine configuration
//! - [`logs`] - Broadcast log channel

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Engine
pub mod codec;
pub mod history;
pub mod join;
pub mod session;
pub mod transform;
pub mod validation;

// Collaborators
pub mod export;
pub mod parser;
pub mod store;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    DecodeError, DecodeResult, EngineError, EngineResult, ExportError, ExportResult,
    OperationError, StoreError, StoreResult, ValidationError, ValidationResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, ColumnName, JoinResult, JoinSpec, JoinStats, JoinType, Row, Table};

// =============================================================================
// Re-exports - Engine
// =============================================================================

pub use codec::{denormalize, normalize, table_from_raw, Record};
pub use history::{History, HistorySnapshot, BASELINE_LABEL};
pub use join::{batch_join, join, merge_sheets, reconcile_header, BatchResult, MergeMode, MergeSummary, NamedTable};
pub use transform::{
    CleanupOp, FilterCondition, FilterSpec, SortDirection, SortSpec, TableProfile,
};
pub use validation::{validate_join, ValidationReport};

// =============================================================================
// Re-exports - Session
// =============================================================================

pub use session::{FilterOutcome, Session, SharedSession};

// =============================================================================
// Re-exports - Parser & Export
// =============================================================================

pub use export::{export_table, to_csv_string, to_json_records, write_xlsx, xlsx_bytes, ExportFormat};
pub use parser::{
    decode_bytes, decode_content, decode_file, detect_delimiter, detect_encoding, DecodeOptions,
    DecodedFile, SourceFormat,
};

// =============================================================================
// Re-exports - Store & Config
// =============================================================================

pub use config::EngineConfig;
pub use logs::{log_stream, LogEntry, LogLevel, LOG_BROADCASTER};
pub use store::{JoinRunRecord, JoinTemplate, Settings, Store};
