//! Error types for the SheetJoin engine.
//!
//! This module defines the error hierarchy used across the crate:
//!
//! - [`DecodeError`] - file decoding errors (CSV, spreadsheet, JSON records)
//! - [`ValidationError`] - pre-flight errors the caller can correct
//! - [`OperationError`] - unexpected failures while a join or transform runs
//! - [`StoreError`] - settings/templates/history persistence errors
//! - [`ExportError`] - export encoding errors
//! - [`EngineError`] - top-level errors returned by the session
//!
//! Conversions into [`EngineError`] are automatic via `From`,
//! so `?` works across module boundaries.

use thiserror::Error;

// =============================================================================
// Decode Errors
// =============================================================================

/// Errors raised by the file decoder.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Failed to read the input.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// Input contains no rows at all.
    #[error("Input is empty")]
    EmptyInput,

    /// Malformed delimited text.
    #[error("Line {line}: {message}")]
    Csv { line: u64, message: String },

    /// Spreadsheet could not be opened or read.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Requested sheet does not exist in the workbook.
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// JSON records could not be decoded.
    #[error("Invalid JSON records: {0}")]
    Json(String),

    /// File extension is not a supported format.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Pre-flight errors. Raised before any mutation of the working table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A key list is empty.
    #[error("No key columns selected for the {side} table")]
    EmptyKeys { side: &'static str },

    /// Key lists differ in length.
    #[error("Key column count mismatch: left has {left}, right has {right}")]
    KeyCountMismatch { left: usize, right: usize },

    /// A referenced column is absent from the table header.
    #[error("Unknown column '{column}' in {context}")]
    UnknownColumn { column: String, context: String },

    /// Header contains the same name twice.
    #[error("Duplicate column name '{0}' in header")]
    DuplicateColumn(String),

    /// A row does not have as many cells as the header.
    #[error("Row {row} has {actual} cells, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// A numeric filter was given a value that does not parse as a number.
    #[error("Condition '{condition}' needs a numeric value, got '{value}'")]
    NotNumeric { condition: String, value: String },

    /// Nothing is loaded, or a required selection is empty.
    #[error("Nothing selected: {0}")]
    EmptySelection(String),
}

// =============================================================================
// Operation Errors
// =============================================================================

/// Unexpected failures during a join or transform.
///
/// The working table and history are left untouched when one is raised.
#[derive(Debug, Error)]
pub enum OperationError {
    /// The operation produced an inconsistent table.
    #[error("Operation '{operation}' failed: {message}")]
    Failed { operation: String, message: String },

    /// Background worker stopped before returning.
    #[error("Background task aborted: {0}")]
    Aborted(String),
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the persistence store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Template not found.
    #[error("Template not found: {0}")]
    NotFound(String),

    /// IO error.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors from the export encoder.
#[derive(Debug, Error)]
pub enum ExportError {
    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error.
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON export error: {0}")]
    Json(#[from] serde_json::Error),

    /// XLSX writer error.
    #[error("XLSX export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Table does not fit the target format.
    #[error("Table too large for {format}: {message}")]
    TooLarge {
        format: &'static str,
        message: String,
    },
}

// =============================================================================
// Engine Errors (top-level)
// =============================================================================

/// Top-level errors returned by [`crate::session::Session`] and the CLI helpers.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Decoder error.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation error.
    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Another join or transform is still running.
    #[error("Another operation is in progress")]
    Busy,

    /// Cursor is at the oldest snapshot.
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Cursor is at the newest snapshot.
    #[error("Nothing to redo")]
    NothingToRedo,

    /// No filter chain is active.
    #[error("No filter is applied")]
    NoActiveFilter,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for pre-flight checks.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for session operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let decode_err = DecodeError::EmptyInput;
        let engine_err: EngineError = decode_err.into();
        assert!(engine_err.to_string().contains("empty"));

        let validation_err = ValidationError::UnknownColumn {
            column: "age".into(),
            context: "sort".into(),
        };
        let engine_err: EngineError = validation_err.into();
        assert!(engine_err.to_string().contains("age"));
    }

    #[test]
    fn test_validation_error_format() {
        let err = ValidationError::NotNumeric {
            condition: "greater_than".into(),
            value: "abc".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("greater_than"));
        assert!(msg.contains("abc"));

        let err = ValidationError::KeyCountMismatch { left: 2, right: 1 };
        assert!(err.to_string().contains("left has 2"));
    }
}
