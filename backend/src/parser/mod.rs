//! File decoder: delimited text, spreadsheets and JSON records into tables.
//!
//! Delimited text goes through encoding and delimiter auto-detection.
//! Every decoder hands its raw header and rows to
//! [`crate::codec::table_from_raw`], so the result is always a valid
//! [`Table`] even for ragged input or duplicate header names.
//!
//! # Example
//!
//! ```rust,ignore
//! use sheetjoin::parser::{decode_file, DecodeOptions};
//!
//! let decoded = decode_file("customers.csv", &DecodeOptions::default())?;
//! println!("Encoding: {:?}, delimiter: {:?}", decoded.encoding, decoded.delimiter);
//! for sheet in &decoded.sheets {
//!     println!("{}: {} rows", sheet.name, sheet.table.len());
//! }
//! ```

pub mod records;
pub mod spreadsheet;

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::codec::{generated_header, table_from_raw};
use crate::error::{DecodeError, DecodeResult};
use crate::join::NamedTable;
use crate::models::{Cell, Row, Table};

/// Options shared by all decoders.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// First row holds column names. When false, `col_1..col_N` are
    /// generated and the first row is kept as data.
    pub has_header: bool,
    /// Delimiter for text input; detected when `None`.
    pub delimiter: Option<char>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
    Json,
}

impl SourceFormat {
    /// Format implied by a file extension.
    pub fn from_path(path: &Path) -> DecodeResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(SourceFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
            "json" => Ok(SourceFormat::Json),
            _ => Err(DecodeError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Spreadsheet => "spreadsheet",
            SourceFormat::Json => "json",
        })
    }
}

/// Decoded file with detection metadata.
#[derive(Debug, Clone)]
pub struct DecodedFile {
    pub format: SourceFormat,
    /// One entry for text and JSON input, one per worksheet for spreadsheets.
    pub sheets: Vec<NamedTable>,
    /// Detected or used encoding (text input only).
    pub encoding: Option<String>,
    /// Detected or used delimiter (text input only).
    pub delimiter: Option<char>,
}

impl DecodedFile {
    /// The first sheet, or the one named `name`.
    pub fn sheet(&self, name: Option<&str>) -> DecodeResult<&NamedTable> {
        match name {
            Some(name) => self
                .sheets
                .iter()
                .find(|s| s.name == name)
                .ok_or_else(|| DecodeError::SheetNotFound(name.to_string())),
            None => self.sheets.first().ok_or(DecodeError::EmptyInput),
        }
    }

    pub fn into_table(self, name: Option<&str>) -> DecodeResult<Table> {
        let index = match name {
            Some(name) => self
                .sheets
                .iter()
                .position(|s| s.name == name)
                .ok_or_else(|| DecodeError::SheetNotFound(name.to_string()))?,
            None => 0,
        };
        self.sheets
            .into_iter()
            .nth(index)
            .map(|s| s.table)
            .ok_or(DecodeError::EmptyInput)
    }
}

// =============================================================================
// Encoding & delimiter detection
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string. Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

// =============================================================================
// Decoders
// =============================================================================

/// Decode delimited text.
pub fn decode_text(content: &str, delimiter: char, has_header: bool) -> DecodeResult<Table> {
    if !delimiter.is_ascii() {
        return Err(DecodeError::UnsupportedFormat(format!(
            "non-ASCII delimiter '{}'",
            delimiter
        )));
    }
    let delimiter = delimiter as u8;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut raw: Vec<Row> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DecodeError::Csv {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        raw.push(record.iter().map(Cell::text).collect());
    }

    raw_to_table(raw, has_header)
}

/// Decode delimited text bytes with auto-detection.
pub fn decode_csv_bytes(bytes: &[u8], options: &DecodeOptions) -> DecodeResult<DecodedFile> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = options.delimiter.unwrap_or_else(|| detect_delimiter(&content));
    let table = decode_text(&content, delimiter, options.has_header)?;

    Ok(DecodedFile {
        format: SourceFormat::Csv,
        sheets: vec![NamedTable::new("data", table)],
        encoding: Some(encoding),
        delimiter: Some(delimiter),
    })
}

/// Decode bytes whose format is known.
pub fn decode_bytes(bytes: &[u8], format: SourceFormat, options: &DecodeOptions) -> DecodeResult<DecodedFile> {
    match format {
        SourceFormat::Csv => decode_csv_bytes(bytes, options),
        SourceFormat::Spreadsheet => Ok(DecodedFile {
            format,
            sheets: spreadsheet::decode_xlsx_bytes(bytes, options.has_header)?,
            encoding: None,
            delimiter: None,
        }),
        SourceFormat::Json => Ok(DecodedFile {
            format,
            sheets: vec![NamedTable::new("data", records::decode_records(bytes)?)],
            encoding: None,
            delimiter: None,
        }),
    }
}

/// Decode a file, choosing the decoder from its extension.
pub fn decode_file<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> DecodeResult<DecodedFile> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path)?;

    match format {
        SourceFormat::Spreadsheet => Ok(DecodedFile {
            format,
            sheets: spreadsheet::decode_workbook(path, options.has_header)?,
            encoding: None,
            delimiter: None,
        }),
        _ => {
            let bytes = std::fs::read(path)?;
            let mut decoded = decode_bytes(&bytes, format, options)?;
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                for sheet in &mut decoded.sheets {
                    sheet.name = stem.to_string();
                }
            }
            Ok(decoded)
        }
    }
}

/// Split raw rows into header and data.
pub(crate) fn raw_to_table(mut raw: Vec<Row>, has_header: bool) -> DecodeResult<Table> {
    if raw.is_empty() {
        return Err(DecodeError::EmptyInput);
    }

    if has_header {
        let header = raw
            .remove(0)
            .iter()
            .map(|c| c.as_string().trim().to_string())
            .collect();
        Ok(table_from_raw(header, raw))
    } else {
        let width = raw.iter().map(Vec::len).max().unwrap_or(0);
        Ok(table_from_raw(generated_header(width), raw))
    }
}
