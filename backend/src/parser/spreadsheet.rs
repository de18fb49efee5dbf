//! Workbook decoding with calamine. Every worksheet becomes a named table.

use calamine::{open_workbook_auto, Data, Range, Reader, Xlsx};
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use super::raw_to_table;
use crate::error::{DecodeError, DecodeResult};
use crate::join::NamedTable;
use crate::models::{Cell, Row};

/// Decode every worksheet of a workbook file (xlsx, xls, xlsb, ods).
pub fn decode_workbook(path: &Path, has_header: bool) -> DecodeResult<Vec<NamedTable>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| DecodeError::Spreadsheet(e.to_string()))?;
    read_sheets(&mut workbook, has_header)
}

/// Decode an in-memory xlsx workbook.
pub fn decode_xlsx_bytes(bytes: &[u8], has_header: bool) -> DecodeResult<Vec<NamedTable>> {
    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes.to_vec())).map_err(|e| DecodeError::Spreadsheet(e.to_string()))?;
    read_sheets(&mut workbook, has_header)
}

fn read_sheets<RS, R>(workbook: &mut R, has_header: bool) -> DecodeResult<Vec<NamedTable>>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(DecodeError::Spreadsheet(
            "Workbook contains no sheets".to_string(),
        ));
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in &sheet_names {
        let range = workbook
            .worksheet_range(name)
            .map_err(|e| DecodeError::Spreadsheet(format!("{}: {}", name, e)))?;

        // Empty worksheets are skipped rather than failing the workbook
        match raw_to_table(range_rows(&range), has_header) {
            Ok(table) => sheets.push(NamedTable::new(name.clone(), table)),
            Err(DecodeError::EmptyInput) => continue,
            Err(e) => return Err(e),
        }
    }

    if sheets.is_empty() {
        return Err(DecodeError::EmptyInput);
    }
    Ok(sheets)
}

fn range_rows(range: &Range<Data>) -> Vec<Row> {
    range
        .rows()
        .map(|row| row.iter().map(data_cell).collect::<Row>())
        .filter(|row| !row.iter().all(Cell::is_blank))
        .collect()
}

fn data_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::text(s.as_str()),
        Data::DurationIso(s) => Cell::text(s.as_str()),
    }
}
