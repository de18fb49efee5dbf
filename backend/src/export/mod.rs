//! Export encoder: delimited text, JSON records and xlsx workbooks.

use rust_xlsxwriter::{Format, Workbook};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::{ExportError, ExportResult};
use crate::join::NamedTable;
use crate::models::{integral_value, Cell, ColumnName, Row, Table};

/// Excel's worksheet limits.
const MAX_XLSX_ROWS: usize = 1_048_576;
const MAX_XLSX_COLUMNS: usize = 16_384;
const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }

    /// Format implied by the output file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

// =============================================================================
// CSV
// =============================================================================

/// Write the header line and every row.
pub fn write_csv<W: Write>(table: &Table, writer: W, delimiter: u8) -> ExportResult<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    out.write_record(table.header())?;
    for row in table.rows() {
        out.write_record(row.iter().map(Cell::as_string))?;
    }
    out.flush()?;
    Ok(())
}

pub fn to_csv_string(table: &Table, delimiter: u8) -> ExportResult<String> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf, delimiter)?;
    String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
}

// =============================================================================
// JSON records
// =============================================================================

/// A cell as a JSON value. Integral numbers are written without a
/// fractional part, matching the CSV output.
struct JsonCell<'a>(&'a Cell);

impl Serialize for JsonCell<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Cell::Empty => serializer.serialize_none(),
            Cell::Text(s) => serializer.serialize_str(s),
            Cell::Number(n) => match integral_value(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
        }
    }
}

/// One row as an object keyed by header, in header order.
struct RecordRef<'a> {
    header: &'a [ColumnName],
    row: &'a Row,
}

impl Serialize for RecordRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.header.len()))?;
        for (name, cell) in self.header.iter().zip(self.row) {
            map.serialize_entry(name, &JsonCell(cell))?;
        }
        map.end()
    }
}

/// All rows as an array of records.
pub struct JsonRecords<'a>(pub &'a Table);

impl Serialize for JsonRecords<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let table = self.0;
        let mut seq = serializer.serialize_seq(Some(table.len()))?;
        for row in table.rows() {
            seq.serialize_element(&RecordRef {
                header: table.header(),
                row,
            })?;
        }
        seq.end()
    }
}

pub fn to_json_records(table: &Table, pretty: bool) -> ExportResult<String> {
    let records = JsonRecords(table);
    let json = if pretty {
        serde_json::to_string_pretty(&records)?
    } else {
        serde_json::to_string(&records)?
    };
    Ok(json)
}

// =============================================================================
// XLSX
// =============================================================================

/// Excel-safe, unique sheet names.
fn sheet_names(sheets: &[NamedTable]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    sheets
        .iter()
        .enumerate()
        .map(|(i, sheet)| {
            let cleaned: String = sheet
                .name
                .chars()
                .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
                .collect();
            let cleaned = cleaned.trim_matches('\'').trim().to_string();
            let base = if cleaned.is_empty() {
                format!("Sheet{}", i + 1)
            } else {
                cleaned.chars().take(MAX_SHEET_NAME).collect()
            };

            let mut name = base.clone();
            let mut n = 2;
            while taken.contains(&name.to_lowercase()) {
                let suffix = format!(" ({})", n);
                let keep = MAX_SHEET_NAME - suffix.chars().count();
                name = base.chars().take(keep).collect::<String>() + &suffix;
                n += 1;
            }
            taken.insert(name.to_lowercase());
            name
        })
        .collect()
}

fn build_workbook(sheets: &[NamedTable]) -> ExportResult<Workbook> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for (sheet, name) in sheets.iter().zip(sheet_names(sheets)) {
        let table = &sheet.table;
        if table.len() + 1 > MAX_XLSX_ROWS || table.width() > MAX_XLSX_COLUMNS {
            return Err(ExportError::TooLarge {
                format: "xlsx",
                message: format!("sheet '{}' has {} rows and {} columns", name, table.len(), table.width()),
            });
        }

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&name)?;

        for (col, title) in table.header().iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, title, &bold)?;
        }

        for (r, row) in table.rows().iter().enumerate() {
            let r = (r + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Empty => {}
                    Cell::Number(n) => {
                        worksheet.write_number(r, col as u16, *n)?;
                    }
                    Cell::Text(s) => {
                        worksheet.write_string(r, col as u16, s)?;
                    }
                }
            }
        }
    }

    Ok(workbook)
}

/// Encode one or more tables as an in-memory workbook, one sheet each.
pub fn xlsx_bytes(sheets: &[NamedTable]) -> ExportResult<Vec<u8>> {
    let mut workbook = build_workbook(sheets)?;
    Ok(workbook.save_to_buffer()?)
}

pub fn write_xlsx(sheets: &[NamedTable], path: &Path) -> ExportResult<()> {
    let mut workbook = build_workbook(sheets)?;
    workbook.save(path)?;
    Ok(())
}

/// Write a single table to `path` in `format`.
pub fn export_table(table: &Table, path: &Path, format: ExportFormat) -> ExportResult<()> {
    match format {
        ExportFormat::Csv => {
            let file = std::fs::File::create(path)?;
            write_csv(table, io::BufWriter::new(file), b',')
        }
        ExportFormat::Json => {
            std::fs::write(path, to_json_records(table, true)?)?;
            Ok(())
        }
        ExportFormat::Xlsx => {
            let sheet_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Sheet1");
            write_xlsx(&[NamedTable::new(sheet_name, table.clone())], path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{decode_text, spreadsheet::decode_xlsx_bytes};

    fn sample() -> Table {
        Table::new(
            vec!["id".into(), "name".into(), "score".into()],
            vec![
                vec![Cell::from("1"), Cell::from("Smith, Jo"), Cell::Number(9.5)],
                vec![Cell::from("2"), Cell::Empty, Cell::Number(10.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_csv_quotes_and_numbers() {
        let csv = to_csv_string(&sample(), b',').unwrap();
        assert_eq!(csv, "id,name,score\n1,\"Smith, Jo\",9.5\n2,,10\n");
    }

    #[test]
    fn test_csv_decodes_back() {
        let csv = to_csv_string(&sample(), b';').unwrap();
        let table = decode_text(&csv, ';', true).unwrap();
        assert_eq!(table.header(), sample().header());
        assert_eq!(table.rows()[0][1], Cell::from("Smith, Jo"));
        assert_eq!(table.rows()[1][1], Cell::Empty);
    }

    #[test]
    fn test_json_numbers_match_csv() {
        let table = Table::new(
            vec!["n".into()],
            vec![vec![Cell::Number(-3.0)], vec![Cell::Number(2.25)]],
        )
        .unwrap();
        assert_eq!(to_json_records(&table, false).unwrap(), r#"[{"n":-3},{"n":2.25}]"#);
        assert_eq!(to_csv_string(&table, b',').unwrap(), "n\n-3\n2.25\n");
    }

    #[test]
    fn test_json_records_in_header_order() {
        let json = to_json_records(&sample(), false).unwrap();
        assert_eq!(
            json,
            r#"[{"id":"1","name":"Smith, Jo","score":9.5},{"id":"2","name":null,"score":10}]"#
        );
    }

    #[test]
    fn test_xlsx_multi_sheet() {
        let sheets = vec![
            NamedTable::new("joined", sample()),
            NamedTable::new("a/b", sample()),
            NamedTable::new("JOINED", sample()),
        ];
        let bytes = xlsx_bytes(&sheets).unwrap();
        let decoded = decode_xlsx_bytes(&bytes, true).unwrap();

        let names: Vec<_> = decoded.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["joined", "a_b", "JOINED (2)"]);
        assert_eq!(decoded[0].table.header(), sample().header());
        assert_eq!(decoded[0].table.rows()[0][2], Cell::Number(9.5));
    }

    #[test]
    fn test_export_table_to_files() {
        let dir = tempfile::tempdir().unwrap();
        for format in [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Xlsx] {
            let path = dir.path().join(format!("out.{}", format.extension()));
            export_table(&sample(), &path, format).unwrap();
            assert!(path.metadata().unwrap().len() > 0);
            assert_eq!(ExportFormat::from_path(&path), Some(format));
        }
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("Excel".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
