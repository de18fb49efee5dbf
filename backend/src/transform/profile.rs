//! Column type sniffing and table summary.

use serde::Serialize;

use super::numeric::cell_number;
use crate::models::{ColumnName, Table};

/// Dominant kind of values in a column sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every non-blank sampled value is numeric.
    Number,
    /// At least one sampled value is non-numeric text.
    Text,
    /// No non-blank value in the sample.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub name: ColumnName,
    pub kind: ColumnKind,
    /// Blank cells over the whole column, not just the sample.
    pub blank_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProfile {
    pub rows: usize,
    pub columns: usize,
    pub column_profiles: Vec<ColumnProfile>,
}

/// Profile every column, sniffing types from the first `sample_rows` rows.
pub fn profile_table(table: &Table, sample_rows: usize) -> TableProfile {
    let sample = &table.rows()[..sample_rows.min(table.len())];

    let column_profiles = table
        .header()
        .iter()
        .enumerate()
        .map(|(col, name)| {
            let mut has_number = false;
            let mut has_text = false;
            for row in sample {
                let cell = &row[col];
                if cell.is_blank() {
                    continue;
                }
                if cell_number(cell).is_some() {
                    has_number = true;
                } else {
                    has_text = true;
                }
            }

            let kind = match (has_number, has_text) {
                (_, true) => ColumnKind::Text,
                (true, false) => ColumnKind::Number,
                (false, false) => ColumnKind::Empty,
            };

            ColumnProfile {
                name: name.clone(),
                kind,
                blank_count: table.rows().iter().filter(|r| r[col].is_blank()).count(),
            }
        })
        .collect();

    TableProfile {
        rows: table.len(),
        columns: table.width(),
        column_profiles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    #[test]
    fn test_profile_kinds() {
        let table = Table::new(
            vec!["n".into(), "t".into(), "e".into()],
            vec![
                vec![Cell::from("1"), Cell::from("a"), Cell::Empty],
                vec![Cell::Number(2.0), Cell::from("3"), Cell::from(" ")],
                vec![Cell::Empty, Cell::Empty, Cell::Empty],
            ],
        )
        .unwrap();

        let profile = profile_table(&table, 100);
        assert_eq!(profile.rows, 3);
        assert_eq!(profile.columns, 3);
        let kinds: Vec<_> = profile.column_profiles.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ColumnKind::Number, ColumnKind::Text, ColumnKind::Empty]);
        assert_eq!(profile.column_profiles[2].blank_count, 3);
    }

    #[test]
    fn test_sample_limit() {
        let table = Table::new(
            vec!["v".into()],
            vec![vec![Cell::from("1")], vec![Cell::from("x")]],
        )
        .unwrap();
        assert_eq!(profile_table(&table, 1).column_profiles[0].kind, ColumnKind::Number);
        assert_eq!(profile_table(&table, 2).column_profiles[0].kind, ColumnKind::Text);
    }
}
