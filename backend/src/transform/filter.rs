//! Row filtering on a single column.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::numeric::{cell_number, parse_number};
use crate::error::{ValidationError, ValidationResult};
use crate::models::{Cell, ColumnName, Table};

/// What a cell has to satisfy to keep its row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCondition {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    NotEmpty,
}

impl FilterCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterCondition::Equals => "equals",
            FilterCondition::Contains => "contains",
            FilterCondition::StartsWith => "starts_with",
            FilterCondition::EndsWith => "ends_with",
            FilterCondition::GreaterThan => "greater_than",
            FilterCondition::LessThan => "less_than",
            FilterCondition::NotEmpty => "not_empty",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FilterCondition::GreaterThan | FilterCondition::LessThan)
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "equals" | "eq" => Ok(FilterCondition::Equals),
            "contains" => Ok(FilterCondition::Contains),
            "starts_with" => Ok(FilterCondition::StartsWith),
            "ends_with" => Ok(FilterCondition::EndsWith),
            "greater_than" | "greater" | "gt" => Ok(FilterCondition::GreaterThan),
            "less_than" | "less" | "lt" => Ok(FilterCondition::LessThan),
            "not_empty" => Ok(FilterCondition::NotEmpty),
            other => Err(format!("unknown filter condition '{}'", other)),
        }
    }
}

/// A filter on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub column: ColumnName,
    pub condition: FilterCondition,
    /// Ignored by `not_empty`.
    #[serde(default)]
    pub value: String,
}

impl FilterSpec {
    pub fn new(column: impl Into<String>, condition: FilterCondition, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            condition,
            value: value.into(),
        }
    }

    /// History label, e.g. `filter: name contains al`.
    pub fn label(&self) -> String {
        if self.condition == FilterCondition::NotEmpty {
            format!("filter: {} not_empty", self.column)
        } else {
            format!("filter: {} {} {}", self.column, self.condition, self.value)
        }
    }
}

/// Compiled predicate: the needle is lowercased or parsed once.
enum Matcher {
    Text { op: TextOp, needle: String },
    Number { op: NumberOp, threshold: f64 },
    NotEmpty,
}

#[derive(Debug, Clone, Copy)]
enum TextOp {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone, Copy)]
enum NumberOp {
    GreaterThan,
    LessThan,
}

impl Matcher {
    fn compile(spec: &FilterSpec) -> ValidationResult<Self> {
        let text = |op| Matcher::Text {
            op,
            needle: spec.value.to_lowercase(),
        };
        let number = |op| {
            parse_number(&spec.value)
                .map(|threshold| Matcher::Number { op, threshold })
                .ok_or_else(|| ValidationError::NotNumeric {
                    condition: spec.condition.to_string(),
                    value: spec.value.clone(),
                })
        };

        match spec.condition {
            FilterCondition::Equals => Ok(text(TextOp::Equals)),
            FilterCondition::Contains => Ok(text(TextOp::Contains)),
            FilterCondition::StartsWith => Ok(text(TextOp::StartsWith)),
            FilterCondition::EndsWith => Ok(text(TextOp::EndsWith)),
            FilterCondition::GreaterThan => number(NumberOp::GreaterThan),
            FilterCondition::LessThan => number(NumberOp::LessThan),
            FilterCondition::NotEmpty => Ok(Matcher::NotEmpty),
        }
    }

    fn matches(&self, cell: &Cell) -> bool {
        match self {
            Matcher::NotEmpty => !cell.is_blank(),
            Matcher::Number { op, threshold } => match (cell_number(cell), op) {
                (Some(n), NumberOp::GreaterThan) => n > *threshold,
                (Some(n), NumberOp::LessThan) => n < *threshold,
                (None, _) => false,
            },
            Matcher::Text { op, needle } => {
                let hay = cell.as_string().to_lowercase();
                match op {
                    TextOp::Equals => hay == *needle,
                    TextOp::Contains => hay.contains(needle.as_str()),
                    TextOp::StartsWith => hay.starts_with(needle.as_str()),
                    TextOp::EndsWith => hay.ends_with(needle.as_str()),
                }
            }
        }
    }
}

/// Keep the rows whose cell in `spec.column` satisfies the condition.
///
/// Text conditions compare case-insensitively. Numeric conditions only match
/// cells that parse as numbers.
pub fn filter_table(table: &Table, spec: &FilterSpec) -> ValidationResult<Table> {
    let col = table
        .column_index(&spec.column)
        .ok_or_else(|| ValidationError::UnknownColumn {
            column: spec.column.clone(),
            context: "filter".to_string(),
        })?;
    let matcher = Matcher::compile(spec)?;

    let rows = table
        .rows()
        .iter()
        .filter(|row| matcher.matches(&row[col]))
        .cloned()
        .collect();

    Ok(table.with_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> Table {
        let rows = [
            ["Alice", "30"],
            ["bob", "25"],
            ["ALINA", ""],
            ["Carl", "n/a"],
            ["  ", "40"],
        ];
        Table::new(
            vec!["name".into(), "age".into()],
            rows.iter()
                .map(|r| r.iter().map(|v| Cell::from(*v)).collect())
                .collect(),
        )
        .unwrap()
    }

    fn names(table: &Table) -> Vec<String> {
        table.rows().iter().map(|r| r[0].as_string()).collect()
    }

    #[test]
    fn test_text_conditions_case_insensitive() {
        let t = people();
        let r = filter_table(&t, &FilterSpec::new("name", FilterCondition::StartsWith, "al")).unwrap();
        assert_eq!(names(&r), vec!["Alice", "ALINA"]);

        let r = filter_table(&t, &FilterSpec::new("name", FilterCondition::Equals, "BOB")).unwrap();
        assert_eq!(names(&r), vec!["bob"]);

        let r = filter_table(&t, &FilterSpec::new("name", FilterCondition::EndsWith, "NA")).unwrap();
        assert_eq!(names(&r), vec!["ALINA"]);

        let r = filter_table(&t, &FilterSpec::new("name", FilterCondition::Contains, "li")).unwrap();
        assert_eq!(names(&r), vec!["Alice", "ALINA"]);
    }

    #[test]
    fn test_numeric_conditions_skip_non_numbers() {
        let t = people();
        let r = filter_table(&t, &FilterSpec::new("age", FilterCondition::GreaterThan, "26")).unwrap();
        assert_eq!(names(&r), vec!["Alice", "  "]);

        let r = filter_table(&t, &FilterSpec::new("age", FilterCondition::LessThan, "100")).unwrap();
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn test_not_empty() {
        let t = people();
        let r = filter_table(&t, &FilterSpec::new("name", FilterCondition::NotEmpty, "")).unwrap();
        assert_eq!(r.len(), 4);
        let r = filter_table(&t, &FilterSpec::new("age", FilterCondition::NotEmpty, "")).unwrap();
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn test_unknown_column() {
        let err = filter_table(&people(), &FilterSpec::new("email", FilterCondition::Equals, "x")).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownColumn { ref column, .. } if column == "email"));
    }

    #[test]
    fn test_non_numeric_threshold_rejected() {
        let err = filter_table(&people(), &FilterSpec::new("age", FilterCondition::GreaterThan, "old")).unwrap_err();
        assert!(matches!(err, ValidationError::NotNumeric { .. }));
    }

    #[test]
    fn test_condition_parse_and_label() {
        assert_eq!("greater".parse::<FilterCondition>().unwrap(), FilterCondition::GreaterThan);
        assert_eq!("starts-with".parse::<FilterCondition>().unwrap(), FilterCondition::StartsWith);
        assert_eq!(
            FilterSpec::new("age", FilterCondition::LessThan, "5").label(),
            "filter: age less_than 5"
        );
    }

    #[test]
    fn test_every_condition_compiles_to_its_kind() {
        let conditions = [
            FilterCondition::Equals,
            FilterCondition::Contains,
            FilterCondition::StartsWith,
            FilterCondition::EndsWith,
            FilterCondition::GreaterThan,
            FilterCondition::LessThan,
            FilterCondition::NotEmpty,
        ];
        for condition in conditions {
            let matcher = Matcher::compile(&FilterSpec::new("age", condition, "3")).unwrap();
            let kind_matches = match &matcher {
                Matcher::Number { .. } => condition.is_numeric(),
                Matcher::NotEmpty => condition == FilterCondition::NotEmpty,
                Matcher::Text { .. } => !condition.is_numeric() && condition != FilterCondition::NotEmpty,
            };
            assert!(kind_matches, "{} compiled to the wrong matcher", condition);
            let hit = match condition {
                FilterCondition::GreaterThan => "4",
                FilterCondition::LessThan => "2",
                _ => "3",
            };
            assert!(matcher.matches(&Cell::from(hit)), "{} should match '{}'", condition, hit);
        }
    }
}
