//! Numeric sniffing for cells.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Cell;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid number regex")
});

/// Parse text as a decimal number. Surrounding whitespace is ignored;
/// blank text is not a number.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if !NUMBER_RE.is_match(trimmed) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Numeric value of a cell, if it has one.
pub fn cell_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Number(_) | Cell::Empty => None,
        Cell::Text(s) => parse_number(s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number(" -3.5 "), Some(-3.5));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("+7."), Some(7.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_cell_number() {
        assert_eq!(cell_number(&Cell::Number(2.0)), Some(2.0));
        assert_eq!(cell_number(&Cell::from("10")), Some(10.0));
        assert_eq!(cell_number(&Cell::Empty), None);
        assert_eq!(cell_number(&Cell::Number(f64::NAN)), None);
    }
}
