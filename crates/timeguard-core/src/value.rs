//! Cell values held by a [`Table`](crate::Table).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single spreadsheet cell.
///
/// `Empty` plays the role of a missing value: it never matches a text
/// predicate and is skipped when rows are grouped by employee.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell, if it holds a finite number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// String coercion, `None` for empty cells
    pub fn to_text(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// True when the cell carries no visible content (empty or blank text)
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            other => other.is_empty(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

/// Integral values print without a fractional part (`8`, not `8.0`)
fn format_number(n: f64) -> String {
    if n.is_nan() {
        String::new()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_have_no_fraction() {
        assert_eq!(CellValue::Number(8.0).to_string(), "8");
        assert_eq!(CellValue::Number(-3.0).to_string(), "-3");
        assert_eq!(CellValue::Number(7.5).to_string(), "7.5");
    }

    #[test]
    fn empty_and_nan_coerce_to_none() {
        assert_eq!(CellValue::Empty.to_text(), None);
        assert_eq!(CellValue::Number(f64::NAN).to_text(), None);
        assert_eq!(CellValue::text("x").to_text(), Some("x".to_string()));
    }

    #[test]
    fn blank_text_is_blank_but_not_empty() {
        let cell = CellValue::text("   ");
        assert!(cell.is_blank());
        assert!(!cell.is_empty());
    }

    #[test]
    fn bool_display_matches_spreadsheet_casing() {
        assert_eq!(CellValue::Bool(true).to_string(), "True");
    }

    #[test]
    fn option_conversion() {
        assert_eq!(CellValue::from(None::<f64>), CellValue::Empty);
        assert_eq!(CellValue::from(Some("a")), CellValue::text("a"));
    }
}
