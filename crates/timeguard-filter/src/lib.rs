//! # timeguard-filter
//!
//! Row selection for the timeguard report pipeline.
//!
//! This crate provides:
//! - Custom conditions: `contains`, `starts with` and `==` shorthands plus a
//!   boolean expression language (pest grammar)
//! - Standard filters: name initial, id prefix, billability type
//! - `Selection`, the exclusive choice between the two
//!
//! ## Example
//!
//! ```rust
//! use timeguard_core::{CellValue, Table};
//! use timeguard_filter::apply_custom_condition;
//!
//! let table = Table::from_rows(
//!     ["User Name", "EMP ID"],
//!     vec![
//!         vec!["Doe, John".into(), "E100".into()],
//!         vec!["Roe, Ann".into(), "X200".into()],
//!     ],
//! );
//! let kept = apply_custom_condition(&table, "emp id starts with e1").unwrap();
//! assert_eq!(kept.len(), 1);
//! assert_eq!(kept.cell(0, 0), Some(&CellValue::text("Doe, John")));
//! ```

pub mod condition;
pub mod expr;
pub mod standard;

pub use condition::{apply_custom_condition, Condition, Shorthand};
pub use expr::{CompareOp, Expr, Operand};
pub use standard::{Billability, StandardFilters};

use serde::Serialize;
use thiserror::Error;
use timeguard_core::{Table, TableError};

// ============================================================================
// Selection
// ============================================================================

/// Which rows of a table take part in a batch.
///
/// A custom condition and the standard filters are mutually exclusive.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Custom { condition: String },
    Standard(StandardFilters),
}

impl Default for Selection {
    fn default() -> Self {
        Self::Standard(StandardFilters::default())
    }
}

impl Selection {
    pub fn custom(condition: impl Into<String>) -> Self {
        Self::Custom {
            condition: condition.into(),
        }
    }

    /// Apply the selection to `table`, whose identifier columns sit at the given indices
    pub fn apply(&self, table: &Table, name_column: usize, id_column: usize) -> Result<Table, FilterError> {
        match self {
            Self::Custom { condition } => apply_custom_condition(table, condition),
            Self::Standard(filters) => filters.apply(table, name_column, id_column),
        }
    }

    /// Parenthesised description used in batch summaries
    pub fn describe(&self) -> String {
        match self {
            Self::Custom { condition } if !condition.trim().is_empty() => {
                format!("(custom condition: '{}')", condition.trim())
            }
            Self::Custom { .. } => StandardFilters::default().describe(),
            Self::Standard(filters) => filters.describe(),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Filtering error
#[derive(Debug, Error)]
pub enum FilterError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Invalid '{keyword}' condition format. Use: 'Column Name {keyword} value'")]
    InvalidFormat { keyword: &'static str },

    #[error(
        "Could not parse custom condition '{condition}'. Try formats like: \
         'User Name contains John' or 'EMP ID starts with E' or 'Project == IT Project'. \
         Error: line {line}, column {column}: {message}"
    )]
    Syntax {
        condition: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Custom condition '{0}' resulted in 0 rows. No PDFs will be generated.")]
    EmptyResult(String),

    #[error("No employees found {0}")]
    NoMatches(String),

    #[error("Unknown billability filter '{0}'. Use 'all', 'billable' or 'non-billable'")]
    UnknownBillability(String),
}

/// Column lookup shared by the shorthand and expression paths
pub(crate) fn resolve_or_fail(table: &Table, desired: &str) -> Result<usize, FilterError> {
    timeguard_core::resolve_column(desired, table.columns())
        .and_then(|actual| table.column_index(actual))
        .ok_or_else(|| {
            TableError::ColumnNotFound {
                column: desired.to_string(),
                available: table.columns().to_vec(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn selection_descriptions() {
        assert_eq!(
            Selection::custom(" Project == Bench ").describe(),
            "(custom condition: 'Project == Bench')"
        );
        assert_eq!(
            Selection::default().describe(),
            "(no filters applied - all employees included)"
        );
    }

    #[test]
    fn invalid_format_message() {
        let err = FilterError::InvalidFormat { keyword: "contains" };
        assert_eq!(
            err.to_string(),
            "Invalid 'contains' condition format. Use: 'Column Name contains value'"
        );
    }

    #[test]
    fn unresolved_column_lists_available() {
        let table = Table::new(["Date", "Project"]);
        let err = resolve_or_fail(&table, "Nope").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Column 'Nope' not found. Available columns: Date, Project"
        );
    }
}
