//! # timeguard-core
//!
//! Core table model and column heuristics for the timeguard timesheet
//! reporting pipeline.
//!
//! This crate provides:
//! - Data types: `Table`, `CellValue`, `EmployeeGroup`
//! - The fixed 26-column report schema (`schema::REPORT_COLUMNS`)
//! - Fuzzy column resolution (`resolve_column`, `ColumnMapping`)
//! - Employee identifier and billability column detection
//! - Runtime configuration (`Config`)
//! - The `Renderer` trait and error types
//!
//! ## Example
//!
//! ```rust
//! use timeguard_core::{detect_identifier_columns, resolve_column, Table};
//!
//! let table = Table::new(["Date", "Employee_Name", "Emp ID", "Project"]);
//! assert_eq!(resolve_column("employee name", table.columns()), Some("Employee_Name"));
//!
//! let ids = detect_identifier_columns(&table);
//! assert_eq!(ids.name_column.as_deref(), Some("Employee_Name"));
//! assert_eq!(ids.id_column.as_deref(), Some("Emp ID"));
//! ```

pub mod config;
pub mod detect;
pub mod resolve;
pub mod schema;
pub mod table;
pub mod value;

pub use config::Config;
pub use detect::{
    detect_billability_column, detect_identifier_columns, require_identifier_columns,
    IdentifierColumns,
};
pub use resolve::{resolve_column, resolve_report_column, ColumnMapping, MappedColumn, MatchStrategy};
pub use table::{EmployeeGroup, Table};
pub use value::CellValue;

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Traits
// ============================================================================

/// Output rendering for one employee's rows
pub trait Renderer {
    type Output;

    /// Render a single employee group to the output format
    fn render(&self, group: &EmployeeGroup) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Table precondition error
#[derive(Debug, Error)]
pub enum TableError {
    #[error("{}", describe_missing_identifiers(similar_name, similar_id, available))]
    MissingIdentifierColumns {
        similar_name: Vec<String>,
        similar_id: Vec<String>,
        available: Vec<String>,
    },

    #[error("Column '{column}' not found. Available columns: {}", available.join(", "))]
    ColumnNotFound {
        column: String,
        available: Vec<String>,
    },

    #[error("No valid data found in table")]
    Empty,
}

fn describe_missing_identifiers(
    similar_name: &[String],
    similar_id: &[String],
    available: &[String],
) -> String {
    let mut msg = String::from("Excel must contain employee name and ID columns. ");
    if !similar_name.is_empty() {
        msg.push_str(&format!("Similar name columns found: {}. ", similar_name.join(", ")));
    }
    if !similar_id.is_empty() {
        msg.push_str(&format!("Similar ID columns found: {}. ", similar_id.join(", ")));
    }
    msg.push_str(&format!("Available columns: {}", available.join(", ")));
    msg
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_identifiers_message_lists_similar_columns() {
        let err = TableError::MissingIdentifierColumns {
            similar_name: vec!["Project Name".into()],
            similar_id: vec![],
            available: vec!["Date".into(), "Project Name".into()],
        };
        assert_eq!(
            err.to_string(),
            "Excel must contain employee name and ID columns. \
             Similar name columns found: Project Name. \
             Available columns: Date, Project Name"
        );
    }

    #[test]
    fn column_not_found_message() {
        let err = TableError::ColumnNotFound {
            column: "Nope".into(),
            available: vec!["A".into(), "B".into()],
        };
        assert_eq!(err.to_string(), "Column 'Nope' not found. Available columns: A, B");
    }

    #[test]
    fn render_error_display() {
        let err = RenderError::InvalidData("no columns".into());
        assert!(err.to_string().contains("no columns"));
    }
}
