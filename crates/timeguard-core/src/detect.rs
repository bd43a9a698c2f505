//! Detection of the employee-name, employee-id and billability columns.
//!
//! Each detector is two-phase: an ordered list of regular expressions is
//! tried against the lowercased headers (first pattern with any hit wins,
//! first column in table order within that pattern), then a list of common
//! literal names is looked up through [`resolve_column`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::resolve::resolve_column;
use crate::{Table, TableError};

/// Ordered patterns plus literal fallbacks for one kind of column
struct ColumnDetector {
    patterns: Vec<Regex>,
    literals: &'static [&'static str],
}

impl ColumnDetector {
    fn new(patterns: &[&str], literals: &'static [&'static str]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|p| Regex::new(&format!("(?i){p}")).expect("detector pattern is valid"))
                .collect(),
            literals,
        }
    }

    fn detect(&self, columns: &[String]) -> Option<String> {
        let by_pattern = self.patterns.iter().find_map(|pattern| {
            columns
                .iter()
                .find(|col| pattern.is_match(&col.trim().to_lowercase()))
        });
        if let Some(col) = by_pattern {
            return Some(col.clone());
        }

        self.literals
            .iter()
            .find_map(|literal| resolve_column(literal, columns))
            .map(str::to_string)
    }
}

static NAME_DETECTOR: Lazy<ColumnDetector> = Lazy::new(|| {
    ColumnDetector::new(
        &[
            r"user\s*name",
            r"employee\s*name",
            r"full\s*name",
            r"name",
            r"resource\s*name",
            r"staff\s*name",
            r"person\s*name",
        ],
        &["User Name", "Employee Name", "Full Name", "Name"],
    )
});

static ID_DETECTOR: Lazy<ColumnDetector> = Lazy::new(|| {
    ColumnDetector::new(
        &[
            r"emp\s*id",
            r"employee\s*id",
            r"emp\s*number",
            r"staff\s*id",
            r"resource\s*id",
            r"person\s*id",
            r"employee\s*number",
        ],
        &["EMP ID", "Employee ID", "Emp ID", "Employee Number"],
    )
});

static BILLABILITY_DETECTOR: Lazy<ColumnDetector> = Lazy::new(|| {
    ColumnDetector::new(
        &[r"billability", r"billing\s*type", r"billable", r"chargeable"],
        &[
            "Project Billability Type",
            "Project Billability",
            "Billability",
            "Task Billability",
            "Billability Type",
            "Billable",
        ],
    )
});

/// Detected employee identifier columns
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IdentifierColumns {
    pub name_column: Option<String>,
    pub id_column: Option<String>,
}

impl IdentifierColumns {
    pub fn name_found(&self) -> bool {
        self.name_column.is_some()
    }

    pub fn id_found(&self) -> bool {
        self.id_column.is_some()
    }

    /// Both columns, or a precondition error describing what the table offers
    pub fn require(&self, table: &Table) -> Result<(String, String), TableError> {
        match (&self.name_column, &self.id_column) {
            (Some(name), Some(id)) => Ok((name.clone(), id.clone())),
            _ => Err(missing_identifiers(table)),
        }
    }
}

/// Locate the employee-name and employee-id columns of `table`
pub fn detect_identifier_columns(table: &Table) -> IdentifierColumns {
    IdentifierColumns {
        name_column: NAME_DETECTOR.detect(table.columns()),
        id_column: ID_DETECTOR.detect(table.columns()),
    }
}

/// Locate the billability column of `table`, independent of the identifiers
pub fn detect_billability_column(table: &Table) -> Option<String> {
    BILLABILITY_DETECTOR.detect(table.columns())
}

/// Detect both identifier columns and return their indices, or fail
pub fn require_identifier_columns(table: &Table) -> Result<(usize, usize), TableError> {
    let (name, id) = detect_identifier_columns(table).require(table)?;
    Ok((table.require_column(&name)?, table.require_column(&id)?))
}

fn missing_identifiers(table: &Table) -> TableError {
    let columns = table.columns();
    let similar_name = columns
        .iter()
        .filter(|c| c.to_lowercase().contains("name"))
        .take(5)
        .cloned()
        .collect();
    let similar_id = columns
        .iter()
        .filter(|c| {
            let lower = c.to_lowercase();
            lower.contains("id") || lower.contains("number")
        })
        .take(5)
        .cloned()
        .collect();

    TableError::MissingIdentifierColumns {
        similar_name,
        similar_id,
        available: columns.iter().take(20).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn detect(columns: &[&str]) -> IdentifierColumns {
        detect_identifier_columns(&Table::new(columns.iter().copied()))
    }

    #[test]
    fn detects_standard_headers() {
        let found = detect(&["Date", "User Name", "EMP ID", "Project"]);
        assert_eq!(found.name_column.as_deref(), Some("User Name"));
        assert_eq!(found.id_column.as_deref(), Some("EMP ID"));
    }

    #[test]
    fn earlier_pattern_beats_earlier_column() {
        // "name" alone would hit "Project Name" first, but "employee\s*name" is tried before it
        let found = detect(&["Project Name", "Employee Name", "Employee ID"]);
        assert_eq!(found.name_column.as_deref(), Some("Employee Name"));
    }

    #[test]
    fn id_variants() {
        assert_eq!(detect(&["EmpNumber"]).id_column.as_deref(), Some("EmpNumber"));
        assert_eq!(detect(&["Staff ID"]).id_column.as_deref(), Some("Staff ID"));
    }

    #[test]
    fn literal_fallback_uses_resolver() {
        // No pattern matches "emp-id" (hyphen), the resolver normalizes it
        let found = detect(&["emp-id"]);
        assert_eq!(found.id_column.as_deref(), Some("emp-id"));
    }

    #[test]
    fn missing_columns_report_both_flags_false() {
        let found = detect(&["Date", "Project", "Hours"]);
        assert!(!found.name_found());
        assert!(!found.id_found());
    }

    #[test]
    fn require_lists_available_columns() {
        let table = Table::new(["Date", "Project Name", "Hours"]);
        let err = detect_identifier_columns(&table).require(&table).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Project Name"), "{msg}");
        assert!(msg.contains("Available columns: Date, Project Name, Hours"), "{msg}");
    }

    #[test]
    fn billability_detection() {
        let table = Table::new(["Project", "Project Billability Type", "Task Billability"]);
        assert_eq!(
            detect_billability_column(&table).as_deref(),
            Some("Project Billability Type")
        );
        let table = Table::new(["Chargeable?"]);
        assert_eq!(detect_billability_column(&table).as_deref(), Some("Chargeable?"));
        let table = Table::new(["Date", "Hours"]);
        assert_eq!(detect_billability_column(&table), None);
    }
}
