//! Standard filters: employee-name initial, id prefix and billability type.
//!
//! Applied in that order; each filter that leaves no rows aborts the chain.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::{info, warn};

use timeguard_core::{detect_billability_column, CellValue, Table};

use crate::FilterError;

/// Billability type selected by the user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Billability {
    Billable,
    NonBillable,
}

impl Billability {
    /// Lowercase substring looked for in the billability column.
    ///
    /// `billable` is also contained in `non-billable`, so the billable filter
    /// keeps both kinds of row.
    pub fn needle(self) -> &'static str {
        match self {
            Self::Billable => "billable",
            Self::NonBillable => "non-billable",
        }
    }
}

impl fmt::Display for Billability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.needle())
    }
}

impl FromStr for Billability {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "billable" => Ok(Self::Billable),
            "non-billable" => Ok(Self::NonBillable),
            _ => Err(FilterError::UnknownBillability(s.trim().to_string())),
        }
    }
}

/// Up to three standard filters; `None` means the filter is off
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StandardFilters {
    pub name_prefix: Option<String>,
    pub id_prefix: Option<String>,
    pub billability: Option<Billability>,
}

impl StandardFilters {
    /// Normalise raw user input.
    ///
    /// Prefixes are trimmed and upper-cased, blanks are dropped, and a blank
    /// or `all` billability turns that filter off.
    pub fn prepare(name_prefix: &str, id_prefix: &str, billability: &str) -> Result<Self, FilterError> {
        let prefix = |raw: &str| {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_uppercase())
        };
        let billability = match billability.trim().to_lowercase().as_str() {
            "" | "all" => None,
            other => Some(other.parse()?),
        };
        Ok(Self {
            name_prefix: prefix(name_prefix),
            id_prefix: prefix(id_prefix),
            billability,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name_prefix.is_none() && self.id_prefix.is_none() && self.billability.is_none()
    }

    /// Parenthesised description used in batch summaries
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(name) = &self.name_prefix {
            parts.push(format!("name starting with '{name}'"));
        }
        if let Some(id) = &self.id_prefix {
            parts.push(format!("EMP ID starting with '{id}'"));
        }
        if let Some(billability) = self.billability {
            parts.push(format!("billability type '{billability}'"));
        }
        if parts.is_empty() {
            "(no filters applied - all employees included)".to_string()
        } else {
            format!("(filtered by {})", parts.join(", "))
        }
    }

    /// Apply the active filters in order name, id, billability
    pub fn apply(&self, table: &Table, name_column: usize, id_column: usize) -> Result<Table, FilterError> {
        let mut rows = table.clone();
        if let Some(prefix) = &self.name_prefix {
            rows = filter_by_name_prefix(&rows, name_column, prefix)?;
        }
        if let Some(prefix) = &self.id_prefix {
            rows = filter_by_id_prefix(&rows, id_column, prefix)?;
        }
        if let Some(billability) = self.billability {
            rows = filter_by_billability(&rows, billability)?;
        }
        Ok(rows)
    }
}

fn upper_text(cell: &CellValue) -> Option<String> {
    cell.to_text().map(|t| t.trim().to_uppercase())
}

/// Surname-first names ("Doe, John") are matched on the part after the comma
fn after_comma(name: &str) -> &str {
    name.split_once(',').map_or(name, |(_, given)| given).trim()
}

/// Keep employees whose name starts with `prefix`.
///
/// The text after the first comma is tried first; when that matches nothing
/// the whole name is tried once more.
pub fn filter_by_name_prefix(table: &Table, name_column: usize, prefix: &str) -> Result<Table, FilterError> {
    let prefix = prefix.trim().to_uppercase();
    let filtered = table.filter_rows(|row| {
        upper_text(&row[name_column]).is_some_and(|name| after_comma(&name).starts_with(&prefix))
    });
    info!(prefix = %prefix, before = table.len(), after = filtered.len(), "name filter (after comma)");
    if !filtered.is_empty() {
        return Ok(filtered);
    }

    info!("no match after comma, falling back to whole name");
    let filtered = table.filter_rows(|row| {
        upper_text(&row[name_column]).is_some_and(|name| name.starts_with(&prefix))
    });
    info!(prefix = %prefix, after = filtered.len(), "name filter (whole name)");
    if filtered.is_empty() {
        return Err(FilterError::NoMatches(format!("starting with '{prefix}'")));
    }
    Ok(filtered)
}

/// Keep rows whose id starts with `prefix`, ignoring case
pub fn filter_by_id_prefix(table: &Table, id_column: usize, prefix: &str) -> Result<Table, FilterError> {
    let prefix = prefix.trim().to_uppercase();
    let filtered = table.filter_rows(|row| {
        upper_text(&row[id_column]).is_some_and(|id| id.starts_with(&prefix))
    });
    info!(prefix = %prefix, before = table.len(), after = filtered.len(), "id filter");
    if filtered.is_empty() {
        return Err(FilterError::NoMatches(format!("with ID starting with '{prefix}'")));
    }
    Ok(filtered)
}

/// Keep rows whose billability column contains the selected type.
///
/// Without a billability column the table passes through unfiltered.
pub fn filter_by_billability(table: &Table, billability: Billability) -> Result<Table, FilterError> {
    let Some(column) = detect_billability_column(table) else {
        warn!(
            available = %table.columns().join(", "),
            "no billability column found, skipping billability filter"
        );
        return Ok(table.clone());
    };
    let idx = table.require_column(&column)?;
    let needle = billability.needle();
    let filtered = table.filter_rows(|row| {
        row[idx]
            .to_text()
            .is_some_and(|v| v.to_lowercase().contains(needle))
    });
    info!(column = %column, %billability, before = table.len(), after = filtered.len(), "billability filter");
    if filtered.is_empty() {
        return Err(FilterError::NoMatches(format!("with '{billability}' billability type")));
    }
    Ok(filtered)
}
