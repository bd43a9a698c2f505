//! In-memory row set with named columns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{CellValue, TableError};

/// An ordered table of records.
///
/// Rows always have exactly `columns.len()` cells; shorter rows are padded
/// with [`CellValue::Empty`] on insertion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

/// Rows sharing one (name, id) pair
#[derive(Clone, Debug, PartialEq)]
pub struct EmployeeGroup {
    pub name: String,
    pub id: String,
    pub rows: Table,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from rows, padding or truncating each row to the header width
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<CellValue>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    /// Index of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Index of a column by exact name, or a `ColumnNotFound` error listing what exists
    pub fn require_column(&self, name: &str) -> Result<usize, TableError> {
        self.column_index(name)
            .ok_or_else(|| TableError::ColumnNotFound {
                column: name.to_string(),
                available: self.columns.clone(),
            })
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// All values of one column, in row order
    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().filter_map(move |r| r.get(column))
    }

    /// Keep the rows for which `keep` returns true, preserving order
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Drop rows whose every cell is blank
    pub fn drop_blank_rows(mut self) -> Table {
        self.rows.retain(|r| !r.iter().all(CellValue::is_blank));
        self
    }

    /// Rename a column in place; returns false when `from` does not exist
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Group rows by the string form of two key columns.
    ///
    /// Groups are ordered by key. Rows with an empty name or id cell are
    /// left out of every group.
    pub fn group_by_pair(&self, name_column: usize, id_column: usize) -> Vec<EmployeeGroup> {
        let mut groups: BTreeMap<(String, String), Vec<Vec<CellValue>>> = BTreeMap::new();
        for row in &self.rows {
            let name = row.get(name_column).and_then(CellValue::to_text);
            let id = row.get(id_column).and_then(CellValue::to_text);
            if let (Some(name), Some(id)) = (name, id) {
                groups.entry((name, id)).or_default().push(row.clone());
            }
        }

        groups
            .into_iter()
            .map(|((name, id), rows)| EmployeeGroup {
                name,
                id,
                rows: Table {
                    columns: self.columns.clone(),
                    rows,
                },
            })
            .collect()
    }
}
