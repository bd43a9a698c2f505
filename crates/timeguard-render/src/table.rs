//! Report table derivation: one employee's rows projected onto the fixed
//! report columns.

use tracing::debug;

use timeguard_core::schema::{ReportColumn, HOURS_HEADER, REPORT_COLUMNS};
use timeguard_core::{CellValue, ColumnMapping, RenderError, Table};

/// Header plus body rows, every row exactly `REPORT_COLUMNS.len()` cells wide
#[derive(Clone, Debug, PartialEq)]
pub struct ReportTable {
    pub columns: &'static [ReportColumn],
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    /// Project `rows` through `mapping`, which must have been computed for
    /// a table with the same columns.
    pub fn build(rows: &Table, mapping: &ColumnMapping) -> Result<Self, RenderError> {
        if mapping.is_fully_unmapped() {
            return Err(RenderError::InvalidData("No table data created".into()));
        }
        debug!(
            mapped = mapping.mapped_count(),
            unmapped = ?mapping.unmapped_headers(),
            "report column mapping"
        );

        let body = rows
            .rows()
            .iter()
            .map(|row| {
                mapping
                    .columns()
                    .iter()
                    .map(|mapped| {
                        mapped
                            .source
                            .and_then(|idx| row.get(idx))
                            .map(|cell| cell_text(mapped.column.header, cell))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Ok(Self {
            columns: &REPORT_COLUMNS,
            rows: body,
        })
    }

    pub fn headers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|c| c.header)
    }

    /// Rows including the header row
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }
}

/// Hours are shown as whole numbers (truncated); everything else as text
fn cell_text(header: &str, cell: &CellValue) -> String {
    match cell {
        CellValue::Number(n) if header == HOURS_HEADER && n.is_finite() => {
            format!("{}", n.trunc() as i64)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cells_follow_report_order() {
        let rows = Table::from_rows(
            ["Regular Time (Hours)", "emp id", "User Name", "Extra"],
            vec![vec![7.9.into(), 1001.0.into(), "Doe, John".into(), "x".into()]],
        );
        let table = ReportTable::build(&rows, &ColumnMapping::for_table(&rows)).unwrap();

        assert_eq!(table.row_count(), 2);
        let row = &table.rows[0];
        assert_eq!(row.len(), REPORT_COLUMNS.len());
        assert_eq!(row[2], "Doe, John");
        assert_eq!(row[3], "1001");
        assert_eq!(row[23], "7");
        assert_eq!(row[4], "");
    }

    #[test]
    fn hours_text_is_left_alone() {
        assert_eq!(cell_text(HOURS_HEADER, &CellValue::text("7.5 h")), "7.5 h");
        assert_eq!(cell_text("Task", &CellValue::Number(7.5)), "7.5");
        assert_eq!(cell_text(HOURS_HEADER, &CellValue::Number(-0.5)), "0");
    }

    #[test]
    fn nothing_mapped_is_an_error() {
        let rows = Table::from_rows(["zzz"], vec![vec!["a".into()]]);
        let err = ReportTable::build(&rows, &ColumnMapping::for_table(&rows)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid data: No table data created");
    }
}
