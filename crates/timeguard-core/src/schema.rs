//! The fixed 26-column timesheet report layout.
//!
//! Header text, column order and design widths live in one array so the
//! header row and the data-row mapping can never drift apart.

/// One logical column of the report
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReportColumn {
    /// Logical header, also the name resolved against the input table
    pub header: &'static str,
    /// Design width in pixels, scaled to points by the renderer
    pub width_px: f32,
}

const fn col(header: &'static str, width_px: f32) -> ReportColumn {
    ReportColumn { header, width_px }
}

/// Number of logical report columns
pub const REPORT_COLUMN_COUNT: usize = 26;

/// Logical header whose numeric values are truncated to whole hours
pub const HOURS_HEADER: &str = "Regular Time (Hours)";

/// Canonical name given to the detected employee-name column on ingest
pub const STANDARD_NAME_COLUMN: &str = "User Name";

/// Canonical name given to the detected employee-id column on ingest
pub const STANDARD_ID_COLUMN: &str = "EMP ID";

pub const REPORT_COLUMNS: [ReportColumn; REPORT_COLUMN_COUNT] = [
    col("Date", 44.0),
    col("Month", 44.0),
    col("User Name", 54.0),
    col("EMP ID", 44.0),
    col("Email", 50.0),
    col("Resource Category", 50.0),
    col("User Resource Type", 50.0),
    col("DU Head", 54.0),
    col("DU", 44.0),
    col("PU", 62.0),
    col("BU", 44.0),
    col("SBU", 50.0),
    col("Project", 61.0),
    col("Project Code", 50.0),
    col("Project Manager", 50.0),
    col("Project Practice Owner", 48.0),
    col("Project Contract Type", 50.0),
    col("Project Type", 37.0),
    col("Project Billability Type", 62.0),
    col("Task", 56.0),
    col("Task Category", 48.0),
    col("Task Billability", 50.0),
    col("Tasks Payability", 50.0),
    col(HOURS_HEADER, 50.0),
    col("Timesheet Status", 48.0),
    col("Input Type Code", 50.0),
];

/// Iterate the logical headers in report order
pub fn report_headers() -> impl Iterator<Item = &'static str> {
    REPORT_COLUMNS.iter().map(|c| c.header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_unique() {
        let mut headers: Vec<_> = report_headers().collect();
        headers.sort_unstable();
        headers.dedup();
        assert_eq!(headers.len(), REPORT_COLUMN_COUNT);
    }

    #[test]
    fn total_design_width() {
        let total: f32 = REPORT_COLUMNS.iter().map(|c| c.width_px).sum();
        assert_eq!(total, 1300.0);
    }

    #[test]
    fn hours_column_position() {
        assert_eq!(REPORT_COLUMNS[23].header, HOURS_HEADER);
    }
}
