//! Batch generation: one PDF per employee.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};

use timeguard_core::{
    require_identifier_columns, Config, EmployeeGroup, RenderError, Renderer, Table, TableError,
};
use timeguard_filter::{Selection, StandardFilters};

use crate::pdf::PdfRenderer;
use crate::BatchError;

/// A report that was written to disk
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeneratedReport {
    pub filename: String,
    pub file_path: PathBuf,
    pub employee_name: String,
    pub employee_id: String,
    pub file_size: u64,
}

/// Result of rendering one employee group
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportOutcome {
    Generated(GeneratedReport),
    Failed {
        filename: String,
        employee_name: String,
        employee_id: String,
        error: String,
    },
}

impl ReportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Generated(_))
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::Generated(report) => &report.filename,
            Self::Failed { filename, .. } => filename,
        }
    }
}

/// Aggregate result of a batch run
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub success: bool,
    pub message: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub files: Vec<GeneratedReport>,
    pub results: Vec<ReportOutcome>,
}

impl BatchSummary {
    fn from_results(results: Vec<ReportOutcome>, description: &str) -> Self {
        let files: Vec<GeneratedReport> = results
            .iter()
            .filter_map(|r| match r {
                ReportOutcome::Generated(report) => Some(report.clone()),
                ReportOutcome::Failed { .. } => None,
            })
            .collect();
        let total = results.len();
        let successful = files.len();
        Self {
            success: successful > 0,
            message: format!("Generated {successful}/{total} timesheet PDFs successfully {description}"),
            total,
            successful,
            failed: total - successful,
            files,
            results,
        }
    }
}

/// `<display name>.pdf`, with path separators replaced and whitespace kept
pub fn report_filename(display_name: &str) -> String {
    let safe: String = display_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    format!("{safe}.pdf")
}

/// Renders employee groups into an output directory
#[derive(Clone, Debug)]
pub struct BatchGenerator {
    renderer: PdfRenderer,
    output_dir: PathBuf,
}

impl BatchGenerator {
    pub fn new(config: &Config) -> Self {
        Self {
            renderer: PdfRenderer::from_config(config),
            output_dir: config.resolved_output_dir(),
        }
    }

    pub fn with_renderer(renderer: PdfRenderer, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            output_dir: output_dir.into(),
        }
    }

    pub fn renderer(&self) -> &PdfRenderer {
        &self.renderer
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render one group to `<output_dir>/<display name>.pdf`.
    ///
    /// Never fails: rendering and write errors are captured in the outcome.
    pub fn generate_report(&self, group: &EmployeeGroup) -> ReportOutcome {
        let filename = report_filename(&group.name);
        let file_path = self.output_dir.join(&filename);

        match self.write_report(group, &file_path) {
            Ok(file_size) => {
                info!(
                    employee = %group.name,
                    id = %group.id,
                    rows = group.rows.len(),
                    file = %filename,
                    bytes = file_size,
                    "generated report"
                );
                ReportOutcome::Generated(GeneratedReport {
                    filename,
                    file_path,
                    employee_name: group.name.clone(),
                    employee_id: group.id.clone(),
                    file_size,
                })
            }
            Err(e) => {
                error!(employee = %group.name, id = %group.id, error = %e, "report generation failed");
                ReportOutcome::Failed {
                    filename,
                    employee_name: group.name.clone(),
                    employee_id: group.id.clone(),
                    error: e.to_string(),
                }
            }
        }
    }

    fn write_report(&self, group: &EmployeeGroup, path: &Path) -> Result<u64, RenderError> {
        let bytes = self.renderer.render(group)?;
        fs::create_dir_all(&self.output_dir)?;
        fs::write(path, &bytes)?;
        Ok(fs::metadata(path)?.len())
    }

    /// Filter with the standard filters and render one report per employee
    pub fn generate_batch(&self, table: &Table, filters: &StandardFilters) -> Result<BatchSummary, BatchError> {
        self.run(table, &Selection::Standard(filters.clone()))
    }

    /// Resolve identifiers, apply `selection`, group by employee and render each group.
    ///
    /// Precondition and filter failures abort the run, as does a table with no
    /// rows or no employee with both a name and an id. A failing group is
    /// recorded and the remaining groups still render.
    pub fn run(&self, table: &Table, selection: &Selection) -> Result<BatchSummary, BatchError> {
        if table.is_empty() {
            return Err(TableError::Empty.into());
        }
        let (name_column, id_column) = require_identifier_columns(table)?;
        info!(
            name_column = %table.columns()[name_column],
            id_column = %table.columns()[id_column],
            "detected employee columns"
        );

        let selected = selection.apply(table, name_column, id_column)?;
        let groups = selected.group_by_pair(name_column, id_column);
        if groups.is_empty() {
            warn!(rows = selected.len(), "no row carries both an employee name and id");
            return Err(TableError::Empty.into());
        }
        info!(employees = groups.len(), rows = selected.len(), "rendering batch");

        let mut claimed: HashMap<String, String> = HashMap::new();
        let mut results = Vec::with_capacity(groups.len());
        for group in &groups {
            let filename = report_filename(&group.name);
            if let Some(previous) = claimed.insert(filename.clone(), group.id.clone()) {
                warn!(
                    file = %filename,
                    previous_id = %previous,
                    id = %group.id,
                    "display name shared by several ids, later report overwrites earlier"
                );
            }
            results.push(self.generate_report(group));
        }

        let summary = BatchSummary::from_results(results, &selection.describe());
        info!(
            total = summary.total,
            successful = summary.successful,
            failed = summary.failed,
            "batch finished"
        );
        Ok(summary)
    }

    /// Render the report of a single employee identified by name and id
    pub fn generate_single(&self, table: &Table, user_name: &str, emp_id: &str) -> Result<ReportOutcome, BatchError> {
        let (name_column, id_column) = require_identifier_columns(table)?;
        let (user_name, emp_id) = (user_name.trim(), emp_id.trim());
        let rows = table.filter_rows(|row| {
            row[name_column].to_text().as_deref() == Some(user_name)
                && row[id_column].to_text().as_deref() == Some(emp_id)
        });
        if rows.is_empty() {
            return Err(BatchError::EmployeeNotFound {
                name: user_name.to_string(),
                id: emp_id.to_string(),
            });
        }

        Ok(self.generate_report(&EmployeeGroup {
            name: user_name.to_string(),
            id: emp_id.to_string(),
            rows,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use timeguard_core::CellValue;

    fn generator(dir: &Path) -> BatchGenerator {
        BatchGenerator::with_renderer(PdfRenderer::new().logo_paths(vec![]), dir)
    }

    fn sheet() -> Table {
        Table::from_rows(
            ["User Name", "EMP ID", "Project", "Regular Time (Hours)"],
            vec![
                vec!["Doe, John".into(), "E100".into(), "Apollo".into(), 8.0.into()],
                vec!["Doe, John".into(), "E100".into(), "Bench".into(), 4.0.into()],
                vec!["Roe, Ann".into(), "E200".into(), "Zeus".into(), 7.0.into()],
                vec![CellValue::Empty, "E300".into(), "Zeus".into(), 1.0.into()],
            ],
        )
    }

    #[test]
    fn filename_replaces_separators() {
        assert_eq!(report_filename("Doe, John"), "Doe, John.pdf");
        assert_eq!(report_filename("a/b\\c"), "a_b_c.pdf");
        assert_eq!(report_filename(" Doe, John "), " Doe, John .pdf");
    }

    #[test]
    fn batch_renders_one_file_per_employee() {
        let dir = tempfile::tempdir().unwrap();
        let summary = generator(dir.path())
            .generate_batch(&sheet(), &StandardFilters::default())
            .unwrap();

        assert_eq!((summary.total, summary.successful, summary.failed), (2, 2, 0));
        assert!(summary.success);
        assert_eq!(
            summary.message,
            "Generated 2/2 timesheet PDFs successfully (no filters applied - all employees included)"
        );
        let names: Vec<_> = summary.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["Doe, John.pdf", "Roe, Ann.pdf"]);
        for file in &summary.files {
            assert!(file.file_path.is_file());
            assert_eq!(fs::metadata(&file.file_path).unwrap().len(), file.file_size);
        }
    }

    #[test]
    fn missing_identifiers_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::from_rows(["Project"], vec![vec!["Apollo".into()]]);
        let err = generator(dir.path())
            .generate_batch(&table, &StandardFilters::default())
            .unwrap_err();
        assert!(matches!(err, BatchError::Table(_)), "{err}");
    }

    #[test]
    fn empty_table_aborts_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::new(["User Name", "EMP ID"]);
        let err = generator(dir.path())
            .generate_batch(&table, &StandardFilters::default())
            .unwrap_err();
        assert!(matches!(err, BatchError::Table(TableError::Empty)), "{err}");
        assert_eq!(err.to_string(), "No valid data found in table");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn rows_without_employee_keys_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let table = Table::from_rows(
            ["User Name", "EMP ID", "Project"],
            vec![
                vec![CellValue::Empty, "E100".into(), "Apollo".into()],
                vec!["Roe, Ann".into(), CellValue::Empty, "Zeus".into()],
            ],
        );
        let err = generator(dir.path())
            .run(&table, &Selection::default())
            .unwrap_err();
        assert!(matches!(err, BatchError::Table(TableError::Empty)), "{err}");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn unwritable_output_is_recorded_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let summary = generator(&blocker)
            .generate_batch(&sheet(), &StandardFilters::default())
            .unwrap();
        assert_eq!((summary.total, summary.successful, summary.failed), (2, 0, 2));
        assert!(!summary.success);
        assert!(summary.results.iter().all(|r| !r.is_success()));
    }

    #[test]
    fn single_employee() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = generator(dir.path())
            .generate_single(&sheet(), "Roe, Ann", " E200 ")
            .unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.filename(), "Roe, Ann.pdf");

        let err = generator(dir.path())
            .generate_single(&sheet(), "Roe, Ann", "E100")
            .unwrap_err();
        assert_eq!(err.to_string(), "No data found for employee Roe, Ann (E100)");
    }
}
