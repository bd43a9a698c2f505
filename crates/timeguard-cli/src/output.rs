//! Text and JSON output for CLI results
//!
//! Every command produces one serialisable value. `--json` prints its serde
//! form on stdout; otherwise a short human summary is printed. Errors go to
//! stderr in both modes.
//!
//! ## Exit Code Semantics
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success |
//! | 1 | Failure: an error, or no report could be generated |

use std::fmt::Write as _;
use std::io::Write;
use std::process;

use serde::Serialize;
use serde_json::json;

use timeguard_render::{BatchSummary, ReportOutcome};
use timeguard_store::{ReportEntry, StoreStatus};

use crate::Health;

// ============================================================================
// Exit Code
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl ExitCode {
    pub fn from_success(success: bool) -> Self {
        if success {
            ExitCode::Success
        } else {
            ExitCode::Failure
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Printer
// ============================================================================

pub struct Printer {
    json: bool,
}

impl Printer {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as JSON, or the text produced by `text`
    pub fn print<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
        let mut stdout = std::io::stdout().lock();
        if self.json {
            serde_json::to_writer_pretty(&mut stdout, value)?;
            writeln!(stdout)?;
        } else {
            writeln!(stdout, "{}", text())?;
        }
        Ok(())
    }

    pub fn error(&self, error: &anyhow::Error) {
        if self.json {
            let body = json!({ "success": false, "error": format!("{error:#}") });
            eprintln!("{body}");
        } else {
            eprintln!("Error: {error:#}");
        }
    }
}

// ============================================================================
// Text renderings
// ============================================================================

pub fn status_text(status: &StoreStatus) -> String {
    if !status.exists {
        return "No Excel file uploaded".to_string();
    }
    if let Some(error) = &status.error {
        return error.clone();
    }

    let yes_no = |flag: Option<bool>| if flag == Some(true) { "yes" } else { "no" };
    let mut out = String::new();
    let _ = writeln!(out, "Rows:      {}", status.rows.unwrap_or_default());
    let _ = writeln!(out, "Columns:   {}", status.columns_count.unwrap_or_default());
    let _ = writeln!(out, "User Name: {}", yes_no(status.has_user_name));
    let _ = writeln!(out, "EMP ID:    {}", yes_no(status.has_emp_id));
    if let Some(columns) = &status.columns {
        let _ = write!(out, "{}", columns.join(", "));
    }
    out
}

pub fn summary_text(summary: &BatchSummary) -> String {
    let mut out = summary.message.clone();
    for result in &summary.results {
        match result {
            ReportOutcome::Generated(report) => {
                let _ = write!(
                    out,
                    "\n  ok    {} ({} bytes)",
                    report.file_path.display(),
                    report.file_size
                );
            }
            ReportOutcome::Failed { filename, error, .. } => {
                let _ = write!(out, "\n  fail  {filename}: {error}");
            }
        }
    }
    out
}

pub fn outcome_text(outcome: &ReportOutcome) -> String {
    match outcome {
        ReportOutcome::Generated(report) => format!(
            "Generated {} for {} ({})",
            report.file_path.display(),
            report.employee_name,
            report.employee_id
        ),
        ReportOutcome::Failed { filename, error, .. } => format!("Failed to generate {filename}: {error}"),
    }
}

pub fn list_text(entries: &[ReportEntry]) -> String {
    if entries.is_empty() {
        return "No generated PDFs".to_string();
    }
    entries
        .iter()
        .map(|e| {
            format!(
                "{}  {:>9}  {}",
                e.created.format("%Y-%m-%d %H:%M:%S"),
                e.size,
                e.filename
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn health_text(health: &Health) -> String {
    let renderer = &health.renderer;
    format!(
        "Status:       {}\nRenderer:     {} {:.2}x{:.2}pt, {} columns\nOutput dir:   {} ({})\nConsolidated: {}",
        health.status,
        renderer.format,
        renderer.page_width,
        renderer.page_height,
        renderer.columns,
        health.output_dir.display(),
        if health.output_dir_exists { "exists" } else { "missing" },
        if health.consolidated_exists { "present" } else { "absent" },
    )
}
