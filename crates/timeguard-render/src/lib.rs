//! # timeguard-render
//!
//! Per-employee timesheet reports.
//!
//! This crate provides:
//! - `PdfRenderer`: paginated landscape PDF with the fixed 26-column table
//! - `ReportTable`: a group's rows projected onto the report columns
//! - `BatchGenerator`: filter, group by employee, render one file each
//!
//! ## Example
//!
//! ```rust,no_run
//! use timeguard_core::Config;
//! use timeguard_filter::StandardFilters;
//! use timeguard_render::BatchGenerator;
//! # fn load() -> timeguard_core::Table { unimplemented!() }
//!
//! let config = Config::default().output_dir("/tmp/reports");
//! let filters = StandardFilters::prepare("A", "", "billable")?;
//! let summary = BatchGenerator::new(&config).generate_batch(&load(), &filters)?;
//! println!("{}", summary.message);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod metrics;
pub mod pdf;
pub mod table;

pub use batch::{report_filename, BatchGenerator, BatchSummary, GeneratedReport, ReportOutcome};
pub use pdf::{PdfRenderer, RendererInfo};
pub use table::ReportTable;

use thiserror::Error;
use timeguard_core::TableError;
use timeguard_filter::FilterError;

/// Batch-level error; per-employee failures are reported in the summary instead
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("No data found for employee {name} ({id})")]
    EmployeeNotFound { name: String, id: String },
}
