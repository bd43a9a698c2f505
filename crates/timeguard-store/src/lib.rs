//! # timeguard-store
//!
//! Persistence for timeguard.
//!
//! This crate provides:
//! - `ConsolidatedStore`: validates uploaded workbooks, detects the header row
//!   and keeps one standardised consolidated workbook
//! - `ReportDirectory`: lists, locates and deletes generated PDF reports
//! - `workbook`: calamine reading and rust_xlsxwriter writing
//!
//! ## Example
//!
//! ```rust,no_run
//! use timeguard_core::Config;
//! use timeguard_store::ConsolidatedStore;
//!
//! let store = ConsolidatedStore::new(&Config::default());
//! let table = store.ingest("export.xlsx".as_ref())?;
//! println!("{} rows", table.len());
//! # Ok::<(), timeguard_store::StoreError>(())
//! ```

pub mod consolidated;
pub mod reports;
pub mod workbook;

pub use consolidated::{ConsolidatedStore, StoreStatus};
pub use reports::{DeleteAllSummary, ReportDirectory, ReportEntry};

use std::path::PathBuf;

use thiserror::Error;
use timeguard_core::TableError;

/// Storage error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Only Excel files ({}) are allowed", allowed.join(", "))]
    UnsupportedExtension { allowed: Vec<String> },

    #[error("File is empty")]
    EmptyFile,

    #[error("File size must be less than {0}MB")]
    TooLarge(u64),

    #[error("Error reading Excel file {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Error writing Excel file {}: {message}", path.display())]
    Write { path: PathBuf, message: String },

    #[error("Could not read Excel file or no valid data found")]
    NoData,

    #[error("No Excel file available. Please upload an Excel file first.")]
    NotUploaded,

    #[error("Consolidated Excel file is empty")]
    EmptyWorkbook,

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("File not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
