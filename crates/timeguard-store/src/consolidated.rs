//! The consolidated workbook: one standardised copy of the latest upload.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use timeguard_core::schema::{STANDARD_ID_COLUMN, STANDARD_NAME_COLUMN};
use timeguard_core::{detect_identifier_columns, Config, Table};

use crate::workbook::{read_first_sheet, table_from_grid, write_table};
use crate::StoreError;

/// Header rows tried, in order, when reading an uploaded workbook
const HEADER_ROW_CANDIDATES: [usize; 3] = [0, 1, 2];

/// Snapshot of the consolidated workbook
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_user_name: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_emp_id: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Owns the consolidated workbook under the data directory
#[derive(Clone, Debug)]
pub struct ConsolidatedStore {
    path: PathBuf,
    /// Upload limits and allowed extensions
    policy: Config,
}

impl ConsolidatedStore {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.consolidated_path(),
            policy: config.clone(),
        }
    }

    /// Location of the consolidated workbook
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check extension, emptiness and size of an upload; returns its size in bytes
    pub fn validate_upload(&self, path: &Path) -> Result<u64, StoreError> {
        if !self.policy.is_allowed_extension(path) {
            return Err(StoreError::UnsupportedExtension {
                allowed: self.policy.allowed_extensions.clone(),
            });
        }

        let size = fs::metadata(path).map_err(StoreError::io(path))?.len();
        if size == 0 {
            return Err(StoreError::EmptyFile);
        }
        if size > self.policy.max_file_size_bytes() {
            return Err(StoreError::TooLarge(self.policy.max_file_size_mb));
        }
        Ok(size)
    }

    /// Read the first worksheet, locating the header row among the first three.
    ///
    /// The first attempt with data and both identifier columns wins. When no
    /// attempt has identifiers, the identifier error of the first non-empty
    /// attempt is returned.
    pub fn read_table(path: &Path) -> Result<Table, StoreError> {
        let grid = read_first_sheet(path)?;

        let mut fallback: Option<Table> = None;
        for header_row in HEADER_ROW_CANDIDATES {
            let table = table_from_grid(&grid, header_row);
            if table.is_empty() {
                debug!(header_row, "no data below candidate header row");
                continue;
            }
            let identifiers = detect_identifier_columns(&table);
            if identifiers.name_found() && identifiers.id_found() {
                info!(
                    header_row,
                    rows = table.len(),
                    columns = table.columns().len(),
                    "read workbook"
                );
                return Ok(table);
            }
            debug!(header_row, "candidate header row lacks identifier columns");
            fallback.get_or_insert(table);
        }

        match fallback {
            Some(table) => {
                detect_identifier_columns(&table).require(&table)?;
                Ok(table)
            }
            None => Err(StoreError::NoData),
        }
    }

    /// Validate an upload, standardise it and replace the consolidated workbook
    pub fn ingest(&self, upload: &Path) -> Result<Table, StoreError> {
        let size = self.validate_upload(upload)?;
        info!(file = %upload.display(), bytes = size, "ingesting workbook");

        let table = standardize(Self::read_table(upload)?)?;

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(StoreError::io(dir))?;
        }
        write_table(&table, &self.path)?;
        info!(path = %self.path.display(), rows = table.len(), "saved consolidated workbook");
        Ok(table)
    }

    /// Load the consolidated workbook with standardised identifier columns
    pub fn load(&self) -> Result<Table, StoreError> {
        if !self.path.exists() {
            return Err(StoreError::NotUploaded);
        }
        let table = table_from_grid(&read_first_sheet(&self.path)?, 0);
        if table.is_empty() {
            return Err(StoreError::EmptyWorkbook);
        }
        let table = standardize(table)?;
        info!(rows = table.len(), "loaded consolidated workbook");
        Ok(table)
    }

    pub fn status(&self) -> StoreStatus {
        if !self.path.exists() {
            return StoreStatus::default();
        }
        match read_first_sheet(&self.path).map(|grid| table_from_grid(&grid, 0)) {
            Ok(table) => {
                let identifiers = detect_identifier_columns(&table);
                StoreStatus {
                    exists: true,
                    rows: Some(table.len()),
                    columns: Some(table.columns().to_vec()),
                    columns_count: Some(table.columns().len()),
                    has_user_name: Some(identifiers.name_found()),
                    has_emp_id: Some(identifiers.id_found()),
                    error: None,
                }
            }
            Err(e) => StoreStatus {
                exists: true,
                error: Some(format!("Error reading file: {e}")),
                ..StoreStatus::default()
            },
        }
    }

    /// Remove the consolidated workbook; false when there was none
    pub fn clear(&self) -> Result<bool, StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "removed consolidated workbook");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}

/// Rename the detected identifier columns to `User Name` / `EMP ID`
fn standardize(mut table: Table) -> Result<Table, StoreError> {
    let (name, id) = detect_identifier_columns(&table).require(&table)?;
    for (from, to) in [(name, STANDARD_NAME_COLUMN), (id, STANDARD_ID_COLUMN)] {
        if from == to {
            continue;
        }
        if table.column_index(to).is_some() {
            warn!(from = %from, to, "standard column name already taken, keeping original");
            continue;
        }
        table.rename_column(&from, to);
        info!(from = %from, to, "renamed identifier column");
    }
    Ok(table)
}
