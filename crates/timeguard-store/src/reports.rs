//! Generated report directory: listing, lookup and deletion of PDFs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use timeguard_core::Config;

use crate::StoreError;

const MAX_FILENAME_LEN: usize = 255;

static SAFE_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9\s,\-_.()]+$").expect("valid filename pattern")
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
    pub created: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DeleteAllSummary {
    pub deleted_count: usize,
    pub deleted_files: Vec<String>,
}

/// The directory generated reports are written to
#[derive(Clone, Debug)]
pub struct ReportDirectory {
    dir: PathBuf,
}

impl ReportDirectory {
    pub fn new(config: &Config) -> Self {
        Self::at(config.resolved_output_dir())
    }

    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every PDF in the directory, newest first
    pub fn list(&self) -> Result<Vec<ReportEntry>, StoreError> {
        let mut entries = Vec::new();
        for path in self.pdf_paths()? {
            let meta = fs::metadata(&path).map_err(StoreError::io(&path))?;
            let created = meta.created().or_else(|_| meta.modified()).map_err(StoreError::io(&path))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            entries.push(ReportEntry {
                filename,
                path,
                size: meta.len(),
                created: created.into(),
            });
        }
        entries.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| a.filename.cmp(&b.filename)));
        Ok(entries)
    }

    fn pdf_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        let read = match fs::read_dir(&self.dir) {
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };
        let mut paths = Vec::new();
        for entry in read {
            let path = entry.map_err(StoreError::io(&self.dir))?.path();
            if path.is_file() && is_pdf(&path) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Resolve `filename` to an existing report inside the directory
    pub fn locate(&self, filename: &str) -> Result<PathBuf, StoreError> {
        let name = validate_filename(filename)?;
        let path = self.dir.join(name);
        if !path.is_file() {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let base = self.dir.canonicalize().map_err(StoreError::io(&self.dir))?;
        let resolved = path.canonicalize().map_err(StoreError::io(&path))?;
        if !resolved.starts_with(&base) {
            warn!(file = %name, "report resolves outside the output directory");
            return Err(StoreError::InvalidFilename(
                "Access denied. Path traversal detected".into(),
            ));
        }
        Ok(resolved)
    }

    pub fn delete(&self, filename: &str) -> Result<(), StoreError> {
        let path = self.locate(filename)?;
        fs::remove_file(&path).map_err(StoreError::io(&path))?;
        info!(file = %filename, "deleted report");
        Ok(())
    }

    /// Delete every PDF; failures are logged and skipped
    pub fn delete_all(&self) -> Result<DeleteAllSummary, StoreError> {
        let mut summary = DeleteAllSummary::default();
        for path in self.pdf_paths()? {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match fs::remove_file(&path) {
                Ok(()) => {
                    info!(file = %filename, "deleted report");
                    summary.deleted_files.push(filename);
                }
                Err(e) => warn!(file = %filename, error = %e, "failed to delete report"),
            }
        }
        summary.deleted_files.sort();
        summary.deleted_count = summary.deleted_files.len();
        Ok(summary)
    }
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Check that `filename` is a plain, safe `.pdf` basename
pub fn validate_filename(filename: &str) -> Result<&str, StoreError> {
    let invalid = |reason: &str| StoreError::InvalidFilename(reason.to_string());

    if filename.is_empty() {
        return Err(invalid("Filename cannot be empty"));
    }
    if filename.contains('\0') {
        return Err(invalid("Filename contains a null byte"));
    }
    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        return Err(invalid("Path traversal not allowed"));
    }
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(invalid("Allowed extensions: .pdf"));
    }
    if !SAFE_FILENAME.is_match(filename) {
        return Err(invalid("Contains unsafe characters"));
    }
    if filename.chars().count() > MAX_FILENAME_LEN {
        return Err(invalid("Filename too long"));
    }
    Ok(filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn filename_validation() {
        assert_eq!(validate_filename("Doe, John (2).pdf").unwrap(), "Doe, John (2).pdf");
        assert_eq!(validate_filename("report.PDF").unwrap(), "report.PDF");

        for bad in [
            "",
            "../secret.pdf",
            "a/b.pdf",
            "a\\b.pdf",
            "nul\0.pdf",
            "notes.txt",
            "semi;colon.pdf",
            "Müller.pdf",
        ] {
            assert!(
                matches!(validate_filename(bad), Err(StoreError::InvalidFilename(_))),
                "{bad:?}"
            );
        }

        let long = format!("{}.pdf", "a".repeat(252));
        assert!(validate_filename(&long).is_err());
        let max = format!("{}.pdf", "a".repeat(251));
        assert!(validate_filename(&max).is_ok());
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let reports = ReportDirectory::at(dir.path().join("absent"));
        assert!(reports.list().unwrap().is_empty());
        assert_eq!(reports.delete_all().unwrap(), DeleteAllSummary::default());
    }

    #[test]
    fn lists_only_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Doe, John.pdf"), b"%PDF-1.5").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let entries = ReportDirectory::at(dir.path()).list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].filename, "Doe, John.pdf");
        assert_eq!(entries[0].size, 8);
    }

    #[test]
    fn locate_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Roe, Ann.pdf"), b"%PDF").unwrap();
        let reports = ReportDirectory::at(dir.path());

        assert!(reports.locate("Roe, Ann.pdf").unwrap().is_file());
        assert!(matches!(reports.locate("Poe, Ed.pdf"), Err(StoreError::NotFound(_))));

        reports.delete("Roe, Ann.pdf").unwrap();
        assert!(!dir.path().join("Roe, Ann.pdf").exists());
        assert!(matches!(reports.delete("Roe, Ann.pdf"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn delete_all_keeps_other_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.pdf", "keep.xlsx"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let summary = ReportDirectory::at(dir.path()).delete_all().unwrap();
        assert_eq!(summary.deleted_count, 2);
        assert_eq!(summary.deleted_files, vec!["a.pdf", "b.pdf"]);
        assert!(dir.path().join("keep.xlsx").exists());
    }
}
