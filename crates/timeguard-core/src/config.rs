//! Runtime configuration.
//!
//! A `Config` is built once (defaults, optionally a TOML file, then explicit
//! overrides) and handed to each component at construction.
//!
//! ```toml
//! data_dir = "/var/lib/timeguard"
//! max_file_size_mb = 20
//! logo_paths = ["/etc/timeguard/logo.png"]
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ConfigError;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the consolidated workbook
    pub data_dir: PathBuf,
    /// Directory receiving generated PDFs; `<data_dir>/output` when unset
    pub output_dir: Option<PathBuf>,
    pub consolidated_file_name: String,
    pub max_file_size_mb: u64,
    pub allowed_extensions: Vec<String>,
    /// Candidate logo images, first existing one is used
    pub logo_paths: Vec<PathBuf>,
    pub report_title: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            output_dir: None,
            consolidated_file_name: "Consolidated.xlsx".into(),
            max_file_size_mb: 50,
            allowed_extensions: vec![".xlsx".into(), ".xls".into()],
            logo_paths: vec![
                PathBuf::from("logo.png"),
                PathBuf::from("public/logo.png"),
                PathBuf::from("assets/logo.png"),
            ],
            report_title: "Admin Timesheet Report".into(),
            log_level: "info".into(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Override the data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Override the PDF output directory
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Replace the logo search list
    pub fn logo_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.logo_paths = paths;
        self
    }

    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("output"))
    }

    pub fn consolidated_path(&self) -> PathBuf {
        self.data_dir.join(&self.consolidated_file_name)
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }

    /// True when `path` carries one of the allowed extensions (case-insensitive)
    pub fn is_allowed_extension(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.allowed_extensions
            .iter()
            .any(|ext| name.ends_with(&ext.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.resolved_output_dir(), PathBuf::from("./data/output"));
        assert_eq!(config.consolidated_path(), PathBuf::from("./data/Consolidated.xlsx"));
        assert_eq!(config.max_file_size_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            data_dir = "/srv/tg"
            max_file_size_mb = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/tg"));
        assert_eq!(config.max_file_size_mb, 5);
        assert_eq!(config.report_title, "Admin Timesheet Report");
        assert_eq!(config.resolved_output_dir(), PathBuf::from("/srv/tg/output"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml_str("colour = \"blue\"").unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn explicit_output_dir_wins() {
        let config = Config::new().data_dir("/a").output_dir("/b");
        assert_eq!(config.resolved_output_dir(), PathBuf::from("/b"));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let config = Config::default();
        assert!(config.is_allowed_extension(Path::new("Export.XLSX")));
        assert!(config.is_allowed_extension(Path::new("old.xls")));
        assert!(!config.is_allowed_extension(Path::new("data.csv")));
    }

    #[test]
    fn load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/timeguard.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
