//! timeguard CLI - timesheet ingest and per-employee PDF reports
//!
//! Command-line interface for loading timesheet exports, filtering them and
//! rendering one PDF report per employee.

mod output;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use timeguard_core::Config;
use timeguard_filter::{Selection, StandardFilters};
use timeguard_render::BatchGenerator;
use timeguard_store::{ConsolidatedStore, ReportDirectory};

use crate::output::{ExitCode, Printer};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "timeguard.toml";

#[derive(Parser)]
#[command(name = "timeguard")]
#[command(author, version, about = "Timesheet ingest and per-employee PDF reports", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (TOML)
    #[arg(long, env = "TIMEGUARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the consolidated workbook
    #[arg(long, env = "TIMEGUARD_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Directory receiving generated PDFs
    #[arg(long, env = "TIMEGUARD_OUTPUT_DIR", global = true)]
    output_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an Excel export and store it as the consolidated workbook
    Ingest {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Show the consolidated workbook status
    Status,

    /// Remove the consolidated workbook
    Clear,

    /// Generate one PDF per employee
    Generate {
        /// Ingest this workbook first instead of using the consolidated one
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Keep employees whose given name starts with this letter
        #[arg(long, value_name = "LETTER")]
        name_starts_with: Option<String>,

        /// Keep employees whose id starts with this prefix
        #[arg(long, value_name = "PREFIX")]
        id_starts_with: Option<String>,

        /// all, billable or non-billable
        #[arg(long, value_name = "TYPE")]
        billability: Option<String>,

        /// Custom row condition, e.g. "Project == Apollo"
        #[arg(
            short,
            long,
            conflicts_with_all = ["name_starts_with", "id_starts_with", "billability"]
        )]
        condition: Option<String>,
    },

    /// Generate the report of one employee
    Single {
        #[arg(long)]
        name: String,

        #[arg(long)]
        id: String,
    },

    /// List generated reports, newest first
    List,

    /// Print the full path of a generated report
    Path {
        #[arg(value_name = "FILENAME")]
        filename: String,
    },

    /// Delete a generated report
    Delete {
        #[arg(value_name = "FILENAME")]
        filename: String,
    },

    /// Delete every generated report
    DeleteAll,

    /// Show renderer and directory health
    Health,
}

fn main() -> process::ExitCode {
    let cli = Cli::parse();

    let config = load_config(&cli);
    let log_level = config
        .as_ref()
        .map_or_else(|_| Config::default().log_level, |c| c.log_level.clone());
    init_tracing(cli.verbose, &log_level);

    let printer = Printer::new(cli.json);
    let result = config.and_then(|config| run(cli.command, &config, &printer));
    match result {
        Ok(code) => code.into(),
        Err(e) => {
            printer.error(&e);
            ExitCode::Failure.into()
        }
    }
}

/// Log level for a `-v` count; without `-v` the configured level applies
fn verbosity_level(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8, configured: &str) {
    let level = verbosity_level(verbose, configured);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Defaults, then the config file, then directory overrides
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Config::load(Path::new(DEFAULT_CONFIG_FILE))?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config = config.data_dir(dir);
    }
    if let Some(dir) = &cli.output_dir {
        config = config.output_dir(dir);
    }
    Ok(config)
}

fn run(command: Commands, config: &Config, printer: &Printer) -> Result<ExitCode> {
    let store = ConsolidatedStore::new(config);
    let reports = ReportDirectory::new(config);

    match command {
        Commands::Ingest { file } => {
            let table = store
                .ingest(&file)
                .with_context(|| format!("Error processing Excel file {}", file.display()))?;
            let ingested = Ingested {
                path: store.path().to_path_buf(),
                rows: table.len(),
                columns: table.columns().to_vec(),
            };
            printer.print(&ingested, || {
                format!(
                    "Ingested {} rows ({} columns) into {}",
                    ingested.rows,
                    ingested.columns.len(),
                    ingested.path.display()
                )
            })?;
        }

        Commands::Status => {
            let status = store.status();
            printer.print(&status, || output::status_text(&status))?;
            if status.error.is_some() {
                return Ok(ExitCode::Failure);
            }
        }

        Commands::Clear => {
            let removed = store.clear().context("Error clearing Excel file")?;
            let message = if removed {
                "Excel file cleared successfully"
            } else {
                "No Excel file to clear"
            };
            printer.print(&Cleared { removed, message }, || message.to_string())?;
        }

        Commands::Generate {
            file,
            name_starts_with,
            id_starts_with,
            billability,
            condition,
        } => {
            let table = match file {
                Some(file) => store
                    .ingest(&file)
                    .with_context(|| format!("Error processing Excel file {}", file.display()))?,
                None => store.load()?,
            };
            let selection = match condition.filter(|c| !c.trim().is_empty()) {
                Some(condition) => Selection::custom(condition),
                None => Selection::Standard(StandardFilters::prepare(
                    name_starts_with.as_deref().unwrap_or_default(),
                    id_starts_with.as_deref().unwrap_or_default(),
                    billability.as_deref().unwrap_or("all"),
                )?),
            };
            debug!(?selection, rows = table.len(), "generating reports");

            let summary = BatchGenerator::new(config).run(&table, &selection)?;
            printer.print(&summary, || output::summary_text(&summary))?;
            return Ok(ExitCode::from_success(summary.success));
        }

        Commands::Single { name, id } => {
            let table = store.load()?;
            let outcome = BatchGenerator::new(config).generate_single(&table, &name, &id)?;
            printer.print(&outcome, || output::outcome_text(&outcome))?;
            return Ok(ExitCode::from_success(outcome.is_success()));
        }

        Commands::List => {
            let entries = reports.list()?;
            printer.print(&entries, || output::list_text(&entries))?;
        }

        Commands::Path { filename } => {
            let path = reports.locate(&filename)?;
            printer.print(&path, || path.display().to_string())?;
        }

        Commands::Delete { filename } => {
            reports.delete(&filename)?;
            let message = format!("Deleted {filename}");
            printer.print(&Deleted { filename: &filename }, || message)?;
        }

        Commands::DeleteAll => {
            let summary = reports.delete_all()?;
            info!(deleted = summary.deleted_count, "deleted all reports");
            printer.print(&summary, || format!("Deleted {} PDF files", summary.deleted_count))?;
        }

        Commands::Health => {
            let generator = BatchGenerator::new(config);
            let health = Health {
                status: "healthy",
                renderer: generator.renderer().describe(),
                output_dir: generator.output_dir().to_path_buf(),
                output_dir_exists: generator.output_dir().is_dir(),
                consolidated_exists: store.path().is_file(),
            };
            printer.print(&health, || output::health_text(&health))?;
        }
    }

    Ok(ExitCode::Success)
}

#[derive(Serialize)]
struct Ingested {
    path: PathBuf,
    rows: usize,
    columns: Vec<String>,
}

#[derive(Serialize)]
struct Cleared {
    removed: bool,
    message: &'static str,
}

#[derive(Serialize)]
struct Deleted<'a> {
    filename: &'a str,
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    renderer: timeguard_render::RendererInfo,
    output_dir: PathBuf,
    output_dir_exists: bool,
    consolidated_exists: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn verbosity_overrides_configured_level() {
        assert_eq!(verbosity_level(0, "warn"), "warn");
        assert_eq!(verbosity_level(1, "warn"), "info");
        assert_eq!(verbosity_level(2, "warn"), "debug");
        assert_eq!(verbosity_level(3, "warn"), "trace");
        assert_eq!(verbosity_level(7, "warn"), "trace");
    }

    #[test]
    fn verbose_flag_is_counted() {
        let cli = Cli::try_parse_from(["timeguard", "-vv", "status"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
