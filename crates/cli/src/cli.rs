use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "resultgrid", version, about = "Submit budget validation jobs and browse their results as tables")]
pub struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the job service is reachable.
    Health,
    /// List artifacts in the service's output directory.
    Files,
    /// Submit a validation job.
    #[command(subcommand)]
    Submit(SubmitCommand),
    /// Show the status of a job.
    Status {
        /// Job id.
        id: String,
    },
    /// Render a result as a table.
    Show(ShowArgs),
    /// Export a result view as CSV or the raw document as JSON.
    Export(ExportArgs),
    /// List or edit recently viewed jobs.
    Recent(RecentArgs),
}

#[derive(Debug, Subcommand)]
pub enum SubmitCommand {
    /// Compare budget prices against the SINAPI and SUDECAP banks.
    Prices(PriceArgs),
    /// Compare budget structure against the SINAPI and SUDECAP banks.
    Structure(StructureArgs),
}

#[derive(Debug, Args)]
pub struct InputFiles {
    /// Budget spreadsheet, as a path on the service host.
    #[arg(long, value_name = "PATH")]
    pub budget: String,
    /// SUDECAP price bank.
    #[arg(long, value_name = "PATH")]
    pub sudecap: String,
    /// SINAPI price bank.
    #[arg(long, value_name = "PATH")]
    pub sinapi: String,
    /// Output directory on the service host.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<String>,
    /// Wait for the job to finish and summarize its result.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Debug, Args)]
pub struct PriceArgs {
    #[command(flatten)]
    pub inputs: InputFiles,
    /// Relative price tolerance, e.g. 0.05.
    #[arg(long, value_name = "RATIO")]
    pub tolerance: Option<f64>,
    /// Skip description comparison.
    #[arg(long)]
    pub no_compare_descriptions: bool,
}

#[derive(Debug, Args)]
pub struct StructureArgs {
    #[command(flatten)]
    pub inputs: InputFiles,
}

/// Where the result document comes from.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Job id; waits for the job to finish before reading its result.
    #[arg(long, value_name = "ID")]
    pub job: Option<String>,
    /// Local JSON result document.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Dataset name; defaults to the largest dataset.
    #[arg(long, value_name = "NAME")]
    pub dataset: Option<String>,
    /// Case-insensitive substring filter over the displayed columns.
    #[arg(long, short, value_name = "TEXT")]
    pub query: Option<String>,
    /// Column to sort by.
    #[arg(long, value_name = "COLUMN")]
    pub sort: Option<String>,
    /// Sort descending.
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub view: ViewArgs,
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page; defaults to the configured page size.
    #[arg(long, value_name = "N")]
    pub page_size: Option<usize>,
    /// Cells wider than this are truncated.
    #[arg(long, default_value_t = 40, value_name = "CHARS")]
    pub max_width: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub view: ViewArgs,
    #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,
    /// Destination file, or `-` for stdout. Defaults to `<dataset>.csv` or `job_<id>.json`.
    #[arg(long, short, value_name = "PATH", conflicts_with = "clipboard")]
    pub output: Option<PathBuf>,
    /// Copy the export to the system clipboard.
    #[arg(long)]
    pub clipboard: bool,
}

#[derive(Debug, Args)]
#[group(multiple = false)]
pub struct RecentArgs {
    /// Forget one job.
    #[arg(long, value_name = "ID")]
    pub remove: Option<String>,
    /// Forget every job.
    #[arg(long)]
    pub clear: bool,
}
