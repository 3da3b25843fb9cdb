//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use tally_core::{Date, EntryFilter, ScanConfig, Tag};

use crate::render::View;

/// Plain-text time log summarizer.
///
/// Reads logs made of `YYYY-MM-DD` date headers and `HH:MM-HH:MM` entry
/// lines, then totals the tracked time by tag, day, week or month.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarize one log file, or standard input when no file is given.
    Report {
        /// The log file to read.
        file: Option<PathBuf>,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Discover time logs under a directory and summarize them together.
    Scan {
        /// Directory (or single file) to scan.
        path: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        #[command(flatten)]
        report: ReportArgs,

        /// List each discovered file with its date source.
        #[arg(long)]
        list: bool,
    },

    /// Scan a path and store its entries in the database.
    Import {
        /// Directory (or single file) to import.
        path: PathBuf,

        #[command(flatten)]
        scan: ScanArgs,

        /// Reimport files even if they have not changed since the last import.
        #[arg(long)]
        force: bool,
    },

    /// Summarize entries stored in the database.
    Query {
        #[command(flatten)]
        report: ReportArgs,

        /// Only entries imported from files whose path contains this text.
        #[arg(long)]
        file: Option<String>,

        /// Only entries whose description contains this text.
        #[arg(long)]
        search: Option<String>,

        /// Maximum number of entries to load.
        #[arg(long)]
        limit: Option<usize>,

        /// Number of matching entries to skip.
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Show database statistics.
    Stats,

    /// Database maintenance.
    #[command(subcommand)]
    Db(DbAction),
}

/// Database maintenance actions.
#[derive(Debug, Subcommand)]
pub enum DbAction {
    /// Rebuild the database file, reclaiming free space.
    Vacuum,

    /// Write a copy of the database to a new file.
    Backup {
        /// Destination file; must not exist yet.
        path: PathBuf,
    },

    /// Forget recorded file modification times so the next import rereads everything.
    ClearCache,
}

/// Output format for the default (non-periodic) report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Csv,
    Json,
}

/// Report selection and filtering options.
#[derive(Debug, Clone, Default, Args)]
#[command(group(ArgGroup::new("period").args(["daily", "weekly", "monthly"])))]
pub struct ReportArgs {
    /// Summarize by day (overrides --format).
    #[arg(short, long)]
    pub daily: bool,

    /// Summarize by ISO week (overrides --format).
    #[arg(short, long)]
    pub weekly: bool,

    /// Summarize by month (overrides --format).
    #[arg(short, long)]
    pub monthly: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Only entries on or after this date (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<Date>,

    /// Only entries on or before this date (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<Date>,

    /// Only entries carrying this tag (with or without the leading #).
    #[arg(long)]
    pub tag: Option<Tag>,
}

impl ReportArgs {
    /// The report to render. Period flags take precedence over `--format`.
    pub const fn view(&self) -> View {
        if self.daily {
            View::Daily
        } else if self.weekly {
            View::Weekly
        } else if self.monthly {
            View::Monthly
        } else {
            match self.format {
                OutputFormat::Text => View::Tags,
                OutputFormat::Csv => View::Csv,
                OutputFormat::Json => View::Json,
            }
        }
    }

    pub fn filter(&self) -> EntryFilter {
        EntryFilter {
            from: self.from,
            to: self.to,
            tag: self.tag.clone(),
        }
    }
}

/// Directory scanning options. Unset options fall back to the configuration.
#[derive(Debug, Clone, Default, Args)]
pub struct ScanArgs {
    /// Descend into subdirectories.
    #[arg(short = 'R', long)]
    pub recursive: bool,

    /// Follow symbolic links while walking.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Infer dates for undated files from their file names.
    #[arg(long)]
    pub date_from_filename: bool,

    /// Infer dates for undated files from their directory names.
    #[arg(long)]
    pub date_from_path: bool,

    /// Maximum directory depth when recursing.
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Skip files larger than this many bytes.
    #[arg(long)]
    pub max_file_size: Option<u64>,

    /// Only consider files whose name contains this text (repeatable).
    #[arg(long = "include", value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Skip files whose path contains this text (repeatable).
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub exclude: Vec<String>,
}

impl ScanArgs {
    /// Layers these flags over `base`: switches can only turn options on,
    /// limits replace the configured ones, and patterns are appended.
    pub fn apply(&self, base: &ScanConfig) -> ScanConfig {
        let mut config = base.clone();
        config.recursive |= self.recursive;
        config.follow_symlinks |= self.follow_symlinks;
        config.date_from_filename |= self.date_from_filename;
        config.date_from_path |= self.date_from_path;
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(size) = self.max_file_size {
            config.max_file_size = size;
        }
        config.include_patterns.extend(self.include.iter().cloned());
        config.exclude_patterns.extend(self.exclude.iter().cloned());
        config
    }
}
