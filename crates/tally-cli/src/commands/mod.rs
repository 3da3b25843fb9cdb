//! CLI subcommand implementations.

pub mod import;
pub mod maintenance;
pub mod query;
pub mod report;
pub mod scan;
pub mod stats;

/// Formats minutes as `<h>h <mm>m`.
pub(crate) fn format_minutes(minutes: u64) -> String {
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}
