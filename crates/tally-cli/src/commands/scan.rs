//! Scan command: summarize every time log found under a directory.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tally_core::{ScanConfig, ScanResult, SpanPolicy, load_scan, scan_directory};

use crate::cli::ReportArgs;
use crate::render::{View, render};

/// Scans `root`, failing if nothing usable is found.
pub(crate) fn discover(root: &Path, config: &ScanConfig) -> Result<ScanResult> {
    let scan = scan_directory(root, config)
        .with_context(|| format!("failed to scan {}", root.display()))?;
    if scan.file_count() == 0 {
        bail!("No time log files found in {}", root.display());
    }
    Ok(scan)
}

fn write_manifest<W: Write>(writer: &mut W, scan: &ScanResult, list: bool) -> Result<()> {
    writeln!(
        writer,
        "Found {} time log files with {} total entries",
        scan.file_count(),
        scan.entries_total
    )?;
    let inferred = scan.files_with_inferred_dates();
    if inferred > 0 {
        writeln!(writer, "Files with inferred dates: {inferred}")?;
    }
    if list {
        for file in &scan.files {
            let date = file
                .initial_date()
                .map_or_else(|| "-".to_string(), |d| d.to_string());
            writeln!(
                writer,
                "  {} ({} entries, date {date} from {})",
                file.path.display(),
                file.entry_count,
                file.date_source
            )?;
        }
    }
    Ok(())
}

/// Scans `root`, parses each discovered file on its own and writes the
/// selected report over all of them.
///
/// The manifest summary is only written ahead of text reports, so CSV and
/// JSON output stays machine-readable.
pub fn run<W: Write>(
    writer: &mut W,
    root: &Path,
    config: &ScanConfig,
    args: &ReportArgs,
    policy: &SpanPolicy,
    list: bool,
) -> Result<()> {
    let scan = discover(root, config)?;
    let view = args.view();
    if !matches!(view, View::Csv | View::Json) {
        write_manifest(writer, &scan, list)?;
    }

    let loaded = load_scan(&scan, policy);
    let entries = args.filter().apply(&loaded.merged());
    render(writer, view, &entries)?;
    Ok(())
}
