//! Import command: store scanned entries in the database.

use std::io::Write;
use std::path::Path;
use std::time::UNIX_EPOCH;

use anyhow::Result;
use tally_core::scan::load_file;
use tally_core::{ScanConfig, SpanPolicy};
use tally_db::{Database, ImportStats};

use super::scan::discover;

/// Modification time in Unix seconds, if the platform reports one.
fn modified_secs(path: &Path) -> Option<i64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let secs = modified.duration_since(UNIX_EPOCH).ok()?.as_secs();
    i64::try_from(secs).ok()
}

/// Scans `root` and imports each discovered file in its own transaction.
///
/// Files whose modification time matches the last import are skipped unless
/// `force` is set. Files that cannot be read back are logged and skipped.
pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    root: &Path,
    config: &ScanConfig,
    policy: &SpanPolicy,
    force: bool,
) -> Result<()> {
    let scan = discover(root, config)?;

    let mut totals = ImportStats::default();
    let mut imported_files = 0;
    let mut unchanged_files = 0;
    for info in &scan.files {
        let key = info.path.to_string_lossy();
        let modified = modified_secs(&info.path);
        let cached = match modified {
            Some(modified) if !force => db.is_file_cached(&key, modified)?,
            _ => false,
        };
        if cached {
            tracing::debug!(path = ?info.path, "unchanged since last import");
            unchanged_files += 1;
            continue;
        }

        let loaded = match load_file(info, policy) {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::warn!(path = ?info.path, error = %err, "skipping unreadable file");
                continue;
            }
        };
        totals += db.import_entries(&key, &loaded.entries)?;
        if let Some(modified) = modified {
            db.record_file_scan(&key, modified)?;
        }
        imported_files += 1;
    }

    writeln!(
        writer,
        "Imported {} entries from {imported_files} files ({} duplicates skipped)",
        totals.inserted, totals.duplicates
    )?;
    if unchanged_files > 0 {
        writeln!(writer, "Unchanged files skipped: {unchanged_files}")?;
    }
    Ok(())
}
