//! Stats command: summarize what the database holds.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use tally_db::Database;

use super::format_minutes;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let stats = db.stats()?;

    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer, "Entries: {}", stats.entries)?;
    writeln!(writer, "Files: {}", stats.files)?;
    writeln!(writer, "Tags: {}", stats.tags)?;
    writeln!(writer, "Total time: {}", format_minutes(stats.total_minutes))?;
    match (stats.earliest, stats.latest) {
        (Some(earliest), Some(latest)) => {
            writeln!(writer, "Date range: {earliest} to {latest}")?;
        }
        _ => writeln!(writer, "Date range: none")?,
    }
    Ok(())
}
