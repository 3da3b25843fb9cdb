//! Database maintenance commands.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tally_db::Database;

pub fn vacuum<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    db.vacuum().context("failed to vacuum database")?;
    writeln!(writer, "Database compacted")?;
    Ok(())
}

pub fn backup<W: Write>(writer: &mut W, db: &Database, destination: &Path) -> Result<()> {
    if destination.exists() {
        bail!("{} already exists", destination.display());
    }
    db.backup(destination)
        .with_context(|| format!("failed to back up to {}", destination.display()))?;
    writeln!(writer, "Backup written to {}", destination.display())?;
    Ok(())
}

pub fn clear_cache<W: Write>(writer: &mut W, db: &mut Database) -> Result<()> {
    let cleared = db.clear_scan_cache()?;
    writeln!(writer, "Cleared scan cache for {cleared} files")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_refuses_to_overwrite() {
        let temp = tempfile::tempdir().unwrap();
        let db = Database::open(&temp.path().join("tally.db")).unwrap();
        let destination = temp.path().join("copy.db");

        let mut output = Vec::new();
        backup(&mut output, &db, &destination).unwrap();
        assert!(destination.exists());

        let err = backup(&mut output, &db, &destination).unwrap_err();
        assert!(err.to_string().ends_with("already exists"));
    }

    #[test]
    fn clear_cache_reports_count() {
        let mut db = Database::open_in_memory().unwrap();
        db.record_file_scan("/logs/a.log", 100).unwrap();
        db.record_file_scan("/logs/b.log", 200).unwrap();
        assert!(db.is_file_cached("/logs/a.log", 100).unwrap());

        let mut output = Vec::new();
        clear_cache(&mut output, &mut db).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Cleared scan cache for 2 files\n"
        );
        assert!(!db.is_file_cached("/logs/a.log", 100).unwrap());
    }

    #[test]
    fn vacuum_succeeds() {
        let temp = tempfile::tempdir().unwrap();
        let db = Database::open(&temp.path().join("tally.db")).unwrap();
        let mut output = Vec::new();
        vacuum(&mut output, &db).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "Database compacted\n");
    }
}
