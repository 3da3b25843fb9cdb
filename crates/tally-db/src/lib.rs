//! Storage layer for tally.
//!
//! Persists parsed log entries in SQLite using `rusqlite`, so that logs
//! scattered across many files can be queried together later.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved between threads but not shared without a `Mutex`.
//!
//! # Schema
//!
//! Dates are stored as `YYYY-MM-DD` TEXT and times as `HH:MM` TEXT, so
//! lexicographic ordering matches chronological ordering. File timestamps
//! (`last_modified`, `last_scanned`, `created_at`) are Unix seconds.
//!
//! The `metadata` table holds the schema version under the key `version`.

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Transaction, params, params_from_iter};
use tally_core::{Date, DateError, LogCollection, LogEntry, Tag, TimeOfDay, TimeSpan};
use thiserror::Error;

/// Schema version written to the `metadata` table.
pub const SCHEMA_VERSION: i64 = 1;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The database was written by an incompatible schema.
    #[error("unsupported schema version {found} (expected {SCHEMA_VERSION})")]
    SchemaVersion { found: i64 },
    /// The database directory could not be created.
    #[error("cannot create database directory {}", path.display())]
    CreateDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A stored row could not be turned back into an entry.
    #[error("invalid stored entry {entry_id}: {message}")]
    InvalidRow { entry_id: i64, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Outcome of importing one file's entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub inserted: usize,
    /// Entries already stored for the same file.
    pub duplicates: usize,
}

impl std::ops::AddAssign for ImportStats {
    fn add_assign(&mut self, rhs: Self) {
        self.inserted += rhs.inserted;
        self.duplicates += rhs.duplicates;
    }
}

/// Filters for [`Database::query_entries`]. The default matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryQuery {
    pub from: Option<Date>,
    pub to: Option<Date>,
    pub tag: Option<Tag>,
    /// Substring of the source file path.
    pub file_contains: Option<String>,
    /// Substring of the description.
    pub description_contains: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// An entry loaded from the database with its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub id: i64,
    pub file_path: String,
    pub entry: LogEntry,
}

/// Aggregate counts over the whole database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbStats {
    pub entries: u64,
    pub files: u64,
    /// Distinct tags attached to at least one entry.
    pub tags: u64,
    pub total_minutes: u64,
    pub earliest: Option<Date>,
    pub latest: Option<Date>,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// Missing parent directories are created. The schema is initialized on
    /// first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = ?path, "opened database");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT
            );

            CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filepath TEXT UNIQUE NOT NULL,
                last_modified INTEGER,
                last_scanned INTEGER,
                entry_count INTEGER DEFAULT 0
            );

            -- date: 'YYYY-MM-DD'; start_time/end_time: 'HH:MM'
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                file_id INTEGER,
                date TEXT,
                start_time TEXT,
                end_time TEXT,
                duration_minutes INTEGER,
                description TEXT,
                percentage INTEGER,
                line_number INTEGER,
                created_at INTEGER DEFAULT (strftime('%s', 'now')),
                FOREIGN KEY (file_id) REFERENCES files(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL
            );

            CREATE TABLE IF NOT EXISTS entry_tags (
                entry_id INTEGER,
                tag_id INTEGER,
                PRIMARY KEY (entry_id, tag_id),
                FOREIGN KEY (entry_id) REFERENCES entries(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date);
            CREATE INDEX IF NOT EXISTS idx_entries_file ON entries(file_id);
            CREATE INDEX IF NOT EXISTS idx_tags_name ON tags(name);
            CREATE INDEX IF NOT EXISTS idx_entry_tags_entry ON entry_tags(entry_id);
            CREATE INDEX IF NOT EXISTS idx_entry_tags_tag ON entry_tags(tag_id);
            ",
        )?;

        match self.schema_version()? {
            None => {
                self.conn.execute(
                    "INSERT INTO metadata (key, value) VALUES ('version', ?)",
                    [SCHEMA_VERSION.to_string()],
                )?;
            }
            Some(SCHEMA_VERSION) => {}
            Some(found) => return Err(DbError::SchemaVersion { found }),
        }
        Ok(())
    }

    /// Returns the stored schema version, if any.
    pub fn schema_version(&self) -> Result<Option<i64>, DbError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.and_then(|v| v.parse().ok()))
    }

    /// Stores the entries of one file in a single transaction.
    ///
    /// An entry is skipped if the same file already has an entry with the
    /// same date, start, end, duration and description.
    pub fn import_entries(
        &mut self,
        file_path: &str,
        entries: &LogCollection,
    ) -> Result<ImportStats, DbError> {
        let tx = self.conn.transaction()?;
        let file_id = ensure_file(&tx, file_path)?;
        let mut stats = ImportStats::default();
        for entry in entries {
            if insert_entry(&tx, file_id, entry)? {
                stats.inserted += 1;
            } else {
                tracing::debug!(
                    file = file_path,
                    date = %entry.date,
                    start = %entry.span.start(),
                    end = %entry.span.end(),
                    "skipping duplicate entry"
                );
                stats.duplicates += 1;
            }
        }
        tx.execute(
            "UPDATE files SET entry_count = entry_count + ? WHERE id = ?",
            params![stats.inserted, file_id],
        )?;
        tx.commit()?;
        tracing::debug!(
            file = file_path,
            inserted = stats.inserted,
            duplicates = stats.duplicates,
            "imported entries"
        );
        Ok(stats)
    }

    /// Loads entries matching `query`, ordered by date then start time.
    pub fn query_entries(&self, query: &EntryQuery) -> Result<Vec<StoredEntry>, DbError> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        if let Some(from) = query.from {
            clauses.push("e.date >= ?");
            values.push(Value::Text(from.to_string()));
        }
        if let Some(to) = query.to {
            clauses.push("e.date <= ?");
            values.push(Value::Text(to.to_string()));
        }
        if let Some(tag) = &query.tag {
            clauses.push(
                "EXISTS (SELECT 1 FROM entry_tags et JOIN tags t ON t.id = et.tag_id
                         WHERE et.entry_id = e.id AND t.name = ?)",
            );
            values.push(Value::Text(tag.to_string()));
        }
        if let Some(part) = &query.file_contains {
            clauses.push("instr(f.filepath, ?) > 0");
            values.push(Value::Text(part.clone()));
        }
        if let Some(part) = &query.description_contains {
            clauses.push("instr(e.description, ?) > 0");
            values.push(Value::Text(part.clone()));
        }

        let mut sql = String::from(
            "
            SELECT e.id, e.date, e.start_time, e.end_time, e.description,
                   e.percentage, e.line_number, f.filepath
            FROM entries e
            JOIN files f ON f.id = e.file_id
            ",
        );
        if !clauses.is_empty() {
            sql.push_str("WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY e.date ASC, e.start_time ASC, e.id ASC LIMIT ? OFFSET ?");
        values.push(Value::Integer(
            query
                .limit
                .map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX)),
        ));
        values.push(Value::Integer(
            i64::try_from(query.offset).unwrap_or(i64::MAX),
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(EntryRow {
                id: row.get(0)?,
                date: row.get(1)?,
                start: row.get(2)?,
                end: row.get(3)?,
                description: row.get(4)?,
                percentage: row.get(5)?,
                line_number: row.get(6)?,
                file_path: row.get(7)?,
            })
        })?;
        let mut raw = Vec::new();
        for row in rows {
            raw.push(row?);
        }

        let mut tag_stmt = self.conn.prepare_cached(
            "
            SELECT t.name
            FROM entry_tags et
            JOIN tags t ON t.id = et.tag_id
            WHERE et.entry_id = ?
            ORDER BY et.rowid ASC
            ",
        )?;
        let mut entries = Vec::with_capacity(raw.len());
        for row in raw {
            let names = tag_stmt.query_map([row.id], |r| r.get::<_, String>(0))?;
            let mut tags = Vec::new();
            for name in names {
                let name = name?;
                let tag = Tag::new(name).map_err(|err| DbError::InvalidRow {
                    entry_id: row.id,
                    message: err.to_string(),
                })?;
                tags.push(tag);
            }
            entries.push(row.into_stored(tags)?);
        }
        Ok(entries)
    }

    /// Convenience wrapper collecting query results into a [`LogCollection`].
    pub fn load_collection(&self, query: &EntryQuery) -> Result<LogCollection, DbError> {
        Ok(self
            .query_entries(query)?
            .into_iter()
            .map(|stored| stored.entry)
            .collect())
    }

    pub fn stats(&self) -> Result<DbStats, DbError> {
        let (entries, files, total_minutes, earliest, latest): (
            i64,
            i64,
            i64,
            Option<String>,
            Option<String>,
        ) = self.conn.query_row(
            "
            SELECT COUNT(*),
                   COUNT(DISTINCT file_id),
                   COALESCE(SUM(duration_minutes), 0),
                   MIN(date),
                   MAX(date)
            FROM entries
            ",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )?;
        let tags: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT tag_id) FROM entry_tags",
            [],
            |row| row.get(0),
        )?;

        let count = |n: i64| u64::try_from(n).unwrap_or_default();
        Ok(DbStats {
            entries: count(entries),
            files: count(files),
            tags: count(tags),
            total_minutes: count(total_minutes),
            earliest: earliest.and_then(|d| d.parse().ok()),
            latest: latest.and_then(|d| d.parse().ok()),
        })
    }

    /// Remembers that `file_path` was scanned with the given modification
    /// time (Unix seconds).
    ///
    /// `entry_count` is left alone; only [`Self::import_entries`] adds to it.
    pub fn record_file_scan(&mut self, file_path: &str, modified: i64) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO files (filepath, last_modified, last_scanned)
            VALUES (?1, ?2, strftime('%s', 'now'))
            ON CONFLICT(filepath) DO UPDATE SET
                last_modified = excluded.last_modified,
                last_scanned = excluded.last_scanned
            ",
            params![file_path, modified],
        )?;
        Ok(())
    }

    /// Returns true if `file_path` was scanned before with the same
    /// modification time.
    pub fn is_file_cached(&self, file_path: &str, modified: i64) -> Result<bool, DbError> {
        let stored: Option<Option<i64>> = self
            .conn
            .query_row(
                "SELECT last_modified FROM files WHERE filepath = ?",
                [file_path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stored.flatten() == Some(modified))
    }

    /// Forgets every recorded scan time so the next import rereads all files.
    pub fn clear_scan_cache(&mut self) -> Result<usize, DbError> {
        Ok(self.conn.execute(
            "UPDATE files SET last_modified = NULL, last_scanned = NULL",
            [],
        )?)
    }

    /// Rebuilds the database file, reclaiming free pages.
    pub fn vacuum(&self) -> Result<(), DbError> {
        self.conn.execute_batch("VACUUM")?;
        Ok(())
    }

    /// Writes a consistent copy of the database to `path`.
    pub fn backup(&self, path: &Path) -> Result<(), DbError> {
        self.conn
            .execute("VACUUM INTO ?", [path.to_string_lossy()])?;
        Ok(())
    }
}

/// Raw columns of an `entries` row joined with its file path.
struct EntryRow {
    id: i64,
    date: String,
    start: String,
    end: String,
    description: Option<String>,
    percentage: Option<i64>,
    line_number: Option<i64>,
    file_path: String,
}

impl EntryRow {
    fn into_stored(self, tags: Vec<Tag>) -> Result<StoredEntry, DbError> {
        let invalid = |message: String| DbError::InvalidRow {
            entry_id: self.id,
            message,
        };
        let date: Date = self.date.parse().map_err(|e: DateError| invalid(e.to_string()))?;
        let start: TimeOfDay = self.start.parse().map_err(|e: DateError| invalid(e.to_string()))?;
        let end: TimeOfDay = self.end.parse().map_err(|e: DateError| invalid(e.to_string()))?;
        let percentage = u8::try_from(self.percentage.unwrap_or_default())
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| invalid(format!("percentage {:?}", self.percentage)))?;

        Ok(StoredEntry {
            id: self.id,
            file_path: self.file_path,
            entry: LogEntry {
                date,
                span: TimeSpan::restore(start, end),
                description: self.description,
                tags,
                percentage,
                line_number: usize::try_from(self.line_number.unwrap_or_default())
                    .unwrap_or_default(),
            },
        })
    }
}

fn ensure_file(tx: &Transaction<'_>, file_path: &str) -> Result<i64, DbError> {
    tx.execute(
        "INSERT OR IGNORE INTO files (filepath) VALUES (?)",
        [file_path],
    )?;
    Ok(tx.query_row(
        "SELECT id FROM files WHERE filepath = ?",
        [file_path],
        |row| row.get(0),
    )?)
}

fn ensure_tag(tx: &Transaction<'_>, name: &str) -> Result<i64, DbError> {
    tx.prepare_cached("INSERT OR IGNORE INTO tags (name) VALUES (?)")?
        .execute([name])?;
    Ok(tx
        .prepare_cached("SELECT id FROM tags WHERE name = ?")?
        .query_row([name], |row| row.get(0))?)
}

/// Inserts one entry unless an identical one exists. Returns true if inserted.
fn insert_entry(tx: &Transaction<'_>, file_id: i64, entry: &LogEntry) -> Result<bool, DbError> {
    let date = entry.date.to_string();
    let start = entry.span.start().to_string();
    let end = entry.span.end().to_string();
    let duration = entry.duration_minutes();

    let duplicate = tx
        .prepare_cached(
            "
            SELECT 1 FROM entries
            WHERE file_id = ? AND date = ? AND start_time = ? AND end_time = ?
              AND duration_minutes = ? AND description IS ?
            ",
        )?
        .exists(params![
            file_id,
            date,
            start,
            end,
            duration,
            entry.description
        ])?;
    if duplicate {
        return Ok(false);
    }

    tx.prepare_cached(
        "
        INSERT INTO entries
        (file_id, date, start_time, end_time, duration_minutes, description, percentage, line_number)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )?
    .execute(params![
        file_id,
        date,
        start,
        end,
        duration,
        entry.description,
        entry.percentage,
        entry.line_number,
    ])?;
    let entry_id = tx.last_insert_rowid();

    for tag in &entry.tags {
        let tag_id = ensure_tag(tx, tag.as_str())?;
        tx.prepare_cached("INSERT OR IGNORE INTO entry_tags (entry_id, tag_id) VALUES (?, ?)")?
            .execute([entry_id, tag_id])?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tally_core::{ParseContext, SpanPolicy, parse_str};

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::new(y, m, d).unwrap()
    }

    fn parse(input: &str) -> LogCollection {
        parse_str(
            input,
            ParseContext::starting_on(date(2024, 1, 1)),
            &SpanPolicy::default(),
        )
        .entries
    }

    fn sample() -> LogCollection {
        parse(
            "\
# 2024-03-01
0800-0900 write docs #work #urgent %50
0900-0930 #admin
# 2024-03-02
2330-0030 late deploy #work
",
        )
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info");
        rows.map(|row| row.expect("table_info row")).collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list");
        rows.map(|row| row.expect("index_list row")).collect()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(db.schema_version().unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(
            table_columns(&db.conn, "entries"),
            vec![
                "id",
                "file_id",
                "date",
                "start_time",
                "end_time",
                "duration_minutes",
                "description",
                "percentage",
                "line_number",
                "created_at",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "files"),
            vec!["id", "filepath", "last_modified", "last_scanned", "entry_count"]
        );
        assert_eq!(table_columns(&db.conn, "entry_tags"), vec!["entry_id", "tag_id"]);

        let entry_indexes = index_names(&db.conn, "entries");
        assert!(entry_indexes.contains("idx_entries_date"));
        assert!(entry_indexes.contains("idx_entries_file"));
        assert!(index_names(&db.conn, "tags").contains("idx_tags_name"));
    }

    #[test]
    fn reopening_keeps_schema_and_data() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tally.db");
        {
            let mut db = Database::open(&path).expect("open db");
            db.import_entries("/logs/a.log", &sample()).unwrap();
        }
        let db = Database::open(&path).expect("reopen db");
        assert_eq!(db.schema_version().unwrap(), Some(SCHEMA_VERSION));
        assert_eq!(db.stats().unwrap().entries, 3);
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tally.db");
        {
            let db = Database::open(&path).unwrap();
            db.conn
                .execute("UPDATE metadata SET value = '7' WHERE key = 'version'", [])
                .unwrap();
        }
        assert!(matches!(
            Database::open(&path),
            Err(DbError::SchemaVersion { found: 7 })
        ));
    }

    #[test]
    fn importing_twice_stores_once() {
        let mut db = Database::open_in_memory().unwrap();
        let first = db.import_entries("/logs/a.log", &sample()).unwrap();
        assert_eq!(
            first,
            ImportStats {
                inserted: 3,
                duplicates: 0
            }
        );
        let second = db.import_entries("/logs/a.log", &sample()).unwrap();
        assert_eq!(
            second,
            ImportStats {
                inserted: 0,
                duplicates: 3
            }
        );
        assert_eq!(db.stats().unwrap().entries, 3);

        // Same entries from another file are distinct.
        let other = db.import_entries("/logs/b.log", &sample()).unwrap();
        assert_eq!(other.inserted, 3);
    }

    #[test]
    fn query_roundtrips_entries_in_order() {
        let mut db = Database::open_in_memory().unwrap();
        let entries = sample();
        db.import_entries("/logs/a.log", &entries).unwrap();

        let loaded = db.load_collection(&EntryQuery::default()).unwrap();
        assert_eq!(loaded, entries);

        let stored = db.query_entries(&EntryQuery::default()).unwrap();
        assert!(stored.iter().all(|s| s.file_path == "/logs/a.log"));
        assert_eq!(stored[0].entry.description.as_deref(), Some("write docs"));
        assert_eq!(stored[1].entry.description, None);
        assert_eq!(stored[2].entry.duration_minutes(), 60);
    }

    #[test]
    fn query_filters_combine() {
        let mut db = Database::open_in_memory().unwrap();
        db.import_entries("/logs/a.log", &sample()).unwrap();
        db.import_entries(
            "/archive/b.log",
            &parse("# 2024-03-03\n1000-1100 planning #work"),
        )
        .unwrap();

        let work = EntryQuery {
            tag: Some(Tag::new("work").unwrap()),
            ..EntryQuery::default()
        };
        let dates: Vec<Date> = db
            .query_entries(&work)
            .unwrap()
            .iter()
            .map(|s| s.entry.date)
            .collect();
        assert_eq!(dates, [date(2024, 3, 1), date(2024, 3, 2), date(2024, 3, 3)]);

        let ranged = EntryQuery {
            from: Some(date(2024, 3, 2)),
            to: Some(date(2024, 3, 2)),
            ..work.clone()
        };
        assert_eq!(db.query_entries(&ranged).unwrap().len(), 1);

        let by_file = EntryQuery {
            file_contains: Some("archive".to_string()),
            ..EntryQuery::default()
        };
        assert_eq!(db.query_entries(&by_file).unwrap()[0].file_path, "/archive/b.log");

        let by_text = EntryQuery {
            description_contains: Some("deploy".to_string()),
            ..EntryQuery::default()
        };
        assert_eq!(db.query_entries(&by_text).unwrap().len(), 1);

        let paged = EntryQuery {
            limit: Some(2),
            offset: 1,
            ..EntryQuery::default()
        };
        let page = db.query_entries(&paged).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].entry.description, None);
    }

    #[test]
    fn stats_count_without_tag_inflation() {
        let mut db = Database::open_in_memory().unwrap();
        assert_eq!(db.stats().unwrap(), DbStats::default());

        db.import_entries("/logs/a.log", &sample()).unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(
            stats,
            DbStats {
                entries: 3,
                files: 1,
                tags: 3,
                total_minutes: 150,
                earliest: Some(date(2024, 3, 1)),
                latest: Some(date(2024, 3, 2)),
            }
        );
    }

    #[test]
    fn scan_cache_tracks_modification_time() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(!db.is_file_cached("/logs/a.log", 100).unwrap());

        db.record_file_scan("/logs/a.log", 100).unwrap();
        assert!(db.is_file_cached("/logs/a.log", 100).unwrap());
        assert!(!db.is_file_cached("/logs/a.log", 101).unwrap());

        assert_eq!(db.clear_scan_cache().unwrap(), 1);
        assert!(!db.is_file_cached("/logs/a.log", 100).unwrap());
    }

    #[test]
    fn file_entry_count_tracks_stored_entries() {
        let mut db = Database::open_in_memory().unwrap();
        let entries = sample();
        db.import_entries("/logs/a.log", &entries).unwrap();
        db.record_file_scan("/logs/a.log", 100).unwrap();

        // A forced re-import stores nothing new.
        let again = db.import_entries("/logs/a.log", &entries).unwrap();
        assert_eq!(again.inserted, 0);
        db.record_file_scan("/logs/a.log", 200).unwrap();

        let count: i64 = db
            .conn
            .query_row(
                "SELECT entry_count FROM files WHERE filepath = ?",
                ["/logs/a.log"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
        assert!(db.is_file_cached("/logs/a.log", 200).unwrap());
    }

    #[test]
    fn vacuum_and_backup() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut db = Database::open_in_memory().unwrap();
        db.import_entries("/logs/a.log", &sample()).unwrap();
        db.vacuum().unwrap();

        let copy = dir.path().join("copy.db");
        db.backup(&copy).unwrap();
        let restored = Database::open(&copy).unwrap();
        assert_eq!(restored.stats().unwrap().entries, 3);
    }
}
