//! Directory scanning: find time logs under a root and work out their dates.
//!
//! The walk is depth-first and sorted by file name, so the manifest order is
//! stable across runs. Each discovered path goes through [`validate_path`]
//! before anything else looks at it.

mod detect;
mod path;
mod provenance;

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

use crate::date::Date;
use crate::entry::LogCollection;
use crate::parser::{Diagnostic, ParseContext, ParseError, parse_reader};
use crate::span::SpanPolicy;

pub use detect::{
    LogSample, SAMPLE_LINES, TEXT_SAMPLE_BYTES, is_text_file, looks_like_text, sample_time_log,
    sample_time_log_file,
};
pub use path::{PathError, validate_path};
pub use provenance::{date_from_mtime, extract_date_from_filename, extract_date_from_path};

/// Errors that abort a scan. Problems below the root only skip entries.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("path does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("invalid or unsafe scan root")]
    InvalidRoot(#[from] PathError),

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Options controlling a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Descend into subdirectories.
    pub recursive: bool,
    pub follow_symlinks: bool,
    pub date_from_filename: bool,
    pub date_from_path: bool,
    /// Deepest directory level scanned; the root is level 0.
    pub max_depth: usize,
    /// Larger files are skipped. Bytes.
    pub max_file_size: u64,
    /// If non-empty, a file name must contain one of these.
    pub include_patterns: Vec<String>,
    /// A full path containing any of these is skipped.
    pub exclude_patterns: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            follow_symlinks: false,
            date_from_filename: false,
            date_from_path: false,
            max_depth: 10,
            max_file_size: 10 * 1024 * 1024,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

/// Where a file's date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    /// The file has its own date headers.
    Header,
    Filename,
    Path,
    /// The file's modification time.
    Metadata,
    None,
}

impl DateSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Filename => "filename",
            Self::Path => "path",
            Self::Metadata => "metadata",
            Self::None => "none",
        }
    }

    /// True for sources inferred from outside the file's content.
    #[must_use]
    pub const fn is_inferred(&self) -> bool {
        matches!(self, Self::Filename | Self::Path | Self::Metadata)
    }
}

impl fmt::Display for DateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered time log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    /// Canonical path.
    pub path: PathBuf,
    pub filename: String,
    pub has_time_entries: bool,
    pub has_date_headers: bool,
    /// Entry-shaped lines in the sampled prefix.
    pub entry_count: usize,
    pub inferred_date: Option<Date>,
    pub date_source: DateSource,
}

impl FileInfo {
    /// True if the file's entries can be given a date.
    #[must_use]
    pub fn is_dated(&self) -> bool {
        self.has_date_headers || self.date_source != DateSource::None
    }

    /// Date to start parsing with, before any header is seen.
    #[must_use]
    pub fn initial_date(&self) -> Option<Date> {
        if self.has_date_headers {
            None
        } else {
            self.inferred_date
        }
    }
}

/// Why an entry under the root was not included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The walker could not read it (permissions, symlink loop).
    Walk(String),
    InvalidPath(String),
    Symlink,
    TooLarge { size: u64 },
    NotIncluded,
    Excluded { pattern: String },
    Binary,
    NotTimeLog,
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Walk(err) => write!(f, "cannot walk: {err}"),
            Self::InvalidPath(err) => write!(f, "invalid path: {err}"),
            Self::Symlink => f.write_str("symlink not followed"),
            Self::TooLarge { size } => write!(f, "too large ({size} bytes)"),
            Self::NotIncluded => f.write_str("does not match include patterns"),
            Self::Excluded { pattern } => write!(f, "matches exclude pattern '{pattern}'"),
            Self::Binary => f.write_str("not a text file"),
            Self::NotTimeLog => f.write_str("no time entries"),
            Self::Unreadable(err) => write!(f, "unreadable: {err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// The manifest of a scan, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub files: Vec<FileInfo>,
    pub entries_total: usize,
    pub files_with_dates: usize,
    pub files_without_dates: usize,
    pub skipped: Vec<Skipped>,
}

impl ScanResult {
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Files whose date came from the file name, path or mtime.
    #[must_use]
    pub fn files_with_inferred_dates(&self) -> usize {
        self.files
            .iter()
            .filter(|f| !f.has_date_headers && f.date_source.is_inferred())
            .count()
    }

    fn add_file(&mut self, info: FileInfo) {
        tracing::debug!(
            path = ?info.path,
            entries = info.entry_count,
            source = %info.date_source,
            date = ?info.inferred_date,
            "found time log"
        );
        self.entries_total += info.entry_count;
        if info.is_dated() {
            self.files_with_dates += 1;
        } else {
            self.files_without_dates += 1;
        }
        self.files.push(info);
    }

    fn skip(&mut self, path: PathBuf, reason: SkipReason) {
        tracing::debug!(path = ?path, reason = %reason, "skipping");
        self.skipped.push(Skipped { path, reason });
    }
}

/// Scans `root` for time logs.
///
/// A root that is a regular file is analysed on its own. An invalid root is
/// fatal; invalid entries below it are recorded in [`ScanResult::skipped`].
pub fn scan_directory(root: &Path, config: &ScanConfig) -> Result<ScanResult, ScanError> {
    let metadata = fs::metadata(root).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ScanError::NotFound {
                path: root.to_path_buf(),
            }
        } else {
            ScanError::Io {
                path: root.to_path_buf(),
                source,
            }
        }
    })?;
    let root = validate_path(root)?;
    let mut result = ScanResult::default();

    if !metadata.is_dir() {
        match analyze_file(&root, &metadata, config) {
            Ok(info) => result.add_file(info),
            Err(reason) => result.skip(root, reason),
        }
        return Ok(result);
    }

    let max_depth = if config.recursive {
        config.max_depth.saturating_add(1)
    } else {
        1
    };
    let mut walker = WalkDir::new(&root)
        .follow_links(config.follow_symlinks)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter();

    while let Some(next) = walker.next() {
        let entry = match next {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map_or_else(|| root.clone(), Path::to_path_buf);
                result.skip(path, SkipReason::Walk(err.to_string()));
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            result.skip(entry.into_path(), SkipReason::Symlink);
            continue;
        }

        let canonical = match validate_path(entry.path()) {
            Ok(canonical) => canonical,
            Err(err) => {
                if file_type.is_dir() {
                    walker.skip_current_dir();
                }
                result.skip(entry.into_path(), SkipReason::InvalidPath(err.to_string()));
                continue;
            }
        };
        if !file_type.is_file() {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                result.skip(canonical, SkipReason::Unreadable(err.to_string()));
                continue;
            }
        };
        match analyze_file(&canonical, &metadata, config) {
            Ok(info) => result.add_file(info),
            Err(reason) => result.skip(canonical, reason),
        }
    }

    tracing::info!(
        root = ?root,
        files = result.file_count(),
        entries = result.entries_total,
        skipped = result.skipped.len(),
        "scan complete"
    );
    Ok(result)
}

/// Applies the size, name and content gates to one file.
fn should_process(path: &Path, metadata: &fs::Metadata, config: &ScanConfig) -> Result<(), SkipReason> {
    if metadata.len() > config.max_file_size {
        return Err(SkipReason::TooLarge {
            size: metadata.len(),
        });
    }

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if !config.include_patterns.is_empty()
        && !config
            .include_patterns
            .iter()
            .any(|p| filename.contains(p.as_str()))
    {
        return Err(SkipReason::NotIncluded);
    }

    let full = path.to_string_lossy();
    if let Some(pattern) = config
        .exclude_patterns
        .iter()
        .find(|p| full.contains(p.as_str()))
    {
        return Err(SkipReason::Excluded {
            pattern: pattern.clone(),
        });
    }

    match is_text_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(SkipReason::Binary),
        Err(err) => Err(SkipReason::Unreadable(err.to_string())),
    }
}

fn analyze_file(path: &Path, metadata: &fs::Metadata, config: &ScanConfig) -> Result<FileInfo, SkipReason> {
    should_process(path, metadata, config)?;

    let sample = sample_time_log_file(path).map_err(|err| SkipReason::Unreadable(err.to_string()))?;
    if !sample.is_time_log() {
        return Err(SkipReason::NotTimeLog);
    }

    let filename = path
        .file_name()
        .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy())
        .into_owned();
    let has_date_headers = sample.date_headers > 0;

    let (inferred_date, date_source) = if has_date_headers {
        (None, DateSource::Header)
    } else {
        infer_date(path, &filename, metadata, config)
    };

    Ok(FileInfo {
        path: path.to_path_buf(),
        filename,
        has_time_entries: true,
        has_date_headers,
        entry_count: sample.time_entries,
        inferred_date,
        date_source,
    })
}

/// File name, then path, then modification time.
fn infer_date(
    path: &Path,
    filename: &str,
    metadata: &fs::Metadata,
    config: &ScanConfig,
) -> (Option<Date>, DateSource) {
    config
        .date_from_filename
        .then(|| extract_date_from_filename(filename))
        .flatten()
        .map(|date| (date, DateSource::Filename))
        .or_else(|| {
            config
                .date_from_path
                .then(|| extract_date_from_path(path))
                .flatten()
                .map(|date| (date, DateSource::Path))
        })
        .or_else(|| date_from_mtime(metadata).map(|date| (date, DateSource::Metadata)))
        .map_or((None, DateSource::None), |(date, source)| (Some(date), source))
}

/// One manifest file after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub info: FileInfo,
    pub entries: LogCollection,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parsed contents of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedScan {
    pub files: Vec<LoadedFile>,
    /// Manifest files that could not be read back.
    pub unreadable: Vec<Skipped>,
}

impl LoadedScan {
    /// All entries, file by file in manifest order.
    #[must_use]
    pub fn merged(&self) -> LogCollection {
        self.files
            .iter()
            .flat_map(|f| f.entries.iter().cloned())
            .collect()
    }
}

/// Parses one file with its own context.
pub fn load_file(info: &FileInfo, policy: &SpanPolicy) -> Result<LoadedFile, ScanError> {
    let file = File::open(&info.path).map_err(|source| ScanError::Io {
        path: info.path.clone(),
        source,
    })?;
    let context = info
        .initial_date()
        .map_or_else(ParseContext::today, ParseContext::starting_on);
    if let Some(date) = info.initial_date() {
        tracing::debug!(path = ?info.path, %date, source = %info.date_source, "using inferred date");
    }
    let outcome = parse_reader(BufReader::new(file), context, policy).map_err(|err| match err {
        ParseError::Io { source, .. } => ScanError::Io {
            path: info.path.clone(),
            source,
        },
    })?;
    Ok(LoadedFile {
        info: info.clone(),
        entries: outcome.entries,
        diagnostics: outcome.diagnostics,
    })
}

/// Parses every file in `scan`, each with an independent [`ParseContext`].
///
/// Files that fail to read are recorded and skipped.
pub fn load_scan(scan: &ScanResult, policy: &SpanPolicy) -> LoadedScan {
    let mut loaded = LoadedScan::default();
    for info in &scan.files {
        match load_file(info, policy) {
            Ok(file) => loaded.files.push(file),
            Err(err) => {
                tracing::warn!(path = ?info.path, error = %err, "skipping unreadable file");
                loaded.unreadable.push(Skipped {
                    path: info.path.clone(),
                    reason: SkipReason::Unreadable(err.to_string()),
                });
            }
        }
    }
    loaded
}
