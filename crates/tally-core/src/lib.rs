//! Core domain logic for tally.
//!
//! This crate contains the fundamental types and logic for:
//! - Parsing: classifying log lines and turning them into entries
//! - Aggregation: rolling entries up by tag, day, ISO week and month
//! - Scanning: discovering time logs on disk and inferring their dates

pub mod aggregate;
pub mod date;
pub mod entry;
pub mod filter;
pub mod grammar;
pub mod parser;
pub mod scan;
pub mod span;

pub use date::{Date, DateError, IsoWeek, TimeOfDay};
pub use entry::{LogCollection, LogEntry, Tag, TagError};
pub use filter::EntryFilter;
pub use grammar::{LineKind, classify_line};
pub use parser::{
    Diagnostic, DiagnosticKind, ParseContext, ParseError, ParseOutcome, Severity, parse_reader,
    parse_str,
};
pub use scan::{DateSource, FileInfo, ScanConfig, ScanError, ScanResult, load_scan, scan_directory};
pub use span::{SpanError, SpanPolicy, TimeSpan, compute_duration};
