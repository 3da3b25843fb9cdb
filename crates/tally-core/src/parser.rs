//! Two-phase log parsing: classify each line, then parse it by kind.
//!
//! Parsing never aborts on a bad line. Problems are recorded as
//! [`Diagnostic`]s on the returned [`ParseOutcome`] and also emitted through
//! `tracing`, so callers that silence logging still see them.
//!
//! The date applied to time entries lives in an explicit [`ParseContext`]
//! that is passed in and handed back, so independent parses never share
//! state.

use std::fmt;
use std::io::BufRead;

use thiserror::Error;

use crate::date::{Date, DateError, TimeOfDay};
use crate::entry::{LogCollection, LogEntry, Tag};
use crate::grammar::{LineKind, classify_line, skip_indent};
use crate::span::{SpanError, SpanLength, SpanPolicy, TimeSpan, compute_duration};

/// Longest prefix of an ignored line kept in its diagnostic.
const IGNORED_PREVIEW_CHARS: usize = 50;

/// Errors that abort a parse. Only reading the input can fail.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to read line {line}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Sequential state threaded through one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext {
    /// Date applied to time entries until the next header.
    pub current_date: Date,
    /// Number of lines consumed so far.
    pub line_number: usize,
}

impl ParseContext {
    #[must_use]
    pub const fn starting_on(date: Date) -> Self {
        Self {
            current_date: date,
            line_number: 0,
        }
    }

    /// A context dated today.
    #[must_use]
    pub fn today() -> Self {
        Self::starting_on(Date::today())
    }
}

/// How loudly a diagnostic is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Shown only with verbose output.
    Debug,
    /// Shown by default.
    Warning,
}

/// A per-line problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A header named an impossible date; `fallback` was used instead.
    InvalidDate {
        year: i32,
        month: u32,
        day: u32,
        fallback: Date,
    },
    InvalidStartTime { hour: u32, minute: u32 },
    InvalidEndTime { hour: u32, minute: u32 },
    /// The entry was dropped because its rollover is implausibly long.
    BackwardSpan(SpanError),
    /// The entry was kept, but its rollover is long.
    SuspiciousSpan {
        start: TimeOfDay,
        end: TimeOfDay,
        minutes: u32,
    },
    /// The percentage was reset to 0.
    PercentageOutOfRange { value: u64 },
    /// A non-empty line matched neither a header nor an entry.
    IgnoredLine { preview: String },
}

impl DiagnosticKind {
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::InvalidDate { .. } | Self::PercentageOutOfRange { .. } => Severity::Warning,
            _ => Severity::Debug,
        }
    }

    /// Returns true if the line produced no entry because of this problem.
    #[must_use]
    pub const fn rejects_entry(&self) -> bool {
        matches!(
            self,
            Self::InvalidStartTime { .. } | Self::InvalidEndTime { .. } | Self::BackwardSpan(_)
        )
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDate {
                year,
                month,
                day,
                fallback,
            } => write!(
                f,
                "invalid date {year:04}-{month:02}-{day:02}, using {fallback}"
            ),
            Self::InvalidStartTime { hour, minute } => write!(
                f,
                "invalid start time {hour:02}:{minute:02} (hours must be 0-23, minutes 0-59)"
            ),
            Self::InvalidEndTime { hour, minute } => write!(
                f,
                "invalid end time {hour:02}:{minute:02} (hours must be 0-23, minutes 0-59)"
            ),
            Self::BackwardSpan(err) => write!(f, "{err}"),
            Self::SuspiciousSpan {
                start,
                end,
                minutes,
            } => write!(
                f,
                "time span {start}-{end} is {} hours (backwards span?)",
                minutes / 60
            ),
            Self::PercentageOutOfRange { value } => {
                write!(f, "invalid percentage {value}% (must be 0-100)")
            }
            Self::IgnoredLine { preview } => write!(f, "ignoring line: {preview}"),
        }
    }
}

/// A diagnostic tied to its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    fn emit(&self) {
        match self.kind.severity() {
            Severity::Warning => tracing::warn!(line = self.line, "{}", self.kind),
            Severity::Debug => tracing::debug!(line = self.line, "{}", self.kind),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

/// Everything one parse produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub entries: LogCollection,
    pub diagnostics: Vec<Diagnostic>,
    /// The context after the last line, ready to continue from.
    pub context: ParseContext,
}

/// Collects entries and diagnostics across the lines of one input.
struct LineParser<'p> {
    policy: &'p SpanPolicy,
    context: ParseContext,
    entries: LogCollection,
    diagnostics: Vec<Diagnostic>,
}

impl<'p> LineParser<'p> {
    const fn new(context: ParseContext, policy: &'p SpanPolicy) -> Self {
        Self {
            policy,
            context,
            entries: LogCollection::new(),
            diagnostics: Vec::new(),
        }
    }

    fn feed(&mut self, raw: &str) {
        self.context.line_number += 1;
        let line_number = self.context.line_number;
        let line = raw.trim_end();

        match classify_line(line) {
            LineKind::DateHeader => {
                let date = resolve_date_header(skip_indent(line), line_number, &mut self.diagnostics);
                tracing::debug!(line = line_number, %date, "parsed date header");
                self.context.current_date = date;
            }
            LineKind::TimeEntry => {
                if let Some(entry) = parse_time_entry(
                    skip_indent(line),
                    line_number,
                    self.context.current_date,
                    self.policy,
                    &mut self.diagnostics,
                ) {
                    tracing::debug!(
                        line = line_number,
                        start = %entry.span.start(),
                        end = %entry.span.end(),
                        "parsed time entry"
                    );
                    self.entries.push(entry);
                }
            }
            LineKind::Other => {
                if !line.is_empty() {
                    let mut preview: String = line.chars().take(IGNORED_PREVIEW_CHARS).collect();
                    if line.chars().count() > IGNORED_PREVIEW_CHARS {
                        preview.push_str("...");
                    }
                    push(
                        &mut self.diagnostics,
                        line_number,
                        DiagnosticKind::IgnoredLine { preview },
                    );
                }
            }
        }
    }

    fn finish(self) -> ParseOutcome {
        ParseOutcome {
            entries: self.entries,
            diagnostics: self.diagnostics,
            context: self.context,
        }
    }
}

fn push(diagnostics: &mut Vec<Diagnostic>, line: usize, kind: DiagnosticKind) {
    let diagnostic = Diagnostic { line, kind };
    diagnostic.emit();
    diagnostics.push(diagnostic);
}

/// Parses a whole in-memory log.
pub fn parse_str(input: &str, context: ParseContext, policy: &SpanPolicy) -> ParseOutcome {
    let mut parser = LineParser::new(context, policy);
    for line in input.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Parses a log from a buffered reader, line by line.
///
/// Invalid UTF-8 is decoded lossily. CRLF and LF endings are both accepted.
pub fn parse_reader<R: BufRead>(
    mut reader: R,
    context: ParseContext,
    policy: &SpanPolicy,
) -> Result<ParseOutcome, ParseError> {
    let mut parser = LineParser::new(context, policy);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| ParseError::Io {
                line: parser.context.line_number + 1,
                source,
            })?;
        if read == 0 {
            break;
        }
        parser.feed(&String::from_utf8_lossy(&buf));
    }
    Ok(parser.finish())
}

fn digit(bytes: &[u8], idx: usize) -> Option<u32> {
    bytes
        .get(idx)
        .filter(|b| b.is_ascii_digit())
        .map(|b| u32::from(b - b'0'))
}

fn number(bytes: &[u8], from: usize, width: usize) -> Option<u32> {
    (from..from + width).try_fold(0, |acc, idx| Some(acc * 10 + digit(bytes, idx)?))
}

/// Reads the date of a `# YYYY-MM-DD` header (indentation already removed).
pub fn parse_date_header(line: &str) -> Result<Date, DateError> {
    let bytes = line.as_bytes();
    let format_err = || DateError::Format {
        value: line.to_string(),
    };
    let year = number(bytes, 2, 4)
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(format_err)?;
    let month = number(bytes, 7, 2).ok_or_else(format_err)?;
    let day = number(bytes, 10, 2).ok_or_else(format_err)?;
    Date::new(year, month, day)
}

/// Resolves a header to a date, falling back to today when it is invalid.
fn resolve_date_header(line: &str, line_number: usize, diagnostics: &mut Vec<Diagnostic>) -> Date {
    match parse_date_header(line) {
        Ok(date) => date,
        Err(err) => {
            let fallback = Date::today();
            let (year, month, day) = match err {
                DateError::OutOfRange { year, month, day } => (year, month, day),
                _ => (0, 0, 0),
            };
            push(
                diagnostics,
                line_number,
                DiagnosticKind::InvalidDate {
                    year,
                    month,
                    day,
                    fallback,
                },
            );
            fallback
        }
    }
}

/// Parses one `HHMM-HHMM payload` line (indentation already removed).
///
/// Returns `None` when the line is rejected; the reason is pushed onto
/// `diagnostics`.
pub fn parse_time_entry(
    line: &str,
    line_number: usize,
    date: Date,
    policy: &SpanPolicy,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<LogEntry> {
    let bytes = line.as_bytes();
    let (start_hour, start_minute) = (number(bytes, 0, 2)?, number(bytes, 2, 2)?);
    let (end_hour, end_minute) = (number(bytes, 5, 2)?, number(bytes, 7, 2)?);

    let Ok(start) = TimeOfDay::new(start_hour, start_minute) else {
        push(
            diagnostics,
            line_number,
            DiagnosticKind::InvalidStartTime {
                hour: start_hour,
                minute: start_minute,
            },
        );
        return None;
    };
    let Ok(end) = TimeOfDay::new(end_hour, end_minute) else {
        push(
            diagnostics,
            line_number,
            DiagnosticKind::InvalidEndTime {
                hour: end_hour,
                minute: end_minute,
            },
        );
        return None;
    };

    let length = match compute_duration(start, end, policy) {
        Ok(length) => length,
        Err(err) => {
            push(diagnostics, line_number, DiagnosticKind::BackwardSpan(err));
            return None;
        }
    };
    if let SpanLength::SuspiciousRollover(minutes) = length {
        push(
            diagnostics,
            line_number,
            DiagnosticKind::SuspiciousSpan {
                start,
                end,
                minutes,
            },
        );
    }

    let payload = line.get(9..).unwrap_or_default().trim_start_matches(' ');
    let (description, tags, percentage) = split_payload(payload, line_number, diagnostics);

    Some(LogEntry {
        date,
        span: TimeSpan::from_duration(start, end, length),
        description,
        tags,
        percentage,
        line_number,
    })
}

/// Splits an entry payload into description, tags and percentage.
fn split_payload(
    payload: &str,
    line_number: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Option<String>, Vec<Tag>, u8) {
    let mut text = payload.to_string();
    let mut percentage = 0;

    // Only the first '%' is considered, and only if a digit follows it.
    if let Some(pos) = text.find('%') {
        let digits: &str = {
            let after = &text[pos + 1..];
            let len = after.bytes().take_while(u8::is_ascii_digit).count();
            &after[..len]
        };
        if !digits.is_empty() {
            let value = digits.parse::<u64>().unwrap_or(u64::MAX);
            match u8::try_from(value) {
                Ok(value) if value <= 100 => percentage = value,
                _ => push(
                    diagnostics,
                    line_number,
                    DiagnosticKind::PercentageOutOfRange { value },
                ),
            }
            let end = text[pos..].find(' ').map_or(text.len(), |len| pos + len);
            text.replace_range(pos..end, "");
        }
    }

    let description_end = text.find('#').unwrap_or(text.len());
    let mut tags = Vec::new();
    let mut rest = &text[description_end..];
    while let Some(hash) = rest.find('#') {
        let token = &rest[hash + 1..];
        // Tags cannot hold whitespace, so a tab ends one just like a space.
        let len = token
            .find(|c: char| c == '#' || c.is_ascii_whitespace())
            .unwrap_or(token.len());
        // A bare '#' yields an empty token, which is not a tag.
        if let Ok(tag) = Tag::new(&token[..len]) {
            tags.push(tag);
        }
        rest = &token[len..];
    }

    let description = text[..description_end].trim_end_matches([' ', '\t']);
    let description = (!description.is_empty()).then(|| description.to_string());
    (description, tags, percentage)
}
