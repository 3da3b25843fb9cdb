//! Text, CSV and JSON output for an entry collection.

use std::borrow::Cow;
use std::io::{self, Write};

use serde::Serialize;
use tally_core::aggregate::{by_day, by_month, by_tag, by_week};
use tally_core::{Date, LogCollection, LogEntry, TimeOfDay};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const EMPTY: &str = "No entries to summarize.";

/// Which report to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Tags,
    Daily,
    Weekly,
    Monthly,
    Csv,
    Json,
}

/// Splits minutes into whole hours and remaining minutes.
const fn hm(minutes: u64) -> (u64, u64) {
    (minutes / 60, minutes % 60)
}

pub fn render<W: Write>(writer: &mut W, view: View, entries: &LogCollection) -> io::Result<()> {
    match view {
        View::Tags => write_tag_summary(writer, entries),
        View::Daily => write_daily_summary(writer, entries),
        View::Weekly => write_weekly_summary(writer, entries),
        View::Monthly => write_monthly_summary(writer, entries),
        View::Csv => write_csv(writer, entries),
        View::Json => write_json(writer, entries),
    }
}

pub fn write_tag_summary<W: Write>(writer: &mut W, entries: &LogCollection) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(writer, "{EMPTY}");
    }
    let summary = by_tag(entries);

    writeln!(writer, "=== TIME LOG SUMMARY ===")?;
    writeln!(writer, "Total entries: {}", summary.total_entries)?;
    writeln!(writer)?;
    writeln!(writer, "Time by tag:")?;
    for group in &summary.tags {
        let (hours, minutes) = hm(group.totals.minutes);
        writeln!(
            writer,
            "  #{:<19}: {hours:2}h {minutes:02}m ({} entries)",
            group.tag.as_str(),
            group.totals.entries
        )?;
    }
    let (hours, minutes) = hm(summary.total_minutes);
    writeln!(writer)?;
    writeln!(writer, "Total tracked time: {hours}h {minutes:02}m")
}

pub fn write_daily_summary<W: Write>(writer: &mut W, entries: &LogCollection) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(writer, "{EMPTY}");
    }
    let summary = by_day(entries);

    writeln!(writer, "=== DAILY SUMMARY ===")?;
    writeln!(writer)?;
    for day in &summary.days {
        let (hours, minutes) = hm(day.totals.minutes);
        writeln!(
            writer,
            "{}: {hours:3}h {minutes:02}m ({} entries)",
            day.date, day.totals.entries
        )?;
    }
    writeln!(writer)?;
    writeln!(writer, "Total days: {}", summary.days.len())?;
    write_grand_total(writer, summary.grand.entries, summary.grand.minutes)?;
    let (hours, minutes) = hm(summary.average_minutes_per_day());
    writeln!(writer, "Average per day: {hours}h {minutes:02}m")
}

pub fn write_weekly_summary<W: Write>(writer: &mut W, entries: &LogCollection) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(writer, "{EMPTY}");
    }
    let summary = by_week(entries);

    writeln!(writer, "=== WEEKLY SUMMARY ===")?;
    writeln!(writer)?;
    for week in &summary.weeks {
        let (hours, minutes) = hm(week.totals.minutes);
        writeln!(
            writer,
            "{:04} Week {:02} ({} to {}): {hours:3}h {minutes:02}m ({} entries)",
            week.week.year, week.week.week, week.first_day, week.last_day, week.totals.entries
        )?;
    }
    writeln!(writer)?;
    writeln!(writer, "Total weeks: {}", summary.weeks.len())?;
    write_grand_total(writer, summary.grand.entries, summary.grand.minutes)?;
    let (hours, minutes) = hm(summary.average_minutes_per_week());
    writeln!(writer, "Average per week: {hours}h {minutes:02}m")
}

pub fn write_monthly_summary<W: Write>(writer: &mut W, entries: &LogCollection) -> io::Result<()> {
    if entries.is_empty() {
        return writeln!(writer, "{EMPTY}");
    }
    let summary = by_month(entries);

    writeln!(writer, "=== MONTHLY SUMMARY ===")?;
    writeln!(writer)?;
    for month in &summary.months {
        let (hours, minutes) = hm(month.totals.minutes);
        let name = usize::try_from(month.month - 1)
            .ok()
            .and_then(|idx| MONTH_NAMES.get(idx))
            .copied()
            .unwrap_or("?");
        writeln!(
            writer,
            "{:04} {name}: {hours:3}h {minutes:02}m ({} entries across {} days)",
            month.year, month.totals.entries, month.active_days
        )?;
    }
    writeln!(writer)?;
    writeln!(writer, "Total months: {}", summary.months.len())?;
    writeln!(writer, "Total days with entries: {}", summary.active_days)?;
    write_grand_total(writer, summary.grand.entries, summary.grand.minutes)?;
    let (hours, minutes) = hm(summary.average_minutes_per_month());
    writeln!(writer, "Average per month: {hours}h {minutes:02}m")?;
    let (hours, minutes) = hm(summary.average_minutes_per_active_day());
    writeln!(writer, "Average per working day: {hours}h {minutes:02}m")
}

fn write_grand_total<W: Write>(writer: &mut W, entries: usize, minutes: u64) -> io::Result<()> {
    let (hours, minutes) = hm(minutes);
    writeln!(writer, "Total entries: {entries}")?;
    writeln!(writer, "Total time: {hours}h {minutes:02}m")
}

/// Quotes a CSV field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn hashed_tags(entry: &LogEntry) -> Vec<String> {
    entry.tags.iter().map(|tag| format!("#{tag}")).collect()
}

pub fn write_csv<W: Write>(writer: &mut W, entries: &LogCollection) -> io::Result<()> {
    writeln!(
        writer,
        "Date,Start,End,Duration_Minutes,Description,Tags,Percentage"
    )?;
    for entry in entries {
        let description = entry.description.as_deref().unwrap_or_default();
        let tags = hashed_tags(entry).join(";");
        let percentage = if entry.percentage > 0 {
            entry.percentage.to_string()
        } else {
            String::new()
        };
        writeln!(
            writer,
            "{},{},{},{},{},{},{percentage}",
            entry.date,
            entry.span.start(),
            entry.span.end(),
            entry.duration_minutes(),
            csv_field(description),
            csv_field(&tags),
        )?;
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    total_entries: usize,
    entries: Vec<JsonEntry<'a>>,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    date: Date,
    start: TimeOfDay,
    end: TimeOfDay,
    duration_minutes: u32,
    description: Option<&'a str>,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    percentage: Option<u8>,
}

impl<'a> From<&'a LogEntry> for JsonEntry<'a> {
    fn from(entry: &'a LogEntry) -> Self {
        Self {
            date: entry.date,
            start: entry.span.start(),
            end: entry.span.end(),
            duration_minutes: entry.duration_minutes(),
            description: entry.description.as_deref(),
            tags: hashed_tags(entry),
            percentage: (entry.percentage > 0).then_some(entry.percentage),
        }
    }
}

pub fn write_json<W: Write>(writer: &mut W, entries: &LogCollection) -> io::Result<()> {
    let report = JsonReport {
        total_entries: entries.len(),
        entries: entries.iter().map(JsonEntry::from).collect(),
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)
}
