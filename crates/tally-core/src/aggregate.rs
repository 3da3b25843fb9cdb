//! Rollups of a collection by tag, day, ISO week and month.
//!
//! Every rollup keeps groups in the order they are first seen in the input,
//! which for a chronological log is also calendar order.

use indexmap::IndexMap;
use serde::Serialize;

use crate::date::{Date, IsoWeek};
use crate::entry::{LogCollection, Tag};

/// Integer mean, or 0 when there is nothing to divide by.
fn mean(total: u64, count: usize) -> u64 {
    match u64::try_from(count) {
        Ok(0) | Err(_) => 0,
        Ok(count) => total / count,
    }
}

/// Minutes and entry count for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub minutes: u64,
    pub entries: usize,
}

impl Totals {
    fn add(&mut self, minutes: u32) {
        self.minutes += u64::from(minutes);
        self.entries += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagTotal {
    pub tag: Tag,
    #[serde(flatten)]
    pub totals: Totals,
}

/// Time per tag. An entry with several tags counts fully toward each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub tags: Vec<TagTotal>,
    /// Entries in the collection, tagged or not.
    pub total_entries: usize,
    /// Sum of entry durations, each entry counted once.
    pub total_minutes: u64,
}

pub fn by_tag(entries: &LogCollection) -> TagSummary {
    let mut groups: IndexMap<&Tag, Totals> = IndexMap::new();
    for entry in entries {
        for tag in &entry.tags {
            groups
                .entry(tag)
                .or_default()
                .add(entry.duration_minutes());
        }
    }
    TagSummary {
        tags: groups
            .into_iter()
            .map(|(tag, totals)| TagTotal {
                tag: tag.clone(),
                totals,
            })
            .collect(),
        total_entries: entries.len(),
        total_minutes: entries.total_minutes(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub date: Date,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    pub days: Vec<DayTotal>,
    pub grand: Totals,
}

impl DailySummary {
    #[must_use]
    pub fn average_minutes_per_day(&self) -> u64 {
        mean(self.grand.minutes, self.days.len())
    }
}

pub fn by_day(entries: &LogCollection) -> DailySummary {
    let mut groups: IndexMap<Date, Totals> = IndexMap::new();
    let mut grand = Totals::default();
    for entry in entries {
        groups
            .entry(entry.date)
            .or_default()
            .add(entry.duration_minutes());
        grand.add(entry.duration_minutes());
    }
    DailySummary {
        days: groups
            .into_iter()
            .map(|(date, totals)| DayTotal { date, totals })
            .collect(),
        grand,
    }
}

/// One ISO week, with the earliest and latest entry dates seen in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekTotal {
    pub week: IsoWeek,
    pub first_day: Date,
    pub last_day: Date,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeeklySummary {
    pub weeks: Vec<WeekTotal>,
    pub grand: Totals,
}

impl WeeklySummary {
    #[must_use]
    pub fn average_minutes_per_week(&self) -> u64 {
        mean(self.grand.minutes, self.weeks.len())
    }
}

pub fn by_week(entries: &LogCollection) -> WeeklySummary {
    let mut groups: IndexMap<IsoWeek, WeekTotal> = IndexMap::new();
    let mut grand = Totals::default();
    for entry in entries {
        let week = entry.date.iso_week();
        let bucket = groups.entry(week).or_insert_with(|| WeekTotal {
            week,
            first_day: entry.date,
            last_day: entry.date,
            totals: Totals::default(),
        });
        bucket.first_day = bucket.first_day.min(entry.date);
        bucket.last_day = bucket.last_day.max(entry.date);
        bucket.totals.add(entry.duration_minutes());
        grand.add(entry.duration_minutes());
    }
    WeeklySummary {
        weeks: groups.into_values().collect(),
        grand,
    }
}

/// One calendar month, with the number of distinct days that have entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthTotal {
    pub year: i32,
    pub month: u32,
    pub active_days: usize,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    pub months: Vec<MonthTotal>,
    pub grand: Totals,
    /// Distinct days with entries across all months.
    pub active_days: usize,
}

impl MonthlySummary {
    #[must_use]
    pub fn average_minutes_per_month(&self) -> u64 {
        mean(self.grand.minutes, self.months.len())
    }

    #[must_use]
    pub fn average_minutes_per_active_day(&self) -> u64 {
        mean(self.grand.minutes, self.active_days)
    }
}

pub fn by_month(entries: &LogCollection) -> MonthlySummary {
    let mut groups: IndexMap<(i32, u32), MonthTotal> = IndexMap::new();
    let mut seen_days = indexmap::IndexSet::new();
    let mut grand = Totals::default();
    for entry in entries {
        let (year, month) = (entry.date.year(), entry.date.month());
        let bucket = groups.entry((year, month)).or_insert(MonthTotal {
            year,
            month,
            active_days: 0,
            totals: Totals::default(),
        });
        if seen_days.insert(entry.date) {
            bucket.active_days += 1;
        }
        bucket.totals.add(entry.duration_minutes());
        grand.add(entry.duration_minutes());
    }
    MonthlySummary {
        months: groups.into_values().collect(),
        grand,
        active_days: seen_days.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParseContext, parse_str};
    use crate::span::SpanPolicy;

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

    #[test]
    fn tag_totals_sum_durations_and_counts() {
        let entries = parse("0800-0900 a #work\n0900-0930 b #work");
        let summary = by_tag(&entries);
        assert_eq!(summary.tags.len(), 1);
        assert_eq!(summary.tags[0].tag.as_str(), "work");
        assert_eq!(
            summary.tags[0].totals,
            Totals {
                minutes: 90,
                entries: 2
            }
        );
        assert_eq!(summary.total_minutes, 90);
    }

    #[test]
    fn multi_tag_entry_counts_fully_toward_each_tag() {
        let entries = parse("0800-0900 pairing #work #mentoring\n0900-0915 break");
        let summary = by_tag(&entries);
        let names: Vec<&str> = summary.tags.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(names, ["work", "mentoring"]);
        assert!(summary.tags.iter().all(|t| t.totals.minutes == 60));
        // The untagged entry still counts toward the overall total.
        assert_eq!(summary.total_entries, 2);
        assert_eq!(summary.total_minutes, 75);
    }

    #[test]
    fn days_keep_first_seen_order() {
        let entries = parse(
            "# 2024-03-02\n0800-0900 a\n# 2024-03-01\n0800-0830 b\n# 2024-03-02\n1000-1100 c",
        );
        let summary = by_day(&entries);
        let days: Vec<(Date, u64)> = summary
            .days
            .iter()
            .map(|d| (d.date, d.totals.minutes))
            .collect();
        assert_eq!(days, [(date(2024, 3, 2), 120), (date(2024, 3, 1), 30)]);
        assert_eq!(summary.grand.entries, 3);
        assert_eq!(summary.average_minutes_per_day(), 75);
    }

    #[test]
    fn weeks_use_iso_week_year_and_track_bounds() {
        let entries = parse(
            "# 2024-12-31\n0800-0900 a\n# 2025-01-02\n0800-0900 b\n# 2024-12-30\n0800-0900 c",
        );
        let summary = by_week(&entries);
        assert_eq!(summary.weeks.len(), 1);
        let week = summary.weeks[0];
        assert_eq!(week.week, IsoWeek { year: 2025, week: 1 });
        assert_eq!(week.first_day, date(2024, 12, 30));
        assert_eq!(week.last_day, date(2025, 1, 2));
        assert_eq!(week.totals.entries, 3);
        assert_eq!(summary.average_minutes_per_week(), 180);
    }

    #[test]
    fn months_count_distinct_active_days() {
        let entries = parse(
            "# 2024-03-01\n0800-0900 a\n0900-1000 b\n# 2024-03-05\n0800-0900 c\n# 2024-04-01\n0800-1000 d",
        );
        let summary = by_month(&entries);
        let months: Vec<(i32, u32, usize, u64)> = summary
            .months
            .iter()
            .map(|m| (m.year, m.month, m.active_days, m.totals.minutes))
            .collect();
        assert_eq!(months, [(2024, 3, 2, 180), (2024, 4, 1, 120)]);
        assert_eq!(summary.active_days, 3);
        assert_eq!(summary.average_minutes_per_month(), 150);
        assert_eq!(summary.average_minutes_per_active_day(), 100);
    }

    #[test]
    fn empty_collection_has_zero_averages() {
        let empty = LogCollection::new();
        assert!(by_tag(&empty).tags.is_empty());
        assert_eq!(by_day(&empty).average_minutes_per_day(), 0);
        assert_eq!(by_week(&empty).average_minutes_per_week(), 0);
        let monthly = by_month(&empty);
        assert_eq!(monthly.average_minutes_per_month(), 0);
        assert_eq!(monthly.average_minutes_per_active_day(), 0);
    }
}
