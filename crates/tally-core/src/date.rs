//! Calendar dates and wall-clock times with validation.
//!
//! All values are naive local wall-clock values; there is no timezone model.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Earliest year accepted by [`Date::new`].
pub const MIN_YEAR: i32 = 1900;

/// Latest year accepted by [`Date::new`].
pub const MAX_YEAR: i32 = 2100;

/// Validation errors for dates and times.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    /// The year, month or day is outside its calendar range.
    #[error("invalid date {year:04}-{month:02}-{day:02}")]
    OutOfRange { year: i32, month: u32, day: u32 },

    /// The text is not shaped like `YYYY-MM-DD`.
    #[error("invalid date format '{value}' (use YYYY-MM-DD)")]
    Format { value: String },

    /// The hour or minute is outside its range.
    #[error("invalid time {hour:02}:{minute:02} (hours must be 0-23, minutes 0-59)")]
    InvalidTime { hour: u32, minute: u32 },
}

/// Returns true for Gregorian leap years.
#[must_use]
pub const fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in the given month, or 0 for an invalid month.
#[must_use]
pub const fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// A validated calendar date.
///
/// Ordering is lexicographic on (year, month, day), which the derive gives us
/// from the field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date {
    year: i32,
    month: u32,
    day: u32,
}

impl Date {
    /// Creates a date after checking year, month and day ranges.
    pub const fn new(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        if year < MIN_YEAR
            || year > MAX_YEAR
            || month < 1
            || month > 12
            || day < 1
            || day > days_in_month(year, month)
        {
            return Err(DateError::OutOfRange { year, month, day });
        }
        Ok(Self { year, month, day })
    }

    /// Today's local calendar date.
    ///
    /// Falls back to 1970-01-01 if the clock reports a year outside the
    /// supported range.
    #[must_use]
    pub fn today() -> Self {
        Self::from_naive(Local::now().date_naive()).unwrap_or(Self {
            year: 1970,
            month: 1,
            day: 1,
        })
    }

    /// Converts from a `chrono` date, validating the supported year range.
    pub fn from_naive(date: NaiveDate) -> Result<Self, DateError> {
        Self::new(date.year(), date.month(), date.day())
    }

    /// Converts to a `chrono` date.
    #[must_use]
    pub fn to_naive(self) -> NaiveDate {
        // Every validated Date is representable.
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).unwrap_or_default()
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    #[must_use]
    pub const fn day(self) -> u32 {
        self.day
    }

    /// Returns the ISO-8601 week containing this date.
    ///
    /// The week belongs to the year of its Thursday: find the Thursday of the
    /// Monday-based week, then count whole weeks from January 1 of that
    /// Thursday's year.
    #[must_use]
    pub fn iso_week(self) -> IsoWeek {
        let date = self.to_naive();
        let days_from_monday = i64::from(date.weekday().num_days_from_monday());
        let thursday = date + chrono::Duration::days(3 - days_from_monday);
        IsoWeek {
            year: thursday.year(),
            week: (thursday.ordinal() - 1) / 7 + 1,
        }
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for Date {
    type Err = DateError;

    /// Parses `YYYY-MM-DD` (month and day may omit the leading zero).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || DateError::Format {
            value: s.to_string(),
        };
        let mut parts = s.trim().splitn(3, '-');
        let year = parts
            .next()
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or_else(format_err)?;
        let month = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(format_err)?;
        let day = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(format_err)?;
        Self::new(year, month, day)
    }
}

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// An ISO-8601 week: the week-numbering year and the week number (1-53).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct IsoWeek {
    pub year: i32,
    pub week: u32,
}

impl fmt::Display for IsoWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    /// Creates a time after checking `hour` in 0-23 and `minute` in 0-59.
    pub const fn new(hour: u32, minute: u32) -> Result<Self, DateError> {
        if hour > 23 || minute > 59 {
            return Err(DateError::InvalidTime { hour, minute });
        }
        Ok(Self { hour, minute })
    }

    #[must_use]
    pub const fn hour(self) -> u32 {
        self.hour
    }

    #[must_use]
    pub const fn minute(self) -> u32 {
        self.minute
    }

    /// Minutes elapsed since midnight.
    #[must_use]
    pub const fn minutes_since_midnight(self) -> u32 {
        self.hour * 60 + self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = DateError;

    /// Parses `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = s.split_once(':').ok_or_else(|| DateError::Format {
            value: s.to_string(),
        })?;
        let hour = hour.parse().map_err(|_| DateError::Format {
            value: s.to_string(),
        })?;
        let minute = minute.parse().map_err(|_| DateError::Format {
            value: s.to_string(),
        })?;
        Self::new(hour, minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::new(y, m, d).unwrap()
    }

    #[test]
    fn date_validates_ranges() {
        assert!(Date::new(2024, 2, 29).is_ok());
        assert!(Date::new(2023, 2, 29).is_err());
        assert!(Date::new(1900, 2, 29).is_err());
        assert!(Date::new(2000, 2, 29).is_ok());
        assert!(Date::new(1899, 12, 31).is_err());
        assert!(Date::new(2101, 1, 1).is_err());
        assert!(Date::new(2024, 13, 1).is_err());
        assert!(Date::new(2024, 4, 31).is_err());
        assert!(Date::new(2024, 1, 0).is_err());
    }

    #[test]
    fn date_ordering_is_lexicographic() {
        let a = date(2023, 12, 31);
        let b = date(2024, 1, 1);
        let c = date(2024, 1, 2);
        assert!(a < b && b < c && a < c);
        assert_eq!(b.cmp(&b), std::cmp::Ordering::Equal);
        assert!(date(2024, 2, 1) > date(2024, 1, 31));
    }

    #[test]
    fn date_ordering_is_total_over_a_sample() {
        let dates = [
            date(2024, 1, 1),
            date(2023, 6, 15),
            date(2024, 1, 1),
            date(2024, 12, 31),
            date(1900, 1, 1),
        ];
        for a in &dates {
            for b in &dates {
                let relations = [a < b, a == b, a > b];
                assert_eq!(relations.iter().filter(|r| **r).count(), 1);
                for c in &dates {
                    if a < b && b < c {
                        assert!(a < c);
                    }
                }
            }
        }
    }

    #[test]
    fn date_parses_and_displays() {
        let d: Date = "2024-02-06".parse().unwrap();
        assert_eq!(d, date(2024, 2, 6));
        assert_eq!(d.to_string(), "2024-02-06");
        assert!("2024/02/06".parse::<Date>().is_err());
        assert!("2024-02-30".parse::<Date>().is_err());
    }

    #[test]
    fn iso_week_of_new_years_day() {
        // 2024-01-01 is a Monday
        assert_eq!(date(2024, 1, 1).iso_week(), IsoWeek { year: 2024, week: 1 });
        // 2023-01-01 is a Sunday
        assert_eq!(date(2023, 1, 1).iso_week(), IsoWeek { year: 2022, week: 52 });
    }

    #[test]
    fn iso_week_year_end_rolls_forward() {
        // 2024-12-30 is a Monday whose Thursday is 2025-01-02
        assert_eq!(date(2024, 12, 30).iso_week(), IsoWeek { year: 2025, week: 1 });
        // 2020 has 53 ISO weeks
        assert_eq!(date(2020, 12, 31).iso_week(), IsoWeek { year: 2020, week: 53 });
    }

    #[test]
    fn iso_week_matches_chrono() {
        let mut day = NaiveDate::from_ymd_opt(2019, 12, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        while day < end {
            let ours = Date::from_naive(day).unwrap().iso_week();
            let theirs = day.iso_week();
            assert_eq!((ours.year, ours.week), (theirs.year(), theirs.week()), "{day}");
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn time_of_day_validates() {
        assert!(TimeOfDay::new(23, 59).is_ok());
        assert!(TimeOfDay::new(24, 0).is_err());
        assert!(TimeOfDay::new(12, 60).is_err());
        assert_eq!(TimeOfDay::new(8, 5).unwrap().to_string(), "08:05");
        assert_eq!(TimeOfDay::new(1, 30).unwrap().minutes_since_midnight(), 90);
    }

    #[test]
    fn date_serde_uses_iso_text() {
        let json = serde_json::to_string(&date(2024, 3, 1)).unwrap();
        assert_eq!(json, "\"2024-03-01\"");
        let parsed: Date = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, date(2024, 3, 1));
    }
}
