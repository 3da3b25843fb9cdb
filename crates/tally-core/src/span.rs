//! Time spans and duration arithmetic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::date::TimeOfDay;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Thresholds for spans whose end is earlier than their start.
///
/// Such spans are read as crossing midnight. A long rollover is more likely a
/// typo than a night shift, so it is flagged and past a limit rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanPolicy {
    /// Rollovers longer than this are reported as suspicious.
    /// Default: 720 (12 hours).
    pub suspicious_rollover_minutes: u32,

    /// Rollovers longer than this are rejected.
    /// Default: 1200 (20 hours).
    pub max_rollover_minutes: u32,
}

impl Default for SpanPolicy {
    fn default() -> Self {
        Self {
            suspicious_rollover_minutes: 12 * 60,
            max_rollover_minutes: 20 * 60,
        }
    }
}

/// A span rejected by [`compute_duration`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpanError {
    #[error("invalid backwards timespan {start}-{end} ({minutes} minutes after rollover)")]
    Backward {
        start: TimeOfDay,
        end: TimeOfDay,
        minutes: u32,
    },
}

/// An accepted duration and how it was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanLength {
    /// `end >= start`.
    Forward(u32),
    /// `end < start`, read as crossing midnight.
    Rollover(u32),
    /// A rollover above the suspicious threshold but within the limit.
    SuspiciousRollover(u32),
}

impl SpanLength {
    #[must_use]
    pub const fn minutes(self) -> u32 {
        match self {
            Self::Forward(m) | Self::Rollover(m) | Self::SuspiciousRollover(m) => m,
        }
    }
}

/// Computes the minutes between `start` and `end`.
///
/// A negative difference is assumed to cross midnight and gets 1440 added.
pub fn compute_duration(
    start: TimeOfDay,
    end: TimeOfDay,
    policy: &SpanPolicy,
) -> Result<SpanLength, SpanError> {
    let start_minutes = start.minutes_since_midnight();
    let end_minutes = end.minutes_since_midnight();
    if end_minutes >= start_minutes {
        return Ok(SpanLength::Forward(end_minutes - start_minutes));
    }

    let minutes = end_minutes + MINUTES_PER_DAY - start_minutes;
    if minutes > policy.max_rollover_minutes {
        Err(SpanError::Backward {
            start,
            end,
            minutes,
        })
    } else if minutes > policy.suspicious_rollover_minutes {
        Ok(SpanLength::SuspiciousRollover(minutes))
    } else {
        Ok(SpanLength::Rollover(minutes))
    }
}

/// A start/end pair with its derived duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSpan {
    start: TimeOfDay,
    end: TimeOfDay,
    duration_minutes: u32,
}

impl TimeSpan {
    /// Builds a span, deriving its duration under `policy`.
    pub fn new(start: TimeOfDay, end: TimeOfDay, policy: &SpanPolicy) -> Result<Self, SpanError> {
        let duration = compute_duration(start, end, policy)?;
        Ok(Self::from_duration(start, end, duration))
    }

    /// Rebuilds a previously accepted span without applying rollover limits.
    #[must_use]
    pub const fn restore(start: TimeOfDay, end: TimeOfDay) -> Self {
        let start_minutes = start.minutes_since_midnight();
        let end_minutes = end.minutes_since_midnight();
        let duration_minutes = if end_minutes >= start_minutes {
            end_minutes - start_minutes
        } else {
            end_minutes + MINUTES_PER_DAY - start_minutes
        };
        Self {
            start,
            end,
            duration_minutes,
        }
    }

    pub(crate) const fn from_duration(start: TimeOfDay, end: TimeOfDay, duration: SpanLength) -> Self {
        Self {
            start,
            end,
            duration_minutes: duration.minutes(),
        }
    }

    #[must_use]
    pub const fn start(&self) -> TimeOfDay {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> TimeOfDay {
        self.end
    }

    #[must_use]
    pub const fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hhmm: u32) -> TimeOfDay {
        TimeOfDay::new(hhmm / 100, hhmm % 100).unwrap()
    }

    fn minutes(start: u32, end: u32) -> Result<u32, SpanError> {
        compute_duration(t(start), t(end), &SpanPolicy::default()).map(SpanLength::minutes)
    }

    #[test]
    fn forward_span() {
        assert_eq!(minutes(800, 900), Ok(60));
        assert_eq!(minutes(900, 900), Ok(0));
        assert_eq!(
            compute_duration(t(800), t(930), &SpanPolicy::default()),
            Ok(SpanLength::Forward(90))
        );
    }

    #[test]
    fn midnight_rollover() {
        assert_eq!(minutes(2330, 30), Ok(60));
        assert_eq!(minutes(2300, 100), Ok(120));
        assert_eq!(
            compute_duration(t(2300), t(100), &SpanPolicy::default()),
            Ok(SpanLength::Rollover(120))
        );
    }

    #[test]
    fn long_rollover_is_suspicious_but_accepted() {
        // 13 hours
        assert_eq!(
            compute_duration(t(1100), t(0), &SpanPolicy::default()),
            Ok(SpanLength::SuspiciousRollover(780))
        );
        // exactly 20 hours is still accepted
        assert_eq!(minutes(400, 0), Ok(1200));
    }

    #[test]
    fn suspicious_threshold_is_exclusive() {
        assert_eq!(
            compute_duration(t(2000), t(800), &SpanPolicy::default()),
            Ok(SpanLength::Rollover(720))
        );
        assert_eq!(
            compute_duration(t(2000), t(801), &SpanPolicy::default()),
            Ok(SpanLength::SuspiciousRollover(721))
        );
    }

    #[test]
    fn rollover_past_limit_is_rejected() {
        // 0900-0800 reads as 23 hours
        assert_eq!(
            minutes(900, 800),
            Err(SpanError::Backward {
                start: t(900),
                end: t(800),
                minutes: 1380,
            })
        );
        assert!(minutes(359, 0).is_err());
    }

    #[test]
    fn thresholds_come_from_policy() {
        let strict = SpanPolicy {
            suspicious_rollover_minutes: 30,
            max_rollover_minutes: 90,
        };
        assert_eq!(
            compute_duration(t(2330), t(0), &strict),
            Ok(SpanLength::Rollover(30))
        );
        assert_eq!(
            compute_duration(t(2300), t(0), &strict),
            Ok(SpanLength::SuspiciousRollover(60))
        );
        assert!(compute_duration(t(2300), t(100), &strict).is_err());
    }

    #[test]
    fn every_valid_forward_range_is_accepted() {
        let policy = SpanPolicy::default();
        for start in (0..24 * 60).step_by(37) {
            for end in (start..24 * 60).step_by(41) {
                let s = TimeOfDay::new(start / 60, start % 60).unwrap();
                let e = TimeOfDay::new(end / 60, end % 60).unwrap();
                let span = TimeSpan::new(s, e, &policy).unwrap();
                assert_eq!(span.duration_minutes(), end - start);
            }
        }
    }
}
