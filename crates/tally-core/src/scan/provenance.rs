//! Inferring a date for files that carry no date headers.

use std::borrow::Cow;
use std::fs::Metadata;
use std::path::{Component, Path};

use chrono::{DateTime, Local};

use crate::date::Date;

/// Earliest year accepted from a file name or path.
const MIN_INFERRED_YEAR: i64 = 2000;
const MAX_INFERRED_YEAR: i64 = 2100;

/// Reads a decimal integer the way a `%d` conversion does: leading ASCII
/// whitespace is skipped, then an optional sign and at least one digit.
/// `width` caps the characters consumed after the whitespace (0 = no cap).
fn scan_int(input: &str, width: usize) -> Option<(i64, &str)> {
    let s = input.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let bytes = s.as_bytes();
    let limit = if width == 0 {
        bytes.len()
    } else {
        width.min(bytes.len())
    };

    let mut end = 0;
    let negative = match bytes.first() {
        Some(b'-') if limit > 0 => {
            end = 1;
            true
        }
        Some(b'+') if limit > 0 => {
            end = 1;
            false
        }
        _ => false,
    };
    let digits_start = end;
    while end < limit && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    let magnitude: i64 = s[digits_start..end].parse().ok()?;
    Some((if negative { -magnitude } else { magnitude }, &s[end..]))
}

/// `<int>-<int>-<int>` at the start of `input`.
fn scan_dashed(input: &str) -> Option<(i64, i64, i64)> {
    let (a, rest) = scan_int(input, 0)?;
    let (b, rest) = scan_int(rest.strip_prefix('-')?, 0)?;
    let (c, _) = scan_int(rest.strip_prefix('-')?, 0)?;
    Some((a, b, c))
}

/// Four, two and two characters of digits packed together.
fn scan_packed(input: &str) -> Option<(i64, i64, i64)> {
    let (a, rest) = scan_int(input, 4)?;
    let (b, rest) = scan_int(rest, 2)?;
    let (c, _) = scan_int(rest, 2)?;
    Some((a, b, c))
}

fn inferred(year: i64, month: i64, day: i64) -> Option<Date> {
    if !(MIN_INFERRED_YEAR..=MAX_INFERRED_YEAR).contains(&year) {
        return None;
    }
    Date::new(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )
    .ok()
}

/// Extracts a date from the start of a file name.
///
/// Tries `YYYY-MM-DD`, then `YYYYMMDD`, then `DD-MM-YYYY`. Anything may
/// follow the date, so `2024-03-01.log` and `20240301_notes.txt` both match.
#[must_use]
pub fn extract_date_from_filename(filename: &str) -> Option<Date> {
    let dashed = scan_dashed(filename);
    dashed
        .and_then(|(y, m, d)| inferred(y, m, d))
        .or_else(|| scan_packed(filename).and_then(|(y, m, d)| inferred(y, m, d)))
        .or_else(|| dashed.and_then(|(d, m, y)| inferred(y, m, d)))
}

/// Extracts a date from the components of `path`.
///
/// Each component is first tried as a file name; otherwise a component
/// holding a year followed by month and day components (`2024/03/01`)
/// is accepted.
#[must_use]
pub fn extract_date_from_path(path: &Path) -> Option<Date> {
    let components: Vec<Cow<'_, str>> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    for (idx, component) in components.iter().enumerate() {
        if let Some(date) = extract_date_from_filename(component) {
            return Some(date);
        }
        let triple = components.get(idx..idx + 3).and_then(|parts| {
            let leading = |s: &str| scan_int(s, 0).map(|(n, _)| n);
            inferred(leading(&parts[0])?, leading(&parts[1])?, leading(&parts[2])?)
        });
        if triple.is_some() {
            return triple;
        }
    }
    None
}

/// The local calendar date of a file's modification time.
#[must_use]
pub fn date_from_mtime(metadata: &Metadata) -> Option<Date> {
    let modified = metadata.modified().ok()?;
    Date::from_naive(DateTime::<Local>::from(modified).date_naive()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::new(y, m, d).unwrap()
    }

    #[test]
    fn filename_patterns_in_order() {
        assert_eq!(
            extract_date_from_filename("2024-03-01.log"),
            Some(date(2024, 3, 1))
        );
        assert_eq!(
            extract_date_from_filename("20240301_notes.txt"),
            Some(date(2024, 3, 1))
        );
        assert_eq!(
            extract_date_from_filename("01-03-2024.txt"),
            Some(date(2024, 3, 1))
        );
        assert_eq!(
            extract_date_from_filename("2024-3-1"),
            Some(date(2024, 3, 1))
        );
    }

    #[test]
    fn filename_rejects_out_of_range() {
        assert_eq!(extract_date_from_filename("1999-03-01.log"), None);
        assert_eq!(extract_date_from_filename("2024-02-30.log"), None);
        assert_eq!(extract_date_from_filename("notes.txt"), None);
        assert_eq!(extract_date_from_filename("log-2024-03-01.txt"), None);
    }

    #[test]
    fn path_component_triple() {
        assert_eq!(
            extract_date_from_path(Path::new("/home/me/logs/2024/03/01.txt")),
            Some(date(2024, 3, 1))
        );
        assert_eq!(
            extract_date_from_path(Path::new("/archive/2023-12-24/notes.txt")),
            Some(date(2023, 12, 24))
        );
        assert_eq!(
            extract_date_from_path(Path::new("/archive/2024/13/01/notes.txt")),
            None
        );
        assert_eq!(extract_date_from_path(Path::new("/home/me/notes.txt")), None);
    }

    #[test]
    fn scan_int_follows_conversion_rules() {
        assert_eq!(scan_int("  42abc", 0), Some((42, "abc")));
        assert_eq!(scan_int("-7", 0), Some((-7, "")));
        assert_eq!(scan_int("123456", 4), Some((1234, "56")));
        assert_eq!(scan_int("abc", 0), None);
        assert_eq!(scan_int("-", 0), None);
    }

    #[test]
    fn mtime_of_fresh_file_is_today() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let metadata = file.as_file().metadata().unwrap();
        assert_eq!(date_from_mtime(&metadata), Some(Date::today()));
    }
}
