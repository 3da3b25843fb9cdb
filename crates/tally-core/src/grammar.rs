//! Fixed-shape line classification.
//!
//! Every check here is positional: a byte at a given offset must fall in a
//! given range. There is no backtracking and no regex engine.

/// The kind of a raw log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `# YYYY-MM-DD`, establishing the date for following entries.
    DateHeader,
    /// `HHMM-HHMM ...`, a time range with an optional payload.
    TimeEntry,
    /// Anything else; ignored.
    Other,
}

/// Strips the leading spaces and tabs the classifier ignores.
#[must_use]
pub fn skip_indent(line: &str) -> &str {
    line.trim_start_matches([' ', '\t'])
}

/// Classifies one line (newline already removed).
///
/// Leading spaces and tabs are skipped. Calendar correctness of a header is
/// not checked here, only the character shape.
#[must_use]
pub fn classify_line(line: &str) -> LineKind {
    let bytes = skip_indent(line).as_bytes();
    if is_date_header(bytes) {
        LineKind::DateHeader
    } else if is_time_entry(bytes) {
        LineKind::TimeEntry
    } else {
        LineKind::Other
    }
}

fn in_range(bytes: &[u8], idx: usize, lo: u8, hi: u8) -> bool {
    bytes.get(idx).is_some_and(|b| (lo..=hi).contains(b))
}

fn is_digit(bytes: &[u8], idx: usize) -> bool {
    in_range(bytes, idx, b'0', b'9')
}

fn is_byte(bytes: &[u8], idx: usize, expected: u8) -> bool {
    bytes.get(idx) == Some(&expected)
}

/// `# ` + `[1-2]ddd-[0-1]d-[0-3]d`
fn is_date_header(b: &[u8]) -> bool {
    is_byte(b, 0, b'#')
        && is_byte(b, 1, b' ')
        && in_range(b, 2, b'1', b'2')
        && is_digit(b, 3)
        && is_digit(b, 4)
        && is_digit(b, 5)
        && is_byte(b, 6, b'-')
        && in_range(b, 7, b'0', b'1')
        && is_digit(b, 8)
        && is_byte(b, 9, b'-')
        && in_range(b, 10, b'0', b'3')
        && is_digit(b, 11)
}

/// `[0-2]d[0-5]d-[0-2]d[0-5]d` followed by end of line or a space.
fn is_time_entry(b: &[u8]) -> bool {
    in_range(b, 0, b'0', b'2')
        && is_digit(b, 1)
        && in_range(b, 2, b'0', b'5')
        && is_digit(b, 3)
        && is_byte(b, 4, b'-')
        && in_range(b, 5, b'0', b'2')
        && is_digit(b, 6)
        && in_range(b, 7, b'0', b'5')
        && is_digit(b, 8)
        && matches!(b.get(9), None | Some(b' ' | b'\n'))
}

/// Loose `^\d{4}-\d{4}` shape used when sniffing files during a scan.
#[must_use]
pub fn starts_with_time_shape(line: &str) -> bool {
    let b = line.as_bytes();
    (0..4).all(|i| is_digit(b, i)) && is_byte(b, 4, b'-') && (5..9).all(|i| is_digit(b, i))
}

/// Loose `^# \d{4}-\d{2}-\d{2}` shape used when sniffing files during a scan.
#[must_use]
pub fn starts_with_date_shape(line: &str) -> bool {
    let b = line.as_bytes();
    is_byte(b, 0, b'#')
        && is_byte(b, 1, b' ')
        && (2..6).all(|i| is_digit(b, i))
        && is_byte(b, 6, b'-')
        && (7..9).all(|i| is_digit(b, i))
        && is_byte(b, 9, b'-')
        && (10..12).all(|i| is_digit(b, i))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_reference_lines() {
        assert_eq!(classify_line("# 2024-02-06"), LineKind::DateHeader);
        assert_eq!(
            classify_line("0800-0900 write docs #work %50"),
            LineKind::TimeEntry
        );
        assert_eq!(classify_line("random text"), LineKind::Other);
    }

    #[test]
    fn skips_leading_whitespace() {
        assert_eq!(classify_line("  \t# 2024-02-06"), LineKind::DateHeader);
        assert_eq!(classify_line("\t0800-0900"), LineKind::TimeEntry);
    }

    #[test]
    fn time_entry_needs_space_or_end_after_range() {
        assert_eq!(classify_line("0800-0900"), LineKind::TimeEntry);
        assert_eq!(classify_line("0800-0900x"), LineKind::Other);
        assert_eq!(classify_line("0800-0900\tdocs"), LineKind::Other);
        assert_eq!(classify_line("0800-090"), LineKind::Other);
    }

    #[test]
    fn classifier_checks_shape_not_values() {
        // Hour 29 passes the shape test; the entry parser rejects it later.
        assert_eq!(classify_line("2900-2930"), LineKind::TimeEntry);
        assert_eq!(classify_line("0860-0900"), LineKind::Other);
        assert_eq!(classify_line("3000-0900"), LineKind::Other);
        // Month 19 passes the header shape test; date validation rejects it.
        assert_eq!(classify_line("# 2024-19-39"), LineKind::DateHeader);
        assert_eq!(classify_line("# 3024-01-01"), LineKind::Other);
    }

    #[test]
    fn header_requires_hash_space() {
        assert_eq!(classify_line("#2024-02-06"), LineKind::Other);
        assert_eq!(classify_line("## 2024-02-06"), LineKind::Other);
        assert_eq!(classify_line("# 2024-02-06 notes"), LineKind::DateHeader);
    }

    #[test]
    fn empty_line_is_other() {
        assert_eq!(classify_line(""), LineKind::Other);
        assert_eq!(classify_line("   "), LineKind::Other);
    }

    #[test]
    fn sniff_shapes_do_not_skip_indent() {
        assert!(starts_with_time_shape("0800-0900 docs"));
        assert!(starts_with_time_shape("9999-9999"));
        assert!(!starts_with_time_shape(" 0800-0900"));
        assert!(starts_with_date_shape("# 2024-03-01"));
        assert!(!starts_with_date_shape("# 2024-3-01"));
    }
}
