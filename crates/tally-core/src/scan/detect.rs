//! Content sniffing for candidate files.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use crate::grammar::{starts_with_date_shape, starts_with_time_shape};

/// Bytes read from the start of a file when deciding whether it is text.
pub const TEXT_SAMPLE_BYTES: u64 = 512;

/// Lines read from the start of a file when looking for time entries.
pub const SAMPLE_LINES: usize = 50;

const ESC: u8 = 0x1b;

/// Returns true if `sample` is non-empty and free of binary markers.
///
/// A NUL byte or a control byte other than `\n`, `\r`, `\t` and ESC marks
/// the data as binary.
#[must_use]
pub fn looks_like_text(sample: &[u8]) -> bool {
    !sample.is_empty()
        && sample
            .iter()
            .all(|&b| b >= 0x20 || matches!(b, b'\n' | b'\r' | b'\t' | ESC))
}

/// Reads the first [`TEXT_SAMPLE_BYTES`] of `path` and checks them.
pub fn is_text_file(path: &Path) -> io::Result<bool> {
    let mut sample = Vec::new();
    File::open(path)?
        .take(TEXT_SAMPLE_BYTES)
        .read_to_end(&mut sample)?;
    Ok(looks_like_text(&sample))
}

/// Shape counts from the first [`SAMPLE_LINES`] lines of a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogSample {
    pub time_entries: usize,
    pub date_headers: usize,
}

impl LogSample {
    /// A file with at least one time-entry line is treated as a time log.
    #[must_use]
    pub const fn is_time_log(&self) -> bool {
        self.time_entries > 0
    }
}

/// Counts entry-shaped and header-shaped lines at the start of `reader`.
pub fn sample_time_log<R: BufRead>(mut reader: R) -> io::Result<LogSample> {
    let mut sample = LogSample::default();
    let mut buf = Vec::new();
    for _ in 0..SAMPLE_LINES {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if starts_with_time_shape(&line) {
            sample.time_entries += 1;
        }
        if starts_with_date_shape(&line) {
            sample.date_headers += 1;
        }
    }
    Ok(sample)
}

pub fn sample_time_log_file(path: &Path) -> io::Result<LogSample> {
    sample_time_log(BufReader::new(File::open(path)?))
}
