//! Report command: summarize one log read from a file or standard input.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tally_core::{ParseContext, SpanPolicy, parse_reader};

use crate::cli::ReportArgs;
use crate::render::render;

/// Parses `reader` starting from today's date and writes the selected report.
pub fn run<W: Write, R: BufRead>(
    writer: &mut W,
    reader: R,
    args: &ReportArgs,
    policy: &SpanPolicy,
) -> Result<()> {
    let outcome =
        parse_reader(reader, ParseContext::today(), policy).context("failed to read time log")?;
    tracing::debug!(
        entries = outcome.entries.len(),
        diagnostics = outcome.diagnostics.len(),
        "parsed time log"
    );

    let entries = args.filter().apply(&outcome.entries);
    render(writer, args.view(), &entries)?;
    Ok(())
}
