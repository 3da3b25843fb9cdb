//! Query command: report on entries stored in the database.

use std::io::Write;

use anyhow::Result;
use tally_db::{Database, EntryQuery};

use crate::cli::ReportArgs;
use crate::render::render;

/// Database-side narrowing beyond the shared report filters.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub file_contains: Option<String>,
    pub description_contains: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

fn entry_query(args: &ReportArgs, options: QueryOptions) -> EntryQuery {
    EntryQuery {
        from: args.from,
        to: args.to,
        tag: args.tag.clone(),
        file_contains: options.file_contains,
        description_contains: options.description_contains,
        limit: options.limit,
        offset: options.offset,
    }
}

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    args: &ReportArgs,
    options: QueryOptions,
) -> Result<()> {
    let query = entry_query(args, options);
    tracing::debug!(?query, "querying entries");
    let entries = db.load_collection(&query)?;
    render(writer, args.view(), &entries)?;
    Ok(())
}
