// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{self, Write};

use syncq_core::{QueueRecord, QueueStore};

use crate::cli::OutputFormat;
use crate::error::Result;

use super::{read_queue, write_json, Context};

pub fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let store = ctx.open_store()?;
    run_impl(&store, ctx.config.sync.max_retries, output, &mut io::stdout())
}

pub(crate) fn run_impl(
    store: &QueueStore,
    max_retries: u32,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let records = read_queue(store)?;
    match output {
        OutputFormat::Json => write_json(out, &records)?,
        OutputFormat::Text if records.is_empty() => writeln!(out, "No pending mutations")?,
        OutputFormat::Text => {
            for record in &records {
                writeln!(out, "{}", format_record_line(record, max_retries))?;
            }
        }
    }
    Ok(())
}

/// `<id>  <kind>  <created>` plus a retry marker when delivery has failed.
pub(crate) fn format_record_line(record: &QueueRecord, max_retries: u32) -> String {
    let created = record
        .created_at_utc()
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| record.created_at.to_string());
    let mut line = format!("{}  {}  {}", record.id, record.kind, created);

    if record.is_exhausted(max_retries) {
        line.push_str(&format!("  [exhausted after {} attempts]", record.retry_count));
    } else if record.is_retrying() {
        line.push_str(&format!("  [retry {}/{}]", record.retry_count, max_retries));
    }
    line
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
