// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use syncq_core::QueueRecord;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::probe::ProbeConnectivity;

use super::{mutations, read_queue, runtime, write_json, Context};

/// Queue breakdown by retry state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueueSummary {
    pub pending: usize,
    pub retrying: usize,
    pub exhausted: usize,
}

impl QueueSummary {
    pub fn from_records(records: &[QueueRecord], max_retries: u32) -> Self {
        records.iter().fold(QueueSummary::default(), |mut summary, record| {
            summary.pending += 1;
            if record.is_exhausted(max_retries) {
                summary.exhausted += 1;
            } else if record.is_retrying() {
                summary.retrying += 1;
            }
            summary
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusJson<'a> {
    queue_path: &'a Path,
    #[serde(flatten)]
    summary: QueueSummary,
    backend: &'a str,
    reachable: bool,
}

pub fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let store = ctx.open_store()?;
    let queue_path = ctx.config.queue_path()?;
    let summary = QueueSummary::from_records(&read_queue(&store)?, ctx.config.sync.max_retries);

    let probe = ProbeConnectivity::from_config(&ctx.config)?;
    let reachable = !runtime()?.block_on(probe.check()).is_offline();

    write_status(
        &mut io::stdout(),
        output,
        &queue_path,
        summary,
        &ctx.config.backend.url,
        reachable,
    )
}

pub(crate) fn write_status(
    out: &mut impl Write,
    output: OutputFormat,
    queue_path: &Path,
    summary: QueueSummary,
    backend: &str,
    reachable: bool,
) -> Result<()> {
    match output {
        OutputFormat::Json => {
            write_json(out, &StatusJson { queue_path, summary, backend, reachable })
        }
        OutputFormat::Text => {
            writeln!(out, "Queue:     {}", queue_path.display())?;
            writeln!(out, "Pending:   {}", mutations(summary.pending))?;
            writeln!(out, "Retrying:  {}", summary.retrying)?;
            writeln!(out, "Exhausted: {}", summary.exhausted)?;
            let reach = if reachable { "reachable" } else { "unreachable" };
            writeln!(out, "Backend:   {} ({})", backend, reach)?;
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
