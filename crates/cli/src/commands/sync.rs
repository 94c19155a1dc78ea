// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{self, Write};
use std::sync::Arc;

use serde::Serialize;
use syncq_core::{PassReport, ProcessOutcome, SyncOrchestrator};

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::probe::ProbeConnectivity;

use super::{mutations, runtime, write_json, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum SyncResult {
    Offline,
    Busy,
    Completed,
    Cancelled,
}

/// What a one-shot sync did.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SyncSummary {
    pub result: SyncResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PassReport>,
    pub pending: usize,
    pub backend: String,
}

pub fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let summary = runtime()?.block_on(sync_once(ctx))?;
    write_summary(&mut io::stdout(), output, &summary)
}

/// Probes once, then runs a single drain through the orchestrator.
pub(crate) async fn sync_once(ctx: &Context) -> Result<SyncSummary> {
    let store = ctx.open_store()?;
    let probe = Arc::new(ProbeConnectivity::from_config(&ctx.config)?);
    let processor = ctx.processor(Arc::clone(&store), Arc::clone(&probe))?;

    // Probe before starting so the reading is not seen as a reconnect edge.
    probe.check().await;
    let orchestrator = SyncOrchestrator::start(processor);
    let outcome = orchestrator.sync_now().await;
    orchestrator.shutdown();

    let (result, report) = match outcome {
        None | Some(ProcessOutcome::AlreadyRunning) => (SyncResult::Busy, None),
        Some(ProcessOutcome::Offline) => (SyncResult::Offline, None),
        Some(ProcessOutcome::Completed(report)) => (SyncResult::Completed, Some(report)),
        Some(ProcessOutcome::Cancelled(report)) => (SyncResult::Cancelled, Some(report)),
        Some(ProcessOutcome::Failed(e)) => return Err(e.into()),
    };

    Ok(SyncSummary { result, report, pending: store.pending_count(), backend: probe.target() })
}

pub(crate) fn write_summary(
    out: &mut impl Write,
    output: OutputFormat,
    summary: &SyncSummary,
) -> Result<()> {
    if output == OutputFormat::Json {
        return write_json(out, summary);
    }

    let pending = mutations(summary.pending);
    match (summary.result, summary.report) {
        (SyncResult::Offline, _) => {
            writeln!(out, "Backend unreachable at {}; {} pending", summary.backend, pending)?
        }
        (SyncResult::Busy, _) => writeln!(out, "Another sync is in progress; {} pending", pending)?,
        (result, Some(report)) => {
            let prefix = if result == SyncResult::Cancelled { "Cancelled: " } else { "" };
            writeln!(
                out,
                "{}Delivered {}, failed {}, timed out {}, skipped {}; {} pending",
                prefix,
                report.delivered,
                report.failed,
                report.timed_out,
                report.skipped,
                pending
            )?
        }
        (_, None) => writeln!(out, "{} pending", pending)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
