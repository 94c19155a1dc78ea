// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;

use chrono::Local;
use syncq_core::{SyncOrchestrator, SyncStatus};
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::error::Result;
use crate::probe::ProbeConnectivity;

use super::{mutations, runtime, Context};

pub fn run(ctx: &Context) -> Result<()> {
    runtime()?.block_on(watch_until(ctx, tokio::signal::ctrl_c(), &mut io::stdout()))
}

/// Probes and drains until `shutdown` resolves.
pub(crate) async fn watch_until(
    ctx: &Context,
    shutdown: impl Future<Output = io::Result<()>>,
    out: &mut impl Write,
) -> Result<()> {
    let store = ctx.open_store()?;
    let probe = Arc::new(ProbeConnectivity::from_config(&ctx.config)?);
    let processor = ctx.processor(Arc::clone(&store), Arc::clone(&probe))?;
    let orchestrator = Arc::new(SyncOrchestrator::start(processor));

    writeln!(
        out,
        "Watching {} (backend {}), Ctrl-C to stop",
        ctx.config.queue_path()?.display(),
        probe.target()
    )?;

    let mut status = orchestrator.watch_status();
    let initial = *status.borrow_and_update();
    writeln!(out, "{} {}", Local::now().format("%H:%M:%S"), describe(&initial))?;

    let mut ticker = tokio::time::interval(ctx.config.sync.probe_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal?;
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                writeln!(out, "{} {}", Local::now().format("%H:%M:%S"), describe(&current))?;
            }
            _ = ticker.tick() => {
                let state = probe.check().await;
                // Other processes may have enqueued since the last tick.
                let pending = orchestrator.refresh();
                if pending > 0 && !state.is_offline() && !orchestrator.is_syncing() {
                    debug!(pending, "draining on probe tick");
                    let orchestrator = Arc::clone(&orchestrator);
                    tokio::spawn(async move {
                        orchestrator.sync_now().await;
                    });
                }
            }
        }
    }

    orchestrator.shutdown();
    writeln!(out, "Stopped with {} pending", mutations(orchestrator.refresh()))?;
    Ok(())
}

/// One-line rendering of the aggregate sync state.
pub(crate) fn describe(status: &SyncStatus) -> String {
    let network = if status.offline { "offline" } else { "online" };
    let activity = if status.syncing { ", syncing" } else { "" };
    format!("{}, {} pending{}", network, mutations(status.pending_count), activity)
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
