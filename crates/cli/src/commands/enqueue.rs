// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{self, Write};

use syncq_core::{MutationKind, QueueStore};

use crate::cli::OutputFormat;
use crate::error::{Error, Result};

use super::{write_json, Context};

pub fn run(ctx: &Context, kind: &str, payload: &str, output: OutputFormat) -> Result<()> {
    let store = ctx.open_store()?;
    run_impl(&store, kind, payload, output, &mut io::stdout())
}

pub(crate) fn run_impl(
    store: &QueueStore,
    kind: &str,
    payload: &str,
    output: OutputFormat,
    out: &mut impl Write,
) -> Result<()> {
    let kind: MutationKind = kind.parse()?;
    let data: serde_json::Value =
        serde_json::from_str(payload).map_err(|e| Error::InvalidPayload(e.to_string()))?;

    let record = store.try_enqueue(kind, data)?;
    match output {
        OutputFormat::Text => writeln!(out, "Queued {} {}", record.kind, record.id)?,
        OutputFormat::Json => write_json(out, &record)?,
    }
    Ok(())
}

#[cfg(test)]
#[path = "enqueue_tests.rs"]
mod tests;
