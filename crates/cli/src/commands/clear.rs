// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::{self, Write};

use syncq_core::QueueStore;

use crate::error::Result;

use super::{mutations, Context};

pub fn run(ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    run_impl(&store, &mut io::stdout())
}

pub(crate) fn run_impl(store: &QueueStore, out: &mut impl Write) -> Result<()> {
    // A corrupt queue still clears.
    let dropped = store.list().len();
    store.try_clear()?;
    writeln!(out, "Cleared {}", mutations(dropped))?;
    Ok(())
}

#[cfg(test)]
#[path = "clear_tests.rs"]
mod tests;
