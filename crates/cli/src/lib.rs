// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! syncq - deliver mutations recorded offline once the backend is reachable.
//!
//! This crate wires [`syncq_core`] to the outside world for the `syncq`
//! binary:
//!
//! - [`HttpSynchronizer`] posts each record to the backend route for its kind
//! - [`ProbeConnectivity`] decides online/offline by TCP connect to the backend
//! - [`Config`] reads the TOML file naming the queue location and backend
//! - [`run`] dispatches a parsed [`Cli`] to its command

mod cli;
mod commands;

pub mod config;
pub mod error;
pub mod http;
pub mod probe;

#[cfg(test)]
mod test_helpers;

pub use cli::{Cli, Command, OutputFormat};
pub use config::Config;
pub use error::{Error, Result};
pub use http::HttpSynchronizer;
pub use probe::ProbeConnectivity;

use commands::Context;

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "SYNCQ_LOG";

/// Default log filter for a `-v` count.
pub fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Runs the parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let config = Config::discover(cli.config.as_deref())?;
    let ctx = Context::new(config);

    match cli.command {
        Command::Enqueue { kind, payload, output } => {
            commands::enqueue::run(&ctx, &kind, &payload, output)
        }
        Command::List { output } => commands::list::run(&ctx, output),
        Command::Clear => commands::clear::run(&ctx),
        Command::Status { output } => commands::status::run(&ctx, output),
        Command::Sync { output } => commands::sync::run(&ctx, output),
        Command::Watch => commands::watch::run(&ctx),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
