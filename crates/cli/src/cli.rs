// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

const QUICKSTART_HELP: &str = "\
Get started:
  syncq enqueue sync-xp '{\"amount\": 10}'   Record a mutation
  syncq list                               Show what is waiting
  syncq sync                               Deliver now if the backend is reachable
  syncq watch                              Deliver automatically as connectivity returns";

#[derive(Parser)]
#[command(name = "syncq", version)]
#[command(about = "Offline mutation queue: record changes now, deliver them when the backend is reachable")]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Config file [default: <config dir>/syncq/config.toml]
    #[arg(long, global = true, env = "SYNCQ_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). SYNCQ_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record a mutation for later delivery
    #[command(after_help = "Kinds:\n  \
        submit-quiz-result, submit-game-result, generic-sync, sync-xp, sync-chapter-progress\n\n\
        Examples:\n  \
        syncq enqueue sync-xp '{\"amount\": 10}'\n  \
        syncq enqueue SUBMIT_QUIZ_RESULT '{\"quizId\": \"q1\", \"score\": 8}'")]
    Enqueue {
        /// Mutation kind (kebab-case or SCREAMING_SNAKE_CASE)
        kind: String,

        /// Payload as a JSON document
        payload: String,

        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// List pending mutations, oldest first
    List {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Drop every pending mutation, including exhausted ones
    Clear,

    /// Show queue counts and backend reachability
    Status {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Probe the backend once and deliver pending mutations
    Sync {
        #[arg(long, short, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Keep running, delivering whenever the backend is reachable
    Watch,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
