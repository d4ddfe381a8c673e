// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Parser
//!
//! Command-line interface structure, parsed with clap. Security
//! validation happens afterward, in [`super::validator`].

use clap::{Parser, Subcommand};

/// Main CLI structure.
#[derive(Parser, Debug, Clone)]
#[command(name = "ghsync")]
#[command(about = concat!("GitHub ingestion pipeline v", env!("CARGO_PKG_VERSION")))]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,
}

/// CLI subcommands, one per Control API operation plus `run`.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the scheduler loop and serve the Control API until a shutdown
    /// signal arrives.
    Run,

    /// Show current pipeline status, optionally filtered to one type.
    Status {
        #[arg(long)]
        pipeline_type: Option<String>,
    },

    /// List all configured cron schedules.
    Schedules,

    /// Create or update a pipeline's cron schedule.
    Schedule {
        #[arg(long)]
        pipeline_type: String,

        /// Cron expression, e.g. "0 */6 * * *"
        #[arg(long)]
        cron: String,

        /// Create the schedule inactive instead of active
        #[arg(long)]
        inactive: bool,

        #[arg(long)]
        description: Option<String>,

        /// Repeatable `key=value` stage parameter, e.g. `--param owner=acme`
        #[arg(long = "param")]
        param: Vec<String>,
    },

    /// Manually trigger a pipeline run, bypassing its cron schedule.
    Trigger {
        #[arg(long)]
        pipeline_type: String,
    },

    /// Cooperatively cancel a running pipeline.
    Cancel {
        #[arg(long)]
        pipeline_type: String,
    },

    /// Reset a pipeline's status to idle from any state.
    Reset {
        #[arg(long)]
        pipeline_type: String,
    },

    /// Reset enrichment attempt counters so failed rows are retried.
    ResetEnrichment {
        /// "repositories" or "contributors"
        #[arg(long)]
        entity: String,
    },

    /// Show recent pipeline run history.
    History {
        #[arg(long)]
        pipeline_type: Option<String>,

        #[arg(long, default_value = "20")]
        limit: i64,
    },

    /// Show entity counts (repositories, contributors, merge requests,
    /// commits).
    Counts,

    /// Show raw buffer queue depths per payload kind.
    QueueDepths,
}

/// Parse CLI arguments.
///
/// # Panics
///
/// Clap exits the process with a usage message if parsing fails.
pub fn parse_cli() -> Cli {
    Cli::parse()
}
