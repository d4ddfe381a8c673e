// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Module
//!
//! The bootstrap module sits **outside** the domain/application/
//! infrastructure layers and provides:
//!
//! - **Entry point** - CLI parsing and dispatch to a Control API operation
//! - **Platform abstraction** - OS-specific operations (POSIX vs Windows)
//! - **Signal handling** - Graceful shutdown (SIGTERM, SIGINT, SIGHUP)
//! - **Argument parsing** - Secure CLI argument validation
//! - **Error handling** - Unix exit code mapping
//! - **Async coordination** - Shutdown coordination and cancellation
//!
//! ## Key Design Principles
//!
//! 1. **Separation from enterprise layers** - bootstrap can see all layers;
//!    they never see it.
//! 2. **Platform abstraction** behind a trait, selected at compile time.
//! 3. **Graceful shutdown** via signal handlers, a cancellation token, and a
//!    grace period with timeout enforcement.
//! 4. **Security first** - every free-form CLI argument is pattern-checked
//!    before it reaches application logic.
//! 5. **Testability** - every component sits behind a trait with a no-op
//!    implementation for tests.
//!
//! ## Module Structure
//!
//! - `platform` - OS abstraction (Unix/Windows)
//! - `signals` - Signal handling (SIGTERM, SIGINT, SIGHUP)
//! - `cli` - Secure argument parsing, one subcommand per Control API operation
//! - `exit_code` - Unix exit code enumeration
//! - `logger` - Bootstrap-specific logging
//! - `shutdown` - Shutdown coordination

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod platform;
pub mod shutdown;
pub mod signals;

pub use cli::{parse_and_validate, ValidatedCli, ValidatedCommand};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};

/// Parses and validates CLI arguments. The main entry point for the
/// bootstrap layer — the caller dispatches on `ValidatedCommand` and maps
/// the eventual result to an exit code with [`result_to_exit_code`].
///
/// # Errors
///
/// Returns `cli::ParseError` if parsing or validation fails. Clap handles
/// `--help`/`--version` itself and exits the process before this returns.
pub fn bootstrap_cli() -> Result<ValidatedCli, cli::ParseError> {
    cli::parse_and_validate()
}
