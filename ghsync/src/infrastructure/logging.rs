// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging
//!
//! Initializes the global `tracing` subscriber once at process startup, in
//! either human-readable ("pretty", for local development) or structured
//! JSON (for production) form, per [`LogFormat`](crate::infrastructure::config::LogFormat).

use crate::infrastructure::config::LogFormat;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global tracing subscriber. Safe to call once; a second call
/// within the same process returns an error, which callers should treat as
/// non-fatal (tests may call `try_init` repeatedly across modules).
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Pretty => {
            let _ = fmt().with_env_filter(filter).with_target(true).try_init();
        }
        LogFormat::Json => {
            let _ = fmt().with_env_filter(filter).json().with_target(true).try_init();
        }
    }
}
