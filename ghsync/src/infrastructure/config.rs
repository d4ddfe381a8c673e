// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Configuration
//!
//! Layered configuration: compiled-in defaults, an optional TOML file, then
//! `GHSYNC_*` environment variables, each overriding the previous. CLI flags
//! (parsed in `ghsync_bootstrap::cli`) are applied last, on top of the
//! resolved [`AppConfig`].

use ghsync_domain::value_objects::RankingWeights;
use serde::{Deserialize, Serialize};

/// Pretty console output for local development, structured JSON in production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Default for LogFormat {
    fn default() -> Self {
        LogFormat::Pretty
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database path, e.g. "./ghsync.db".
    pub db_path: String,
    /// GitHub personal access tokens for the rate-limit token pool.
    pub github_tokens: Vec<String>,
    /// Port the (out-of-scope) HTTP layer binds the Control API on; the local
    /// CLI in `ghsync_bootstrap` talks to the Control API in-process and does
    /// not itself need this port open.
    pub control_api_port: u16,
    pub log_format: LogFormat,
    pub ranking: RankingWeights,
    /// Default schedule applied to a pipeline that has none configured yet.
    pub default_schedule: String,
    /// High/low water marks for raw buffer backpressure.
    pub raw_buffer_high_water_mark: u32,
    pub raw_buffer_low_water_mark: u32,
    /// Soft per-stage time budget in seconds; exceeding it logs a warning but
    /// does not abort the stage.
    pub stage_soft_budget_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "./ghsync.db".to_string(),
            github_tokens: Vec::new(),
            control_api_port: 8080,
            log_format: LogFormat::default(),
            ranking: RankingWeights::default(),
            default_schedule: "0 0 * * * *".to_string(),
            raw_buffer_high_water_mark: 500,
            raw_buffer_low_water_mark: 100,
            stage_soft_budget_secs: 60,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the layered sources: defaults, an optional
    /// TOML file at `path` (if it exists), then `GHSYNC_*` environment
    /// variables (double-underscore nesting, e.g. `GHSYNC_RANKING__STARS`).
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            if std::path::Path::new(path).exists() {
                builder = builder.add_source(config::File::with_name(path));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix("GHSYNC")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("github_tokens")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_internally_consistent() {
        let cfg = AppConfig::default();
        assert!(cfg.raw_buffer_low_water_mark < cfg.raw_buffer_high_water_mark);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn load_without_file_falls_back_to_defaults() {
        let cfg = AppConfig::load(Some("/nonexistent/ghsync.toml")).unwrap();
        assert_eq!(cfg.db_path, "./ghsync.db");
    }

    #[test]
    fn env_override_takes_precedence() {
        std::env::set_var("GHSYNC_DB_PATH", "/tmp/override.db");
        let cfg = AppConfig::load(None).unwrap();
        std::env::remove_var("GHSYNC_DB_PATH");
        assert_eq!(cfg.db_path, "/tmp/override.db");
    }
}
