// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface Module
//!
//! Bootstrap-layer CLI handling for the Control API: parsing with clap,
//! then a security validation pass before anything reaches the domain.

pub mod parser;
pub mod validator;

pub use parser::{parse_cli, Cli, Commands};
pub use validator::{ParseError, SecureArgParser};

use std::collections::HashSet;

use serde_json::Value;

/// CLI arguments after security validation.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub command: ValidatedCommand,
    pub verbose: bool,
    pub config: Option<std::path::PathBuf>,
}

/// Validated command variants, one per Control API operation.
#[derive(Debug, Clone)]
pub enum ValidatedCommand {
    Run,
    Status {
        pipeline_type: Option<String>,
    },
    Schedules,
    Schedule {
        pipeline_type: String,
        cron: String,
        active: bool,
        description: Option<String>,
        params: Value,
    },
    Trigger {
        pipeline_type: String,
    },
    Cancel {
        pipeline_type: String,
    },
    Reset {
        pipeline_type: String,
    },
    ResetEnrichment {
        entity: String,
    },
    History {
        pipeline_type: Option<String>,
        limit: i64,
    },
    Counts,
    QueueDepths,
}

/// Parse and validate CLI arguments: clap parsing followed by
/// [`SecureArgParser`] validation of every free-form string.
///
/// # Errors
///
/// Returns [`ParseError`] if parsing or validation fails.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = parse_cli();
    validate_cli(cli)
}

fn validate_cli(cli: Cli) -> Result<ValidatedCli, ParseError> {
    let config = SecureArgParser::validate_optional_path(cli.config.as_deref())?;

    let command = match cli.command {
        Commands::Run => ValidatedCommand::Run,
        Commands::Status { pipeline_type } => {
            if let Some(ref p) = pipeline_type {
                SecureArgParser::validate_argument(p)?;
            }
            ValidatedCommand::Status { pipeline_type }
        }
        Commands::Schedules => ValidatedCommand::Schedules,
        Commands::Schedule {
            pipeline_type,
            cron,
            inactive,
            description,
            param,
        } => {
            SecureArgParser::validate_argument(&pipeline_type)?;
            SecureArgParser::validate_argument(&cron)?;
            if let Some(ref d) = description {
                SecureArgParser::validate_argument(d)?;
            }
            let params = params_to_json(&param)?;
            ValidatedCommand::Schedule {
                pipeline_type,
                cron,
                active: !inactive,
                description,
                params,
            }
        }
        Commands::Trigger { pipeline_type } => {
            SecureArgParser::validate_argument(&pipeline_type)?;
            ValidatedCommand::Trigger { pipeline_type }
        }
        Commands::Cancel { pipeline_type } => {
            SecureArgParser::validate_argument(&pipeline_type)?;
            ValidatedCommand::Cancel { pipeline_type }
        }
        Commands::Reset { pipeline_type } => {
            SecureArgParser::validate_argument(&pipeline_type)?;
            ValidatedCommand::Reset { pipeline_type }
        }
        Commands::ResetEnrichment { entity } => {
            match entity.as_str() {
                "repositories" | "contributors" => {}
                other => {
                    return Err(ParseError::InvalidValue {
                        arg: "entity".to_string(),
                        reason: format!("must be 'repositories' or 'contributors', got '{other}'"),
                    })
                }
            }
            ValidatedCommand::ResetEnrichment { entity }
        }
        Commands::History { pipeline_type, limit } => {
            if let Some(ref p) = pipeline_type {
                SecureArgParser::validate_argument(p)?;
            }
            let limit = SecureArgParser::validate_number("limit", &limit.to_string(), Some(1i64), Some(10_000i64))?;
            ValidatedCommand::History { pipeline_type, limit }
        }
        Commands::Counts => ValidatedCommand::Counts,
        Commands::QueueDepths => ValidatedCommand::QueueDepths,
    };

    Ok(ValidatedCli {
        command,
        verbose: cli.verbose,
        config,
    })
}

/// Turns repeated `--param key=value` flags into a JSON object, after
/// running each key and value through the same validation as any other
/// free-form string.
fn params_to_json(pairs: &[String]) -> Result<Value, ParseError> {
    let mut map = serde_json::Map::with_capacity(pairs.len());
    let mut seen: HashSet<&str> = HashSet::new();
    for pair in pairs {
        SecureArgParser::validate_argument(pair)?;
        let (key, value) = pair.split_once('=').ok_or_else(|| ParseError::InvalidValue {
            arg: "param".to_string(),
            reason: format!("expected key=value, got '{pair}'"),
        })?;
        if !seen.insert(key) {
            return Err(ParseError::InvalidValue {
                arg: "param".to_string(),
                reason: format!("duplicate key '{key}'"),
            });
        }
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_to_json_builds_an_object() {
        let pairs = vec!["owner=acme".to_string(), "max_repos=50".to_string()];
        let json = params_to_json(&pairs).unwrap();
        assert_eq!(json["owner"], "acme");
        assert_eq!(json["max_repos"], "50");
    }

    #[test]
    fn params_to_json_rejects_malformed_pairs() {
        let pairs = vec!["not-a-pair".to_string()];
        assert!(params_to_json(&pairs).is_err());
    }

    #[test]
    fn params_to_json_rejects_duplicate_keys() {
        let pairs = vec!["owner=acme".to_string(), "owner=other".to_string()];
        assert!(params_to_json(&pairs).is_err());
    }
}
