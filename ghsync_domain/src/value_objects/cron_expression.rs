// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Validated cron expression value object. Schedules are stored as plain
//! strings ("cron expressions are stored, not compiled in") but must be
//! parseable before being persisted — a malformed cron is a fatal
//! configuration error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IngestError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronExpression(String);

impl CronExpression {
    pub fn parse(expr: &str) -> Result<Self, IngestError> {
        cron::Schedule::from_str(expr).map_err(|e| IngestError::InvalidCron(format!("{}: {}", expr, e)))?;
        Ok(Self(expr.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses into a `cron::Schedule` for next-fire-time computation. The
    /// expression was already validated at construction, but cron crate
    /// schedules aren't `Clone`-cheap to store, so the scheduler re-parses
    /// lazily at each computation.
    pub fn schedule(&self) -> Result<cron::Schedule, IngestError> {
        cron::Schedule::from_str(&self.0).map_err(|e| IngestError::InvalidCron(format!("{}: {}", self.0, e)))
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CronExpression {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_a_standard_five_field_hourly_expression() {
        assert!(CronExpression::parse("0 0 * * * *").is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(CronExpression::parse("not a cron expression").is_err());
    }
}
