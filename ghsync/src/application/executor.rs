// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Executor
//!
//! Runs a named pipeline as a DAG of registered stages. Stages are
//! topologically sorted once at registration time; a cycle among their
//! declared dependencies is a fatal configuration error rather than a
//! runtime one. Each stage carries its own `ErrorPolicy`; the executor
//! records a `PipelineHistory` row at the start and completion of every run
//! and folds per-stage `StageOutcome`s into the run's overall verdict.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use ghsync_domain::entities::pipeline_history::{PipelineHistory, RunOutcome};
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::pipeline_state_store::PipelineHistoryStore;

use crate::application::commands::{ErrorPolicy, PipelineContext};
use crate::infrastructure::stages::StageOutcome;

/// One node in the executor's DAG. Implementors do their own store/client
/// wiring (constructor injection, as the Stage Processors do); the executor
/// only knows how to call `run` and interpret the outcome.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    /// Stable identifier used for dependency declarations and checkpoint
    /// bookkeeping; not shown to end users.
    fn name(&self) -> &str;

    /// Names of stages that must complete (successfully or under their own
    /// error policy) before this one runs.
    fn depends_on(&self) -> &[&str] {
        &[]
    }

    async fn run(&self, ctx: &PipelineContext) -> Result<StageOutcome, IngestError>;
}

struct Registration {
    stage: Arc<dyn PipelineStage>,
    policy: ErrorPolicy,
}

/// Outcome of a single stage within a run, folded into the final `RunSummary`.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: String,
    pub outcome: StageOutcome,
    pub policy_breached: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub outcome: RunOutcome,
    pub stages: Vec<StageReport>,
    pub fatal_error: Option<String>,
}

impl RunSummary {
    fn items_processed(&self) -> i64 {
        self.stages.iter().map(|s| s.outcome.processed).sum()
    }

    fn items_failed(&self) -> i64 {
        self.stages.iter().map(|s| s.outcome.failed).sum()
    }
}

/// Registers stages into a DAG and runs them in topological order,
/// persisting a `PipelineHistory` row around the run.
pub struct PipelineExecutor {
    pipeline_type: String,
    history: Arc<dyn PipelineHistoryStore>,
    order: Vec<String>,
    registrations: HashMap<String, Registration>,
}

impl PipelineExecutor {
    /// Builds the executor from an unordered stage list, topologically
    /// sorting by `depends_on`. A dependency cycle or a dependency on an
    /// unregistered stage is a configuration error, surfaced immediately
    /// rather than deferred to the first run.
    pub fn new(
        pipeline_type: impl Into<String>,
        history: Arc<dyn PipelineHistoryStore>,
        stages: Vec<(Arc<dyn PipelineStage>, ErrorPolicy)>,
    ) -> Result<Self, IngestError> {
        let mut registrations = HashMap::with_capacity(stages.len());
        for (stage, policy) in stages {
            let name = stage.name().to_string();
            registrations.insert(name, Registration { stage, policy });
        }

        let order = topological_order(&registrations)?;

        Ok(Self {
            pipeline_type: pipeline_type.into(),
            history,
            order,
            registrations,
        })
    }

    pub fn pipeline_type(&self) -> &str {
        &self.pipeline_type
    }

    /// Runs every registered stage in dependency order, recording a
    /// `PipelineHistory` row at start and completion. A `FailFast` breach or
    /// a propagated fatal `IngestError` stops the run immediately; any other
    /// stage's breach marks the run `partial` but lets later stages proceed.
    pub async fn run(&self, ctx: &PipelineContext) -> Result<RunSummary, IngestError> {
        let history = PipelineHistory::started(&self.pipeline_type);
        self.history.record_start(&history).await?;

        let mut reports = Vec::with_capacity(self.order.len());
        let mut had_breach = false;
        let mut fatal: Option<String> = None;

        for name in &self.order {
            if ctx.cancellation.is_cancelled() {
                info!(pipeline = %self.pipeline_type, stage = %name, "run cancelled before stage start");
                fatal = Some("cancelled".to_string());
                break;
            }

            let registration = self
                .registrations
                .get(name)
                .expect("topological_order only returns registered names");

            let outcome = match registration.stage.run(ctx).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_cancellation() => {
                    fatal = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    warn!(pipeline = %self.pipeline_type, stage = %name, error = %e, "stage returned a fatal error");
                    fatal = Some(e.to_string());
                    break;
                }
            };

            let breached = registration.policy.breaches(outcome.error_rate());
            if breached {
                had_breach = true;
                warn!(pipeline = %self.pipeline_type, stage = %name, error_rate = outcome.error_rate(), "stage error policy breached");
            }

            reports.push(StageReport {
                stage: name.clone(),
                outcome,
                policy_breached: breached,
            });

            if breached && matches!(registration.policy, ErrorPolicy::FailFast) {
                fatal = Some(format!("stage '{name}' breached its fail-fast error policy"));
                break;
            }
        }

        let run_outcome = match (&fatal, had_breach) {
            (Some(msg), _) if msg == "cancelled" => RunOutcome::Cancelled,
            (Some(_), _) => RunOutcome::Failed,
            (None, true) => RunOutcome::Partial,
            (None, false) => RunOutcome::Success,
        };

        let summary = RunSummary {
            run_id: history.run_id.to_string(),
            outcome: run_outcome,
            stages: reports,
            fatal_error: fatal.clone(),
        };

        self.history
            .record_completion(
                history.run_id,
                summary.outcome,
                summary.items_processed(),
                summary.items_failed(),
                fatal,
            )
            .await?;

        Ok(summary)
    }
}

fn topological_order(registrations: &HashMap<String, Registration>) -> Result<Vec<String>, IngestError> {
    for registration in registrations.values() {
        for dep in registration.stage.depends_on() {
            if !registrations.contains_key(*dep) {
                return Err(IngestError::Configuration(format!(
                    "stage '{}' depends on unregistered stage '{}'",
                    registration.stage.name(),
                    dep
                )));
            }
        }
    }

    let mut order = Vec::with_capacity(registrations.len());
    let mut visited: HashSet<String> = HashSet::new();
    let mut in_progress: HashSet<String> = HashSet::new();

    fn visit(
        name: &str,
        registrations: &HashMap<String, Registration>,
        visited: &mut HashSet<String>,
        in_progress: &mut HashSet<String>,
        order: &mut Vec<String>,
    ) -> Result<(), IngestError> {
        if visited.contains(name) {
            return Ok(());
        }
        if in_progress.contains(name) {
            return Err(IngestError::CyclicPipeline(format!(
                "cycle detected in stage dependencies at '{name}'"
            )));
        }

        in_progress.insert(name.to_string());
        let registration = &registrations[name];
        for dep in registration.stage.depends_on() {
            visit(dep, registrations, visited, in_progress, order)?;
        }
        in_progress.remove(name);
        visited.insert(name.to_string());
        order.push(name.to_string());
        Ok(())
    }

    let mut names: Vec<&String> = registrations.keys().collect();
    names.sort();
    for name in names {
        visit(name, registrations, &mut visited, &mut in_progress, &mut order)?;
    }

    Ok(order)
}
