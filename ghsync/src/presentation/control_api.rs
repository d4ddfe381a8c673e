// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Control API: the read/write surface consumed by the local CLI (and, out
//! of scope here, by an HTTP layer). Every mutating operation writes a
//! `ControlAudit` row before returning, carrying the actor, the action name,
//! and a before/after JSON snapshot.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use ghsync_domain::entities::control_audit::ControlAudit;
use ghsync_domain::entities::pipeline_history::PipelineHistory;
use ghsync_domain::entities::pipeline_schedule::PipelineSchedule;
use ghsync_domain::entities::pipeline_status::{PipelineState, PipelineStatus};
use ghsync_domain::error::IngestError;
use ghsync_domain::repositories::commit_store::CommitStore;
use ghsync_domain::repositories::contributor_store::ContributorStore;
use ghsync_domain::repositories::control_audit_store::ControlAuditStore;
use ghsync_domain::repositories::merge_request_store::MergeRequestStore;
use ghsync_domain::repositories::pipeline_state_store::{PipelineHistoryStore, PipelineScheduleStore, PipelineStatusStore};
use ghsync_domain::repositories::raw_buffer_store::RawBufferStore;
use ghsync_domain::repositories::repository_store::RepositoryStore;
use ghsync_domain::value_objects::cron_expression::CronExpression;

use crate::application::commands::ScheduleCommand;

/// `GET counts` response shape.
#[derive(Debug, Clone, Serialize)]
pub struct EntityCounts {
    pub repositories: i64,
    pub merge_requests: i64,
    pub contributors: i64,
    pub commits: i64,
}

pub struct ControlApi {
    schedules: Arc<dyn PipelineScheduleStore>,
    status: Arc<dyn PipelineStatusStore>,
    history: Arc<dyn PipelineHistoryStore>,
    audit: Arc<dyn ControlAuditStore>,
    repositories: Arc<dyn RepositoryStore>,
    contributors: Arc<dyn ContributorStore>,
    merge_requests: Arc<dyn MergeRequestStore>,
    commits: Arc<dyn CommitStore>,
    raw_buffer: Arc<dyn RawBufferStore>,
}

impl ControlApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        schedules: Arc<dyn PipelineScheduleStore>,
        status: Arc<dyn PipelineStatusStore>,
        history: Arc<dyn PipelineHistoryStore>,
        audit: Arc<dyn ControlAuditStore>,
        repositories: Arc<dyn RepositoryStore>,
        contributors: Arc<dyn ContributorStore>,
        merge_requests: Arc<dyn MergeRequestStore>,
        commits: Arc<dyn CommitStore>,
        raw_buffer: Arc<dyn RawBufferStore>,
    ) -> Self {
        Self {
            schedules,
            status,
            history,
            audit,
            repositories,
            contributors,
            merge_requests,
            commits,
            raw_buffer,
        }
    }

    pub async fn list_schedules(&self) -> Result<Vec<PipelineSchedule>, IngestError> {
        self.schedules.list_all().await
    }

    pub async fn get_status(&self) -> Result<Vec<PipelineStatus>, IngestError> {
        self.status.list_all().await
    }

    pub async fn get_history(&self, pipeline_type: Option<&str>, limit: i64) -> Result<Vec<PipelineHistory>, IngestError> {
        self.history.list_recent(pipeline_type, limit).await
    }

    pub async fn get_counts(&self) -> Result<EntityCounts, IngestError> {
        Ok(EntityCounts {
            repositories: self.repositories.count().await?,
            merge_requests: self.merge_requests.count().await?,
            contributors: self.contributors.count().await?,
            commits: self.commits.distinct_commit_count_total().await?,
        })
    }

    /// `POST schedule {type, cron, active, params}`: upserts a validated
    /// cron schedule, auditing the prior row (if any) as `before`.
    pub async fn upsert_schedule(&self, actor: &str, command: ScheduleCommand) -> Result<(), IngestError> {
        let cron = CronExpression::parse(&command.cron)?;
        let before = self.schedules.get(&command.pipeline_type).await?;

        let mut schedule = PipelineSchedule::new(&command.pipeline_type, cron);
        schedule.active = command.active;
        schedule.parameters = command.params;
        schedule.description = command.description;

        self.schedules.upsert(&schedule).await?;
        self.status.ensure_seeded(&command.pipeline_type).await?;

        self.audit
            .record(ControlAudit::new(
                actor,
                "upsert_schedule",
                before.map(|b| json!(b)),
                Some(json!(schedule)),
            ))
            .await
    }

    /// `POST trigger/{type}`: flips the pipeline straight to `Running` via
    /// the same concurrency guard the Scheduler uses, so a manual trigger
    /// and a cron fire can never race each other. Returns an error if the
    /// pipeline type is already running.
    pub async fn trigger(&self, actor: &str, pipeline_type: &str) -> Result<(), IngestError> {
        self.status.ensure_seeded(pipeline_type).await?;
        let acquired = self.status.try_acquire_run(pipeline_type).await?;
        if !acquired {
            return Err(IngestError::StoreConflict(format!("pipeline '{pipeline_type}' is already running")));
        }

        self.audit
            .record(ControlAudit::new(actor, "trigger", None, Some(json!({ "pipeline_type": pipeline_type }))))
            .await
    }

    /// `POST cancel/{type}`: cooperative — callers must still observe the
    /// run reach a safe checkpoint; this only flips status.
    pub async fn cancel(&self, actor: &str, pipeline_type: &str) -> Result<(), IngestError> {
        let before = self.status.get(pipeline_type).await?;
        match &before {
            Some(status) if status.is_running => {}
            _ => return Err(IngestError::Validation(format!("pipeline '{pipeline_type}' is not running"))),
        }

        self.status
            .release_run(pipeline_type, PipelineState::Idle, Some("cancelled by operator".to_string()))
            .await?;

        self.audit
            .record(ControlAudit::new(
                actor,
                "cancel",
                before.map(|b| json!(b)),
                Some(json!({ "pipeline_type": pipeline_type })),
            ))
            .await
    }

    /// Resets a pipeline type's status to `idle` from any state.
    pub async fn reset_status(&self, actor: &str, pipeline_type: &str) -> Result<(), IngestError> {
        let before = self.status.get(pipeline_type).await?;
        self.status.reset(pipeline_type).await?;
        self.audit
            .record(ControlAudit::new(
                actor,
                "reset_status",
                before.map(|b| json!(b)),
                Some(json!({ "pipeline_type": pipeline_type })),
            ))
            .await
    }

    pub async fn reset_repository_enrichment_attempts(&self, actor: &str) -> Result<u64, IngestError> {
        let reset = self.repositories.reset_enrichment_attempts().await?;
        self.audit
            .record(ControlAudit::new(
                actor,
                "reset_enrichment_attempts:repositories",
                None,
                Some(json!({ "rows_reset": reset })),
            ))
            .await?;
        Ok(reset)
    }

    pub async fn reset_contributor_enrichment_attempts(&self, actor: &str) -> Result<u64, IngestError> {
        let reset = self.contributors.reset_enrichment_attempts().await?;
        self.audit
            .record(ControlAudit::new(
                actor,
                "reset_enrichment_attempts:contributors",
                None,
                Some(json!({ "rows_reset": reset })),
            ))
            .await?;
        Ok(reset)
    }

    pub async fn queue_depths(&self) -> Result<QueueDepths, IngestError> {
        use ghsync_domain::entities::raw_payload::RawPayloadKind;
        Ok(QueueDepths {
            repositories: self.raw_buffer.depth(RawPayloadKind::Repository).await?,
            pull_requests: self.raw_buffer.depth(RawPayloadKind::PullRequest).await?,
            commits: self.raw_buffer.depth(RawPayloadKind::Commit).await?,
            users: self.raw_buffer.depth(RawPayloadKind::User).await?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueDepths {
    pub repositories: i64,
    pub pull_requests: i64,
    pub commits: i64,
    pub users: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ghsync_domain::entities::commit::Commit;
    use ghsync_domain::entities::contributor::Contributor;
    use ghsync_domain::entities::merge_request::MergeRequest;
    use ghsync_domain::entities::raw_payload::{RawPayload, RawPayloadKind};
    use ghsync_domain::entities::repository::Repository;
    use ghsync_domain::value_objects::local_id::{ContributorId, MergeRequestId, RawPayloadId, RepositoryId};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeScheduleStore {
        rows: Mutex<Vec<PipelineSchedule>>,
    }

    #[async_trait]
    impl PipelineScheduleStore for FakeScheduleStore {
        async fn upsert(&self, schedule: &PipelineSchedule) -> Result<(), IngestError> {
            let mut rows = self.rows.lock();
            rows.retain(|s| s.pipeline_type != schedule.pipeline_type);
            rows.push(schedule.clone());
            Ok(())
        }
        async fn get(&self, pipeline_type: &str) -> Result<Option<PipelineSchedule>, IngestError> {
            Ok(self.rows.lock().iter().find(|s| s.pipeline_type == pipeline_type).cloned())
        }
        async fn list_all(&self) -> Result<Vec<PipelineSchedule>, IngestError> {
            Ok(self.rows.lock().clone())
        }
        async fn list_active(&self) -> Result<Vec<PipelineSchedule>, IngestError> {
            Ok(self.rows.lock().iter().filter(|s| s.active).cloned().collect())
        }
    }

    #[derive(Default)]
    struct FakeStatusStore {
        rows: Mutex<HashMap<String, PipelineStatus>>,
    }

    #[async_trait]
    impl PipelineStatusStore for FakeStatusStore {
        async fn get(&self, pipeline_type: &str) -> Result<Option<PipelineStatus>, IngestError> {
            Ok(self.rows.lock().get(pipeline_type).cloned())
        }
        async fn list_all(&self) -> Result<Vec<PipelineStatus>, IngestError> {
            Ok(self.rows.lock().values().cloned().collect())
        }
        async fn ensure_seeded(&self, pipeline_type: &str) -> Result<(), IngestError> {
            self.rows
                .lock()
                .entry(pipeline_type.to_string())
                .or_insert_with(|| PipelineStatus::idle(pipeline_type));
            Ok(())
        }
        async fn try_acquire_run(&self, pipeline_type: &str) -> Result<bool, IngestError> {
            let mut rows = self.rows.lock();
            let status = rows.get_mut(pipeline_type).expect("seeded");
            if status.is_running {
                return Ok(false);
            }
            status.is_running = true;
            status.state = PipelineState::Running;
            Ok(true)
        }
        async fn release_run(&self, pipeline_type: &str, next_state: PipelineState, error: Option<String>) -> Result<(), IngestError> {
            let mut rows = self.rows.lock();
            let status = rows.get_mut(pipeline_type).expect("seeded");
            status.is_running = false;
            status.state = next_state;
            status.last_error = error;
            Ok(())
        }
        async fn set_next_run_at(&self, _pipeline_type: &str, _next_run_at: chrono::DateTime<chrono::Utc>) -> Result<(), IngestError> {
            Ok(())
        }
        async fn reset(&self, pipeline_type: &str) -> Result<(), IngestError> {
            self.rows.lock().get_mut(pipeline_type).expect("seeded").reset();
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeHistoryStore;

    #[async_trait]
    impl PipelineHistoryStore for FakeHistoryStore {
        async fn record_start(&self, _history: &PipelineHistory) -> Result<(), IngestError> {
            Ok(())
        }
        async fn record_completion(
            &self,
            _run_id: ghsync_domain::value_objects::local_id::PipelineRunId,
            _outcome: ghsync_domain::entities::pipeline_history::RunOutcome,
            _items_processed: i64,
            _items_failed: i64,
            _error: Option<String>,
        ) -> Result<(), IngestError> {
            Ok(())
        }
        async fn list_recent(&self, _pipeline_type: Option<&str>, _limit: i64) -> Result<Vec<PipelineHistory>, IngestError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct FakeAuditStore {
        rows: Mutex<Vec<ControlAudit>>,
    }

    #[async_trait]
    impl ControlAuditStore for FakeAuditStore {
        async fn record(&self, entry: ControlAudit) -> Result<(), IngestError> {
            self.rows.lock().push(entry);
            Ok(())
        }
        async fn list_recent(&self, limit: i64) -> Result<Vec<ControlAudit>, IngestError> {
            Ok(self.rows.lock().iter().rev().take(limit as usize).cloned().collect())
        }
    }

    #[derive(Default)]
    struct FakeRepositoryStore {
        rows: Mutex<Vec<Repository>>,
    }

    #[async_trait]
    impl RepositoryStore for FakeRepositoryStore {
        async fn upsert(&self, _repository: &Repository, _allow_null_overwrite: bool) -> Result<RepositoryId, IngestError> {
            unimplemented!()
        }
        async fn get_by_upstream_id(&self, _upstream_id: i64) -> Result<Option<Repository>, IngestError> {
            Ok(None)
        }
        async fn get_by_id(&self, _id: RepositoryId) -> Result<Option<Repository>, IngestError> {
            Ok(None)
        }
        async fn get_by_full_name(&self, _full_name: &str) -> Result<Option<Repository>, IngestError> {
            Ok(None)
        }
        async fn list_unenriched(&self, _max_attempts: i32, _limit: i64) -> Result<Vec<Repository>, IngestError> {
            Ok(Vec::new())
        }
        async fn list_page(&self, _page: i64, _page_size: i64) -> Result<Vec<Repository>, IngestError> {
            Ok(Vec::new())
        }
        async fn count(&self) -> Result<i64, IngestError> {
            Ok(self.rows.lock().len() as i64)
        }
        async fn reset_enrichment_attempts(&self) -> Result<u64, IngestError> {
            Ok(7)
        }
    }

    #[derive(Default)]
    struct FakeContributorStore {
        rows: Mutex<Vec<Contributor>>,
    }

    #[async_trait]
    impl ContributorStore for FakeContributorStore {
        async fn upsert(&self, _contributor: &Contributor, _allow_null_overwrite: bool) -> Result<ContributorId, IngestError> {
            unimplemented!()
        }
        async fn get_by_upstream_id(&self, _upstream_id: i64) -> Result<Option<Contributor>, IngestError> {
            Ok(None)
        }
        async fn get_by_id(&self, _id: ContributorId) -> Result<Option<Contributor>, IngestError> {
            Ok(None)
        }
        async fn list_unenriched(&self, _max_attempts: i32, _limit: i64) -> Result<Vec<Contributor>, IngestError> {
            Ok(Vec::new())
        }
        async fn list_page(&self, _page: i64, _page_size: i64) -> Result<Vec<Contributor>, IngestError> {
            Ok(Vec::new())
        }
        async fn list_with_contributions(&self) -> Result<Vec<Contributor>, IngestError> {
            Ok(Vec::new())
        }
        async fn count(&self) -> Result<i64, IngestError> {
            Ok(self.rows.lock().len() as i64)
        }
        async fn merge_duplicate(&self, _canonical_id: ContributorId, _duplicate_id: ContributorId) -> Result<(), IngestError> {
            Ok(())
        }
        async fn reset_enrichment_attempts(&self) -> Result<u64, IngestError> {
            Ok(3)
        }
        async fn recompute_aggregates(&self) -> Result<(), IngestError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeMergeRequestStore {
        rows: Mutex<Vec<MergeRequest>>,
    }

    #[async_trait]
    impl MergeRequestStore for FakeMergeRequestStore {
        async fn upsert(&self, _merge_request: &MergeRequest) -> Result<MergeRequestId, IngestError> {
            unimplemented!()
        }
        async fn get_by_repository_and_number(&self, _repository_upstream_id: i64, _number: i64) -> Result<Option<MergeRequest>, IngestError> {
            Ok(None)
        }
        async fn list_unenriched(&self, _limit: i64) -> Result<Vec<MergeRequest>, IngestError> {
            Ok(Vec::new())
        }
        async fn list_page(&self, _page: i64, _page_size: i64) -> Result<Vec<MergeRequest>, IngestError> {
            Ok(Vec::new())
        }
        async fn count(&self) -> Result<i64, IngestError> {
            Ok(self.rows.lock().len() as i64)
        }
    }

    #[derive(Default)]
    struct FakeCommitStore {
        distinct_total: i64,
    }

    #[async_trait]
    impl CommitStore for FakeCommitStore {
        async fn upsert(&self, _commit: &Commit) -> Result<(), IngestError> {
            unimplemented!()
        }
        async fn upsert_batch(&self, _commits: &[Commit]) -> Result<(), IngestError> {
            unimplemented!()
        }
        async fn distinct_commit_count(&self, _repository_id: RepositoryId) -> Result<i64, IngestError> {
            Ok(0)
        }
        async fn distinct_commit_count_total(&self) -> Result<i64, IngestError> {
            Ok(self.distinct_total)
        }
        async fn list_unenriched(&self, _limit: i64) -> Result<Vec<Commit>, IngestError> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct FakeRawBufferStore {
        repositories: i64,
        pull_requests: i64,
        commits: i64,
        users: i64,
    }

    #[async_trait]
    impl RawBufferStore for FakeRawBufferStore {
        async fn enqueue(&self, _payload: RawPayload) -> Result<RawPayloadId, IngestError> {
            unimplemented!()
        }
        async fn dequeue(&self, _kind: RawPayloadKind, _limit: i64, _run_id: &str) -> Result<Vec<RawPayload>, IngestError> {
            Ok(Vec::new())
        }
        async fn mark_processed(&self, _id: RawPayloadId) -> Result<(), IngestError> {
            Ok(())
        }
        async fn release(&self, _id: RawPayloadId) -> Result<(), IngestError> {
            Ok(())
        }
        async fn depth(&self, kind: RawPayloadKind) -> Result<i64, IngestError> {
            Ok(match kind {
                RawPayloadKind::Repository => self.repositories,
                RawPayloadKind::PullRequest => self.pull_requests,
                RawPayloadKind::Commit => self.commits,
                RawPayloadKind::User => self.users,
            })
        }
    }

    fn harness() -> (
        ControlApi,
        Arc<FakeAuditStore>,
        Arc<FakeStatusStore>,
        Arc<FakeScheduleStore>,
    ) {
        let schedules = Arc::new(FakeScheduleStore::default());
        let status = Arc::new(FakeStatusStore::default());
        let history = Arc::new(FakeHistoryStore::default());
        let audit = Arc::new(FakeAuditStore::default());
        let repositories = Arc::new(FakeRepositoryStore::default());
        let contributors = Arc::new(FakeContributorStore::default());
        let merge_requests = Arc::new(FakeMergeRequestStore::default());
        let commits = Arc::new(FakeCommitStore { distinct_total: 12 });
        let raw_buffer = Arc::new(FakeRawBufferStore {
            repositories: 4,
            pull_requests: 1,
            commits: 0,
            users: 2,
        });

        let api = ControlApi::new(
            schedules.clone(),
            status.clone(),
            history,
            audit.clone(),
            repositories,
            contributors,
            merge_requests,
            commits,
            raw_buffer,
        );
        (api, audit, status, schedules)
    }

    #[tokio::test]
    async fn upsert_schedule_writes_an_audit_row_with_before_and_after() {
        let (api, audit, _status, schedules) = harness();

        api.upsert_schedule(
            "alice",
            ScheduleCommand {
                pipeline_type: "repo-sync".to_string(),
                cron: "0 0 * * * *".to_string(),
                active: true,
                params: serde_json::json!({"repos": ["acme/widget"]}),
                description: Some("hourly sync".to_string()),
            },
        )
        .await
        .unwrap();

        let stored = schedules.get("repo-sync").await.unwrap().unwrap();
        assert_eq!(stored.cron.as_str(), "0 0 * * * *");
        assert!(stored.active);

        let entries = audit.list_recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor, "alice");
        assert_eq!(entries[0].action, "upsert_schedule");
        assert!(entries[0].before.is_none());
        assert!(entries[0].after.is_some());
    }

    #[tokio::test]
    async fn upsert_schedule_rejects_an_invalid_cron_expression() {
        let (api, _audit, _status, _schedules) = harness();

        let result = api
            .upsert_schedule(
                "alice",
                ScheduleCommand {
                    pipeline_type: "repo-sync".to_string(),
                    cron: "not a cron".to_string(),
                    active: true,
                    params: serde_json::Value::Null,
                    description: None,
                },
            )
            .await;

        assert!(matches!(result, Err(IngestError::InvalidCron(_))));
    }

    #[tokio::test]
    async fn trigger_acquires_the_guard_and_a_second_trigger_is_rejected() {
        let (api, audit, status, _schedules) = harness();

        api.trigger("bob", "repo-sync").await.unwrap();
        let running = status.get("repo-sync").await.unwrap().unwrap();
        assert!(running.is_running);

        let second = api.trigger("bob", "repo-sync").await;
        assert!(matches!(second, Err(IngestError::StoreConflict(_))));

        let entries = audit.list_recent(10).await.unwrap();
        assert_eq!(entries.len(), 1, "the rejected second trigger must not audit");
    }

    #[tokio::test]
    async fn cancel_requires_a_running_pipeline() {
        let (api, _audit, _status, _schedules) = harness();

        let result = api.cancel("bob", "repo-sync").await;
        assert!(matches!(result, Err(IngestError::Validation(_))));
    }

    #[tokio::test]
    async fn cancel_flips_a_running_pipeline_back_to_idle_and_audits_it() {
        let (api, audit, status, _schedules) = harness();
        api.trigger("bob", "repo-sync").await.unwrap();

        api.cancel("bob", "repo-sync").await.unwrap();

        let after = status.get("repo-sync").await.unwrap().unwrap();
        assert!(!after.is_running);
        assert_eq!(after.state, PipelineState::Idle);

        let entries = audit.list_recent(10).await.unwrap();
        assert_eq!(entries.last().unwrap().action, "cancel");
    }

    #[tokio::test]
    async fn reset_enrichment_attempts_returns_the_store_count_and_audits_per_entity() {
        let (api, audit, _status, _schedules) = harness();

        let repos_reset = api.reset_repository_enrichment_attempts("bob").await.unwrap();
        let contributors_reset = api.reset_contributor_enrichment_attempts("bob").await.unwrap();

        assert_eq!(repos_reset, 7);
        assert_eq!(contributors_reset, 3);

        let entries = audit.list_recent(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "reset_enrichment_attempts:repositories");
        assert_eq!(entries[1].action, "reset_enrichment_attempts:contributors");
    }

    #[tokio::test]
    async fn get_counts_sums_every_store() {
        let (api, _audit, _status, _schedules) = harness();
        let counts = api.get_counts().await.unwrap();
        assert_eq!(counts.repositories, 0);
        assert_eq!(counts.commits, 12);
    }

    #[tokio::test]
    async fn queue_depths_reports_each_payload_kind_independently() {
        let (api, _audit, _status, _schedules) = harness();
        let depths = api.queue_depths().await.unwrap();
        assert_eq!(depths.repositories, 4);
        assert_eq!(depths.pull_requests, 1);
        assert_eq!(depths.commits, 0);
        assert_eq!(depths.users, 2);
    }
}
