// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Entry point: loads configuration, opens the SQLite pool, wires every
//! store/processor/stage into a single `repo-sync` pipeline, then either
//! runs the cron scheduler loop (`run`) or dispatches a one-shot Control
//! API operation, depending on the parsed CLI subcommand.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use ghsync::application::commands::ScheduleCommand;
use ghsync::application::{
    ContributorAggregationStage, ContributorEnrichmentStage, ContributorIngestStage, CommitFetchStage, CommitIngestStage,
    PipelineExecutor, PullRequestFetchStage, PullRequestIngestStage, RankingStage, RepositoryEnrichmentStage, RepositoryFetchStage,
    RepositoryIngestStage, Scheduler, SitemapIndexer,
};
use ghsync::application::executor::PipelineStage;
use ghsync::infrastructure::config::AppConfig;
use ghsync::infrastructure::github::client::DEFAULT_BASE_URL;
use ghsync::infrastructure::github::GithubHttpClient;
use ghsync::infrastructure::logging;
use ghsync::infrastructure::repositories::schema::{initialize_database, verify_critical_schema};
use ghsync::infrastructure::repositories::{
    SqliteCheckpointStore, SqliteCommitStore, SqliteContributorRankingStore, SqliteContributorRepositoryStore,
    SqliteContributorStore, SqliteControlAuditStore, SqliteMergeRequestStore, SqlitePipelineHistoryStore,
    SqlitePipelineScheduleStore, SqlitePipelineStatusStore, SqliteRawBufferStore, SqliteRepositoryStore, SqliteSitemapStore,
};
use ghsync::infrastructure::stages::{CommitProcessor, ContributorProcessor, EnrichmentProcessor, MergeRequestProcessor, RankingProcessor, RepositoryProcessor};
use ghsync::presentation::ControlApi;
use ghsync_bootstrap::cli::ValidatedCommand;
use ghsync_bootstrap::shutdown::ShutdownCoordinator;
use ghsync_bootstrap::signals::create_signal_handler;
use ghsync_bootstrap::{bootstrap_cli, map_error_to_exit_code};
use ghsync_domain::entities::pipeline_schedule::PipelineSchedule;
use ghsync_domain::value_objects::cron_expression::CronExpression;

const PIPELINE_TYPE: &str = "repo-sync";
const ENRICHMENT_MAX_ATTEMPTS: i32 = 5;
const SCHEDULER_TICK_INTERVAL: Duration = Duration::from_secs(30);
const SITEMAP_TICK_INTERVAL: Duration = Duration::from_secs(300);
const CLI_ACTOR: &str = "cli";

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = match bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            return std::process::ExitCode::from(ghsync_bootstrap::ExitCode::UsageError.as_i32() as u8);
        }
    };

    match run(cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "application exited with error");
            std::process::ExitCode::from(map_error_to_exit_code(&*e).as_i32() as u8)
        }
    }
}

async fn run(cli: ghsync_bootstrap::cli::ValidatedCli) -> Result<(), anyhow::Error> {
    let config = AppConfig::load(cli.config.as_deref().and_then(|p| p.to_str()))?;
    logging::init(config.log_format);

    let platform = ghsync_bootstrap::platform::create_platform();
    if platform.is_elevated() {
        tracing::warn!(platform = platform.platform_name(), "running with elevated privileges, which this tool never needs");
    }
    info!(platform = platform.platform_name(), cpus = platform.cpu_count(), "starting");

    let database_url = format!("sqlite://{}", config.db_path);
    let pool = initialize_database(&database_url).await?;
    verify_critical_schema(&pool).await?;

    let repositories = Arc::new(SqliteRepositoryStore::new(pool.clone()));
    let contributors = Arc::new(SqliteContributorStore::new(pool.clone()));
    let merge_requests = Arc::new(SqliteMergeRequestStore::new(pool.clone()));
    let commits = Arc::new(SqliteCommitStore::new(pool.clone()));
    let contributor_repositories = Arc::new(SqliteContributorRepositoryStore::new(pool.clone()));
    let rankings = Arc::new(SqliteContributorRankingStore::new(pool.clone()));
    let raw_buffer = Arc::new(SqliteRawBufferStore::new(pool.clone()));
    let sitemap_store = Arc::new(SqliteSitemapStore::new(pool.clone()));
    let audit = Arc::new(SqliteControlAuditStore::new(pool.clone()));
    let schedules = Arc::new(SqlitePipelineScheduleStore::new(pool.clone()));
    let status = Arc::new(SqlitePipelineStatusStore::new(pool.clone()));
    let history = Arc::new(SqlitePipelineHistoryStore::new(pool.clone()));
    let checkpoints = Arc::new(SqliteCheckpointStore::new(pool.clone()));

    let github_http = Arc::new(GithubHttpClient::with_persistent_cache(
        config.github_tokens.clone(),
        DEFAULT_BASE_URL.to_string(),
        pool.clone(),
    ));
    github_http.hydrate_cache().await;
    let github: Arc<dyn ghsync_domain::services::github_client::GithubClient> = github_http;

    let contributor_processor = Arc::new(ContributorProcessor::new(contributors.clone()));
    let repository_processor = Arc::new(RepositoryProcessor::new(repositories.clone(), contributor_processor.clone()));
    let merge_request_processor = Arc::new(MergeRequestProcessor::new(merge_requests.clone(), contributor_processor.clone()));
    let commit_processor = Arc::new(CommitProcessor::new(commits.clone(), contributor_processor.clone()));
    let enrichment_processor = Arc::new(EnrichmentProcessor::new(
        repositories.clone(),
        contributors.clone(),
        github.clone(),
        ENRICHMENT_MAX_ATTEMPTS,
    ));
    let ranking_processor = Arc::new(RankingProcessor::new(
        contributors.clone(),
        contributor_repositories.clone(),
        repositories.clone(),
        commits.clone(),
        rankings.clone(),
        config.ranking.clone(),
    ));

    let stages: Vec<(Arc<dyn PipelineStage>, ghsync::application::ErrorPolicy)> = vec![
        (
            Arc::new(RepositoryFetchStage::new(github.clone(), raw_buffer.clone(), config.raw_buffer_high_water_mark)),
            ghsync::application::ErrorPolicy::ContinueWithThreshold(25.0),
        ),
        (
            Arc::new(RepositoryIngestStage::new(raw_buffer.clone(), repository_processor.clone())),
            ghsync::application::ErrorPolicy::ContinueWithThreshold(25.0),
        ),
        (
            Arc::new(PullRequestFetchStage::new(
                github.clone(),
                raw_buffer.clone(),
                repositories.clone(),
                checkpoints.clone(),
                config.raw_buffer_high_water_mark,
            )),
            ghsync::application::ErrorPolicy::ContinueWithThreshold(25.0),
        ),
        (
            Arc::new(PullRequestIngestStage::new(raw_buffer.clone(), merge_request_processor.clone())),
            ghsync::application::ErrorPolicy::ContinueWithThreshold(25.0),
        ),
        (
            Arc::new(CommitFetchStage::new(
                github.clone(),
                raw_buffer.clone(),
                repositories.clone(),
                merge_requests.clone(),
                checkpoints.clone(),
                config.raw_buffer_high_water_mark,
            )),
            ghsync::application::ErrorPolicy::ContinueWithThreshold(25.0),
        ),
        (
            Arc::new(CommitIngestStage::new(raw_buffer.clone(), commit_processor.clone())),
            ghsync::application::ErrorPolicy::ContinueWithThreshold(25.0),
        ),
        (
            Arc::new(ContributorIngestStage::new(raw_buffer.clone(), contributor_processor.clone())),
            ghsync::application::ErrorPolicy::ContinueWithThreshold(25.0),
        ),
        (
            Arc::new(RepositoryEnrichmentStage::new(enrichment_processor.clone())),
            ghsync::application::ErrorPolicy::Skip,
        ),
        (
            Arc::new(ContributorEnrichmentStage::new(enrichment_processor.clone())),
            ghsync::application::ErrorPolicy::Skip,
        ),
        (
            Arc::new(ContributorAggregationStage::new(contributors.clone(), contributor_repositories.clone())),
            ghsync::application::ErrorPolicy::FailFast,
        ),
        (
            Arc::new(RankingStage::new(ranking_processor.clone())),
            ghsync::application::ErrorPolicy::ContinueWithThreshold(10.0),
        ),
    ];

    let executor = Arc::new(PipelineExecutor::new(PIPELINE_TYPE, history.clone(), stages)?);
    let mut executors = HashMap::new();
    executors.insert(PIPELINE_TYPE.to_string(), executor);
    let scheduler = Arc::new(Scheduler::new(schedules.clone(), status.clone(), executors));

    let sitemap_indexer = Arc::new(SitemapIndexer::new(
        repositories.clone(),
        contributors.clone(),
        merge_requests.clone(),
        sitemap_store.clone(),
    ));

    let control_api = Arc::new(ControlApi::new(
        schedules.clone(),
        status.clone(),
        history.clone(),
        audit.clone(),
        repositories.clone(),
        contributors.clone(),
        merge_requests.clone(),
        commits.clone(),
        raw_buffer.clone(),
    ));

    ensure_default_schedule(&control_api, &config).await?;

    match cli.command {
        ValidatedCommand::Run => run_forever(scheduler, sitemap_indexer).await,
        ValidatedCommand::Status { pipeline_type } => {
            let statuses = control_api.get_status().await?;
            let filtered: Vec<_> = match pipeline_type {
                Some(ref p) => statuses.into_iter().filter(|s| &s.pipeline_type == p).collect(),
                None => statuses,
            };
            print_json(&filtered)
        }
        ValidatedCommand::Schedules => print_json(&control_api.list_schedules().await?),
        ValidatedCommand::Schedule { pipeline_type, cron, active, description, params } => {
            let command = ScheduleCommand { pipeline_type, cron, active, params, description };
            control_api.upsert_schedule(CLI_ACTOR, command).await?;
            Ok(())
        }
        ValidatedCommand::Trigger { pipeline_type } => {
            control_api.trigger(CLI_ACTOR, &pipeline_type).await?;
            let params = schedules
                .get(&pipeline_type)
                .await?
                .map(|s| s.parameters)
                .unwrap_or(serde_json::Value::Null);
            let run_id = format!("{pipeline_type}-manual-{}", ulid::Ulid::new());
            let result = scheduler.run_acquired(&pipeline_type, run_id, params).await?;
            print_json(&result.summary)
        }
        ValidatedCommand::Cancel { pipeline_type } => {
            control_api.cancel(CLI_ACTOR, &pipeline_type).await
        }
        ValidatedCommand::Reset { pipeline_type } => {
            control_api.reset_status(CLI_ACTOR, &pipeline_type).await
        }
        ValidatedCommand::ResetEnrichment { entity } => {
            let reset = match entity.as_str() {
                "repositories" => control_api.reset_repository_enrichment_attempts(CLI_ACTOR).await?,
                "contributors" => control_api.reset_contributor_enrichment_attempts(CLI_ACTOR).await?,
                other => return Err(anyhow::anyhow!("unknown entity '{other}'")),
            };
            println!("{{\"rows_reset\":{reset}}}");
            Ok(())
        }
        ValidatedCommand::History { pipeline_type, limit } => {
            print_json(&control_api.get_history(pipeline_type.as_deref(), limit).await?)
        }
        ValidatedCommand::Counts => print_json(&control_api.get_counts().await?),
        ValidatedCommand::QueueDepths => print_json(&control_api.queue_depths().await?),
    }
}

/// Seeds a schedule for `PIPELINE_TYPE` from `config.default_schedule` the
/// first time the service starts against a fresh database, so `run` has
/// something to fire without requiring an operator to `schedule` first.
async fn ensure_default_schedule(control_api: &ControlApi, config: &AppConfig) -> Result<(), anyhow::Error> {
    if control_api.list_schedules().await?.iter().any(|s| s.pipeline_type == PIPELINE_TYPE) {
        return Ok(());
    }
    let cron = CronExpression::parse(&config.default_schedule)?;
    let schedule = PipelineSchedule::new(PIPELINE_TYPE, cron);
    control_api
        .upsert_schedule(
            "bootstrap",
            ScheduleCommand {
                pipeline_type: schedule.pipeline_type.clone(),
                cron: config.default_schedule.clone(),
                active: schedule.active,
                params: schedule.parameters.clone(),
                description: schedule.description.clone(),
            },
        )
        .await?;
    Ok(())
}

/// Runs the cron scheduler and the sitemap indexer as two independent
/// loops until a shutdown signal arrives. The sitemap indexer has no cron
/// schedule of its own — it advances its page cursor on a fixed interval
/// rather than competing for the pipeline concurrency guard.
async fn run_forever(scheduler: Arc<Scheduler>, sitemap_indexer: Arc<SitemapIndexer>) -> Result<(), anyhow::Error> {
    let coordinator = ShutdownCoordinator::default();
    let signal_handler = create_signal_handler();

    let shutdown_token = coordinator.token();
    let signal_task = tokio::spawn(async move {
        let token = coordinator.token();
        signal_handler
            .wait_for_signal(Box::new(move || {
                token.cancel();
            }))
            .await;
        coordinator.initiate_shutdown();
    });

    let mut scheduler_ticks = tokio::time::interval(SCHEDULER_TICK_INTERVAL);
    let mut sitemap_ticks = tokio::time::interval(SITEMAP_TICK_INTERVAL);

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                info!("shutdown signal received, stopping scheduler loop");
                break;
            }
            _ = scheduler_ticks.tick() => {
                match scheduler.tick(chrono::Utc::now()).await {
                    Ok(results) => {
                        for result in results {
                            info!(pipeline = %result.pipeline_type, outcome = ?result.summary.outcome, "tick completed");
                        }
                    }
                    Err(e) => error!(error = %e, "scheduler tick failed"),
                }
            }
            _ = sitemap_ticks.tick() => {
                if let Err(e) = sitemap_indexer.run().await {
                    error!(error = %e, "sitemap indexer tick failed");
                }
            }
        }
    }

    signal_task.abort();
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), anyhow::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
