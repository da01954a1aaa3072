//! Implementations backing each CLI subcommand.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use pdoflow_core::{ResourceId, Status};
use pdoflow_db::{JobRecordRepo, PgJobRecordRepo, PgPostingRepo, PostingRepo};
use pdoflow_dispatch::{Dispatcher, JobOutcome};
use pdoflow_pool::{PoolConfig, WorkerPool};
use pdoflow_registry::{JobFn, Registry, StaticRegistry};
use sqlx::PgPool;
use tokio::process::Command;
use tracing::info;

use crate::error::{CliError, CliResult};
use crate::format::{self, OutputFormat};

/// Open the one connection pool a CLI invocation needs. The CLI is a
/// short-lived client of the DB, not a worker, so it is not held to the
/// one-connection-per-process invariant worker processes are held to.
pub async fn connect() -> CliResult<PgPool> {
    let config = pdoflow_config::DbConfig::load()?;
    let pool = pdoflow_db::create_pool(&config.connection_string(), 5)
        .await
        .map_err(pdoflow_core::Error::from)?;
    Ok(pool)
}

/// `pool --max-workers N --upkeep-rate R --batchsize B`
///
/// Spawns worker processes by re-invoking this same binary's hidden
/// `worker-run` subcommand: one child process per worker, each opening
/// its own DB connection. Runs until interrupted, then shuts the
/// pool down cooperatively.
pub async fn pool(max_workers: usize, upkeep_rate_hz: f64, batch_size: i64) -> CliResult<()> {
    let exe = std::env::current_exe().map_err(anyhow::Error::from)?;
    let factory: pdoflow_pool::WorkerFactory = Box::new(move |worker_id: &str| {
        let mut cmd = Command::new(&exe);
        cmd.arg("worker-run")
            .arg("--worker-id")
            .arg(worker_id)
            .arg("--batch-size")
            .arg(batch_size.to_string());
        cmd
    });

    let config = PoolConfig {
        max_workers,
        upkeep_rate: Duration::from_secs_f64((1.0 / upkeep_rate_hz.max(0.001)).max(0.01)),
        ..PoolConfig::default()
    };
    let mut worker_pool = WorkerPool::new("pdoflow", config.clone(), factory);

    info!(max_workers, upkeep_rate_hz, batch_size, "starting pool");
    let mut ticker = tokio::time::interval(config.upkeep_rate);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                worker_pool.upkeep().await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received interrupt, shutting down pool");
                break;
            }
        }
    }
    worker_pool.shutdown().await;
    Ok(())
}

/// Child-process entry point spawned by `pool`. Not part of the public
/// command surface; it is `pool`'s own spawn mechanism and is hidden from
/// `--help`.
pub async fn worker_run(worker_id: String, batch_size: i64) -> CliResult<()> {
    let config = pdoflow_config::DbConfig::load()?;
    let pool = pdoflow_db::create_pool(&config.connection_string(), 1)
        .await
        .map_err(pdoflow_core::Error::from)?;

    // A real deployment links its own registered callables in; the CLI
    // itself carries no user functions, so unresolvable entry points here
    // are handled by the normal resolution-failure path.
    let registry: Arc<dyn pdoflow_registry::Registry> = Arc::new(StaticRegistry::new());
    let profiler: Arc<dyn pdoflow_profile::Profiler> = Arc::new(pdoflow_profile::PprofProfiler::default());
    let worker_config = pdoflow_worker::WorkerConfig {
        batch_size,
        ..pdoflow_worker::WorkerConfig::default()
    };
    let mut worker = pdoflow_worker::Worker::new(worker_id, pool, registry, profiler, worker_config);

    let (tx, rx) = tokio::sync::watch::channel(false);
    let mut term = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .map_err(anyhow::Error::from)?;
    tokio::spawn(async move {
        tokio::select! {
            _ = term.recv() => {}
            _ = tokio::signal::ctrl_c() => {}
        }
        let _ = tx.send(true);
    });

    worker.run(rx).await;
    Ok(())
}

fn parse_status(raw: &str) -> CliResult<Status> {
    Status::from_str(raw).map_err(|_| CliError::InvalidArgument(format!("unknown status: {raw}")))
}

/// `posting-status <uuid...> [--show-jobs] [--format ...]`
pub async fn posting_status(ids: Vec<ResourceId>, show_jobs: bool, format: OutputFormat) -> CliResult<()> {
    let db = connect().await?;
    let postings_repo = PgPostingRepo::new(db.clone());
    let jobs_repo = PgJobRecordRepo::new(db);

    let mut postings = Vec::with_capacity(ids.len());
    for id in &ids {
        let posting = postings_repo.get(*id).await?;
        postings.push(posting);
    }

    println!("{}", format::render_postings(&postings, format));

    if show_jobs {
        for posting in &postings {
            let jobs = jobs_repo.list_by_posting(posting.id).await?;
            println!("\njobs for posting {}:", posting.id);
            println!("{}", format::render_job_records(&jobs, format));
        }
    }

    Ok(())
}

/// `list-postings [--format ...]`
pub async fn list_postings(format: OutputFormat) -> CliResult<()> {
    let db = connect().await?;
    let repo = PgPostingRepo::new(db);
    let postings = repo.list().await?;
    println!("{}", format::render_postings(&postings, format));
    Ok(())
}

/// `set-posting-status <uuid> <status>`
pub async fn set_posting_status(id: ResourceId, status: String) -> CliResult<()> {
    let status = parse_status(&status)?;
    let db = connect().await?;
    let repo = PgPostingRepo::new(db);
    let posting = repo.set_status(id, status).await?;
    println!("posting {} is now {}", posting.id, posting.status);
    Ok(())
}

/// `priority-stats`
pub async fn priority_stats(format: OutputFormat) -> CliResult<()> {
    let db = connect().await?;
    let repo = PgJobRecordRepo::new(db);
    let stats = repo.priority_stats().await?;
    println!("{}", format::render_priority_stats(&stats, format));
    Ok(())
}

/// `execute-job <uuid>` — resolve and invoke one unit in-process,
/// bypassing the claim algorithm, for debugging. Records the same
/// success/failure outcome a worker would.
pub async fn execute_job(id: ResourceId) -> CliResult<()> {
    let db = connect().await?;
    let jobs_repo = PgJobRecordRepo::new(db.clone());
    let postings_repo = PgPostingRepo::new(db.clone());

    let job = jobs_repo.get(id).await?;
    let posting = postings_repo.get(job.posting_id).await?;
    let dispatcher = Dispatcher::new(db);

    // Intentionally empty: this command is a local debug aid, not a
    // producer's worker; see `worker_run`'s doc comment.
    let registry = StaticRegistry::new();
    let outcome = match registry.resolve(&posting.entry_point, &posting.target_function) {
        Ok(callable) => callable
            .call(job.positional_arguments.clone(), job.keyword_arguments.clone())
            .await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(()) => {
            dispatcher.complete_job(job.id, JobOutcome::Success).await?;
            println!("job {} succeeded", job.id);
        }
        Err(err) => {
            dispatcher.complete_job(job.id, JobOutcome::Failure).await?;
            println!("job {} failed: {}", job.id, err.message);
        }
    }

    Ok(())
}
