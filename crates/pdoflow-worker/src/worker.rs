//! The worker loop: claim a batch, execute each unit, commit outcomes.

use std::collections::HashMap;
use std::sync::Arc;

use pdoflow_core::ResourceId;
use pdoflow_db::PgProfileRepo;
use pdoflow_dispatch::{ClaimedJob, Dispatcher, JobOutcome, complete_job_in_tx};
use pdoflow_profile::{CapturedProfile, Profiler, reduce_and_persist};
use pdoflow_registry::{JobFn, Registry};
use sqlx::PgPool;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::{ExceptionLogSeverity, WorkerConfig};
use crate::failure_cache::FailureCache;

/// A single-threaded worker owning one DB connection and one private
/// failure memory, per the one-connection-per-process invariant.
pub struct Worker {
    id: String,
    pool: PgPool,
    dispatcher: Dispatcher,
    profile_repo: PgProfileRepo,
    registry: Arc<dyn Registry>,
    profiler: Arc<dyn Profiler>,
    config: WorkerConfig,
    failure_cache: FailureCache,
    resolution_cache: HashMap<(String, String), Arc<dyn JobFn>>,
}

impl Worker {
    pub fn new(
        id: impl Into<String>,
        pool: PgPool,
        registry: Arc<dyn Registry>,
        profiler: Arc<dyn Profiler>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            id: id.into(),
            dispatcher: Dispatcher::new(pool.clone()),
            profile_repo: PgProfileRepo::new(pool.clone()),
            pool,
            registry,
            profiler,
            config,
            failure_cache: FailureCache::new(),
            resolution_cache: HashMap::new(),
        }
    }

    /// Run until `shutdown` is set. Shutdown is only honored at batch
    /// boundaries: a unit already being executed always runs to
    /// completion.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(worker_id = %self.id, "starting worker");

        while !*shutdown.borrow() {
            match self.dispatcher.claim_batch(&self.id, self.config.batch_size).await {
                Ok(batch) if batch.is_empty() => {
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                        _ = shutdown.changed() => {}
                    }
                }
                Ok(batch) => {
                    self.run_batch(batch).await;
                }
                Err(err) => {
                    warn!(worker_id = %self.id, error = %err, "failed to claim batch");
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }
        }

        info!(worker_id = %self.id, "worker exiting");
    }

    async fn run_batch(&mut self, batch: Vec<ClaimedJob>) {
        for claimed in batch {
            self.run_unit(claimed).await;
        }
    }

    async fn run_unit(&mut self, claimed: ClaimedJob) {
        let job = claimed.job;

        if self.failure_cache.has_failed(job.posting_id, job.id) {
            debug!(
                worker_id = %self.id,
                job_id = %job.id,
                posting_id = %job.posting_id,
                "skipping unit this worker already watched fail, releasing to another worker"
            );
            if let Err(err) = self.dispatcher.release_job(job.id).await {
                error!(worker_id = %self.id, job_id = %job.id, error = %err, "failed to release skipped unit");
            }
            return;
        }

        let callable = match self.resolve(&claimed.entry_point, &claimed.target_function) {
            Ok(callable) => callable,
            Err(message) => {
                warn!(worker_id = %self.id, job_id = %job.id, %message, "resolution failed, treating as unit failure");
                self.failure_cache.record_failure(job.posting_id, job.id);
                self.commit_outcome(job.id, JobOutcome::Failure, None).await;
                return;
            }
        };

        let should_profile = rand::random::<f64>() < self.config.profile_rate;
        let guard = should_profile.then(|| self.profiler.start());

        let outcome = callable
            .call(job.positional_arguments.clone(), job.keyword_arguments.clone())
            .await;

        let captured = match guard {
            Some(guard) => match guard.stop() {
                Ok(captured) => Some(captured),
                Err(err) => {
                    warn!(worker_id = %self.id, job_id = %job.id, error = %err, "profile capture failed, outcome still recorded");
                    None
                }
            },
            None => None,
        };

        match outcome {
            Ok(()) => self.commit_outcome(job.id, JobOutcome::Success, captured).await,
            Err(err) => {
                self.log_exception(job.id, &err.message);
                self.failure_cache.record_failure(job.posting_id, job.id);
                self.commit_outcome(job.id, JobOutcome::Failure, captured).await;
            }
        }

        self.purge_if_posting_terminal(job.posting_id).await;
    }

    /// The failure cache only needs to track a posting while it still has
    /// in-flight units; once it goes terminal, forget it rather than wait
    /// for an LRU eviction to do the same job later.
    async fn purge_if_posting_terminal(&mut self, posting_id: ResourceId) {
        if !self.failure_cache.tracks(posting_id) {
            return;
        }

        let status: Option<(pdoflow_core::Status,)> =
            sqlx::query_as("SELECT status FROM postings WHERE id = $1")
                .bind(posting_id)
                .fetch_optional(&self.pool)
                .await
                .unwrap_or(None);

        if let Some((status,)) = status {
            if status.is_terminal() {
                self.failure_cache.purge(posting_id);
            }
        }
    }

    /// Resolve a callable, consulting this worker's private cache first.
    /// Resolution failures (unknown entry point, missing callable) are
    /// treated the same as a user-function exception.
    fn resolve(&mut self, entry_point: &str, target_function: &str) -> Result<Arc<dyn JobFn>, String> {
        let key = (entry_point.to_string(), target_function.to_string());
        if let Some(callable) = self.resolution_cache.get(&key) {
            return Ok(callable.clone());
        }

        let callable = self
            .registry
            .resolve(entry_point, target_function)
            .map_err(|err| err.message)?;
        self.resolution_cache.insert(key, callable.clone());
        Ok(callable)
    }

    /// Commit a unit's outcome (success or failure) and, if it was
    /// profiled, persist the profile in the same transaction — profiling
    /// applies to failed units too, so a profile and its outcome are
    /// always written and visible together regardless of which branch the
    /// unit took.
    async fn commit_outcome(
        &self,
        job_id: ResourceId,
        outcome: JobOutcome,
        captured: Option<CapturedProfile>,
    ) {
        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(err) => {
                error!(worker_id = %self.id, job_id = %job_id, error = %err, "failed to open commit transaction");
                return;
            }
        };

        if let Err(err) = complete_job_in_tx(&mut tx, job_id, outcome).await {
            error!(worker_id = %self.id, job_id = %job_id, error = %err, "failed to commit outcome");
            return;
        }

        if let Some(captured) = captured {
            if let Err(err) = reduce_and_persist(&self.profile_repo, &mut tx, job_id, captured).await {
                warn!(worker_id = %self.id, job_id = %job_id, error = %err, "failed to persist profile, outcome still committed");
            }
        }

        if let Err(err) = tx.commit().await {
            error!(worker_id = %self.id, job_id = %job_id, error = %err, "failed to commit outcome transaction");
        }
    }

    fn log_exception(&self, job_id: ResourceId, message: &str) {
        match self.config.exception_logging {
            ExceptionLogSeverity::None => {}
            ExceptionLogSeverity::Debug => {
                debug!(worker_id = %self.id, job_id = %job_id, %message, "unit raised")
            }
            ExceptionLogSeverity::Info => {
                info!(worker_id = %self.id, job_id = %job_id, %message, "unit raised")
            }
            ExceptionLogSeverity::Warning => {
                warn!(worker_id = %self.id, job_id = %job_id, %message, "unit raised")
            }
            ExceptionLogSeverity::Error => {
                error!(worker_id = %self.id, job_id = %job_id, %message, "unit raised")
            }
        }
    }
}
