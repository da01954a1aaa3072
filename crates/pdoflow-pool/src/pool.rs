//! Spawns and babysits a target count of worker processes.

use std::time::Duration;

use futures::StreamExt;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use pdoflow_core::{Posting, ResourceId};
use pdoflow_observer::poll_posting;
use sqlx::PgPool;
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::slot::SlotState;

/// Builds the `Command` used to spawn a worker process for a given
/// worker id; forwards whatever parameters the deployment needs (binary
/// path, database URL, batch size, ...).
pub type WorkerFactory = Box<dyn Fn(&str) -> Command + Send + Sync>;

/// Supervises `max_workers` worker processes: fills empty slots, reaps
/// exited ones, and drives cooperative-then-forced shutdown.
pub struct WorkerPool {
    name: String,
    config: PoolConfig,
    factory: WorkerFactory,
    slots: Vec<SlotState>,
}

impl WorkerPool {
    pub fn new(name: impl Into<String>, config: PoolConfig, factory: WorkerFactory) -> Self {
        let max_workers = config.max_workers;
        Self {
            name: name.into(),
            config,
            factory,
            slots: (0..max_workers).map(|_| SlotState::Empty).collect(),
        }
    }

    /// One upkeep cycle: reap exited workers (non-blocking), then spawn
    /// fresh ones into any empty slot.
    pub async fn upkeep(&mut self) {
        self.reap();
        self.fill_empty_slots();
    }

    fn reap(&mut self) {
        for slot in &mut self.slots {
            if let SlotState::Running { child, worker_id } = slot {
                match child.try_wait() {
                    Ok(Some(status)) => {
                        warn!(worker_id = %worker_id, exit_code = ?status.code(), "worker process exited");
                        *slot = SlotState::Dead {
                            worker_id: worker_id.clone(),
                            exit_code: status.code(),
                        };
                    }
                    Ok(None) => {}
                    Err(err) => {
                        error!(worker_id = %worker_id, error = %err, "failed to poll worker liveness");
                    }
                }
            }
        }

        for slot in &mut self.slots {
            if matches!(slot, SlotState::Dead { .. }) {
                if let Some(worker_id) = slot.worker_id() {
                    info!(worker_id = %worker_id, "reaped dead slot, ready to respawn");
                }
                *slot = SlotState::Empty;
            }
        }
    }

    fn fill_empty_slots(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].is_empty() {
                self.spawn_slot(index);
            }
        }
    }

    fn spawn_slot(&mut self, index: usize) {
        self.slots[index] = SlotState::Spawning;
        let worker_id = format!("{}-{}", self.name, index);
        let mut command = (self.factory)(&worker_id);

        match command.spawn() {
            Ok(child) => {
                info!(worker_id = %worker_id, "spawned worker");
                self.slots[index] = SlotState::Running { child, worker_id };
            }
            Err(err) => {
                error!(worker_id = %worker_id, error = %err, "failed to spawn worker");
                self.slots[index] = SlotState::Empty;
            }
        }
    }

    /// Count of slots currently running a live worker process.
    pub fn live_worker_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_running()).count()
    }

    /// Cooperative shutdown: SIGTERM every running worker, wait up to
    /// `shutdown_grace`, then force-kill anything left. Safe to call more
    /// than once; never leaks a child process.
    pub async fn shutdown(&mut self) {
        for slot in &self.slots {
            if let SlotState::Running { child, worker_id } = slot {
                if let Some(pid) = child.id() {
                    if let Err(err) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                        warn!(worker_id = %worker_id, error = %err, "failed to send SIGTERM");
                    }
                }
            }
        }

        let deadline = tokio::time::Instant::now() + self.config.shutdown_grace;
        while tokio::time::Instant::now() < deadline {
            self.reap();
            if self.slots.iter().all(|s| s.is_empty()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        for slot in &mut self.slots {
            if let SlotState::Running { child, worker_id } = slot {
                warn!(worker_id = %worker_id, "forcing worker termination after grace period");
                let _ = child.start_kill();
            }
        }
        self.reap();
    }

    /// Drives upkeep while polling the observer API until `posting_id`
    /// reaches a terminal status, or `max_wait` elapses.
    pub async fn await_posting_completion(
        &mut self,
        db_pool: &PgPool,
        posting_id: ResourceId,
        poll_time: Duration,
        max_wait: Option<Duration>,
    ) -> PoolResult<Posting> {
        let deadline = max_wait.map(|wait| tokio::time::Instant::now() + wait);
        let mut stream = Box::pin(poll_posting(db_pool.clone(), posting_id));

        loop {
            self.upkeep().await;

            match stream.next().await {
                Some(Ok(posting)) if posting.status.is_terminal() => return Ok(posting),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
                None => {
                    return Err(PoolError::Timeout(format!(
                        "observer stream for posting {posting_id} ended unexpectedly"
                    )));
                }
            }

            if let Some(deadline) = deadline {
                if tokio::time::Instant::now() >= deadline {
                    return Err(PoolError::Timeout(format!(
                        "posting {posting_id} did not complete in time"
                    )));
                }
            }

            tokio::time::sleep(poll_time).await;
        }
    }
}
