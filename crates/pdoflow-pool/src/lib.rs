//! Pool supervisor for PDOFlow: spawns, health-monitors, and resurrects
//! worker processes; coordinates graceful shutdown.

mod config;
mod error;
mod pool;
mod slot;

pub use config::PoolConfig;
pub use error::{PoolError, PoolResult};
pub use pool::{WorkerFactory, WorkerPool};
pub use slot::SlotState;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::process::Command;

    fn noop_factory() -> WorkerFactory {
        Box::new(|_worker_id: &str| Command::new("true"))
    }

    #[tokio::test]
    async fn upkeep_fills_empty_slots() {
        let config = PoolConfig {
            max_workers: 2,
            upkeep_rate: Duration::from_millis(10),
            shutdown_grace: Duration::from_millis(50),
        };
        let mut pool = WorkerPool::new("test", config, noop_factory());
        assert_eq!(pool.live_worker_count(), 0);
        pool.upkeep().await;
        assert_eq!(pool.live_worker_count(), 2);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let config = PoolConfig::default();
        let mut pool = WorkerPool::new("test", config, noop_factory());
        pool.upkeep().await;
        pool.shutdown().await;
        pool.shutdown().await;
    }
}
