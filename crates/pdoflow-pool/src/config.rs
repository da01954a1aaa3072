//! Pool supervisor configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Target number of live worker processes.
    pub max_workers: usize,
    /// How often the owning process runs an upkeep cycle.
    pub upkeep_rate: Duration,
    /// How long a worker gets to exit cooperatively after shutdown before
    /// being force-killed.
    pub shutdown_grace: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            upkeep_rate: Duration::from_secs(1),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}
