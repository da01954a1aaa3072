//! Per-worker tunables.

use std::time::Duration;

/// Severity at which a user-function exception gets logged. Does not
/// affect retry behavior — only how loudly a failure is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionLogSeverity {
    None,
    Debug,
    Info,
    Warning,
    Error,
}

/// Configuration a worker is constructed with.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How many units to claim per cycle.
    pub batch_size: i64,
    /// Severity at which user-function exceptions are logged.
    pub exception_logging: ExceptionLogSeverity,
    /// Probability in [0, 1) that a given unit runs under the profiler.
    pub profile_rate: f64,
    /// How long to sleep after an empty claim before polling again.
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            exception_logging: ExceptionLogSeverity::Info,
            profile_rate: 0.1,
            poll_interval: Duration::from_secs(1),
        }
    }
}
