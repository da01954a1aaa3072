//! Worker runtime for PDOFlow.

mod config;
mod failure_cache;
mod worker;

pub use config::{ExceptionLogSeverity, WorkerConfig};
pub use failure_cache::FailureCache;
pub use worker::Worker;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use pdoflow_profile::NullProfiler;
    use pdoflow_registry::{JobError, JobFn, Registry, StaticRegistry};
    use serde_json::Value;

    use crate::{Worker, WorkerConfig};

    struct Noop;

    #[async_trait]
    impl JobFn for Noop {
        async fn call(&self, _args: Value, _kwargs: Value) -> Result<(), JobError> {
            Ok(())
        }
    }

    #[test]
    fn worker_config_defaults_match_the_dispatch_protocol() {
        let config = WorkerConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.profile_rate, 0.1);
    }

    #[test]
    fn resolve_finds_registered_callables() {
        // Exercises the registry boundary a worker depends on, without
        // needing a live database connection.
        let registry: Arc<dyn Registry> =
            Arc::new(StaticRegistry::new().register("tests", "noop", Arc::new(Noop)));
        assert!(registry.resolve("tests", "noop").is_ok());
        assert!(registry.resolve("tests", "missing").is_err());
    }

    #[allow(dead_code)]
    fn profiler_type_checks() -> Arc<dyn pdoflow_profile::Profiler> {
        Arc::new(NullProfiler)
    }

    #[allow(dead_code)]
    fn worker_is_constructible(pool: sqlx::PgPool) -> Worker {
        let registry: Arc<dyn Registry> = Arc::new(StaticRegistry::new());
        let profiler: Arc<dyn pdoflow_profile::Profiler> = Arc::new(NullProfiler);
        Worker::new("worker-0", pool, registry, profiler, WorkerConfig::default())
    }
}
