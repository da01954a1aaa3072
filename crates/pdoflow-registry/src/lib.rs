//! The callable resolution boundary a worker depends on.
//!
//! The worker runtime needs to turn `(entry_point, target_function)` into
//! something invokable, but how callables get registered is a producer
//! concern, not part of the core. This crate is deliberately thin: it is
//! the boundary, not the engine behind it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// A user-function failure, captured from whatever the callable returned.
/// Resolution failures are modeled the same way, since the worker treats
/// an unresolvable entry point as just another user-function failure.
#[derive(Debug, Error, Clone)]
#[error("{message}")]
pub struct JobError {
    pub message: String,
}

impl JobError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A resolved, invokable unit of user code.
#[async_trait]
pub trait JobFn: Send + Sync {
    async fn call(&self, args: Value, kwargs: Value) -> Result<(), JobError>;
}

/// Resolves `(entry_point, target_function)` pairs to callables.
///
/// Implementations may cache internally; the worker additionally keeps its
/// own per-process resolution cache in front of this, so a `Registry`
/// implementation does not need to be fast on repeat lookups to be usable.
pub trait Registry: Send + Sync {
    fn resolve(&self, entry_point: &str, target_function: &str) -> Result<Arc<dyn JobFn>, JobError>;
}

impl fmt::Debug for dyn JobFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JobFn(..)")
    }
}

/// A statically built registry: producers register callables by name at
/// startup, the worker looks them up by name at claim time. This is the
/// explicitly constructed analogue of a decorator-based dynamic-import
/// registry — producers share one `StaticRegistry` instance by convention,
/// not by module-scope global state.
#[derive(Default)]
pub struct StaticRegistry {
    callables: HashMap<(String, String), Arc<dyn JobFn>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callable under `(entry_point, target_function)`. Returns
    /// `self` so registrations can be chained at startup.
    pub fn register(
        mut self,
        entry_point: impl Into<String>,
        target_function: impl Into<String>,
        callable: Arc<dyn JobFn>,
    ) -> Self {
        self.callables
            .insert((entry_point.into(), target_function.into()), callable);
        self
    }
}

impl Registry for StaticRegistry {
    fn resolve(&self, entry_point: &str, target_function: &str) -> Result<Arc<dyn JobFn>, JobError> {
        self.callables
            .get(&(entry_point.to_string(), target_function.to_string()))
            .cloned()
            .ok_or_else(|| {
                JobError::new(format!(
                    "no callable registered for entry_point={entry_point:?} target_function={target_function:?}"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Add;

    #[async_trait]
    impl JobFn for Add {
        async fn call(&self, args: Value, _kwargs: Value) -> Result<(), JobError> {
            let args = args.as_array().ok_or_else(|| JobError::new("args must be an array"))?;
            let a = args[0].as_i64().ok_or_else(|| JobError::new("a must be an integer"))?;
            let b = args[1].as_i64().ok_or_else(|| JobError::new("b must be an integer"))?;
            let _ = a + b;
            Ok(())
        }
    }

    #[tokio::test]
    async fn resolves_registered_callable() {
        let registry = StaticRegistry::new().register("tests", "add", Arc::new(Add));
        let callable = registry.resolve("tests", "add").unwrap();
        callable
            .call(serde_json::json!([1, 2]), serde_json::json!({}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_entry_point_is_a_job_error() {
        let registry = StaticRegistry::new();
        let err = registry.resolve("tests", "missing").unwrap_err();
        assert!(err.message.contains("missing"));
    }
}
