//! The profiler abstraction a worker wraps a unit's invocation in.

use crate::{CapturedProfile, ProfileResult};

/// A running capture session. Holding one pins down whatever sampling
/// mechanism the concrete `Profiler` uses; dropping it without calling
/// `stop` discards the capture.
pub trait ProfilerGuard: Send {
    fn stop(self: Box<Self>) -> ProfileResult<CapturedProfile>;
}

/// Abstracts over a sampling profiler producing a call-statistics graph.
/// Default implementation is [`crate::PprofProfiler`]; [`NullProfiler`]
/// is the disabled path for units drawn outside `profile_rate`.
pub trait Profiler: Send + Sync {
    fn start(&self) -> Box<dyn ProfilerGuard>;
}

struct NullGuard;

impl ProfilerGuard for NullGuard {
    fn stop(self: Box<Self>) -> ProfileResult<CapturedProfile> {
        Ok(CapturedProfile::empty())
    }
}

/// A profiler that captures nothing. Used for units not selected by
/// `profile_rate`, so the worker's hot path never branches on whether
/// profiling is enabled — it always has a guard to stop.
#[derive(Default)]
pub struct NullProfiler;

impl Profiler for NullProfiler {
    fn start(&self) -> Box<dyn ProfilerGuard> {
        Box::new(NullGuard)
    }
}
