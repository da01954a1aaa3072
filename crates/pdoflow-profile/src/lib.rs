//! Profile capture and persistence for PDOFlow.

mod captured;
mod error;
mod pprof_profiler;
mod profiler;
mod reduce;

pub use captured::CapturedProfile;
pub use error::{ProfileError, ProfileResult};
pub use pprof_profiler::PprofProfiler;
pub use profiler::{NullProfiler, Profiler, ProfilerGuard};
pub use reduce::reduce_and_persist;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_profiler_captures_nothing() {
        let profiler = NullProfiler;
        let guard = profiler.start();
        let captured = guard.stop().unwrap();
        assert_eq!(captured.total_calls, 0);
        assert!(captured.stats.is_empty());
        assert!(captured.edges.is_empty());
    }
}
