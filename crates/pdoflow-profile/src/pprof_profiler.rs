//! Default `Profiler` built on the `pprof` sampling profiler.
//!
//! `pprof` walks native call stacks at a fixed sampling frequency; this
//! module turns the resulting call-stack histogram into the same shape a
//! tracing profiler's call-statistics table would produce: one row per
//! function with primitive/total call counts and self/cumulative time,
//! plus caller→callee edges.

use std::collections::HashMap;

use pdoflow_db::{CallEdgeRow, StatRow};
use tracing::warn;

use crate::{CapturedProfile, ProfileError, ProfileResult, Profiler, ProfilerGuard};

type FunctionKey = (String, String, i32);

#[derive(Default, Clone, Copy)]
struct StatAccum {
    primitive_calls: i64,
    total_calls: i64,
    total_time: f64,
    cumulative_time: f64,
}

#[derive(Default, Clone, Copy)]
struct EdgeAccum {
    calls: i64,
    time: f64,
}

/// Samples the current thread's call stack at `frequency` Hz while a unit
/// runs.
pub struct PprofProfiler {
    frequency: i32,
}

impl PprofProfiler {
    pub fn new(frequency: i32) -> Self {
        Self { frequency }
    }
}

impl Default for PprofProfiler {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Profiler for PprofProfiler {
    fn start(&self) -> Box<dyn ProfilerGuard> {
        match pprof::ProfilerGuardBuilder::default()
            .frequency(self.frequency)
            .blocklist(&["libc", "libgcc", "pthread", "vdso"])
            .build()
        {
            Ok(guard) => Box::new(PprofGuard {
                inner: Some(guard),
                period_secs: 1.0 / self.frequency as f64,
            }),
            Err(err) => {
                warn!(error = %err, "failed to start pprof capture, unit will run unprofiled");
                Box::new(PprofGuard {
                    inner: None,
                    period_secs: 1.0 / self.frequency as f64,
                })
            }
        }
    }
}

struct PprofGuard {
    inner: Option<pprof::ProfilerGuard<'static>>,
    period_secs: f64,
}

impl ProfilerGuard for PprofGuard {
    fn stop(self: Box<Self>) -> ProfileResult<CapturedProfile> {
        let Some(guard) = self.inner else {
            return Ok(CapturedProfile::empty());
        };

        let report = guard
            .report()
            .build()
            .map_err(|err| ProfileError::Capture(err.to_string()))?;

        let mut stats: HashMap<FunctionKey, StatAccum> = HashMap::new();
        let mut edges: HashMap<(FunctionKey, FunctionKey), EdgeAccum> = HashMap::new();
        let mut total_calls: i64 = 0;
        let mut total_time: f64 = 0.0;

        for (frames, count) in report.data.iter() {
            let count = *count as i64;
            total_calls += count;
            total_time += count as f64 * self.period_secs;

            // `frames.frames` runs leaf-first; reverse it so edges read
            // caller -> callee in the natural call direction.
            let path: Vec<FunctionKey> = frames
                .frames
                .iter()
                .rev()
                .filter_map(|inlined| inlined.first())
                .map(|symbol| {
                    let file = symbol
                        .filename
                        .as_ref()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let name = symbol.name();
                    let lineno = symbol.lineno.unwrap_or(0) as i32;
                    (file, name, lineno)
                })
                .collect();

            for (i, key) in path.iter().enumerate() {
                let entry = stats.entry(key.clone()).or_default();
                entry.total_calls += count;
                entry.cumulative_time += count as f64 * self.period_secs;
                if i == path.len() - 1 {
                    entry.primitive_calls += count;
                    entry.total_time += count as f64 * self.period_secs;
                }
            }

            for pair in path.windows(2) {
                let entry = edges.entry((pair[0].clone(), pair[1].clone())).or_default();
                entry.calls += count;
                entry.time += count as f64 * self.period_secs;
            }
        }

        let stats = stats
            .into_iter()
            .map(|((file, name, lineno), accum)| StatRow {
                file,
                name,
                lineno,
                primitive_calls: accum.primitive_calls,
                total_calls: accum.total_calls,
                total_time: accum.total_time,
                cumulative_time: accum.cumulative_time,
            })
            .collect();

        let edges = edges
            .into_iter()
            .map(|((caller, callee), accum)| CallEdgeRow {
                caller,
                callee,
                calls: accum.calls,
                time: accum.time,
            })
            .collect();

        Ok(CapturedProfile {
            total_calls,
            total_time,
            stats,
            edges,
        })
    }
}
