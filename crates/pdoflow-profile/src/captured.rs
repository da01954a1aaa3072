//! The output shape every profiler implementation reduces down to.

use pdoflow_db::{CallEdgeRow, StatRow};

/// A fully reduced profile for one executed unit, not yet attached to a
/// job record id. [`crate::reduce_and_persist`] attaches the id and hands
/// it to a `ProfileRepo`.
#[derive(Debug, Default)]
pub struct CapturedProfile {
    pub total_calls: i64,
    pub total_time: f64,
    pub stats: Vec<StatRow>,
    pub edges: Vec<CallEdgeRow>,
}

impl CapturedProfile {
    pub fn empty() -> Self {
        Self::default()
    }
}
