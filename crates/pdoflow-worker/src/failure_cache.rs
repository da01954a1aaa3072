//! Per-worker memory of units that have already failed in this process.
//!
//! Strictly private to one worker: never persisted, never shared across
//! processes. Its only job is to stop a single worker from immediately
//! re-executing a unit it just watched fail, while leaving other workers
//! free to try it — a unit that keeps failing will surface to them again
//! once it cycles back through `waiting`.

use std::collections::{HashMap, HashSet, VecDeque};

use pdoflow_core::ResourceId;

const DEFAULT_MAX_POSTINGS: usize = 1024;
const DEFAULT_MAX_JOBS_PER_POSTING: usize = 128;

/// Bounded `posting_id -> {job_id}` map. Bounded by evicting the
/// least-recently-touched posting once `max_postings` is exceeded; a
/// simple insertion-order FIFO rather than a true LRU, which is enough to
/// keep the cache bounded without extra bookkeeping.
pub struct FailureCache {
    postings: HashMap<ResourceId, HashSet<ResourceId>>,
    order: VecDeque<ResourceId>,
    max_postings: usize,
    max_jobs_per_posting: usize,
}

impl FailureCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_POSTINGS, DEFAULT_MAX_JOBS_PER_POSTING)
    }

    pub fn with_capacity(max_postings: usize, max_jobs_per_posting: usize) -> Self {
        Self {
            postings: HashMap::new(),
            order: VecDeque::new(),
            max_postings,
            max_jobs_per_posting,
        }
    }

    /// Record that `job_id` (owned by `posting_id`) failed.
    pub fn record_failure(&mut self, posting_id: ResourceId, job_id: ResourceId) {
        if !self.postings.contains_key(&posting_id) {
            if self.postings.len() >= self.max_postings {
                if let Some(oldest) = self.order.pop_front() {
                    self.postings.remove(&oldest);
                }
            }
            self.order.push_back(posting_id);
        }

        let jobs = self.postings.entry(posting_id).or_default();
        if jobs.len() < self.max_jobs_per_posting {
            jobs.insert(job_id);
        }
    }

    /// Has this worker already watched `job_id` fail?
    pub fn has_failed(&self, posting_id: ResourceId, job_id: ResourceId) -> bool {
        self.postings
            .get(&posting_id)
            .is_some_and(|jobs| jobs.contains(&job_id))
    }

    /// Does this cache remember anything for `posting_id` at all?
    pub fn tracks(&self, posting_id: ResourceId) -> bool {
        self.postings.contains_key(&posting_id)
    }

    /// Drop everything remembered for a posting, once it has been observed
    /// to reach a terminal status.
    pub fn purge(&mut self, posting_id: ResourceId) {
        if self.postings.remove(&posting_id).is_some() {
            self.order.retain(|id| *id != posting_id);
        }
    }
}

impl Default for FailureCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_recalls_failures() {
        let mut cache = FailureCache::new();
        let posting = ResourceId::new();
        let job = ResourceId::new();
        assert!(!cache.has_failed(posting, job));
        cache.record_failure(posting, job);
        assert!(cache.has_failed(posting, job));
    }

    #[test]
    fn purge_forgets_a_posting() {
        let mut cache = FailureCache::new();
        let posting = ResourceId::new();
        let job = ResourceId::new();
        cache.record_failure(posting, job);
        cache.purge(posting);
        assert!(!cache.has_failed(posting, job));
    }

    #[test]
    fn evicts_oldest_posting_once_over_capacity() {
        let mut cache = FailureCache::with_capacity(2, 10);
        let p1 = ResourceId::new();
        let p2 = ResourceId::new();
        let p3 = ResourceId::new();
        let job = ResourceId::new();

        cache.record_failure(p1, job);
        cache.record_failure(p2, job);
        cache.record_failure(p3, job);

        assert!(!cache.has_failed(p1, job));
        assert!(cache.has_failed(p2, job));
        assert!(cache.has_failed(p3, job));
    }

    #[test]
    fn caps_jobs_remembered_per_posting() {
        let mut cache = FailureCache::with_capacity(10, 1);
        let posting = ResourceId::new();
        let job1 = ResourceId::new();
        let job2 = ResourceId::new();

        cache.record_failure(posting, job1);
        cache.record_failure(posting, job2);

        assert!(cache.has_failed(posting, job1));
        assert!(!cache.has_failed(posting, job2));
    }
}
