//! In-flight edit jobs
//!
//! Several user requests can be waiting on the external planner at once.
//! Each job owns its own cancellation flag; cancelling rejects the pending
//! plan and makes an already-resolved continuation no-op instead of mutating
//! the tree. There is no cross-job locking of the scene graph — jobs that
//! touch disjoint subtrees are safe by convention of the surrounding
//! product, not by engine-enforced isolation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Identifier of one in-flight edit job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Handle owned by one edit request
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: JobId,
    cancelled: Arc<AtomicBool>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Flag the job as cancelled; any continuation checks this before
    /// touching the scene
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Registry of the jobs currently in flight
#[derive(Debug, Default)]
pub struct JobRegistry {
    next_id: u64,
    jobs: HashMap<JobId, JobHandle>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job and hand back its handle
    pub fn begin(&mut self) -> JobHandle {
        self.next_id += 1;
        let handle = JobHandle {
            id: JobId(self.next_id),
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        self.jobs.insert(handle.id, handle.clone());
        handle
    }

    /// Cancel a job by id; `true` when the job was live
    pub fn cancel(&mut self, id: JobId) -> bool {
        match self.jobs.get(&id) {
            Some(handle) => {
                handle.cancel();
                log::debug!("{id} cancelled");
                true
            }
            None => false,
        }
    }

    /// Drop a finished job from the registry
    pub fn finish(&mut self, id: JobId) {
        self.jobs.remove(&id);
    }

    pub fn active(&self) -> usize {
        self.jobs.len()
    }

    pub fn get(&self, id: JobId) -> Option<&JobHandle> {
        self.jobs.get(&id)
    }
}
