// Active Run Registry
//
// Explicit, injectable state holder with an atomic check-and-set,
// shared by every execution path. Backs the invariant that at most one
// run per job id is in progress at any instant: a fire or trigger that
// loses the race is skipped, never queued.

use crate::domain::JobId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct ActiveRuns {
    inner: Mutex<HashSet<JobId>>,
}

impl ActiveRuns {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Atomically claim the job. Returns None when a run for this job id
    /// is already in progress; the returned token releases the claim on
    /// drop, on every exit path.
    pub fn try_begin(self: &Arc<Self>, job_id: JobId) -> Option<RunToken> {
        let mut active = self.inner.lock().unwrap();
        if active.insert(job_id) {
            Some(RunToken {
                runs: Arc::clone(self),
                job_id,
            })
        } else {
            None
        }
    }

    pub fn is_active(&self, job_id: JobId) -> bool {
        self.inner.lock().unwrap().contains(&job_id)
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

/// Claim on a job id, released on drop
pub struct RunToken {
    runs: Arc<ActiveRuns>,
    job_id: JobId,
}

impl Drop for RunToken {
    fn drop(&mut self) {
        self.runs.inner.lock().unwrap().remove(&self.job_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_is_rejected_until_release() {
        let runs = ActiveRuns::new();

        let token = runs.try_begin(7).expect("first claim succeeds");
        assert!(runs.is_active(7));
        assert!(runs.try_begin(7).is_none(), "overlap must be rejected");

        // A different job is unaffected
        assert!(runs.try_begin(8).is_some());

        drop(token);
        assert!(!runs.is_active(7));
        assert!(runs.try_begin(7).is_some());
    }

    #[test]
    fn token_releases_on_panic_unwind() {
        let runs = ActiveRuns::new();
        let runs_clone = Arc::clone(&runs);

        let result = std::panic::catch_unwind(move || {
            let _token = runs_clone.try_begin(1).unwrap();
            panic!("boom");
        });

        assert!(result.is_err());
        assert!(!runs.is_active(1), "claim must not leak across a panic");
    }
}
