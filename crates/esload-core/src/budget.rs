use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Counts {
    /// Units not yet handed to a worker.
    unclaimed: u64,
    /// Documents not yet submitted to completion.
    remaining: u64,
}

/// Remaining quota for a run. A unit is claimed before a worker is dispatched and
/// completed once that worker finishes, whatever its outcome.
#[derive(Debug)]
pub struct WorkBudget { counts: Mutex<Counts> }

impl WorkBudget {
    pub fn new(quota: u64) -> Self {
        Self { counts: Mutex::new(Counts { unclaimed: quota, remaining: quota }) }
    }

    /// Reserves one unit if any is left. Check and decrement happen under one lock so
    /// concurrent callers can never dispatch past the quota.
    pub fn try_claim(&self) -> bool {
        let mut c = self.lock();
        if c.unclaimed == 0 { return false; }
        c.unclaimed -= 1;
        true
    }

    /// Records one finished worker and returns what is left. Never goes below zero.
    pub fn complete(&self) -> u64 {
        let mut c = self.lock();
        c.remaining = c.remaining.saturating_sub(1);
        c.remaining
    }

    pub fn remaining(&self) -> u64 { self.lock().remaining }
    pub fn unclaimed(&self) -> u64 { self.lock().unclaimed }

    fn lock(&self) -> MutexGuard<'_, Counts> {
        // counters stay consistent even if a holder panicked
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
