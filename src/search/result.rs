//! Search result types and statistics

use num_bigint::BigUint;
use std::time::Duration;

/// Outcome of a single candidate within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Prime,
    Composite,
    /// Not tested because a smaller prime in the same batch was already known.
    Skipped,
}

/// One candidate and what the batch learned about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry {
    pub candidate: BigUint,
    pub verdict: Verdict,
}

/// Exhaustive record of one batch: exactly one entry per dispatched candidate,
/// stored in dispatch order.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    entries: Vec<BatchEntry>,
}

impl BatchResult {
    pub fn new(entries: Vec<BatchEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The smallest prime hit in the batch, if any.
    ///
    /// Scans every entry rather than trusting completion or insertion
    /// order, so simultaneous hits always resolve to the minimum.
    pub fn smallest_prime(&self) -> Option<&BigUint> {
        self.entries
            .iter()
            .filter(|entry| entry.verdict == Verdict::Prime)
            .map(|entry| &entry.candidate)
            .min()
    }

    pub fn count(&self, verdict: Verdict) -> usize {
        self.entries.iter().filter(|e| e.verdict == verdict).count()
    }
}

/// Statistics from a search operation
#[derive(Debug, Clone, Default)]
pub struct SearchStatistics {
    /// Number of workers actually running (may be below the request if the pool degraded)
    pub worker_count: usize,
    /// Candidates dispatched per round
    pub batch_size: usize,
    /// Number of completed rounds
    pub rounds: u64,
    /// Candidates handed to the worker pool
    pub candidates_dispatched: u64,
    /// Candidates actually run through the primality oracle
    pub candidates_tested: u64,
    /// Candidates skipped after a smaller hit was known
    pub candidates_skipped: u64,
    /// Total time spent searching
    pub elapsed_time: Duration,
}

impl SearchStatistics {
    pub(crate) fn record_batch(&mut self, batch: &BatchResult) {
        self.rounds += 1;
        self.candidates_dispatched += batch.len() as u64;
        self.candidates_tested +=
            (batch.count(Verdict::Prime) + batch.count(Verdict::Composite)) as u64;
        self.candidates_skipped += batch.count(Verdict::Skipped) as u64;
    }
}

/// The smallest prime at or above the requested start, plus whatever the
/// caller attached to the request.
#[derive(Debug, Clone)]
pub struct SearchOutcome<M = ()> {
    pub prime: BigUint,
    pub metadata: M,
    pub statistics: SearchStatistics,
}
