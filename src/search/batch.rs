//! One round of the search: dispatch a batch of candidates and wait for all of them.

use crate::error::SearchError;
use crate::search::pool::{BatchSignal, Job, WorkerMessage, WorkerPool};
use crate::search::result::{BatchEntry, BatchResult, Verdict};
use num_bigint::BigUint;
use std::sync::Arc;

/// Runs batches of candidates through a [`WorkerPool`].
pub struct BatchScheduler<'a> {
    pool: &'a WorkerPool,
    early_skip: bool,
}

impl<'a> BatchScheduler<'a> {
    pub fn new(pool: &'a WorkerPool, early_skip: bool) -> Self {
        Self { pool, early_skip }
    }

    /// Pull `size` candidates, test them concurrently and return once every
    /// one of them has been accounted for.
    ///
    /// The returned [`BatchResult`] holds the candidates in the order they
    /// were pulled. A failing oracle call fails the whole batch, but only
    /// after the remaining jobs have drained.
    pub fn run_batch<I>(&self, candidates: &mut I, size: usize) -> Result<BatchResult, SearchError>
    where
        I: Iterator<Item = BigUint>,
    {
        if size == 0 {
            return Err(SearchError::InvalidRequest(
                "batch size must be at least 1".to_string(),
            ));
        }

        let signal = Arc::new(BatchSignal::default());
        let mut dispatched = 0;
        for (index, candidate) in candidates.by_ref().take(size).enumerate() {
            self.pool.submit(Job {
                index,
                candidate,
                signal: self.early_skip.then(|| Arc::clone(&signal)),
            })?;
            dispatched += 1;
        }

        let mut slots: Vec<Option<BatchEntry>> = vec![None; dispatched];
        let mut failure: Option<SearchError> = None;

        for received in 0..dispatched {
            let Some(message) = self.pool.recv() else {
                return Err(SearchError::WorkerDisconnected {
                    outstanding: dispatched - received,
                });
            };

            let index = message.index();
            let entry = match message {
                WorkerMessage::Tested {
                    candidate,
                    is_prime,
                    ..
                } => BatchEntry {
                    candidate,
                    verdict: if is_prime {
                        Verdict::Prime
                    } else {
                        Verdict::Composite
                    },
                },
                WorkerMessage::Skipped { candidate, .. } => BatchEntry {
                    candidate,
                    verdict: Verdict::Skipped,
                },
                WorkerMessage::Failed {
                    candidate, error, ..
                } => {
                    // queued jobs of this batch can stop testing now
                    signal.abort();
                    if failure.is_none() {
                        failure = Some(SearchError::OracleFailure {
                            candidate: candidate.clone(),
                            source: error,
                        });
                    }
                    BatchEntry {
                        candidate,
                        verdict: Verdict::Skipped,
                    }
                }
            };
            slots[index] = Some(entry);
        }

        if let Some(error) = failure {
            return Err(error);
        }

        let entries: Vec<BatchEntry> = slots.into_iter().flatten().collect();
        debug_assert_eq!(entries.len(), dispatched);
        Ok(BatchResult::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OracleError;
    use crate::search::candidate::CandidateGenerator;
    use crate::search::oracle::NumPrimeOracle;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_batch_is_exhaustive_and_ordered() {
        let pool = WorkerPool::spawn(3, Arc::new(NumPrimeOracle)).unwrap();
        let scheduler = BatchScheduler::new(&pool, false);
        let mut candidates = CandidateGenerator::new(&BigUint::from(100u32));

        let batch = scheduler.run_batch(&mut candidates, 10).unwrap();
        assert_eq!(batch.len(), 10);
        assert_eq!(batch.count(Verdict::Skipped), 0);

        let pulled: Vec<BigUint> = batch.entries().iter().map(|e| e.candidate.clone()).collect();
        let expected: Vec<BigUint> = CandidateGenerator::new(&BigUint::from(100u32))
            .take(10)
            .collect();
        assert_eq!(pulled, expected);
        assert_eq!(batch.smallest_prime(), Some(&BigUint::from(101u32)));

        // the next batch continues where this one stopped
        let next = scheduler.run_batch(&mut candidates, 5).unwrap();
        let expected_next: Vec<BigUint> = CandidateGenerator::new(&BigUint::from(100u32))
            .skip(10)
            .take(5)
            .collect();
        let pulled_next: Vec<BigUint> = next
            .entries()
            .iter()
            .map(|e| e.candidate.clone())
            .collect();
        assert_eq!(pulled_next, expected_next);
    }

    #[test]
    fn test_batch_rejects_zero_size() {
        let pool = WorkerPool::spawn(1, Arc::new(NumPrimeOracle)).unwrap();
        let scheduler = BatchScheduler::new(&pool, true);
        let mut candidates = CandidateGenerator::new(&BigUint::from(100u32));
        assert!(matches!(
            scheduler.run_batch(&mut candidates, 0),
            Err(SearchError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_oracle_failure_propagates_after_drain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let oracle = move |n: &BigUint| -> Result<bool, OracleError> {
            counter.fetch_add(1, Ordering::SeqCst);
            if n == &BigUint::from(107u32) {
                Err(OracleError::new("out of memory"))
            } else {
                Ok(false)
            }
        };
        let pool = WorkerPool::spawn(2, Arc::new(oracle)).unwrap();
        let scheduler = BatchScheduler::new(&pool, true);
        let mut candidates = CandidateGenerator::new(&BigUint::from(100u32));

        match scheduler.run_batch(&mut candidates, 12) {
            Err(SearchError::OracleFailure { candidate, source }) => {
                assert_eq!(candidate, BigUint::from(107u32));
                assert_eq!(source.message(), "out of memory");
            }
            other => panic!("expected oracle failure, got {:?}", other),
        }

        // the pool has no stale messages left over from the failed batch
        let batch = scheduler.run_batch(&mut candidates, 4).unwrap();
        assert_eq!(batch.len(), 4);
        assert!(calls.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn test_early_skip_only_skips_above_hit() {
        // single worker: jobs run in dispatch order, so everything after 101 is skipped
        let pool = WorkerPool::spawn(1, Arc::new(NumPrimeOracle)).unwrap();
        let scheduler = BatchScheduler::new(&pool, true);
        let mut candidates = CandidateGenerator::new(&BigUint::from(100u32));

        let batch = scheduler.run_batch(&mut candidates, 10).unwrap();
        assert_eq!(batch.entries()[0].verdict, Verdict::Prime);
        assert_eq!(batch.count(Verdict::Skipped), 9);
        assert_eq!(batch.smallest_prime(), Some(&BigUint::from(101u32)));
    }
}
