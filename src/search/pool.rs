//! Bounded worker pool for concurrent primality tests.
//!
//! Workers pull jobs from a shared multi-consumer queue and report one
//! message per job back to the coordinator. The only state shared between
//! workers is the per-batch [`BatchSignal`], which is advisory.

use crate::error::{OracleError, SearchError};
use crate::search::oracle::PrimalityOracle;
use crossbeam_channel::{Receiver, Sender, unbounded};
use num_bigint::BigUint;
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Advisory state shared by the workers of a single batch.
///
/// Both fields only move in one direction: the lowest prime index only
/// decreases and the abort flag only goes from false to true.
#[derive(Debug)]
pub struct BatchSignal {
    /// Dispatch index of the smallest prime seen so far (usize::MAX means none).
    lowest_prime: AtomicUsize,
    /// Set once the batch is known to fail.
    aborted: AtomicBool,
}

impl Default for BatchSignal {
    fn default() -> Self {
        Self {
            lowest_prime: AtomicUsize::new(usize::MAX),
            aborted: AtomicBool::new(false),
        }
    }
}

impl BatchSignal {
    /// Record a prime at `index`. Returns true if it is the new lowest.
    pub fn record_prime(&self, index: usize) -> bool {
        let mut current = self.lowest_prime.load(Ordering::SeqCst);
        loop {
            if index >= current {
                return false;
            }
            match self.lowest_prime.compare_exchange_weak(
                current,
                index,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(c) => current = c,
            }
        }
    }

    /// Whether the job at `index` can skip its test.
    ///
    /// Only candidates dispatched after a known hit are eligible, since
    /// candidates are dispatched in increasing order and any of the earlier
    /// ones could still be a smaller prime.
    pub fn should_skip(&self, index: usize) -> bool {
        self.aborted.load(Ordering::SeqCst) || index > self.lowest_prime.load(Ordering::SeqCst)
    }

    pub fn found(&self) -> bool {
        self.lowest_prime.load(Ordering::SeqCst) != usize::MAX
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// A single candidate handed to the pool.
#[derive(Debug)]
pub struct Job {
    /// Position of the candidate within its batch.
    pub index: usize,
    pub candidate: BigUint,
    /// `None` disables early skipping for this job.
    pub signal: Option<Arc<BatchSignal>>,
}

/// Message sent from a worker back to the scheduler.
#[derive(Debug)]
pub enum WorkerMessage {
    Tested {
        index: usize,
        candidate: BigUint,
        is_prime: bool,
    },
    Skipped {
        index: usize,
        candidate: BigUint,
    },
    Failed {
        index: usize,
        candidate: BigUint,
        error: OracleError,
    },
}

impl WorkerMessage {
    pub fn index(&self) -> usize {
        match self {
            WorkerMessage::Tested { index, .. }
            | WorkerMessage::Skipped { index, .. }
            | WorkerMessage::Failed { index, .. } => *index,
        }
    }
}

/// Body of a single worker thread.
pub(crate) type WorkerBody = Box<dyn FnOnce() + Send + 'static>;

/// Fixed set of worker threads sharing one oracle.
///
/// Dropping the pool closes the job queue and joins every worker.
pub struct WorkerPool {
    to_workers: Option<Sender<Job>>,
    from_workers: Receiver<WorkerMessage>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start up to `num_workers` threads.
    ///
    /// If the OS refuses some of the threads the pool keeps whatever did
    /// start; it only fails when not even one worker is available.
    pub fn spawn(
        num_workers: usize,
        oracle: Arc<dyn PrimalityOracle>,
    ) -> Result<Self, SearchError> {
        Self::spawn_with(num_workers, oracle, |builder, work| builder.spawn(work))
    }

    /// Like [`WorkerPool::spawn`], with thread creation delegated to `spawn_thread`.
    pub(crate) fn spawn_with<S>(
        num_workers: usize,
        oracle: Arc<dyn PrimalityOracle>,
        mut spawn_thread: S,
    ) -> Result<Self, SearchError>
    where
        S: FnMut(thread::Builder, WorkerBody) -> io::Result<JoinHandle<()>>,
    {
        if num_workers == 0 {
            return Err(SearchError::InvalidRequest(
                "worker count must be at least 1".to_string(),
            ));
        }

        let (job_tx, job_rx) = unbounded::<Job>();
        let (result_tx, result_rx) = unbounded::<WorkerMessage>();

        let mut handles = Vec::with_capacity(num_workers);
        for worker_id in 0..num_workers {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let oracle = Arc::clone(&oracle);

            let builder = thread::Builder::new().name(format!("primify-worker-{}", worker_id));
            let body: WorkerBody =
                Box::new(move || run_worker(worker_id, oracle.as_ref(), jobs, results));

            match spawn_thread(builder, body) {
                Ok(handle) => handles.push(handle),
                Err(e) if handles.is_empty() => return Err(SearchError::PoolUnavailable(e)),
                Err(e) => {
                    warn!(
                        requested = num_workers,
                        started = handles.len(),
                        error = %e,
                        "could not start all workers, continuing with a smaller pool"
                    );
                    break;
                }
            }
        }

        Ok(Self {
            to_workers: Some(job_tx),
            from_workers: result_rx,
            handles,
        })
    }

    /// Number of running workers.
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    pub fn submit(&self, job: Job) -> Result<(), SearchError> {
        match &self.to_workers {
            Some(tx) => tx
                .send(job)
                .map_err(|_| SearchError::WorkerDisconnected { outstanding: 1 }),
            None => Err(SearchError::WorkerDisconnected { outstanding: 1 }),
        }
    }

    /// Block until the next worker message arrives.
    pub fn recv(&self) -> Option<WorkerMessage> {
        self.from_workers.recv().ok()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the queue lets every worker fall out of its receive loop
        self.to_workers.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Worker loop: test each job's candidate and report exactly one message.
fn run_worker(
    worker_id: usize,
    oracle: &dyn PrimalityOracle,
    jobs: Receiver<Job>,
    results: Sender<WorkerMessage>,
) {
    for job in jobs.iter() {
        let Job {
            index,
            candidate,
            signal,
        } = job;

        if signal.as_ref().is_some_and(|s| s.should_skip(index)) {
            debug!(worker_id, %candidate, "skipping candidate above a known prime");
            let _ = results.send(WorkerMessage::Skipped { index, candidate });
            continue;
        }

        let verdict = catch_unwind(AssertUnwindSafe(|| oracle.is_prime(&candidate)))
            .unwrap_or_else(|_| Err(OracleError::new("primality test panicked")));

        let message = match verdict {
            Ok(is_prime) => {
                if is_prime {
                    debug!(worker_id, %candidate, "candidate is prime");
                    if let Some(signal) = &signal {
                        signal.record_prime(index);
                    }
                }
                WorkerMessage::Tested {
                    index,
                    candidate,
                    is_prime,
                }
            }
            Err(error) => WorkerMessage::Failed {
                index,
                candidate,
                error,
            },
        };

        if results.send(message).is_err() {
            break;
        }
    }
}
