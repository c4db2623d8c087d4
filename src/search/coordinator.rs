//! Search coordinator: sizes the search, runs rounds and picks the answer.

use crate::error::SearchError;
use crate::search::batch::BatchScheduler;
use crate::search::candidate::CandidateGenerator;
use crate::search::config::SearchConfig;
use crate::search::oracle::PrimalityOracle;
use crate::search::pool::WorkerPool;
use crate::search::result::{SearchOutcome, SearchStatistics};
use num_bigint::BigUint;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Immutable input to a single search.
///
/// `metadata` travels with the request and comes back untouched in the
/// [`SearchOutcome`]; the search never looks at it.
#[derive(Debug, Clone)]
pub struct SearchRequest<M = ()> {
    start: BigUint,
    worker_count: usize,
    metadata: M,
}

impl SearchRequest<()> {
    pub fn new(start: BigUint, worker_count: usize) -> Result<Self, SearchError> {
        if worker_count == 0 {
            return Err(SearchError::InvalidRequest(
                "worker count must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            start,
            worker_count,
            metadata: (),
        })
    }

    /// Build a request from a decimal string.
    pub fn parse(start: &str, worker_count: usize) -> Result<Self, SearchError> {
        Self::new(parse_start(start)?, worker_count)
    }
}

/// Parse a starting number written in decimal, ignoring surrounding whitespace.
pub fn parse_start(text: &str) -> Result<BigUint, SearchError> {
    let trimmed = text.trim();
    BigUint::parse_bytes(trimmed.as_bytes(), 10).ok_or_else(|| {
        SearchError::InvalidRequest(format!(
            "'{}' is not a non-negative decimal integer",
            trimmed
        ))
    })
}

impl<M> SearchRequest<M> {
    /// Attach caller data to be handed back with the outcome.
    pub fn with_metadata<N>(self, metadata: N) -> SearchRequest<N> {
        SearchRequest {
            start: self.start,
            worker_count: self.worker_count,
            metadata,
        }
    }

    pub fn start(&self) -> &BigUint {
        &self.start
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }
}

/// Drives a search from sizing to the first round that contains a prime.
///
/// Rounds run strictly one after another over a single increasing
/// candidate stream, so a prime in an earlier round always wins over one in
/// a later round. Within a round the smallest hit wins regardless of which
/// worker finished first.
pub struct SearchCoordinator<M = ()> {
    request: SearchRequest<M>,
    config: SearchConfig,
    oracle: Arc<dyn PrimalityOracle>,
}

impl<M> SearchCoordinator<M> {
    pub fn new(
        request: SearchRequest<M>,
        config: SearchConfig,
        oracle: Arc<dyn PrimalityOracle>,
    ) -> Self {
        Self {
            request,
            config,
            oracle,
        }
    }

    /// Run the search to completion: size it, test rounds until one holds
    /// a prime, then shut the pool down. The coordinator is consumed.
    pub fn run(self) -> Result<SearchOutcome<M>, SearchError> {
        let started = Instant::now();
        let deadline = self.config.timeout.map(|t| started + t);
        let mut statistics = SearchStatistics::default();

        // --- SIZING ---
        if self.request.worker_count == 0 {
            return Err(SearchError::InvalidRequest(
                "worker count must be at least 1".to_string(),
            ));
        }

        // 2 and 3 are the only primes the mod 6 wheel never yields
        if let Some(prime) = small_prime_at_or_above(&self.request.start) {
            debug!(start = %self.request.start, %prime, "answered below the wheel");
            statistics.elapsed_time = started.elapsed();
            return Ok(SearchOutcome {
                prime,
                metadata: self.request.metadata,
                statistics,
            });
        }

        let batch_size = self.config.batch_size_for(&self.request.start);
        if batch_size == 0 {
            return Err(SearchError::InvalidRequest(
                "batch size must be at least 1".to_string(),
            ));
        }

        let pool = WorkerPool::spawn(self.request.worker_count, Arc::clone(&self.oracle))?;
        statistics.worker_count = pool.size();
        statistics.batch_size = batch_size;
        info!(
            workers = pool.size(),
            batch_size,
            digits = self.request.start.to_str_radix(10).len(),
            "starting next-prime search"
        );

        // --- SEARCHING ---
        let scheduler = BatchScheduler::new(&pool, self.config.early_skip);
        let mut candidates = CandidateGenerator::new(&self.request.start);
        let mut round = 0u64;

        let prime = loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(SearchError::TimedOut { rounds: round });
            }

            round += 1;
            info!(round, batch_size, "testing batch of candidates");

            let batch = scheduler.run_batch(&mut candidates, batch_size)?;
            statistics.record_batch(&batch);

            if let Some(prime) = batch.smallest_prime() {
                break prime.clone();
            }
        };

        // --- DONE ---
        drop(pool);
        statistics.elapsed_time = started.elapsed();
        info!(
            rounds = statistics.rounds,
            tested = statistics.candidates_tested,
            elapsed = ?statistics.elapsed_time,
            "found next prime"
        );

        Ok(SearchOutcome {
            prime,
            metadata: self.request.metadata,
            statistics,
        })
    }
}

/// Smallest prime `>= start` for starts the wheel cannot handle (`start <= 3`).
fn small_prime_at_or_above(start: &BigUint) -> Option<BigUint> {
    if start <= &BigUint::from(2u32) {
        Some(BigUint::from(2u32))
    } else if start == &BigUint::from(3u32) {
        Some(BigUint::from(3u32))
    } else {
        None
    }
}

/// Find the smallest prime `>= request.start()` with the given oracle.
pub fn find_next_prime<M>(
    request: SearchRequest<M>,
    config: &SearchConfig,
    oracle: Arc<dyn PrimalityOracle>,
) -> Result<SearchOutcome<M>, SearchError> {
    SearchCoordinator::new(request, config.clone(), oracle).run()
}
