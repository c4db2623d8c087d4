//! Parallel next-prime search
//!
//! Finds the smallest prime greater than or equal to a (possibly huge)
//! starting integer by testing batches of candidates concurrently.
//!
//! # Architecture
//!
//! - A **candidate generator** yields integers congruent to 1 or 5 mod 6
//! - A **worker pool** tests candidates against a [`PrimalityOracle`]
//! - A **batch scheduler** dispatches one batch and waits for every result
//! - A **coordinator** sizes batches from the expected prime gap, repeats
//!   rounds and picks the smallest prime of the first batch that has one
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use num_bigint::BigUint;
//! use primify::search::{NumPrimeOracle, SearchConfig, SearchRequest, find_next_prime};
//!
//! let request = SearchRequest::new(BigUint::from(1_000_000u32), 4)?;
//! let outcome = find_next_prime(request, &SearchConfig::default(), Arc::new(NumPrimeOracle))?;
//! assert_eq!(outcome.prime, BigUint::from(1_000_003u32));
//! # Ok::<(), primify::error::SearchError>(())
//! ```

pub mod batch;
pub mod candidate;
pub mod config;
pub mod coordinator;
pub mod oracle;
pub mod pool;
pub mod result;

pub use batch::BatchScheduler;
pub use candidate::CandidateGenerator;
pub use config::{SearchConfig, default_worker_count};
pub use coordinator::{SearchCoordinator, SearchRequest, find_next_prime, parse_start};
pub use oracle::{NumPrimeOracle, PrimalityOracle};
pub use result::{BatchEntry, BatchResult, SearchOutcome, SearchStatistics, Verdict};
