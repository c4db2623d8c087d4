//! Error types for the prime search and the image pipeline.

use num_bigint::BigUint;
use thiserror::Error;

/// Failure reported by a primality oracle for a single candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct OracleError {
    message: String,
}

impl OracleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by the parallel next-prime search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The request was rejected before any work was scheduled.
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// The primality oracle could not decide a dispatched candidate.
    #[error("primality test failed for candidate {candidate}: {source}")]
    OracleFailure {
        candidate: BigUint,
        #[source]
        source: OracleError,
    },

    /// Not a single worker thread could be started.
    #[error("could not start any search worker: {0}")]
    PoolUnavailable(#[source] std::io::Error),

    /// The result channel closed while a batch was still outstanding.
    #[error("worker pool disconnected with {outstanding} candidate(s) outstanding")]
    WorkerDisconnected { outstanding: usize },

    /// The configured deadline elapsed between rounds.
    #[error("search timed out after {rounds} round(s)")]
    TimedOut { rounds: u64 },
}

/// Errors from turning an image into a number.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to load image: {0}")]
    Load(#[from] image::ImageError),

    #[error("max digits must be at least {min}, got {requested}")]
    TooFewDigits { requested: usize, min: usize },

    #[error("image has no pixels")]
    Empty,
}
