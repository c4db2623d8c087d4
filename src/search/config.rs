//! Configuration types for the next-prime search

use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::time::Duration;

/// Smallest batch the coordinator will ever dispatch.
pub const DEFAULT_MIN_BATCH_SIZE: usize = 10;

/// Configuration for the batched parallel search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Lower bound on the batch size derived from the expected prime gap.
    pub min_batch_size: usize,
    /// Fixed batch size, bypassing the prime-gap estimate.
    pub batch_size: Option<usize>,
    /// Let queued candidates above a known hit skip their primality test.
    pub early_skip: bool,
    /// Deadline for the whole search, checked between rounds.
    pub timeout: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_batch_size: DEFAULT_MIN_BATCH_SIZE,
            batch_size: None,
            early_skip: true,
            timeout: None,
        }
    }
}

impl SearchConfig {
    /// Set the lower bound on the derived batch size (at least 1).
    pub fn with_min_batch_size(mut self, min_batch_size: usize) -> Self {
        self.min_batch_size = min_batch_size.max(1);
        self
    }

    /// Use a fixed batch size for every round.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Set a fixed batch size from an Option; `None` derives it from the start.
    pub fn with_batch_size_option(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Enable or disable skipping candidates above a known prime.
    pub fn with_early_skip(mut self, enabled: bool) -> Self {
        self.early_skip = enabled;
        self
    }

    /// Set the overall timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the overall timeout from an Option.
    pub fn with_timeout_option(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Batch size for a search starting at `start`.
    ///
    /// The prime number theorem puts the average gap near `N` at `ln N`, so a
    /// batch of `max(min_batch_size, floor(ln start))` candidates usually
    /// contains a prime on the first round.
    pub fn batch_size_for(&self, start: &BigUint) -> usize {
        if let Some(size) = self.batch_size {
            return size;
        }
        let expected_gap = approximate_ln(start)
            .filter(|ln| ln.is_finite() && *ln > 0.0)
            .map(|ln| ln.floor() as usize)
            .unwrap_or(0);
        expected_gap.max(self.min_batch_size)
    }
}

/// Worker count that leaves one core free for the coordinating thread.
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// Natural logarithm of an arbitrary-precision integer, `None` for zero.
///
/// Values wider than 64 bits are reduced to their top 64 bits first so the
/// result stays finite for inputs with thousands of digits.
pub fn approximate_ln(n: &BigUint) -> Option<f64> {
    let bits = n.bits();
    if bits == 0 {
        return None;
    }
    if bits <= 64 {
        return n.to_u64().map(|v| (v as f64).ln());
    }
    let shift = bits - 64;
    let top = (n >> shift).to_u64()?;
    Some((top as f64).ln() + shift as f64 * std::f64::consts::LN_2)
}
