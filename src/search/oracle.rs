//! Primality oracles consulted by search workers.

use crate::error::OracleError;
use num_bigint::BigUint;
use num_prime::nt_funcs::is_prime;

/// Decides whether an arbitrary-precision integer is prime.
///
/// Implementations are shared across worker threads and called
/// concurrently, so they must not rely on per-call mutable state.
pub trait PrimalityOracle: Send + Sync {
    /// Test a single candidate.
    ///
    /// An `Err` means the oracle could not reach a verdict. Callers treat
    /// that as fatal rather than as "not prime".
    fn is_prime(&self, candidate: &BigUint) -> Result<bool, OracleError>;
}

/// Default oracle backed by `num-prime`'s trial division plus strong
/// probable-prime tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumPrimeOracle;

impl PrimalityOracle for NumPrimeOracle {
    fn is_prime(&self, candidate: &BigUint) -> Result<bool, OracleError> {
        Ok(is_prime(candidate, None).probably())
    }
}

impl<F> PrimalityOracle for F
where
    F: Fn(&BigUint) -> Result<bool, OracleError> + Send + Sync,
{
    fn is_prime(&self, candidate: &BigUint) -> Result<bool, OracleError> {
        self(candidate)
    }
}
