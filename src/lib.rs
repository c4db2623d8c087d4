//! Turn images into primes that still look like the image.
//!
//! The [`picture`] module reduces a picture to a grid of brightness digits and
//! reads it as one large integer. The [`search`] module then finds the
//! smallest prime at or above that integer using a pool of worker threads.

pub mod error;
pub mod picture;
pub mod search;

pub use error::{ImageError, OracleError, SearchError};
pub use picture::{ImageNumber, numberize};
pub use search::{NumPrimeOracle, SearchConfig, SearchOutcome, SearchRequest, find_next_prime};
