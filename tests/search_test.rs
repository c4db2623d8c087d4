use num_bigint::BigUint;
use num_prime::nt_funcs::is_prime;
use primify::error::OracleError;
use primify::search::{
    CandidateGenerator, NumPrimeOracle, PrimalityOracle, SearchConfig, SearchRequest,
    find_next_prime,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex};

/// Plain sequential scan, one integer at a time, as the reference answer.
fn sequential_next_prime(start: &BigUint) -> BigUint {
    let mut n = start.clone();
    while !is_prime(&n, None).probably() {
        n += 1u32;
    }
    n
}

fn parallel_next_prime(start: &BigUint, workers: usize) -> BigUint {
    let request = SearchRequest::new(start.clone(), workers).unwrap();
    find_next_prime(request, &SearchConfig::default(), Arc::new(NumPrimeOracle))
        .unwrap()
        .prime
}

fn random_biguint(rng: &mut ChaCha8Rng, bytes: usize) -> BigUint {
    let raw: Vec<u8> = (0..bytes).map(|_| rng.random()).collect();
    BigUint::from_bytes_le(&raw)
}

#[test]
fn test_matches_sequential_reference_for_small_starts() {
    for start in 0u32..400 {
        let start = BigUint::from(start);
        assert_eq!(
            parallel_next_prime(&start, 3),
            sequential_next_prime(&start),
            "start {}",
            start
        );
    }
}

#[test]
fn test_matches_sequential_reference_for_random_starts() {
    let mut rng = ChaCha8Rng::seed_from_u64(67);
    for bytes in [4usize, 8, 16, 32, 64] {
        for _ in 0..4 {
            let start = random_biguint(&mut rng, bytes);
            assert_eq!(
                parallel_next_prime(&start, 4),
                sequential_next_prime(&start),
                "start {}",
                start
            );
        }
    }
}

#[test]
fn test_matches_sequential_reference_for_multi_hundred_digit_start() {
    // 10^250 + 7, an odd start with 251 digits
    let start = BigUint::from(10u32).pow(250) + 7u32;
    let expected = sequential_next_prime(&start);
    let found = parallel_next_prime(&start, 4);

    assert_eq!(found, expected);
    assert!(found >= start);
    assert!(is_prime(&found, None).probably());
}

#[test]
fn test_same_answer_for_any_worker_count() {
    let mut rng = ChaCha8Rng::seed_from_u64(1594);
    let start = random_biguint(&mut rng, 40);
    let answers: Vec<BigUint> = [1usize, 2, 8, 32]
        .into_iter()
        .map(|workers| parallel_next_prime(&start, workers))
        .collect();

    assert!(answers.windows(2).all(|w| w[0] == w[1]), "answers differ: {:?}", answers);
    assert_eq!(answers[0], sequential_next_prime(&start));
}

#[test]
fn test_two_pow_67_minus_two() {
    let start = (BigUint::from(1u32) << 67u32) - 2u32;
    let reference = sequential_next_prime(&start);

    let single = parallel_next_prime(&start, 1);
    let many = parallel_next_prime(&start, 16);

    assert_eq!(single, reference);
    assert_eq!(many, reference);
    assert!(reference > start);
}

/// Oracle wrapper that records every candidate it is asked about.
struct RecordingOracle {
    seen: Mutex<Vec<BigUint>>,
}

impl PrimalityOracle for RecordingOracle {
    fn is_prime(&self, candidate: &BigUint) -> Result<bool, OracleError> {
        self.seen
            .lock()
            .map_err(|_| OracleError::new("recording lock poisoned"))?
            .push(candidate.clone());
        NumPrimeOracle.is_prime(candidate)
    }
}

#[test]
fn test_every_tested_candidate_is_on_the_wheel() {
    let oracle = Arc::new(RecordingOracle {
        seen: Mutex::new(Vec::new()),
    });

    let mut rng = ChaCha8Rng::seed_from_u64(6);
    for _ in 0..20 {
        let start = random_biguint(&mut rng, 12);
        let request = SearchRequest::new(start.clone(), 4).unwrap();
        let config = SearchConfig::default().with_early_skip(false);
        let outcome = find_next_prime(request, &config, oracle.clone()).unwrap();
        assert!(outcome.prime >= start);
    }

    let seen = oracle.seen.lock().unwrap();
    assert!(!seen.is_empty());
    for candidate in seen.iter() {
        let residue = (candidate % 6u32).iter_u32_digits().next().unwrap_or(0);
        assert!(residue == 1 || residue == 5, "{} tested off the wheel", candidate);
    }
}

#[test]
fn test_generator_replays_identically() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for _ in 0..10 {
        let start = random_biguint(&mut rng, 24);
        let k = rng.random_range(1..200);
        let first: Vec<BigUint> = CandidateGenerator::new(&start).take(k).collect();
        let second: Vec<BigUint> = CandidateGenerator::new(&start).take(k).collect();
        assert_eq!(first, second);
    }
}
