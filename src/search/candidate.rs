//! Wheel (mod 6) candidate generation for the next-prime search.
//!
//! Every prime above 3 is congruent to 1 or 5 modulo 6, so the generator
//! only ever yields integers with those residues. Starting from an
//! arbitrary value it first advances to the nearest admissible residue,
//! then alternates steps of +4 (from residue 1) and +2 (from residue 5).

use num_bigint::BigUint;

/// Strictly increasing stream of integers `c >= start` with `c mod 6` in `{1, 5}`.
///
/// The cursor is stateful and cannot be rewound; build a fresh generator to
/// replay a sequence from the same start.
#[derive(Debug)]
pub struct CandidateGenerator {
    next: BigUint,
    step: u32,
}

impl CandidateGenerator {
    pub fn new(start: &BigUint) -> Self {
        let residue = (start % 6u32).iter_u32_digits().next().unwrap_or(0);
        let offset: u32 = match residue {
            0 => 1,
            1 => 0,
            2 => 3,
            3 => 2,
            4 => 1,
            _ => 0,
        };
        let next = start + offset;
        // residue of `next` is 1 or 5; 1 steps to 5 (+4), 5 steps to 7 (+2)
        let step = if (residue + offset) % 6 == 1 { 4 } else { 2 };

        Self { next, step }
    }

    /// Yield the next candidate and advance the cursor.
    pub fn next_candidate(&mut self) -> BigUint {
        let candidate = self.next.clone();
        self.next += self.step;
        self.step = 6 - self.step;
        candidate
    }
}

impl Iterator for CandidateGenerator {
    type Item = BigUint;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_candidate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn residue(n: &BigUint) -> u32 {
        (n % 6u32).iter_u32_digits().next().unwrap_or(0)
    }

    #[test]
    fn test_first_candidate_per_residue() {
        let expected = [
            (0u32, 1u32),
            (1, 1),
            (2, 5),
            (3, 5),
            (4, 5),
            (5, 5),
            (6, 7),
            (7, 7),
            (8, 11),
        ];
        for (start, first) in expected {
            let mut generator = CandidateGenerator::new(&BigUint::from(start));
            assert_eq!(
                generator.next_candidate(),
                BigUint::from(first),
                "wrong first candidate for start {}",
                start
            );
        }
    }

    #[test]
    fn test_sequence_from_small_start() {
        let candidates: Vec<BigUint> = CandidateGenerator::new(&BigUint::from(20u32))
            .take(8)
            .collect();
        let expected: Vec<BigUint> = [23u32, 25, 29, 31, 35, 37, 41, 43]
            .into_iter()
            .map(BigUint::from)
            .collect();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn test_congruence_and_monotonicity_over_many_starts() {
        for start in 0u32..500 {
            let start = BigUint::from(start);
            let mut previous: Option<BigUint> = None;
            for candidate in CandidateGenerator::new(&start).take(50) {
                assert!(candidate >= start);
                let r = residue(&candidate);
                assert!(r == 1 || r == 5, "candidate {} has residue {}", candidate, r);
                if let Some(prev) = &previous {
                    assert!(&candidate > prev);
                    // consecutive admissible residues are never more than 4 apart
                    assert!(&candidate - prev <= BigUint::from(4u32));
                }
                previous = Some(candidate);
            }
        }
    }

    #[test]
    fn test_congruence_for_random_large_starts() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        for _ in 0..200 {
            let len = rng.random_range(8..128);
            let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
            let start = BigUint::from_bytes_le(&bytes);
            let mut generator = CandidateGenerator::new(&start);
            let first = generator.next_candidate();
            assert!(first >= start);
            assert!(&first - &start <= BigUint::from(3u32));
            for candidate in std::iter::once(first).chain(generator.take(20)) {
                let r = residue(&candidate);
                assert!(r == 1 || r == 5);
            }
        }
    }

    #[test]
    fn test_fresh_generator_replays_sequence() {
        let start = BigUint::parse_bytes(b"98765432109876543210987654321", 10).unwrap();
        let first: Vec<BigUint> = CandidateGenerator::new(&start).take(64).collect();
        let second: Vec<BigUint> = CandidateGenerator::new(&start).take(64).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_admissible_start_is_first_candidate() {
        let start = BigUint::from(97u32);
        let mut generator = CandidateGenerator::new(&start);
        assert_eq!(generator.next_candidate(), start);
        assert_eq!(generator.next_candidate(), BigUint::from(101u32));
    }
}
