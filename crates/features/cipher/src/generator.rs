//! # Key Generation Module
//!
//! This module mints new protocol keys: a uniformly random permutation of the
//! alphabet paired with a fresh `KEY-####` identifier.
//!
//! ## Randomness
//! All draws come from the operating system's Cryptographically Secure
//! Pseudo-Random Number Generator via `getrandom` (e.g., `getrandom` on Linux,
//! `BCryptGenRandom` on Windows). Bounded draws use rejection sampling, so the
//! resulting permutation is unbiased — every one of the 36! orderings is
//! equally likely.
//!
//! ## Collisions
//! Identifiers are drawn from a 4-digit space without consulting the registry;
//! uniqueness is enforced at persistence time, where the registry rejects a
//! duplicate id and the caller regenerates.

use crate::error::CipherError;
use cmesh_domain::alphabet::ALPHABET;
use cmesh_domain::key::{CipherKey, KeyId, SubstitutionMap};
use getrandom::fill;

/// Lower bound (inclusive) of the numeric id space.
const ID_FLOOR: u32 = 1000;
/// Size of the numeric id space (`1000..=9999`).
const ID_SPAN: u32 = 9000;

/// Produces a new random protocol key.
///
/// The forward map is built by zipping the canonical alphabet order against a
/// freshly shuffled copy positionally, so bijectivity holds by construction
/// (and is still re-checked by [`SubstitutionMap::new`]).
///
/// Pure aside from entropy: persistence is the caller's responsibility via
/// the registry.
///
/// # Errors
/// Returns [`CipherError::Entropy`] if the system RNG fails to fill a buffer.
/// This is a rare critical failure that usually indicates an environment-level
/// issue with the OS entropy pool.
pub fn generate() -> Result<CipherKey, CipherError> {
    let id = random_id()?;
    let map = random_map()?;
    Ok(CipherKey::new(id, map))
}

/// Shuffles the alphabet with an unbiased Fisher–Yates pass.
fn random_map() -> Result<SubstitutionMap, CipherError> {
    let mut shuffled = *ALPHABET;
    for i in (1..shuffled.len()).rev() {
        let j = random_below(i as u32 + 1)? as usize;
        shuffled.swap(i, j);
    }
    SubstitutionMap::new(shuffled).map_err(CipherError::from)
}

/// Draws a fresh id in the `KEY-1000..=KEY-9999` space.
fn random_id() -> Result<KeyId, CipherError> {
    let number = ID_FLOOR + random_below(ID_SPAN)?;
    KeyId::from_number(number as u16).map_err(CipherError::from)
}

/// Uniform draw in `0..bound` via rejection sampling over 32-bit words.
fn random_below(bound: u32) -> Result<u32, CipherError> {
    // Largest multiple of `bound` representable in the 2^32 draw space;
    // draws past it would bias the modulo and are re-drawn.
    let zone = u32::MAX - u32::MAX % bound;

    loop {
        let mut buf = [0u8; 4];
        fill(&mut buf).map_err(|e| CipherError::Entropy {
            message: e.to_string().into(),
            context: Some("Failed to draw random bytes".into()),
        })?;

        let draw = u32::from_le_bytes(buf);
        if draw < zone {
            return Ok(draw % bound);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmesh_domain::alphabet::{ALPHABET_LEN, alphabet_index};

    #[test]
    fn generated_maps_are_permutations() {
        for _ in 0..64 {
            let key = generate().unwrap();
            let mut seen = [false; ALPHABET_LEN];
            for (_, substituted) in key.map.entries() {
                let i = alphabet_index(substituted).expect("output stays in the alphabet");
                assert!(!seen[i], "no output symbol may repeat");
                seen[i] = true;
            }
            assert!(seen.iter().all(|&s| s), "every symbol appears exactly once");
        }
    }

    #[test]
    fn generated_ids_stay_in_the_four_digit_space() {
        for _ in 0..64 {
            let key = generate().unwrap();
            let digits = key.id.as_str().strip_prefix("KEY-").unwrap();
            let number: u32 = digits.parse().unwrap();
            assert!((1000..=9999).contains(&number), "got {number}");
        }
    }

    #[test]
    fn random_below_respects_the_bound() {
        for bound in [1, 2, 7, 9000] {
            for _ in 0..32 {
                assert!(random_below(bound).unwrap() < bound);
            }
        }
    }

    #[test]
    fn consecutive_keys_differ() {
        // A 36! keyspace makes a collision here effectively impossible.
        let a = generate().unwrap();
        let b = generate().unwrap();
        assert_ne!(a.map, b.map);
    }
}
