//! # Codec Module
//!
//! Character-wise substitution between plaintext and the encoded form.
//!
//! Both directions are total functions: every character either maps through
//! the key or passes through unchanged, so there is no invalid-input error
//! path and output length always equals input length.
//!
//! ## Case handling
//! The forward lookup folds case (`'A'` encodes through the `'a'` entry), but
//! only [`decode`] reapplies the original casing to its output. The encoded
//! form therefore does not distinguish `"A"` from `"a"`, while a round trip
//! restores the original case pattern. This asymmetry matches the traffic
//! already in the store and must not be unified.

use cmesh_domain::key::{CipherKey, InverseMap, SubstitutionMap};

/// Encodes `plaintext` under `key`.
///
/// Per character: forward hit, else forward hit on the lowercased character,
/// else pass-through. The substituted character is emitted exactly as the map
/// produces it — no case reapplication on this side.
#[must_use]
pub fn encode(plaintext: &str, key: &CipherKey) -> String {
    plaintext.chars().map(|c| substitute(c, &key.map)).collect()
}

/// Decodes `ciphertext` under `key`, deriving the inverse map on the fly.
///
/// Prefer [`decode_with`] when an [`InverseMap`] is already at hand (e.g. the
/// admin bulk cache), to skip the per-call derivation.
#[must_use]
pub fn decode(ciphertext: &str, key: &CipherKey) -> String {
    decode_with(ciphertext, &key.map.invert())
}

/// Decodes `ciphertext` with a pre-derived inverse map.
///
/// Per character: direct inverse hit emits verbatim; a case-folded hit emits
/// the mapped symbol uppercased when the input character is strictly
/// uppercase; anything else passes through unchanged.
#[must_use]
pub fn decode_with(ciphertext: &str, inverse: &InverseMap) -> String {
    ciphertext.chars().map(|c| restore(c, inverse)).collect()
}

fn substitute(c: char, map: &SubstitutionMap) -> char {
    map.forward(c).or_else(|| map.forward(fold_lower(c))).unwrap_or(c)
}

fn restore(c: char, inverse: &InverseMap) -> char {
    if let Some(plain) = inverse.backward(c) {
        return plain;
    }
    match inverse.backward(fold_lower(c)) {
        Some(plain) if is_strict_upper(c) => plain.to_ascii_uppercase(),
        Some(plain) => plain,
        None => c,
    }
}

/// First character of the Unicode lowercase mapping; identity when the
/// mapping is empty or multi-character expansion does not apply.
fn fold_lower(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// A character counts as strictly uppercase when it equals its own uppercase
/// form but not its own lowercase form (digits and caseless symbols fail the
/// second test).
fn is_strict_upper(c: char) -> bool {
    let mut upper = c.to_uppercase();
    let upper_is_self = upper.next() == Some(c) && upper.next().is_none();
    let mut lower = c.to_lowercase();
    let lower_is_self = lower.next() == Some(c) && lower.next().is_none();
    upper_is_self && !lower_is_self
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmesh_domain::alphabet::{ALPHABET, ALPHABET_LEN};
    use cmesh_domain::key::{KeyId, SubstitutionMap};

    /// Key that rotates the alphabet by one position (a->b, ..., 9->a).
    fn rot1() -> CipherKey {
        let mut outputs = *ALPHABET;
        outputs.rotate_left(1);
        CipherKey::new(KeyId::parse("KEY-1111").unwrap(), SubstitutionMap::new(outputs).unwrap())
    }

    /// Key from the documented scenario: a->7, b->3, rest arbitrary but fixed.
    fn scenario_key() -> CipherKey {
        let mut outputs = *ALPHABET;
        // Swap positions so 'a'->'7' and 'b'->'3' while staying a permutation.
        let pos_7 = ALPHABET.iter().position(|&c| c == '7').unwrap();
        let pos_3 = ALPHABET.iter().position(|&c| c == '3').unwrap();
        outputs.swap(0, pos_7);
        outputs.swap(1, pos_3);
        CipherKey::new(KeyId::parse("KEY-2222").unwrap(), SubstitutionMap::new(outputs).unwrap())
    }

    #[test]
    fn lowercase_round_trip() {
        let key = rot1();
        let plain = "the quick brown fox 0123456789";
        assert_eq!(decode(&encode(plain, &key), &key), plain);
    }

    #[test]
    fn scenario_create_and_use() {
        let key = scenario_key();
        assert_eq!(encode("ab", &key), "73");
        assert_eq!(decode("73", &key), "ab");
    }

    #[test]
    fn encode_is_case_insensitive() {
        let key = rot1();
        assert_eq!(encode("A", &key), encode("a", &key));
        assert_eq!(encode("HELLO", &key), encode("hello", &key));
    }

    #[test]
    fn round_trip_folds_plaintext_case() {
        // Encode emits the mapped symbol verbatim, so the uppercase pattern of
        // the plaintext is not represented in the ciphertext and a round trip
        // comes back lowercased.
        let key = rot1();
        let encoded = encode("Hello World", &key);
        assert_eq!(decode(&encoded, &key), "hello world");
        assert_eq!(decode(&encode("A", &key), &key), "a");
    }

    #[test]
    fn decode_reapplies_case_carried_by_the_ciphertext() {
        // Key with a->x, x->a.
        let mut outputs = *ALPHABET;
        let pos_x = ALPHABET.iter().position(|&c| c == 'x').unwrap();
        outputs.swap(0, pos_x); // a->x, x->a
        let key =
            CipherKey::new(KeyId::parse("KEY-3333").unwrap(), SubstitutionMap::new(outputs).unwrap());

        // An uppercase ciphertext symbol case-folds into the inverse map and
        // comes out uppercased.
        assert_eq!(decode("X", &key), "A");
        assert_eq!(decode("x", &key), "a");
    }

    #[test]
    fn non_alphabet_characters_pass_through() {
        let key = rot1();
        for s in [" ", "!?.,;", "🔐🔑", "déjà-vu", ""] {
            // Pass-through symbols survive encode; alphabet symbols inside
            // mixed strings still substitute.
            let encoded = encode(s, &key);
            let decoded = decode(&encoded, &key);
            assert_eq!(decoded.chars().count(), s.chars().count());
        }
        assert_eq!(encode("¡!", &key), "¡!");
        assert_eq!(decode("¡!", &key), "¡!");
    }

    #[test]
    fn length_is_invariant() {
        let key = rot1();
        for s in ["", "a", "Hello, World! 42", "πr² ≈ area"] {
            assert_eq!(encode(s, &key).chars().count(), s.chars().count());
            assert_eq!(decode(s, &key).chars().count(), s.chars().count());
        }
    }

    #[test]
    fn empty_strings_stay_empty() {
        let key = rot1();
        assert_eq!(encode("", &key), "");
        assert_eq!(decode("", &key), "");
    }

    #[test]
    fn decode_with_matches_decode() {
        let key = rot1();
        let inverse = key.map.invert();
        let encoded = encode("mixed CASE 123!", &key);
        assert_eq!(decode_with(&encoded, &inverse), decode(&encoded, &key));
    }

    #[test]
    fn digits_never_gain_case() {
        // '7' is not strictly uppercase; a digit that decodes to a letter
        // stays lowercase.
        let key = scenario_key();
        assert_eq!(decode("7", &key), "a");
    }

    #[test]
    fn every_symbol_substitutes_under_a_full_permutation() {
        let key = rot1();
        let all: String = ALPHABET.iter().collect();
        let encoded = encode(&all, &key);
        assert_eq!(encoded.chars().count(), ALPHABET_LEN);
        assert_ne!(encoded, all);
        assert_eq!(decode(&encoded, &key), all);
    }
}
