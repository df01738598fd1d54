//! Cipher key domain types.
//!
//! A [`CipherKey`] names an immutable bijection over the alphabet. The forward
//! direction is held as a fixed-size [`SubstitutionMap`] keyed by alphabet
//! index, so bijectivity is checked structurally at construction instead of by
//! convention. The decode direction is the derived, never-persisted
//! [`InverseMap`].

use crate::alphabet::{ALPHABET, ALPHABET_LEN, alphabet_index};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// Validation failures for key material.
#[cmesh_derive::cmesh_error]
pub enum KeyError {
    /// The identifier does not match the `KEY-` + 4 decimal digits form.
    #[error("Invalid key id{}: {message}", format_context(.context))]
    InvalidId { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The forward map is not a permutation of the alphabet.
    #[error("Map is not a bijection{}: {message}", format_context(.context))]
    NotBijective { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// A unique, human-shareable key identifier: `KEY-` followed by exactly four
/// decimal digits.
///
/// Input is trimmed and uppercased before validation, mirroring how ids are
/// typed into a join prompt. A well-formed id is not necessarily a *known* id;
/// existence is the registry's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyId(String);

impl KeyId {
    pub const PREFIX: &'static str = "KEY-";
    const DIGITS: usize = 4;

    /// Parses and normalizes a key id.
    ///
    /// # Errors
    /// Returns [`KeyError::InvalidId`] when the input does not match the
    /// `KEY-####` pattern.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, KeyError> {
        let candidate = input.as_ref().trim().to_ascii_uppercase();

        let well_formed = candidate
            .strip_prefix(Self::PREFIX)
            .is_some_and(|d| d.len() == Self::DIGITS && d.bytes().all(|b| b.is_ascii_digit()));

        if well_formed {
            Ok(Self(candidate))
        } else {
            Err(KeyError::InvalidId {
                message: format!("'{}' does not match {}####", candidate, Self::PREFIX).into(),
                context: None,
            })
        }
    }

    /// Builds an id from its numeric part.
    ///
    /// # Errors
    /// Returns [`KeyError::InvalidId`] when `number` exceeds four digits.
    pub fn from_number(number: u16) -> Result<Self, KeyError> {
        if number > 9999 {
            return Err(KeyError::InvalidId {
                message: format!("{number} exceeds the 4-digit id space").into(),
                context: None,
            });
        }
        Ok(Self(format!("{}{number:04}", Self::PREFIX)))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KeyId {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, KeyError> {
        Self::parse(value)
    }
}

impl From<KeyId> for String {
    fn from(id: KeyId) -> Self {
        id.0
    }
}

impl AsRef<str> for KeyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The forward (encode) direction of a key: position `i` holds the symbol the
/// `i`-th alphabet symbol substitutes to.
///
/// Serialized on the wire as a `symbol -> symbol` map (the Data Store
/// `cipher_map` shape); deserialization re-validates bijectivity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<char, char>", into = "BTreeMap<char, char>")]
pub struct SubstitutionMap([char; ALPHABET_LEN]);

impl SubstitutionMap {
    /// Validates that `outputs` is a permutation of the alphabet.
    ///
    /// The check is structural: the sorted output array must equal the sorted
    /// alphabet, which simultaneously rejects out-of-domain symbols and
    /// duplicates (an ambiguous inverse would break decode).
    ///
    /// # Errors
    /// Returns [`KeyError::NotBijective`] for any non-permutation.
    pub fn new(outputs: [char; ALPHABET_LEN]) -> Result<Self, KeyError> {
        let mut sorted = outputs;
        sorted.sort_unstable();
        let mut canon = *ALPHABET;
        canon.sort_unstable();

        if sorted == canon {
            Ok(Self(outputs))
        } else {
            Err(KeyError::NotBijective {
                message: "output symbols must cover the alphabet exactly once".into(),
                context: None,
            })
        }
    }

    /// Forward substitution for a single symbol; `None` outside the alphabet.
    #[must_use]
    pub fn forward(&self, c: char) -> Option<char> {
        alphabet_index(c).map(|i| self.0[i])
    }

    /// Derives the decode-direction map by reversing every pair.
    #[must_use]
    pub fn invert(&self) -> InverseMap {
        let mut reversed = *ALPHABET;
        for (i, &mapped) in self.0.iter().enumerate() {
            // Index is always present: construction guarantees alphabet membership.
            if let Some(slot) = alphabet_index(mapped) {
                reversed[slot] = ALPHABET[i];
            }
        }
        InverseMap(reversed)
    }

    /// Iterates `(plain, substituted)` pairs in canonical alphabet order.
    pub fn entries(&self) -> impl Iterator<Item = (char, char)> + '_ {
        ALPHABET.iter().copied().zip(self.0.iter().copied())
    }
}

impl TryFrom<BTreeMap<char, char>> for SubstitutionMap {
    type Error = KeyError;

    fn try_from(wire: BTreeMap<char, char>) -> Result<Self, KeyError> {
        if wire.len() != ALPHABET_LEN {
            return Err(KeyError::NotBijective {
                message: format!("expected {ALPHABET_LEN} entries, got {}", wire.len()).into(),
                context: None,
            });
        }

        let mut outputs = *ALPHABET;
        for (symbol, substituted) in wire {
            let Some(i) = alphabet_index(symbol) else {
                return Err(KeyError::NotBijective {
                    message: format!("'{symbol}' is not an alphabet symbol").into(),
                    context: None,
                });
            };
            outputs[i] = substituted;
        }

        Self::new(outputs)
    }
}

impl From<SubstitutionMap> for BTreeMap<char, char> {
    fn from(map: SubstitutionMap) -> Self {
        map.entries().collect()
    }
}

/// The derived decode-direction map: position `i` holds the plaintext symbol
/// that the `i`-th alphabet symbol decodes back to.
///
/// Never persisted; recompute via [`SubstitutionMap::invert`] whenever the
/// source key changes identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InverseMap([char; ALPHABET_LEN]);

impl InverseMap {
    /// Reverse substitution for a single symbol; `None` outside the alphabet.
    #[must_use]
    pub fn backward(&self, c: char) -> Option<char> {
        alphabet_index(c).map(|i| self.0[i])
    }
}

/// A named, immutable substitution over the alphabet.
///
/// Keys are only ever created, looked up, or orphaned — never edited in
/// place. Every encoded payload references the key that produced it by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherKey {
    pub id: KeyId,
    pub map: SubstitutionMap,
}

impl CipherKey {
    #[must_use]
    pub fn new(id: KeyId, map: SubstitutionMap) -> Self {
        Self { id, map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotated(offset: usize) -> [char; ALPHABET_LEN] {
        let mut outputs = *ALPHABET;
        outputs.rotate_left(offset);
        outputs
    }

    #[test]
    fn key_id_accepts_canonical_and_sloppy_input() {
        assert_eq!(KeyId::parse("KEY-1234").unwrap().as_str(), "KEY-1234");
        assert_eq!(KeyId::parse("  key-0042 ").unwrap().as_str(), "KEY-0042");
    }

    #[test]
    fn key_id_rejects_malformed_input() {
        for bad in ["KEY-12", "KEY-12345", "KEY-12a4", "1234", "KEY1234", ""] {
            assert!(matches!(KeyId::parse(bad), Err(KeyError::InvalidId { .. })), "{bad}");
        }
    }

    #[test]
    fn key_id_from_number_pads_to_four_digits() {
        assert_eq!(KeyId::from_number(7).unwrap().as_str(), "KEY-0007");
        assert!(KeyId::from_number(10_000).is_err());
    }

    #[test]
    fn permutations_are_accepted() {
        let map = SubstitutionMap::new(rotated(5)).unwrap();
        assert_eq!(map.forward('a'), Some('f'));
    }

    #[test]
    fn duplicate_outputs_are_rejected() {
        let mut outputs = *ALPHABET;
        outputs[1] = 'a'; // 'a' now appears twice, 'b' never
        assert!(matches!(
            SubstitutionMap::new(outputs),
            Err(KeyError::NotBijective { .. })
        ));
    }

    #[test]
    fn out_of_domain_outputs_are_rejected() {
        let mut outputs = *ALPHABET;
        outputs[0] = 'A';
        assert!(SubstitutionMap::new(outputs).is_err());
    }

    #[test]
    fn inverse_reverses_every_pair() {
        let map = SubstitutionMap::new(rotated(13)).unwrap();
        let inverse = map.invert();
        for (plain, substituted) in map.entries() {
            assert_eq!(inverse.backward(substituted), Some(plain));
        }
    }

    #[test]
    fn wire_map_round_trip() {
        let map = SubstitutionMap::new(rotated(7)).unwrap();
        let json = serde_json::to_string(&map).unwrap();
        let back: SubstitutionMap = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }

    #[test]
    fn wire_map_with_duplicate_values_fails_validation() {
        let mut wire: BTreeMap<char, char> =
            SubstitutionMap::new(rotated(1)).unwrap().into();
        wire.insert('a', 'z');
        wire.insert('b', 'z');
        let json = serde_json::to_string(&wire).unwrap();
        assert!(serde_json::from_str::<SubstitutionMap>(&json).is_err());
    }

    #[test]
    fn wire_map_missing_entries_fails_validation() {
        let mut wire: BTreeMap<char, char> =
            SubstitutionMap::new(rotated(1)).unwrap().into();
        wire.remove(&'q');
        let json = serde_json::to_string(&wire).unwrap();
        assert!(serde_json::from_str::<SubstitutionMap>(&json).is_err());
    }
}
