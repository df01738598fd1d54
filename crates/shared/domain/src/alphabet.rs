//! The fixed symbol domain subject to substitution.
//!
//! The generator and the codec must agree on exactly this set and ordering;
//! a key minted against a different alphabet is undecodable.

/// Number of symbols eligible for substitution.
pub const ALPHABET_LEN: usize = 36;

// Canonical ordering: lowercase Latin letters first, then decimal digits.
pub const ALPHABET: &[char; ALPHABET_LEN] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z', '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
];

/// Position of `c` in the canonical alphabet ordering, or `None` for
/// symbols outside the substitution domain.
#[must_use]
pub const fn alphabet_index(c: char) -> Option<usize> {
    match c {
        'a'..='z' => Some(c as usize - 'a' as usize),
        '0'..='9' => Some(26 + c as usize - '0' as usize),
        _ => None,
    }
}

/// Whether `c` belongs to the substitution domain.
#[must_use]
pub const fn in_alphabet(c: char) -> bool {
    alphabet_index(c).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_over_the_whole_alphabet() {
        for (i, &c) in ALPHABET.iter().enumerate() {
            assert_eq!(alphabet_index(c), Some(i));
        }
    }

    #[test]
    fn symbols_outside_the_domain_have_no_index() {
        for c in ['A', 'Z', ' ', '!', 'é', '🔐'] {
            assert_eq!(alphabet_index(c), None);
            assert!(!in_alphabet(c));
        }
    }
}
