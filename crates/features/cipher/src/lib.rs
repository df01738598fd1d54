//! # Cipher Engine
//!
//! This crate provides the substitution cipher at the heart of the platform:
//! minting new protocol keys and transforming content with them.
//!
//! ## Architecture
//!
//! The system is divided into two primary parts:
//!
//! 1.  **Codec ([`codec`]):** pure, total transforms between plaintext and the
//!     encoded form under a given key. Decoding derives the inverse map on the
//!     fly (or accepts a pre-derived one for bulk/admin paths).
//! 2.  **Generation ([`generator`]):** produces a uniformly random bijection
//!     over the alphabet together with a fresh `KEY-####` identifier, using
//!     the operating system CSPRNG.
//!
//! ## Behavioral contract
//!
//! * Symbols outside the alphabet pass through both directions unchanged, so
//!   encode/decode never fail and never change string length.
//! * The forward lookup is case-insensitive and the mapped symbol is emitted
//!   verbatim, so `encode("A") == encode("a")` and round trips come back
//!   lowercased. Only *decode* reapplies case, and only when the ciphertext
//!   itself carries an uppercase symbol. This asymmetry is load-bearing for
//!   interop with previously stored traffic; do not "fix" it.

pub mod codec;
mod error;
pub mod generator;
pub mod share;

pub use crate::error::{CipherError, CipherErrorExt};
pub use crate::share::KeyShare;
