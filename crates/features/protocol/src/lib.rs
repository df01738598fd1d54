//! # Active Protocol Management
//!
//! A "protocol" is the cipher key a session composes new content with. This
//! crate owns its lifecycle on the client side:
//!
//! * **create** — mint a key, persist it in the registry (with a bounded
//!   retry on id collision), and activate it;
//! * **join** — resolve a shared `KEY-####` id through the registry and
//!   activate the result;
//! * **resume** — restore the previous session's protocol from the local
//!   snapshot, falling back to the remote profile pointer;
//! * **clear** — drop the protocol on logout.
//!
//! Activation always lands locally first; mirroring the choice onto the
//! user's profile in the Data Store is best-effort and never rolls back a
//! local activation.

mod error;
mod manager;

pub use crate::error::{ProtocolError, ProtocolErrorExt};
pub use crate::manager::{ActiveProtocolChanged, ProtocolManager, ProtocolManagerBuilder};
