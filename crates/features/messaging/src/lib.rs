//! # Messaging
//!
//! Encode-then-store composition and per-key display resolution.
//!
//! Content is encoded client-side with the session's active protocol before
//! it ever reaches the Data Store, and decoded client-side at read time. The
//! reader resolves each row's `key_id` against the session's own active key
//! first, then — for admin sessions — against the bulk key cache, and
//! otherwise leaves the row in its encoded form.
//!
//! The [`MessageFeed`] mirrors the store into the process by polling; there
//! is no push channel, so feed freshness is bounded by the poll interval.

mod composer;
mod error;
mod feed;
mod reader;

pub use crate::composer::MessageComposer;
pub use crate::error::{MessagingError, MessagingErrorExt};
pub use crate::feed::{MessageFeed, MessagesFetched};
pub use crate::reader::{MessageReader, Resolved};
