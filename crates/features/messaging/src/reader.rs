//! Per-key display resolution.

use cmesh_cipher::codec;
use cmesh_domain::message::EncodedMessage;
use cmesh_protocol::ProtocolManager;
use cmesh_registry::KeyCache;

/// Outcome of resolving a row for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// The row's key was available; `text` is the decoded content.
    Decoded { text: String },
    /// No key for this row is known to the session; the content is shown in
    /// its encoded form.
    StillEncoded { content: String },
}

impl Resolved {
    /// The displayable string either way.
    #[must_use]
    pub fn display_text(&self) -> &str {
        match self {
            Self::Decoded { text } => text,
            Self::StillEncoded { content } => content,
        }
    }

    #[must_use]
    pub const fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded { .. })
    }
}

/// Resolves stored rows back to plaintext.
///
/// Resolution order per row:
/// 1. the session's own active key, when its id matches the row;
/// 2. the admin key cache, when one is attached — each row decodes under its
///    *own* key, never under the admin's active protocol;
/// 3. otherwise the row stays encoded (bounded cache staleness or a foreign
///    protocol — both are expected states, not errors).
#[derive(Debug, Clone)]
pub struct MessageReader {
    manager: ProtocolManager,
    cache: Option<KeyCache>,
}

impl MessageReader {
    /// A reader for a regular session: own-key resolution only.
    #[must_use]
    pub fn new(manager: ProtocolManager) -> Self {
        Self { manager, cache: None }
    }

    /// A reader for an admin session, backed by the bulk key cache.
    #[must_use]
    pub fn with_cache(manager: ProtocolManager, cache: KeyCache) -> Self {
        Self { manager, cache: Some(cache) }
    }

    /// Resolves one row for display.
    #[must_use]
    pub fn resolve(&self, row: &EncodedMessage) -> Resolved {
        if let Some(key) = self.manager.active() {
            if key.id == row.key_id {
                return Resolved::Decoded { text: codec::decode(&row.content, &key) };
            }
        }

        if let Some(cache) = &self.cache {
            if let Some(inverse) = cache.inverse_for(&row.key_id) {
                return Resolved::Decoded { text: codec::decode_with(&row.content, &inverse) };
            }
        }

        Resolved::StillEncoded { content: row.content.clone() }
    }

    /// Resolves a batch in order.
    #[must_use]
    pub fn resolve_all(&self, rows: &[EncodedMessage]) -> Vec<Resolved> {
        rows.iter().map(|row| self.resolve(row)).collect()
    }
}
