//! Encode-then-store composition.

use crate::error::MessagingError;
use chrono::Utc;
use cmesh_cipher::codec;
use cmesh_domain::message::EncodedMessage;
use cmesh_protocol::ProtocolManager;
use cmesh_registry::Registry;
use tracing::{debug, instrument};

/// Composes outgoing messages under the session's active protocol.
///
/// Plaintext never leaves this type: the content is encoded before the row is
/// handed to the registry.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    manager: ProtocolManager,
    registry: Registry,
    author: String,
}

impl MessageComposer {
    #[must_use]
    pub fn new(manager: ProtocolManager, registry: Registry, author: impl Into<String>) -> Self {
        Self { manager, registry, author: author.into() }
    }

    /// Encodes `text` with the active key and appends it to the store.
    ///
    /// Returns the stored row (with its encoded content) so callers can
    /// render it optimistically without waiting for the next poll.
    ///
    /// # Errors
    /// * [`MessagingError::EmptyMessage`] for blank input (checked before
    ///   encoding).
    /// * [`MessagingError::NoActiveProtocol`] when the session has no key.
    /// * [`MessagingError::Registry`] when the store rejects the row.
    #[instrument(skip(self, text), fields(author = %self.author))]
    pub async fn compose(&self, text: &str) -> Result<EncodedMessage, MessagingError> {
        self.compose_inner(text, None).await
    }

    /// Like [`compose`](Self::compose), threading a reference to the parent row.
    ///
    /// # Errors
    /// Same failure classes as [`compose`](Self::compose).
    #[instrument(skip(self, text), fields(author = %self.author, reply_to = %reply_to))]
    pub async fn compose_reply(
        &self,
        text: &str,
        reply_to: &str,
    ) -> Result<EncodedMessage, MessagingError> {
        self.compose_inner(text, Some(reply_to.to_owned())).await
    }

    async fn compose_inner(
        &self,
        text: &str,
        reply_to: Option<String>,
    ) -> Result<EncodedMessage, MessagingError> {
        if text.trim().is_empty() {
            return Err(MessagingError::EmptyMessage {
                message: "nothing to send".into(),
                context: None,
            });
        }

        let key = self.manager.active().ok_or(MessagingError::NoActiveProtocol {
            message: "select or create a protocol first".into(),
            context: None,
        })?;

        let row = EncodedMessage {
            content: codec::encode(text, &key),
            key_id: key.id.clone(),
            author: self.author.clone(),
            reply_to,
            created_at: Utc::now(),
        };

        self.registry.insert_message(&row).await?;
        debug!(key_id = %row.key_id, "Message composed and stored");
        Ok(row)
    }
}
