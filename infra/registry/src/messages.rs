//! Message row operations.
//!
//! Rows arrive already encoded; this module only moves them. Decoding is the
//! reader's job, with the key resolved per row from its `key_id`.

use crate::Registry;
use crate::error::{RegistryError, RegistryErrorExt};
use crate::keys::transport;
use cmesh_domain::message::EncodedMessage;
use tracing::{debug, instrument};

impl Registry {
    /// Appends an encoded message row.
    ///
    /// # Errors
    /// * [`RegistryError::Unavailable`] on transport failure or an elapsed deadline.
    /// * [`RegistryError::Query`] for engine-side failures.
    #[instrument(skip(self, message), fields(key_id = %message.key_id, author = %message.author))]
    pub async fn insert_message(&self, message: &EncodedMessage) -> Result<(), RegistryError> {
        let message = message.clone();
        self.with_deadline("insert message", async move {
            self.query("CREATE messages CONTENT $message")
                .bind(("message", message))
                .await
                .map_err(transport)?
                .check()
                .context("Inserting message")?;

            debug!("Message row inserted");
            Ok(())
        })
        .await
    }

    /// Returns the newest `limit` messages in ascending chronological order.
    ///
    /// The store is queried newest-first and the page is reversed locally, so
    /// a feed can render top-to-bottom without a second sort.
    ///
    /// # Errors
    /// * [`RegistryError::Unavailable`] on transport failure or an elapsed deadline.
    /// * [`RegistryError::Query`] for engine-side failures.
    #[instrument(skip(self))]
    pub async fn recent_messages(&self, limit: usize) -> Result<Vec<EncodedMessage>, RegistryError> {
        self.with_deadline("list messages", async move {
            let mut response = self
                .query(
                    "SELECT content, key_id, author, reply_to, created_at FROM messages \
                     ORDER BY created_at DESC LIMIT $limit",
                )
                .bind(("limit", limit as i64))
                .await
                .map_err(transport)?;

            let mut rows: Vec<EncodedMessage> =
                response.take(0).context("Decoding message rows")?;

            rows.reverse();
            debug!(count = rows.len(), "Fetched message rows");
            Ok(rows)
        })
        .await
    }
}
