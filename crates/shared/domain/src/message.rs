//! Encoded message rows exchanged with the Data Store.

use crate::key::KeyId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message or post as it travels to and from the store.
///
/// `content` is already encoded when a row is built; decoding always happens
/// client-side at read time by resolving `key_id` against the reader's own
/// active key or, for admins, the bulk key cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedMessage {
    /// Encoded payload. Never plaintext.
    pub content: String,
    /// The key the payload was encoded under.
    pub key_id: KeyId,
    /// Display name of the sender.
    pub author: String,
    /// Optional reference to a parent message.
    #[serde(default)]
    pub reply_to: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyId;

    #[test]
    fn row_round_trips_through_json() {
        let row = EncodedMessage {
            content: "73 xyz!".to_owned(),
            key_id: KeyId::parse("KEY-1234").unwrap(),
            author: "amjad".to_owned(),
            reply_to: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&row).unwrap();
        let back: EncodedMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(row, back);
    }
}
