//! Key record operations.
//!
//! One row per protocol in `encryption_keys`, with the key id doubling as the
//! record id. Keys are immutable once created: the store only ever inserts,
//! looks up, or bulk-lists them.

use crate::Registry;
use crate::error::{RegistryError, RegistryErrorExt};
use cmesh_domain::key::{CipherKey, KeyId, SubstitutionMap};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Wire shape of a key row (the `id` record pointer is never selected).
#[derive(Debug, Serialize, Deserialize)]
struct KeyRecord {
    key_id: KeyId,
    cipher_map: SubstitutionMap,
}

impl From<KeyRecord> for CipherKey {
    fn from(record: KeyRecord) -> Self {
        Self::new(record.key_id, record.cipher_map)
    }
}

impl Registry {
    /// Persists a freshly generated key.
    ///
    /// The record is created under its own id, so a second create of the same
    /// id fails inside the engine and surfaces as
    /// [`RegistryError::DuplicateKeyId`] — the caller's cue to regenerate.
    ///
    /// # Errors
    /// * [`RegistryError::DuplicateKeyId`] when the id is already taken.
    /// * [`RegistryError::Unavailable`] on transport failure or an elapsed deadline.
    /// * [`RegistryError::Query`] for any other engine-side failure.
    #[instrument(skip(self, key), fields(key_id = %key.id))]
    pub async fn create(&self, key: &CipherKey) -> Result<(), RegistryError> {
        let key = key.clone();
        self.with_deadline("create key", async move {
            let response = self
                .query(
                    "CREATE type::thing('encryption_keys', $key_id) \
                     CONTENT { key_id: $key_id, cipher_map: $cipher_map }",
                )
                .bind(("key_id", key.id.clone()))
                .bind(("cipher_map", key.map.clone()))
                .await
                .map_err(transport)?;

            match response.check() {
                Ok(_) => {
                    debug!("Key record created");
                    Ok(())
                },
                Err(e) if e.to_string().contains("already exists") => {
                    Err(RegistryError::DuplicateKeyId {
                        message: key.id.to_string().into(),
                        context: None,
                    })
                },
                Err(e) => Err(RegistryError::from(e)),
            }
        })
        .await
    }

    /// Looks a key up by id (the "join protocol" path).
    ///
    /// # Errors
    /// * [`RegistryError::KeyNotFound`] for a well-formed id with no record —
    ///   surfaced to the user as "protocol invalid", no retry.
    /// * [`RegistryError::Unavailable`] on transport failure or an elapsed deadline.
    #[instrument(skip(self), fields(key_id = %id))]
    pub async fn find_by_id(&self, id: &KeyId) -> Result<CipherKey, RegistryError> {
        let id = id.clone();
        self.with_deadline("find key", async move {
            let mut response = self
                .query(
                    "SELECT key_id, cipher_map FROM type::thing('encryption_keys', $key_id)",
                )
                .bind(("key_id", id.clone()))
                .await
                .map_err(transport)?;

            let mut rows: Vec<KeyRecord> =
                response.take(0).context("Decoding key record")?;

            rows.pop().map(CipherKey::from).ok_or_else(|| RegistryError::KeyNotFound {
                message: id.to_string().into(),
                context: None,
            })
        })
        .await
    }

    /// Bulk-fetches every known key.
    ///
    /// Admin-only by policy: this feeds the cross-key decode cache. Access
    /// control lives in the service layer above this crate.
    ///
    /// # Errors
    /// * [`RegistryError::Unavailable`] on transport failure or an elapsed deadline.
    /// * [`RegistryError::Query`] for engine-side failures.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<CipherKey>, RegistryError> {
        self.with_deadline("list keys", async move {
            let mut response = self
                .query("SELECT key_id, cipher_map FROM encryption_keys")
                .await
                .map_err(transport)?;

            let rows: Vec<KeyRecord> = response.take(0).context("Decoding key records")?;
            debug!(count = rows.len(), "Fetched key records");
            Ok(rows.into_iter().map(CipherKey::from).collect())
        })
        .await
    }
}

/// Transport-level failures are the transient class.
pub(crate) fn transport(e: surrealdb::Error) -> RegistryError {
    RegistryError::Unavailable { message: e.to_string().into(), context: None }
}
