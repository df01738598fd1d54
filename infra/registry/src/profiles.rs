//! Per-user profile pointers.
//!
//! The only profile field the core touches is `last_key_id`: the id of the
//! protocol the user most recently activated, used to restore their session
//! on a fresh login.

use crate::Registry;
use crate::error::{RegistryError, RegistryErrorExt};
use crate::keys::transport;
use cmesh_domain::key::KeyId;
use serde::Deserialize;
use tracing::{debug, instrument};

#[derive(Debug, Deserialize)]
struct ProfileRecord {
    last_key_id: Option<KeyId>,
}

impl Registry {
    /// Records the user's most recently activated key.
    ///
    /// Best-effort by convention: the caller activates locally first and
    /// treats a failure here as a warning, never a rollback.
    ///
    /// # Errors
    /// * [`RegistryError::Unavailable`] on transport failure or an elapsed deadline.
    /// * [`RegistryError::Query`] for engine-side failures.
    #[instrument(skip(self), fields(user = %user.as_ref(), key_id = %key_id))]
    pub async fn record_last_key(
        &self,
        user: impl AsRef<str>,
        key_id: &KeyId,
    ) -> Result<(), RegistryError> {
        let user = user.as_ref().to_owned();
        let key_id = key_id.clone();
        self.with_deadline("record last key", async move {
            self.query("UPSERT type::thing('profiles', $user) SET last_key_id = $key_id")
                .bind(("user", user))
                .bind(("key_id", key_id))
                .await
                .map_err(transport)?
                .check()
                .context("Recording last key")?;

            debug!("Profile pointer updated");
            Ok(())
        })
        .await
    }

    /// Returns the id of the key the user last activated, if any.
    ///
    /// # Errors
    /// * [`RegistryError::Unavailable`] on transport failure or an elapsed deadline.
    /// * [`RegistryError::Query`] for engine-side failures.
    #[instrument(skip(self), fields(user = %user.as_ref()))]
    pub async fn last_key(&self, user: impl AsRef<str>) -> Result<Option<KeyId>, RegistryError> {
        let user = user.as_ref().to_owned();
        self.with_deadline("read last key", async move {
            let mut response = self
                .query("SELECT last_key_id FROM type::thing('profiles', $user)")
                .bind(("user", user))
                .await
                .map_err(transport)?;

            let mut rows: Vec<ProfileRecord> =
                response.take(0).context("Decoding profile record")?;

            Ok(rows.pop().and_then(|row| row.last_key_id))
        })
        .await
    }
}
