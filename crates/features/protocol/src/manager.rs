//! The active-protocol state machine.

use crate::error::ProtocolError;
use cmesh_cipher::generator;
use cmesh_domain::key::{CipherKey, KeyId};
use cmesh_events::EventBus;
use cmesh_registry::{Registry, RegistryError};
use cmesh_storage::{NamespacedStorage, Storage, StorageError};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Snapshot file inside the session's storage namespace.
const SNAPSHOT_FILE: &str = "active_protocol.bin";

/// Upper bound on regeneration attempts after an id collision.
const MAX_CREATE_ATTEMPTS: u32 = 5;

/// Latest-value event: the session's active protocol changed.
///
/// `id` is `None` after a [`ProtocolManager::clear`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveProtocolChanged {
    pub id: Option<KeyId>,
}

#[derive(Debug)]
struct ProtocolManagerInner {
    session: String,
    active: RwLock<Option<CipherKey>>,
    store: NamespacedStorage,
    registry: Option<Registry>,
    events: EventBus,
}

/// Holds the caller's currently selected key, persists it across restarts,
/// and exposes the switch/join operations.
///
/// Single-caller, single-writer per-session state: the lock only guards
/// against concurrent readers on other tasks, not against multiple writers —
/// there is exactly one of those by construction.
#[derive(Debug, Clone)]
pub struct ProtocolManager {
    inner: Arc<ProtocolManagerInner>,
}

impl ProtocolManager {
    /// Returns a new [`ProtocolManagerBuilder`].
    #[must_use = "builders do nothing unless you call .build()"]
    pub fn builder() -> ProtocolManagerBuilder {
        ProtocolManagerBuilder::default()
    }

    /// The currently active key, if any.
    #[must_use]
    pub fn active(&self) -> Option<CipherKey> {
        self.inner.active.read().clone()
    }

    /// The id of the currently active key, if any.
    #[must_use]
    pub fn active_id(&self) -> Option<KeyId> {
        self.inner.active.read().as_ref().map(|key| key.id.clone())
    }

    /// Mints a new protocol, persists it, and activates it.
    ///
    /// The generator draws ids blindly from the 4-digit space; when the
    /// registry reports a collision the key is regenerated, up to
    /// `MAX_CREATE_ATTEMPTS` times.
    ///
    /// # Errors
    /// * [`ProtocolError::Internal`] when no registry is attached.
    /// * [`ProtocolError::Cipher`] on entropy failure.
    /// * [`ProtocolError::Registry`] when the store keeps rejecting or is
    ///   unreachable.
    #[instrument(skip(self), fields(session = %self.inner.session))]
    pub async fn create_protocol(&self) -> Result<CipherKey, ProtocolError> {
        let registry = self.registry()?;

        for attempt in 1..=MAX_CREATE_ATTEMPTS {
            let key = generator::generate()?;

            match registry.create(&key).await {
                Ok(()) => {
                    info!(key_id = %key.id, attempt, "Protocol created");
                    self.set_active(key.clone()).await?;
                    return Ok(key);
                },
                Err(RegistryError::DuplicateKeyId { .. }) if attempt < MAX_CREATE_ATTEMPTS => {
                    warn!(key_id = %key.id, attempt, "Key id collision, regenerating");
                },
                Err(e) => return Err(e.into()),
            }
        }

        Err(ProtocolError::Internal {
            message: "Exhausted id generation attempts".into(),
            context: Some("create protocol".into()),
        })
    }

    /// Joins an existing protocol by id and activates it.
    ///
    /// # Errors
    /// * [`ProtocolError::Registry`] wrapping `KeyNotFound` for an unknown id
    ///   ("protocol invalid", no retry) or `Unavailable` for transient
    ///   backend failures.
    #[instrument(skip(self), fields(session = %self.inner.session, key_id = %id))]
    pub async fn join_protocol(&self, id: &KeyId) -> Result<CipherKey, ProtocolError> {
        let key = self.registry()?.find_by_id(id).await?;
        info!(key_id = %key.id, "Protocol joined");
        self.set_active(key.clone()).await?;
        Ok(key)
    }

    /// Replaces the active key.
    ///
    /// The order is deliberate: memory, then the durable snapshot, then the
    /// change event, then — best-effort, off this call path — the remote
    /// profile pointer. A remote failure logs a warning and never rolls back
    /// the local activation.
    ///
    /// # Errors
    /// * [`ProtocolError::Snapshot`] / [`ProtocolError::Storage`] when the
    ///   local snapshot cannot be written.
    #[instrument(skip(self, key), fields(session = %self.inner.session, key_id = %key.id))]
    pub async fn set_active(&self, key: CipherKey) -> Result<(), ProtocolError> {
        *self.inner.active.write() = Some(key.clone());

        let bytes = postcard::to_stdvec(&key)?;
        self.inner.store.write(SNAPSHOT_FILE, &bytes).await?;
        debug!("Active protocol snapshot written");

        self.announce(Some(key.id.clone()));

        if let Some(registry) = &self.inner.registry {
            let registry = registry.clone();
            let session = self.inner.session.clone();
            let key_id = key.id.clone();
            tokio::spawn(async move {
                if let Err(e) = registry.record_last_key(&session, &key_id).await {
                    warn!(error = %e, key_id = %key_id, "Failed to record protocol remotely");
                }
            });
        }

        Ok(())
    }

    /// Restores the session's protocol after a restart.
    ///
    /// The local snapshot wins; without one, the remote profile pointer is
    /// consulted and the referenced key fetched. Returns `None` when neither
    /// side knows of a protocol.
    ///
    /// # Errors
    /// * [`ProtocolError::Snapshot`] when the local snapshot is corrupt.
    /// * [`ProtocolError::Registry`] on transient failures of the remote
    ///   fallback. An orphaned pointer (key since deleted) is treated as
    ///   "no protocol", not an error.
    #[instrument(skip(self), fields(session = %self.inner.session))]
    pub async fn resume(&self) -> Result<Option<CipherKey>, ProtocolError> {
        match self.inner.store.read(SNAPSHOT_FILE).await {
            Ok(bytes) => {
                let key: CipherKey = postcard::from_bytes(&bytes)?;
                info!(key_id = %key.id, "Protocol resumed from local snapshot");
                *self.inner.active.write() = Some(key.clone());
                self.announce(Some(key.id.clone()));
                return Ok(Some(key));
            },
            Err(StorageError::FileNotFound { .. }) => {},
            Err(e) => return Err(e.into()),
        }

        let Some(registry) = &self.inner.registry else {
            return Ok(None);
        };

        let Some(id) = registry.last_key(&self.inner.session).await? else {
            return Ok(None);
        };

        match registry.find_by_id(&id).await {
            Ok(key) => {
                info!(key_id = %key.id, "Protocol resumed from profile pointer");
                self.set_active(key.clone()).await?;
                Ok(Some(key))
            },
            Err(RegistryError::KeyNotFound { .. }) => {
                warn!(key_id = %id, "Profile points at a missing key; starting without protocol");
                Ok(None)
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Drops the active key on logout, from memory and from durable storage.
    ///
    /// The remote profile pointer is left in place: the next login may still
    /// resume from it, matching the observed session behavior.
    ///
    /// # Errors
    /// * [`ProtocolError::Storage`] when the snapshot exists but cannot be
    ///   removed. A missing snapshot is fine.
    #[instrument(skip(self), fields(session = %self.inner.session))]
    pub async fn clear(&self) -> Result<(), ProtocolError> {
        *self.inner.active.write() = None;

        match self.inner.store.delete(SNAPSHOT_FILE).await {
            Ok(()) | Err(StorageError::FileNotFound { .. }) => {},
            Err(e) => return Err(e.into()),
        }

        self.announce(None);
        info!("Protocol cleared");
        Ok(())
    }

    /// Publishes the latest-value change event; bus failures only warn.
    fn announce(&self, id: Option<KeyId>) {
        if let Err(e) = self.inner.events.publish_watch(ActiveProtocolChanged { id }) {
            warn!(error = %e, "Failed to publish protocol change");
        }
    }

    fn registry(&self) -> Result<&Registry, ProtocolError> {
        self.inner.registry.as_ref().ok_or_else(|| ProtocolError::Internal {
            message: "No registry attached to this session".into(),
            context: None,
        })
    }
}

/// Fluent builder for [`ProtocolManager`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ProtocolManagerBuilder {
    session: Option<String>,
    storage: Option<Storage>,
    registry: Option<Registry>,
    events: Option<EventBus>,
}

impl ProtocolManagerBuilder {
    /// The session identity (username); also names the storage namespace.
    pub fn session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// The local storage engine backing the durable snapshot.
    pub fn storage(mut self, storage: Storage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// The key registry for create/join/resume round trips. Optional: an
    /// offline manager still encodes and decodes with its cached key.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The event bus for [`ActiveProtocolChanged`] notifications.
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Validates the configuration and builds the manager.
    ///
    /// # Errors
    /// * [`ProtocolError::Internal`] when session or storage is missing.
    /// * [`ProtocolError::Storage`] when the session name is not a valid
    ///   storage namespace.
    pub fn build(self) -> Result<ProtocolManager, ProtocolError> {
        let session = self.session.ok_or(ProtocolError::Internal {
            message: "Session identity is required".into(),
            context: None,
        })?;
        let storage = self.storage.ok_or(ProtocolError::Internal {
            message: "Storage engine is required".into(),
            context: None,
        })?;

        let store = storage.namespace(session.as_str())?;

        Ok(ProtocolManager {
            inner: Arc::new(ProtocolManagerInner {
                session,
                active: RwLock::new(None),
                store,
                registry: self.registry,
                events: self.events.unwrap_or_default(),
            }),
        })
    }
}
