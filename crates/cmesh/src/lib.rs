//! Facade crate for `CipherMesh` features and shared modules.
//! Re-exports domain/kernel primitives and composes the core subsystems.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Load a [`CoreConfig`](cmesh_domain::config::CoreConfig) (see `cmesh_kernel::config::load_config`).
//! - Call [`Core::init`] to bring up the registry, local storage, and event bus.
//! - Derive per-session handles via [`Core::session`] and the feature crates.

pub use cmesh_cipher as cipher;
pub use cmesh_domain as domain;
pub use cmesh_events as events;
pub use cmesh_kernel as kernel;
pub use cmesh_logger as logger;
pub use cmesh_messaging as messaging;
pub use cmesh_protocol as protocol;
pub use cmesh_registry as registry;
pub use cmesh_storage as storage;

use cmesh_domain::config::CoreConfig;
use cmesh_events::EventBus;
use cmesh_messaging::MessageFeed;
use cmesh_protocol::{ProtocolError, ProtocolManager};
use cmesh_registry::{KeyCache, Registry};
use cmesh_storage::Storage;
use std::time::Duration;
use tracing::info;

/// Feature registry for runtime introspection.
pub mod features {
    /// Build-time enabled features.
    pub const ENABLED: &[&str] = &["cipher", "protocol", "messaging"];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// The composed core: one registry connection, one local storage root, and
/// one event bus, shared by every session handle derived from it.
#[derive(Debug, Clone)]
pub struct Core {
    pub registry: Registry,
    pub storage: Storage,
    pub events: EventBus,
    config: CoreConfig,
}

impl Core {
    /// Brings up the core subsystems from configuration.
    ///
    /// # Errors
    /// Returns an error if the registry connection or the storage root fails
    /// to initialize.
    pub async fn init(config: &CoreConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::from_config(&config.registry).await?;
        let storage =
            Storage::builder().root(&config.storage.data_dir).connect().await?;
        let events = EventBus::new();

        info!(features = ?features::ENABLED, "Core initialized");
        Ok(Self { registry, storage, events, config: config.clone() })
    }

    /// A protocol manager scoped to one session user.
    ///
    /// # Errors
    /// Propagates [`ProtocolManager`] builder validation.
    pub fn session(&self, user: impl Into<String>) -> Result<ProtocolManager, ProtocolError> {
        ProtocolManager::builder()
            .session(user)
            .storage(self.storage.clone())
            .registry(self.registry.clone())
            .events(self.events.clone())
            .build()
    }

    /// The admin key cache, sized from the sync configuration.
    ///
    /// Construct this for admin sessions only; pair it with
    /// [`KeyCache::spawn_refresher`] at the configured poll interval.
    #[must_use]
    pub fn admin_cache(&self) -> KeyCache {
        KeyCache::new(
            self.registry.clone(),
            Duration::from_secs(self.config.sync.key_cache_ttl_secs),
        )
    }

    /// The poll interval for the admin key cache.
    #[must_use]
    pub fn key_poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.sync.key_poll_secs)
    }

    /// A message feed bound to this core's registry and bus.
    #[must_use]
    pub fn message_feed(&self) -> MessageFeed {
        MessageFeed::new(self.registry.clone(), self.events.clone())
    }

    /// The poll interval for the message feed.
    #[must_use]
    pub fn message_poll_interval(&self) -> Duration {
        Duration::from_secs(self.config.sync.message_poll_secs)
    }
}
