//! The admin key cache.
//!
//! Admins decode traffic encrypted under *any* known key, not just their own
//! active one. This cache maps every known key id to its derived inverse map,
//! refreshed by polling [`Registry::list_all`] — there is no push channel, so
//! staleness is bounded by the poll interval and accepted.
//!
//! The cache is an explicit, injectable object: construct it for admin
//! sessions only, refresh it on your own schedule or via
//! [`KeyCache::spawn_refresher`].

use crate::Registry;
use crate::error::RegistryError;
use cmesh_domain::key::{CipherKey, InverseMap, KeyId};
use cmesh_events::EventBus;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Upper bound on cached keys; the 4-digit id space cannot exceed it.
const MAX_CACHE_CAPACITY: u64 = 10_000;

/// Published on the bus after every successful background refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCacheRefreshed {
    pub keys: usize,
}

/// A TTL-bounded `key id -> inverse map` cache over the full registry.
///
/// Entries outlive one missed refresh (the TTL should be a small multiple of
/// the poll interval), so a transient backend failure degrades to stale reads
/// instead of an empty cache. A prolonged outage ages entries out, after
/// which affected traffic renders in its still-encoded form.
#[derive(Debug, Clone)]
pub struct KeyCache {
    registry: Registry,
    entries: Cache<KeyId, Arc<InverseMap>>,
}

impl KeyCache {
    /// Creates a cache bound to `registry` with the given entry TTL.
    #[must_use]
    pub fn new(registry: Registry, ttl: Duration) -> Self {
        let entries =
            Cache::builder().max_capacity(MAX_CACHE_CAPACITY).time_to_live(ttl).build();
        Self { registry, entries }
    }

    /// Bulk-fetches every known key and repopulates the cache.
    ///
    /// Returns the number of keys now cached. On failure the existing entries
    /// are left untouched and keep serving until their TTL expires.
    ///
    /// # Errors
    /// Propagates [`Registry::list_all`] failures (`Unavailable`, `Query`).
    pub async fn refresh(&self) -> Result<usize, RegistryError> {
        let keys = self.registry.list_all().await?;
        let count = keys.len();

        for key in keys {
            self.insert(&key);
        }

        debug!(keys = count, "Key cache refreshed");
        Ok(count)
    }

    /// Caches a single key immediately (e.g. one just created locally),
    /// without waiting for the next poll.
    pub fn insert(&self, key: &CipherKey) {
        self.entries.insert(key.id.clone(), Arc::new(key.map.invert()));
    }

    /// The inverse map for `id`, if the cache currently knows it.
    ///
    /// A miss is not an error: the key may have been created after the last
    /// refresh (bounded staleness) or may not exist at all.
    #[must_use]
    pub fn inverse_for(&self, id: &KeyId) -> Option<Arc<InverseMap>> {
        self.entries.get(id)
    }

    /// Spawns the periodic refresh task.
    ///
    /// The first refresh runs immediately, then every `interval`. Each
    /// successful pass publishes [`KeyCacheRefreshed`] on `bus` (when given);
    /// failures log a warning and keep the previous entries.
    #[must_use]
    pub fn spawn_refresher(&self, interval: Duration, bus: Option<EventBus>) -> JoinHandle<()> {
        let cache = self.clone();
        info!(?interval, "Starting key cache refresher");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match cache.refresh().await {
                    Ok(keys) => {
                        if let Some(bus) = &bus {
                            if let Err(e) = bus.publish(KeyCacheRefreshed { keys }) {
                                warn!(error = %e, "Failed to publish cache refresh event");
                            }
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "Key cache refresh failed; serving stale entries");
                    },
                }
            }
        })
    }
}
