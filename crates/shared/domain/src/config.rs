use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level core configuration shared across subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoreConfigInner {
    pub registry: RegistryConfig,
    pub storage: StorageConfig,
    pub sync: SyncConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct CoreConfig {
    #[serde(flatten, default)]
    inner: Arc<CoreConfigInner>,
}

impl Deref for CoreConfig {
    type Target = CoreConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for CoreConfig {
    fn deref_mut(&mut self) -> &mut CoreConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// `SurrealDB` connection configuration for the key registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<RegistryCredentials>,
    /// Per-call deadline; an elapsed deadline is a transient failure.
    pub timeout_secs: u64,
}

/// Root credentials (optional when using unauthenticated engines like mem://).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

/// Local durable storage root (the per-session snapshot area).
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Polling cadence for store-backed state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Message feed poll interval.
    pub message_poll_secs: u64,
    /// Admin key-cache refresh interval.
    pub key_poll_secs: u64,
    /// Key-cache entry lifetime. Kept above the poll interval so a single
    /// failed refresh degrades to stale reads instead of an empty cache.
    pub key_cache_ttl_secs: u64,
}

// --- Default ---

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "mem://".to_owned(),
            namespace: "cmesh".to_owned(),
            database: "core".to_owned(),
            credentials: Some(RegistryCredentials::default()),
            timeout_secs: 5,
        }
    }
}

impl Default for RegistryCredentials {
    fn default() -> Self {
        Self { username: "root".to_owned(), password: "root".to_owned() }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: PathBuf::from(".") }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { message_poll_secs: 3, key_poll_secs: 10, key_cache_ttl_secs: 30 }
    }
}
