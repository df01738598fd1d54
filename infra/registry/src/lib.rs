//! # Key Registry Infrastructure
//!
//! This crate is the Data Store boundary of the platform: a unified interface
//! for initializing and talking to [SurrealDB](https://surrealdb.com), plus
//! the admin-side key cache used for cross-key decoding.
//!
//! ## Key Features
//! - **Engine Agnostic**: Supports `mem://`, `ws://`, and `http://` via the `any` engine.
//! - **Resilient Connectivity**: Built-in retry logic for health checks during engine startup.
//! - **Deadlines**: Every store round trip runs under a configurable timeout;
//!   an elapsed deadline is reported as the transient [`RegistryError::Unavailable`].
//! - **Builder Pattern**: Fluent API for configuring connections and authentication.
//!
//! ## Example
//!
//! ```rust
//! use cmesh_registry::{Registry, RegistryError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RegistryError> {
//!     let registry = Registry::builder()
//!         .url("mem://")
//!         .session("cmesh", "core")
//!         .init()
//!         .await?;
//!
//!     let _version = registry.version().await;
//!     Ok(())
//! }
//! ```

mod cache;
mod error;
mod keys;
mod messages;
mod migrations;
mod profiles;

pub use cache::{KeyCache, KeyCacheRefreshed};
pub use error::{RegistryError, RegistryErrorExt};

use cmesh_domain::config::RegistryConfig;
use migrations::apply_schema;
use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::{info, instrument, warn};

/// Inner state of the [`Registry`] wrapper.
#[derive(Debug)]
pub struct RegistryInner {
    instance: Surreal<Any>,
    ns: String,
    db: String,
    timeout: Duration,
}

impl Drop for RegistryInner {
    fn drop(&mut self) {
        info!(ns = %self.ns, db = %self.db, "Registry session handle dropped");
    }
}

/// `SurrealDB` client wrapper that provides thread-safety and contextual error handling.
#[derive(Debug, Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    /// Creates a new [`RegistryBuilder`].
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Builds a registry from a [`RegistryConfig`] section.
    ///
    /// # Errors
    /// Propagates every failure class of [`RegistryBuilder::init`].
    pub async fn from_config(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let mut builder = Self::builder()
            .url(&config.url)
            .session(&config.namespace, &config.database)
            .timeout(Duration::from_secs(config.timeout_secs));

        if let Some(credentials) = &config.credentials {
            builder = builder.auth(&credentials.username, &credentials.password);
        }

        builder.init().await
    }

    /// Runs a store round trip under the configured deadline.
    ///
    /// The elapsed deadline maps to [`RegistryError::Unavailable`] so callers
    /// can treat slow backends the same way as unreachable ones.
    pub(crate) async fn with_deadline<T, F>(
        &self,
        what: &'static str,
        fut: F,
    ) -> Result<T, RegistryError>
    where
        F: Future<Output = Result<T, RegistryError>>,
    {
        match tokio::time::timeout(self.inner.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation = what, timeout = ?self.inner.timeout, "Registry deadline elapsed");
                Err(RegistryError::Unavailable {
                    message: what.into(),
                    context: Some("Deadline elapsed".into()),
                })
            },
        }
    }
}

impl Deref for Registry {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner.instance
    }
}

/// A fluent builder for configuring and establishing a `SurrealDB` connection.
///
/// This builder ensures that fundamental parameters like the connection URL,
/// namespace, and database name are provided upfront.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    url: Option<String>,
    ns: Option<String>,
    db: Option<String>,
    auth: Option<(String, String)>,
    timeout: Option<Duration>,
}

impl RegistryBuilder {
    /// Creates a new [`RegistryBuilder`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the connection URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the namespace and database name.
    pub fn session(mut self, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        self.ns = Some(namespace.into());
        self.db = Some(database.into());
        self
    }

    /// Add root credentials to the connection.
    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// Sets the per-call deadline for store round trips.
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Consumes the builder and attempts to establish a connection to the database.
    ///
    /// This method executes the full connection lifecycle, including engine initialization,
    /// health check retries with exponential backoff, authentication, and session activation.
    ///
    /// # Process
    /// 1. **Validation**: Ensures URL, Namespace, and Database name are provided.
    /// 2. **Engine Initialization**: Connects to the underlying `SurrealDB` engine (Any).
    /// 3. **Resilience**: Performs up to 3 health checks. If the first check fails,
    ///    it retries with exponential backoff (starting at 500ms).
    /// 4. **Authentication**: If credentials were provided via [`auth`](Self::auth),
    ///    signs in as a Root user.
    /// 5. **Session Activation**: Sets the global namespace and database for the connection.
    /// 6. **Schema**: Applies the idempotent table/index definitions.
    ///
    /// # Errors
    /// * [`RegistryError::Validation`] if required parameters are missing.
    /// * [`RegistryError::Connection`] if the engine fails to start or remains unhealthy.
    /// * [`RegistryError::Auth`] if the provided credentials are rejected.
    /// * [`RegistryError::Query`] if the session activation or schema application fails.
    #[instrument(skip(self), fields(url = self.url, ns = self.ns, db = self.db))]
    pub async fn init(self) -> Result<Registry, RegistryError> {
        let url = self.url.ok_or(RegistryError::Validation {
            message: "URL is required".into(),
            context: None,
        })?;
        let ns = self.ns.ok_or(RegistryError::Validation {
            message: "Namespace is required".into(),
            context: None,
        })?;
        let db = self.db.ok_or(RegistryError::Validation {
            message: "Database is required".into(),
            context: None,
        })?;
        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));

        let instance = connect(&url).await.map_err(|e| RegistryError::Connection {
            message: e.to_string().into(),
            context: Some("Initializing engine".into()),
        })?;

        // 1. Connectivity & Health Check with Retries
        let mut delay = Duration::from_millis(500);
        for attempt in 1..=3 {
            if instance.health().await.is_ok() {
                break;
            }
            if attempt == 3 {
                return Err(RegistryError::Connection {
                    message: "Unhealthy after retries".into(),
                    context: Some(url.into()),
                });
            }
            warn!(attempt, ?delay, "Registry not ready, retrying...");
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        // 2. Authentication
        if let Some((u, p)) = self.auth {
            instance.signin(Root { username: u, password: p }).await.map_err(|e| {
                RegistryError::Auth { message: e.to_string().into(), context: Some(url.into()) }
            })?;
        }

        // 3. Session Initialization
        instance.use_ns(&ns).use_db(&db).await.context("Activating session")?;

        let version =
            instance.version().await.map_or_else(|_| "unknown".to_owned(), |v| v.to_string());
        info!(namespace = %ns, database = %db, %version, "Registry connection established");

        apply_schema(&instance).await?;
        info!("Registry schema applied");

        Ok(Registry { inner: Arc::new(RegistryInner { instance, ns, db, timeout }) })
    }
}
