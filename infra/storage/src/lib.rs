//! A sandboxed local storage engine.
//! It provides a secure abstraction over the filesystem for durable per-session
//! state (snapshots that must survive process restarts), with built-in
//! protections against common I/O pitfalls.
//!
//! # Core Features
//!
//! - **Sandbox Security**: Strict path traversal protection using physical path canonicalization.
//! - **Atomic Writes**: Uses an "atomic swap" pattern (unique temp write + `fsync` + `rename`) to prevent data corruption during crashes.
//! - **Transparent Compression**: Integrated LZ4 block compression that is invisible to the consumer.
//! - **Namespacing**: Logical data partitioning (e.g., one namespace per session user).
//! - **Self-Healing**: Automatically identifies and cleans up orphaned temporary files during initialization.
//!
//! # Examples
//!
//! ```rust
//! use cmesh_storage::{Storage, Compression, StorageError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     // Use a temp directory for examples/tests
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let root = tmp.path().join("data");
//!     let storage = Storage::builder()
//!         .root(&root)
//!         .create(true)
//!         .compression(Compression::Lz4)
//!         .connect()
//!         .await?;
//!
//!     // Write data atomically
//!     storage.write("snapshot.bin", b"important data").await?;
//!
//!     // Read data (automatically decompressed)
//!     let data = storage.read("snapshot.bin").await?;
//!     assert_eq!(data, b"important data");
//!
//!     // Scope files per user
//!     let scoped = storage.namespace("amjad")?;
//!     scoped.write("active.bin", b"state").await?;
//!     Ok(())
//! }
//! ```

mod builder;
mod engine;
mod error;
mod maintenance;
mod namespace;
mod security;

pub use builder::StorageBuilder;
pub use engine::{Compression, Storage};
pub use error::{StorageError, StorageErrorExt};
pub use namespace::NamespacedStorage;
