//! Idempotent schema bootstrap.
//!
//! Applied on every connect; `IF NOT EXISTS` keeps re-runs harmless. The
//! unique index on `key_id` backs the record-id collision check with a
//! second line of defense against duplicate identifiers.

use crate::error::{RegistryError, RegistryErrorExt};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tracing::debug;

const SCHEMA: &[&str] = &[
    "DEFINE TABLE IF NOT EXISTS encryption_keys SCHEMALESS",
    "DEFINE INDEX IF NOT EXISTS unique_key_id ON TABLE encryption_keys COLUMNS key_id UNIQUE",
    "DEFINE TABLE IF NOT EXISTS messages SCHEMALESS",
    "DEFINE TABLE IF NOT EXISTS profiles SCHEMALESS",
];

pub(crate) async fn apply_schema(instance: &Surreal<Any>) -> Result<(), RegistryError> {
    for statement in SCHEMA {
        debug!(statement, "Applying schema statement");
        instance
            .query(*statement)
            .await
            .context("Submitting schema statement")?
            .check()
            .context("Applying schema statement")?;
    }
    Ok(())
}
