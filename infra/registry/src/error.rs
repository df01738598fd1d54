use std::borrow::Cow;

/// A specialized [`RegistryError`] enum for Data Store failures.
///
/// [`RegistryError::Unavailable`] is the transient class: callers keep working
/// on cached state and retry later. [`RegistryError::DuplicateKeyId`] and
/// [`RegistryError::KeyNotFound`] are definitive answers from the store.
#[cmesh_derive::cmesh_error]
pub enum RegistryError {
    /// Required builder parameters are missing or malformed.
    #[error("Registry validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The engine could not be reached or stayed unhealthy.
    #[error("Registry connection error{}: {message}", format_context(.context))]
    Connection { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Root sign-in was rejected.
    #[error("Registry auth error{}: {message}", format_context(.context))]
    Auth { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A key with this id already exists; regenerate and retry.
    #[error("Duplicate key id{}: {message}", format_context(.context))]
    DuplicateKeyId { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// No key record matches the requested id ("protocol invalid").
    #[error("Key not found{}: {message}", format_context(.context))]
    KeyNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Transient backend failure (network, timeout); retry later.
    #[error("Registry unavailable{}: {message}", format_context(.context))]
    Unavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A statement failed inside the engine.
    #[error("Registry query error{}: {source}", format_context(.context))]
    Query { source: surrealdb::Error, context: Option<Cow<'static, str>> },

    /// A stored record failed domain validation on the way out.
    #[error("Stored key material is invalid{}: {source}", format_context(.context))]
    Key { source: cmesh_domain::key::KeyError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal registry error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
