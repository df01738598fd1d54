use std::borrow::Cow;

/// Error types for protocol lifecycle operations.
#[cmesh_derive::cmesh_error]
pub enum ProtocolError {
    /// Local snapshot storage failed.
    #[error("Protocol storage error{}: {source}", format_context(.context))]
    Storage { source: cmesh_storage::StorageError, context: Option<Cow<'static, str>> },

    /// The key registry rejected or could not serve a request.
    /// Inspect the source for `KeyNotFound` ("protocol invalid") vs the
    /// transient `Unavailable` class.
    #[error("Protocol registry error{}: {source}", format_context(.context))]
    Registry { source: cmesh_registry::RegistryError, context: Option<Cow<'static, str>> },

    /// Key generation failed (entropy exhaustion).
    #[error("Protocol generation error{}: {source}", format_context(.context))]
    Cipher { source: cmesh_cipher::CipherError, context: Option<Cow<'static, str>> },

    /// The on-disk snapshot could not be serialized or parsed.
    #[error("Protocol snapshot error{}: {source}", format_context(.context))]
    Snapshot { source: postcard::Error, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal protocol error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
