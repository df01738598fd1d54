use std::borrow::Cow;

/// Error types for message composition and retrieval.
#[cmesh_derive::cmesh_error]
pub enum MessagingError {
    /// Composition requires an active protocol.
    #[error("No secure protocol active{}: {message}", format_context(.context))]
    NoActiveProtocol { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Blank input is rejected before encoding.
    #[error("Message is empty{}: {message}", format_context(.context))]
    EmptyMessage { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The Data Store rejected or could not serve a request.
    #[error("Messaging registry error{}: {source}", format_context(.context))]
    Registry { source: cmesh_registry::RegistryError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal messaging error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
