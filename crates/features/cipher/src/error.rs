use std::borrow::Cow;

/// Error types specific to the cipher engine.
#[cmesh_derive::cmesh_error]
pub enum CipherError {
    /// The operating system entropy source failed.
    #[error("Entropy source failed{}: {message}", format_context(.context))]
    Entropy { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Generated or imported key material failed domain validation.
    #[error("Key validation failed{}: {source}", format_context(.context))]
    Key { source: cmesh_domain::key::KeyError, context: Option<Cow<'static, str>> },

    /// Postcard serialization error with optional context.
    #[error("Postcard serialization error{}: {source}", format_context(.context))]
    PostcardSerialize { source: postcard::Error, context: Option<Cow<'static, str>> },

    /// Serde serialization error with optional context.
    #[error("Serde serialization error{}: {source}", format_context(.context))]
    SerdeSerialize { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// A share code could not be decoded back into key material.
    #[error("Share code is invalid{}: {source}", format_context(.context))]
    ShareDecode { source: base64::DecodeError, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal cipher error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
