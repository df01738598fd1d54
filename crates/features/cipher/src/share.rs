//! Key interchange forms for sharing a protocol with a trusted contact.
//!
//! Two representations are supported:
//! * a compact **share code** (postcard bytes in URL-safe Base64, no padding)
//!   suitable for links and QR payloads, and
//! * plain **JSON** for configuration files and text-based transports.
//!
//! Both re-validate the embedded map on import, so a tampered or truncated
//! code can never produce a non-bijective key.

use crate::error::CipherError;
use base64::{Engine as _, engine::general_purpose};
use cmesh_domain::key::CipherKey;

/// Interchange surface for [`CipherKey`].
pub trait KeyShare: Sized {
    /// Serializes into a compact, URL-safe share code.
    ///
    /// # Errors
    /// Returns [`CipherError::PostcardSerialize`] if serialization fails.
    fn to_share_code(&self) -> Result<String, CipherError>;

    /// Restores a key from a share code.
    ///
    /// # Errors
    /// Returns [`CipherError::ShareDecode`] for malformed Base64 and
    /// [`CipherError::PostcardSerialize`] for corrupted payloads (including
    /// maps that fail bijectivity validation).
    fn from_share_code(code: &str) -> Result<Self, CipherError>;

    /// Serializes into a human-readable JSON string.
    ///
    /// # Errors
    /// Returns [`CipherError::SerdeSerialize`] if serialization fails.
    fn to_json(&self) -> Result<String, CipherError>;

    /// Restores a key from JSON.
    ///
    /// # Errors
    /// Returns [`CipherError::SerdeSerialize`] if the JSON is malformed or the
    /// embedded map fails validation.
    fn from_json(json: &str) -> Result<Self, CipherError>;
}

impl KeyShare for CipherKey {
    fn to_share_code(&self) -> Result<String, CipherError> {
        let bytes = postcard::to_stdvec(self)?;
        Ok(general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn from_share_code(code: &str) -> Result<Self, CipherError> {
        let bytes = general_purpose::URL_SAFE_NO_PAD.decode(code.trim())?;
        postcard::from_bytes(&bytes).map_err(CipherError::from)
    }

    fn to_json(&self) -> Result<String, CipherError> {
        serde_json::to_string(self).map_err(CipherError::from)
    }

    fn from_json(json: &str) -> Result<Self, CipherError> {
        serde_json::from_str(json).map_err(CipherError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;

    #[test]
    fn share_code_round_trip() {
        let key = generate().unwrap();
        let code = key.to_share_code().unwrap();
        let restored = CipherKey::from_share_code(&code).unwrap();
        assert_eq!(key, restored);
    }

    #[test]
    fn share_codes_are_url_safe() {
        let key = generate().unwrap();
        let code = key.to_share_code().unwrap();
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn malformed_base64_is_rejected() {
        let err = CipherKey::from_share_code("not!!valid@@base64").unwrap_err();
        assert!(matches!(err, CipherError::ShareDecode { .. }));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let key = generate().unwrap();
        let mut code = key.to_share_code().unwrap();
        code.truncate(code.len() / 2);
        assert!(CipherKey::from_share_code(&code).is_err());
    }

    #[test]
    fn json_round_trip() {
        let key = generate().unwrap();
        let json = key.to_json().unwrap();
        let restored = CipherKey::from_json(&json).unwrap();
        assert_eq!(key, restored);
    }

    #[test]
    fn json_with_broken_map_is_rejected() {
        // 'a' and 'b' collide on 'z': fails bijectivity validation on import.
        let json = r#"{"id":"KEY-1234","map":{"a":"z","b":"z"}}"#;
        assert!(CipherKey::from_json(json).is_err());
    }
}
