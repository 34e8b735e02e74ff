//! Credential serialization with encryption at rest.
//!
//! The storage format is isolated from business logic behind the
//! [`CredentialCodec`] trait. The shipped implementation is
//! [`AesGcmCredentialCodec`]: bincode serialization wrapped in AES-256-GCM.
//! Reversible-but-unencrypted encodings are deliberately not provided;
//! anything that reaches the durable store has been through an AEAD.
//!
//! # Security
//!
//! The encryption key MUST be:
//! - Exactly 32 bytes (256 bits), generated by a CSPRNG
//! - Stored outside the durable store (secrets manager, environment)
//! - Never derivable from stored data

use crate::error::{AuthError, Result};
use crate::state::Credential;
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use std::sync::Arc;

/// Nonce length for AES-GCM (96 bits).
const NONCE_LEN: usize = 12;

/// Serializes and deserializes a [`Credential`] to and from the durable
/// store's value representation.
pub trait CredentialCodec: Send + Sync {
    /// Encode a credential into storage bytes.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or encryption fails.
    fn encode(&self, credential: &Credential) -> Result<Vec<u8>>;

    /// Decode a credential from storage bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are malformed, fail authentication, or
    /// do not deserialize to a credential.
    fn decode(&self, bytes: &[u8]) -> Result<Credential>;
}

/// AES-256-GCM credential codec.
///
/// Stored layout: `[nonce (12 bytes)][ciphertext (variable)]`. A fresh
/// random nonce is generated for every encode, so cloning the codec is
/// safe.
pub struct AesGcmCredentialCodec {
    /// AES-256-GCM cipher. Wrapped in `Arc` for cheap cloning without
    /// nonce reuse risks.
    cipher: Arc<Aes256Gcm>,
}

impl AesGcmCredentialCodec {
    /// Create a codec from a 32-byte AES-256 key.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] if the key is not exactly
    /// 32 bytes.
    pub fn new(encryption_key: &[u8]) -> Result<Self> {
        if encryption_key.len() != 32 {
            return Err(AuthError::InvalidConfig(
                "Encryption key must be exactly 32 bytes (256 bits) for AES-256-GCM".to_string(),
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(encryption_key).map_err(|e| {
            AuthError::InvalidConfig(format!("Failed to initialize AES-256-GCM cipher: {e}"))
        })?;

        Ok(Self {
            cipher: Arc::new(cipher),
        })
    }
}

impl Clone for AesGcmCredentialCodec {
    fn clone(&self) -> Self {
        Self {
            cipher: Arc::clone(&self.cipher),
        }
    }
}

impl CredentialCodec for AesGcmCredentialCodec {
    fn encode(&self, credential: &Credential) -> Result<Vec<u8>> {
        let plaintext = bincode::serialize(credential)
            .map_err(|e| AuthError::Serialization(e.to_string()))?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|e| AuthError::Crypto(format!("Encryption failed: {e}")))?;

        let mut encoded = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        encoded.extend_from_slice(&nonce);
        encoded.extend_from_slice(&ciphertext);
        Ok(encoded)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Credential> {
        if bytes.len() < NONCE_LEN {
            return Err(AuthError::Crypto(
                "Encoded credential too short (missing nonce)".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_LEN);
        let nonce = Nonce::clone_from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(&nonce, ciphertext)
            .map_err(|e| AuthError::Crypto(format!("Decryption failed: {e}")))?;

        bincode::deserialize(&plaintext).map_err(|e| AuthError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SubjectId;
    use chrono::{Duration, Utc};

    fn sample_credential() -> Credential {
        Credential {
            subject_id: SubjectId::from("subject-42"),
            access_token: "secret_access_token".to_string(),
            refresh_token: Some("secret_refresh_token".to_string()),
            expires_at: Utc::now() + Duration::hours(1),
            scope: "openid email".to_string(),
            stored_at: Utc::now(),
        }
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn round_trip() {
        let codec = AesGcmCredentialCodec::new(&[7u8; 32]).unwrap();
        let credential = sample_credential();

        let encoded = codec.encode(&credential).unwrap();
        let decoded = codec.decode(&encoded).unwrap();

        assert_eq!(decoded, credential);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn ciphertext_does_not_leak_plaintext() {
        let codec = AesGcmCredentialCodec::new(&[7u8; 32]).unwrap();
        let encoded = codec.encode(&sample_credential()).unwrap();

        let raw = String::from_utf8_lossy(&encoded);
        assert!(!raw.contains("secret_access_token"));
        assert!(!raw.contains("secret_refresh_token"));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn wrong_key_fails_authentication() {
        let codec = AesGcmCredentialCodec::new(&[7u8; 32]).unwrap();
        let other = AesGcmCredentialCodec::new(&[8u8; 32]).unwrap();

        let encoded = codec.encode(&sample_credential()).unwrap();
        assert!(matches!(other.decode(&encoded), Err(AuthError::Crypto(_))));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn tampered_ciphertext_fails_authentication() {
        let codec = AesGcmCredentialCodec::new(&[7u8; 32]).unwrap();
        let mut encoded = codec.encode(&sample_credential()).unwrap();

        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;
        assert!(matches!(codec.decode(&encoded), Err(AuthError::Crypto(_))));
    }

    #[test]
    fn rejects_short_key() {
        assert!(matches!(
            AesGcmCredentialCodec::new(&[0u8; 16]),
            Err(AuthError::InvalidConfig(_))
        ));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn rejects_truncated_input() {
        let codec = AesGcmCredentialCodec::new(&[7u8; 32]).unwrap();
        assert!(matches!(
            codec.decode(&[0u8; 5]),
            Err(AuthError::Crypto(_))
        ));
    }
}
