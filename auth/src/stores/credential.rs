//! Persisted credentials, one per subject.
//!
//! Values go through the injected [`CredentialCodec`] before touching the
//! durable store, so the storage layer only ever sees opaque (encrypted)
//! bytes under `credential:{subject_id}`.
//!
//! The storage TTL is a generous safety net (default 30 days), longer than
//! any realistic refresh-token lifetime; the primary expiry mechanism is
//! the credential's own `expires_at`.

use crate::codec::CredentialCodec;
use crate::config::AuthConfig;
use crate::error::Result;
use crate::state::{Credential, SubjectId};
use crate::stores::KeyValueStore;

/// Storage key for a subject's credential.
fn credential_key(subject_id: &SubjectId) -> String {
    format!("credential:{subject_id}")
}

/// Persists, retrieves, and invalidates one [`Credential`] per subject.
///
/// This store exclusively owns persisted credentials; the dispatcher only
/// reads and writes through it.
#[derive(Clone)]
pub struct CredentialStore<K, C> {
    kv: K,
    codec: C,
    config: AuthConfig,
}

impl<K: KeyValueStore, C: CredentialCodec> CredentialStore<K, C> {
    /// Create a credential store over the given store and codec.
    #[must_use]
    pub const fn new(kv: K, codec: C, config: AuthConfig) -> Self {
        Self { kv, codec, config }
    }

    /// Encode and persist a credential under its subject.
    ///
    /// # Errors
    ///
    /// Returns error if encoding or the storage write fails.
    pub async fn save(&self, credential: &Credential) -> Result<()> {
        let encoded = self.codec.encode(credential)?;
        self.kv
            .put(
                &credential_key(&credential.subject_id),
                &encoded,
                self.config.credential_ttl,
            )
            .await?;

        tracing::info!(
            subject_id = %credential.subject_id,
            expires_at = %credential.expires_at,
            has_refresh_token = credential.refresh_token.is_some(),
            "Stored credential (encrypted)"
        );

        Ok(())
    }

    /// Load the credential for a subject, if one is persisted.
    ///
    /// # Errors
    ///
    /// Returns error if the storage read or decoding fails.
    pub async fn load(&self, subject_id: &SubjectId) -> Result<Option<Credential>> {
        match self.kv.get(&credential_key(subject_id)).await? {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Delete the credential for a subject.
    ///
    /// Used on irrecoverable refresh failure or explicit disconnect.
    ///
    /// # Errors
    ///
    /// Returns error if the storage delete fails.
    pub async fn delete(&self, subject_id: &SubjectId) -> Result<()> {
        self.kv.delete(&credential_key(subject_id)).await?;
        tracing::info!(subject_id = %subject_id, "Deleted credential");
        Ok(())
    }
}
