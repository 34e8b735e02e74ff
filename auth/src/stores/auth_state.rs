//! Authorization state manager: single-use CSRF tokens for the handshake.
//!
//! Each issued state is 256 bits of randomness, stored under
//! `authstate:{state}` with a bounded TTL, and consumed on its first
//! validation attempt whether or not the handshake ultimately succeeds.

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::state::AuthorizationState;
use crate::stores::KeyValueStore;
use base64::Engine;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;

/// Storage key for an authorization state.
fn state_key(state: &str) -> String {
    format!("authstate:{state}")
}

/// Issues, validates, and single-use-consumes CSRF state tokens.
///
/// Performs store mutations only; it never talks to the provider.
#[derive(Clone)]
pub struct AuthStateManager<K> {
    kv: K,
    config: AuthConfig,
}

impl<K: KeyValueStore> AuthStateManager<K> {
    /// Create a state manager over the given store.
    #[must_use]
    pub const fn new(kv: K, config: AuthConfig) -> Self {
        Self { kv, config }
    }

    /// Generate a cryptographically secure random state token.
    ///
    /// Returns a 256-bit value encoded as base64url (43 characters).
    fn generate_token() -> String {
        let mut random_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut random_bytes);
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
    }

    /// Issue a new authorization state for a handshake expecting to land
    /// on `redirect_uri`.
    ///
    /// # Errors
    ///
    /// Returns error if persisting the state fails.
    pub async fn issue(&self, redirect_uri: &str) -> Result<String> {
        let state = Self::generate_token();
        let record = AuthorizationState {
            state: state.clone(),
            redirect_uri: redirect_uri.to_string(),
            created_at: Utc::now(),
        };

        let bytes =
            bincode::serialize(&record).map_err(|e| AuthError::Serialization(e.to_string()))?;
        self.kv
            .put(&state_key(&state), &bytes, self.config.state_ttl)
            .await?;

        tracing::info!(
            redirect_uri = %record.redirect_uri,
            ttl_seconds = self.config.state_ttl.num_seconds(),
            "Issued authorization state"
        );

        Ok(state)
    }

    /// Validate and consume an authorization state.
    ///
    /// The record is removed on the first validation attempt; a second call
    /// with the same state fails, as does a call after the TTL window.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidState`] if the state was never issued,
    /// already consumed, or expired. This is fatal to the handshake
    /// attempt; the caller must issue a fresh state.
    pub async fn validate(&self, state: &str) -> Result<AuthorizationState> {
        let Some(bytes) = self.kv.take(&state_key(state)).await? else {
            tracing::warn!("Authorization state missing (unknown, consumed, or expired)");
            return Err(AuthError::InvalidState);
        };

        let record: AuthorizationState =
            bincode::deserialize(&bytes).map_err(|e| AuthError::Serialization(e.to_string()))?;

        // Expiry double-check; the store TTL should already have handled this.
        if record.created_at + self.config.state_ttl <= Utc::now() {
            tracing::warn!("Authorization state outlived its TTL in storage");
            return Err(AuthError::InvalidState);
        }

        tracing::info!(
            redirect_uri = %record.redirect_uri,
            "Consumed authorization state (single-use)"
        );

        Ok(record)
    }
}
