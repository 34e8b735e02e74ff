//! Error types for the credential lifecycle and authenticated dispatch.

use thiserror::Error;

/// Result type alias for credential lifecycle operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Error taxonomy for the delegated-authorization layer.
///
/// Variants are organized by where in the credential lifecycle they arise:
/// the handshake, the token endpoints, or the storage layer. Dispatch-level
/// retry policy keys off [`AuthError::is_retryable`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    // ═══════════════════════════════════════════════════════════
    // Handshake Errors
    // ═══════════════════════════════════════════════════════════
    /// CSRF state check failed: the state was never issued, already
    /// consumed, or expired. Fatal to the handshake attempt; the caller
    /// must start a fresh authorization.
    #[error("Invalid or expired authorization state")]
    InvalidState,

    /// The provider declined consent or returned a protocol error on the
    /// callback, surfaced verbatim.
    #[error("OAuth error from provider: {code}: {description}")]
    OAuth {
        /// Provider error code (e.g., `access_denied`).
        code: String,
        /// Human-readable description from the provider.
        description: String,
    },

    /// The provider rejected the authorization code.
    #[error("Token exchange failed: {code}: {description}")]
    TokenExchange {
        /// Provider error code (e.g., `invalid_grant`).
        code: String,
        /// Human-readable description from the provider.
        description: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Refresh Errors
    // ═══════════════════════════════════════════════════════════
    /// The refresh token was revoked or is otherwise invalid
    /// (`invalid_grant`). Irrecoverable: the stored credential is deleted
    /// and the user must re-consent.
    #[error("Refresh token revoked or invalid: {0}")]
    RefreshRevoked(String),

    /// Token refresh failed for a transient reason (network failure,
    /// timeout, provider 5xx). The stored credential is kept and the
    /// caller may retry.
    #[error("Token refresh failed transiently: {0}")]
    RefreshTransient(String),

    /// The userinfo request failed.
    #[error("Identity fetch failed: {0}")]
    IdentityFetch(String),

    // ═══════════════════════════════════════════════════════════
    // Dispatch Errors
    // ═══════════════════════════════════════════════════════════
    /// No usable credential exists (or every allowed refresh was
    /// exhausted). Carries a ready-to-use authorization URL so the caller
    /// can send the user back through consent.
    #[error("Authentication required")]
    AuthenticationRequired {
        /// Consent-screen URL for a freshly issued handshake.
        authorization_url: String,
    },

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════
    /// Transient transport failure (connect error, timeout) outside the
    /// refresh path.
    #[error("Network error: {0}")]
    Network(String),

    /// Key-value store operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Encoding or decoding of a stored value failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Credential encryption or decryption failed.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Component was constructed with an invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AuthError {
    /// Returns `true` if the operation may be retried as-is.
    ///
    /// Retryable errors never indicate a revoked grant; callers must not
    /// treat them as a reason to restart the consent flow.
    ///
    /// # Examples
    ///
    /// ```
    /// # use docbridge_auth::AuthError;
    /// assert!(AuthError::Network("timed out".into()).is_retryable());
    /// assert!(!AuthError::InvalidState.is_retryable());
    /// ```
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RefreshTransient(_) | Self::Network(_) | Self::Storage(_)
        )
    }

    /// Returns `true` if this error requires the user to restart the
    /// authorization handshake.
    #[must_use]
    pub const fn requires_reauthorization(&self) -> bool {
        matches!(
            self,
            Self::InvalidState | Self::RefreshRevoked(_) | Self::AuthenticationRequired { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(AuthError::RefreshTransient("503".into()).is_retryable());
        assert!(AuthError::Network("connect refused".into()).is_retryable());
        assert!(AuthError::Storage("redis down".into()).is_retryable());

        assert!(!AuthError::RefreshRevoked("invalid_grant".into()).is_retryable());
        assert!(!AuthError::InvalidState.is_retryable());
        assert!(
            !AuthError::AuthenticationRequired {
                authorization_url: "https://example.com".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn reauthorization_classification() {
        assert!(AuthError::InvalidState.requires_reauthorization());
        assert!(AuthError::RefreshRevoked("gone".into()).requires_reauthorization());
        assert!(!AuthError::RefreshTransient("timeout".into()).requires_reauthorization());
    }
}
