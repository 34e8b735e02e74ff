//! Core data types for delegated-access grants.
//!
//! All timestamps in this crate are `chrono::DateTime<Utc>`. The one place
//! a relative `expires_in` (seconds) enters the system is the OAuth flow
//! client, which converts it to an absolute instant before anything here
//! sees it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Stable identifier of an authenticated user, as issued by the provider
/// (the OIDC `sub` claim).
///
/// This is the owner key for persisted credentials. It only exists after a
/// handshake has completed; nothing in this crate guesses a fallback
/// identity before then.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl SubjectId {
    /// Wrap a provider-issued subject identifier.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// The raw identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Core State Types
// ═══════════════════════════════════════════════════════════════════════

/// A token grant returned by the provider's token endpoint.
///
/// Produced by both the code-exchange and refresh operations. On refresh
/// the provider may omit `refresh_token`; [`Credential::apply_refresh`]
/// keeps the prior one in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    /// Short-lived bearer token.
    pub access_token: String,

    /// Long-lived token for minting new access tokens (if granted).
    pub refresh_token: Option<String>,

    /// Absolute instant after which `access_token` must not be used.
    pub expires_at: DateTime<Utc>,

    /// Space-delimited granted permissions.
    pub scope: String,
}

/// A delegated-access grant for one user.
///
/// Created on successful code exchange, mutated on every refresh, deleted
/// when a refresh irrecoverably fails or the user disconnects. Persisted
/// (encrypted) by the credential store; ephemeral copies live only for the
/// duration of a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Owner of the grant.
    pub subject_id: SubjectId,

    /// Short-lived bearer token (encrypted at rest).
    pub access_token: String,

    /// Long-lived refresh token (encrypted at rest). Absent when the
    /// provider did not grant offline access.
    pub refresh_token: Option<String>,

    /// Absolute expiry of `access_token`. Always set.
    pub expires_at: DateTime<Utc>,

    /// Space-delimited granted permissions.
    pub scope: String,

    /// When this credential was last written.
    pub stored_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from a fresh code-exchange grant.
    #[must_use]
    pub fn from_grant(subject_id: SubjectId, grant: TokenGrant) -> Self {
        Self {
            subject_id,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: grant.expires_at,
            scope: grant.scope,
            stored_at: Utc::now(),
        }
    }

    /// Fold a refresh grant into this credential.
    ///
    /// The access token and expiry are replaced. The refresh token is
    /// preserved unless the provider rotated it (sent a new one).
    pub fn apply_refresh(&mut self, grant: TokenGrant) {
        self.access_token = grant.access_token;
        self.expires_at = grant.expires_at;
        if !grant.scope.is_empty() {
            self.scope = grant.scope;
        }
        if let Some(rotated) = grant.refresh_token {
            self.refresh_token = Some(rotated);
        }
        self.stored_at = Utc::now();
    }

    /// Whether the access token expires within the given freshness buffer
    /// (or already has).
    #[must_use]
    pub fn expires_within(&self, buffer: Duration) -> bool {
        Utc::now() + buffer >= self.expires_at
    }
}

/// One in-flight OAuth handshake.
///
/// Keyed by its own `state` token in the durable store, valid for a single
/// bounded window, and consumed at most once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationState {
    /// Unguessable CSRF nonce, also the storage key.
    pub state: String,

    /// Exact callback URI this handshake expects to arrive at.
    pub redirect_uri: String,

    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
}

/// Read-only projection of provider-supplied profile data.
///
/// Attached to a credential at creation time and threaded explicitly
/// through call signatures; never inferred from ambient request context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    /// Stable provider-issued identifier.
    pub subject_id: SubjectId,

    /// Email address.
    pub email: String,

    /// Display name, if the provider supplied one.
    pub display_name: Option<String>,
}
