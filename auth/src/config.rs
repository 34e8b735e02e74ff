//! Configuration for the delegated-authorization layer.
//!
//! Every component takes its configuration explicitly through its
//! constructor. There is no process-wide configuration state; the only
//! shared handle is the injected key-value store.

use chrono::Duration;

/// Provider endpoints and client registration for the OAuth flow client.
///
/// Defaults target Google's OAuth 2.0 endpoints with Drive file scope.
/// Endpoints are overridable so tests can point the client at a local
/// mock server.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// OAuth 2.0 client ID from the provider console.
    pub client_id: String,

    /// OAuth 2.0 client secret (keep confidential).
    pub client_secret: String,

    /// Scopes to request.
    pub scopes: Vec<String>,

    /// Consent-screen (authorization) endpoint.
    pub auth_url: String,

    /// Token endpoint (code exchange and refresh).
    pub token_url: String,

    /// OIDC userinfo endpoint.
    pub userinfo_url: String,

    /// Token revocation endpoint.
    pub revoke_url: String,

    /// Upper bound on every HTTP request to the provider.
    pub http_timeout: std::time::Duration,
}

impl ProviderConfig {
    /// Create a provider configuration with Google defaults.
    ///
    /// # Arguments
    ///
    /// * `client_id` - OAuth 2.0 client ID
    /// * `client_secret` - OAuth 2.0 client secret
    #[must_use]
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
                "https://www.googleapis.com/auth/drive.file".to_string(),
            ],
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
            revoke_url: "https://oauth2.googleapis.com/revoke".to_string(),
            http_timeout: std::time::Duration::from_secs(30),
        }
    }

    /// Set custom scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Override the authorization endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: String) -> Self {
        self.auth_url = url;
        self
    }

    /// Override the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: String) -> Self {
        self.token_url = url;
        self
    }

    /// Override the userinfo endpoint.
    #[must_use]
    pub fn with_userinfo_url(mut self, url: String) -> Self {
        self.userinfo_url = url;
        self
    }

    /// Override the revocation endpoint.
    #[must_use]
    pub fn with_revoke_url(mut self, url: String) -> Self {
        self.revoke_url = url;
        self
    }

    /// Set the per-request HTTP timeout.
    #[must_use]
    pub const fn with_http_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}

/// Lifecycle configuration shared by the state manager, credential store,
/// and dispatcher.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Exact callback URI registered with the provider.
    pub redirect_uri: String,

    /// Validity window for an issued authorization state.
    ///
    /// Default: 10 minutes
    pub state_ttl: Duration,

    /// Storage TTL safety net for persisted credentials. Generous by
    /// design: `expires_at` is the primary expiry mechanism, not this.
    ///
    /// Default: 30 days
    pub credential_ttl: Duration,

    /// Freshness buffer: a credential expiring within this window is
    /// proactively refreshed before the action runs.
    ///
    /// Default: 5 minutes
    pub refresh_buffer: Duration,
}

impl AuthConfig {
    /// Create a lifecycle configuration.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - Callback URI (e.g., "<https://app.example.com/auth/callback>")
    #[must_use]
    pub fn new(redirect_uri: String) -> Self {
        Self {
            redirect_uri,
            state_ttl: Duration::minutes(10),
            credential_ttl: Duration::days(30),
            refresh_buffer: Duration::minutes(5),
        }
    }

    /// Set the authorization state time-to-live.
    #[must_use]
    pub const fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }

    /// Set the credential storage time-to-live.
    #[must_use]
    pub const fn with_credential_ttl(mut self, ttl: Duration) -> Self {
        self.credential_ttl = ttl;
        self
    }

    /// Set the proactive refresh buffer.
    #[must_use]
    pub const fn with_refresh_buffer(mut self, buffer: Duration) -> Self {
        self.refresh_buffer = buffer;
        self
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000/auth/callback".to_string())
    }
}
