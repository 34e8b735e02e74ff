//! Google OAuth 2.0 flow client for the document-storage provider.
//!
//! Implements the [`OAuthFlow`] trait against Google's OAuth 2.0 and OIDC
//! endpoints, Drive-scoped by default. Endpoints come from
//! [`ProviderConfig`], so tests can point the client at a local mock
//! server.

use crate::config::ProviderConfig;
use crate::error::{AuthError, Result};
use crate::providers::OAuthFlow;
use crate::state::{AuthenticatedIdentity, SubjectId, TokenGrant};
use reqwest::Client;
use serde::Deserialize;

/// Default access-token lifetime when the provider omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Google OAuth 2.0 flow client.
///
/// Every request is bounded by the configured HTTP timeout; a timeout is a
/// transient failure, never a reason to discard the stored credential.
#[derive(Clone, Debug)]
pub struct GoogleDriveOAuth {
    config: ProviderConfig,
    http_client: Client,
}

impl GoogleDriveOAuth {
    /// Create a flow client from a provider configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] if the HTTP client cannot be
    /// constructed.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AuthError::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Convert a raw token response into a grant with an absolute expiry.
    ///
    /// This is the single place `expires_in` seconds become an instant.
    fn to_grant(&self, response: TokenEndpointResponse, fallback_scope: &str) -> TokenGrant {
        let expires_in = response
            .expires_in
            .map_or(DEFAULT_EXPIRES_IN_SECS, i64::from);
        TokenGrant {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(expires_in),
            scope: response
                .scope
                .unwrap_or_else(|| fallback_scope.to_string()),
        }
    }

    /// Parse an error payload off a failed token-endpoint response.
    async fn error_body(response: reqwest::Response) -> (String, String) {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<TokenEndpointError>(&body) {
            Ok(err) => (err.error, err.error_description.unwrap_or_default()),
            Err(_) => (format!("http_{}", status.as_u16()), body),
        }
    }
}

impl OAuthFlow for GoogleDriveOAuth {
    async fn build_authorization_url(&self, state: &str, redirect_uri: &str) -> Result<String> {
        let scope = self.config.scopes.join(" ");
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
            // Offline access plus forced consent so a refresh token is
            // issued even when the user already authorized once.
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("include_granted_scopes", "true"),
        ];

        let query = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::InvalidConfig(format!("Failed to build URL: {e}")))?;

        Ok(format!("{}?{query}", self.config.auth_url))
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<TokenGrant> {
        let params = [
            ("code", code),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("Token exchange request failed: {e}")))?;

        if !response.status().is_success() {
            let (code, description) = Self::error_body(response).await;
            tracing::error!(error = %code, %description, "Token exchange rejected");
            return Err(AuthError::TokenExchange { code, description });
        }

        let parsed: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Network(format!("Malformed token response: {e}")))?;

        Ok(self.to_grant(parsed, &self.config.scopes.join(" ")))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::RefreshTransient(format!("Refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let (code, description) = Self::error_body(response).await;
            // Only a rejected grant is irrecoverable; provider hiccups are
            // reported as transient so the credential survives.
            if code == "invalid_grant" {
                tracing::warn!(%description, "Refresh token revoked by provider");
                return Err(AuthError::RefreshRevoked(description));
            }
            tracing::warn!(error = %code, %description, status = %status, "Transient refresh failure");
            return Err(AuthError::RefreshTransient(format!("{code}: {description}")));
        }

        let parsed: TokenEndpointResponse = response
            .json()
            .await
            .map_err(|e| AuthError::RefreshTransient(format!("Malformed refresh response: {e}")))?;

        // The empty fallback scope lets the credential keep its prior
        // scope when the provider omits one on refresh.
        Ok(self.to_grant(parsed, ""))
    }

    async fn fetch_identity(&self, access_token: &str) -> Result<AuthenticatedIdentity> {
        let response = self
            .http_client
            .get(&self.config.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("Userinfo request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, "Userinfo request rejected");
            return Err(AuthError::IdentityFetch(format!("{status}: {body}")));
        }

        let user: UserInfoResponse = response
            .json()
            .await
            .map_err(|e| AuthError::IdentityFetch(format!("Malformed userinfo response: {e}")))?;

        Ok(AuthenticatedIdentity {
            subject_id: SubjectId::new(user.sub),
            email: user.email.unwrap_or_default(),
            display_name: user.name,
        })
    }

    async fn revoke(&self, token: &str) -> Result<()> {
        let response = self
            .http_client
            .post(&self.config.revoke_url)
            .form(&[("token", token)])
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("Revocation request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AuthError::Network(format!("Revocation rejected: {status}")));
        }

        tracing::info!("Revoked token with provider");
        Ok(())
    }
}

/// Raw token endpoint response (code exchange and refresh).
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,

    /// Lifetime in seconds (typically 3600).
    expires_in: Option<u32>,

    /// Only on initial authorization with `access_type=offline`, or when
    /// the provider rotates it.
    refresh_token: Option<String>,

    /// Granted scopes (space-delimited).
    scope: Option<String>,
}

/// Error payload from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenEndpointError {
    error: String,
    error_description: Option<String>,
}

/// Raw OIDC userinfo response.
#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    /// Stable, unique user identifier.
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn client_for(server: &mockito::ServerGuard) -> GoogleDriveOAuth {
        let base = server.url();
        let config = ProviderConfig::new("test_client_id".to_string(), "test_secret".to_string())
            .with_token_url(format!("{base}/token"))
            .with_userinfo_url(format!("{base}/userinfo"))
            .with_revoke_url(format!("{base}/revoke"))
            .with_http_timeout(std::time::Duration::from_secs(2));
        GoogleDriveOAuth::new(config).unwrap()
    }

    #[tokio::test]
    async fn authorization_url_requests_offline_access_and_consent() {
        let config = ProviderConfig::new("test_client_id".to_string(), "test_secret".to_string());
        let flow = GoogleDriveOAuth::new(config).unwrap();

        let url = flow
            .build_authorization_url("state_123", "http://localhost:3000/callback")
            .await
            .unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fcallback"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=state_123"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("include_granted_scopes=true"));
        assert!(url.contains("drive.file"));
    }

    #[tokio::test]
    async fn exchange_code_computes_absolute_expiry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"at-1","expires_in":3600,"refresh_token":"rt-1","scope":"openid email","token_type":"Bearer"}"#,
            )
            .create_async()
            .await;

        let flow = client_for(&server);
        let before = Utc::now();
        let grant = flow
            .exchange_code("code-1", "http://localhost:3000/callback")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(grant.access_token, "at-1");
        assert_eq!(grant.refresh_token.as_deref(), Some("rt-1"));
        assert_eq!(grant.scope, "openid email");
        let lifetime = grant.expires_at - before;
        assert!(lifetime > chrono::Duration::minutes(59));
        assert!(lifetime <= chrono::Duration::minutes(61));
    }

    #[tokio::test]
    async fn exchange_code_surfaces_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"invalid_grant","error_description":"Bad authorization code"}"#)
            .create_async()
            .await;

        let flow = client_for(&server);
        let err = flow
            .exchange_code("bad-code", "http://localhost:3000/callback")
            .await
            .unwrap_err();

        match err {
            AuthError::TokenExchange { code, description } => {
                assert_eq!(code, "invalid_grant");
                assert_eq!(description, "Bad authorization code");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_missing_expires_in_still_sets_expiry() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"at-2","token_type":"Bearer"}"#)
            .create_async()
            .await;

        let flow = client_for(&server);
        let grant = flow.refresh("rt-1").await.unwrap();

        assert_eq!(grant.access_token, "at-2");
        assert!(grant.refresh_token.is_none());
        assert!(grant.scope.is_empty());
        assert!(grant.expires_at > Utc::now() + chrono::Duration::minutes(50));
    }

    #[tokio::test]
    async fn refresh_invalid_grant_is_revoked() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"invalid_grant","error_description":"Token has been revoked"}"#)
            .create_async()
            .await;

        let flow = client_for(&server);
        assert!(matches!(
            flow.refresh("revoked-rt").await,
            Err(AuthError::RefreshRevoked(_))
        ));
    }

    #[tokio::test]
    async fn refresh_server_error_is_transient() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let flow = client_for(&server);
        assert!(matches!(
            flow.refresh("rt-1").await,
            Err(AuthError::RefreshTransient(_))
        ));
    }

    #[tokio::test]
    async fn fetch_identity_maps_userinfo() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/userinfo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"sub":"110169484474386276334","email":"user@example.com","name":"Test User"}"#,
            )
            .create_async()
            .await;

        let flow = client_for(&server);
        let identity = flow.fetch_identity("at-1").await.unwrap();

        assert_eq!(identity.subject_id.as_str(), "110169484474386276334");
        assert_eq!(identity.email, "user@example.com");
        assert_eq!(identity.display_name.as_deref(), Some("Test User"));
    }

    #[tokio::test]
    async fn fetch_identity_rejected_token() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/userinfo")
            .with_status(401)
            .with_body("invalid token")
            .create_async()
            .await;

        let flow = client_for(&server);
        assert!(matches!(
            flow.fetch_identity("expired").await,
            Err(AuthError::IdentityFetch(_))
        ));
    }

    #[tokio::test]
    async fn revoke_posts_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/revoke")
            .with_status(200)
            .create_async()
            .await;

        let flow = client_for(&server);
        flow.revoke("rt-1").await.unwrap();
        mock.assert_async().await;
    }
}
