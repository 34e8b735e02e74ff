//! OAuth flow client trait.

use crate::error::Result;
use crate::state::{AuthenticatedIdentity, TokenGrant};

/// OAuth flow client for one resource provider.
///
/// This trait abstracts over the provider-facing half of the handshake and
/// the token lifecycle. It is the only component that talks to the
/// provider; everything it returns uses absolute timestamps, because the
/// `expires_in` (seconds) to instant conversion happens exactly once,
/// inside the implementation.
pub trait OAuthFlow: Send + Sync {
    /// Build the provider's consent-screen URL.
    ///
    /// The URL embeds `state`, `redirect_uri`, the configured scopes, and
    /// flags requesting offline access and forced consent, so a refresh
    /// token is reliably issued even on re-authorization.
    ///
    /// # Errors
    ///
    /// Returns error if URL construction fails.
    fn build_authorization_url(
        &self,
        state: &str,
        redirect_uri: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Exchange an authorization code for a token grant.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenExchange`](crate::AuthError::TokenExchange)
    /// if the provider rejects the code, or
    /// [`AuthError::Network`](crate::AuthError::Network) on transport
    /// failure.
    fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> impl std::future::Future<Output = Result<TokenGrant>> + Send;

    /// Mint a new access token from a refresh token.
    ///
    /// The provider may omit a new refresh token from the grant; the
    /// caller must retain the prior one in that case.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::RefreshRevoked`](crate::AuthError::RefreshRevoked)
    /// when the refresh token is invalid (`invalid_grant`), or
    /// [`AuthError::RefreshTransient`](crate::AuthError::RefreshTransient)
    /// for network failures, timeouts, and provider 5xx responses.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl std::future::Future<Output = Result<TokenGrant>> + Send;

    /// Fetch the authenticated identity behind an access token.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the token is invalid.
    fn fetch_identity(
        &self,
        access_token: &str,
    ) -> impl std::future::Future<Output = Result<AuthenticatedIdentity>> + Send;

    /// Revoke a token with the provider.
    ///
    /// Revoking a refresh token also invalidates the access tokens minted
    /// from it.
    ///
    /// # Errors
    ///
    /// Returns error if the provider refuses the revocation or the request
    /// fails.
    fn revoke(&self, token: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}
