//! Authenticated dispatch: every provider-bound action passes through
//! here, and runs with a currently valid access token or not at all.
//!
//! The dispatcher owns no state of its own. It composes the credential
//! store, the authorization state manager, and the OAuth flow client, all
//! injected at construction. Concurrent invocations for the same subject
//! are not synchronized; correctness under the resulting refresh race
//! relies on idempotent refresh plus the bounded reactive retry, not
//! mutual exclusion.

use crate::codec::CredentialCodec;
use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::providers::OAuthFlow;
use crate::state::{AuthenticatedIdentity, Credential, SubjectId};
use crate::stores::{AuthStateManager, CredentialStore, KeyValueStore};

/// Classifies an action's errors for the dispatcher.
///
/// Implemented by the error type of every wrapped action. An
/// authorization failure (HTTP 401-equivalent, or a provider error
/// matching an invalid/expired-token pattern) triggers the reactive
/// refresh-and-retry path; every other failure propagates unchanged and is
/// never interpreted as a credential problem.
pub trait AuthorizationFailure {
    /// Whether this error indicates the bearer token was rejected.
    fn is_authorization_failure(&self) -> bool;
}

/// Failure of a dispatched invocation.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError<E> {
    /// No usable credential exists or every allowed refresh was
    /// exhausted. Carries a ready-to-use authorization URL for
    /// re-consent.
    #[error("Authentication required")]
    AuthenticationRequired {
        /// Consent-screen URL for a freshly issued handshake.
        authorization_url: String,
    },

    /// A credential-lifecycle operation failed for a reason that does not
    /// require re-consent (transient refresh failure, storage error).
    #[error(transparent)]
    Auth(AuthError),

    /// The wrapped action failed with a non-authorization error,
    /// propagated unchanged.
    #[error("Action failed: {0}")]
    Action(E),
}

impl<E> From<AuthError> for DispatchError<E> {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationRequired { authorization_url } => {
                Self::AuthenticationRequired { authorization_url }
            }
            other => Self::Auth(other),
        }
    }
}

/// The single choke point for provider-bound actions.
///
/// Guarantees per invocation: at most one proactive and one reactive
/// refresh, and the action executes at most twice.
#[derive(Clone)]
pub struct Dispatcher<K, C, O> {
    credentials: CredentialStore<K, C>,
    states: AuthStateManager<K>,
    flow: O,
    config: AuthConfig,
}

impl<K, C, O> Dispatcher<K, C, O>
where
    K: KeyValueStore,
    C: CredentialCodec,
    O: OAuthFlow,
{
    /// Create a dispatcher from its injected collaborators.
    #[must_use]
    pub const fn new(
        credentials: CredentialStore<K, C>,
        states: AuthStateManager<K>,
        flow: O,
        config: AuthConfig,
    ) -> Self {
        Self {
            credentials,
            states,
            flow,
            config,
        }
    }

    /// Start a fresh handshake: issue an authorization state and build the
    /// consent-screen URL embedding it.
    ///
    /// # Errors
    ///
    /// Returns error if state persistence or URL construction fails.
    pub async fn begin_authorization(&self) -> Result<String> {
        let state = self.states.issue(&self.config.redirect_uri).await?;
        self.flow
            .build_authorization_url(&state, &self.config.redirect_uri)
            .await
    }

    /// Complete a handshake from callback parameters.
    ///
    /// Validates (and consumes) the state, exchanges the code, fetches the
    /// authenticated identity, and persists the resulting credential keyed
    /// by the identity's subject. The identity is returned explicitly;
    /// nothing is inferred from ambient request context.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidState`] on a failed CSRF check,
    /// [`AuthError::TokenExchange`] if the provider rejects the code, or
    /// the identity-fetch/storage error otherwise. The state is consumed
    /// on the first validation attempt regardless of the outcome.
    pub async fn complete_authorization(
        &self,
        code: &str,
        state: &str,
    ) -> Result<AuthenticatedIdentity> {
        let record = self.states.validate(state).await?;
        let grant = self.flow.exchange_code(code, &record.redirect_uri).await?;
        let identity = self.flow.fetch_identity(&grant.access_token).await?;

        let credential = Credential::from_grant(identity.subject_id.clone(), grant);
        self.credentials.save(&credential).await?;

        tracing::info!(
            subject_id = %identity.subject_id,
            "Completed authorization handshake"
        );

        Ok(identity)
    }

    /// Revoke the grant with the provider and delete the stored
    /// credential.
    ///
    /// Revoking the refresh token cascades to its access tokens, so that
    /// one is preferred when present. A failed provider revocation is
    /// logged but does not block local deletion.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operations fail.
    pub async fn disconnect(&self, subject_id: &SubjectId) -> Result<()> {
        if let Some(credential) = self.credentials.load(subject_id).await? {
            let token = credential
                .refresh_token
                .as_deref()
                .unwrap_or(&credential.access_token);
            if let Err(err) = self.flow.revoke(token).await {
                tracing::warn!(
                    subject_id = %subject_id,
                    error = %err,
                    "Provider revocation failed; deleting local credential anyway"
                );
            }
        }
        self.credentials.delete(subject_id).await
    }

    /// Execute `action` under a valid access token for `subject_id`.
    ///
    /// 1. Load the credential; absent means authentication is required.
    /// 2. Proactively refresh when the token expires within the freshness
    ///    buffer, persisting the result.
    /// 3. Run the action.
    /// 4. On an authorization failure, refresh reactively and retry the
    ///    action exactly once.
    /// 5. A second authorization failure deletes the credential and
    ///    requires re-consent. Any other action failure propagates
    ///    unchanged.
    ///
    /// # Errors
    ///
    /// [`DispatchError::AuthenticationRequired`] when no usable credential
    /// remains (always carrying a fresh authorization URL),
    /// [`DispatchError::Auth`] for transient lifecycle failures, and
    /// [`DispatchError::Action`] for the action's own non-authorization
    /// errors.
    pub async fn dispatch<T, E, F, Fut>(
        &self,
        subject_id: &SubjectId,
        action: F,
    ) -> std::result::Result<T, DispatchError<E>>
    where
        E: AuthorizationFailure,
        F: Fn(String) -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, E>> + Send,
    {
        let loaded = self
            .credentials
            .load(subject_id)
            .await
            .map_err(DispatchError::from)?;
        let Some(mut credential) = loaded else {
            tracing::info!(subject_id = %subject_id, "No credential; authentication required");
            return Err(self.authentication_required().await.into());
        };

        if credential.expires_within(self.config.refresh_buffer) {
            tracing::debug!(
                subject_id = %subject_id,
                expires_at = %credential.expires_at,
                "Proactive refresh"
            );
            credential = self.refresh_credential(credential).await?;
        }

        match action(credential.access_token.clone()).await {
            Ok(value) => Ok(value),
            Err(err) if err.is_authorization_failure() => {
                // Reactive refresh runs even when the proactive one already
                // did this invocation: a concurrent caller may have rotated
                // the grant underneath us between our refresh and the
                // action.
                tracing::info!(subject_id = %subject_id, "Action rejected token; reactive refresh");
                credential = self.refresh_credential(credential).await?;

                match action(credential.access_token.clone()).await {
                    Ok(value) => Ok(value),
                    Err(err) if err.is_authorization_failure() => {
                        tracing::warn!(
                            subject_id = %subject_id,
                            "Retried action still rejected token; deleting credential"
                        );
                        self.credentials
                            .delete(subject_id)
                            .await
                            .map_err(DispatchError::from)?;
                        Err(self.authentication_required().await.into())
                    }
                    Err(err) => Err(DispatchError::Action(err)),
                }
            }
            Err(err) => Err(DispatchError::Action(err)),
        }
    }

    /// Refresh a credential and persist the result.
    ///
    /// Irrecoverable failures (no refresh token, or the provider reports
    /// `invalid_grant`) delete the credential and resolve to
    /// `AuthenticationRequired` with a fresh authorization URL. Transient
    /// failures leave the credential in place.
    async fn refresh_credential(&self, mut credential: Credential) -> Result<Credential> {
        let Some(refresh_token) = credential.refresh_token.clone() else {
            tracing::warn!(
                subject_id = %credential.subject_id,
                "Credential has no refresh token; re-consent required"
            );
            self.credentials.delete(&credential.subject_id).await?;
            return Err(self.authentication_required().await);
        };

        match self.flow.refresh(&refresh_token).await {
            Ok(grant) => {
                credential.apply_refresh(grant);
                self.credentials.save(&credential).await?;
                tracing::info!(
                    subject_id = %credential.subject_id,
                    expires_at = %credential.expires_at,
                    "Refreshed credential"
                );
                Ok(credential)
            }
            Err(AuthError::RefreshRevoked(reason)) => {
                tracing::warn!(
                    subject_id = %credential.subject_id,
                    %reason,
                    "Refresh token rejected; deleting credential"
                );
                self.credentials.delete(&credential.subject_id).await?;
                Err(self.authentication_required().await)
            }
            Err(other) => Err(other),
        }
    }

    /// Build the `AuthenticationRequired` error, carrying a fresh
    /// authorization URL when one can be issued.
    async fn authentication_required(&self) -> AuthError {
        match self.begin_authorization().await {
            Ok(authorization_url) => AuthError::AuthenticationRequired { authorization_url },
            Err(err) => err,
        }
    }
}
