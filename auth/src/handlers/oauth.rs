//! OAuth handshake HTTP endpoints.
//!
//! - `GET /auth/authorize` — issue a state and redirect to the consent URL
//! - `GET /auth/callback` — validate the state, exchange the code, persist
//!   the credential
//! - `GET /auth/disconnect` — revoke with the provider and delete locally

use crate::codec::CredentialCodec;
use crate::dispatch::Dispatcher;
use crate::error::AuthError;
use crate::providers::OAuthFlow;
use crate::state::SubjectId;
use crate::stores::KeyValueStore;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// HTTP projection of the error taxonomy.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: String,
    message: String,
}

impl ApiError {
    /// Create an error response.
    #[must_use]
    pub fn new(status: StatusCode, code: &str, message: String) -> Self {
        Self {
            status,
            code: code.to_string(),
            message,
        }
    }

    fn bad_request(code: &str, message: String) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match &err {
            AuthError::InvalidState => {
                Self::bad_request("invalid_state", err.to_string())
            }
            AuthError::OAuth { .. } => Self::bad_request("oauth_error", err.to_string()),
            AuthError::AuthenticationRequired { authorization_url } => Self::new(
                StatusCode::UNAUTHORIZED,
                "authentication_required",
                authorization_url.clone(),
            ),
            AuthError::TokenExchange { .. } | AuthError::IdentityFetch(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "provider_error", err.to_string())
            }
            AuthError::RefreshTransient(_) | AuthError::Network(_) | AuthError::Storage(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "transient", err.to_string())
            }
            _ => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                err.to_string(),
            ),
        }
    }
}

/// JSON body for error responses.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                code: self.code,
                message: self.message,
            }),
        )
            .into_response()
    }
}

/// Callback query parameters from the provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallbackQuery {
    /// Authorization code (absent when the provider reports an error).
    pub code: Option<String>,

    /// CSRF state parameter.
    pub state: Option<String>,

    /// Provider error code (e.g., `access_denied`).
    pub error: Option<String>,

    /// Provider error description.
    pub error_description: Option<String>,
}

/// Response after a successful callback.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedResponse {
    /// Provider-issued subject identifier the credential is keyed by.
    pub subject_id: String,

    /// User's email.
    pub email: String,

    /// Display name, if the provider supplied one.
    pub display_name: Option<String>,
}

/// Disconnect query parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct DisconnectQuery {
    /// Subject whose grant should be revoked.
    pub subject: String,
}

/// Build the handshake router over a shared dispatcher.
pub fn router<K, C, O>(dispatcher: Arc<Dispatcher<K, C, O>>) -> Router
where
    K: KeyValueStore + 'static,
    C: CredentialCodec + 'static,
    O: OAuthFlow + 'static,
{
    Router::new()
        .route("/auth/authorize", get(authorize::<K, C, O>))
        .route("/auth/callback", get(callback::<K, C, O>))
        .route("/auth/disconnect", get(disconnect::<K, C, O>))
        .with_state(dispatcher)
}

/// Initiate the handshake: 302 to the provider's consent screen.
async fn authorize<K, C, O>(
    State(dispatcher): State<Arc<Dispatcher<K, C, O>>>,
) -> Result<Response, ApiError>
where
    K: KeyValueStore + 'static,
    C: CredentialCodec + 'static,
    O: OAuthFlow + 'static,
{
    let url = dispatcher.begin_authorization().await?;
    Ok(Redirect::to(&url).into_response())
}

/// Handle the provider callback.
async fn callback<K, C, O>(
    State(dispatcher): State<Arc<Dispatcher<K, C, O>>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<ConnectedResponse>, ApiError>
where
    K: KeyValueStore + 'static,
    C: CredentialCodec + 'static,
    O: OAuthFlow + 'static,
{
    if let Some(error) = query.error {
        return Err(AuthError::OAuth {
            code: error,
            description: query.error_description.unwrap_or_default(),
        }
        .into());
    }

    let (Some(code), Some(state)) = (query.code, query.state) else {
        return Err(ApiError::bad_request(
            "missing_parameters",
            "Callback requires both code and state".to_string(),
        ));
    };

    let identity = dispatcher.complete_authorization(&code, &state).await?;
    Ok(Json(ConnectedResponse {
        subject_id: identity.subject_id.0,
        email: identity.email,
        display_name: identity.display_name,
    }))
}

/// Revoke the grant and delete the stored credential.
async fn disconnect<K, C, O>(
    State(dispatcher): State<Arc<Dispatcher<K, C, O>>>,
    Query(query): Query<DisconnectQuery>,
) -> Result<StatusCode, ApiError>
where
    K: KeyValueStore + 'static,
    C: CredentialCodec + 'static,
    O: OAuthFlow + 'static,
{
    dispatcher
        .disconnect(&SubjectId::new(query.subject))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
