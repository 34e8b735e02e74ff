//! End-to-end tests for the authorization handshake: state issuance,
//! single-use validation, code exchange, credential persistence, and
//! disconnect.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use docbridge_auth::mocks::MockOAuthFlow;
use docbridge_auth::{
    AesGcmCredentialCodec, AuthConfig, AuthError, AuthStateManager, AuthorizationFailure,
    CredentialStore, DispatchError, Dispatcher, MemoryKeyValueStore, SubjectId,
};

#[derive(Debug, thiserror::Error)]
#[error("unauthorized")]
struct Unauthorized;

impl AuthorizationFailure for Unauthorized {
    fn is_authorization_failure(&self) -> bool {
        true
    }
}

struct Harness {
    dispatcher: Dispatcher<MemoryKeyValueStore, AesGcmCredentialCodec, MockOAuthFlow>,
    credentials: CredentialStore<MemoryKeyValueStore, AesGcmCredentialCodec>,
    flow: MockOAuthFlow,
}

fn harness_with_config(flow: MockOAuthFlow, config: AuthConfig) -> Harness {
    let kv = MemoryKeyValueStore::new();
    let codec = AesGcmCredentialCodec::new(&[4u8; 32]).unwrap();

    let credentials = CredentialStore::new(kv.clone(), codec.clone(), config.clone());
    let states = AuthStateManager::new(kv, config.clone());
    let dispatcher = Dispatcher::new(credentials.clone(), states, flow.clone(), config);

    Harness {
        dispatcher,
        credentials,
        flow,
    }
}

fn harness(flow: MockOAuthFlow) -> Harness {
    harness_with_config(
        flow,
        AuthConfig::new("https://gateway.example.com/auth/callback".to_string()),
    )
}

/// Pull the `state` query parameter out of an authorization URL.
fn state_param(url: &str) -> String {
    let (_, rest) = url.split_once("state=").unwrap();
    rest.split('&').next().unwrap().to_string()
}

#[tokio::test]
async fn full_handshake_persists_a_usable_credential() {
    let h = harness(MockOAuthFlow::new().with_subject("drive-user-42"));

    let url = h.dispatcher.begin_authorization().await.unwrap();
    assert!(url.contains("redirect_uri=https://gateway.example.com/auth/callback"));
    let state = state_param(&url);
    assert_eq!(state.len(), 43);

    let identity = h
        .dispatcher
        .complete_authorization("auth-code", &state)
        .await
        .unwrap();
    assert_eq!(identity.subject_id.0, "drive-user-42");
    assert_eq!(identity.email, "user@example.com");
    assert_eq!(h.flow.exchange_calls(), 1);
    assert_eq!(h.flow.identity_calls(), 1);

    // The credential landed in the store, keyed by the reported subject.
    let subject = SubjectId::from("drive-user-42");
    let stored = h.credentials.load(&subject).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "granted-access-1");
    assert_eq!(stored.refresh_token.as_deref(), Some("granted-refresh"));
    assert_eq!(stored.scope, "openid email drive.file");
    assert!(stored.expires_at > Utc::now() + Duration::minutes(50));

    // And dispatch now runs actions without any refresh.
    let token = h
        .dispatcher
        .dispatch(&subject, |token| async move { Ok::<_, Unauthorized>(token) })
        .await
        .unwrap();
    assert_eq!(token, "granted-access-1");
    assert_eq!(h.flow.refresh_calls(), 0);
}

#[tokio::test]
async fn replayed_state_is_rejected() {
    let h = harness(MockOAuthFlow::new());

    let url = h.dispatcher.begin_authorization().await.unwrap();
    let state = state_param(&url);

    h.dispatcher
        .complete_authorization("auth-code", &state)
        .await
        .unwrap();

    let replay = h.dispatcher.complete_authorization("auth-code", &state).await;
    assert!(matches!(replay, Err(AuthError::InvalidState)));
    // The second attempt never reached the provider.
    assert_eq!(h.flow.exchange_calls(), 1);
}

#[tokio::test]
async fn state_never_issued_is_rejected_before_the_exchange() {
    let h = harness(MockOAuthFlow::new());

    let result = h
        .dispatcher
        .complete_authorization("auth-code", "forged-state")
        .await;

    assert!(matches!(result, Err(AuthError::InvalidState)));
    assert_eq!(h.flow.exchange_calls(), 0);
}

#[tokio::test]
async fn expired_state_is_rejected() {
    let config = AuthConfig::new("https://gateway.example.com/auth/callback".to_string())
        .with_state_ttl(Duration::milliseconds(30));
    let h = harness_with_config(MockOAuthFlow::new(), config);

    let url = h.dispatcher.begin_authorization().await.unwrap();
    let state = state_param(&url);

    tokio::time::sleep(std::time::Duration::from_millis(80)).await;

    let result = h.dispatcher.complete_authorization("auth-code", &state).await;
    assert!(matches!(result, Err(AuthError::InvalidState)));
    assert_eq!(h.flow.exchange_calls(), 0);
}

#[tokio::test]
async fn failed_exchange_still_consumes_the_state() {
    let h = harness(MockOAuthFlow::new().with_failing_exchange());

    let url = h.dispatcher.begin_authorization().await.unwrap();
    let state = state_param(&url);

    let result = h.dispatcher.complete_authorization("bad-code", &state).await;
    assert!(matches!(result, Err(AuthError::TokenExchange { .. })));

    // Nothing was stored for the would-be subject.
    let subject = SubjectId::from("mock-subject-123");
    assert!(h.credentials.load(&subject).await.unwrap().is_none());

    // Retrying with the same state requires a fresh handshake.
    let retry = h.dispatcher.complete_authorization("bad-code", &state).await;
    assert!(matches!(retry, Err(AuthError::InvalidState)));
}

#[tokio::test]
async fn each_handshake_gets_a_distinct_state() {
    let h = harness(MockOAuthFlow::new());

    let first = state_param(&h.dispatcher.begin_authorization().await.unwrap());
    let second = state_param(&h.dispatcher.begin_authorization().await.unwrap());

    assert_ne!(first, second);
}

#[tokio::test]
async fn disconnect_revokes_with_the_provider_and_deletes_locally() {
    let h = harness(MockOAuthFlow::new());

    let url = h.dispatcher.begin_authorization().await.unwrap();
    let state = state_param(&url);
    let identity = h
        .dispatcher
        .complete_authorization("auth-code", &state)
        .await
        .unwrap();

    h.dispatcher.disconnect(&identity.subject_id).await.unwrap();

    assert_eq!(h.flow.revoke_calls(), 1);
    assert!(h
        .credentials
        .load(&identity.subject_id)
        .await
        .unwrap()
        .is_none());

    // Dispatch after disconnect starts a new handshake.
    let result = h
        .dispatcher
        .dispatch(&identity.subject_id, |_token| async {
            Ok::<_, Unauthorized>(())
        })
        .await;
    assert!(matches!(
        result,
        Err(DispatchError::AuthenticationRequired { .. })
    ));
}

#[tokio::test]
async fn disconnect_without_a_credential_is_a_no_op() {
    let h = harness(MockOAuthFlow::new());

    h.dispatcher
        .disconnect(&SubjectId::from("never-connected"))
        .await
        .unwrap();

    assert_eq!(h.flow.revoke_calls(), 0);
}
