//! Mock OAuth flow client for testing.

use crate::error::{AuthError, Result};
use crate::providers::OAuthFlow;
use crate::state::{AuthenticatedIdentity, SubjectId, TokenGrant};
use chrono::{Duration, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// How the mock answers refresh requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshBehavior {
    /// Every refresh succeeds with a fresh access token.
    Succeed,
    /// Every refresh fails with `RefreshRevoked` (invalid_grant).
    Revoked,
    /// Every refresh fails transiently.
    Transient,
}

#[derive(Debug)]
struct MockOAuthFlowInner {
    exchange_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    identity_calls: AtomicUsize,
    revoke_calls: AtomicUsize,
    fail_exchange: bool,
    refresh_behavior: RefreshBehavior,
    rotate_refresh_token: bool,
    grant_lifetime_secs: i64,
    subject: String,
}

/// Mock [`OAuthFlow`] with scripted outcomes and call counters.
///
/// Counters make refresh accounting observable, so tests can assert
/// exactly how many refreshes a dispatch performed.
#[derive(Debug, Clone)]
pub struct MockOAuthFlow {
    inner: Arc<MockOAuthFlowInner>,
}

impl MockOAuthFlow {
    /// Create a mock that succeeds everywhere.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MockOAuthFlowInner {
                exchange_calls: AtomicUsize::new(0),
                refresh_calls: AtomicUsize::new(0),
                identity_calls: AtomicUsize::new(0),
                revoke_calls: AtomicUsize::new(0),
                fail_exchange: false,
                refresh_behavior: RefreshBehavior::Succeed,
                rotate_refresh_token: false,
                grant_lifetime_secs: 3600,
                subject: "mock-subject-123".to_string(),
            }),
        }
    }

    fn rebuild(self, f: impl FnOnce(&mut MockOAuthFlowInner)) -> Self {
        let inner = &*self.inner;
        let mut next = MockOAuthFlowInner {
            exchange_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            identity_calls: AtomicUsize::new(0),
            revoke_calls: AtomicUsize::new(0),
            fail_exchange: inner.fail_exchange,
            refresh_behavior: inner.refresh_behavior,
            rotate_refresh_token: inner.rotate_refresh_token,
            grant_lifetime_secs: inner.grant_lifetime_secs,
            subject: inner.subject.clone(),
        };
        f(&mut next);
        Self {
            inner: Arc::new(next),
        }
    }

    /// Make code exchanges fail.
    #[must_use]
    pub fn with_failing_exchange(self) -> Self {
        self.rebuild(|inner| inner.fail_exchange = true)
    }

    /// Script the refresh outcome.
    #[must_use]
    pub fn with_refresh_behavior(self, behavior: RefreshBehavior) -> Self {
        self.rebuild(|inner| inner.refresh_behavior = behavior)
    }

    /// Rotate the refresh token on every successful refresh.
    #[must_use]
    pub fn with_rotating_refresh_token(self) -> Self {
        self.rebuild(|inner| inner.rotate_refresh_token = true)
    }

    /// Set the subject reported by the identity endpoint.
    #[must_use]
    pub fn with_subject(self, subject: &str) -> Self {
        let subject = subject.to_string();
        self.rebuild(|inner| inner.subject = subject)
    }

    /// Number of code exchanges performed.
    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.inner.exchange_calls.load(Ordering::SeqCst)
    }

    /// Number of refreshes performed.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.inner.refresh_calls.load(Ordering::SeqCst)
    }

    /// Number of identity fetches performed.
    #[must_use]
    pub fn identity_calls(&self) -> usize {
        self.inner.identity_calls.load(Ordering::SeqCst)
    }

    /// Number of revocations performed.
    #[must_use]
    pub fn revoke_calls(&self) -> usize {
        self.inner.revoke_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockOAuthFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl OAuthFlow for MockOAuthFlow {
    fn build_authorization_url(
        &self,
        state: &str,
        redirect_uri: &str,
    ) -> impl Future<Output = Result<String>> + Send {
        let url = format!(
            "https://provider.example.com/o/oauth2/auth?state={state}&redirect_uri={redirect_uri}"
        );
        async move { Ok(url) }
    }

    fn exchange_code(
        &self,
        _code: &str,
        _redirect_uri: &str,
    ) -> impl Future<Output = Result<TokenGrant>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let n = inner.exchange_calls.fetch_add(1, Ordering::SeqCst) + 1;
            if inner.fail_exchange {
                return Err(AuthError::TokenExchange {
                    code: "invalid_grant".to_string(),
                    description: "Bad authorization code".to_string(),
                });
            }
            Ok(TokenGrant {
                access_token: format!("granted-access-{n}"),
                refresh_token: Some("granted-refresh".to_string()),
                expires_at: Utc::now() + Duration::seconds(inner.grant_lifetime_secs),
                scope: "openid email drive.file".to_string(),
            })
        }
    }

    fn refresh(&self, _refresh_token: &str) -> impl Future<Output = Result<TokenGrant>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            let n = inner.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
            match inner.refresh_behavior {
                RefreshBehavior::Succeed => Ok(TokenGrant {
                    access_token: format!("refreshed-access-{n}"),
                    refresh_token: inner
                        .rotate_refresh_token
                        .then(|| format!("rotated-refresh-{n}")),
                    expires_at: Utc::now() + Duration::seconds(inner.grant_lifetime_secs),
                    scope: String::new(),
                }),
                RefreshBehavior::Revoked => Err(AuthError::RefreshRevoked(
                    "Token has been expired or revoked".to_string(),
                )),
                RefreshBehavior::Transient => {
                    Err(AuthError::RefreshTransient("request timed out".to_string()))
                }
            }
        }
    }

    fn fetch_identity(
        &self,
        _access_token: &str,
    ) -> impl Future<Output = Result<AuthenticatedIdentity>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            inner.identity_calls.fetch_add(1, Ordering::SeqCst);
            Ok(AuthenticatedIdentity {
                subject_id: SubjectId::new(inner.subject.clone()),
                email: "user@example.com".to_string(),
                display_name: Some("Test User".to_string()),
            })
        }
    }

    fn revoke(&self, _token: &str) -> impl Future<Output = Result<()>> + Send {
        let inner = Arc::clone(&self.inner);
        async move {
            inner.revoke_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
