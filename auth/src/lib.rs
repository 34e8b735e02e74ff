//! # docbridge-auth
//!
//! Credential lifecycle and authenticated dispatch for a tool-invocation
//! gateway acting on a user's behalf against a document-storage provider
//! via OAuth2 delegated authorization.
//!
//! Independent tool invocations reuse a previously granted authorization
//! without re-consent; short-lived access tokens are refreshed
//! transparently, with a single bounded retry when the provider rejects
//! one mid-action.
//!
//! ## Architecture
//!
//! ```text
//! caller ──► Dispatcher ──► CredentialStore ──► KeyValueStore
//!               │                 │                  (Redis)
//!               │                 └── CredentialCodec (AES-256-GCM)
//!               ├──► AuthStateManager ──► KeyValueStore
//!               └──► OAuthFlow (GoogleDriveOAuth)
//! ```
//!
//! Every component takes its collaborators and configuration explicitly
//! through its constructor; the injected key-value store handle is the
//! only shared resource.
//!
//! ## Example: wiring the dispatcher
//!
//! ```rust,ignore
//! use docbridge_auth::*;
//!
//! let kv = RedisKeyValueStore::new("redis://127.0.0.1:6379").await?;
//! let codec = AesGcmCredentialCodec::new(&encryption_key)?;
//! let config = AuthConfig::new("https://gateway.example.com/auth/callback".into());
//! let flow = GoogleDriveOAuth::new(ProviderConfig::new(client_id, client_secret))?;
//!
//! let dispatcher = Dispatcher::new(
//!     CredentialStore::new(kv.clone(), codec, config.clone()),
//!     AuthStateManager::new(kv, config.clone()),
//!     flow,
//!     config,
//! );
//!
//! // Every tool action goes through the choke point:
//! let listing = dispatcher
//!     .dispatch(&subject_id, |token| list_documents(token))
//!     .await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
#[cfg(feature = "axum")]
pub mod handlers;
#[cfg(feature = "test-utils")]
pub mod mocks;
pub mod providers;
pub mod state;
pub mod stores;

// Re-export main types for convenience
pub use codec::{AesGcmCredentialCodec, CredentialCodec};
pub use config::{AuthConfig, ProviderConfig};
pub use dispatch::{AuthorizationFailure, DispatchError, Dispatcher};
pub use error::{AuthError, Result};
pub use providers::{GoogleDriveOAuth, OAuthFlow};
pub use state::{AuthenticatedIdentity, AuthorizationState, Credential, SubjectId, TokenGrant};
pub use stores::{AuthStateManager, CredentialStore, KeyValueStore, RedisKeyValueStore};
#[cfg(feature = "test-utils")]
pub use stores::MemoryKeyValueStore;
