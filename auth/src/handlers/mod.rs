//! Axum handlers for the OAuth handshake endpoints.
//!
//! Enabled by the `axum` cargo feature. The handlers are a thin transport
//! layer over [`crate::dispatch::Dispatcher`]: all handshake semantics
//! live there.

mod oauth;

pub use oauth::{router, ApiError, CallbackQuery, ConnectedResponse, DisconnectQuery};
