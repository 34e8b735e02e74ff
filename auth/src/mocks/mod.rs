//! Mock collaborators for testing.
//!
//! These run at memory speed and make side effects observable through
//! call counters. Enabled by the default `test-utils` feature.

pub mod oauth;

pub use oauth::{MockOAuthFlow, RefreshBehavior};
