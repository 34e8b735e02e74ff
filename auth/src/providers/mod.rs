//! Provider-facing clients.
//!
//! [`OAuthFlow`] is the interface the rest of the crate depends on;
//! [`GoogleDriveOAuth`] is the concrete client for the document-storage
//! provider. Tests substitute the mock flow from
//! [`crate::mocks`].

pub mod google_drive;
pub mod oauth;

pub use google_drive::GoogleDriveOAuth;
pub use oauth::OAuthFlow;
