//! Durable storage: the key-value contract and the stores built on it.

pub mod auth_state;
pub mod credential;
pub mod kv;
#[cfg(feature = "test-utils")]
pub mod memory;
pub mod redis_kv;

pub use auth_state::AuthStateManager;
pub use credential::CredentialStore;
pub use kv::KeyValueStore;
#[cfg(feature = "test-utils")]
pub use memory::MemoryKeyValueStore;
pub use redis_kv::RedisKeyValueStore;
