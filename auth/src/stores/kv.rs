//! Durable key-value store contract.
//!
//! The minimal contract every backend must provide is `put`/`get`/`delete`
//! with per-key TTL. There is deliberately no compare-and-swap: correctness
//! under concurrent access comes from idempotent refresh plus bounded retry
//! in the dispatcher, not from storage-level mutual exclusion.

use crate::error::Result;
use chrono::Duration;

/// Durable key-value store with per-key TTL.
///
/// The single shared resource across all request handling. Implementations
/// must be cheaply cloneable handles (connection managers, `Arc`-backed
/// maps).
pub trait KeyValueStore: Send + Sync {
    /// Store a value under `key`, expiring after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn put(
        &self,
        key: &str,
        value: &[u8],
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fetch the value under `key`, if present and unexpired.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn get(&self, key: &str) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Remove the value under `key`. Removing an absent key is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn delete(&self, key: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fetch and remove the value under `key` in one logical step.
    ///
    /// The default is get-then-delete, which matches the minimal contract.
    /// Backends with an atomic primitive (Redis `GETDEL`) should override
    /// this to close the window between the two operations.
    ///
    /// # Errors
    ///
    /// Returns error if the storage operation fails.
    fn take(&self, key: &str) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send {
        async move {
            let value = self.get(key).await?;
            if value.is_some() {
                self.delete(key).await?;
            }
            Ok(value)
        }
    }
}
