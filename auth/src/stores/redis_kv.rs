//! Redis-backed durable key-value store.
//!
//! Values are stored with `SET EX` so Redis owns TTL enforcement, and
//! single-step consumption uses the atomic `GETDEL` command.

use crate::error::{AuthError, Result};
use crate::stores::KeyValueStore;
use chrono::Duration;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

/// Redis key-value store.
///
/// Provides connection pooling via `ConnectionManager`; cloning the store
/// clones the managed connection handle.
pub struct RedisKeyValueStore {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
}

impl RedisKeyValueStore {
    /// Create a new Redis store.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "<redis://127.0.0.1:6379>")
    ///
    /// # Errors
    ///
    /// Returns error if connection to Redis fails.
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| AuthError::Storage(format!("Failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            AuthError::Storage(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self { conn_manager })
    }

    /// Clamp a TTL to whole seconds, minimum one.
    #[allow(clippy::cast_sign_loss)]
    fn ttl_seconds(ttl: Duration) -> u64 {
        ttl.num_seconds().max(1) as u64
    }
}

impl Clone for RedisKeyValueStore {
    fn clone(&self) -> Self {
        Self {
            conn_manager: self.conn_manager.clone(),
        }
    }
}

impl KeyValueStore for RedisKeyValueStore {
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn
            .set_ex(key, value, Self::ttl_seconds(ttl))
            .await
            .map_err(|e| AuthError::Storage(format!("Failed to store value: {e}")))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn_manager.clone();
        conn.get(key)
            .await
            .map_err(|e| AuthError::Storage(format!("Failed to get value: {e}")))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let _: () = conn
            .del(key)
            .await
            .map_err(|e| AuthError::Storage(format!("Failed to delete value: {e}")))?;
        Ok(())
    }

    // GETDEL is atomic: get + delete in one operation, so two concurrent
    // consumers cannot both observe the value.
    async fn take(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn_manager.clone();
        conn.get_del(key)
            .await
            .map_err(|e| AuthError::Storage(format!("Failed to consume value: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn put_get_delete_lifecycle() {
        let store = RedisKeyValueStore::new("redis://127.0.0.1:6379")
            .await
            .unwrap();

        store
            .put("docbridge-test:lifecycle", b"value", Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(
            store.get("docbridge-test:lifecycle").await.unwrap(),
            Some(b"value".to_vec())
        );

        store.delete("docbridge-test:lifecycle").await.unwrap();
        assert_eq!(store.get("docbridge-test:lifecycle").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    #[allow(clippy::unwrap_used)]
    async fn take_is_single_use() {
        let store = RedisKeyValueStore::new("redis://127.0.0.1:6379")
            .await
            .unwrap();

        store
            .put("docbridge-test:take", b"once", Duration::minutes(1))
            .await
            .unwrap();

        assert_eq!(
            store.take("docbridge-test:take").await.unwrap(),
            Some(b"once".to_vec())
        );
        assert_eq!(store.take("docbridge-test:take").await.unwrap(), None);
    }
}
