//! In-memory key-value store for tests.
//!
//! Honors TTLs by checking expiry on every read, so TTL-dependent behavior
//! can be exercised at memory speed. Not for production use: nothing here
//! survives a restart.

use crate::error::Result;
use crate::stores::KeyValueStore;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

struct StoredEntry {
    value: Vec<u8>,
    expires_at: DateTime<Utc>,
}

/// In-memory [`KeyValueStore`].
///
/// Cloning shares the underlying map, mirroring how a real backend is a
/// shared resource across request handling.
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<HashMap<String, StoredEntry>>>,
}

impl MemoryKeyValueStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries. Test helper.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }

    /// Whether the store holds no live entries. Test helper.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.entries.lock().await.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_vec(),
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.lock().await;
        match entries.remove(key) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(entry.value)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn expired_entries_are_invisible() {
        let store = MemoryKeyValueStore::new();
        store
            .put("k", b"v", Duration::milliseconds(20))
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn take_removes_the_entry() {
        let store = MemoryKeyValueStore::new();
        store.put("k", b"v", Duration::minutes(1)).await.unwrap();

        assert_eq!(store.take("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.take("k").await.unwrap(), None);
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn clones_share_state() {
        let store = MemoryKeyValueStore::new();
        let alias = store.clone();

        store.put("k", b"v", Duration::minutes(1)).await.unwrap();
        assert_eq!(alias.get("k").await.unwrap(), Some(b"v".to_vec()));
    }
}
