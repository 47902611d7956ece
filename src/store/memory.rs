use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::store::{KeyValueStore, StoreResult};

/// In-process store backed by a plain map.
///
/// This is the environment-agnostic fake the recorder and aggregator are
/// tested against; it is also a usable backend for ephemeral deployments.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_put_roundtrip() {
        let store = MemoryStore::new();
        store.init().await.unwrap();

        assert!(store.get("missing").await.unwrap().is_none());

        store.put("k", "v1").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v1"));

        // A put replaces the whole value
        store.put("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }
}
