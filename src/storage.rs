use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

/// Key/value backend for persisted feed entries. Writes replace the whole value.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_cache(&self, key: &str) -> Result<Option<String>>;
    async fn put_cache(&self, key: &str, payload: &str, written_at: i64) -> Result<()>;
}

/// In-process storage. Used by embedders without a database and by tests.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.entries.lock().map(|m| m.len()).unwrap_or(0) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_cache(&self, key: &str) -> Result<Option<String>> {
        let map = self.entries.lock().map_err(|_| anyhow!("memory storage poisoned"))?;
        Ok(map.get(key).cloned())
    }

    async fn put_cache(&self, key: &str, payload: &str, _written_at: i64) -> Result<()> {
        let mut map = self.entries.lock().map_err(|_| anyhow!("memory storage poisoned"))?;
        map.insert(key.to_string(), payload.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_replaces_whole_value() {
        let s = MemoryStorage::new();
        assert!(s.get_cache("k").await.unwrap().is_none());
        s.put_cache("k", "one", 1).await.unwrap();
        s.put_cache("k", "two", 2).await.unwrap();
        assert_eq!(s.get_cache("k").await.unwrap().as_deref(), Some("two"));
        assert_eq!(s.len(), 1);
    }
}
