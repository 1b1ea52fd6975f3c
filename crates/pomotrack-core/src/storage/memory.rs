use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::Store;
use crate::error::StorageError;

/// In-process store. Clones share the same map, so a test can keep one
/// handle to inspect what the engine wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing values.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::default();
        {
            let mut inner = store.lock();
            inner.values = values.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        }
        store
    }

    /// Make every later `set` fail. Reads keep working.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Synchronous peek for assertions.
    pub fn value(&self, key: &str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(StorageError::Unavailable(format!("write to '{key}' refused")));
        }
        inner.values.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_set_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.unwrap().is_none());
        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn clones_share_values() {
        let store = MemoryStore::with_values([("a", "1")]);
        let other = store.clone();
        other.set("b", "2").await.unwrap();
        assert_eq!(store.value("a").as_deref(), Some("1"));
        assert_eq!(store.value("b").as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn failing_writes_keep_old_value() {
        let store = MemoryStore::with_values([("a", "1")]);
        store.fail_writes(true);
        assert!(store.set("a", "2").await.is_err());
        assert_eq!(store.value("a").as_deref(), Some("1"));
    }
}
