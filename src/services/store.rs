//! Object store contract.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::error::StoreError;

/// Narrow object store contract: existence check and fetch.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn head_exists(&self, container: &str, key: &str) -> Result<bool, StoreError>;

    async fn get(&self, container: &str, key: &str) -> Result<Bytes, StoreError>;
}

/// In-process store for local runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    objects: DashMap<(String, String), Bytes>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, container: &str, key: &str, data: Bytes) {
        self.objects
            .insert((container.to_string(), key.to_string()), data);
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn head_exists(&self, container: &str, key: &str) -> Result<bool, StoreError> {
        Ok(self
            .objects
            .contains_key(&(container.to_string(), key.to_string())))
    }

    async fn get(&self, container: &str, key: &str) -> Result<Bytes, StoreError> {
        self.objects
            .get(&(container.to_string(), key.to_string()))
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            })
    }
}
