use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Injected key-value storage capability.
///
/// The visit log lives under a single named entry, so a `put` replaces the
/// whole serialized blob in one write — readers never observe a partial
/// record, only the state just before or just after a given save.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Initialize the storage (create schema, etc.)
    async fn init(&self) -> Result<()>;

    /// Fetch the value stored under `key`, if any
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the value stored under `key`
    async fn put(&self, key: &str, value: &str) -> StoreResult<()>;
}
