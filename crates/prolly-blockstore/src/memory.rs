//! In-memory block store for testing and ephemeral trees

use crate::{verify_block, BlockStore, BlockStoreError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

/// An in-memory block store
#[derive(Clone, Default)]
pub struct MemoryBlockStore {
    blocks: Arc<DashMap<Cid, Bytes>>,
}

impl MemoryBlockStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self {
            blocks: Arc::new(DashMap::new()),
        }
    }

    /// Get the number of blocks stored
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get total size of all blocks
    pub fn total_size(&self) -> u64 {
        self.blocks.iter().map(|entry| entry.value().len() as u64).sum()
    }

    /// List all CIDs
    pub fn list_cids(&self) -> Vec<Cid> {
        self.blocks.iter().map(|entry| *entry.key()).collect()
    }
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn put_keyed(&self, cid: &Cid, data: &[u8]) -> Result<()> {
        verify_block(cid, data)?;
        if self.blocks.contains_key(cid) {
            trace!(%cid, "block already present");
            return Ok(());
        }
        self.blocks.insert(*cid, Bytes::copy_from_slice(data));
        Ok(())
    }

    async fn get_block(&self, cid: &Cid) -> Result<Bytes> {
        self.blocks
            .get(cid)
            .map(|entry| entry.value().clone())
            .ok_or(BlockStoreError::NotFound(*cid))
    }

    async fn has_block(&self, cid: &Cid) -> Result<bool> {
        Ok(self.blocks.contains_key(cid))
    }

    async fn block_size(&self, cid: &Cid) -> Result<u64> {
        self.blocks
            .get(cid)
            .map(|entry| entry.value().len() as u64)
            .ok_or(BlockStoreError::NotFound(*cid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_cid, CidCodec, CidPrefix};

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryBlockStore::new();

        let data = b"Hello, World!";
        let cid = store.put_block(data).await.unwrap();

        assert!(store.has_block(&cid).await.unwrap());
        assert_eq!(store.block_size(&cid).await.unwrap(), data.len() as u64);

        let retrieved = store.get_block(&cid).await.unwrap();
        assert_eq!(data.as_slice(), retrieved.as_ref());
    }

    #[tokio::test]
    async fn test_memory_store_not_found() {
        let store = MemoryBlockStore::new();
        let fake_cid = create_cid(b"not stored", CidCodec::Raw);

        let result = store.get_block(&fake_cid).await;
        assert!(matches!(result, Err(BlockStoreError::NotFound(_))));
        assert!(!store.has_block(&fake_cid).await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_idempotent_put() {
        let store = MemoryBlockStore::new();

        let first = store.put_block(b"same").await.unwrap();
        let second = store.put_block(b"same").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_prefix() {
        let store = MemoryBlockStore::new();

        let raw = store.put_block(b"payload").await.unwrap();
        let cbor = store
            .put_block_with_prefix(b"payload", &CidPrefix::dag_cbor())
            .await
            .unwrap();

        assert_ne!(raw, cbor);
        assert_eq!(store.len(), 2);
        assert_eq!(store.total_size(), 14);
        assert_eq!(store.list_cids().len(), 2);
    }

    #[tokio::test]
    async fn test_memory_store_accepts_large_block() {
        let store = MemoryBlockStore::new();
        let data = vec![7u8; 3 * 1024 * 1024];

        let cid = store.put_block(&data).await.unwrap();
        assert_eq!(store.block_size(&cid).await.unwrap(), data.len() as u64);
        assert_eq!(store.get_block(&cid).await.unwrap().as_ref(), data.as_slice());
    }

    #[tokio::test]
    async fn test_memory_store_rejects_mismatched_bytes() {
        let store = MemoryBlockStore::new();
        let cid = create_cid(b"real bytes", CidCodec::Raw);

        let result = store.put_keyed(&cid, b"other bytes").await;
        assert!(matches!(result, Err(BlockStoreError::HashMismatch { .. })));
        assert!(store.is_empty());
    }
}
