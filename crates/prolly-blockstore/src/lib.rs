//! # Prolly Blockstore
//!
//! Content-addressed block storage underneath the prolly-store node store.
//!
//! This crate provides:
//! - **Block operations**: Put and get immutable blocks keyed by CID
//! - **CID generation**: Configurable version, codec and multihash via [`CidPrefix`]
//! - **Backends**: In-memory and sharded-filesystem stores
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Node Store (prolly-core)         │
//! ├─────────────────────────────────────────┤
//! │           BlockStore Trait              │
//! ├────────────────────┬────────────────────┤
//! │  MemoryBlockStore  │    FsBlockStore    │
//! └────────────────────┴────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use prolly_blockstore::{BlockStore, MemoryBlockStore};
//!
//! let store = MemoryBlockStore::new();
//! let cid = store.put_block(&data).await?;
//! let retrieved = store.get_block(&cid).await?;
//! ```
//!
//! Blocks are never deleted through this interface; reclaiming unreferenced
//! blocks is left to whoever owns the backing storage.

pub mod cid_utils;
pub mod error;
pub mod fs;
pub mod memory;

pub use cid_utils::{
    create_cid, parse_cid, verify_block, verify_cid, CidCodec, CidPrefix, CidVersion, HashCode,
};
pub use error::{BlockStoreError, Result};
pub use fs::FsBlockStore;
pub use memory::MemoryBlockStore;

pub use cid::Cid;

use async_trait::async_trait;
use bytes::Bytes;

/// Trait for block storage backends
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Store bytes under a CID the caller already computed.
    ///
    /// Fails with `HashMismatch` when `data` does not hash to `cid`. Storing a
    /// CID that is already present is a no-op. Block size is not limited.
    async fn put_keyed(&self, cid: &Cid, data: &[u8]) -> Result<()>;

    /// Retrieve a block by CID
    async fn get_block(&self, cid: &Cid) -> Result<Bytes>;

    /// Check if a block exists
    async fn has_block(&self, cid: &Cid) -> Result<bool>;

    /// Get block size without retrieving content
    async fn block_size(&self, cid: &Cid) -> Result<u64>;

    /// Store a block under the CID derived from `prefix`
    async fn put_block_with_prefix(&self, data: &[u8], prefix: &CidPrefix) -> Result<Cid> {
        let cid = prefix.to_cid(data)?;
        self.put_keyed(&cid, data).await?;
        Ok(cid)
    }

    /// Store a raw block and return its CID
    async fn put_block(&self, data: &[u8]) -> Result<Cid> {
        self.put_block_with_prefix(data, &CidPrefix::raw()).await
    }
}
