//! Content-addressed node store
//!
//! Nodes, tree roots, tree configs and proofs are persisted as immutable
//! DAG-CBOR blocks keyed by their own CID. Nothing stored is ever mutated, so
//! concurrent writers of the same content converge on the same id without
//! coordination.
//!
//! Two shapes share the [`NodeStore`] interface:
//! - [`BlockNodeStore`] encodes and hashes straight into a [`BlockStore`]
//! - [`CachedNodeStore`] wraps any node store with a bounded LRU of decoded
//!   objects. The cache is derived state: clearing or disabling it never
//!   changes what a read returns.

mod block;
mod cached;

pub use block::BlockNodeStore;
pub use cached::CachedNodeStore;

use crate::prolly::{ProllyNode, ProllyTree, Proof, TreeConfig};
use crate::Result;
use async_trait::async_trait;
use cid::Cid;
use prolly_blockstore::{BlockStore, CidPrefix};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of decoded objects kept by the cache
pub const DEFAULT_CACHE_SIZE: usize = 1 << 14;

/// Persistence for tree objects.
///
/// `prefix` selects the hashing options for a write; `None` means
/// [`CidPrefix::default()`]. Writes are durable once they return. Reads fail
/// with `NotFound` when no block exists and with `Decode` when the block does
/// not hold the requested kind of object.
#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn write_node(&self, node: &ProllyNode, prefix: Option<&CidPrefix>) -> Result<Cid>;

    async fn read_node(&self, cid: &Cid) -> Result<Arc<ProllyNode>>;

    async fn write_tree(&self, tree: &ProllyTree, prefix: Option<&CidPrefix>) -> Result<Cid>;

    /// Read a tree root; the returned handle remembers `cid` as its origin
    async fn read_tree(&self, cid: &Cid) -> Result<ProllyTree>;

    async fn write_tree_config(&self, config: &TreeConfig, prefix: Option<&CidPrefix>) -> Result<Cid>;

    async fn read_tree_config(&self, cid: &Cid) -> Result<TreeConfig>;

    async fn write_proof(&self, proof: &Proof, prefix: Option<&CidPrefix>) -> Result<Cid>;

    async fn read_proof(&self, cid: &Cid) -> Result<Proof>;

    /// Release in-process resources. Persisted data is untouched.
    fn close(&self);
}

#[async_trait]
impl<N: NodeStore + ?Sized> NodeStore for Arc<N> {
    async fn write_node(&self, node: &ProllyNode, prefix: Option<&CidPrefix>) -> Result<Cid> {
        (**self).write_node(node, prefix).await
    }

    async fn read_node(&self, cid: &Cid) -> Result<Arc<ProllyNode>> {
        (**self).read_node(cid).await
    }

    async fn write_tree(&self, tree: &ProllyTree, prefix: Option<&CidPrefix>) -> Result<Cid> {
        (**self).write_tree(tree, prefix).await
    }

    async fn read_tree(&self, cid: &Cid) -> Result<ProllyTree> {
        (**self).read_tree(cid).await
    }

    async fn write_tree_config(&self, config: &TreeConfig, prefix: Option<&CidPrefix>) -> Result<Cid> {
        (**self).write_tree_config(config, prefix).await
    }

    async fn read_tree_config(&self, cid: &Cid) -> Result<TreeConfig> {
        (**self).read_tree_config(cid).await
    }

    async fn write_proof(&self, proof: &Proof, prefix: Option<&CidPrefix>) -> Result<Cid> {
        (**self).write_proof(proof, prefix).await
    }

    async fn read_proof(&self, cid: &Cid) -> Result<Proof> {
        (**self).read_proof(cid).await
    }

    fn close(&self) {
        (**self).close()
    }
}

/// Node store settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Number of decoded objects to cache; 0 disables the cache
    pub cache_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
        }
    }
}

impl StoreConfig {
    /// Store with the cache disabled
    pub fn uncached() -> Self {
        Self { cache_size: 0 }
    }

    /// Load from `PROLLY_STORE_*` environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        Self::from_env_prefix("PROLLY_STORE")
    }

    /// Load from `<prefix>_*` environment variables over the defaults
    pub fn from_env_prefix(prefix: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Open a node store over `blocks`, cached when `config.cache_size > 0`
pub fn open_node_store<S>(blocks: Arc<S>, config: &StoreConfig) -> Arc<dyn NodeStore>
where
    S: BlockStore + 'static,
{
    let base = BlockNodeStore::new(blocks);
    if config.cache_size == 0 {
        Arc::new(base)
    } else {
        Arc::new(CachedNodeStore::new(base, config.cache_size))
    }
}
