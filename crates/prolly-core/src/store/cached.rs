//! LRU-cached wrapper around any node store

use super::NodeStore;
use crate::prolly::{ProllyNode, ProllyTree, Proof, TreeConfig};
use crate::Result;
use async_trait::async_trait;
use cid::Cid;
use lru::LruCache;
use parking_lot::Mutex;
use prolly_blockstore::CidPrefix;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Clone)]
enum CachedObject {
    Node(Arc<ProllyNode>),
    Tree(ProllyTree),
    Config(TreeConfig),
    Proof(Proof),
}

/// Caches decoded objects by CID in front of another node store.
///
/// A CID always names the same immutable bytes, so entries can never go
/// stale and need no invalidation. Writes reach the inner store before the
/// cache is touched; populating the cache is best-effort and callers must not
/// rely on it. Evicting an entry never deletes anything from the inner store.
pub struct CachedNodeStore<N: NodeStore> {
    inner: N,
    cache: Option<Mutex<LruCache<Cid, CachedObject>>>,
    closed: AtomicBool,
}

impl<N: NodeStore> CachedNodeStore<N> {
    /// Wrap `inner` with room for `capacity` objects; 0 disables caching
    pub fn new(inner: N, capacity: usize) -> Self {
        Self {
            inner,
            cache: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            closed: AtomicBool::new(false),
        }
    }

    /// The wrapped store
    pub fn inner(&self) -> &N {
        &self.inner
    }

    /// Number of cached objects
    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.lock().len())
    }

    /// Drop every cached object
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().clear();
        }
    }

    fn lookup(&self, cid: &Cid) -> Option<CachedObject> {
        let hit = self.cache.as_ref()?.lock().get(cid).cloned();
        trace!(%cid, hit = hit.is_some(), "cache lookup");
        hit
    }

    fn populate(&self, cid: Cid, object: CachedObject) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if let Some(cache) = &self.cache {
            cache.lock().put(cid, object);
        }
    }
}

#[async_trait]
impl<N: NodeStore> NodeStore for CachedNodeStore<N> {
    async fn write_node(&self, node: &ProllyNode, prefix: Option<&CidPrefix>) -> Result<Cid> {
        let cid = self.inner.write_node(node, prefix).await?;
        self.populate(cid, CachedObject::Node(Arc::new(node.clone())));
        Ok(cid)
    }

    async fn read_node(&self, cid: &Cid) -> Result<Arc<ProllyNode>> {
        if let Some(CachedObject::Node(node)) = self.lookup(cid) {
            return Ok(node);
        }
        let node = self.inner.read_node(cid).await?;
        self.populate(*cid, CachedObject::Node(Arc::clone(&node)));
        Ok(node)
    }

    async fn write_tree(&self, tree: &ProllyTree, prefix: Option<&CidPrefix>) -> Result<Cid> {
        let cid = self.inner.write_tree(tree, prefix).await?;
        self.populate(cid, CachedObject::Tree(tree.clone()));
        Ok(cid)
    }

    async fn read_tree(&self, cid: &Cid) -> Result<ProllyTree> {
        if let Some(CachedObject::Tree(tree)) = self.lookup(cid) {
            return Ok(tree.with_tree_cid(*cid));
        }
        let tree = self.inner.read_tree(cid).await?;
        self.populate(*cid, CachedObject::Tree(tree.clone()));
        Ok(tree)
    }

    async fn write_tree_config(&self, config: &TreeConfig, prefix: Option<&CidPrefix>) -> Result<Cid> {
        let cid = self.inner.write_tree_config(config, prefix).await?;
        self.populate(cid, CachedObject::Config(config.clone()));
        Ok(cid)
    }

    async fn read_tree_config(&self, cid: &Cid) -> Result<TreeConfig> {
        if let Some(CachedObject::Config(config)) = self.lookup(cid) {
            return Ok(config);
        }
        let config = self.inner.read_tree_config(cid).await?;
        self.populate(*cid, CachedObject::Config(config.clone()));
        Ok(config)
    }

    async fn write_proof(&self, proof: &Proof, prefix: Option<&CidPrefix>) -> Result<Cid> {
        let cid = self.inner.write_proof(proof, prefix).await?;
        self.populate(cid, CachedObject::Proof(proof.clone()));
        Ok(cid)
    }

    async fn read_proof(&self, cid: &Cid) -> Result<Proof> {
        if let Some(CachedObject::Proof(proof)) = self.lookup(cid) {
            return Ok(proof);
        }
        let proof = self.inner.read_proof(cid).await?;
        self.populate(*cid, CachedObject::Proof(proof.clone()));
        Ok(proof)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.clear_cache();
        debug!("closed cached node store");
        self.inner.close();
    }
}
