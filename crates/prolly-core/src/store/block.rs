//! Pass-through node store over a block store

use super::NodeStore;
use crate::codec;
use crate::prolly::{ProllyNode, ProllyTree, Proof, TreeConfig};
use crate::{CoreError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use prolly_blockstore::{BlockStore, CidPrefix};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Encodes objects to DAG-CBOR and stores them in a [`BlockStore`].
///
/// Holds no state of its own; caching, if any, belongs to a wrapper.
pub struct BlockNodeStore<S: BlockStore> {
    blocks: Arc<S>,
}

impl<S: BlockStore> BlockNodeStore<S> {
    pub fn new(blocks: Arc<S>) -> Self {
        Self { blocks }
    }

    /// The underlying block store
    pub fn blocks(&self) -> &Arc<S> {
        &self.blocks
    }

    async fn put(&self, bytes: &[u8], prefix: Option<&CidPrefix>) -> Result<Cid> {
        let prefix = prefix.copied().unwrap_or_default();
        Ok(self.blocks.put_block_with_prefix(bytes, &prefix).await?)
    }

    async fn get(&self, cid: &Cid) -> Result<Bytes> {
        Ok(self.blocks.get_block(cid).await?)
    }
}

#[async_trait]
impl<S: BlockStore> NodeStore for BlockNodeStore<S> {
    #[instrument(skip(self, node, prefix), fields(items = node.item_count(), leaf = node.is_leaf()))]
    async fn write_node(&self, node: &ProllyNode, prefix: Option<&CidPrefix>) -> Result<Cid> {
        if node.is_empty() {
            return Err(CoreError::Serialization(
                "refusing to persist an empty node".into(),
            ));
        }
        if node.has_duplicate_keys() {
            return Err(CoreError::Serialization(
                "refusing to persist a node with duplicate keys".into(),
            ));
        }
        let bytes = codec::encode_node(node)?;
        let cid = self.put(&bytes, prefix).await?;
        debug!(%cid, size = bytes.len(), "wrote node");
        Ok(cid)
    }

    #[instrument(skip(self))]
    async fn read_node(&self, cid: &Cid) -> Result<Arc<ProllyNode>> {
        let bytes = self.get(cid).await?;
        Ok(Arc::new(codec::decode_node(&bytes)?))
    }

    #[instrument(skip(self, tree, prefix))]
    async fn write_tree(&self, tree: &ProllyTree, prefix: Option<&CidPrefix>) -> Result<Cid> {
        let bytes = codec::encode(tree)?;
        let cid = self.put(&bytes, prefix).await?;
        debug!(%cid, root = ?tree.root(), "wrote tree root");
        Ok(cid)
    }

    #[instrument(skip(self))]
    async fn read_tree(&self, cid: &Cid) -> Result<ProllyTree> {
        let bytes = self.get(cid).await?;
        let tree: ProllyTree = codec::decode(&bytes)?;
        Ok(tree.with_tree_cid(*cid))
    }

    #[instrument(skip(self, config, prefix))]
    async fn write_tree_config(&self, config: &TreeConfig, prefix: Option<&CidPrefix>) -> Result<Cid> {
        let bytes = codec::encode(config)?;
        self.put(&bytes, prefix).await
    }

    #[instrument(skip(self))]
    async fn read_tree_config(&self, cid: &Cid) -> Result<TreeConfig> {
        let bytes = self.get(cid).await?;
        codec::decode(&bytes)
    }

    #[instrument(skip(self, proof, prefix), fields(depth = proof.depth()))]
    async fn write_proof(&self, proof: &Proof, prefix: Option<&CidPrefix>) -> Result<Cid> {
        let bytes = codec::encode(proof)?;
        self.put(&bytes, prefix).await
    }

    #[instrument(skip(self))]
    async fn read_proof(&self, cid: &Cid) -> Result<Proof> {
        let bytes = self.get(cid).await?;
        codec::decode(&bytes)
    }

    fn close(&self) {
        debug!("closed block node store");
    }
}
