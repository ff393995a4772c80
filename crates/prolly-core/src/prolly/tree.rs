//! Prolly Tree roots and the operations that walk them
//!
//! A [`ProllyTree`] is just two CIDs: the root node and the config. Every
//! operation reads nodes through a [`NodeStore`]; every change writes new nodes
//! and yields a new handle. Existing nodes are never touched.

use super::diff::diff_sorted;
use super::{
    BoundaryHasher, CompareFn, KeyValueChange, Mutations, Proof, ProofSegment, ProllyNode,
    TreeConfig,
};
use crate::store::NodeStore;
use crate::{codec, CoreError, Result};
use cid::Cid;
use ipld_core::ipld::Ipld;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A key-value pair
pub type Entry = (Vec<u8>, Ipld);

/// Handle to one version of a tree.
///
/// `root` is `None` for an empty tree; empty nodes are never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProllyTree {
    root: Option<Cid>,
    config: Cid,
    /// CID this handle was read from, if any
    #[serde(skip)]
    tree_cid: Option<Cid>,
}

impl PartialEq for ProllyTree {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.config == other.config
    }
}

impl Eq for ProllyTree {}

/// Link to a finished node, as seen from its parent
struct ChildRef {
    key: Vec<u8>,
    cid: Cid,
    count: u32,
}

impl ProllyTree {
    pub fn new(root: Option<Cid>, config: Cid) -> Self {
        Self {
            root,
            config,
            tree_cid: None,
        }
    }

    pub(crate) fn with_tree_cid(mut self, cid: Cid) -> Self {
        self.tree_cid = Some(cid);
        self
    }

    /// Root node CID, `None` for an empty tree
    pub fn root(&self) -> Option<&Cid> {
        self.root.as_ref()
    }

    /// Config CID
    pub fn config(&self) -> &Cid {
        &self.config
    }

    /// CID this handle was read from. Compare it with the id of a fresh
    /// write to detect concurrent updates.
    pub fn tree_cid(&self) -> Option<&Cid> {
        self.tree_cid.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Read a tree handle by CID
    pub async fn load<S: NodeStore + ?Sized>(store: &S, cid: &Cid) -> Result<Self> {
        store.read_tree(cid).await
    }

    /// Persist this handle and return its CID
    pub async fn write<S: NodeStore + ?Sized>(&self, store: &S) -> Result<Cid> {
        store.write_tree(self, None).await
    }

    /// Read this tree's config
    pub async fn load_config<S: NodeStore + ?Sized>(&self, store: &S) -> Result<TreeConfig> {
        store.read_tree_config(&self.config).await
    }

    /// Look up the value stored for `key`
    #[instrument(skip(self, store, key), fields(key_len = key.len()))]
    pub async fn get<S: NodeStore + ?Sized>(&self, store: &S, key: &[u8]) -> Result<Option<Ipld>> {
        Ok(self.descend(store, key).await?.value)
    }

    /// Build a proof of presence or absence for `key`
    #[instrument(skip(self, store, key), fields(key_len = key.len()))]
    pub async fn prove<S: NodeStore + ?Sized>(&self, store: &S, key: &[u8]) -> Result<Proof> {
        self.descend(store, key).await
    }

    async fn descend<S: NodeStore + ?Sized>(&self, store: &S, key: &[u8]) -> Result<Proof> {
        let mut proof = Proof {
            key: key.to_vec(),
            value: None,
            path: Vec::new(),
        };
        let Some(mut cid) = self.root else {
            return Ok(proof);
        };
        let compare = self.load_config(store).await?.comparator.compare_fn();

        loop {
            let node = read_ordered(store, &cid, compare).await?;
            let idx = node.key_index(key, compare);
            proof.path.push(ProofSegment {
                node: cid,
                index: idx as u32,
            });

            if node.is_leaf() {
                if compare(node.key_at(idx)?, key) == Ordering::Equal {
                    proof.value = Some(node.value_at(idx)?.clone());
                }
                return Ok(proof);
            }
            cid = *node.link_at(idx)?;
        }
    }

    /// The pair at position `n` in key order, found through subtree counts
    #[instrument(skip(self, store))]
    pub async fn get_nth<S: NodeStore + ?Sized>(&self, store: &S, n: u64) -> Result<Option<Entry>> {
        let Some(mut cid) = self.root else {
            return Ok(None);
        };
        let compare = self.load_config(store).await?.comparator.compare_fn();
        let mut remaining = n;

        loop {
            let node = read_ordered(store, &cid, compare).await?;
            if node.is_leaf() {
                let idx = match usize::try_from(remaining) {
                    Ok(idx) if idx < node.item_count() => idx,
                    _ => return Ok(None),
                };
                return Ok(Some((node.key_at(idx)?.to_vec(), node.value_at(idx)?.clone())));
            }

            let mut next = None;
            for i in 0..node.item_count() {
                let count = u64::from(node.subtree_count_at(i)?);
                if remaining < count {
                    next = Some(*node.link_at(i)?);
                    break;
                }
                remaining -= count;
            }
            match next {
                Some(child) => cid = child,
                None => return Ok(None),
            }
        }
    }

    /// Number of pairs in the tree
    pub async fn len<S: NodeStore + ?Sized>(&self, store: &S) -> Result<u64> {
        match &self.root {
            Some(cid) => Ok(store.read_node(cid).await?.total_pair_count()),
            None => Ok(0),
        }
    }

    /// All pairs in key order
    pub async fn entries<S: NodeStore + ?Sized>(&self, store: &S) -> Result<Vec<Entry>> {
        if self.root.is_none() {
            return Ok(Vec::new());
        }
        let compare = self.load_config(store).await?.comparator.compare_fn();
        self.entries_with(store, compare).await
    }

    async fn entries_with<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        compare: CompareFn,
    ) -> Result<Vec<Entry>> {
        let mut result = Vec::new();
        let mut stack: Vec<Cid> = self.root.into_iter().collect();

        while let Some(cid) = stack.pop() {
            let node = read_ordered(store, &cid, compare).await?;
            collect_node(&node, &mut result, &mut stack)?;
        }
        Ok(result)
    }

    /// CIDs of every leaf, left to right. Reads internal nodes and a single leaf.
    pub async fn leaf_cids<S: NodeStore + ?Sized>(&self, store: &S) -> Result<Vec<Cid>> {
        let Some(root) = self.root else {
            return Ok(Vec::new());
        };
        let compare = self.load_config(store).await?.comparator.compare_fn();
        let mut level = vec![root];
        let mut nodes = vec![read_ordered(store, &root, compare).await?];

        loop {
            if nodes.first().map_or(true, |node| node.is_leaf()) {
                return Ok(level);
            }
            let mut next = Vec::new();
            for node in &nodes {
                next.extend_from_slice(node.links().unwrap_or_default());
            }
            let first = match next.first() {
                Some(cid) => read_ordered(store, cid, compare).await?,
                None => return Ok(Vec::new()),
            };
            if first.is_leaf() {
                return Ok(next);
            }
            nodes = Vec::with_capacity(next.len());
            nodes.push(first);
            for cid in &next[1..] {
                nodes.push(read_ordered(store, cid, compare).await?);
            }
            level = next;
        }
    }

    /// Apply a batch and return the new version.
    ///
    /// The batch is drained in key order alongside the existing pairs. Add and
    /// Modify upsert; removing an absent key is a no-op. Ranges the batch does
    /// not touch chunk exactly as before, so their nodes are shared with this
    /// version.
    #[instrument(skip(self, store, mutations), fields(batch = mutations.len()))]
    pub async fn mutate<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        mut mutations: Mutations,
    ) -> Result<ProllyTree> {
        let config = self.load_config(store).await?;
        if mutations.comparator() != config.comparator {
            return Err(CoreError::Configuration(format!(
                "batch ordered by {:?} but tree by {:?}",
                mutations.comparator(),
                config.comparator
            )));
        }
        let compare = config.comparator.compare_fn();

        let existing = self.entries_with(store, compare).await?;
        let mut merged = Vec::with_capacity(existing.len() + mutations.len());
        let mut existing = existing.into_iter().peekable();

        loop {
            let mutation = match mutations.next_mutation() {
                Ok(mutation) => mutation,
                Err(CoreError::Exhausted) => break,
                Err(err) => return Err(err),
            };
            while let Some((key, _)) = existing.peek() {
                match compare(key, mutation.key()) {
                    Ordering::Less => merged.extend(existing.next()),
                    Ordering::Equal => {
                        existing.next();
                        break;
                    }
                    Ordering::Greater => break,
                }
            }
            let (key, value) = mutation.into_parts();
            if let Some(value) = value {
                merged.push((key, value));
            }
        }
        merged.extend(existing);

        let root = TreeBuilder::new(store, config).build_sorted(merged).await?;
        debug!(?root, "applied mutation batch");
        Ok(ProllyTree::new(root, self.config))
    }

    /// Changes that turn this tree into `other`, in key order.
    ///
    /// Leaves present in both trees are skipped without being read.
    #[instrument(skip(self, store, other))]
    pub async fn diff<S: NodeStore + ?Sized>(
        &self,
        store: &S,
        other: &ProllyTree,
    ) -> Result<Vec<KeyValueChange>> {
        if self.root == other.root {
            return Ok(Vec::new());
        }
        let config = self.load_config(store).await?;
        let other_config = other.load_config(store).await?;
        if config.comparator != other_config.comparator {
            return Err(CoreError::Configuration(
                "cannot diff trees with different key orders".into(),
            ));
        }

        let base_leaves = self.leaf_cids(store).await?;
        let other_leaves = other.leaf_cids(store).await?;
        let base_set: HashSet<&Cid> = base_leaves.iter().collect();
        let other_set: HashSet<&Cid> = other_leaves.iter().collect();

        let compare = config.comparator.compare_fn();
        let base_only = base_leaves.iter().filter(|c| !other_set.contains(c));
        let other_only = other_leaves.iter().filter(|c| !base_set.contains(c));
        let base = read_leaves(store, base_only, compare).await?;
        let changed = read_leaves(store, other_only, compare).await?;

        Ok(diff_sorted(base, changed, compare))
    }
}

/// Read a node and reject it unless its keys are strictly increasing under `compare`
async fn read_ordered<S: NodeStore + ?Sized>(
    store: &S,
    cid: &Cid,
    compare: CompareFn,
) -> Result<Arc<ProllyNode>> {
    let node = store.read_node(cid).await?;
    node.check_key_order(compare)?;
    Ok(node)
}

fn collect_node(node: &ProllyNode, result: &mut Vec<Entry>, stack: &mut Vec<Cid>) -> Result<()> {
    if node.is_leaf() {
        for i in 0..node.item_count() {
            result.push((node.key_at(i)?.to_vec(), node.value_at(i)?.clone()));
        }
    } else {
        stack.extend(node.links().unwrap_or_default().iter().rev().copied());
    }
    Ok(())
}

async fn read_leaves<'a, S, I>(store: &S, cids: I, compare: CompareFn) -> Result<Vec<Entry>>
where
    S: NodeStore + ?Sized,
    I: Iterator<Item = &'a Cid>,
{
    let mut result = Vec::new();
    let mut unused = Vec::new();
    for cid in cids {
        let node = read_ordered(store, cid, compare).await?;
        collect_node(&node, &mut result, &mut unused)?;
    }
    Ok(result)
}

/// Builds a tree bottom-up from pairs, cutting nodes where the config's
/// boundary rule says.
pub struct TreeBuilder<'a, S: NodeStore + ?Sized> {
    store: &'a S,
    config: TreeConfig,
}

impl<'a, S: NodeStore + ?Sized> TreeBuilder<'a, S> {
    pub fn new(store: &'a S, config: TreeConfig) -> Self {
        Self { store, config }
    }

    /// Build a tree from pairs in any order. Later duplicates win.
    #[instrument(skip(self, entries))]
    pub async fn build<I>(self, entries: I) -> Result<ProllyTree>
    where
        I: IntoIterator<Item = Entry>,
    {
        self.config.validate()?;
        let compare = self.config.comparator.compare_fn();

        let mut entries: Vec<Entry> = entries.into_iter().collect();
        entries.sort_by(|a, b| compare(&a.0, &b.0));
        let mut deduped: Vec<Entry> = Vec::with_capacity(entries.len());
        for entry in entries {
            match deduped.last_mut() {
                Some(last) if compare(&last.0, &entry.0) == Ordering::Equal => *last = entry,
                _ => deduped.push(entry),
            }
        }

        let config_cid = self.store.write_tree_config(&self.config, None).await?;
        let root = self.build_sorted(deduped).await?;
        Ok(ProllyTree::new(root, config_cid))
    }

    /// Build from pairs already sorted and duplicate-free
    async fn build_sorted(&self, entries: Vec<Entry>) -> Result<Option<Cid>> {
        self.config.validate()?;
        if entries.is_empty() {
            return Ok(None);
        }
        let hasher = BoundaryHasher::new(&self.config);
        let hash_values = hasher.uses_value();

        let total = entries.len();
        let mut refs = Vec::new();
        let mut keys = Vec::new();
        let mut values = Vec::new();
        for (i, (key, value)) in entries.into_iter().enumerate() {
            let encoded = if hash_values { codec::encode(&value)? } else { Vec::new() };
            let boundary = hasher.is_boundary(0, &key, &encoded, keys.len() + 1);
            keys.push(key);
            values.push(value);
            if boundary || i + 1 == total {
                let node = ProllyNode::leaf(std::mem::take(&mut keys), std::mem::take(&mut values))?;
                refs.push(self.write_child(node).await?);
            }
        }

        let mut level: u8 = 1;
        while refs.len() > 1 {
            let total = refs.len();
            let mut next = Vec::new();
            let (mut keys, mut links, mut counts) = (Vec::new(), Vec::new(), Vec::new());
            for (i, child) in refs.into_iter().enumerate() {
                let boundary = hasher.is_boundary(level, &child.key, &child.cid.to_bytes(), keys.len() + 1);
                keys.push(child.key);
                links.push(child.cid);
                counts.push(child.count);
                if boundary || i + 1 == total {
                    let node = ProllyNode::internal(
                        std::mem::take(&mut keys),
                        std::mem::take(&mut links),
                        std::mem::take(&mut counts),
                    )?;
                    next.push(self.write_child(node).await?);
                }
            }
            debug!(level, nodes = next.len(), "built tree level");
            refs = next;
            level = level.saturating_add(1);
        }

        Ok(refs.into_iter().next().map(|child| child.cid))
    }

    async fn write_child(&self, node: ProllyNode) -> Result<ChildRef> {
        node.check_key_order(self.config.comparator.compare_fn())
            .map_err(|err| CoreError::Serialization(err.to_string()))?;
        let count = u32::try_from(node.total_pair_count()).map_err(|_| {
            CoreError::Serialization("subtree holds more than u32::MAX pairs".into())
        })?;
        let key = node
            .last_key()
            .ok_or_else(|| CoreError::Serialization("refusing to persist an empty node".into()))?
            .to_vec();
        let cid = self
            .store
            .write_node(&node, Some(&self.config.node_prefix))
            .await?;
        Ok(ChildRef { key, cid, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prolly::{ChangeType, ChunkStrategy, Mutation};
    use crate::store::{open_node_store, StoreConfig};
    use prolly_blockstore::{BlockStore, MemoryBlockStore};

    fn store() -> Arc<dyn NodeStore> {
        open_node_store(Arc::new(MemoryBlockStore::new()), &StoreConfig::default())
    }

    fn small_config() -> TreeConfig {
        TreeConfig::default()
            .with_bounds(2, 16)
            .with_strategy(ChunkStrategy::KeyHash { bits: 2 })
    }

    fn numbered(n: usize) -> Vec<Entry> {
        (0..n)
            .map(|i| (format!("key-{:05}", i).into_bytes(), Ipld::Integer(i as i128)))
            .collect()
    }

    #[tokio::test]
    async fn test_build_and_get() {
        let store = store();
        let entries = numbered(500);
        let mut shuffled = entries.clone();
        shuffled.reverse();

        let tree = TreeBuilder::new(store.as_ref(), small_config())
            .build(shuffled)
            .await
            .unwrap();

        assert_eq!(tree.len(store.as_ref()).await.unwrap(), 500);
        assert_eq!(tree.entries(store.as_ref()).await.unwrap(), entries);
        assert_eq!(
            tree.get(store.as_ref(), b"key-00123").await.unwrap(),
            Some(Ipld::Integer(123))
        );
        assert_eq!(tree.get(store.as_ref(), b"key-00123x").await.unwrap(), None);
        assert_eq!(tree.get(store.as_ref(), b"zzz").await.unwrap(), None);
        assert_eq!(tree.get(store.as_ref(), b"").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_build_is_deterministic_and_dedups() {
        let store = store();
        let mut entries = numbered(50);
        entries.push((b"key-00007".to_vec(), Ipld::String("last".into())));

        let a = TreeBuilder::new(store.as_ref(), small_config())
            .build(entries.clone())
            .await
            .unwrap();
        entries.reverse();
        entries.retain(|(k, v)| k != b"key-00007" || v == &Ipld::String("last".into()));
        let b = TreeBuilder::new(store.as_ref(), small_config())
            .build(entries)
            .await
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(store.as_ref()).await.unwrap(), 50);
        assert_eq!(
            a.get(store.as_ref(), b"key-00007").await.unwrap(),
            Some(Ipld::String("last".into()))
        );
    }

    #[tokio::test]
    async fn test_get_nth_matches_entries() {
        let store = store();
        let tree = TreeBuilder::new(store.as_ref(), small_config())
            .build(numbered(300))
            .await
            .unwrap();
        let entries = tree.entries(store.as_ref()).await.unwrap();

        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(
                tree.get_nth(store.as_ref(), i as u64).await.unwrap().as_ref(),
                Some(entry)
            );
        }
        assert_eq!(tree.get_nth(store.as_ref(), 300).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_tree() {
        let store = store();
        let tree = TreeBuilder::new(store.as_ref(), small_config())
            .build(Vec::new())
            .await
            .unwrap();

        assert!(tree.is_empty());
        assert_eq!(tree.len(store.as_ref()).await.unwrap(), 0);
        assert_eq!(tree.get(store.as_ref(), b"a").await.unwrap(), None);
        assert_eq!(tree.get_nth(store.as_ref(), 0).await.unwrap(), None);
        assert!(tree.leaf_cids(store.as_ref()).await.unwrap().is_empty());

        let cid = tree.write(store.as_ref()).await.unwrap();
        let loaded = ProllyTree::load(store.as_ref(), &cid).await.unwrap();
        assert!(loaded.is_empty());
        assert_eq!(loaded.tree_cid(), Some(&cid));
    }

    #[tokio::test]
    async fn test_mutate_applies_batch() {
        let store = store();
        let tree = TreeBuilder::new(store.as_ref(), small_config())
            .build(numbered(100))
            .await
            .unwrap();

        let batch: Mutations = vec![
            Mutation::remove(b"key-00000".to_vec()),
            Mutation::modify(b"key-00050".to_vec(), Ipld::Bool(true)),
            Mutation::add(b"key-00050a".to_vec(), Ipld::Null),
            Mutation::remove(b"missing".to_vec()),
            Mutation::add(b"zzz".to_vec(), Ipld::Integer(-1)),
        ]
        .into_iter()
        .collect();

        let next = tree.mutate(store.as_ref(), batch).await.unwrap();
        let s = store.as_ref();

        assert_eq!(next.len(s).await.unwrap(), 101);
        assert_eq!(next.get(s, b"key-00000").await.unwrap(), None);
        assert_eq!(next.get(s, b"key-00050").await.unwrap(), Some(Ipld::Bool(true)));
        assert_eq!(next.get(s, b"key-00050a").await.unwrap(), Some(Ipld::Null));
        assert_eq!(next.get(s, b"zzz").await.unwrap(), Some(Ipld::Integer(-1)));
        // the old version is untouched
        assert_eq!(tree.len(s).await.unwrap(), 100);
        assert_eq!(tree.get(s, b"key-00000").await.unwrap(), Some(Ipld::Integer(0)));
    }

    #[tokio::test]
    async fn test_mutate_matches_fresh_build() {
        let store = store();
        let tree = TreeBuilder::new(store.as_ref(), small_config())
            .build(numbered(200))
            .await
            .unwrap();

        let batch: Mutations = (0..200)
            .step_by(3)
            .map(|i| Mutation::remove(format!("key-{:05}", i).into_bytes()))
            .collect();
        let mutated = tree.mutate(store.as_ref(), batch).await.unwrap();

        let expected: Vec<Entry> = numbered(200)
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % 3 != 0)
            .map(|(_, e)| e)
            .collect();
        let rebuilt = TreeBuilder::new(store.as_ref(), small_config())
            .build(expected)
            .await
            .unwrap();

        assert_eq!(mutated, rebuilt);
    }

    #[test_log::test(tokio::test)]
    async fn test_structural_sharing() {
        let store = store();
        let config = TreeConfig::default().with_bounds(2, 64);
        let tree = TreeBuilder::new(store.as_ref(), config)
            .build(numbered(2000))
            .await
            .unwrap();

        let mut batch = Mutations::new();
        batch.add(Mutation::modify(b"key-01000".to_vec(), Ipld::String("changed".into())));
        let changed = tree.mutate(store.as_ref(), batch).await.unwrap();

        let before = tree.leaf_cids(store.as_ref()).await.unwrap();
        let after: HashSet<Cid> = changed
            .leaf_cids(store.as_ref())
            .await
            .unwrap()
            .into_iter()
            .collect();
        let shared = before.iter().filter(|c| after.contains(c)).count();

        assert_ne!(tree, changed);
        assert!(before.len() > 10);
        assert_eq!(shared, before.len() - 1);
    }

    #[tokio::test]
    async fn test_diff_replays_to_same_root() {
        let store = store();
        let s = store.as_ref();
        let base = TreeBuilder::new(s, small_config()).build(numbered(300)).await.unwrap();

        let batch: Mutations = vec![
            Mutation::remove(b"key-00010".to_vec()),
            Mutation::modify(b"key-00150".to_vec(), Ipld::Bool(false)),
            Mutation::add(b"key-00299z".to_vec(), Ipld::Null),
        ]
        .into_iter()
        .collect();
        let other = base.mutate(s, batch).await.unwrap();

        let changes = base.diff(s, &other).await.unwrap();
        let kinds: Vec<ChangeType> = changes.iter().map(|c| c.change_type).collect();
        assert_eq!(kinds, vec![ChangeType::Remove, ChangeType::Modify, ChangeType::Add]);

        let replayed = base
            .mutate(s, changes.into_iter().map(Mutation::from).collect())
            .await
            .unwrap();
        assert_eq!(replayed, other);
        assert!(base.diff(s, &base).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prove() {
        let store = store();
        let s = store.as_ref();
        let tree = TreeBuilder::new(s, small_config()).build(numbered(200)).await.unwrap();

        let present = tree.prove(s, b"key-00042").await.unwrap();
        assert!(present.is_inclusion());
        assert_eq!(present.value, Some(Ipld::Integer(42)));
        assert_eq!(present.root(), tree.root());
        assert!(present.depth() > 1);

        let absent = tree.prove(s, b"key-00042-nope").await.unwrap();
        assert!(!absent.is_inclusion());

        let cid = s.write_proof(&present, None).await.unwrap();
        assert_eq!(s.read_proof(&cid).await.unwrap(), present);
    }

    #[tokio::test]
    async fn test_batch_with_matching_comparator_is_accepted() {
        let store = store();
        let s = store.as_ref();
        let tree = TreeBuilder::new(s, small_config()).build(numbered(3)).await.unwrap();

        let mut batch = Mutations::with_comparator(crate::prolly::KeyComparator::Bytewise);
        batch.add(Mutation::remove(b"key-00001".to_vec()));
        assert!(tree.mutate(s, batch).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let store = store();
        let result = TreeBuilder::new(store.as_ref(), TreeConfig::default().with_bounds(0, 0))
            .build(numbered(3))
            .await;
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_leaves_larger_than_a_mebibyte() {
        let blocks = Arc::new(MemoryBlockStore::new());
        let store = open_node_store(Arc::clone(&blocks), &StoreConfig::default());
        let s = store.as_ref();

        let mut entries: Vec<Entry> = (0..8u8)
            .map(|i| (vec![b'k', i], Ipld::Bytes(vec![i; 300 * 1024])))
            .collect();
        entries.push((b"k-huge".to_vec(), Ipld::Bytes(vec![0xAB; 1536 * 1024])));

        let tree = TreeBuilder::new(s, TreeConfig::default())
            .build(entries.clone())
            .await
            .unwrap();

        assert_eq!(tree.len(s).await.unwrap(), 9);
        for (key, value) in &entries {
            assert_eq!(tree.get(s, key).await.unwrap().as_ref(), Some(value));
        }

        let mut largest = 0;
        for cid in blocks.list_cids() {
            largest = largest.max(blocks.block_size(&cid).await.unwrap());
        }
        assert!(largest > 1024 * 1024);

        let reopened = open_node_store(blocks, &StoreConfig::uncached());
        let cid = tree.write(s).await.unwrap();
        let loaded = ProllyTree::load(reopened.as_ref(), &cid).await.unwrap();
        assert_eq!(loaded.entries(reopened.as_ref()).await.unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_out_of_order_node_is_rejected_on_read() {
        let store = store();
        let s = store.as_ref();
        let config_cid = s.write_tree_config(&small_config(), None).await.unwrap();
        let unsorted = ProllyNode::leaf(
            vec![b"c".to_vec(), b"a".to_vec(), b"b".to_vec()],
            vec![Ipld::Integer(3), Ipld::Integer(1), Ipld::Integer(2)],
        )
        .unwrap();
        let leaf = s.write_node(&unsorted, None).await.unwrap();
        let tree = ProllyTree::new(Some(leaf), config_cid);

        assert!(matches!(tree.get(s, b"b").await, Err(CoreError::Decode(_))));
        assert!(matches!(tree.prove(s, b"b").await, Err(CoreError::Decode(_))));
        assert!(matches!(tree.get_nth(s, 0).await, Err(CoreError::Decode(_))));
        assert!(matches!(tree.entries(s).await, Err(CoreError::Decode(_))));
        assert!(matches!(tree.leaf_cids(s).await, Err(CoreError::Decode(_))));

        let mut batch = Mutations::new();
        batch.add(Mutation::remove("a"));
        assert!(matches!(tree.mutate(s, batch).await, Err(CoreError::Decode(_))));
    }

    #[tokio::test]
    async fn test_out_of_order_child_is_rejected_below_the_root() {
        let store = store();
        let s = store.as_ref();
        let config_cid = s.write_tree_config(&small_config(), None).await.unwrap();
        let unsorted = ProllyNode::leaf(
            vec![b"z".to_vec(), b"m".to_vec()],
            vec![Ipld::Null, Ipld::Null],
        )
        .unwrap();
        let sorted = ProllyNode::leaf(vec![b"a".to_vec()], vec![Ipld::Null]).unwrap();
        let left = s.write_node(&sorted, None).await.unwrap();
        let right = s.write_node(&unsorted, None).await.unwrap();
        let root = ProllyNode::internal(
            vec![b"a".to_vec(), b"z".to_vec()],
            vec![left, right],
            vec![1, 2],
        )
        .unwrap();
        let root = s.write_node(&root, None).await.unwrap();
        let tree = ProllyTree::new(Some(root), config_cid);

        assert_eq!(tree.get(s, b"a").await.unwrap(), Some(Ipld::Null));
        assert!(matches!(tree.get(s, b"m").await, Err(CoreError::Decode(_))));
        assert!(matches!(tree.entries(s).await, Err(CoreError::Decode(_))));
    }
}
