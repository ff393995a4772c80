//! Prolly Tree node types

use super::CompareFn;
use crate::{CoreError, Result};
use cid::Cid;
use ipld_core::ipld::Ipld;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// Whether a node holds values or child links
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Leaf,
    Internal,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Leaf => f.write_str("leaf"),
            NodeKind::Internal => f.write_str("internal"),
        }
    }
}

#[derive(Clone, PartialEq)]
enum NodeBody {
    Leaf {
        values: Vec<Ipld>,
    },
    Internal {
        links: Vec<Cid>,
        subtree_counts: Vec<u32>,
    },
}

/// A node in the Prolly Tree.
///
/// Keys are strictly increasing under the tree's comparator. In a leaf,
/// `values[i]` belongs to `keys[i]`. In an internal node, `keys[i]` is the
/// greatest key of the subtree at `links[i]`, which holds `subtree_counts[i]`
/// pairs.
///
/// Nodes are immutable values: a change produces a new node with a new id.
#[derive(Clone, PartialEq)]
pub struct ProllyNode {
    keys: Vec<Vec<u8>>,
    body: NodeBody,
}

impl ProllyNode {
    /// Create a leaf node
    pub fn leaf(keys: Vec<Vec<u8>>, values: Vec<Ipld>) -> Result<Self> {
        if keys.len() != values.len() {
            return Err(CoreError::Decode(format!(
                "leaf has {} keys but {} values",
                keys.len(),
                values.len()
            )));
        }
        Ok(Self {
            keys,
            body: NodeBody::Leaf { values },
        })
    }

    /// Create an internal node
    pub fn internal(keys: Vec<Vec<u8>>, links: Vec<Cid>, subtree_counts: Vec<u32>) -> Result<Self> {
        if keys.len() != links.len() || keys.len() != subtree_counts.len() {
            return Err(CoreError::Decode(format!(
                "internal node has {} keys, {} links and {} subtree counts",
                keys.len(),
                links.len(),
                subtree_counts.len()
            )));
        }
        Ok(Self {
            keys,
            body: NodeBody::Internal {
                links,
                subtree_counts,
            },
        })
    }

    /// The kind of this node
    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::Leaf { .. } => NodeKind::Leaf,
            NodeBody::Internal { .. } => NodeKind::Internal,
        }
    }

    /// Check if this is a leaf
    pub fn is_leaf(&self) -> bool {
        self.kind() == NodeKind::Leaf
    }

    /// Check if the node has no keys
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Number of keys in this node
    pub fn item_count(&self) -> usize {
        self.keys.len()
    }

    /// All keys, in order
    pub fn keys(&self) -> &[Vec<u8>] {
        &self.keys
    }

    /// Greatest key of the node, used as its routing key in the parent
    pub fn last_key(&self) -> Option<&[u8]> {
        self.keys.last().map(Vec::as_slice)
    }

    /// Leaf values, `None` for an internal node
    pub fn values(&self) -> Option<&[Ipld]> {
        match &self.body {
            NodeBody::Leaf { values } => Some(values),
            NodeBody::Internal { .. } => None,
        }
    }

    /// Child links, `None` for a leaf
    pub fn links(&self) -> Option<&[Cid]> {
        match &self.body {
            NodeBody::Leaf { .. } => None,
            NodeBody::Internal { links, .. } => Some(links),
        }
    }

    /// Per-child pair counts, `None` for a leaf
    pub fn subtree_counts(&self) -> Option<&[u32]> {
        match &self.body {
            NodeBody::Leaf { .. } => None,
            NodeBody::Internal { subtree_counts, .. } => Some(subtree_counts),
        }
    }

    /// Index of the leftmost key not smaller than `target`.
    ///
    /// Falls back to the last index when every key is smaller, so routing
    /// through an internal node always lands on a child. Returns 0 for an
    /// empty node; callers must not index an empty node.
    pub fn key_index(&self, target: &[u8], compare: CompareFn) -> usize {
        let idx = self
            .keys
            .partition_point(|key| compare(key, target) == Ordering::Less);
        idx.min(self.keys.len().saturating_sub(1))
    }

    /// Key at index `i`
    pub fn key_at(&self, i: usize) -> Result<&[u8]> {
        self.keys
            .get(i)
            .map(Vec::as_slice)
            .ok_or_else(|| self.out_of_range(i))
    }

    /// Value at index `i`; leaf only
    pub fn value_at(&self, i: usize) -> Result<&Ipld> {
        match &self.body {
            NodeBody::Leaf { values } => values.get(i).ok_or_else(|| self.out_of_range(i)),
            NodeBody::Internal { .. } => Err(self.wrong_kind("value_at", NodeKind::Leaf)),
        }
    }

    /// Child link at index `i`; internal only
    pub fn link_at(&self, i: usize) -> Result<&Cid> {
        match &self.body {
            NodeBody::Internal { links, .. } => links.get(i).ok_or_else(|| self.out_of_range(i)),
            NodeBody::Leaf { .. } => Err(self.wrong_kind("link_at", NodeKind::Internal)),
        }
    }

    /// Pair count of the subtree at index `i`; internal only
    pub fn subtree_count_at(&self, i: usize) -> Result<u32> {
        match &self.body {
            NodeBody::Internal { subtree_counts, .. } => subtree_counts
                .get(i)
                .copied()
                .ok_or_else(|| self.out_of_range(i)),
            NodeBody::Leaf { .. } => Err(self.wrong_kind("subtree_count_at", NodeKind::Internal)),
        }
    }

    /// Number of key-value pairs reachable from this node
    pub fn total_pair_count(&self) -> u64 {
        match &self.body {
            NodeBody::Leaf { values } => values.len() as u64,
            NodeBody::Internal { subtree_counts, .. } => {
                subtree_counts.iter().map(|&c| u64::from(c)).sum()
            }
        }
    }

    /// Whether two keys are byte-identical. Such a node is malformed under
    /// every key order.
    pub fn has_duplicate_keys(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.keys.len());
        !self.keys.iter().all(|key| seen.insert(key.as_slice()))
    }

    /// Fail with `Decode` unless keys are strictly increasing under `compare`
    pub fn check_key_order(&self, compare: CompareFn) -> Result<()> {
        match self
            .keys
            .windows(2)
            .position(|pair| compare(&pair[0], &pair[1]) != Ordering::Less)
        {
            Some(i) => Err(CoreError::Decode(format!(
                "{} node keys not strictly increasing at index {}",
                self.kind(),
                i + 1
            ))),
            None => Ok(()),
        }
    }

    fn out_of_range(&self, i: usize) -> CoreError {
        CoreError::InvalidNodeAccess(format!(
            "index {} out of range for {} node with {} items",
            i,
            self.kind(),
            self.item_count()
        ))
    }

    fn wrong_kind(&self, accessor: &str, expected: NodeKind) -> CoreError {
        CoreError::InvalidNodeAccess(format!(
            "{} requires a {} node, got {}",
            accessor,
            expected,
            self.kind()
        ))
    }
}

impl fmt::Debug for ProllyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProllyNode")
            .field("kind", &self.kind())
            .field("item_count", &self.item_count())
            .field("pair_count", &self.total_pair_count())
            .finish()
    }
}
