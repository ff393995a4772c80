//! Tree configuration
//!
//! A `TreeConfig` is written once and shared by reference (its CID) across
//! every version of a tree. Changing any field changes where node boundaries
//! fall, so two trees only share nodes when they share a config.

use super::{KeyComparator, DEFAULT_BOUNDARY_BITS};
use crate::{CoreError, Result};
use prolly_blockstore::CidPrefix;
use serde::{Deserialize, Serialize};

/// Rule that decides whether a pair closes the current node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkStrategy {
    /// Boundary when the low `bits` bits of `blake3(level || key)` are zero.
    /// Value edits never move boundaries.
    KeyHash { bits: u8 },
    /// Boundary when the low `bits` bits of `blake3(level || key || value)` are zero
    EntryHash { bits: u8 },
}

impl ChunkStrategy {
    pub fn bits(&self) -> u8 {
        match *self {
            ChunkStrategy::KeyHash { bits } | ChunkStrategy::EntryHash { bits } => bits,
        }
    }
}

impl Default for ChunkStrategy {
    fn default() -> Self {
        ChunkStrategy::KeyHash {
            bits: DEFAULT_BOUNDARY_BITS,
        }
    }
}

/// Chunking parameters and key order of a tree
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// No boundary is placed before a node holds this many pairs
    pub min_pairs: u32,
    /// A node is always closed once it holds this many pairs
    pub max_pairs: u32,
    /// Content-defined boundary rule
    pub strategy: ChunkStrategy,
    /// Key order
    pub comparator: KeyComparator,
    /// Hashing options for node writes
    pub node_prefix: CidPrefix,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            min_pairs: 4,
            max_pairs: 256,
            strategy: ChunkStrategy::default(),
            comparator: KeyComparator::default(),
            node_prefix: CidPrefix::default(),
        }
    }
}

impl TreeConfig {
    /// Check the parameters can produce a tree
    pub fn validate(&self) -> Result<()> {
        if self.min_pairs == 0 {
            return Err(CoreError::Configuration("min_pairs must be at least 1".into()));
        }
        if self.max_pairs < self.min_pairs.max(2) {
            return Err(CoreError::Configuration(format!(
                "max_pairs {} must be at least max(min_pairs, 2) = {}",
                self.max_pairs,
                self.min_pairs.max(2)
            )));
        }
        if self.strategy.bits() > 31 {
            return Err(CoreError::Configuration(format!(
                "boundary bits {} exceeds 31",
                self.strategy.bits()
            )));
        }
        Ok(())
    }

    /// Set the boundary rule
    pub fn with_strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the node size bounds
    pub fn with_bounds(mut self, min_pairs: u32, max_pairs: u32) -> Self {
        self.min_pairs = min_pairs;
        self.max_pairs = max_pairs;
        self
    }
}
