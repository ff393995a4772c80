//! Prolly Tree implementation
//!
//! Prolly Trees (Probabilistic B-Trees) combine properties of B-Trees and Merkle Trees:
//! - Content-defined boundaries for structural sharing
//! - O(log n) lookups and positional access through subtree counts
//! - Diffs that skip every leaf two versions share
//! - Verifiable via Merkle proofs

mod compare;
mod config;
mod diff;
mod hash;
mod mutations;
mod node;
mod proof;
mod tree;

pub use compare::{default_compare, CompareFn, KeyComparator};
pub use config::{ChunkStrategy, TreeConfig};
pub use diff::{ChangeType, KeyValueChange};
pub use hash::BoundaryHasher;
pub use mutations::{Mutation, Mutations, Op};
pub use node::{NodeKind, ProllyNode};
pub use proof::{Proof, ProofSegment};
pub use tree::{Entry, ProllyTree, TreeBuilder};

/// Default boundary pattern bits (average of 32 pairs per node)
pub const DEFAULT_BOUNDARY_BITS: u8 = 5;
