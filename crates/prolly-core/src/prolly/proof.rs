//! Lookup proofs

use cid::Cid;
use ipld_core::ipld::Ipld;
use serde::{Deserialize, Serialize};

/// One step of a root-to-leaf lookup: the node visited and the slot taken
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofSegment {
    pub node: Cid,
    pub index: u32,
}

/// Witness that `key` is present with `value` (or absent, when `value` is
/// `None`) under the root at the head of `path`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    #[serde(with = "serde_bytes")]
    pub key: Vec<u8>,
    pub value: Option<Ipld>,
    pub path: Vec<ProofSegment>,
}

impl Proof {
    /// Root the proof is stated against
    pub fn root(&self) -> Option<&Cid> {
        self.path.first().map(|segment| &segment.node)
    }

    /// Whether the proof shows the key present
    pub fn is_inclusion(&self) -> bool {
        self.value.is_some()
    }

    /// Number of nodes between the root and the leaf, inclusive
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}
