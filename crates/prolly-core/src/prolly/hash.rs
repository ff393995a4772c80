//! Content-defined node boundaries

use super::{ChunkStrategy, TreeConfig};

/// Decides where one node ends and the next begins.
///
/// The decision depends only on the pair's content, its tree level and how
/// many pairs the open node already holds, so identical runs of pairs are cut
/// identically in every tree built with the same config.
#[derive(Clone, Debug)]
pub struct BoundaryHasher {
    strategy: ChunkStrategy,
    boundary_mask: u32,
    min_pairs: usize,
    max_pairs: usize,
}

impl BoundaryHasher {
    /// Create a boundary hasher; boundary bits above 31 are clamped
    pub fn new(config: &TreeConfig) -> Self {
        let bits = u32::from(config.strategy.bits()).min(31);
        Self {
            strategy: config.strategy,
            boundary_mask: (1u32 << bits) - 1,
            min_pairs: config.min_pairs as usize,
            max_pairs: config.max_pairs as usize,
        }
    }

    /// Whether the node holding `node_len` pairs, the last being `key`/`value`,
    /// closes here.
    ///
    /// `value` is the encoded leaf value, or the child CID bytes on internal
    /// levels. Internal levels never close below two pairs so each level is
    /// strictly smaller than the one beneath it.
    pub fn is_boundary(&self, level: u8, key: &[u8], value: &[u8], node_len: usize) -> bool {
        let min = if level == 0 { self.min_pairs } else { self.min_pairs.max(2) };
        if node_len < min {
            return false;
        }
        if node_len >= self.max_pairs {
            return true;
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(&[level]);
        hasher.update(key);
        if let ChunkStrategy::EntryHash { .. } = self.strategy {
            hasher.update(value);
        }
        let hash = hasher.finalize();
        let bytes = hash.as_bytes();
        let lower_bits = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);

        (lower_bits & self.boundary_mask) == 0
    }

    /// Whether boundaries depend on values; callers can skip encoding them if not
    pub fn uses_value(&self) -> bool {
        matches!(self.strategy, ChunkStrategy::EntryHash { .. })
    }
}
