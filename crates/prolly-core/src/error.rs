//! Error types for the prolly-core crate

use cid::Cid;
use prolly_blockstore::BlockStoreError;
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in core tree and node store operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// No stored bytes exist for the id
    #[error("not found: {0}")]
    NotFound(Cid),

    /// Bytes, or vectors handed to a node constructor, do not form a well-formed value
    #[error("decode error: {0}")]
    Decode(String),

    /// Leaf-only accessor used on an internal node, internal-only accessor on a leaf,
    /// or an index past the end of the node
    #[error("invalid node access: {0}")]
    InvalidNodeAccess(String),

    /// The mutation batch has no more entries
    #[error("mutation batch exhausted")]
    Exhausted,

    /// Backing block store failure
    #[error("block store error: {0}")]
    BlockStore(BlockStoreError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid tree or store configuration
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    /// Whether this is the end-of-batch signal rather than a fault
    pub fn is_exhausted(&self) -> bool {
        matches!(self, CoreError::Exhausted)
    }

    /// Whether the requested id has no stored content
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }
}

impl From<BlockStoreError> for CoreError {
    fn from(err: BlockStoreError) -> Self {
        match err {
            BlockStoreError::NotFound(cid) => CoreError::NotFound(cid),
            other => CoreError::BlockStore(other),
        }
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Configuration(err.to_string())
    }
}
