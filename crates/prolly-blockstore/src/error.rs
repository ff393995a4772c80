//! Error types for the prolly-blockstore crate

use cid::Cid;
use thiserror::Error;

/// Result type alias using `BlockStoreError`
pub type Result<T> = std::result::Result<T, BlockStoreError>;

/// Errors that can occur during block storage operations
#[derive(Error, Debug)]
pub enum BlockStoreError {
    /// Block not found
    #[error("block not found: {0}")]
    NotFound(Cid),

    /// Invalid CID, or a prefix that cannot produce one
    #[error("invalid CID: {0}")]
    InvalidCid(String),

    /// Stored bytes do not hash to the CID they were stored under
    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl BlockStoreError {
    /// Whether this error means the block simply is not there
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlockStoreError::NotFound(_))
    }
}

impl From<cid::Error> for BlockStoreError {
    fn from(err: cid::Error) -> Self {
        BlockStoreError::InvalidCid(err.to_string())
    }
}
