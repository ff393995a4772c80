//! # Prolly Core
//!
//! Prolly tree engine for the prolly-store workspace.
//!
//! This crate provides:
//! - **Nodes**: Immutable leaf and internal nodes with checked accessors
//! - **Mutation batches**: Ordered, one-entry-per-key edits applied in key order
//! - **Trees**: Build, look up, count, mutate, prove and diff tree versions
//! - **Node Store**: Content-addressed persistence with an optional LRU cache
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     ProllyTree / TreeBuilder / Proof    │
//! ├─────────────────────────────────────────┤
//! │     ProllyNode    │     Mutations       │
//! ├─────────────────────────────────────────┤
//! │  NodeStore (CachedNodeStore → Block)    │
//! ├─────────────────────────────────────────┤
//! │       BlockStore (prolly-blockstore)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use prolly_core::{open_node_store, StoreConfig, TreeBuilder, TreeConfig};
//! use prolly_blockstore::MemoryBlockStore;
//!
//! let store = open_node_store(Arc::new(MemoryBlockStore::new()), &StoreConfig::default());
//! let tree = TreeBuilder::new(store.as_ref(), TreeConfig::default()).build(pairs).await?;
//! let value = tree.get(store.as_ref(), b"key").await?;
//! ```

pub mod codec;
pub mod error;
pub mod prolly;
pub mod store;

pub use error::{CoreError, Result};
pub use prolly::{
    ChangeType, KeyComparator, KeyValueChange, Mutation, Mutations, NodeKind, Op, Proof,
    ProllyNode, ProllyTree, TreeBuilder, TreeConfig,
};
pub use store::{open_node_store, BlockNodeStore, CachedNodeStore, NodeStore, StoreConfig};

/// Version of the on-disk object format
pub const STORAGE_VERSION: &str = "1.0.0";
