//! Basic usage example for prolly-store
//!
//! This example demonstrates:
//! - Opening a cached node store over the filesystem
//! - Building a tree and reading it back
//! - Applying a mutation batch
//! - Diffing two versions and proving a lookup
//!
//! Run with: cargo run --example basic_usage
//! Set PROLLY_STORE_CACHE_SIZE to size the cache, RUST_LOG to tune logging.

use ipld_core::ipld::Ipld;
use prolly_blockstore::FsBlockStore;
use prolly_core::{open_node_store, Mutation, Mutations, StoreConfig, TreeBuilder, TreeConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("prolly_core=debug")),
        )
        .init();

    let dir = std::env::temp_dir().join("prolly-store-demo");
    let blocks = Arc::new(FsBlockStore::open(&dir).await?);
    let store_config = StoreConfig::from_env()?;
    let store = open_node_store(blocks, &store_config);
    println!("Node store at {} (cache size {})\n", dir.display(), store_config.cache_size);

    // ==================== Build ====================

    let pairs = (0..1000).map(|i| {
        (
            format!("user/{:04}", i).into_bytes(),
            Ipld::String(format!("name-{}", i)),
        )
    });
    let tree = TreeBuilder::new(store.as_ref(), TreeConfig::default())
        .build(pairs)
        .await?;
    let tree_cid = tree.write(store.as_ref()).await?;
    println!("Built tree {} with {} pairs", tree_cid, tree.len(store.as_ref()).await?);
    println!("  root: {:?}", tree.root());
    println!("  leaves: {}", tree.leaf_cids(store.as_ref()).await?.len());

    // ==================== Read ====================

    let value = tree.get(store.as_ref(), b"user/0042").await?;
    println!("\nuser/0042 -> {:?}", value);
    if let Some((key, value)) = tree.get_nth(store.as_ref(), 500).await? {
        println!("pair #500 -> {} = {:?}", String::from_utf8_lossy(&key), value);
    }

    // ==================== Mutate ====================

    let mut batch = Mutations::new();
    batch.add(Mutation::modify("user/0042", Ipld::String("renamed".into())));
    batch.add(Mutation::remove("user/0999"));
    batch.add(Mutation::add("user/1000", Ipld::String("newcomer".into())));
    let next = tree.mutate(store.as_ref(), batch).await?;
    let next_cid = next.write(store.as_ref()).await?;
    let pairs = next.len(store.as_ref()).await?;
    info!(%next_cid, pairs, "mutated tree");

    // ==================== Diff & Prove ====================

    for change in tree.diff(store.as_ref(), &next).await? {
        println!(
            "  {:?} {} {:?} -> {:?}",
            change.change_type,
            String::from_utf8_lossy(&change.key),
            change.old_value,
            change.new_value
        );
    }

    let proof = next.prove(store.as_ref(), b"user/0042").await?;
    let proof_cid = store.write_proof(&proof, None).await?;
    println!(
        "\nProof {} (depth {}, inclusion: {})",
        proof_cid,
        proof.depth(),
        proof.is_inclusion()
    );

    store.close();
    Ok(())
}
