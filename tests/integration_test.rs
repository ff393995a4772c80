//! Integration tests for prolly-store
//!
//! These tests drive trees end to end over real block store backends.

use ipld_core::ipld::Ipld;
use prolly_blockstore::{BlockStore, FsBlockStore, MemoryBlockStore};
use prolly_core::{
    open_node_store, ChangeType, CoreError, Mutation, Mutations, ProllyTree, StoreConfig,
    TreeBuilder, TreeConfig,
};
use std::sync::Arc;

fn pairs(n: usize) -> Vec<(Vec<u8>, Ipld)> {
    (0..n)
        .map(|i| (format!("k{:06}", i).into_bytes(), Ipld::Integer(i as i128)))
        .collect()
}

/// A tree written to disk reads back identically from a fresh store
#[test_log::test(tokio::test)]
async fn test_tree_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let tree_cid = {
        let blocks = Arc::new(FsBlockStore::open(dir.path()).await.unwrap());
        let store = open_node_store(blocks, &StoreConfig::default());
        let tree = TreeBuilder::new(store.as_ref(), TreeConfig::default())
            .build(pairs(1500))
            .await
            .unwrap();
        let cid = tree.write(store.as_ref()).await.unwrap();
        store.close();
        cid
    };

    let blocks = Arc::new(FsBlockStore::open(dir.path()).await.unwrap());
    let store = open_node_store(blocks, &StoreConfig::uncached());
    let tree = ProllyTree::load(store.as_ref(), &tree_cid).await.unwrap();

    assert_eq!(tree.tree_cid(), Some(&tree_cid));
    assert_eq!(tree.len(store.as_ref()).await.unwrap(), 1500);
    assert_eq!(
        tree.get(store.as_ref(), b"k000777").await.unwrap(),
        Some(Ipld::Integer(777))
    );
    assert_eq!(tree.entries(store.as_ref()).await.unwrap(), pairs(1500));
}

/// Memory and filesystem backends agree on every id
#[tokio::test]
async fn test_backends_agree_on_ids() {
    let dir = tempfile::tempdir().unwrap();
    let fs = open_node_store(
        Arc::new(FsBlockStore::open(dir.path()).await.unwrap()),
        &StoreConfig::uncached(),
    );
    let memory = open_node_store(Arc::new(MemoryBlockStore::new()), &StoreConfig::default());

    let on_disk = TreeBuilder::new(fs.as_ref(), TreeConfig::default())
        .build(pairs(300))
        .await
        .unwrap();
    let in_memory = TreeBuilder::new(memory.as_ref(), TreeConfig::default())
        .build(pairs(300))
        .await
        .unwrap();

    assert_eq!(on_disk, in_memory);
    assert_eq!(
        on_disk.write(fs.as_ref()).await.unwrap(),
        in_memory.write(memory.as_ref()).await.unwrap()
    );
}

/// Versions share storage, and a diff replays onto the old version
#[tokio::test]
async fn test_versions_share_blocks() {
    let blocks = Arc::new(MemoryBlockStore::new());
    let store = open_node_store(Arc::clone(&blocks), &StoreConfig::default());
    let v1 = TreeBuilder::new(store.as_ref(), TreeConfig::default())
        .build(pairs(2000))
        .await
        .unwrap();
    let after_build = blocks.len();

    let mut batch = Mutations::new();
    batch.add(Mutation::remove("k001234"));
    let v2 = v1.mutate(store.as_ref(), batch).await.unwrap();

    // one leaf plus its ancestors, nothing more
    let depth = v2.prove(store.as_ref(), b"k001234").await.unwrap().depth();
    assert!(blocks.len() - after_build <= depth);

    let changes = v1.diff(store.as_ref(), &v2).await.unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].change_type, ChangeType::Remove);
    assert_eq!(changes[0].old_value, Some(Ipld::Integer(1234)));

    let replay = v1
        .mutate(store.as_ref(), changes.into_iter().map(Mutation::from).collect())
        .await
        .unwrap();
    assert_eq!(replay, v2);
}

/// Reading an id that was never written is NotFound, not a decode failure
#[tokio::test]
async fn test_unknown_tree_is_not_found() {
    let blocks = Arc::new(MemoryBlockStore::new());
    let stray = blocks.put_block(b"unrelated").await.unwrap();
    let store = open_node_store(Arc::new(MemoryBlockStore::new()), &StoreConfig::default());

    let err = ProllyTree::load(store.as_ref(), &stray).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, CoreError::NotFound(cid) if cid == stray));
}
