//! Filesystem block store
//!
//! Blocks live under a root directory, sharded by the first two digest bytes:
//! `root/3f/a0/<cid>`. Writes go to a temporary file in the shard directory and
//! are renamed into place, so readers never observe a partially written block.

use crate::{verify_block, BlockStore, BlockStoreError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, trace};

/// A block store backed by a directory tree
#[derive(Clone, Debug)]
pub struct FsBlockStore {
    root: PathBuf,
}

impl FsBlockStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "opened filesystem block store");
        Ok(Self { root })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a block with this CID is stored at
    pub fn path_for(&self, cid: &Cid) -> PathBuf {
        let digest = cid.hash().digest();
        let shard1 = format!("{:02x}", digest.first().copied().unwrap_or(0));
        let shard2 = format!("{:02x}", digest.get(1).copied().unwrap_or(0));
        self.root.join(shard1).join(shard2).join(cid.to_string())
    }

    async fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            BlockStoreError::Configuration(format!("block path has no parent: {}", path.display()))
        })?;
        fs::create_dir_all(parent).await?;

        let tmp_path = parent.join(format!(".tmp-{}", uuid::Uuid::new_v4()));
        let file = fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&tmp_path)
            .await?;

        if let Err(err) = persist(file, data, &tmp_path, path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err.into());
        }
        Ok(())
    }
}

/// Write, sync, close and rename the temp file into place
async fn persist(mut file: fs::File, data: &[u8], tmp_path: &Path, path: &Path) -> std::io::Result<()> {
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(tmp_path, path).await
}

fn not_found_or_io(err: std::io::Error, cid: &Cid) -> BlockStoreError {
    if err.kind() == ErrorKind::NotFound {
        BlockStoreError::NotFound(*cid)
    } else {
        BlockStoreError::Io(err)
    }
}

#[async_trait]
impl BlockStore for FsBlockStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn put_keyed(&self, cid: &Cid, data: &[u8]) -> Result<()> {
        verify_block(cid, data)?;
        let path = self.path_for(cid);
        if fs::try_exists(&path).await? {
            trace!(%cid, "block already present");
            return Ok(());
        }
        self.write_atomic(&path, data).await
    }

    async fn get_block(&self, cid: &Cid) -> Result<Bytes> {
        let data = fs::read(self.path_for(cid))
            .await
            .map_err(|e| not_found_or_io(e, cid))?;
        Ok(Bytes::from(data))
    }

    async fn has_block(&self, cid: &Cid) -> Result<bool> {
        Ok(fs::try_exists(self.path_for(cid)).await?)
    }

    async fn block_size(&self, cid: &Cid) -> Result<u64> {
        let meta = fs::metadata(self.path_for(cid))
            .await
            .map_err(|e| not_found_or_io(e, cid))?;
        Ok(meta.len())
    }
}
