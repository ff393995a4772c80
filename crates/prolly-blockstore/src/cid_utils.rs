//! CID (Content Identifier) utilities
//!
//! A [`CidPrefix`] bundles everything except the digest: CID version, codec and
//! multihash function. Two stores writing the same bytes under the same prefix
//! always agree on the id.

use crate::{BlockStoreError, Result};
use cid::{Cid, Version};
use multihash_codetable::{Code, MultihashDigest};
use serde::{Deserialize, Serialize};

/// Supported IPLD codecs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CidCodec {
    /// Raw binary data (0x55)
    #[default]
    Raw,
    /// DAG-CBOR (0x71)
    DagCbor,
    /// DAG-PB/Protobuf (0x70)
    DagPb,
    /// DAG-JSON (0x0129)
    DagJson,
}

impl CidCodec {
    /// Get the multicodec code
    pub fn code(&self) -> u64 {
        match self {
            CidCodec::Raw => 0x55,
            CidCodec::DagCbor => 0x71,
            CidCodec::DagPb => 0x70,
            CidCodec::DagJson => 0x0129,
        }
    }

    /// Parse from multicodec code
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0x55 => Some(CidCodec::Raw),
            0x71 => Some(CidCodec::DagCbor),
            0x70 => Some(CidCodec::DagPb),
            0x0129 => Some(CidCodec::DagJson),
            _ => None,
        }
    }

    /// Get a human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            CidCodec::Raw => "raw",
            CidCodec::DagCbor => "dag-cbor",
            CidCodec::DagPb => "dag-pb",
            CidCodec::DagJson => "dag-json",
        }
    }
}

/// Supported multihash functions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashCode {
    /// SHA2-256 (0x12)
    #[default]
    Sha2_256,
    /// BLAKE3 with 256-bit output (0x1e)
    Blake3_256,
}

impl HashCode {
    /// Get the multihash code
    pub fn code(&self) -> u64 {
        match self {
            HashCode::Sha2_256 => 0x12,
            HashCode::Blake3_256 => 0x1e,
        }
    }

    /// Parse from multihash code
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0x12 => Some(HashCode::Sha2_256),
            0x1e => Some(HashCode::Blake3_256),
            _ => None,
        }
    }

    fn table_code(&self) -> Code {
        match self {
            HashCode::Sha2_256 => Code::Sha2_256,
            HashCode::Blake3_256 => Code::Blake3_256,
        }
    }
}

/// CID version, serializable counterpart of [`cid::Version`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CidVersion {
    V0,
    #[default]
    V1,
}

impl From<CidVersion> for Version {
    fn from(version: CidVersion) -> Self {
        match version {
            CidVersion::V0 => Version::V0,
            CidVersion::V1 => Version::V1,
        }
    }
}

impl From<Version> for CidVersion {
    fn from(version: Version) -> Self {
        match version {
            Version::V0 => CidVersion::V0,
            Version::V1 => CidVersion::V1,
        }
    }
}

/// Hashing options used to derive a CID from bytes.
///
/// The default is CIDv1 + dag-cbor + sha2-256. It is part of the on-disk
/// format: changing it changes the id of every node written afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CidPrefix {
    pub version: CidVersion,
    pub codec: CidCodec,
    pub hash: HashCode,
}

impl Default for CidPrefix {
    fn default() -> Self {
        Self::dag_cbor()
    }
}

impl CidPrefix {
    /// The default prefix with the dag-cbor codec
    pub const fn dag_cbor() -> Self {
        Self {
            version: CidVersion::V1,
            codec: CidCodec::DagCbor,
            hash: HashCode::Sha2_256,
        }
    }

    /// Prefix for opaque raw blocks
    pub const fn raw() -> Self {
        Self {
            version: CidVersion::V1,
            codec: CidCodec::Raw,
            hash: HashCode::Sha2_256,
        }
    }

    /// Replace the hash function
    pub fn with_hash(mut self, hash: HashCode) -> Self {
        self.hash = hash;
        self
    }

    /// Compute the CID of `data` under this prefix
    pub fn to_cid(&self, data: &[u8]) -> Result<Cid> {
        let multihash = self.hash.table_code().digest(data);
        Ok(Cid::new(self.version.into(), self.codec.code(), multihash)?)
    }

    /// Recover the prefix an existing CID was built with
    pub fn of(cid: &Cid) -> Result<Self> {
        let codec = CidCodec::from_code(cid.codec())
            .ok_or_else(|| BlockStoreError::InvalidCid(format!("unsupported codec 0x{:x}", cid.codec())))?;
        let hash = HashCode::from_code(cid.hash().code()).ok_or_else(|| {
            BlockStoreError::InvalidCid(format!("unsupported multihash 0x{:x}", cid.hash().code()))
        })?;
        Ok(Self {
            version: cid.version().into(),
            codec,
            hash,
        })
    }
}

/// Create a CIDv1 from data using SHA2-256
pub fn create_cid(data: &[u8], codec: CidCodec) -> Cid {
    let multihash = Code::Sha2_256.digest(data);
    Cid::new_v1(codec.code(), multihash)
}

/// Verify that data matches a CID
pub fn verify_cid(data: &[u8], cid: &Cid) -> bool {
    match CidPrefix::of(cid).and_then(|prefix| prefix.to_cid(data)) {
        Ok(expected) => expected == *cid,
        Err(_) => false,
    }
}

/// Check that `data` hashes to `cid` under the prefix `cid` was built with
pub fn verify_block(cid: &Cid, data: &[u8]) -> Result<()> {
    let actual = CidPrefix::of(cid)?.to_cid(data)?;
    if actual != *cid {
        return Err(BlockStoreError::HashMismatch {
            expected: cid.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Parse a CID from a string
pub fn parse_cid(s: &str) -> Result<Cid> {
    s.parse()
        .map_err(|e: cid::Error| BlockStoreError::InvalidCid(e.to_string()))
}
