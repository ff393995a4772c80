//! DAG-CBOR codec for nodes, tree roots, configs and proofs
//!
//! Encoding is deterministic, so equal values always produce equal bytes and
//! therefore equal CIDs. Decoding never panics: any shape mismatch is a
//! [`CoreError::Decode`].

use crate::prolly::ProllyNode;
use crate::{CoreError, Result};
use ipld_core::ipld::Ipld;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_bytes::ByteBuf;

/// Wire shape of a node. Internal nodes carry their child links as IPLD
/// links in `values`.
#[derive(Serialize, Deserialize)]
struct NodeRepr {
    is_leaf: bool,
    keys: Vec<ByteBuf>,
    values: Vec<Ipld>,
    subtree_counts: Vec<u32>,
}

/// Serialize any value to DAG-CBOR
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_ipld_dagcbor::to_vec(value).map_err(|e| CoreError::Serialization(e.to_string()))
}

/// Deserialize any value from DAG-CBOR
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_ipld_dagcbor::from_slice(bytes).map_err(|e| CoreError::Decode(e.to_string()))
}

/// Serialize a node
pub fn encode_node(node: &ProllyNode) -> Result<Vec<u8>> {
    let keys = node.keys().iter().cloned().map(ByteBuf::from).collect();
    let repr = match (node.values(), node.links(), node.subtree_counts()) {
        (Some(values), _, _) => NodeRepr {
            is_leaf: true,
            keys,
            values: values.to_vec(),
            subtree_counts: Vec::new(),
        },
        (None, Some(links), Some(counts)) => NodeRepr {
            is_leaf: false,
            keys,
            values: links.iter().copied().map(Ipld::Link).collect(),
            subtree_counts: counts.to_vec(),
        },
        _ => return Err(CoreError::Serialization("node has neither values nor links".into())),
    };
    encode(&repr)
}

/// Deserialize and validate a node.
///
/// Rejects byte-identical keys. Key order depends on the tree's comparator and
/// is checked by the tree layer.
pub fn decode_node(bytes: &[u8]) -> Result<ProllyNode> {
    let repr: NodeRepr = decode(bytes)?;
    if repr.keys.is_empty() {
        return Err(CoreError::Decode("stored node has no keys".into()));
    }
    let keys = repr.keys.into_iter().map(ByteBuf::into_vec).collect();

    let node = if repr.is_leaf {
        if !repr.subtree_counts.is_empty() {
            return Err(CoreError::Decode("leaf carries subtree counts".into()));
        }
        ProllyNode::leaf(keys, repr.values)?
    } else {
        decode_internal(keys, repr.values, repr.subtree_counts)?
    };

    if node.has_duplicate_keys() {
        return Err(CoreError::Decode("stored node has duplicate keys".into()));
    }
    Ok(node)
}

fn decode_internal(
    keys: Vec<Vec<u8>>,
    values: Vec<Ipld>,
    subtree_counts: Vec<u32>,
) -> Result<ProllyNode> {
    let links = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            Ipld::Link(cid) => Ok(cid),
            other => Err(CoreError::Decode(format!(
                "internal node value {} is not a link: {:?}",
                i, other
            ))),
        })
        .collect::<Result<Vec<_>>>()?;
    ProllyNode::internal(keys, links, subtree_counts)
}
