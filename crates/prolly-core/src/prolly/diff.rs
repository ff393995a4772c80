//! Key-value differences between tree versions

use super::{CompareFn, Mutation};
use ipld_core::ipld::Ipld;
use std::cmp::Ordering;

/// Type of change in a diff
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeType {
    /// Key was added
    Add,
    /// Key was removed
    Remove,
    /// Value was modified
    Modify,
}

/// A key-value change between two tree versions
#[derive(Clone, Debug, PartialEq)]
pub struct KeyValueChange {
    /// The key that changed
    pub key: Vec<u8>,
    /// Type of change
    pub change_type: ChangeType,
    /// Old value (for Remove and Modify)
    pub old_value: Option<Ipld>,
    /// New value (for Add and Modify)
    pub new_value: Option<Ipld>,
}

impl KeyValueChange {
    /// Create an add change
    pub fn add(key: Vec<u8>, value: Ipld) -> Self {
        Self {
            key,
            change_type: ChangeType::Add,
            old_value: None,
            new_value: Some(value),
        }
    }

    /// Create a remove change
    pub fn remove(key: Vec<u8>, value: Ipld) -> Self {
        Self {
            key,
            change_type: ChangeType::Remove,
            old_value: Some(value),
            new_value: None,
        }
    }

    /// Create a modify change
    pub fn modify(key: Vec<u8>, old: Ipld, new: Ipld) -> Self {
        Self {
            key,
            change_type: ChangeType::Modify,
            old_value: Some(old),
            new_value: Some(new),
        }
    }
}

impl From<KeyValueChange> for Mutation {
    fn from(change: KeyValueChange) -> Self {
        match (change.change_type, change.new_value) {
            (ChangeType::Add, Some(value)) => Mutation::add(change.key, value),
            (ChangeType::Modify, Some(value)) => Mutation::modify(change.key, value),
            _ => Mutation::remove(change.key),
        }
    }
}

/// Changes turning `base` into `other`; both inputs sorted and duplicate-free
pub(crate) fn diff_sorted(
    base: Vec<(Vec<u8>, Ipld)>,
    other: Vec<(Vec<u8>, Ipld)>,
    compare: CompareFn,
) -> Vec<KeyValueChange> {
    let mut changes = Vec::new();
    let mut base = base.into_iter().peekable();
    let mut other = other.into_iter().peekable();

    loop {
        let order = match (base.peek(), other.peek()) {
            (Some((b, _)), Some((o, _))) => compare(b, o),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match order {
            Ordering::Less => {
                if let Some((key, value)) = base.next() {
                    changes.push(KeyValueChange::remove(key, value));
                }
            }
            Ordering::Greater => {
                if let Some((key, value)) = other.next() {
                    changes.push(KeyValueChange::add(key, value));
                }
            }
            Ordering::Equal => {
                if let (Some((key, old)), Some((_, new))) = (base.next(), other.next()) {
                    if old != new {
                        changes.push(KeyValueChange::modify(key, old, new));
                    }
                }
            }
        }
    }

    changes
}
