//! Sorted, deduplicated batches of pending key operations
//!
//! A [`Mutations`] batch can be filled in any order but always drains in
//! ascending key order, so a tree patch can walk it in lockstep with the
//! tree's leaves.

use super::KeyComparator;
use crate::{CoreError, Result};
use ipld_core::ipld::Ipld;
use std::collections::VecDeque;

/// Kind of a pending operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Add,
    Modify,
    Remove,
}

/// A single pending operation on one key
#[derive(Clone, Debug, PartialEq)]
pub struct Mutation {
    key: Vec<u8>,
    value: Option<Ipld>,
    op: Op,
}

impl Mutation {
    /// Insert a new pair
    pub fn add(key: impl Into<Vec<u8>>, value: Ipld) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            op: Op::Add,
        }
    }

    /// Replace the value of an existing pair
    pub fn modify(key: impl Into<Vec<u8>>, value: Ipld) -> Self {
        Self {
            key: key.into(),
            value: Some(value),
            op: Op::Modify,
        }
    }

    /// Delete a pair
    pub fn remove(key: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: None,
            op: Op::Remove,
        }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The new value; `None` for a removal
    pub fn value(&self) -> Option<&Ipld> {
        self.value.as_ref()
    }

    pub fn op(&self) -> Op {
        self.op
    }

    /// Split into key and new value
    pub fn into_parts(self) -> (Vec<u8>, Option<Ipld>) {
        (self.key, self.value)
    }
}

/// An ordered set of mutations with at most one entry per key.
///
/// Single-owner: not synchronised for concurrent mutation.
#[derive(Clone, Debug)]
pub struct Mutations {
    items: VecDeque<Mutation>,
    comparator: KeyComparator,
}

impl Default for Mutations {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutations {
    /// Create an empty batch ordered bytewise
    pub fn new() -> Self {
        Self::with_comparator(KeyComparator::default())
    }

    /// Create an empty batch ordered by `comparator`
    pub fn with_comparator(comparator: KeyComparator) -> Self {
        Self {
            items: VecDeque::new(),
            comparator,
        }
    }

    pub fn comparator(&self) -> KeyComparator {
        self.comparator
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn search(&self, key: &[u8]) -> std::result::Result<usize, usize> {
        let compare = self.comparator.compare_fn();
        self.items.binary_search_by(|m| compare(&m.key, key))
    }

    /// Add a mutation; an existing mutation for the same key is replaced
    pub fn add(&mut self, mutation: Mutation) {
        match self.search(&mutation.key) {
            Ok(idx) => self.items[idx] = mutation,
            Err(idx) => self.items.insert(idx, mutation),
        }
    }

    /// Remove and return the smallest-key mutation.
    ///
    /// Returns [`CoreError::Exhausted`] once the batch is drained.
    pub fn next_mutation(&mut self) -> Result<Mutation> {
        self.items.pop_front().ok_or(CoreError::Exhausted)
    }

    /// Smallest-key mutation without removing it
    pub fn peek(&self) -> Option<&Mutation> {
        self.items.front()
    }

    /// The value a read-through would see for `key`.
    ///
    /// `None` when the key is untouched or pending removal.
    pub fn get(&self, key: &[u8]) -> Option<&Ipld> {
        let idx = self.search(key).ok()?;
        self.items[idx].value.as_ref()
    }

    /// Whether any mutation, including a removal, targets `key`
    pub fn has(&self, key: &[u8]) -> bool {
        self.search(key).is_ok()
    }

    /// Mutations in ascending key order
    pub fn iter(&self) -> impl Iterator<Item = &Mutation> {
        self.items.iter()
    }

    #[cfg(test)]
    fn is_sorted(&self) -> bool {
        let compare = self.comparator.compare_fn();
        self.items
            .iter()
            .zip(self.items.iter().skip(1))
            .all(|(a, b)| compare(&a.key, &b.key) == std::cmp::Ordering::Less)
    }
}

impl Extend<Mutation> for Mutations {
    fn extend<I: IntoIterator<Item = Mutation>>(&mut self, iter: I) {
        for mutation in iter {
            self.add(mutation);
        }
    }
}

impl FromIterator<Mutation> for Mutations {
    fn from_iter<I: IntoIterator<Item = Mutation>>(iter: I) -> Self {
        let mut batch = Mutations::new();
        batch.extend(iter);
        batch
    }
}
