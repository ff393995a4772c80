//! Key ordering

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A total order over byte-string keys
pub type CompareFn = fn(&[u8], &[u8]) -> Ordering;

/// Unsigned lexicographic byte order
pub fn default_compare(left: &[u8], right: &[u8]) -> Ordering {
    left.cmp(right)
}

/// Persisted identity of the key order a tree was built with.
///
/// Stored in every `TreeConfig` so a tree is never walked under a different
/// order than the one that sorted it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum KeyComparator {
    /// Unsigned lexicographic byte order
    #[default]
    Bytewise,
}

impl KeyComparator {
    /// The comparison function for this order
    pub fn compare_fn(&self) -> CompareFn {
        match self {
            KeyComparator::Bytewise => default_compare,
        }
    }

    /// Compare two keys
    pub fn compare(&self, left: &[u8], right: &[u8]) -> Ordering {
        (self.compare_fn())(left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytewise_is_unsigned() {
        let cmp = KeyComparator::Bytewise;
        assert_eq!(cmp.compare(b"a", b"b"), Ordering::Less);
        assert_eq!(cmp.compare(b"ab", b"a"), Ordering::Greater);
        assert_eq!(cmp.compare(&[0x7f], &[0x80]), Ordering::Less);
        assert_eq!(cmp.compare(b"", b""), Ordering::Equal);
    }
}
