//! Chained indices
//!
//! Every key maps to a chain of entries ordered by creation. The first entry
//! ever created for a key is the origin; it owns the table slot.

use super::context::ContextId;
use std::collections::HashMap;
use std::hash::Hash;

/// Which index a chain belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Begin,
    Continue,
    End,
    Ansi,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Continue => "continue",
            Self::End => "end",
            Self::Ansi => "ansi",
        }
    }
}

/// One link in a collision chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub context: ContextId,
    pub is_origin: bool,
}

/// What unlinking an entry did to its chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unlink {
    /// Removed from the middle; neighbours now link to each other
    Spliced,
    /// Removed from the tail of a longer chain
    Truncated,
    /// Sole entry; the key left the index
    Removed,
    /// Origin with successors; left in place to keep the slot alive
    OriginRetained,
    /// Entry not present
    Missing,
}

/// Multimap from key to an ordered chain of contexts
#[derive(Debug)]
pub struct ChainIndex<K> {
    kind: IndexKind,
    chains: HashMap<K, Vec<IndexEntry>>,
}

impl<K: Eq + Hash + Copy> ChainIndex<K> {
    pub fn new(kind: IndexKind) -> Self {
        Self {
            kind,
            chains: HashMap::new(),
        }
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Entries for `key`, oldest first
    pub fn chain(&self, key: &K) -> Option<&[IndexEntry]> {
        self.chains.get(key).map(Vec::as_slice)
    }

    /// Append `context` to the chain of `key`. Returns whether the new entry
    /// is the origin of a fresh chain.
    pub fn append(&mut self, key: K, context: ContextId) -> bool {
        let chain = self.chains.entry(key).or_default();
        let is_origin = chain.is_empty();
        chain.push(IndexEntry { context, is_origin });
        is_origin
    }

    /// Take `context` out of the chain of `key`.
    ///
    /// A middle entry is spliced out, a tail entry truncated, and a sole
    /// entry removes the key. An origin that still has successors is never
    /// removed: the chain keeps hanging off it.
    pub fn unlink(&mut self, key: &K, context: ContextId) -> Unlink {
        let Some(chain) = self.chains.get_mut(key) else {
            return Unlink::Missing;
        };
        let Some(pos) = chain.iter().position(|e| e.context == context) else {
            return Unlink::Missing;
        };

        let has_successor = pos + 1 < chain.len();
        let has_predecessor = pos > 0;

        match (has_predecessor, has_successor) {
            (true, true) => {
                chain.remove(pos);
                Unlink::Spliced
            }
            (true, false) => {
                chain.pop();
                Unlink::Truncated
            }
            (false, true) => Unlink::OriginRetained,
            (false, false) => {
                self.chains.remove(key);
                Unlink::Removed
            }
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.chains.contains_key(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Number of entries over all chains
    pub fn entry_count(&self) -> usize {
        self.chains.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.chains.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srt::context::ContextStore;
    use chrono::Utc;

    fn ids(n: usize) -> Vec<ContextId> {
        let mut store = ContextStore::new();
        (0..n).map(|i| store.create_context(i as u32 + 1, Utc::now())).collect()
    }

    #[test]
    fn test_append_marks_origin() {
        let ctx = ids(2);
        let mut index = ChainIndex::new(IndexKind::Begin);
        assert!(index.append(7u32, ctx[0]));
        assert!(!index.append(7u32, ctx[1]));

        let chain = index.chain(&7).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain[0].is_origin);
        assert!(!chain[1].is_origin);
        assert_eq!(index.entry_count(), 2);
    }

    #[test]
    fn test_sole_entry_removes_key() {
        let ctx = ids(1);
        let mut index = ChainIndex::new(IndexKind::End);
        index.append(1u32, ctx[0]);
        assert_eq!(index.unlink(&1, ctx[0]), Unlink::Removed);
        assert!(!index.contains_key(&1));
        assert!(index.is_empty());
    }

    #[test]
    fn test_middle_entry_is_spliced() {
        let ctx = ids(3);
        let mut index = ChainIndex::new(IndexKind::Continue);
        for id in &ctx {
            index.append(1u32, *id);
        }
        assert_eq!(index.unlink(&1, ctx[1]), Unlink::Spliced);
        let chain: Vec<_> = index.chain(&1).unwrap().iter().map(|e| e.context).collect();
        assert_eq!(chain, vec![ctx[0], ctx[2]]);
    }

    #[test]
    fn test_tail_entry_is_truncated() {
        let ctx = ids(2);
        let mut index = ChainIndex::new(IndexKind::Ansi);
        index.append(1u32, ctx[0]);
        index.append(1u32, ctx[1]);
        assert_eq!(index.unlink(&1, ctx[1]), Unlink::Truncated);
        assert_eq!(index.chain(&1).unwrap().len(), 1);
    }

    #[test]
    fn test_origin_with_successors_keeps_slot() {
        let ctx = ids(2);
        let mut index = ChainIndex::new(IndexKind::Begin);
        index.append(1u32, ctx[0]);
        index.append(1u32, ctx[1]);

        assert_eq!(index.unlink(&1, ctx[0]), Unlink::OriginRetained);
        assert_eq!(index.chain(&1).unwrap().len(), 2);

        // Once the successor goes, the origin is alone but stays registered
        assert_eq!(index.unlink(&1, ctx[1]), Unlink::Truncated);
        let chain = index.chain(&1).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].context, ctx[0]);
    }

    #[test]
    fn test_unlink_missing() {
        let ctx = ids(2);
        let mut index = ChainIndex::new(IndexKind::Begin);
        assert_eq!(index.unlink(&1u32, ctx[0]), Unlink::Missing);
        index.append(1u32, ctx[0]);
        assert_eq!(index.unlink(&1u32, ctx[1]), Unlink::Missing);
    }
}
