//! Ownership maps over globally unique ordinals.
//!
//! A `GlobalMap` records the set of global ordinals this rank holds, in a
//! fixed local order. Ordinals need not be contiguous or sorted; the same
//! ordinal held on several ranks means several owned copies (the transfer
//! operators deliver to every copy). Construction is collective by
//! convention: every rank builds its map at the same protocol step even
//! though no communication happens here.

use hashbrown::HashMap;

/// Process-independent unique identifier for a point or element.
pub type GlobalOrdinal = u64;

/// The ordinals this rank holds, with O(1) ordinal-to-local-index lookup.
#[derive(Clone, Debug, Default)]
pub struct GlobalMap {
    ordinals: Vec<GlobalOrdinal>,
    index: HashMap<GlobalOrdinal, usize>,
}

impl GlobalMap {
    /// Build from an arbitrary local ordinal list. If an ordinal repeats
    /// within the list, lookups resolve to its last position.
    pub fn from_ordinals(ordinals: Vec<GlobalOrdinal>) -> Self {
        let index = ordinals
            .iter()
            .enumerate()
            .map(|(i, &g)| (g, i))
            .collect();
        Self { ordinals, index }
    }

    /// Number of locally held ordinals.
    pub fn local_len(&self) -> usize {
        self.ordinals.len()
    }

    /// Local ordinal list, in local-index order.
    pub fn ordinals(&self) -> &[GlobalOrdinal] {
        &self.ordinals
    }

    /// Ordinal at a local index.
    pub fn ordinal(&self, local: usize) -> Option<GlobalOrdinal> {
        self.ordinals.get(local).copied()
    }

    /// Local index of an ordinal, if held here.
    pub fn local_index(&self, ordinal: GlobalOrdinal) -> Option<usize> {
        self.index.get(&ordinal).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_contiguous_unsorted_ordinals() {
        let map = GlobalMap::from_ordinals(vec![42, 7, 1000]);
        assert_eq!(map.local_len(), 3);
        assert_eq!(map.local_index(7), Some(1));
        assert_eq!(map.local_index(1000), Some(2));
        assert_eq!(map.local_index(9), None);
        assert_eq!(map.ordinal(0), Some(42));
    }

    #[test]
    fn duplicate_resolves_to_last() {
        let map = GlobalMap::from_ordinals(vec![3, 3]);
        assert_eq!(map.local_index(3), Some(1));
    }
}
