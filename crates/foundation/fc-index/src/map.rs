use std::fmt;
use std::ops::Index;

use la_arena::{ArenaMap, Idx as ArenaIdx};

use crate::Idx;

/// Sparse per-index storage: an [`ArenaMap`] keyed by a typed index `I`.
#[derive(Clone, PartialEq, Eq)]
pub struct IndexMap<I: Idx, V> {
    map: ArenaMap<ArenaIdx<I>, V>,
}

impl<I: Idx, V> IndexMap<I, V> {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            map: ArenaMap::new(),
        }
    }

    /// Stores `value` at `index`, returning the previous value.
    pub fn insert(&mut self, index: I, value: V) -> Option<V> {
        self.map.insert(index.arena_idx(), value)
    }

    /// The value at `index`, if any.
    #[must_use]
    pub fn get(&self, index: I) -> Option<&V> {
        self.map.get(index.arena_idx())
    }

    /// The value at `index` mutably, if any.
    pub fn get_mut(&mut self, index: I) -> Option<&mut V> {
        self.map.get_mut(index.arena_idx())
    }

    /// Returns `true` if `index` has a value.
    #[must_use]
    pub fn contains(&self, index: I) -> bool {
        self.map.contains_idx(index.arena_idx())
    }

    /// Iterates over the stored `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (I, &V)> + '_ {
        self.map
            .iter()
            .map(|(idx, value)| (I::from_raw(idx.into_raw()), value))
    }
}

impl<I: Idx, V> Default for IndexMap<I, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Idx, V> Index<I> for IndexMap<I, V> {
    type Output = V;

    fn index(&self, index: I) -> &V {
        &self.map[index.arena_idx()]
    }
}

impl<I: Idx, V> FromIterator<(I, V)> for IndexMap<I, V> {
    fn from_iter<It: IntoIterator<Item = (I, V)>>(iter: It) -> Self {
        Self {
            map: iter
                .into_iter()
                .map(|(index, value)| (index.arena_idx(), value))
                .collect(),
        }
    }
}

impl<I: Idx, V: fmt::Debug> fmt::Debug for IndexMap<I, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_entries() {
        let mut map: IndexMap<usize, &str> = IndexMap::new();
        assert_eq!(map.insert(4, "four"), None);
        assert_eq!(map.insert(1, "one"), None);
        assert_eq!(map.insert(4, "FOUR"), Some("four"));
        assert!(map.contains(1));
        assert!(!map.contains(2));
        assert_eq!(map.get(3), None);
        assert_eq!(map[4], "FOUR");
        let entries: Vec<_> = map.iter().map(|(i, v)| (i, *v)).collect();
        assert_eq!(entries, vec![(1, "one"), (4, "FOUR")]);
    }
}
