use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use la_arena::Arena;

use crate::Idx;

/// An [`Arena`] addressed by a typed index `I` instead of `la_arena::Idx<T>`.
///
/// Positions are dense: the `n`th pushed element lives at `I::new(n)`.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IndexVec<I: Idx, T> {
    arena: Arena<T>,
    _marker: PhantomData<fn(&I)>,
}

impl<I: Idx, T> IndexVec<I, T> {
    /// Creates an empty vector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            arena: Arena::new(),
            _marker: PhantomData,
        }
    }

    /// Creates an empty vector with room for `capacity` elements.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
            _marker: PhantomData,
        }
    }

    /// Creates a vector holding `n` clones of `elem`.
    #[must_use]
    pub fn from_elem_n(elem: T, n: usize) -> Self
    where
        T: Clone,
    {
        std::iter::repeat_n(elem, n).collect()
    }

    /// Creates a vector of `n` elements produced by `f`.
    pub fn from_fn_n(f: impl FnMut(I) -> T, n: usize) -> Self {
        (0..n).map(I::new).map(f).collect()
    }

    /// Appends an element and returns its index.
    pub fn push(&mut self, elem: T) -> I {
        I::from_raw(self.arena.alloc(elem).into_raw())
    }

    /// Index that the next [`push`](Self::push) will return.
    #[must_use]
    pub fn next_index(&self) -> I {
        I::new(self.arena.len())
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if the vector holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Returns the element at `index`, if any.
    #[must_use]
    pub fn get(&self, index: I) -> Option<&T> {
        (index.index() < self.arena.len()).then(|| &self.arena[index.arena_idx()])
    }

    /// Returns the element at `index` mutably, if any.
    pub fn get_mut(&mut self, index: I) -> Option<&mut T> {
        if index.index() < self.arena.len() {
            Some(&mut self.arena[index.arena_idx()])
        } else {
            None
        }
    }

    /// Iterates over the elements.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator + '_ {
        self.arena.values()
    }

    /// Iterates over the elements mutably.
    pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> + ExactSizeIterator + '_ {
        self.arena.values_mut()
    }

    /// Iterates over `(index, element)` pairs.
    pub fn iter_enumerated(&self) -> impl DoubleEndedIterator<Item = (I, &T)> + '_ {
        self.arena
            .iter()
            .map(|(idx, elem)| (I::from_raw(idx.into_raw()), elem))
    }

    /// Consumes the vector, yielding `(index, element)` pairs.
    pub fn into_iter_enumerated(self) -> impl Iterator<Item = (I, T)> {
        self.arena
            .into_iter()
            .map(|(idx, elem)| (I::from_raw(idx.into_raw()), elem))
    }

    /// Iterates over the valid indices.
    pub fn indices(&self) -> impl DoubleEndedIterator<Item = I> + use<I, T> {
        (0..self.arena.len()).map(I::new)
    }
}

impl<I: Idx, T> Default for IndexVec<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Idx, T> Index<I> for IndexVec<I, T> {
    type Output = T;

    fn index(&self, index: I) -> &T {
        &self.arena[index.arena_idx()]
    }
}

impl<I: Idx, T> IndexMut<I> for IndexVec<I, T> {
    fn index_mut(&mut self, index: I) -> &mut T {
        &mut self.arena[index.arena_idx()]
    }
}

impl<I: Idx, T> FromIterator<T> for IndexVec<I, T> {
    fn from_iter<It: IntoIterator<Item = T>>(iter: It) -> Self {
        Self {
            arena: iter.into_iter().collect(),
            _marker: PhantomData,
        }
    }
}

impl<I: Idx, T: fmt::Debug> fmt::Debug for IndexVec<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.arena.values()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_returns_sequential_indices() {
        let mut vec: IndexVec<usize, &str> = IndexVec::new();
        assert_eq!(vec.push("a"), 0);
        assert_eq!(vec.push("b"), 1);
        assert_eq!(vec.next_index(), 2);
        assert_eq!(vec[1], "b");
    }

    #[test]
    fn test_iter_enumerated_pairs_indices() {
        let vec: IndexVec<usize, char> = "xyz".chars().collect();
        let pairs: Vec<_> = vec.iter_enumerated().map(|(i, c)| (i, *c)).collect();
        assert_eq!(pairs, vec![(0, 'x'), (1, 'y'), (2, 'z')]);
    }
}
