use std::fmt;
use std::marker::PhantomData;

use crate::Idx;

const WORD_BITS: usize = 64;

/// A fixed-domain set of indices backed by `u64` words.
///
/// All binary operations require both operands to share the same domain size.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitSet<I: Idx> {
    domain_size: usize,
    words: Vec<u64>,
    _marker: PhantomData<fn(&I)>,
}

impl<I: Idx> BitSet<I> {
    /// Creates an empty set able to hold indices below `domain_size`.
    #[must_use]
    pub fn new_empty(domain_size: usize) -> Self {
        Self {
            domain_size,
            words: vec![0; domain_size.div_ceil(WORD_BITS)],
            _marker: PhantomData,
        }
    }

    /// Number of indices the set can hold.
    #[must_use]
    pub fn domain_size(&self) -> usize {
        self.domain_size
    }

    /// Inserts `elem`, returning `true` if it was not already present.
    pub fn insert(&mut self, elem: I) -> bool {
        let (word, mask) = self.locate(elem);
        let before = self.words[word];
        self.words[word] |= mask;
        before != self.words[word]
    }

    /// Removes `elem`, returning `true` if it was present.
    pub fn remove(&mut self, elem: I) -> bool {
        let (word, mask) = self.locate(elem);
        let before = self.words[word];
        self.words[word] &= !mask;
        before != self.words[word]
    }

    /// Returns `true` if `elem` is in the set.
    #[must_use]
    pub fn contains(&self, elem: I) -> bool {
        let (word, mask) = self.locate(elem);
        self.words[word] & mask != 0
    }

    /// Adds every element of `other`, returning `true` if `self` changed.
    pub fn union(&mut self, other: &Self) -> bool {
        self.zip_words(other, |a, b| a | b)
    }

    /// Removes every element of `other`, returning `true` if `self` changed.
    pub fn subtract(&mut self, other: &Self) -> bool {
        self.zip_words(other, |a, b| a & !b)
    }

    /// Keeps only elements also in `other`, returning `true` if `self` changed.
    pub fn intersect(&mut self, other: &Self) -> bool {
        self.zip_words(other, |a, b| a & b)
    }

    /// Returns `true` if `self` and `other` share at least one element.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        assert_eq!(self.domain_size, other.domain_size);
        self.words
            .iter()
            .zip(&other.words)
            .any(|(a, b)| a & b != 0)
    }

    /// Returns `true` if every element of `self` is in `other`.
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        assert_eq!(self.domain_size, other.domain_size);
        self.words
            .iter()
            .zip(&other.words)
            .all(|(a, b)| a & !b == 0)
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }

    /// Returns `true` if the set holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// Number of elements in the set.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Iterates over the elements in ascending order.
    #[must_use]
    pub fn iter(&self) -> BitIter<'_, I> {
        BitIter {
            words: &self.words,
            word_index: 0,
            current: 0,
            base: 0,
            _marker: PhantomData,
        }
    }

    fn locate(&self, elem: I) -> (usize, u64) {
        let index = elem.index();
        assert!(
            index < self.domain_size,
            "bit set index {index} out of domain {}",
            self.domain_size
        );
        (index / WORD_BITS, 1u64 << (index % WORD_BITS))
    }

    fn zip_words(&mut self, other: &Self, op: impl Fn(u64, u64) -> u64) -> bool {
        assert_eq!(self.domain_size, other.domain_size);
        let mut changed = false;
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            let new = op(*word, *other_word);
            changed |= new != *word;
            *word = new;
        }
        changed
    }
}

impl<I: Idx> fmt::Debug for BitSet<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, I: Idx> IntoIterator for &'a BitSet<I> {
    type Item = I;
    type IntoIter = BitIter<'a, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending iterator over a [`BitSet`].
pub struct BitIter<'a, I: Idx> {
    words: &'a [u64],
    word_index: usize,
    current: u64,
    base: usize,
    _marker: PhantomData<fn(&I)>,
}

impl<I: Idx> Iterator for BitIter<'_, I> {
    type Item = I;

    fn next(&mut self) -> Option<I> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(I::new(self.base + bit));
            }
            let word = *self.words.get(self.word_index)?;
            self.current = word;
            self.base = self.word_index * WORD_BITS;
            self.word_index += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_remove_contains() {
        let mut set: BitSet<usize> = BitSet::new_empty(130);
        assert!(set.insert(3));
        assert!(!set.insert(3));
        assert!(set.insert(129));
        assert!(set.contains(129));
        assert!(set.remove(3));
        assert!(!set.contains(3));
        assert_eq!(set.count(), 1);
    }

    #[test]
    fn test_union_reports_change() {
        let mut a: BitSet<usize> = BitSet::new_empty(70);
        let mut b: BitSet<usize> = BitSet::new_empty(70);
        a.insert(1);
        b.insert(1);
        assert!(!a.union(&b));
        b.insert(65);
        assert!(a.union(&b));
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![1, 65]);
    }

    #[test]
    fn test_subtract_and_intersect() {
        let mut a: BitSet<usize> = BitSet::new_empty(10);
        let mut b: BitSet<usize> = BitSet::new_empty(10);
        for i in [1, 2, 3] {
            a.insert(i);
        }
        b.insert(2);
        let mut c = a.clone();
        assert!(c.subtract(&b));
        assert_eq!(c.iter().collect::<Vec<_>>(), vec![1, 3]);
        assert!(a.intersect(&b));
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![2]);
        assert!(a.is_subset(&b));
        assert!(a.intersects(&b));
        assert!(!c.intersects(&b));
    }

    #[test]
    #[should_panic(expected = "out of domain")]
    fn test_out_of_domain_panics() {
        let mut set: BitSet<usize> = BitSet::new_empty(4);
        set.insert(4);
    }
}
