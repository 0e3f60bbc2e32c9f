//! Typed indices, index-keyed storage and dense bit sets.
//!
//! Every graph in the analysis (blocks, points, origins, loans, subset-graph
//! nodes) is addressed by a newtype over [`RawIdx`] declared with
//! [`newtype_index!`]. Dense per-index data lives in an [`IndexVec`], a typed
//! view of an [`Arena`]; sparse per-index data lives in an [`IndexMap`], a
//! typed view of an [`ArenaMap`]. Dataflow states are [`BitSet`]s over the
//! same indices.

mod bit_set;
mod map;
mod vec;

pub use bit_set::{BitIter, BitSet};
pub use la_arena::{Arena, ArenaMap, RawIdx};
pub use map::IndexMap;
pub use vec::IndexVec;

use std::fmt::Debug;
use std::hash::Hash;

/// A dense index type usable as a key for [`IndexVec`], [`IndexMap`] and
/// [`BitSet`].
pub trait Idx: Copy + Eq + Ord + Hash + Debug + 'static {
    /// Wraps an arena index.
    fn from_raw(raw: RawIdx) -> Self;

    /// The arena index this wraps.
    fn into_raw(self) -> RawIdx;

    /// Builds the index from a `usize` position.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not fit in a `u32`.
    #[must_use]
    fn new(index: usize) -> Self {
        assert!(index < u32::MAX as usize, "index overflowed u32");
        Self::from_raw(RawIdx::from_u32(index as u32))
    }

    /// The `usize` position of this index.
    #[must_use]
    fn index(self) -> usize {
        self.into_raw().into_u32() as usize
    }

    /// The same position as a typed arena index.
    #[must_use]
    fn arena_idx<T>(self) -> la_arena::Idx<T> {
        la_arena::Idx::from_raw(self.into_raw())
    }
}

impl Idx for usize {
    fn from_raw(raw: RawIdx) -> Self {
        raw.into_u32() as usize
    }

    fn into_raw(self) -> RawIdx {
        assert!(self < u32::MAX as usize, "index overflowed u32");
        RawIdx::from_u32(self as u32)
    }
}

/// Declares a newtype over [`RawIdx`] implementing [`Idx`].
///
/// ```
/// fc_index::newtype_index! {
///     /// A block in some graph.
///     pub struct BlockIdx;
/// }
///
/// use fc_index::Idx;
/// assert_eq!(BlockIdx::new(3).index(), 3);
/// ```
#[macro_export]
macro_rules! newtype_index {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        $vis struct $name($crate::RawIdx);

        impl $name {
            /// Creates the index from its raw value.
            #[must_use]
            #[allow(dead_code)]
            $vis const fn from_u32(value: u32) -> Self {
                Self($crate::RawIdx::from_u32(value))
            }

            /// Raw value of the index.
            #[must_use]
            #[allow(dead_code)]
            $vis const fn as_u32(self) -> u32 {
                self.0.into_u32()
            }
        }

        impl $crate::Idx for $name {
            fn from_raw(raw: $crate::RawIdx) -> Self {
                Self(raw)
            }

            fn into_raw(self) -> $crate::RawIdx {
                self.0
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    newtype_index! {
        struct TestIdx;
    }

    #[test]
    fn test_newtype_roundtrips_through_usize() {
        let idx = TestIdx::new(41);
        assert_eq!(idx.index(), 41);
        assert_eq!(idx.as_u32(), 41);
        assert_eq!(TestIdx::from_u32(41), idx);
        assert_eq!(idx.into_raw(), RawIdx::from_u32(41));
    }

    #[test]
    fn test_arena_indices_share_positions() {
        let mut arena = Arena::new();
        arena.alloc("a");
        let b = arena.alloc("b");
        assert_eq!(TestIdx::new(1).arena_idx::<&str>(), b);
        assert_eq!(TestIdx::from_raw(b.into_raw()).index(), 1);
    }
}
