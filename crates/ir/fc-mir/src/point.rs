//! Program points and the point-level control-flow graph.

use std::fmt;

use fc_index::{Idx, IndexVec, newtype_index};

use crate::{BasicBlock, Body};

/// A position in a body: before statement `statement_index` of `block`, or
/// before its terminator when `statement_index` equals the statement count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    /// Block containing the point
    pub block: BasicBlock,
    /// Statement index within the block
    pub statement_index: usize,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub const fn new(block: BasicBlock, statement_index: usize) -> Self {
        Self {
            block,
            statement_index,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.block, self.statement_index)
    }
}

newtype_index! {
    /// Dense number of a [`Location`].
    pub struct PointIndex;
}

/// Numbering of every point of a body, with point-level successor and
/// predecessor edges.
///
/// Within a block each point flows to the next; the terminator point flows
/// to the first point of each successor block.
#[derive(Debug, Clone)]
pub struct PointTable {
    block_starts: IndexVec<BasicBlock, PointIndex>,
    locations: IndexVec<PointIndex, Location>,
    successors: IndexVec<PointIndex, Vec<PointIndex>>,
    predecessors: IndexVec<PointIndex, Vec<PointIndex>>,
}

impl PointTable {
    /// Numbers the points of `body` block by block.
    #[must_use]
    pub fn new(body: &Body) -> Self {
        let mut block_starts: IndexVec<BasicBlock, PointIndex> = IndexVec::with_capacity(body.basic_blocks.len());
        let mut locations: IndexVec<PointIndex, Location> = IndexVec::new();
        for (block, data) in body.basic_blocks.iter_enumerated() {
            block_starts.push(locations.next_index());
            for statement_index in 0..=data.statements.len() {
                locations.push(Location::new(block, statement_index));
            }
        }

        let mut successors: IndexVec<PointIndex, Vec<PointIndex>> =
            IndexVec::from_elem_n(Vec::new(), locations.len());
        let mut predecessors: IndexVec<PointIndex, Vec<PointIndex>> =
            IndexVec::from_elem_n(Vec::new(), locations.len());
        for (block, data) in body.basic_blocks.iter_enumerated() {
            let start = block_starts[block].index();
            let len = data.statements.len();
            for offset in 0..len {
                let from = PointIndex::new(start + offset);
                let to = PointIndex::new(start + offset + 1);
                successors[from].push(to);
                predecessors[to].push(from);
            }
            let terminator = PointIndex::new(start + len);
            for target in data.terminator.kind.successors() {
                let to = block_starts[target];
                if !successors[terminator].contains(&to) {
                    successors[terminator].push(to);
                    predecessors[to].push(terminator);
                }
            }
        }

        Self {
            block_starts,
            locations,
            successors,
            predecessors,
        }
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Returns `true` if the body has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Dense index of `location`.
    #[must_use]
    pub fn point(&self, location: Location) -> PointIndex {
        PointIndex::new(self.block_starts[location.block].index() + location.statement_index)
    }

    /// Location of `point`.
    #[must_use]
    pub fn location(&self, point: PointIndex) -> Location {
        self.locations[point]
    }

    /// Points control may reach in one step from `point`.
    #[must_use]
    pub fn successors(&self, point: PointIndex) -> &[PointIndex] {
        &self.successors[point]
    }

    /// Points that reach `point` in one step.
    #[must_use]
    pub fn predecessors(&self, point: PointIndex) -> &[PointIndex] {
        &self.predecessors[point]
    }

    /// First point of `block`.
    #[must_use]
    pub fn block_entry(&self, block: BasicBlock) -> PointIndex {
        self.block_starts[block]
    }

    /// Terminator point of `block`.
    #[must_use]
    pub fn block_terminator(&self, block: BasicBlock) -> PointIndex {
        let next = self
            .block_starts
            .get(BasicBlock::new(block.index() + 1))
            .map_or(self.locations.len(), |start| start.index());
        PointIndex::new(next - 1)
    }

    /// Points of `block` in execution order.
    pub fn points_of(&self, block: BasicBlock) -> impl DoubleEndedIterator<Item = PointIndex> {
        let start = self.block_entry(block).index();
        let end = self.block_terminator(block).index();
        (start..=end).map(PointIndex::new)
    }

    /// Every point in index order.
    pub fn points(&self) -> impl DoubleEndedIterator<Item = PointIndex> + use<> {
        self.locations.indices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BodyBuilder, Operand, Ty};

    #[test]
    fn test_points_cover_statements_and_terminators() {
        let mut b = BodyBuilder::new("f");
        let x = b.local("x", Ty::Int);
        let bb0 = b.block();
        let bb1 = b.block();
        let bb2 = b.block();
        b.assign_const(bb0, x, 1);
        b.assign_const(bb0, x, 2);
        b.switch(bb0, Operand::Copy(x.into()), vec![bb1, bb2]);
        b.goto(bb1, bb2);
        b.ret(bb2);
        let body = b.finish().unwrap();
        let points = PointTable::new(&body);

        assert_eq!(points.len(), 5);
        let term0 = points.block_terminator(bb0);
        assert_eq!(points.location(term0), Location::new(bb0, 2));
        assert_eq!(
            points.successors(term0),
            &[points.block_entry(bb1), points.block_entry(bb2)]
        );
        assert_eq!(points.predecessors(points.block_entry(bb2)).len(), 2);
        assert_eq!(points.points_of(bb0).count(), 3);
        assert_eq!(points.point(Location::new(bb2, 0)), points.block_entry(bb2));
        assert_eq!(Location::new(bb0, 2).to_string(), "bb0[2]");
    }
}
