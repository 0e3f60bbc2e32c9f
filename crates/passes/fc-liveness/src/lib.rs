//! Backward liveness over places.
//!
//! A place is live at a point if its current value may be read later. The
//! tracked universe is the deref-free prefix of every accessed place: reading
//! `(*p).f` keeps `p` live, writing `s.a` kills `s.a` (and anything below
//! it) but leaves `s.b` alone. A local is live when any place rooted at it is.
//!
//! The fixpoint is computed with round-robin passes over the blocks. Each
//! pass that changes something adds at least one `(place, point)` bit, so the
//! pass count never exceeds `places × points + 1`.

use fc_index::{BitSet, Idx, IndexVec, newtype_index};
use fc_mir::{AccessKind, BasicBlock, Body, LocalId, Place, PointIndex, PointTable};
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use tracing::{debug, instrument, trace};

newtype_index! {
    /// Index of a place in a [`PlaceTable`].
    pub struct PlaceIdx;
}

/// The places whose liveness is tracked, interned to dense indices.
#[derive(Debug, Clone, Default)]
pub struct PlaceTable {
    places: IndexSet<Place, FxBuildHasher>,
}

impl PlaceTable {
    /// Interns the liveness prefix of every place the body accesses.
    #[must_use]
    pub fn collect(body: &Body, points: &PointTable) -> Self {
        let mut table = Self::default();
        for point in points.points() {
            for access in body.accesses_at(points.location(point)) {
                table.intern(access.place.liveness_prefix());
            }
        }
        table
    }

    fn intern(&mut self, place: Place) -> PlaceIdx {
        PlaceIdx::new(self.places.insert_full(place).0)
    }

    /// Index of `place`, if it is tracked.
    #[must_use]
    pub fn index_of(&self, place: &Place) -> Option<PlaceIdx> {
        self.places.get_index_of(place).map(PlaceIdx::new)
    }

    /// The place at `idx`.
    #[must_use]
    pub fn place(&self, idx: PlaceIdx) -> &Place {
        &self.places[idx.index()]
    }

    /// Number of tracked places.
    #[must_use]
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Returns `true` if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Tracked places with their indices.
    pub fn iter_enumerated(&self) -> impl Iterator<Item = (PlaceIdx, &Place)> + '_ {
        self.places
            .iter()
            .enumerate()
            .map(|(i, place)| (PlaceIdx::new(i), place))
    }
}

/// Gen and kill sets of a single point.
#[derive(Debug, Clone)]
struct Transfer {
    gen_set: BitSet<PlaceIdx>,
    kill_set: BitSet<PlaceIdx>,
}

impl Transfer {
    fn of(body: &Body, points: &PointTable, places: &PlaceTable, point: PointIndex) -> Self {
        let mut gen_set = BitSet::new_empty(places.len());
        let mut kill_set = BitSet::new_empty(places.len());
        for access in body.accesses_at(points.location(point)) {
            let overwrites = match access.kind {
                AccessKind::Write => !access.place.has_deref(),
                AccessKind::StorageDead => true,
                AccessKind::Read | AccessKind::Move | AccessKind::Borrow(_) => false,
            };
            if overwrites {
                for (idx, place) in places.iter_enumerated() {
                    if access.place.is_prefix_of(place) {
                        kill_set.insert(idx);
                    }
                }
            } else if let Some(idx) = places.index_of(&access.place.liveness_prefix()) {
                gen_set.insert(idx);
            }
        }
        Self { gen_set, kill_set }
    }

    fn apply(&self, state: &mut BitSet<PlaceIdx>) {
        state.subtract(&self.kill_set);
        state.union(&self.gen_set);
    }
}

/// Liveness of places and locals at every point of a body.
#[derive(Debug, Clone)]
pub struct Liveness {
    places: PlaceTable,
    live: IndexVec<PointIndex, BitSet<PlaceIdx>>,
    live_locals: IndexVec<PointIndex, BitSet<LocalId>>,
    passes: usize,
}

impl Liveness {
    /// Computes liveness visiting blocks in postorder, which usually
    /// converges in the fewest passes for a backward problem.
    #[must_use]
    pub fn compute(body: &Body, points: &PointTable) -> Self {
        let mut order = body.reverse_postorder();
        order.reverse();
        Self::compute_with_order(body, points, &order)
    }

    /// Computes liveness visiting blocks in `order` on every pass.
    ///
    /// Blocks missing from `order` are visited after it in index order. The
    /// fixpoint does not depend on the order; only the pass count does.
    #[instrument(level = "debug", skip_all, fields(body = %body.fn_name()))]
    pub fn compute_with_order(body: &Body, points: &PointTable, order: &[BasicBlock]) -> Self {
        let places = PlaceTable::collect(body, points);
        let transfers: IndexVec<PointIndex, Transfer> =
            IndexVec::from_fn_n(|point| Transfer::of(body, points, &places, point), points.len());
        let mut live: IndexVec<PointIndex, BitSet<PlaceIdx>> =
            IndexVec::from_elem_n(BitSet::new_empty(places.len()), points.len());

        let mut visit: Vec<BasicBlock> = order.to_vec();
        visit.extend(body.basic_blocks.indices().filter(|bb| !order.contains(bb)));

        let mut passes = 0;
        loop {
            passes += 1;
            let mut changed = false;
            for &block in &visit {
                for point in points.points_of(block).rev() {
                    let mut state = BitSet::new_empty(places.len());
                    for &succ in points.successors(point) {
                        state.union(&live[succ]);
                    }
                    transfers[point].apply(&mut state);
                    if state != live[point] {
                        live[point] = state;
                        changed = true;
                    }
                }
            }
            trace!(passes, changed, "liveness pass");
            if !changed {
                break;
            }
        }

        let live_locals = live
            .iter()
            .map(|set| {
                let mut locals = BitSet::new_empty(body.locals.len());
                for idx in set {
                    locals.insert(places.place(idx).local);
                }
                locals
            })
            .collect();

        debug!(passes, places = places.len(), points = points.len(), "liveness reached fixpoint");
        Self {
            places,
            live,
            live_locals,
            passes,
        }
    }

    /// The tracked places.
    #[must_use]
    pub fn places(&self) -> &PlaceTable {
        &self.places
    }

    /// Places live on entry to `point`.
    pub fn live_places(&self, point: PointIndex) -> impl Iterator<Item = &Place> + '_ {
        self.live[point].iter().map(|idx| self.places.place(idx))
    }

    /// Bit set of places live on entry to `point`.
    #[must_use]
    pub fn live_place_set(&self, point: PointIndex) -> &BitSet<PlaceIdx> {
        &self.live[point]
    }

    /// Locals live on entry to `point`.
    #[must_use]
    pub fn live_locals(&self, point: PointIndex) -> &BitSet<LocalId> {
        &self.live_locals[point]
    }

    /// Returns `true` if some place rooted at `local` is live at `point`.
    #[must_use]
    pub fn is_live(&self, local: LocalId, point: PointIndex) -> bool {
        self.live_locals[point].contains(local)
    }

    /// Number of round-robin passes, including the final one that changed
    /// nothing.
    #[must_use]
    pub fn passes(&self) -> usize {
        self.passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_mir::{BodyBuilder, BorrowKind, Location, Operand, Ty};

    #[test]
    fn test_read_through_deref_keeps_pointer_live() {
        let mut b = BodyBuilder::new("f");
        let r = b.origin("r");
        let x = b.local("x", Ty::Int);
        let p = b.local("p", Ty::shared_ref(r, Ty::Int));
        let y = b.local("y", Ty::Int);
        let bb0 = b.block();
        b.assign_const(bb0, x, 1);
        b.borrow(bb0, p, r, BorrowKind::Shared, x);
        b.copy(bb0, y, Place::from_local(p).deref());
        b.ret(bb0);
        let body = b.finish().unwrap();
        let points = PointTable::new(&body);
        let liveness = Liveness::compute(&body, &points);

        let at = |i| points.point(Location::new(bb0, i));
        assert!(liveness.is_live(p, at(2)));
        assert!(!liveness.is_live(p, at(1)));
        assert!(liveness.is_live(x, at(1)));
        assert!(!liveness.is_live(x, at(0)));
        assert!(!liveness.is_live(y, at(3)));
        assert_eq!(liveness.live_places(at(2)).count(), 1);
    }

    #[test]
    fn test_field_write_kills_only_that_field() {
        let mut b = BodyBuilder::new("f");
        let pair = b.struct_ty("Pair", &[("a", Ty::Int), ("b", Ty::Int)]);
        let s = b.local("s", pair);
        let y = b.local("y", Ty::Int);
        let bb0 = b.block();
        let sa = b.field(s, "a");
        let sb = b.field(s, "b");
        b.copy(bb0, y, sa.clone());
        b.assign_const(bb0, sb, 2);
        b.assign_const(bb0, sa.clone(), 1);
        b.copy(bb0, y, sa.clone());
        b.ret(bb0);
        let body = b.finish().unwrap();
        let points = PointTable::new(&body);
        let liveness = Liveness::compute(&body, &points);

        let at = |i| points.point(Location::new(bb0, i));
        let sa_idx = liveness.places().index_of(&sa).unwrap();
        assert!(liveness.live_place_set(at(3)).contains(sa_idx));
        assert!(!liveness.live_place_set(at(2)).contains(sa_idx));
        assert!(!liveness.is_live(s, at(1)));
        assert!(liveness.is_live(s, at(0)));
    }

    #[test]
    fn test_write_through_deref_uses_pointer() {
        let mut b = BodyBuilder::new("f");
        let r = b.origin("r");
        let x = b.local("x", Ty::Int);
        let p = b.local("p", Ty::mut_ref(r, Ty::Int));
        let bb0 = b.block();
        b.borrow(bb0, p, r, BorrowKind::Mutable, x);
        b.assign_const(bb0, Place::from_local(p).deref(), 5);
        b.ret(bb0);
        let body = b.finish().unwrap();
        let points = PointTable::new(&body);
        let liveness = Liveness::compute(&body, &points);

        assert!(liveness.is_live(p, points.point(Location::new(bb0, 1))));
        assert!(!liveness.is_live(p, points.point(Location::new(bb0, 0))));
    }

    #[test]
    fn test_loop_keeps_variable_live_around_back_edge() {
        let mut b = BodyBuilder::new("f");
        let i = b.local("i", Ty::Int);
        let c = b.local("c", Ty::Bool);
        let bb0 = b.block();
        let bb1 = b.block();
        let bb2 = b.block();
        b.assign_const(bb0, i, 0);
        b.goto(bb0, bb1);
        b.copy(bb1, i, i);
        b.switch(bb1, Operand::Copy(c.into()), vec![bb1, bb2]);
        b.ret(bb2);
        let body = b.finish().unwrap();
        let points = PointTable::new(&body);
        let liveness = Liveness::compute(&body, &points);

        let term1 = points.block_terminator(bb1);
        assert!(liveness.is_live(i, term1));
        assert!(liveness.is_live(c, points.block_entry(bb1)));
        assert!(liveness.is_live(c, points.block_entry(bb0)));
        assert!(!liveness.is_live(i, points.block_entry(bb0)));
        assert!(liveness.passes() <= liveness.places().len() * points.len() + 1);

        let reversed: Vec<_> = body.basic_blocks.indices().collect();
        let other = Liveness::compute_with_order(&body, &points, &reversed);
        for point in points.points() {
            assert_eq!(liveness.live_place_set(point), other.live_place_set(point));
        }
    }
}
