//! Forward dataflow of the loans still observable at each point.
//!
//! A loan is generated where it is created. It stays active while some
//! origin of a variable live at the next point contains it (universal
//! origins count as always live), and is killed for good when the borrowed
//! place, or a prefix of it, is overwritten or dies. Kills at a point apply
//! before the point's own gen.

use fc_index::{BitSet, IndexVec};
use fc_liveness::Liveness;
use fc_mir::{
    BasicBlock, Body, LoanId, LoanTable, Place, PointIndex, PointTable, StatementKind,
    TerminatorKind,
};
use fc_region::RegionInference;
use tracing::{debug, instrument, trace};

/// Active loans on entry to every point.
#[derive(Debug, Clone)]
pub struct ActiveLoans {
    on_entry: IndexVec<PointIndex, BitSet<LoanId>>,
    live_loans: IndexVec<PointIndex, BitSet<LoanId>>,
    passes: usize,
}

/// Loans contained by some origin of a variable live at `point`, plus
/// everything in a universal origin.
fn live_loans_at(
    body: &Body,
    liveness: &Liveness,
    regions: &RegionInference,
    num_loans: usize,
    point: PointIndex,
) -> BitSet<LoanId> {
    let mut live = BitSet::new_empty(num_loans);
    for local in liveness.live_locals(point) {
        for origin in body.local_decl(local).ty.origins() {
            live.union(regions.loans_in(origin, point));
        }
    }
    for universal in body.universal_origins() {
        live.union(regions.loans_in(universal, point));
    }
    live
}

/// The place whose loans stop existing at `point`: the non-deref
/// destination of an assignment or call, or a local whose storage ends.
fn killed_place(body: &Body, points: &PointTable, point: PointIndex) -> Option<Place> {
    let location = points.location(point);
    let data = &body.basic_blocks[location.block];
    let place = match data.statements.get(location.statement_index) {
        Some(statement) => match &statement.kind {
            StatementKind::Assign(dest, _) => dest.clone(),
            StatementKind::StorageDead(local) => Place::from_local(*local),
            StatementKind::Nop => return None,
        },
        None => match &data.terminator.kind {
            TerminatorKind::Call { destination, .. } => destination.clone(),
            _ => return None,
        },
    };
    (!place.has_deref()).then_some(place)
}

impl ActiveLoans {
    /// Computes active loans visiting blocks in reverse postorder.
    #[must_use]
    pub fn compute(
        body: &Body,
        points: &PointTable,
        liveness: &Liveness,
        loans: &LoanTable,
        regions: &RegionInference,
    ) -> Self {
        let order = body.reverse_postorder();
        Self::compute_with_order(body, points, liveness, loans, regions, &order)
    }

    /// Computes active loans visiting blocks in `order` on every pass.
    ///
    /// Blocks missing from `order` are visited after it in index order.
    #[instrument(level = "debug", skip_all, fields(body = %body.fn_name()))]
    pub fn compute_with_order(
        body: &Body,
        points: &PointTable,
        liveness: &Liveness,
        loans: &LoanTable,
        regions: &RegionInference,
        order: &[BasicBlock],
    ) -> Self {
        let num_loans = loans.len();
        let live_loans: IndexVec<PointIndex, BitSet<LoanId>> = IndexVec::from_fn_n(
            |point| live_loans_at(body, liveness, regions, num_loans, point),
            points.len(),
        );
        let kills: IndexVec<PointIndex, BitSet<LoanId>> = IndexVec::from_fn_n(
            |point| {
                let mut kill = BitSet::new_empty(num_loans);
                if let Some(place) = killed_place(body, points, point) {
                    for loan in loans.iter() {
                        if place.is_prefix_of(&loan.place) {
                            kill.insert(loan.id);
                        }
                    }
                }
                kill
            },
            points.len(),
        );

        let mut on_entry: IndexVec<PointIndex, BitSet<LoanId>> =
            IndexVec::from_elem_n(BitSet::new_empty(num_loans), points.len());
        let mut visit: Vec<BasicBlock> = order.to_vec();
        visit.extend(body.basic_blocks.indices().filter(|bb| !order.contains(bb)));

        let mut passes = 0;
        loop {
            passes += 1;
            let mut changed = false;
            for &block in &visit {
                for point in points.points_of(block) {
                    let mut state = on_entry[point].clone();
                    state.subtract(&kills[point]);
                    if let Some(loan) = loans.loan_at(points.location(point)) {
                        state.insert(loan);
                    }
                    for &succ in points.successors(point) {
                        let mut flowing = state.clone();
                        flowing.intersect(&live_loans[succ]);
                        changed |= on_entry[succ].union(&flowing);
                    }
                }
            }
            trace!(passes, changed, "active loans pass");
            if !changed {
                break;
            }
        }

        debug!(passes, loans = num_loans, "active loans reached fixpoint");
        Self {
            on_entry,
            live_loans,
            passes,
        }
    }

    /// Loans active on entry to `point`.
    #[must_use]
    pub fn active_on_entry(&self, point: PointIndex) -> &BitSet<LoanId> {
        &self.on_entry[point]
    }

    /// Loans reachable from some live variable at `point`.
    #[must_use]
    pub fn live_loans(&self, point: PointIndex) -> &BitSet<LoanId> {
        &self.live_loans[point]
    }

    /// Number of round-robin passes, including the final one that changed
    /// nothing.
    #[must_use]
    pub fn passes(&self) -> usize {
        self.passes
    }
}
