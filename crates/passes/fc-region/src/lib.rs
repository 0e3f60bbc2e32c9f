//! Origin inference over flow-sensitive environments.
//!
//! Origins are sets of loans. Each origin is read separately at every
//! program point, giving the `(origin, point)` nodes of a subset graph.
//! Subtyping between the environments of adjacent points (see [`env`])
//! produces the graph's edges; loans enter at the node of their borrow's
//! origin at the creation point, and a node contains every loan that can
//! reach it.
//!
//! Universal origins belong to the signature. The body may not put its own
//! loans into them, nor let one universal origin flow into another unless a
//! known subset allows it; both are reported as [`RegionError`]s.

mod config;
pub mod env;
mod error;
pub mod graph;
pub mod reachability;
pub mod relate;
pub mod scc;
mod universal;

pub use config::{ReachabilityMode, RegionConfig};
pub use env::{Environment, Environments};
pub use error::RegionError;
pub use graph::{NodeIdx, SubsetGraph};
pub use reachability::LoanReachability;
pub use relate::{Cause, CauseKind, ConstraintKind, Obligation, OriginAt};

use fc_index::BitSet;
use fc_liveness::Liveness;
use fc_mir::{Body, LoanId, LoanTable, OriginId, PointIndex, PointTable};
use tracing::{debug, instrument};

/// The solved subset graph of a body.
#[derive(Debug, Clone)]
pub struct RegionInference {
    obligations: Vec<Obligation>,
    graph: SubsetGraph,
    reachability: LoanReachability,
    universal_errors: Vec<RegionError>,
}

impl RegionInference {
    /// Generates obligations, builds the subset graph, computes loan
    /// membership and checks universal origins.
    ///
    /// # Errors
    ///
    /// Returns the type errors that prevent obligations from being
    /// generated. Universal-origin violations are not fatal; they are
    /// available from [`universal_errors`](Self::universal_errors).
    #[instrument(level = "debug", skip_all, fields(body = %body.fn_name()))]
    pub fn compute(
        body: &Body,
        points: &PointTable,
        liveness: &Liveness,
        loans: &LoanTable,
        config: &RegionConfig,
    ) -> Result<Self, Vec<RegionError>> {
        let obligations = Environments::new(body, points, liveness).obligations(config)?;
        let graph = SubsetGraph::build(body, points, loans, &obligations);
        let reachability = LoanReachability::compute(&graph, points.len(), config.reachability);
        let universal_errors = universal::check_universals(body, points, loans, &reachability);
        debug!(
            obligations = obligations.len(),
            universal_errors = universal_errors.len(),
            "region inference done"
        );
        Ok(Self {
            obligations,
            graph,
            reachability,
            universal_errors,
        })
    }

    /// Obligations the graph was built from.
    #[must_use]
    pub fn obligations(&self) -> &[Obligation] {
        &self.obligations
    }

    /// The subset graph.
    #[must_use]
    pub fn graph(&self) -> &SubsetGraph {
        &self.graph
    }

    /// Loan membership of every node.
    #[must_use]
    pub fn reachability(&self) -> &LoanReachability {
        &self.reachability
    }

    /// Loans that may be in `origin` at `point`.
    #[must_use]
    pub fn loans_in(&self, origin: OriginId, point: PointIndex) -> &BitSet<LoanId> {
        self.reachability.loans_in(OriginAt::new(origin, point))
    }

    /// Returns `true` if `loan` may be in `origin` at `point`.
    #[must_use]
    pub fn contains(&self, origin: OriginId, point: PointIndex, loan: LoanId) -> bool {
        self.reachability.contains(OriginAt::new(origin, point), loan)
    }

    /// Loans escaping into universal origins and undeclared flows between
    /// universal origins.
    #[must_use]
    pub fn universal_errors(&self) -> &[RegionError] {
        &self.universal_errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_index::Idx;
    use fc_mir::{BodyBuilder, BorrowKind, Location, Operand, Ty};

    fn infer(body: &Body, config: &RegionConfig) -> (PointTable, RegionInference) {
        let points = PointTable::new(body);
        let liveness = Liveness::compute(body, &points);
        let loans = LoanTable::collect(body);
        let inference = RegionInference::compute(body, &points, &liveness, &loans, config).unwrap();
        (points, inference)
    }

    #[test]
    fn test_loan_flows_from_borrow_into_destination() {
        let mut b = BodyBuilder::new("f");
        let r0 = b.origin("0");
        let r1 = b.origin("1");
        let x = b.local("x", Ty::Int);
        let p = b.local("p", Ty::shared_ref(r0, Ty::Int));
        let q = b.local("q", Ty::shared_ref(r1, Ty::Int));
        let y = b.local("y", Ty::Int);
        let bb0 = b.block();
        b.borrow(bb0, p, r0, BorrowKind::Shared, x);
        b.copy(bb0, q, p);
        b.copy(bb0, y, fc_mir::Place::from_local(q).deref());
        b.ret(bb0);
        let body = b.finish().unwrap();
        let (points, inference) = infer(&body, &RegionConfig::default());

        let l0 = LoanId::new(0);
        let at = |i| points.point(Location::new(bb0, i));
        assert!(inference.contains(r0, at(0), l0));
        assert!(inference.contains(r0, at(1), l0));
        assert!(inference.contains(r1, at(2), l0));
        assert!(!inference.contains(r1, at(1), l0));
        assert!(inference.universal_errors().is_empty());
    }

    #[test]
    fn test_local_borrow_escaping_into_universal_is_reported() {
        let mut b = BodyBuilder::new("escape");
        let a = b.universal_origin("a");
        let r0 = b.origin("0");
        let x = b.local("x", Ty::Int);
        let ret = b.return_local("ret", Ty::shared_ref(a, Ty::Int));
        let bb0 = b.block();
        b.borrow(bb0, ret, r0, BorrowKind::Shared, x);
        b.ret(bb0);
        let body = b.finish().unwrap();
        let (_, inference) = infer(&body, &RegionConfig::default());

        assert_eq!(inference.universal_errors().len(), 1);
        assert!(matches!(
            &inference.universal_errors()[0],
            RegionError::LoanEscapes { origin, location, .. }
                if origin == "a" && *location == Location::new(bb0, 1)
        ));
    }

    #[test]
    fn test_reborrow_through_parameter_does_not_escape() {
        let mut b = BodyBuilder::new("reborrow");
        let a = b.universal_origin("a");
        let r0 = b.origin("0");
        let x = b.local("x", Ty::mut_ref(a, Ty::Int));
        let ret = b.return_local("ret", Ty::shared_ref(a, Ty::Int));
        let bb0 = b.block();
        b.borrow(bb0, ret, r0, BorrowKind::Shared, fc_mir::Place::from_local(x).deref());
        b.ret(bb0);
        let body = b.finish().unwrap();
        let (points, inference) = infer(&body, &RegionConfig::default());

        assert!(inference.contains(a, points.point(Location::new(bb0, 1)), LoanId::new(0)));
        assert!(inference.universal_errors().is_empty());
    }

    #[test]
    fn test_reborrow_of_local_reference_still_escapes() {
        let mut b = BodyBuilder::new("reborrow_local");
        let a = b.universal_origin("a");
        let r0 = b.origin("0");
        let r1 = b.origin("1");
        let z = b.local("z", Ty::Int);
        let y = b.local("y", Ty::mut_ref(r1, Ty::Int));
        let ret = b.return_local("ret", Ty::shared_ref(a, Ty::Int));
        let bb0 = b.block();
        b.borrow(bb0, y, r1, BorrowKind::Mutable, z);
        b.borrow(bb0, ret, r0, BorrowKind::Shared, fc_mir::Place::from_local(y).deref());
        b.ret(bb0);
        let body = b.finish().unwrap();
        let (_, inference) = infer(&body, &RegionConfig::default());

        assert!(inference.universal_errors().iter().any(|error| matches!(
            error,
            RegionError::LoanEscapes { loan, origin, .. } if loan.index() == 0 && origin == "a"
        )));
    }

    #[test]
    fn test_scc_and_direct_reachability_agree_on_loops() {
        let mut b = BodyBuilder::new("looping");
        let r0 = b.origin("0");
        let r1 = b.origin("1");
        let x = b.local("x", Ty::Int);
        let y = b.local("y", Ty::Int);
        let c = b.local("c", Ty::Bool);
        let p = b.local("p", Ty::mut_ref(r0, Ty::Int));
        let q = b.local("q", Ty::mut_ref(r1, Ty::Int));
        let bb0 = b.block();
        let bb1 = b.block();
        let bb2 = b.block();
        b.borrow(bb0, p, r0, BorrowKind::Mutable, x);
        b.goto(bb0, bb1);
        b.copy(bb1, q, p);
        b.borrow(bb1, p, r0, BorrowKind::Mutable, y);
        b.assign_const(bb1, fc_mir::Place::from_local(q).deref(), 1);
        b.switch(bb1, Operand::Copy(c.into()), vec![bb1, bb2]);
        b.copy(bb2, x, fc_mir::Place::from_local(p).deref());
        b.ret(bb2);
        let body = b.finish().unwrap();

        let (points, scc) = infer(&body, &RegionConfig::default());
        let direct_config = RegionConfig {
            reachability: ReachabilityMode::Direct,
            ..RegionConfig::default()
        };
        let (_, direct) = infer(&body, &direct_config);
        assert_eq!(direct.reachability().mode(), ReachabilityMode::Direct);
        for origin in [r0, r1] {
            for point in points.points() {
                assert_eq!(scc.loans_in(origin, point), direct.loans_in(origin, point));
            }
        }
    }
}
