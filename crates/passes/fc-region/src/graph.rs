//! The subset graph over `(origin, point)` nodes.

use fc_index::{Idx, IndexVec, newtype_index};
use fc_mir::{Body, LoanId, LoanTable, OriginId, PointIndex, PointTable};
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::relate::{ConstraintKind, Obligation, OriginAt};

newtype_index! {
    /// A subset-graph node, numbered `origin * points + point`.
    pub struct NodeIdx;
}

/// Directed graph whose edges mean "the loans of this node may flow into
/// that node".
///
/// Loans enter at the node of the borrow's origin at the creation point.
/// Every universal origin additionally carries a placeholder for itself at
/// each of its nodes, so universal-to-universal flows can be observed the
/// same way as loans.
#[derive(Debug, Clone)]
pub struct SubsetGraph {
    num_points: usize,
    successors: IndexVec<NodeIdx, Vec<NodeIdx>>,
    loan_sources: IndexVec<NodeIdx, Vec<LoanId>>,
    placeholders: IndexVec<NodeIdx, Vec<OriginId>>,
    num_loans: usize,
    num_origins: usize,
    num_edges: usize,
}

impl SubsetGraph {
    /// Builds the graph from obligations, loans and universal origins.
    #[must_use]
    pub fn build(
        body: &Body,
        points: &PointTable,
        loans: &LoanTable,
        obligations: &[Obligation],
    ) -> Self {
        let num_points = points.len();
        let num_nodes = body.origins.len() * num_points;
        let mut graph = Self {
            num_points,
            successors: IndexVec::from_elem_n(Vec::new(), num_nodes),
            loan_sources: IndexVec::from_elem_n(Vec::new(), num_nodes),
            placeholders: IndexVec::from_elem_n(Vec::new(), num_nodes),
            num_loans: loans.len(),
            num_origins: body.origins.len(),
            num_edges: 0,
        };
        let mut seen = FxHashSet::default();

        for obligation in obligations {
            let sub = graph.node(obligation.sub);
            let sup = graph.node(obligation.sup);
            graph.add_edge(&mut seen, sub, sup);
            if obligation.kind == ConstraintKind::Equal {
                graph.add_edge(&mut seen, sup, sub);
            }
        }

        for loan in loans.iter() {
            let point = points.point(loan.location);
            let node = graph.node(OriginAt::new(loan.origin, point));
            graph.loan_sources[node].push(loan.id);
        }

        for universal in body.universal_origins() {
            for point in points.points() {
                let node = graph.node(OriginAt::new(universal, point));
                graph.placeholders[node].push(universal);
                for &succ in points.successors(point) {
                    let next = graph.node(OriginAt::new(universal, succ));
                    graph.add_edge(&mut seen, node, next);
                }
            }
        }

        debug!(
            nodes = graph.len(),
            edges = graph.num_edges,
            loans = graph.num_loans,
            "built subset graph"
        );
        graph
    }

    fn add_edge(&mut self, seen: &mut FxHashSet<(NodeIdx, NodeIdx)>, from: NodeIdx, to: NodeIdx) {
        if seen.insert((from, to)) {
            self.successors[from].push(to);
            self.num_edges += 1;
        }
    }

    /// Node of `origin` at `point`.
    #[must_use]
    pub fn node(&self, at: OriginAt) -> NodeIdx {
        NodeIdx::new(at.origin.index() * self.num_points + at.point.index())
    }

    /// The `(origin, point)` pair a node stands for.
    #[must_use]
    pub fn origin_at(&self, node: NodeIdx) -> OriginAt {
        OriginAt::new(
            OriginId::new(node.index() / self.num_points),
            PointIndex::new(node.index() % self.num_points),
        )
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.successors.len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Number of loans in the body, the domain of loan sets.
    #[must_use]
    pub fn num_loans(&self) -> usize {
        self.num_loans
    }

    /// Number of origins in the body, the domain of placeholder sets.
    #[must_use]
    pub fn num_origins(&self) -> usize {
        self.num_origins
    }

    /// Nodes `node` flows into.
    #[must_use]
    pub fn successors(&self, node: NodeIdx) -> &[NodeIdx] {
        &self.successors[node]
    }

    /// Loans created into `node`.
    #[must_use]
    pub fn loan_sources(&self, node: NodeIdx) -> &[LoanId] {
        &self.loan_sources[node]
    }

    /// Universal placeholders attached to `node`.
    #[must_use]
    pub fn placeholders(&self, node: NodeIdx) -> &[OriginId] {
        &self.placeholders[node]
    }

    /// All nodes.
    pub fn nodes(&self) -> impl DoubleEndedIterator<Item = NodeIdx> + use<> {
        self.successors.indices()
    }
}
