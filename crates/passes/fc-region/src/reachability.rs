//! Which loans and placeholders reach which subset-graph nodes.

use std::collections::VecDeque;

use fc_index::{BitSet, Idx, IndexVec};
use fc_mir::{LoanId, OriginId};
use tracing::debug;

use crate::ReachabilityMode;
use crate::graph::{NodeIdx, SubsetGraph};
use crate::relate::OriginAt;
use crate::scc::{SccIdx, Sccs};

/// Loan and placeholder membership of every node.
///
/// In [`ReachabilityMode::Scc`] the sets are stored once per component;
/// in [`ReachabilityMode::Direct`] once per node.
#[derive(Debug, Clone)]
pub struct LoanReachability {
    mode: ReachabilityMode,
    num_points: usize,
    set_of_node: IndexVec<NodeIdx, usize>,
    loans: Vec<BitSet<LoanId>>,
    placeholders: Vec<BitSet<OriginId>>,
}

impl LoanReachability {
    /// Computes membership with the given strategy.
    #[must_use]
    pub fn compute(graph: &SubsetGraph, num_points: usize, mode: ReachabilityMode) -> Self {
        let reach = match mode {
            ReachabilityMode::Scc => Self::through_sccs(graph, num_points),
            ReachabilityMode::Direct => Self::by_search(graph, num_points),
        };
        debug!(?mode, sets = reach.loans.len(), "computed loan reachability");
        reach
    }

    fn through_sccs(graph: &SubsetGraph, num_points: usize) -> Self {
        let sccs = Sccs::new(graph);
        let mut loans = vec![BitSet::new_empty(graph.num_loans()); sccs.len()];
        let mut placeholders = vec![BitSet::new_empty(graph.num_origins()); sccs.len()];
        for node in graph.nodes() {
            let scc = sccs.scc_of(node).index();
            for &loan in graph.loan_sources(node) {
                loans[scc].insert(loan);
            }
            for &origin in graph.placeholders(node) {
                placeholders[scc].insert(origin);
            }
        }

        // Predecessor components have higher indices, so walking down the
        // indices sees every component after all of its predecessors.
        for scc in (0..sccs.len()).rev() {
            let scc_loans = loans[scc].clone();
            let scc_placeholders = placeholders[scc].clone();
            for succ in sccs.successors(SccIdx::new(scc)) {
                loans[succ.index()].union(&scc_loans);
                placeholders[succ.index()].union(&scc_placeholders);
            }
        }

        let set_of_node = graph.nodes().map(|node| sccs.scc_of(node).index()).collect();
        Self {
            mode: ReachabilityMode::Scc,
            num_points,
            set_of_node,
            loans,
            placeholders,
        }
    }

    fn by_search(graph: &SubsetGraph, num_points: usize) -> Self {
        let mut loans = vec![BitSet::new_empty(graph.num_loans()); graph.len()];
        let mut placeholders = vec![BitSet::new_empty(graph.num_origins()); graph.len()];
        for source in graph.nodes() {
            let sources = graph.loan_sources(source);
            let marks = graph.placeholders(source);
            if sources.is_empty() && marks.is_empty() {
                continue;
            }
            let mut visited = BitSet::new_empty(graph.len());
            let mut queue = VecDeque::from([source]);
            visited.insert(source);
            while let Some(node) = queue.pop_front() {
                for &loan in sources {
                    loans[node.index()].insert(loan);
                }
                for &origin in marks {
                    placeholders[node.index()].insert(origin);
                }
                for &succ in graph.successors(node) {
                    if visited.insert(succ) {
                        queue.push_back(succ);
                    }
                }
            }
        }
        Self {
            mode: ReachabilityMode::Direct,
            num_points,
            set_of_node: graph.nodes().map(NodeIdx::index).collect(),
            loans,
            placeholders,
        }
    }

    fn set(&self, at: OriginAt) -> usize {
        self.set_of_node[NodeIdx::new(at.origin.index() * self.num_points + at.point.index())]
    }

    /// Strategy the sets were computed with.
    #[must_use]
    pub fn mode(&self) -> ReachabilityMode {
        self.mode
    }

    /// Loans that may be in `origin` at `point`.
    #[must_use]
    pub fn loans_in(&self, at: OriginAt) -> &BitSet<LoanId> {
        &self.loans[self.set(at)]
    }

    /// Universal placeholders that flow into `origin` at `point`.
    #[must_use]
    pub fn placeholders_in(&self, at: OriginAt) -> &BitSet<OriginId> {
        &self.placeholders[self.set(at)]
    }

    /// Returns `true` if `loan` may be in `origin` at `point`.
    #[must_use]
    pub fn contains(&self, at: OriginAt, loan: LoanId) -> bool {
        self.loans_in(at).contains(loan)
    }
}
