//! Strongly connected components of the subset graph.

use fc_index::{Idx, IndexVec, newtype_index};

use crate::graph::{NodeIdx, SubsetGraph};

newtype_index! {
    /// A strongly connected component.
    pub struct SccIdx;
}

/// Condensation of a graph into its strongly connected components.
///
/// Components are numbered in the order Tarjan's algorithm completes them,
/// which puts every component after all components it can reach: edges
/// between components always go from a higher index to a lower one.
#[derive(Debug, Clone)]
pub struct Sccs {
    scc_of: IndexVec<NodeIdx, SccIdx>,
    successors: IndexVec<SccIdx, Vec<SccIdx>>,
}

const UNVISITED: usize = usize::MAX;

impl Sccs {
    /// Runs an iterative Tarjan over `graph`.
    #[must_use]
    pub fn new(graph: &SubsetGraph) -> Self {
        let n = graph.len();
        let mut index = vec![UNVISITED; n];
        let mut lowlink = vec![0; n];
        let mut on_stack = vec![false; n];
        let mut stack: Vec<NodeIdx> = Vec::new();
        let mut scc_of: IndexVec<NodeIdx, SccIdx> = IndexVec::from_elem_n(SccIdx::new(0), n);
        let mut num_sccs = 0;
        let mut next_index = 0;

        for root in graph.nodes() {
            if index[root.index()] != UNVISITED {
                continue;
            }
            let mut call_stack: Vec<(NodeIdx, usize)> = vec![(root, 0)];
            index[root.index()] = next_index;
            lowlink[root.index()] = next_index;
            next_index += 1;
            stack.push(root);
            on_stack[root.index()] = true;

            while let Some(&(node, child)) = call_stack.last() {
                if let Some(&succ) = graph.successors(node).get(child) {
                    if let Some(top) = call_stack.last_mut() {
                        top.1 += 1;
                    }
                    if index[succ.index()] == UNVISITED {
                        index[succ.index()] = next_index;
                        lowlink[succ.index()] = next_index;
                        next_index += 1;
                        stack.push(succ);
                        on_stack[succ.index()] = true;
                        call_stack.push((succ, 0));
                    } else if on_stack[succ.index()] {
                        lowlink[node.index()] = lowlink[node.index()].min(index[succ.index()]);
                    }
                    continue;
                }

                call_stack.pop();
                if let Some(&(parent, _)) = call_stack.last() {
                    lowlink[parent.index()] = lowlink[parent.index()].min(lowlink[node.index()]);
                }
                if lowlink[node.index()] == index[node.index()] {
                    let scc = SccIdx::new(num_sccs);
                    num_sccs += 1;
                    while let Some(member) = stack.pop() {
                        on_stack[member.index()] = false;
                        scc_of[member] = scc;
                        if member == node {
                            break;
                        }
                    }
                }
            }
        }

        let mut successors: IndexVec<SccIdx, Vec<SccIdx>> =
            IndexVec::from_elem_n(Vec::new(), num_sccs);
        for node in graph.nodes() {
            let from = scc_of[node];
            for &succ in graph.successors(node) {
                let to = scc_of[succ];
                if from != to && !successors[from].contains(&to) {
                    successors[from].push(to);
                }
            }
        }

        Self { scc_of, successors }
    }

    /// Component containing `node`.
    #[must_use]
    pub fn scc_of(&self, node: NodeIdx) -> SccIdx {
        self.scc_of[node]
    }

    /// Components directly reachable from `scc`.
    #[must_use]
    pub fn successors(&self, scc: SccIdx) -> &[SccIdx] {
        &self.successors[scc]
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.successors.len()
    }

    /// Returns `true` if there are no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }
}
