//! Tree-likeness check.
//!
//! A vessel tree is walked breadth-first from its roots (inlet and/or
//! outlet). The graph is a tree when the walk never reaches a node twice,
//! reaches every node, each component satisfies `nodes == edges + 1`, and
//! there are no parallel edges, self-loops or coincident nodes.

use super::components::connected_components;
use super::duplicates::{degenerate_nodes, duplicate_edge_groups, self_loops};
use super::inlet_outlet::{CategoryConfig, identify_inlet_outlet};
use crate::graph::SpatialGraph;
use crate::graph_error::GraphError;
use thiserror::Error;

/// Options for [`is_tree`].
#[derive(Debug, Clone, PartialEq)]
pub struct TreeCheckOptions {
    /// Explicit roots. When both are `None` the roots are identified from
    /// `category`, falling back to node 0.
    pub inlet: Option<usize>,
    pub outlet: Option<usize>,
    /// Check `nodes == edges + 1` per component.
    pub euler: bool,
    /// Reject coincident node coordinates.
    pub check_degenerate: bool,
    pub category: CategoryConfig,
    /// Bound on breadth-first rounds per root; defaults to `2 * edges + 2`.
    pub max_iterations: Option<usize>,
}

impl Default for TreeCheckOptions {
    fn default() -> Self {
        Self {
            inlet: None,
            outlet: None,
            euler: true,
            check_degenerate: true,
            category: CategoryConfig::default(),
            max_iterations: None,
        }
    }
}

impl TreeCheckOptions {
    /// Walk from the given roots instead of identifying them.
    pub fn with_roots(mut self, inlet: Option<usize>, outlet: Option<usize>) -> Self {
        self.inlet = inlet;
        self.outlet = outlet;
        self
    }
}

/// First reason a graph is not a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeViolation {
    #[error("node {node} reached twice (via edge {edge})")]
    Revisited { node: usize, edge: usize },
    #[error("node {node} not reachable from the roots")]
    Unvisited { node: usize },
    #[error("component {component} has {nodes} nodes and {edges} edges")]
    Euler {
        component: usize,
        nodes: usize,
        edges: usize,
    },
    #[error("parallel edges {edges:?}")]
    DuplicateEdges { edges: Vec<usize> },
    #[error("self-loop on edge {edge}")]
    SelfLoop { edge: usize },
    #[error("nodes {nodes:?} share coordinates")]
    CoincidentNodes { nodes: Vec<usize> },
}

/// Outcome of [`is_tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeReport {
    pub is_tree: bool,
    pub violation: Option<TreeViolation>,
    /// Roots the walk started from.
    pub roots: Vec<usize>,
}

impl TreeReport {
    fn pass(roots: Vec<usize>) -> Self {
        Self {
            is_tree: true,
            violation: None,
            roots,
        }
    }

    fn fail(roots: Vec<usize>, violation: TreeViolation) -> Self {
        log::debug!("is_tree: {violation}");
        Self {
            is_tree: false,
            violation: Some(violation),
            roots,
        }
    }
}

fn roots(g: &SpatialGraph, options: &TreeCheckOptions) -> Result<Vec<usize>, GraphError> {
    let (inlet, outlet) = if options.inlet.is_some() || options.outlet.is_some() {
        (options.inlet, options.outlet)
    } else {
        match identify_inlet_outlet(g, &options.category) {
            Ok(found) => found,
            Err(GraphError::MissingField(_)) => (None, None),
            Err(e) => return Err(e),
        }
    };
    let mut out: Vec<usize> = inlet.into_iter().chain(outlet).collect();
    if out.is_empty() && g.node_count() > 0 {
        out.push(0);
    }
    for &r in &out {
        if r >= g.node_count() {
            return Err(GraphError::node_out_of_range(r, g.node_count()));
        }
    }
    Ok(out)
}

/// Check whether `g` is a tree (or a forest with one root per component).
///
/// A second root already reached from the first is not walked again.
///
/// # Errors
/// `IndexOutOfRange` for a bad explicit root, `IterationLimitExceeded` when a
/// walk exceeds `max_iterations` rounds.
pub fn is_tree(g: &SpatialGraph, options: &TreeCheckOptions) -> Result<TreeReport, GraphError> {
    g.check_structure()?;
    let roots = roots(g, options)?;
    let n = g.node_count();
    let adj = g.incidence();
    let limit = options
        .max_iterations
        .unwrap_or(2 * g.edge_count() + 2);

    let mut visited = vec![false; n];
    let mut via: Vec<Option<usize>> = vec![None; n];
    for &root in &roots {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        let mut front = vec![root];
        let mut rounds = 0;
        while !front.is_empty() {
            rounds += 1;
            if rounds > limit {
                return Err(GraphError::IterationLimitExceeded {
                    context: "tree walk",
                    limit,
                });
            }
            let mut next = Vec::new();
            for &u in &front {
                for &(e, w) in &adj[u] {
                    if via[u] == Some(e) {
                        continue;
                    }
                    if visited[w] {
                        return Ok(TreeReport::fail(roots, TreeViolation::Revisited { node: w, edge: e }));
                    }
                    visited[w] = true;
                    via[w] = Some(e);
                    next.push(w);
                }
            }
            front = next;
        }
    }
    if let Some(node) = visited.iter().position(|&v| !v) {
        return Ok(TreeReport::fail(roots, TreeViolation::Unvisited { node }));
    }

    if options.euler {
        let comp = connected_components(g)?;
        let count = comp.iter().copied().max().map_or(0, |m| m + 1);
        let mut nodes = vec![0usize; count];
        let mut edges = vec![0usize; count];
        for &c in &comp {
            nodes[c] += 1;
        }
        for [a, _] in g.edge_nodes() {
            edges[comp[a]] += 1;
        }
        if let Some(c) = (0..count).find(|&c| nodes[c] != edges[c] + 1) {
            return Ok(TreeReport::fail(
                roots,
                TreeViolation::Euler {
                    component: c,
                    nodes: nodes[c],
                    edges: edges[c],
                },
            ));
        }
    }

    if let Some(group) = duplicate_edge_groups(g).into_iter().next() {
        return Ok(TreeReport::fail(roots, TreeViolation::DuplicateEdges { edges: group }));
    }
    if let Some(&edge) = self_loops(g).first() {
        return Ok(TreeReport::fail(roots, TreeViolation::SelfLoop { edge }));
    }
    if options.check_degenerate {
        if let Some(group) = degenerate_nodes(g).into_iter().next() {
            return Ok(TreeReport::fail(roots, TreeViolation::CoincidentNodes { nodes: group }));
        }
    }
    Ok(TreeReport::pass(roots))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: usize, close: bool) -> SpatialGraph {
        let nodes: Vec<[f64; 3]> = (0..n).map(|i| [i as f64, (i % 2) as f64, 0.]).collect();
        let mut conn: Vec<[usize; 2]> = (0..n - 1).map(|i| [i, i + 1]).collect();
        if close {
            conn.push([n - 1, 0]);
        }
        let points: Vec<Vec<[f64; 3]>> = conn.iter().map(|&[a, b]| vec![nodes[a], nodes[b]]).collect();
        SpatialGraph::from_parts(&nodes, &conn, &points).unwrap()
    }

    #[test]
    fn chain_is_a_tree_from_node_zero() {
        let report = is_tree(&chain(5, false), &TreeCheckOptions::default()).unwrap();
        assert!(report.is_tree, "{report:?}");
        assert_eq!(report.roots, vec![0]);
    }

    #[test]
    fn closing_edge_is_a_revisit() {
        let report = is_tree(&chain(5, true), &TreeCheckOptions::default()).unwrap();
        assert!(!report.is_tree);
        assert!(matches!(report.violation, Some(TreeViolation::Revisited { .. })));
    }

    #[test]
    fn second_root_in_same_tree_is_skipped() {
        let options = TreeCheckOptions::default().with_roots(Some(0), Some(4));
        assert!(is_tree(&chain(5, false), &options).unwrap().is_tree);
    }

    #[test]
    fn unreached_and_coincident_nodes() {
        let g = SpatialGraph::from_parts(
            &[[0., 0., 0.], [1., 0., 0.], [0., 0., 0.]],
            &[[0, 1]],
            &[vec![[0., 0., 0.], [1., 0., 0.]]],
        )
        .unwrap();
        let report = is_tree(&g, &TreeCheckOptions::default()).unwrap();
        assert_eq!(report.violation, Some(TreeViolation::Unvisited { node: 2 }));

        let forest = TreeCheckOptions::default().with_roots(Some(0), Some(2));
        let report = is_tree(&g, &forest).unwrap();
        assert_eq!(
            report.violation,
            Some(TreeViolation::CoincidentNodes { nodes: vec![0, 2] })
        );
        let lenient = TreeCheckOptions {
            check_degenerate: false,
            ..forest
        };
        assert!(is_tree(&g, &lenient).unwrap().is_tree);
    }

    #[test]
    fn round_limit_bounds_each_walk() {
        // five nodes take five rounds from node 0
        let g = chain(5, false);
        let tight = TreeCheckOptions {
            max_iterations: Some(4),
            ..TreeCheckOptions::default()
        };
        assert_eq!(
            is_tree(&g, &tight),
            Err(GraphError::IterationLimitExceeded { context: "tree walk", limit: 4 })
        );
        let enough = TreeCheckOptions {
            max_iterations: Some(5),
            ..tight
        };
        assert!(is_tree(&g, &enough).unwrap().is_tree);
    }

    #[test]
    fn bad_root_is_an_error() {
        let options = TreeCheckOptions::default().with_roots(Some(9), None);
        assert!(matches!(
            is_tree(&chain(3, false), &options),
            Err(GraphError::IndexOutOfRange { .. })
        ));
    }
}
