//! Cycle extraction.
//!
//! A breadth-first spanning tree is grown from a root. Every edge left out
//! of the tree closes exactly one loop: the tree path from the closing edge's
//! endpoints up to their lowest common ancestor, plus the edge itself.

use crate::graph::SpatialGraph;
use crate::graph_error::GraphError;

/// One independent cycle.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Loop {
    /// Lowest common ancestor where the two paths diverge.
    pub ancestor: usize,
    /// Node where the two paths meet again.
    pub rejoin: usize,
    /// Edges from `ancestor` to `rejoin` ending with the closing edge.
    pub first: Vec<usize>,
    /// Edges from `ancestor` to `rejoin` along the spanning tree.
    pub second: Vec<usize>,
}

impl Loop {
    /// All edges of the loop.
    pub fn edges(&self) -> Vec<usize> {
        self.first.iter().chain(&self.second).copied().collect()
    }
}

struct SpanningTree {
    parent: Vec<Option<(usize, usize)>>,
    depth: Vec<usize>,
}

impl SpanningTree {
    /// Edges from `node` up to (excluding) the ancestor at `depth`, bottom up.
    fn climb(&self, mut node: usize, depth: usize) -> (usize, Vec<usize>) {
        let mut edges = Vec::new();
        while self.depth[node] > depth {
            let Some((e, up)) = self.parent[node] else { break };
            edges.push(e);
            node = up;
        }
        (node, edges)
    }
}

/// Loops reachable from `root`, one per non-tree edge, ordered by closing
/// edge index.
///
/// # Errors
/// `IndexOutOfRange` for a bad root; `IterationLimitExceeded` if the tree
/// walk runs past `node_count + 1` rounds.
pub fn find_loops(g: &SpatialGraph, root: usize) -> Result<Vec<Loop>, GraphError> {
    g.check_structure()?;
    let n = g.node_count();
    if root >= n {
        return Err(GraphError::node_out_of_range(root, n));
    }
    loops_within(g, root, n + 1)
}

/// Spanning-tree walk of at most `limit` rounds, then loop assembly.
fn loops_within(g: &SpatialGraph, root: usize, limit: usize) -> Result<Vec<Loop>, GraphError> {
    let n = g.node_count();
    let adj = g.incidence();
    let mut tree = SpanningTree {
        parent: vec![None; n],
        depth: vec![usize::MAX; n],
    };
    let mut in_tree = vec![false; g.edge_count()];
    tree.depth[root] = 0;
    let mut front = vec![root];
    let mut rounds = 0;
    while !front.is_empty() {
        rounds += 1;
        if rounds > limit {
            return Err(GraphError::IterationLimitExceeded {
                context: "loop search",
                limit,
            });
        }
        let mut next = Vec::new();
        for &u in &front {
            for &(e, w) in &adj[u] {
                if tree.depth[w] == usize::MAX {
                    tree.depth[w] = tree.depth[u] + 1;
                    tree.parent[w] = Some((e, u));
                    in_tree[e] = true;
                    next.push(w);
                }
            }
        }
        front = next;
    }

    let mut loops = Vec::new();
    for (e, [a, b]) in g.edge_nodes().into_iter().enumerate() {
        if in_tree[e] || tree.depth[a] == usize::MAX {
            continue;
        }
        // climb the deeper end first, then both together
        let (mut u, mut v) = (a, b);
        let (mut up_u, mut up_v) = (Vec::new(), Vec::new());
        if tree.depth[u] > tree.depth[v] {
            let (top, edges) = tree.climb(u, tree.depth[v]);
            (u, up_u) = (top, edges);
        } else if tree.depth[v] > tree.depth[u] {
            let (top, edges) = tree.climb(v, tree.depth[u]);
            (v, up_v) = (top, edges);
        }
        while u != v {
            let (Some((eu, pu)), Some((ev, pv))) = (tree.parent[u], tree.parent[v]) else {
                break;
            };
            up_u.push(eu);
            up_v.push(ev);
            (u, v) = (pu, pv);
        }
        let ancestor = u;
        let mut first: Vec<usize> = up_u.into_iter().rev().collect();
        first.push(e);
        let second: Vec<usize> = up_v.into_iter().rev().collect();
        loops.push(Loop {
            ancestor,
            rejoin: b,
            first,
            second,
        });
    }
    log::debug!("find_loops from {root}: {} loops", loops.len());
    Ok(loops)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize) -> SpatialGraph {
        let nodes: Vec<[f64; 3]> = (0..n).map(|i| [i as f64, 0., 0.]).collect();
        let conn: Vec<[usize; 2]> = (0..n).map(|i| [i, (i + 1) % n]).collect();
        let points: Vec<Vec<[f64; 3]>> = conn.iter().map(|&[a, b]| vec![nodes[a], nodes[b]]).collect();
        SpatialGraph::from_parts(&nodes, &conn, &points).unwrap()
    }

    #[test]
    fn ring_has_one_loop_through_every_edge() {
        let loops = find_loops(&ring(5), 0).unwrap();
        assert_eq!(loops.len(), 1);
        let l = &loops[0];
        assert_eq!(l.ancestor, 0);
        assert_eq!(l.first, vec![0, 1, 2]);
        assert_eq!(l.second, vec![4, 3]);
        let mut all = l.edges();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn parallel_edges_and_self_loops() {
        let p = |x: f64| [x, 0., 0.];
        let g = SpatialGraph::from_parts(
            &[p(0.), p(1.)],
            &[[0, 1], [1, 0], [1, 1]],
            &[vec![p(0.), p(1.)], vec![p(1.), p(0.)], vec![p(1.), p(2.), p(1.)]],
        )
        .unwrap();
        let loops = find_loops(&g, 0).unwrap();
        assert_eq!(loops.len(), 2);
        // closing edge 1 runs back to the root itself
        assert_eq!(loops[0].first, vec![0, 1]);
        assert!(loops[0].second.is_empty());
        assert_eq!(loops[0].rejoin, 0);
        assert_eq!(loops[1].edges(), vec![2]);
        assert!(find_loops(&g, 5).is_err());
    }

    #[test]
    fn walk_stops_at_the_round_limit() {
        let g = ring(5);
        assert!(matches!(
            loops_within(&g, 0, 1),
            Err(GraphError::IterationLimitExceeded { context: "loop search", limit: 1 })
        ));
        assert_eq!(loops_within(&g, 0, 3).unwrap(), find_loops(&g, 0).unwrap());
    }
}
