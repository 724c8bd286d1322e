//! Parallel edges, self-loops and coincident nodes.

use crate::graph::SpatialGraph;
use hashbrown::HashMap;

/// Groups of two or more edges joining the same unordered node pair.
///
/// Each group is sorted ascending; groups are ordered by their first edge.
pub fn duplicate_edge_groups(g: &SpatialGraph) -> Vec<Vec<usize>> {
    let mut by_pair: HashMap<[usize; 2], Vec<usize>> = HashMap::new();
    for (e, [a, b]) in g.edge_nodes().into_iter().enumerate() {
        by_pair.entry([a.min(b), a.max(b)]).or_default().push(e);
    }
    let mut groups: Vec<Vec<usize>> = by_pair.into_values().filter(|v| v.len() > 1).collect();
    groups.sort_unstable_by_key(|v| v[0]);
    groups
}

/// Edges whose two endpoints are the same node.
pub fn self_loops(g: &SpatialGraph) -> Vec<usize> {
    g.edge_nodes()
        .iter()
        .enumerate()
        .filter(|&(_, &[a, b])| a == b)
        .map(|(e, _)| e)
        .collect()
}

/// Groups of two or more nodes with bitwise-identical coordinates
/// (`-0.0` and `0.0` compare equal). Groups are ordered by first node.
pub fn degenerate_nodes(g: &SpatialGraph) -> Vec<Vec<usize>> {
    let key = |p: [f64; 3]| p.map(|x| if x == 0.0 { 0u64 } else { x.to_bits() });
    let mut by_coord: HashMap<[u64; 3], Vec<usize>> = HashMap::new();
    for (n, &p) in g.node_coords().iter().enumerate() {
        by_coord.entry(key(p)).or_default().push(n);
    }
    let mut groups: Vec<Vec<usize>> = by_coord.into_values().filter(|v| v.len() > 1).collect();
    groups.sort_unstable_by_key(|v| v[0]);
    groups
}
