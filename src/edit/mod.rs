//! Structural graph editing.
//!
//! Every operation is a pure function `(&SpatialGraph, params) -> SpatialGraph`:
//! it builds a new graph and never touches its input, so a failed edit leaves
//! the caller's graph exactly as it was. All results satisfy the structural
//! invariants (field shapes, point totals, point counts, endpoint ranges).
//! Inputs are checked against the same invariants first; a graph left
//! inconsistent by deferred setters is rejected with an error.

pub mod collapse;
pub mod delete;
pub mod filter;
pub mod merge;
pub mod reposition;
pub mod resample;
pub mod smooth;
pub mod split;

pub use collapse::{CollapseReport, collapse_intermediate_nodes, collapse_nodes};
pub use delete::{
    delete_edges, delete_nodes, delete_nodes_with_lookup, remove_disconnected_nodes,
    remove_duplicate_edges, remove_self_loops,
};
pub use filter::{
    crop, filter_by_field, keep_largest_component, remove_components_smaller_than, transform,
};
pub use merge::merge;
pub use reposition::{displace_degenerate_nodes, move_node};
pub use resample::{MAX_SAMPLES_PER_EDGE, ResampleTarget, resample_edges};
pub use smooth::smooth_radii;
pub use split::{SplitOutcome, insert_node_in_edge};

use crate::data::field::FieldData;
use crate::data::names;
use crate::debug_invariants::DebugInvariants;
use crate::graph::SpatialGraph;
use crate::graph_error::GraphError;

/// Index mapping between a parent graph and an extracted subgraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgraphMaps {
    /// Parent node index -> subgraph node index, `None` when dropped.
    pub node_lookup: Vec<Option<usize>>,
    /// Subgraph node index -> parent node index.
    pub sub_to_parent_nodes: Vec<usize>,
    /// Subgraph edge index -> parent edge index.
    pub sub_to_parent_edges: Vec<usize>,
}

/// Extract the given nodes and edges, in the given order, as a new graph.
///
/// Every field is compacted to the retained rows and connectivity is remapped
/// to the new node numbering.
///
/// # Errors
/// `IndexOutOfRange` for a bad index; `InvalidTopology` if a retained edge
/// references a node that is not retained.
pub(crate) fn extract_subgraph(
    g: &SpatialGraph,
    nodes: &[usize],
    edges: &[usize],
) -> Result<(SpatialGraph, SubgraphMaps), GraphError> {
    let (nn, ne) = (g.node_count(), g.edge_count());
    let mut node_lookup = vec![None; nn];
    for (new, &old) in nodes.iter().enumerate() {
        if old >= nn {
            return Err(GraphError::node_out_of_range(old, nn));
        }
        node_lookup[old] = Some(new);
    }

    let offsets = g.edge_offsets();
    let all_edges = g.edge_nodes();
    let mut conn = Vec::with_capacity(edges.len() * 2);
    let mut points = Vec::new();
    for &e in edges {
        if e >= ne {
            return Err(GraphError::edge_out_of_range(e, ne));
        }
        for end in all_edges[e] {
            let mapped = node_lookup.get(end).copied().flatten().ok_or_else(|| {
                GraphError::InvalidTopology(format!(
                    "edge {e} keeps node {end}, which is being removed"
                ))
            })?;
            conn.push(mapped as i64);
        }
        points.extend(offsets[e]..offsets[e + 1]);
    }

    let mut sub = g.store().gather([nodes, edges, &points]);
    sub.set_field(names::EDGE_CONNECTIVITY, FieldData::Int(conn))?;
    let out = SpatialGraph::from_store_with_labels(sub, g.labels());
    out.debug_assert_invariants();

    Ok((
        out,
        SubgraphMaps {
            node_lookup,
            sub_to_parent_nodes: nodes.to_vec(),
            sub_to_parent_edges: edges.to_vec(),
        },
    ))
}

/// Mask of length `n` with the listed indices set.
pub(crate) fn index_mask(
    n: usize,
    indices: &[usize],
    out_of_range: fn(usize, usize) -> GraphError,
) -> Result<Vec<bool>, GraphError> {
    let mut mask = vec![false; n];
    for &i in indices {
        if i >= n {
            return Err(out_of_range(i, n));
        }
        mask[i] = true;
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_rejects_dangling_edge() {
        let g = SpatialGraph::from_parts(
            &[[0.; 3], [1., 0., 0.]],
            &[[0, 1]],
            &[vec![[0.; 3], [1., 0., 0.]]],
        )
        .unwrap();
        assert!(matches!(
            extract_subgraph(&g, &[0], &[0]),
            Err(GraphError::InvalidTopology(_))
        ));
        let (sub, maps) = extract_subgraph(&g, &[1, 0], &[0]).unwrap();
        assert_eq!(sub.edge_nodes(), vec![[1, 0]]);
        assert_eq!(maps.node_lookup, vec![Some(1), Some(0)]);
    }
}
