//! Node and edge deletion with cascade and index compaction.

use super::{extract_subgraph, index_mask};
use crate::graph::{Reduction, SpatialGraph};
use crate::graph_error::GraphError;
use crate::topology::duplicates::duplicate_edge_groups;
use std::f64::consts::PI;

/// Delete nodes and every edge incident to any of them.
///
/// Survivors keep their relative order.
pub fn delete_nodes(g: &SpatialGraph, nodes: &[usize]) -> Result<SpatialGraph, GraphError> {
    delete_nodes_with_lookup(g, nodes).map(|(out, _)| out)
}

/// As [`delete_nodes`], also returning the old -> new node lookup (`None`
/// for removed nodes).
pub fn delete_nodes_with_lookup(
    g: &SpatialGraph,
    nodes: &[usize],
) -> Result<(SpatialGraph, Vec<Option<usize>>), GraphError> {
    g.check_structure()?;
    let del = index_mask(g.node_count(), nodes, GraphError::node_out_of_range)?;
    let keep_nodes: Vec<usize> = (0..g.node_count()).filter(|&n| !del[n]).collect();
    let keep_edges: Vec<usize> = g
        .edge_nodes()
        .iter()
        .enumerate()
        .filter(|(_, [a, b])| !del[*a] && !del[*b])
        .map(|(e, _)| e)
        .collect();
    log::debug!(
        "delete_nodes: removing {} nodes, {} edges",
        g.node_count() - keep_nodes.len(),
        g.edge_count() - keep_edges.len()
    );
    let (out, maps) = extract_subgraph(g, &keep_nodes, &keep_edges)?;
    Ok((out, maps.node_lookup))
}

/// Delete edges and their polyline rows, optionally dropping nodes left with
/// no incident edge.
///
/// Only nodes that lose their last edge are dropped; nodes that were already
/// isolated stay.
pub fn delete_edges(
    g: &SpatialGraph,
    edges: &[usize],
    remove_disconnected_nodes: bool,
) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    let del = index_mask(g.edge_count(), edges, GraphError::edge_out_of_range)?;
    let conn = g.edge_nodes();
    let keep_edges: Vec<usize> = (0..g.edge_count()).filter(|&e| !del[e]).collect();

    let keep_nodes: Vec<usize> = if remove_disconnected_nodes {
        let before = g.node_degree_vector();
        let mut after = vec![0usize; g.node_count()];
        for &e in &keep_edges {
            for n in conn[e] {
                after[n] += 1;
            }
        }
        (0..g.node_count())
            .filter(|&n| after[n] > 0 || before[n] == 0)
            .collect()
    } else {
        (0..g.node_count()).collect()
    };
    log::debug!(
        "delete_edges: removing {} edges, {} nodes",
        g.edge_count() - keep_edges.len(),
        g.node_count() - keep_nodes.len()
    );
    extract_subgraph(g, &keep_nodes, &keep_edges).map(|(out, _)| out)
}

/// Delete every node of degree 0.
pub fn remove_disconnected_nodes(g: &SpatialGraph) -> Result<SpatialGraph, GraphError> {
    let isolated: Vec<usize> = g
        .node_degree_vector()
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(n, _)| n)
        .collect();
    if !isolated.is_empty() {
        log::info!("removing {} disconnected nodes", isolated.len());
    }
    delete_nodes(g, &isolated)
}

/// Delete every edge whose endpoints are equal. Nodes are kept.
pub fn remove_self_loops(g: &SpatialGraph) -> Result<SpatialGraph, GraphError> {
    let loops = crate::topology::duplicates::self_loops(g);
    if !loops.is_empty() {
        log::info!("removing {} self-loops", loops.len());
    }
    delete_edges(g, &loops, false)
}

/// Among edges sharing an unordered endpoint pair, keep the one with the
/// largest `pi * r^2 * length` (`r` the edge's largest radius sample) and
/// delete the rest. Ties go to the lowest edge index.
///
/// # Errors
/// `MissingField` if duplicates exist and no radius field resolves.
pub fn remove_duplicate_edges(g: &SpatialGraph) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    let groups = duplicate_edge_groups(g);
    if groups.is_empty() {
        return Ok(g.copy());
    }
    let radius = g
        .radius_field()
        .ok_or_else(|| GraphError::MissingField("radius".to_owned()))?;
    let r = g.edge_values(radius.name(), Reduction::Max)?;
    let lengths = g.edge_lengths();
    let volume = |e: usize| PI * r[e] * r[e] * lengths[e];

    let mut doomed = Vec::new();
    for group in &groups {
        let mut best = group[0];
        for &e in &group[1..] {
            if volume(e) > volume(best) {
                best = e;
            }
        }
        doomed.extend(group.iter().copied().filter(|&e| e != best));
    }
    log::info!(
        "removing {} duplicate edges from {} groups",
        doomed.len(),
        groups.len()
    );
    delete_edges(g, &doomed, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::domain::Domain;
    use crate::data::field::{Field, FieldData};

    /// 0 - 1 - 2 - 3 path plus a self loop on 3 and an isolated node 4.
    fn path() -> SpatialGraph {
        SpatialGraph::from_parts(
            &[[0., 0., 0.], [1., 0., 0.], [2., 0., 0.], [3., 0., 0.], [9., 9., 9.]],
            &[[0, 1], [1, 2], [2, 3], [3, 3]],
            &[
                vec![[0., 0., 0.], [1., 0., 0.]],
                vec![[1., 0., 0.], [1.5, 0.5, 0.], [2., 0., 0.]],
                vec![[2., 0., 0.], [3., 0., 0.]],
                vec![[3., 0., 0.], [3., 1., 0.], [3., 0., 0.]],
            ],
        )
        .unwrap()
    }

    #[test]
    fn delete_nodes_cascades_and_renumbers() {
        let g = path();
        let (h, lookup) = delete_nodes_with_lookup(&g, &[1]).unwrap();
        assert_eq!(lookup, vec![Some(0), None, Some(1), Some(2), Some(3)]);
        assert_eq!(h.node_count(), 4);
        assert_eq!(h.edge_nodes(), vec![[1, 2], [2, 2]]);
        assert_eq!(h.point_count(), 5);
        assert_eq!(h.edge_points(0).unwrap(), &[[2., 0., 0.], [3., 0., 0.]]);
    }

    #[test]
    fn delete_edges_drops_newly_isolated_nodes_only() {
        let g = path();
        let h = delete_edges(&g, &[0], true).unwrap();
        // node 0 lost its only edge, node 4 was already isolated
        assert_eq!(h.node_count(), 4);
        assert_eq!(h.node_coord(0).unwrap(), [1., 0., 0.]);
        assert_eq!(h.node_coord(3).unwrap(), [9., 9., 9.]);
        let k = delete_edges(&g, &[0], false).unwrap();
        assert_eq!(k.node_count(), 5);
        assert_eq!(k.edge_count(), 3);
    }

    #[test]
    fn remove_isolated_and_loops() {
        let g = path();
        assert_eq!(remove_disconnected_nodes(&g).unwrap().node_count(), 4);
        let h = remove_self_loops(&g).unwrap();
        assert_eq!(h.edge_count(), 3);
        assert_eq!(h.point_count(), 7);
    }

    #[test]
    fn out_of_range_delete_leaves_input_alone() {
        let g = path();
        let before = g.copy();
        assert!(matches!(
            delete_nodes(&g, &[7]),
            Err(GraphError::IndexOutOfRange { .. })
        ));
        assert_eq!(g, before);
    }

    fn parallel(radii: Vec<f64>) -> SpatialGraph {
        let mut g = SpatialGraph::from_parts(
            &[[0., 0., 0.], [1., 0., 0.]],
            &[[0, 1], [1, 0], [0, 1]],
            &[
                vec![[0., 0., 0.], [1., 0., 0.]],
                vec![[1., 0., 0.], [0.5, 1., 0.], [0., 0., 0.]],
                vec![[0., 0., 0.], [1., 0., 0.]],
            ],
        )
        .unwrap();
        if !radii.is_empty() {
            g.add_field(Field::new("Radius", Domain::Point, 1, FieldData::Float(radii)))
                .unwrap();
        }
        g
    }

    #[test]
    fn duplicate_keeps_largest_volume() {
        // edge 2 is thickest
        let g = parallel(vec![1., 1., 1., 1., 1., 3., 1.]);
        let h = remove_duplicate_edges(&g).unwrap();
        assert_eq!(h.edge_count(), 1);
        assert_eq!(h.field("Radius").unwrap().data(), &FieldData::Float(vec![3., 1.]));
    }

    #[test]
    fn equal_radius_prefers_longest_edge() {
        // equal radii: edge 1 is longest
        let g = parallel(vec![1.0; 7]);
        let h = remove_duplicate_edges(&g).unwrap();
        assert_eq!(h.edge_nodes(), vec![[1, 0]]);
    }

    #[test]
    fn duplicates_need_radius() {
        assert_eq!(
            remove_duplicate_edges(&parallel(vec![])),
            Err(GraphError::MissingField("radius".into()))
        );
    }
}
