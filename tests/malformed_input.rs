mod util;
use spatial_graph::buffer::EditBuffer;
use spatial_graph::data::{DomainSizes, FieldData, names};
use spatial_graph::edit::{self, ResampleTarget};
use spatial_graph::geometry::BoundingBox;
use spatial_graph::graph::SpatialGraph;
use spatial_graph::graph_error::GraphError;
use spatial_graph::io::RenderGeometry;
use spatial_graph::topology::{self, CategoryConfig, TreeCheckOptions};
use util::*;

/// Chain whose second edge points at a node that does not exist.
fn dangling_endpoint() -> SpatialGraph {
    let mut g = chain(3);
    g.set_data_deferred(names::EDGE_CONNECTIVITY, FieldData::Int(vec![0, 1, 1, 9]))
        .unwrap();
    g
}

/// Chain whose point counts no longer sum to the POINT domain.
fn bad_point_counts() -> SpatialGraph {
    let mut g = chain(3);
    g.set_data_deferred(names::NUM_EDGE_POINTS, FieldData::Int(vec![2, 7]))
        .unwrap();
    g
}

/// Chain that claims one more edge than its arrays hold.
fn stale_sizes() -> SpatialGraph {
    let mut g = chain(3);
    let s = g.domain_sizes();
    g.set_domain_sizes(DomainSizes::new(s.vertex, s.edge + 1, s.point));
    g
}

fn every_edit_rejects(g: &SpatialGraph) {
    assert!(edit::delete_nodes(g, &[0]).is_err());
    assert!(edit::delete_edges(g, &[], true).is_err());
    assert!(edit::remove_disconnected_nodes(g).is_err());
    assert!(edit::remove_self_loops(g).is_err());
    assert!(edit::remove_duplicate_edges(g).is_err());
    assert!(edit::insert_node_in_edge(g, 0, 0.5).is_err());
    assert!(edit::collapse_intermediate_nodes(g).is_err());
    assert!(edit::collapse_nodes(g, &[1]).is_err());
    assert!(edit::resample_edges(g, ResampleTarget::Count(4)).is_err());
    assert!(edit::merge(g, &chain(2)).is_err());
    assert!(edit::merge(&chain(2), g).is_err());
    let everything = BoundingBox::new([-10.; 3], [10.; 3]);
    assert!(edit::crop(g, &everything).is_err());
    assert!(edit::keep_largest_component(g).is_err());
    assert!(edit::remove_components_smaller_than(g, 1).is_err());
    assert!(edit::move_node(g, 0, p(0., 1., 0.)).is_err());
    assert!(edit::displace_degenerate_nodes(g, 0.5).is_err());
    assert!(edit::smooth_radii(g, 3).is_err());
    assert!(EditBuffer::new(g).is_err());
    assert!(RenderGeometry::from_graph(g, None).is_err());
}

fn every_analysis_rejects(g: &SpatialGraph) {
    assert!(topology::connected_components(g).is_err());
    assert!(topology::identify_inlet_outlet(g, &CategoryConfig::default()).is_err());
    assert!(topology::is_tree(g, &TreeCheckOptions::default()).is_err());
    assert!(topology::compute_ranks_from(g, &[0]).is_err());
    assert!(topology::find_loops(g, 0).is_err());
}

#[test]
fn dangling_endpoint_is_an_error_everywhere() {
    let g = dangling_endpoint();
    every_edit_rejects(&g);
    every_analysis_rejects(&g);
    assert!(matches!(
        edit::delete_edges(&g, &[0], true),
        Err(GraphError::IndexOutOfRange { index: 9, len: 3, .. })
    ));
}

#[test]
fn inconsistent_point_counts_are_an_error_everywhere() {
    let g = bad_point_counts();
    every_edit_rejects(&g);
    every_analysis_rejects(&g);
}

#[test]
fn stale_domain_sizes_are_an_error_everywhere() {
    let g = stale_sizes();
    every_edit_rejects(&g);
    every_analysis_rejects(&g);
    assert!(matches!(EditBuffer::new(&g), Err(GraphError::ShapeMismatch { .. })));
}

#[test]
fn repairing_the_arrays_restores_service() {
    let mut g = dangling_endpoint();
    g.set_data_deferred(names::EDGE_CONNECTIVITY, FieldData::Int(vec![0, 1, 1, 2]))
        .unwrap();
    assert_valid(&g);
    let h = edit::delete_edges(&g, &[0], true).unwrap();
    assert_eq!(h.edge_nodes(), vec![[0, 1]]);
    assert!(EditBuffer::new(&g).is_ok());
}
