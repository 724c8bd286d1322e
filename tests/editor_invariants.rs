mod util;
use proptest::prelude::*;
use spatial_graph::edit::{self, ResampleTarget};
use spatial_graph::graph::SpatialGraph;
use spatial_graph::graph_error::GraphError;
use util::*;

fn pick(indices: &[usize], n: usize) -> Vec<usize> {
    let mut out: Vec<usize> = indices.iter().filter(|_| n > 0).map(|&i| i % n).collect();
    out.sort_unstable();
    out.dedup();
    out
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn deletions_keep_invariants(
        seed in any::<u64>(),
        nodes in 2usize..30,
        edges in 0usize..40,
        doomed in prop::collection::vec(any::<usize>(), 0..10),
    ) {
        let g = random_graph(seed, nodes, edges);
        assert_valid(&g);

        let del = pick(&doomed, g.node_count());
        let (h, lookup) = edit::delete_nodes_with_lookup(&g, &del).unwrap();
        assert_valid(&h);
        prop_assert_eq!(h.node_count(), g.node_count() - del.len());
        // no surviving edge touches a deleted node, and every edge between
        // survivors is still there
        let survivors = g
            .edge_nodes()
            .iter()
            .filter(|[a, b]| lookup[*a].is_some() && lookup[*b].is_some())
            .count();
        prop_assert_eq!(h.edge_count(), survivors);

        let del_e = pick(&doomed, g.edge_count());
        let k = edit::delete_edges(&g, &del_e, true).unwrap();
        assert_valid(&k);
        prop_assert_eq!(k.edge_count(), g.edge_count() - del_e.len());
    }

    #[test]
    fn structural_edits_keep_invariants(
        seed in any::<u64>(),
        nodes in 2usize..20,
        edges in 1usize..25,
        which in any::<usize>(),
        fraction in 0.05f64..0.95,
    ) {
        let g = random_graph(seed, nodes, edges);
        let e = which % g.edge_count();
        let (split, outcome) = edit::insert_node_in_edge(&g, e, fraction).unwrap();
        assert_valid(&split);
        prop_assert_eq!(split.node_count(), g.node_count() + 1);
        prop_assert_eq!(split.edge_count(), g.edge_count() + 1);
        prop_assert_eq!(split.node_degree_vector()[outcome.node], 2);

        let (collapsed, _) = edit::collapse_intermediate_nodes(&split).unwrap();
        assert_valid(&collapsed);
        // a collapse only leaves interior nodes behind on closed rings
        let deg = collapsed.node_degree_vector();
        for (n, inc) in collapsed.incidence().iter().enumerate() {
            if deg[n] == 2 && inc.len() == 2 {
                prop_assert!(is_on_ring(&collapsed, n));
            }
        }

        let resampled = edit::resample_edges(&g, ResampleTarget::Spacing(5.0)).unwrap();
        assert_valid(&resampled);
        prop_assert_eq!(resampled.edge_nodes(), g.edge_nodes());

        let cleaned = edit::remove_duplicate_edges(&g).unwrap();
        assert_valid(&cleaned);
        prop_assert!(spatial_graph::topology::duplicate_edge_groups(&cleaned).is_empty());
    }

    #[test]
    fn failed_edits_leave_input_untouched(
        seed in any::<u64>(),
        nodes in 2usize..10,
        edges in 1usize..10,
    ) {
        let g = random_graph(seed, nodes, edges);
        let before = g.clone();
        let bad_node = g.node_count() + 3;
        let is_range_error = matches!(
            edit::delete_nodes(&g, &[0, bad_node]),
            Err(GraphError::IndexOutOfRange { .. })
        );
        prop_assert!(is_range_error);
        prop_assert!(edit::insert_node_in_edge(&g, 0, 1.5).is_err());
        prop_assert_eq!(g, before);
    }
}

/// True when every node in the component of `node` is interior.
fn is_on_ring(g: &SpatialGraph, node: usize) -> bool {
    let comp = spatial_graph::topology::connected_components(g).unwrap();
    let c = comp[node];
    let deg = g.node_degree_vector();
    let inc_all = g.incidence();
    (0..g.node_count())
        .filter(|&n| comp[n] == c)
        .all(|n| deg[n] == 2 && inc_all[n].len() == 2)
}

#[test]
fn empty_delete_is_identity() {
    let g = random_graph(7, 12, 20);
    assert_eq!(edit::delete_nodes(&g, &[]).unwrap(), g);
    assert_eq!(edit::delete_edges(&g, &[], true).unwrap(), g);
}

#[test]
fn node_delete_cascades_to_edges_and_points() {
    // star around node 0 plus a far edge 4 - 5
    let g = with_point_ramp(
        straight(
            &[p(0., 0., 0.), p(1., 0., 0.), p(0., 1., 0.), p(0., 0., 1.), p(5., 5., 5.), p(6., 5., 5.)],
            &[[0, 1], [0, 2], [3, 0], [4, 5]],
        ),
        "Ramp",
    );
    let h = edit::delete_nodes(&g, &[0]).unwrap();
    assert_eq!(h.node_count(), 5);
    assert_eq!(h.edge_nodes(), vec![[3, 4]]);
    assert_eq!(h.point_count(), 2);
    assert_eq!(
        h.field("Ramp").unwrap().data(),
        &spatial_graph::data::FieldData::Float(vec![6., 7.])
    );
    assert_valid(&h);
}
