//! Moving nodes while their polylines follow.
//!
//! When a node moves, each incident polyline is rotated and scaled about its
//! other end so the moved end lands on the new position and the shape of the
//! vessel is kept. A polyline whose ends coincide cannot be rotated that way
//! and is bent instead: every sample shifts by the node's displacement,
//! weighted by its arc-length fraction from the fixed end. Self-loops are
//! translated whole.

use crate::data::field::FieldData;
use crate::data::names;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::{self, Affine3};
use crate::graph::SpatialGraph;
use crate::graph_error::GraphError;
use crate::topology::duplicates::degenerate_nodes;
use hashbrown::HashMap;

/// Golden angle in radians; successive offsets spiral outward without
/// repeating a direction.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Move `node` to `coord`, dragging the polylines of its incident edges.
///
/// # Errors
/// `IndexOutOfRange` for a bad node; `InvalidTopology` for a non-finite
/// coordinate.
pub fn move_node(g: &SpatialGraph, node: usize, coord: [f64; 3]) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    if node >= g.node_count() {
        return Err(GraphError::node_out_of_range(node, g.node_count()));
    }
    reposition(g, &HashMap::from([(node, coord)]))
}

/// Pull apart nodes that share exact coordinates (see
/// [`degenerate_nodes`]).
///
/// In each group the lowest-numbered node stays put; the `k`-th other member
/// moves `spacing * sqrt(k)` away in the xy-plane, each at a different
/// angle, so no two members land on the same spot. Incident polylines follow
/// as for [`move_node`].
///
/// # Errors
/// `InvalidTopology` for a non-positive or non-finite spacing.
pub fn displace_degenerate_nodes(g: &SpatialGraph, spacing: f64) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(GraphError::InvalidTopology(format!(
            "displacement spacing {spacing} must be positive"
        )));
    }
    let coords = g.node_coords();
    let mut moves = HashMap::new();
    for group in degenerate_nodes(g) {
        for (k, &n) in group.iter().enumerate().skip(1) {
            let angle = k as f64 * GOLDEN_ANGLE;
            let r = spacing * (k as f64).sqrt();
            let offset = [r * angle.cos(), r * angle.sin(), 0.0];
            moves.insert(n, geometry::add(coords[n], offset));
        }
    }
    if moves.is_empty() {
        return Ok(g.copy());
    }
    log::info!("displacing {} degenerate nodes", moves.len());
    reposition(g, &moves)
}

/// Apply node moves and drag every affected polyline.
fn reposition(g: &SpatialGraph, moves: &HashMap<usize, [f64; 3]>) -> Result<SpatialGraph, GraphError> {
    if let Some((n, c)) = moves.iter().find(|(_, c)| c.iter().any(|x| !x.is_finite())) {
        return Err(GraphError::InvalidTopology(format!(
            "node {n} cannot move to non-finite {c:?}"
        )));
    }
    let mut nodes = g.node_coords().to_vec();
    let mut points = g.point_coords().to_vec();
    for rec in g.edges() {
        let (to_start, to_end) = (moves.get(&rec.start), moves.get(&rec.end));
        if to_start.is_none() && to_end.is_none() {
            continue;
        }
        let pts = &mut points[rec.points.clone()];
        if rec.is_self_loop() {
            if let Some(&to) = to_start {
                let shift = geometry::sub(to, nodes[rec.start]);
                pts.iter_mut().for_each(|p| *p = geometry::add(*p, shift));
            }
            continue;
        }
        if let Some(&to) = to_start {
            drag_end(pts, true, to);
        }
        if let Some(&to) = to_end {
            drag_end(pts, false, to);
        }
    }
    for (&n, &c) in moves {
        nodes[n] = c;
    }

    let mut out = g.copy();
    out.set_data(
        names::VERTEX_COORDINATES,
        FieldData::Float(nodes.into_iter().flatten().collect()),
    )?;
    out.set_data(
        names::EDGE_POINT_COORDINATES,
        FieldData::Float(points.into_iter().flatten().collect()),
    )?;
    out.debug_assert_invariants();
    Ok(out)
}

/// Move one end of a polyline to `to`, keeping the other end fixed.
fn drag_end(pts: &mut [[f64; 3]], at_start: bool, to: [f64; 3]) {
    let Some(last) = pts.len().checked_sub(1).filter(|&l| l > 0) else {
        return;
    };
    let (moved, fixed) = if at_start { (0, last) } else { (last, 0) };
    let (anchor, from) = (pts[fixed], pts[moved]);
    match Affine3::pinned_similarity(anchor, from, to) {
        Some(m) => pts.iter_mut().for_each(|p| *p = m.apply(*p)),
        None => {
            let shift = geometry::sub(to, from);
            let cum = geometry::cumulative_length(pts);
            let len = cum[last];
            for (i, p) in pts.iter_mut().enumerate() {
                let along = if len > 0.0 { cum[i] / len } else { i as f64 / last as f64 };
                let w = if at_start { 1.0 - along } else { along };
                *p = geometry::add(*p, geometry::scale(shift, w));
            }
        }
    }
    pts[moved] = to;
    pts[fixed] = anchor;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ValidationOptions;
    use crate::geometry::approx_eq;

    /// Bent edge 0 - 1 and a straight spur 1 - 2.
    fn elbow() -> SpatialGraph {
        SpatialGraph::from_parts(
            &[[0., 0., 0.], [2., 0., 0.], [2., 3., 0.]],
            &[[0, 1], [1, 2]],
            &[
                vec![[0., 0., 0.], [1., 1., 0.], [2., 0., 0.]],
                vec![[2., 0., 0.], [2., 3., 0.]],
            ],
        )
        .unwrap()
    }

    #[test]
    fn moved_node_drags_incident_polylines() {
        let g = elbow();
        let h = move_node(&g, 1, [0., 2., 0.]).unwrap();
        assert!(h.validate(ValidationOptions::all()).is_valid());
        assert_eq!(h.node_coord(1).unwrap(), [0., 2., 0.]);
        // quarter turn about node 0: the bump at (1, 1) swings to (-1, 1)
        let e0 = h.edge_points(0).unwrap();
        assert_eq!(e0[0], [0., 0., 0.]);
        assert!(approx_eq(e0[1], [-1., 1., 0.], 1e-12), "{:?}", e0[1]);
        assert_eq!(e0[2], [0., 2., 0.]);
        assert_eq!(h.edge_points(1).unwrap(), &[[0., 2., 0.], [2., 3., 0.]]);
        // arc length scales with the chord
        assert!((h.edge_lengths()[0] - g.edge_lengths()[0]).abs() < 1e-12);
        assert_eq!(g.node_coord(1).unwrap(), [2., 0., 0.]);
    }

    #[test]
    fn bad_moves_are_rejected() {
        let g = elbow();
        assert!(matches!(
            move_node(&g, 3, [0.; 3]),
            Err(GraphError::IndexOutOfRange { index: 3, .. })
        ));
        assert!(matches!(
            move_node(&g, 0, [f64::NAN, 0., 0.]),
            Err(GraphError::InvalidTopology(_))
        ));
    }

    #[test]
    fn closed_polyline_bends_and_self_loop_translates() {
        // edge 0 returns to its start position; edge 1 is a self-loop on node 2
        let g = SpatialGraph::from_parts(
            &[[0., 0., 0.], [0., 0., 0.], [5., 0., 0.]],
            &[[0, 1], [2, 2]],
            &[
                vec![[0., 0., 0.], [1., 0., 0.], [0., 0., 0.]],
                vec![[5., 0., 0.], [6., 1., 0.], [5., 0., 0.]],
            ],
        )
        .unwrap();
        let h = move_node(&g, 1, [0., 2., 0.]).unwrap();
        assert_eq!(h.edge_points(0).unwrap(), &[[0., 0., 0.], [1., 1., 0.], [0., 2., 0.]]);
        let k = move_node(&g, 2, [5., 0., 1.]).unwrap();
        assert_eq!(
            k.edge_points(1).unwrap(),
            &[[5., 0., 1.], [6., 1., 1.], [5., 0., 1.]]
        );
    }

    #[test]
    fn coincident_nodes_are_pulled_apart() {
        let g = SpatialGraph::from_parts(
            &[[0., 0., 0.], [1., 0., 0.], [1., 0., 0.], [1., 0., 0.], [3., 0., 0.]],
            &[[0, 1], [2, 4], [3, 4]],
            &[
                vec![[0., 0., 0.], [1., 0., 0.]],
                vec![[1., 0., 0.], [2., 0.5, 0.], [3., 0., 0.]],
                vec![[1., 0., 0.], [3., 0., 0.]],
            ],
        )
        .unwrap();
        assert_eq!(degenerate_nodes(&g), vec![vec![1, 2, 3]]);
        let h = displace_degenerate_nodes(&g, 0.1).unwrap();
        assert!(degenerate_nodes(&h).is_empty());
        assert!(h.validate(ValidationOptions::all()).is_valid());
        assert_eq!(h.node_coord(1).unwrap(), [1., 0., 0.]);
        for n in [2, 3] {
            let d = geometry::distance(h.node_coord(n).unwrap(), [1., 0., 0.]);
            assert!((d - 0.1 * ((n - 1) as f64).sqrt()).abs() < 1e-12);
        }
        assert_eq!(h.edge_points(1).unwrap()[2], [3., 0., 0.]);

        let clean = elbow();
        assert_eq!(displace_degenerate_nodes(&clean, 0.1).unwrap(), clean);
        assert!(displace_degenerate_nodes(&clean, 0.0).is_err());
    }
}
