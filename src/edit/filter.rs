//! Whole-graph filters: spatial crop, component pruning, attribute
//! thresholds and affine transforms.

use super::delete::{delete_edges, delete_nodes, remove_disconnected_nodes};
use crate::data::domain::Domain;
use crate::data::field::FieldData;
use crate::data::names;
use crate::geometry::{Affine3, BoundingBox};
use crate::graph::SpatialGraph;
use crate::graph_error::GraphError;
use crate::topology::{component_sizes, connected_components};

/// Delete every node outside `bounds` (inclusive), with its edges.
///
/// # Errors
/// `InvalidTopology` if no node lies inside.
pub fn crop(g: &SpatialGraph, bounds: &BoundingBox) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    let outside: Vec<usize> = g
        .node_coords()
        .iter()
        .enumerate()
        .filter(|&(_, &p)| !bounds.contains(p))
        .map(|(n, _)| n)
        .collect();
    if outside.len() == g.node_count() {
        return Err(GraphError::InvalidTopology(format!(
            "crop to {bounds:?} would remove every node"
        )));
    }
    log::info!("crop removes {} of {} nodes", outside.len(), g.node_count());
    delete_nodes(g, &outside)
}

/// Keep only the connected component with the most nodes. Ties go to the
/// component containing the lowest node index.
pub fn keep_largest_component(g: &SpatialGraph) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    let comp = connected_components(g)?;
    let sizes = component_sizes(&comp);
    let Some(largest) = sizes
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
        .map(|(c, _)| c)
    else {
        return Ok(g.copy());
    };
    let doomed: Vec<usize> = (0..g.node_count()).filter(|&n| comp[n] != largest).collect();
    log::info!(
        "keeping component {largest} of {}: dropping {} nodes",
        sizes.len(),
        doomed.len()
    );
    delete_nodes(g, &doomed)
}

/// Delete every component with fewer than `min_nodes` nodes.
pub fn remove_components_smaller_than(
    g: &SpatialGraph,
    min_nodes: usize,
) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    let comp = connected_components(g)?;
    let sizes = component_sizes(&comp);
    let doomed: Vec<usize> = (0..g.node_count())
        .filter(|&n| sizes[comp[n]] < min_nodes)
        .collect();
    delete_nodes(g, &doomed)
}

/// Delete edges whose values of `name` leave `[min, max]`, then every node
/// left without an edge.
///
/// POINT fields reject an edge if any sample is out of range; EDGE fields
/// test the edge's own row. All scalars of a row are tested.
///
/// # Errors
/// `FieldNotFound` for an unknown name; `InvalidTopology` for a VERTEX field.
pub fn filter_by_field(
    g: &SpatialGraph,
    name: &str,
    min: f64,
    max: f64,
) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    let f = g.store().get_field(name)?;
    let values = f.data().to_f64_vec();
    let arity = f.arity();
    let out_of_range = |rows: std::ops::Range<usize>| {
        values[rows.start * arity..rows.end * arity]
            .iter()
            .any(|&v| !(min..=max).contains(&v))
    };
    let doomed: Vec<usize> = match f.domain() {
        Domain::Edge => (0..g.edge_count()).filter(|&e| out_of_range(e..e + 1)).collect(),
        Domain::Point => {
            let offsets = g.edge_offsets();
            (0..g.edge_count())
                .filter(|&e| out_of_range(offsets[e]..offsets[e + 1]))
                .collect()
        }
        Domain::Vertex => {
            return Err(GraphError::InvalidTopology(format!(
                "cannot filter edges by vertex field `{name}`"
            )));
        }
    };
    log::info!("filter on `{name}` in [{min}, {max}] removes {} edges", doomed.len());
    let kept = delete_edges(g, &doomed, false)?;
    remove_disconnected_nodes(&kept)
}

/// Apply `affine` to node and sample coordinates.
///
/// With `radius_axis` set, the float radius field (see
/// [`SpatialGraph::radius_field`]) is scaled by the magnitude of the
/// transform's diagonal entry on that axis.
pub fn transform(
    g: &SpatialGraph,
    affine: &Affine3,
    radius_axis: Option<usize>,
) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    let mut out = g.copy();
    let map = |rows: &[[f64; 3]]| -> FieldData {
        FieldData::Float(rows.iter().flat_map(|&p| affine.apply(p)).collect())
    };
    let nodes = map(g.node_coords());
    let points = map(g.point_coords());
    out.set_data(names::VERTEX_COORDINATES, nodes)?;
    out.set_data(names::EDGE_POINT_COORDINATES, points)?;

    if let (Some(axis), Some(radius)) = (radius_axis, g.radius_field()) {
        if axis > 2 {
            return Err(GraphError::InvalidTopology(format!("radius axis {axis} is not 0, 1 or 2")));
        }
        let k = affine.diagonal(axis).abs();
        let scaled: Vec<f64> = radius.values::<f64>()?.iter().map(|r| r * k).collect();
        out.set_data(radius.name(), FieldData::Float(scaled))?;
    }
    Ok(out)
}
