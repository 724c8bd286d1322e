//! Edge splitting at an arc-length fraction.

use crate::buffer::{BufferConfig, EditBuffer};
use crate::graph::SpatialGraph;
use crate::graph_error::GraphError;

/// Indices produced by a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SplitOutcome {
    /// The inserted node.
    pub node: usize,
    /// First half; keeps the split edge's index.
    pub first_edge: usize,
    /// Second half; appended after the existing edges.
    pub second_edge: usize,
}

/// Split edge `edge` at `fraction` of its arc length, inserting a node.
///
/// The first half keeps index `edge` and runs from the original start node to
/// the new node; the second half is appended and runs on to the original end
/// node. See [`EditBuffer::insert_node_in_edge`] for attribute handling.
///
/// # Errors
/// `IndexOutOfRange` for a bad edge; `InvalidTopology` if `fraction` is not
/// strictly inside (0, 1) or the edge has zero length.
pub fn insert_node_in_edge(
    g: &SpatialGraph,
    edge: usize,
    fraction: f64,
) -> Result<(SpatialGraph, SplitOutcome), GraphError> {
    if edge >= g.edge_count() {
        return Err(GraphError::edge_out_of_range(edge, g.edge_count()));
    }
    let mut buf = EditBuffer::with_config(g, BufferConfig::default().with_growth_batch(4))?;
    let outcome = buf.insert_node_in_edge(edge, fraction)?;
    let out = buf.flush()?;
    log::debug!(
        "split edge {edge} at {fraction}: node {}, edges {} / {}",
        outcome.node,
        outcome.first_edge,
        outcome.second_edge
    );
    Ok((out, outcome))
}
