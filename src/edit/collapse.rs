//! Chain collapse: replace runs of degree-2 nodes by single edges.
//!
//! A chain is a maximal walk `X - n1 - ... - nk - Y` whose interior nodes
//! each have exactly two incident edge ends. The chain's edges are spliced
//! into one polyline from `X` to `Y` (shared seam samples kept once) and the
//! interior nodes are removed. The spliced edge runs in the stored direction
//! of the chain's lowest-index edge. Closed rings made only of interior nodes
//! have no end to anchor on; they are left unchanged and reported.

use super::index_mask;
use crate::buffer::{BufferConfig, EditBuffer};
use crate::graph::SpatialGraph;
use crate::graph_error::GraphError;

/// Summary of a collapse pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseReport {
    /// Interior nodes removed.
    pub collapsed_nodes: usize,
    /// Chains spliced into single edges.
    pub merged_chains: usize,
    /// Node lists of closed rings left unchanged.
    pub skipped_cycles: Vec<Vec<usize>>,
}

/// Collapse every degree-2 node that sits between two distinct edge ends.
///
/// Nodes whose only edge is a self-loop also have degree 2 but are not
/// chain interiors and stay.
pub fn collapse_intermediate_nodes(
    g: &SpatialGraph,
) -> Result<(SpatialGraph, CollapseReport), GraphError> {
    g.check_structure()?;
    let interior = interior_mask(g);
    let (out, report) = collapse_where(g, &interior)?;
    log::info!(
        "collapsed {} intermediate nodes into {} edges ({} rings skipped)",
        report.collapsed_nodes,
        report.merged_chains,
        report.skipped_cycles.len()
    );
    Ok((out, report))
}

/// Collapse only the listed nodes. Chains end at the first node not listed.
///
/// # Errors
/// `IndexOutOfRange` for a bad node; `InvalidTopology` if a listed node is
/// not a chain interior or all nodes of a ring are listed.
pub fn collapse_nodes(g: &SpatialGraph, nodes: &[usize]) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    let mask = index_mask(g.node_count(), nodes, GraphError::node_out_of_range)?;
    let interior = interior_mask(g);
    if let Some(&n) = nodes.iter().find(|&&n| !interior[n]) {
        return Err(GraphError::InvalidTopology(format!(
            "node {n} is not an intermediate node of degree 2"
        )));
    }
    let (out, report) = collapse_where(g, &mask)?;
    if let Some(ring) = report.skipped_cycles.first() {
        return Err(GraphError::InvalidTopology(format!(
            "nodes {ring:?} form a closed ring with no branch node"
        )));
    }
    Ok(out)
}

fn interior_mask(g: &SpatialGraph) -> Vec<bool> {
    let deg = g.node_degree_vector();
    let inc = g.incidence();
    (0..g.node_count())
        .map(|n| deg[n] == 2 && inc[n].len() == 2)
        .collect()
}

/// One direction of a chain walk.
struct Arm {
    /// Edges in walking order, away from the seed.
    edges: Vec<usize>,
    /// Interior nodes passed, away from the seed.
    nodes: Vec<usize>,
    /// First non-interior node reached, `None` for a closed ring.
    end: Option<usize>,
}

fn walk(
    inc: &[Vec<(usize, usize)>],
    mask: &[bool],
    seed: usize,
    first: (usize, usize),
    limit: usize,
) -> Result<Arm, GraphError> {
    let mut arm = Arm {
        edges: Vec::new(),
        nodes: Vec::new(),
        end: None,
    };
    let (mut edge, mut next) = first;
    loop {
        if arm.edges.len() > limit {
            return Err(GraphError::IterationLimitExceeded {
                context: "chain walk",
                limit,
            });
        }
        arm.edges.push(edge);
        if next == seed {
            return Ok(arm);
        }
        if !mask[next] {
            arm.end = Some(next);
            return Ok(arm);
        }
        arm.nodes.push(next);
        let Some(&step) = inc[next].iter().find(|&&(e, _)| e != edge) else {
            return Err(GraphError::InvalidTopology(format!(
                "node {next} has no onward edge"
            )));
        };
        (edge, next) = step;
    }
}

fn collapse_where(
    g: &SpatialGraph,
    mask: &[bool],
) -> Result<(SpatialGraph, CollapseReport), GraphError> {
    let inc = g.incidence();
    let conn = g.edge_nodes();
    let limit = g.edge_count() + 1;
    let mut report = CollapseReport::default();
    let mut done = vec![false; g.node_count()];
    let mut buf = EditBuffer::with_config(g, BufferConfig::default().with_growth_batch(64))?;

    for seed in 0..g.node_count() {
        if !mask[seed] || done[seed] {
            continue;
        }
        let &[left, right] = inc[seed].as_slice() else {
            continue;
        };
        let back = walk(&inc, mask, seed, left, limit)?;
        let Some(x) = back.end else {
            let mut ring = vec![seed];
            ring.extend(&back.nodes);
            for &n in &ring {
                done[n] = true;
            }
            log::warn!("skipping closed ring of {} intermediate nodes", ring.len());
            report.skipped_cycles.push(ring);
            continue;
        };
        let fwd = walk(&inc, mask, seed, right, limit)?;
        let y = fwd.end.ok_or_else(|| {
            GraphError::InvalidTopology(format!("chain through node {seed} closes on one side only"))
        })?;

        // X ... seed ... Y
        let mut nodes: Vec<usize> = vec![x];
        nodes.extend(back.nodes.iter().rev());
        nodes.push(seed);
        nodes.extend(&fwd.nodes);
        nodes.push(y);
        let edges: Vec<usize> = back.edges.iter().rev().chain(&fwd.edges).copied().collect();

        let mut path: Vec<(usize, bool)> = edges
            .iter()
            .zip(nodes.windows(2))
            .map(|(&e, w)| (e, conn[e] == [w[0], w[1]]))
            .collect();
        let (mut start, mut end) = (x, y);
        let lowest = path.iter().min_by_key(|&&(e, _)| e).map(|&(_, f)| f);
        if lowest == Some(false) {
            path.reverse();
            for step in &mut path {
                step.1 = !step.1;
            }
            (start, end) = (end, start);
        }

        let interior = &nodes[1..nodes.len() - 1];
        buf.splice_chain(start, end, &path)?;
        buf.remove_nodes(interior)?;
        for &n in interior {
            done[n] = true;
        }
        report.collapsed_nodes += interior.len();
        report.merged_chains += 1;
        log::trace!("collapsed chain {start} -> {end} over {} edges", path.len());
    }
    Ok((buf.flush()?, report))
}
