//! Edge ranks: breadth-first hop count from the inlet and outlet.

use super::inlet_outlet::{CategoryConfig, identify_inlet_outlet};
use crate::data::domain::Domain;
use crate::data::field::{Field, FieldData};
use crate::data::names;
use crate::graph::SpatialGraph;
use crate::graph_error::GraphError;

/// Per-edge ranks from the identified inlet and outlet (default category
/// config). Edges next to a root get rank 1; unreached edges stay 0. The
/// outlet walk overwrites the inlet walk where both reach.
///
/// # Errors
/// `MissingField` if no radius field resolves.
pub fn compute_ranks(g: &SpatialGraph) -> Result<Vec<i64>, GraphError> {
    let (inlet, outlet) = identify_inlet_outlet(g, &CategoryConfig::default())?;
    let roots: Vec<usize> = inlet.into_iter().chain(outlet).collect();
    compute_ranks_from(g, &roots)
}

/// Per-edge ranks from explicit roots, walked one after another.
pub fn compute_ranks_from(g: &SpatialGraph, roots: &[usize]) -> Result<Vec<i64>, GraphError> {
    g.check_structure()?;
    ranks_within(g, roots, g.edge_count() + 1)
}

/// Rank walks of at most `limit` rounds each.
fn ranks_within(g: &SpatialGraph, roots: &[usize], limit: usize) -> Result<Vec<i64>, GraphError> {
    let adj = g.incidence();
    let mut ranks = vec![0i64; g.edge_count()];
    for &root in roots {
        if root >= g.node_count() {
            return Err(GraphError::node_out_of_range(root, g.node_count()));
        }
        let mut seen_node = vec![false; g.node_count()];
        let mut seen_edge = vec![false; g.edge_count()];
        seen_node[root] = true;
        let mut front = vec![root];
        let mut rank = 1;
        while !front.is_empty() {
            if rank as usize > limit {
                return Err(GraphError::IterationLimitExceeded {
                    context: "rank walk",
                    limit,
                });
            }
            let mut next = Vec::new();
            for &u in &front {
                for &(e, w) in &adj[u] {
                    if seen_edge[e] {
                        continue;
                    }
                    seen_edge[e] = true;
                    ranks[e] = rank;
                    if !seen_node[w] {
                        seen_node[w] = true;
                        next.push(w);
                    }
                }
            }
            front = next;
            rank += 1;
        }
    }
    Ok(ranks)
}

/// Compute ranks and store them in the EDGE field `Ranks`, replacing any
/// existing field of that name.
pub fn store_ranks(g: &mut SpatialGraph) -> Result<Vec<i64>, GraphError> {
    let ranks = compute_ranks(g)?;
    if g.field(names::RANKS).is_some() {
        g.remove_field(names::RANKS)?;
    }
    g.add_field(Field::new(
        names::RANKS,
        Domain::Edge,
        1,
        FieldData::Int(ranks.clone()),
    ))?;
    log::debug!("stored ranks for {} edges", ranks.len());
    Ok(ranks)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Binary split: 0 - 1, 1 - 2, 1 - 3, 3 - 4, and a detached edge 5 - 6.
    fn tree() -> SpatialGraph {
        let p = |x: f64, y: f64| [x, y, 0.];
        let nodes = [p(0., 0.), p(1., 0.), p(2., 1.), p(2., -1.), p(3., -1.), p(9., 9.), p(9., 8.)];
        let conn = [[0, 1], [1, 2], [1, 3], [3, 4], [5, 6]];
        let points: Vec<Vec<[f64; 3]>> =
            conn.iter().map(|&[a, b]| vec![nodes[a], nodes[b]]).collect();
        let mut g = SpatialGraph::from_parts(&nodes, &conn, &points).unwrap();
        g.add_field(Field::new("radius", Domain::Edge, 1, FieldData::Float(vec![3., 2., 2., 1., 0.5])))
            .unwrap();
        g
    }

    #[test]
    fn ranks_count_hops_from_the_inlet() {
        let g = tree();
        assert_eq!(compute_ranks(&g).unwrap(), vec![1, 2, 2, 3, 0]);
        assert_eq!(compute_ranks_from(&g, &[4]).unwrap(), vec![3, 3, 2, 1, 0]);
        assert!(compute_ranks_from(&g, &[70]).is_err());
    }

    #[test]
    fn store_ranks_adds_then_replaces() {
        let mut g = tree();
        store_ranks(&mut g).unwrap();
        store_ranks(&mut g).unwrap();
        assert_eq!(
            g.field(names::RANKS).unwrap().data(),
            &FieldData::Int(vec![1, 2, 2, 3, 0])
        );
    }

    #[test]
    fn deep_walk_hits_the_round_limit() {
        let g = tree();
        assert_eq!(
            ranks_within(&g, &[0], 2),
            Err(GraphError::IterationLimitExceeded { context: "rank walk", limit: 2 })
        );
        assert_eq!(ranks_within(&g, &[0], 4).unwrap(), vec![1, 2, 2, 3, 0]);
    }
}
