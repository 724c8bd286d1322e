//! Connected component labelling.

use crate::graph::SpatialGraph;
use crate::graph_error::GraphError;

/// Component id of every node.
///
/// Components are grown by frontier expansion, seeded first from unassigned
/// nodes of degree 0 or 1 and then from any node still unassigned. Each
/// round of expansion is bounded; a graph that needs more rounds than it has
/// nodes reports `IterationLimitExceeded`. Ids are dense and numbered in
/// order of first appearance by node index, so node 0 is always in
/// component 0.
pub fn connected_components(g: &SpatialGraph) -> Result<Vec<usize>, GraphError> {
    g.check_structure()?;
    label_components(g, g.node_count() + 1)
}

/// Frontier expansion with at most `limit` rounds per component.
fn label_components(g: &SpatialGraph, limit: usize) -> Result<Vec<usize>, GraphError> {
    let n = g.node_count();
    let adj = g.incidence();
    let deg = g.node_degree_vector();

    let seeds = (0..n).filter(|&v| deg[v] <= 1).chain((0..n).filter(|&v| deg[v] > 1));
    let mut raw: Vec<Option<usize>> = vec![None; n];
    let mut next_id = 0;
    for seed in seeds {
        if raw[seed].is_some() {
            continue;
        }
        let id = next_id;
        next_id += 1;
        raw[seed] = Some(id);
        let mut frontier = vec![seed];
        let mut rounds = 0;
        while !frontier.is_empty() {
            rounds += 1;
            if rounds > limit {
                return Err(GraphError::IterationLimitExceeded {
                    context: "connected components",
                    limit,
                });
            }
            let mut next = Vec::new();
            for &v in &frontier {
                for &(_, w) in &adj[v] {
                    // keep the smaller id if two fronts meet
                    match raw[w] {
                        Some(other) if other <= id => {}
                        _ => {
                            raw[w] = Some(id);
                            next.push(w);
                        }
                    }
                }
            }
            frontier = next;
        }
    }

    // dense renumbering in node order
    let mut remap: Vec<Option<usize>> = vec![None; next_id];
    let mut dense = 0;
    let mut out = Vec::with_capacity(n);
    for r in raw.into_iter().flatten() {
        let id = *remap[r].get_or_insert_with(|| {
            dense += 1;
            dense - 1
        });
        out.push(id);
    }
    log::debug!("connected_components: {dense} components over {n} nodes");
    Ok(out)
}

/// Node count of each component id.
pub fn component_sizes(components: &[usize]) -> Vec<usize> {
    let mut sizes = Vec::new();
    for &c in components {
        if c >= sizes.len() {
            sizes.resize(c + 1, 0);
        }
        sizes[c] += 1;
    }
    sizes
}
