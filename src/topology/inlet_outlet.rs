//! Inlet and outlet selection.
//!
//! Vessel networks carry a per-edge category (arterial, venous, capillary).
//! The inlet is the free end of the widest arterial edge that touches a
//! degree-1 node; the outlet is found the same way among venous edges.

use crate::data::names;
use crate::graph::{Reduction, SpatialGraph};
use crate::graph_error::GraphError;

/// Which field holds edge categories and which values mark inlet and outlet
/// edges.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CategoryConfig {
    /// Category field name; POINT fields are averaged per edge.
    pub field: String,
    pub inlet_category: i64,
    pub outlet_category: i64,
    /// Nodes that may not be chosen; edges touching them are skipped.
    pub ignore: Vec<usize>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            field: names::VESSEL_TYPE.to_owned(),
            inlet_category: 0,
            outlet_category: 1,
            ignore: Vec::new(),
        }
    }
}

impl CategoryConfig {
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    pub fn with_ignore(mut self, nodes: impl IntoIterator<Item = usize>) -> Self {
        self.ignore = nodes.into_iter().collect();
        self
    }
}

/// Find `(inlet, outlet)`.
///
/// Without a category field every edge is category 0, so only an inlet can
/// be found. Ties on radius go to the lowest edge index; if both ends of the
/// chosen edge have degree 1 the start node is returned.
///
/// # Errors
/// `MissingField` if no radius field resolves.
pub fn identify_inlet_outlet(
    g: &SpatialGraph,
    config: &CategoryConfig,
) -> Result<(Option<usize>, Option<usize>), GraphError> {
    g.check_structure()?;
    let radius = g
        .radius_field()
        .ok_or_else(|| GraphError::MissingField("radius".to_owned()))?;
    let edge_radius = g.edge_values(radius.name(), Reduction::Max)?;
    let category = match g.field(&config.field) {
        Some(f) => g.edge_values(f.name(), Reduction::Mean)?,
        None => vec![0.0; g.edge_count()],
    };
    let deg = g.node_degree_vector();
    let conn = g.edge_nodes();
    let mut ignored = vec![false; g.node_count()];
    for &n in &config.ignore {
        if let Some(slot) = ignored.get_mut(n) {
            *slot = true;
        }
    }

    let pick = |wanted: i64| -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (e, &[a, b]) in conn.iter().enumerate() {
            if category[e] != wanted as f64 || ignored[a] || ignored[b] {
                continue;
            }
            if deg[a] != 1 && deg[b] != 1 {
                continue;
            }
            let r = edge_radius[e];
            if r.is_nan() {
                continue;
            }
            if best.is_none_or(|(_, br)| r > br) {
                best = Some((e, r));
            }
        }
        best.map(|(e, _)| {
            let [a, b] = conn[e];
            if deg[a] == 1 { a } else { b }
        })
    };

    let inlet = pick(config.inlet_category);
    let outlet = pick(config.outlet_category);
    log::debug!("identify_inlet_outlet: inlet {inlet:?}, outlet {outlet:?}");
    Ok((inlet, outlet))
}
