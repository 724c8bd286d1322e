//! Graph validation helpers.
//!
//! Validation never fails: it returns a [`ValidationReport`] describing the
//! first violated invariant, which callers may turn into a [`GraphError`]
//! with [`ValidationReport::into_result`].

use super::{SpatialGraph, standard_fields, to_index};
use crate::data::domain::Domain;
use crate::data::store::StoreViolation;
use crate::geometry;
use crate::graph_error::GraphError;
use std::fmt;
use thiserror::Error;

/// Optional validation toggles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationOptions {
    /// Also check that polyline ends coincide with their edge's nodes.
    pub deep: bool,
    /// Distance under which two coordinates are considered equal.
    pub tolerance: f64,
    /// Reject NaN or infinite coordinates.
    pub check_finite: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            deep: false,
            tolerance: 1e-6,
            check_finite: true,
        }
    }
}

impl ValidationOptions {
    /// Enable all validation checks.
    pub fn all() -> Self {
        Self {
            deep: true,
            ..Self::default()
        }
    }

    /// Structural checks only; coordinates are not inspected.
    pub fn structural() -> Self {
        Self {
            deep: false,
            check_finite: false,
            ..Self::default()
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Which end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEnd {
    Start,
    End,
}

impl fmt::Display for EdgeEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EdgeEnd::Start => "start",
            EdgeEnd::End => "end",
        })
    }
}

/// A violated graph invariant.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Violation {
    #[error("standard field `{0}` is missing")]
    MissingStandardField(&'static str),
    #[error("standard field `{0}` has the wrong type or arity")]
    StandardFieldLayout(&'static str),
    #[error(transparent)]
    Store(#[from] StoreViolation),
    #[error("edge {edge} has {count} points, at least 2 required")]
    TooFewPoints { edge: usize, count: i64 },
    #[error("edge {edge} references node {node}, node count is {nodes}")]
    EndpointOutOfRange { edge: usize, node: i64, nodes: usize },
    #[error("{domain} row {row} has a non-finite coordinate")]
    NonFinite { domain: Domain, row: usize },
    #[error("edge {edge} {end} sample is {distance} away from its node")]
    EndpointMismatch {
        edge: usize,
        end: EdgeEnd,
        distance: f64,
    },
}

/// Outcome of [`SpatialGraph::validate`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    violation: Option<Violation>,
}

impl ValidationReport {
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.violation.is_none()
    }

    /// The first violation found, if any.
    #[inline]
    pub fn violation(&self) -> Option<&Violation> {
        self.violation.as_ref()
    }

    /// Human-readable summary.
    pub fn description(&self) -> String {
        match &self.violation {
            None => "graph is valid".to_owned(),
            Some(v) => v.to_string(),
        }
    }

    /// `Ok` when valid, otherwise the violation mapped onto [`GraphError`].
    pub fn into_result(self) -> Result<(), GraphError> {
        let Some(v) = self.violation else {
            return Ok(());
        };
        Err(match v {
            Violation::MissingStandardField(name) => GraphError::MissingField(name.to_owned()),
            Violation::Store(s) => s.into(),
            Violation::EndpointOutOfRange { node, nodes, .. } => GraphError::IndexOutOfRange {
                domain: Domain::Vertex,
                index: to_index(node),
                len: nodes,
            },
            other => GraphError::InvalidTopology(other.to_string()),
        })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

pub(super) fn validate_graph(g: &SpatialGraph, opts: &ValidationOptions) -> ValidationReport {
    ValidationReport {
        violation: first_violation(g, opts),
    }
}

fn first_violation(g: &SpatialGraph, opts: &ValidationOptions) -> Option<Violation> {
    let store = g.store();
    for (name, domain, ty, arity) in standard_fields() {
        match store.field(name) {
            None => return Some(Violation::MissingStandardField(name)),
            Some(f) if f.domain() != domain || f.scalar_type() != ty || f.arity() != arity => {
                return Some(Violation::StandardFieldLayout(name));
            }
            Some(_) => {}
        }
    }

    if let Some(v) = store.validate().into_iter().next() {
        return Some(v.into());
    }

    for (edge, &count) in g.edge_point_counts().iter().enumerate() {
        if count < 2 {
            return Some(Violation::TooFewPoints { edge, count });
        }
    }

    let nodes = g.node_count();
    for (edge, &[a, b]) in g.edge_connectivity().iter().enumerate() {
        for node in [a, b] {
            if node < 0 || node as usize >= nodes {
                return Some(Violation::EndpointOutOfRange { edge, node, nodes });
            }
        }
    }

    if opts.check_finite {
        for (domain, coords) in [
            (Domain::Vertex, g.node_coords()),
            (Domain::Point, g.point_coords()),
        ] {
            if let Some(row) = coords.iter().position(|p| p.iter().any(|x| !x.is_finite())) {
                return Some(Violation::NonFinite { domain, row });
            }
        }
    }

    if opts.deep {
        let nodes = g.node_coords();
        let points = g.point_coords();
        for (edge, rec) in g.edges().into_iter().enumerate() {
            let ends = [
                (EdgeEnd::Start, rec.start, rec.points.start),
                (EdgeEnd::End, rec.end, rec.points.end - 1),
            ];
            for (end, node, row) in ends {
                let distance = geometry::distance(nodes[node], points[row]);
                if !(distance <= opts.tolerance) {
                    return Some(Violation::EndpointMismatch {
                        edge,
                        end,
                        distance,
                    });
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::field::FieldData;
    use crate::data::names;

    fn line() -> SpatialGraph {
        SpatialGraph::from_parts(
            &[[0., 0., 0.], [2., 0., 0.]],
            &[[0, 1]],
            &[vec![[0., 0., 0.], [1., 0., 0.], [2., 0., 0.]]],
        )
        .unwrap()
    }

    #[test]
    fn valid_graph_passes_all_checks() {
        let r = line().validate(ValidationOptions::all());
        assert!(r.is_valid(), "{r}");
        assert_eq!(r.description(), "graph is valid");
    }

    #[test]
    fn deep_check_catches_displaced_endpoint() {
        let mut g = line();
        g.set_data(
            names::EDGE_POINT_COORDINATES,
            FieldData::Float(vec![0., 0., 0., 1., 0., 0., 2., 1., 0.]),
        )
        .unwrap();
        assert!(g.validate(ValidationOptions::default()).is_valid());
        let r = g.validate(ValidationOptions::all());
        assert!(matches!(
            r.violation(),
            Some(Violation::EndpointMismatch { edge: 0, end: EdgeEnd::End, .. })
        ));
        assert!(matches!(r.into_result(), Err(GraphError::InvalidTopology(_))));
    }

    #[test]
    fn bad_endpoint_maps_to_index_error() {
        let mut g = line();
        g.set_data_deferred(names::EDGE_CONNECTIVITY, FieldData::Int(vec![0, 5]))
            .unwrap();
        let err = g.validate(ValidationOptions::default()).into_result();
        assert_eq!(
            err,
            Err(GraphError::IndexOutOfRange {
                domain: Domain::Vertex,
                index: 5,
                len: 2
            })
        );
    }

    #[test]
    fn nan_coordinates_are_reported() {
        let mut g = line();
        g.set_data_deferred(
            names::VERTEX_COORDINATES,
            FieldData::Float(vec![0., 0., 0., f64::NAN, 0., 0.]),
        )
        .unwrap();
        assert!(matches!(
            g.validate(ValidationOptions::default()).violation(),
            Some(Violation::NonFinite { domain: Domain::Vertex, row: 1 })
        ));
        assert!(g.validate(ValidationOptions::structural()).is_valid());
    }

    #[test]
    fn single_point_edge_is_rejected() {
        let err = SpatialGraph::from_parts(&[[0.; 3]], &[[0, 0]], &[vec![[0.; 3]]]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidTopology(_)));
    }
}
