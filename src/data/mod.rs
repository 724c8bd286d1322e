//! Data module: domains, typed fields and the attribute store
#![warn(missing_docs)]

pub mod domain;
pub mod field;
pub mod store;

pub use crate::debug_invariants::DebugInvariants;

pub use domain::{Domain, DomainSizes};
pub use field::{Attributes, Field, FieldData, FieldScalar, ScalarType};
pub use store::{AttributeStore, StoreViolation};

/// Names of the standard and conventional fields.
pub mod names {
    /// Node positions, VERTEX, float, arity 3.
    pub const VERTEX_COORDINATES: &str = "VertexCoordinates";
    /// Edge endpoints, EDGE, int, arity 2.
    pub const EDGE_CONNECTIVITY: &str = "EdgeConnectivity";
    /// Samples per edge, EDGE, int, arity 1.
    pub const NUM_EDGE_POINTS: &str = "NumEdgePoints";
    /// Polyline samples, POINT, float, arity 3.
    pub const EDGE_POINT_COORDINATES: &str = "EdgePointCoordinates";

    /// Unique node label.
    pub const NODE_LABEL: &str = "NodeLabel";
    /// Unique edge label, stored per point.
    pub const EDGE_LABEL: &str = "EdgeLabel";
    /// Unique point label.
    pub const POINT_LABEL: &str = "PointLabel";
    /// Edge rank written by [`crate::topology::store_ranks`].
    pub const RANKS: &str = "Ranks";
    /// Default category field (arterial/venous).
    pub const VESSEL_TYPE: &str = "VesselType";

    /// Radius field candidates, in lookup order (case-insensitive).
    pub const RADIUS_CANDIDATES: [&str; 5] =
        ["radius", "radii", "diameter", "diameters", "thickness"];

    /// Whether `name` is one of the four standard fields.
    pub fn is_standard(name: &str) -> bool {
        matches!(
            name,
            VERTEX_COORDINATES | EDGE_CONNECTIVITY | NUM_EDGE_POINTS | EDGE_POINT_COORDINATES
        )
    }
}
