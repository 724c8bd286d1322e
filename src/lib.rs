#![cfg_attr(docsrs, feature(doc_cfg))]
//! # spatial-graph
//!
//! spatial-graph is an in-memory model for spatial graphs: nodes in 3D joined
//! by edges whose geometry is a polyline of sample points. It targets vessel
//! networks and similar branching structures, where every node, edge and
//! sample can carry typed attributes (radius, vessel type, flow, labels).
//!
//! ## Features
//! - A single [`AttributeStore`](data::AttributeStore) of named, typed arrays
//!   over the VERTEX, EDGE and POINT domains
//! - [`SpatialGraph`](graph::SpatialGraph): read-only queries, adjacency,
//!   geometry and diagnostic validation over that store
//! - Pure editing functions in [`edit`] (delete, split, collapse, resample,
//!   merge, crop, filter) that return new graphs and never touch their input
//! - A staged [`EditBuffer`](buffer::EditBuffer) for batches of additions and
//!   removals, compacted once on [`flush`](buffer::EditBuffer::flush)
//! - Component, tree, rank and loop analysis in [`topology`]
//! - Serde-friendly array interchange in [`io`]
//!
//! ## Invariants
//!
//! Every field's row count equals its domain size, the edge point counts sum
//! to the POINT domain size, every edge has at least two samples and every
//! connectivity entry names an existing node. All constructors and edits
//! preserve these; [`SpatialGraph::validate`](graph::SpatialGraph::validate)
//! reports the first violation of a graph assembled by hand.
//!
//! ## Cargo features
//! - `rayon`: per-edge lengths and resampling in parallel
//! - `check-invariants`: run invariant checks after edits in release builds

pub mod buffer;
pub mod data;
pub mod debug_invariants;
pub mod edit;
pub mod geometry;
pub mod graph;
pub mod graph_error;
pub mod io;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::buffer::{BufferConfig, EditBuffer};
    pub use crate::data::domain::{Domain, DomainSizes};
    pub use crate::data::field::{Attributes, Field, FieldData, ScalarType};
    pub use crate::data::names;
    pub use crate::data::store::AttributeStore;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::edit::{self, ResampleTarget, SplitOutcome};
    pub use crate::geometry::{Affine3, BoundingBox};
    pub use crate::graph::{
        EdgeRecord, Reduction, SpatialGraph, ValidationOptions, ValidationReport,
    };
    pub use crate::graph_error::GraphError;
    pub use crate::io::{FieldRecord, GraphArrays, GraphReader, GraphWriter, RenderGeometry};
    pub use crate::topology::{
        self, CategoryConfig, Loop, TreeCheckOptions, TreeReport, TreeViolation,
    };
}
