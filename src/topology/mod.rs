//! Read-only structural analysis of spatial graphs.
//!
//! Everything here works from the connectivity array alone (plus the radius
//! and category fields for root selection) and never modifies its input,
//! except [`store_ranks`] which adds a single attribute field. The fallible
//! analyses reject structurally inconsistent graphs up front.
//!
//! - [`components`]: connected component labelling
//! - [`duplicates`]: parallel edges, self-loops and coincident nodes
//! - [`inlet_outlet`]: root node selection from vessel categories
//! - [`tree`]: tree-likeness checks
//! - [`ranks`]: per-edge hop distance from the roots
//! - [`loops`]: cycle extraction over a BFS spanning tree

pub mod components;
pub mod duplicates;
pub mod inlet_outlet;
pub mod loops;
pub mod ranks;
pub mod tree;

pub use components::{component_sizes, connected_components};
pub use duplicates::{degenerate_nodes, duplicate_edge_groups, self_loops};
pub use inlet_outlet::{CategoryConfig, identify_inlet_outlet};
pub use loops::{Loop, find_loops};
pub use ranks::{compute_ranks, compute_ranks_from, store_ranks};
pub use tree::{TreeCheckOptions, TreeReport, TreeViolation, is_tree};
