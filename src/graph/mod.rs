//! SpatialGraph: nodes in 3D joined by polyline edges.
//!
//! The graph owns an [`AttributeStore`] holding four standard fields
//! (`VertexCoordinates`, `EdgeConnectivity`, `NumEdgePoints`,
//! `EdgePointCoordinates`) and any number of attribute fields over the same
//! three domains. Edge `e` owns the contiguous POINT rows
//! `offset(e) .. offset(e) + NumEdgePoints[e]` where `offset` is the prefix
//! sum of the point counts. Adjacency is never stored; it is recomputed from
//! the connectivity array on demand.
//!
//! Structural changes go through [`crate::edit`] or [`crate::buffer`], which
//! return new graphs and leave their input untouched.

pub mod labels;
pub mod validation;

use crate::data::domain::{Domain, DomainSizes};
use crate::data::field::{Field, FieldData, ScalarType};
use crate::data::names;
use crate::data::store::AttributeStore;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::{self, BoundingBox};
use crate::graph_error::GraphError;
use labels::{LabelCounters, LabelKind};
use std::ops::Range;
pub use validation::{ValidationOptions, ValidationReport, Violation};

/// One edge: its endpoints and the POINT rows it owns.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EdgeRecord {
    pub start: usize,
    pub end: usize,
    pub points: Range<usize>,
}

impl EdgeRecord {
    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.start == self.end
    }

    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    pub fn other(&self, node: usize) -> Option<usize> {
        if node == self.start {
            Some(self.end)
        } else if node == self.end {
            Some(self.start)
        } else {
            None
        }
    }
}

/// How to reduce the point samples of one edge to a single value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Reduction {
    #[default]
    Mean,
    Max,
    Min,
    First,
}

impl Reduction {
    fn apply(self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        match self {
            Reduction::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Reduction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reduction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reduction::First => values[0],
        }
    }
}

/// An in-memory spatial graph.
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialGraph {
    store: AttributeStore,
    labels: LabelCounters,
}

static_assertions::assert_impl_all!(SpatialGraph: Send, Sync);

impl Default for SpatialGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SpatialGraph {
    /// Empty graph with the four standard fields declared.
    pub fn new() -> Self {
        let fields = standard_fields()
            .into_iter()
            .map(|(name, domain, ty, arity)| Field::empty(name, domain, ty, arity))
            .collect();
        Self {
            store: AttributeStore::from_fields_unchecked(DomainSizes::default(), fields),
            labels: LabelCounters::default(),
        }
    }

    /// Build a graph from node coordinates, edge endpoints and per-edge
    /// polylines.
    ///
    /// # Errors
    /// `InvalidTopology` if the edge and polyline counts differ or a
    /// polyline has fewer than two samples; `IndexOutOfRange` for a bad
    /// endpoint.
    pub fn from_parts(
        nodes: &[[f64; 3]],
        edges: &[[usize; 2]],
        polylines: &[Vec<[f64; 3]>],
    ) -> Result<Self, GraphError> {
        if edges.len() != polylines.len() {
            return Err(GraphError::InvalidTopology(format!(
                "{} edges but {} polylines",
                edges.len(),
                polylines.len()
            )));
        }
        let npoints: usize = polylines.iter().map(Vec::len).sum();
        let sizes = DomainSizes::new(nodes.len(), edges.len(), npoints);
        let conn: Vec<i64> = edges.iter().flatten().map(|&n| n as i64).collect();
        let counts: Vec<i64> = polylines.iter().map(|p| p.len() as i64).collect();
        let pts: Vec<f64> = polylines.iter().flatten().flatten().copied().collect();
        let coords: Vec<f64> = nodes.iter().flatten().copied().collect();
        let g = Self::from_standard_arrays(sizes, coords, conn, counts, pts);
        g.check_structure()?;
        Ok(g)
    }

    /// Graph over prepared standard arrays. Nothing is checked.
    pub(crate) fn from_standard_arrays(
        sizes: DomainSizes,
        coords: Vec<f64>,
        conn: Vec<i64>,
        counts: Vec<i64>,
        points: Vec<f64>,
    ) -> Self {
        let fields = vec![
            Field::new(names::VERTEX_COORDINATES, Domain::Vertex, 3, FieldData::Float(coords)),
            Field::new(names::EDGE_CONNECTIVITY, Domain::Edge, 2, FieldData::Int(conn)),
            Field::new(names::NUM_EDGE_POINTS, Domain::Edge, 1, FieldData::Int(counts)),
            Field::new(names::EDGE_POINT_COORDINATES, Domain::Point, 3, FieldData::Float(points)),
        ];
        Self::from_store(AttributeStore::from_fields_unchecked(sizes, fields))
    }

    /// Wrap a store, seeding label counters from it.
    pub(crate) fn from_store(store: AttributeStore) -> Self {
        let labels = LabelCounters::seeded_from(&store);
        Self { store, labels }
    }

    /// Wrap a store, keeping at least the given counters.
    pub(crate) fn from_store_with_labels(store: AttributeStore, labels: LabelCounters) -> Self {
        let labels = labels.max(LabelCounters::seeded_from(&store));
        Self { store, labels }
    }

    /// Deep, independent copy.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    // ---- sizes ----------------------------------------------------------

    #[inline]
    pub fn node_count(&self) -> usize {
        self.store.domain_size(Domain::Vertex)
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.store.domain_size(Domain::Edge)
    }

    #[inline]
    pub fn point_count(&self) -> usize {
        self.store.domain_size(Domain::Point)
    }

    #[inline]
    pub fn domain_sizes(&self) -> DomainSizes {
        self.store.domain_sizes()
    }

    /// Read-only access to every array.
    #[inline]
    pub fn store(&self) -> &AttributeStore {
        &self.store
    }

    #[inline]
    pub(crate) fn labels(&self) -> LabelCounters {
        self.labels
    }

    // ---- standard arrays ------------------------------------------------

    fn floats(&self, name: &str) -> &[f64] {
        self.store
            .field(name)
            .and_then(|f| f.values::<f64>().ok())
            .unwrap_or(&[])
    }

    fn ints(&self, name: &str) -> &[i64] {
        self.store
            .field(name)
            .and_then(|f| f.values::<i64>().ok())
            .unwrap_or(&[])
    }

    /// All node coordinates as `[x, y, z]` rows.
    pub fn node_coords(&self) -> &[[f64; 3]] {
        let v = self.floats(names::VERTEX_COORDINATES);
        bytemuck::cast_slice(&v[..v.len() / 3 * 3])
    }

    /// All polyline samples as `[x, y, z]` rows.
    pub fn point_coords(&self) -> &[[f64; 3]] {
        let v = self.floats(names::EDGE_POINT_COORDINATES);
        bytemuck::cast_slice(&v[..v.len() / 3 * 3])
    }

    /// Raw `[start, end]` rows of the connectivity array.
    pub fn edge_connectivity(&self) -> &[[i64; 2]] {
        let v = self.ints(names::EDGE_CONNECTIVITY);
        bytemuck::cast_slice(&v[..v.len() / 2 * 2])
    }

    /// Point count of every edge.
    pub fn edge_point_counts(&self) -> &[i64] {
        self.ints(names::NUM_EDGE_POINTS)
    }

    /// Coordinates of node `i`.
    pub fn node_coord(&self, i: usize) -> Result<[f64; 3], GraphError> {
        self.node_coords()
            .get(i)
            .copied()
            .ok_or_else(|| GraphError::node_out_of_range(i, self.node_count()))
    }

    /// Endpoints of every edge as node indices.
    pub fn edge_nodes(&self) -> Vec<[usize; 2]> {
        self.edge_connectivity()
            .iter()
            .map(|&[a, b]| [to_index(a), to_index(b)])
            .collect()
    }

    /// Prefix-sum offsets into the POINT domain, one per edge plus the total.
    pub fn edge_offsets(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.edge_count() + 1);
        let mut acc = 0usize;
        out.push(0);
        for &c in self.edge_point_counts() {
            acc += c.max(0) as usize;
            out.push(acc);
        }
        out
    }

    /// POINT rows owned by edge `e`.
    pub fn edge_point_range(&self, e: usize) -> Result<Range<usize>, GraphError> {
        let counts = self.edge_point_counts();
        if e >= counts.len() {
            return Err(GraphError::edge_out_of_range(e, self.edge_count()));
        }
        let start: usize = counts[..e].iter().map(|&c| c.max(0) as usize).sum();
        Ok(start..start + counts[e].max(0) as usize)
    }

    /// Endpoints and point range of edge `e`.
    pub fn edge(&self, e: usize) -> Result<EdgeRecord, GraphError> {
        let points = self.edge_point_range(e)?;
        let [a, b] = self.edge_connectivity()[e];
        Ok(EdgeRecord {
            start: to_index(a),
            end: to_index(b),
            points,
        })
    }

    /// Records for every edge.
    pub fn edges(&self) -> Vec<EdgeRecord> {
        let offsets = self.edge_offsets();
        self.edge_connectivity()
            .iter()
            .enumerate()
            .map(|(e, &[a, b])| EdgeRecord {
                start: to_index(a),
                end: to_index(b),
                points: match (offsets.get(e), offsets.get(e + 1)) {
                    (Some(&lo), Some(&hi)) => lo..hi,
                    _ => 0..0,
                },
            })
            .collect()
    }

    /// Polyline samples of edge `e`.
    pub fn edge_points(&self, e: usize) -> Result<&[[f64; 3]], GraphError> {
        let r = self.edge_point_range(e)?;
        self.point_coords().get(r).ok_or_else(|| {
            GraphError::InvalidTopology(format!("edge {e} points exceed POINT domain"))
        })
    }

    /// Owning edge of every POINT row.
    pub fn edge_point_edge_indices(&self) -> Vec<usize> {
        let mut out = Vec::with_capacity(self.point_count());
        for (e, &c) in self.edge_point_counts().iter().enumerate() {
            out.extend(std::iter::repeat_n(e, c.max(0) as usize));
        }
        out
    }

    // ---- adjacency ------------------------------------------------------

    /// Edges with `n` as an endpoint, ascending.
    pub fn edges_containing_node(&self, n: usize) -> Result<Vec<usize>, GraphError> {
        self.check_node(n)?;
        Ok(self
            .edge_connectivity()
            .iter()
            .enumerate()
            .filter(|&(_, &[a, b])| to_index(a) == n || to_index(b) == n)
            .map(|(e, _)| e)
            .collect())
    }

    /// Nodes joined to `n` by an edge, one entry per incident edge in edge
    /// order. A self-loop contributes `n` itself.
    pub fn connected_nodes(&self, n: usize) -> Result<Vec<usize>, GraphError> {
        self.check_node(n)?;
        Ok(self
            .edge_connectivity()
            .iter()
            .filter_map(|&[a, b]| {
                let (a, b) = (to_index(a), to_index(b));
                if a == n {
                    Some(b)
                } else if b == n {
                    Some(a)
                } else {
                    None
                }
            })
            .collect())
    }

    /// Incident-edge count per node; a self-loop counts twice.
    pub fn node_degree_vector(&self) -> Vec<usize> {
        let n = self.node_count();
        let mut deg = vec![0usize; n];
        for [a, b] in self.edge_nodes() {
            if a < n {
                deg[a] += 1;
            }
            if b < n {
                deg[b] += 1;
            }
        }
        deg
    }

    /// Per-node list of `(edge, neighbour)` pairs in edge order. A self-loop
    /// appears once in its node's list.
    pub fn incidence(&self) -> Vec<Vec<(usize, usize)>> {
        let n = self.node_count();
        let mut adj = vec![Vec::new(); n];
        for (e, [a, b]) in self.edge_nodes().into_iter().enumerate() {
            if a >= n || b >= n {
                continue;
            }
            adj[a].push((e, b));
            if a != b {
                adj[b].push((e, a));
            }
        }
        adj
    }

    fn check_node(&self, n: usize) -> Result<(), GraphError> {
        if n >= self.node_count() {
            return Err(GraphError::node_out_of_range(n, self.node_count()));
        }
        Ok(())
    }

    // ---- attributes -----------------------------------------------------

    /// Look up any field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.store.field(name)
    }

    /// Non-standard arity-1 fields of `domain`, in declaration order.
    pub fn scalar_fields(&self, domain: Domain) -> Vec<&Field> {
        self.store
            .fields_in(domain)
            .filter(|f| f.is_scalar() && !names::is_standard(f.name()))
            .collect()
    }

    /// The radius-like field, searching `radius, radii, diameter, diameters,
    /// thickness` case-insensitively, POINT domain first.
    pub fn radius_field(&self) -> Option<&Field> {
        let find = |domain: Option<Domain>| {
            names::RADIUS_CANDIDATES.iter().find_map(|cand| {
                self.store.fields().find(|f| {
                    f.is_scalar()
                        && f.name().eq_ignore_ascii_case(cand)
                        && domain.is_none_or(|d| f.domain() == d)
                })
            })
        };
        find(Some(Domain::Point)).or_else(|| find(None))
    }

    /// Reduce a POINT field to one value per edge.
    ///
    /// # Errors
    /// `FieldNotFound` if absent, `ShapeMismatch` if it is not a scalar
    /// POINT field.
    pub fn point_scalars_to_edge_scalars(
        &self,
        name: &str,
        reduction: Reduction,
    ) -> Result<Vec<f64>, GraphError> {
        let f = self.store.get_field(name)?;
        if f.domain() != Domain::Point || !f.is_scalar() {
            return Err(GraphError::ShapeMismatch {
                name: name.to_owned(),
                domain: f.domain(),
                expected: self.point_count(),
                found: f.rows(),
            });
        }
        let values = f.data().to_f64_vec();
        let offsets = self.edge_offsets();
        Ok(offsets
            .windows(2)
            .map(|w| reduction.apply(values.get(w[0]..w[1]).unwrap_or(&[])))
            .collect())
    }

    /// Per-edge values of a field from any domain: EDGE fields are read
    /// directly, POINT fields reduced with `reduction`.
    pub fn edge_values(&self, name: &str, reduction: Reduction) -> Result<Vec<f64>, GraphError> {
        let f = self.store.get_field(name)?;
        match f.domain() {
            Domain::Edge if f.is_scalar() => Ok(f.data().to_f64_vec()),
            _ => self.point_scalars_to_edge_scalars(name, reduction),
        }
    }

    /// Per-node reduction of the per-edge values of `name` (see
    /// [`edge_values`](Self::edge_values), POINT fields averaged first) over
    /// each node's incident edges. Isolated nodes get NaN.
    pub fn edge_scalars_to_node_scalars(
        &self,
        name: &str,
        reduction: Reduction,
    ) -> Result<Vec<f64>, GraphError> {
        let per_edge = self.edge_values(name, Reduction::Mean)?;
        Ok(self
            .incidence()
            .iter()
            .map(|inc| {
                let vals: Vec<f64> = inc.iter().filter_map(|&(e, _)| per_edge.get(e).copied()).collect();
                reduction.apply(&vals)
            })
            .collect())
    }

    /// Per-node reduction of a scalar POINT field, sampled where each
    /// incident polyline meets the node. `Reduction::First` takes the sample
    /// on the node's lowest-numbered edge. Isolated nodes get NaN.
    ///
    /// # Errors
    /// `FieldNotFound` if absent, `ShapeMismatch` if it is not a scalar
    /// POINT field.
    pub fn point_scalars_to_node_scalars(
        &self,
        name: &str,
        reduction: Reduction,
    ) -> Result<Vec<f64>, GraphError> {
        let f = self.store.get_field(name)?;
        if f.domain() != Domain::Point || !f.is_scalar() {
            return Err(GraphError::ShapeMismatch {
                name: name.to_owned(),
                domain: f.domain(),
                expected: self.point_count(),
                found: f.rows(),
            });
        }
        let values = f.data().to_f64_vec();
        let mut touching = vec![Vec::new(); self.node_count()];
        for rec in self.edges().iter().filter(|r| !r.points.is_empty()) {
            let ends = [(rec.start, rec.points.start), (rec.end, rec.points.end - 1)];
            for (node, row) in ends {
                if let (Some(t), Some(&v)) = (touching.get_mut(node), values.get(row)) {
                    t.push(v);
                }
            }
        }
        Ok(touching.iter().map(|v| reduction.apply(v)).collect())
    }

    // ---- geometry -------------------------------------------------------

    /// Arc length of every polyline.
    pub fn edge_lengths(&self) -> Vec<f64> {
        let pts = self.point_coords();
        let offsets = self.edge_offsets();
        let length = |w: &[usize]| geometry::polyline_length(pts.get(w[0]..w[1]).unwrap_or(&[]));
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            let windows: Vec<&[usize]> = offsets.windows(2).collect();
            windows.into_par_iter().map(length).collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            offsets.windows(2).map(length).collect()
        }
    }

    /// Straight-line distance between the endpoints of every edge.
    pub fn node_to_node_lengths(&self) -> Vec<f64> {
        let coords = self.node_coords();
        self.edge_nodes()
            .into_iter()
            .map(|[a, b]| match (coords.get(a), coords.get(b)) {
                (Some(&p), Some(&q)) => geometry::distance(p, q),
                _ => f64::NAN,
            })
            .collect()
    }

    /// Bounding box of the node coordinates.
    pub fn node_spatial_extent(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.node_coords())
    }

    /// Bounding box of the polyline samples.
    pub fn edge_spatial_extent(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.point_coords())
    }

    // ---- whole-array mutation -------------------------------------------

    /// Replace a field's array; the row count must match its domain size.
    ///
    /// Replacing a standard field also re-checks the structure (endpoint
    /// range, point totals). On failure the old array is put back.
    pub fn set_data(&mut self, name: &str, data: FieldData) -> Result<(), GraphError> {
        if !names::is_standard(name) {
            return self.store.set_field(name, data);
        }
        let old = self.store.get_field(name)?.data().clone();
        self.store.set_field(name, data)?;
        if let Err(e) = self.check_structure() {
            self.store.set_field_deferred(name, old)?;
            return Err(e);
        }
        Ok(())
    }

    /// Replace a field's array without the shape check.
    ///
    /// Pair with [`set_domain_sizes`](Self::set_domain_sizes) and finish
    /// with [`validate`](Self::validate).
    pub fn set_data_deferred(&mut self, name: &str, data: FieldData) -> Result<(), GraphError> {
        self.store.set_field_deferred(name, data)
    }

    /// Overwrite the authoritative domain sizes.
    pub fn set_domain_sizes(&mut self, sizes: DomainSizes) {
        for d in Domain::ALL {
            self.store.set_domain_size(d, sizes.get(d));
        }
    }

    /// Declare an attribute field; its row count must match the domain size.
    pub fn add_field(&mut self, field: Field) -> Result<(), GraphError> {
        self.store.add_field(field)
    }

    /// Remove an attribute field. The standard fields cannot be removed.
    pub fn remove_field(&mut self, name: &str) -> Result<Field, GraphError> {
        if names::is_standard(name) {
            return Err(GraphError::InvalidTopology(format!(
                "standard field `{name}` cannot be removed"
            )));
        }
        self.store.remove_field(name)
    }

    /// Rename an attribute field.
    pub fn rename_field(&mut self, old: &str, new: &str) -> Result<(), GraphError> {
        if names::is_standard(old) || names::is_standard(new) {
            return Err(GraphError::InvalidTopology(format!(
                "standard field names are fixed (`{old}` -> `{new}`)"
            )));
        }
        self.store.rename_field(old, new)
    }

    // ---- labels ---------------------------------------------------------

    /// Fresh node label, unique among the current `NodeLabel` values.
    pub fn next_node_label(&mut self) -> i64 {
        self.next_label(LabelKind::Node)
    }

    /// Fresh edge label, unique among the current `EdgeLabel` values.
    pub fn next_edge_label(&mut self) -> i64 {
        self.next_label(LabelKind::Edge)
    }

    /// Fresh point label, unique among the current `PointLabel` values.
    pub fn next_point_label(&mut self) -> i64 {
        self.next_label(LabelKind::Point)
    }

    fn next_label(&mut self, kind: LabelKind) -> i64 {
        let existing = self.store.field(kind.field_name()).map(Field::data);
        self.labels.next(kind, existing)
    }

    // ---- validation -----------------------------------------------------

    /// Check the graph invariants and describe the first violation.
    pub fn validate(&self, options: ValidationOptions) -> ValidationReport {
        validation::validate_graph(self, &options)
    }

    /// Structural invariants as an error; used by constructors.
    pub(crate) fn check_structure(&self) -> Result<(), GraphError> {
        self.validate(ValidationOptions::default()).into_result()
    }
}

impl DebugInvariants for SpatialGraph {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "SpatialGraph");
    }

    fn validate_invariants(&self) -> Result<(), GraphError> {
        self.check_structure()
    }
}

/// Name, domain, type and arity of the standard fields.
pub(crate) fn standard_fields() -> [(&'static str, Domain, ScalarType, usize); 4] {
    [
        (names::VERTEX_COORDINATES, Domain::Vertex, ScalarType::Float, 3),
        (names::EDGE_CONNECTIVITY, Domain::Edge, ScalarType::Int, 2),
        (names::NUM_EDGE_POINTS, Domain::Edge, ScalarType::Int, 1),
        (names::EDGE_POINT_COORDINATES, Domain::Point, ScalarType::Float, 3),
    ]
}

/// Node index from a stored connectivity value; negatives map out of range.
#[inline]
pub(crate) fn to_index(v: i64) -> usize {
    usize::try_from(v).unwrap_or(usize::MAX)
}
