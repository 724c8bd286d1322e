//! EditBuffer: amortized staging for many small structural edits.
//!
//! The buffer takes working copies of every array of a [`SpatialGraph`] with
//! spare capacity ("slack") and keeps an `allocated` mask per slot and
//! domain. Adds write into the next free slot and grow all arrays of a domain
//! by a fixed batch when capacity runs out; removals only clear mask bits.
//! Nothing is compacted until [`EditBuffer::flush`], which consumes the buffer
//! and returns a consistent graph.
//!
//! Indices accepted and returned by the buffer are slot handles. Rows of the
//! source graph keep their original index as handle, new rows get the handle
//! returned by the adder, and handles stay stable until `flush`, which
//! renumbers live rows densely in slot order. Between flushes the staged state
//! must only be read through the buffer's accessors.

use crate::data::domain::{Domain, DomainSizes};
use crate::data::field::{Attributes, Field, FieldData, FieldScalar, ScalarType};
use crate::data::names;
use crate::data::store::{AttributeStore, StoreViolation};
use crate::debug_invariants::DebugInvariants;
use crate::edit::SplitOutcome;
use crate::geometry;
use crate::graph::labels::{LabelCounters, LabelKind};
use crate::graph::{EdgeRecord, SpatialGraph, to_index};
use crate::graph_error::GraphError;
use std::ops::Range;

/// Growth and tolerance settings for an [`EditBuffer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferConfig {
    /// Rows added to a domain each time its capacity is exhausted.
    pub growth_batch: usize,
    /// Maximum distance between a supplied polyline end and its node.
    pub endpoint_tolerance: f64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            growth_batch: 500,
            endpoint_tolerance: 1e-6,
        }
    }
}

impl BufferConfig {
    pub fn with_growth_batch(mut self, n: usize) -> Self {
        self.growth_batch = n.max(1);
        self
    }
}

/// Staged copy of a graph supporting cheap repeated insertion and removal.
#[derive(Debug, Clone)]
pub struct EditBuffer {
    config: BufferConfig,
    /// Fields sized to capacity; domain sizes of the store are capacities.
    store: AttributeStore,
    used: [usize; 3],
    allocated: [Vec<bool>; 3],
    /// First POINT slot of each edge slot.
    point_start: Vec<usize>,
    labels: LabelCounters,
}

impl EditBuffer {
    /// Stage `g` with the default configuration.
    pub fn new(g: &SpatialGraph) -> Result<Self, GraphError> {
        Self::with_config(g, BufferConfig::default())
    }

    /// Stage `g`; every domain starts with `growth_batch` free slots.
    ///
    /// # Errors
    /// The first structural violation of `g` (endpoint range, point totals).
    pub fn with_config(g: &SpatialGraph, config: BufferConfig) -> Result<Self, GraphError> {
        g.check_structure()?;
        let config = config.with_growth_batch(config.growth_batch);
        let sizes = g.domain_sizes();
        let mut point_start: Vec<usize> = g.edge_offsets();
        point_start.pop();
        let mut buf = Self {
            config,
            store: g.store().clone(),
            used: [sizes.vertex, sizes.edge, sizes.point],
            allocated: [
                vec![true; sizes.vertex],
                vec![true; sizes.edge],
                vec![true; sizes.point],
            ],
            point_start,
            labels: g.labels(),
        };
        for d in Domain::ALL {
            buf.grow(d, config.growth_batch);
        }
        Ok(buf)
    }

    // ---- capacity -------------------------------------------------------

    /// Physical slots available in `domain`, live or not.
    #[inline]
    pub fn capacity(&self, domain: Domain) -> usize {
        self.allocated[domain.slot()].len()
    }

    fn grow(&mut self, domain: Domain, rows: usize) {
        let cap = self.capacity(domain) + rows;
        for f in self.store.fields_mut() {
            if f.domain() == domain {
                let arity = f.arity();
                f.data_mut().extend_neutral(rows * arity);
            }
        }
        self.store.set_domain_size(domain, cap);
        self.allocated[domain.slot()].resize(cap, false);
        if domain == Domain::Edge {
            self.point_start.resize(cap, 0);
        }
        log::trace!("EditBuffer: {domain} capacity now {cap}");
    }

    /// Claim `n` consecutive unused slots, growing in whole batches.
    fn reserve(&mut self, domain: Domain, n: usize) -> Range<usize> {
        let s = domain.slot();
        let need = self.used[s] + n;
        if need > self.capacity(domain) {
            let batch = self.config.growth_batch;
            let short = need - self.capacity(domain);
            self.grow(domain, short.div_ceil(batch) * batch);
        }
        let start = self.used[s];
        self.used[s] = need;
        for slot in start..need {
            self.allocated[s][slot] = true;
        }
        start..need
    }

    // ---- accessors ------------------------------------------------------

    /// Whether slot `i` of `domain` holds a live row.
    #[inline]
    pub fn is_live(&self, domain: Domain, i: usize) -> bool {
        self.allocated[domain.slot()].get(i).copied().unwrap_or(false)
    }

    pub fn live_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        live(&self.allocated[Domain::Vertex.slot()])
    }

    pub fn live_edges(&self) -> impl Iterator<Item = usize> + '_ {
        live(&self.allocated[Domain::Edge.slot()])
    }

    pub fn node_count(&self) -> usize {
        self.live_nodes().count()
    }

    pub fn edge_count(&self) -> usize {
        self.live_edges().count()
    }

    /// POINT rows owned by live edges.
    pub fn point_count(&self) -> usize {
        self.live_edges().map(|e| self.count_of(e)).sum()
    }

    pub fn node_coord(&self, n: usize) -> Result<[f64; 3], GraphError> {
        self.check_live(Domain::Vertex, n)?;
        Ok(self.node_rows()[n])
    }

    /// Endpoints and POINT slot range of a live edge.
    pub fn edge(&self, e: usize) -> Result<EdgeRecord, GraphError> {
        self.check_live(Domain::Edge, e)?;
        let [a, b] = self.conn_rows()[e];
        let start = self.point_start[e];
        Ok(EdgeRecord {
            start: to_index(a),
            end: to_index(b),
            points: start..start + self.count_of(e),
        })
    }

    /// Polyline of a live edge.
    pub fn edge_points(&self, e: usize) -> Result<&[[f64; 3]], GraphError> {
        let r = self.edge(e)?.points;
        Ok(&self.point_rows()[r])
    }

    fn check_live(&self, domain: Domain, i: usize) -> Result<(), GraphError> {
        if !self.is_live(domain, i) {
            return Err(GraphError::IndexOutOfRange {
                domain,
                index: i,
                len: self.used[domain.slot()],
            });
        }
        Ok(())
    }

    fn count_of(&self, e: usize) -> usize {
        self.ints(names::NUM_EDGE_POINTS)
            .get(e)
            .map_or(0, |&c| c.max(0) as usize)
    }

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

    fn node_rows(&self) -> &[[f64; 3]] {
        bytemuck::cast_slice(self.floats(names::VERTEX_COORDINATES))
    }

    fn point_rows(&self) -> &[[f64; 3]] {
        bytemuck::cast_slice(self.floats(names::EDGE_POINT_COORDINATES))
    }

    fn conn_rows(&self) -> &[[i64; 2]] {
        bytemuck::cast_slice(self.ints(names::EDGE_CONNECTIVITY))
    }

    fn write<T: FieldScalar>(&mut self, name: &str, row: usize, values: &[T]) {
        if let Some(f) = self.store.field_mut(name) {
            let arity = f.arity();
            if let Some(v) = T::view_mut(f.data_mut()) {
                v[row * arity..(row + 1) * arity].copy_from_slice(values);
            }
        }
    }

    // ---- insertion ------------------------------------------------------

    /// Stage a new node; returns its handle.
    ///
    /// VERTEX attributes not supplied in `attrs` take the value of the first
    /// live node, except `NodeLabel`, which gets a fresh label.
    pub fn add_node(&mut self, coord: [f64; 3], attrs: &Attributes) -> Result<usize, GraphError> {
        self.check_attrs(attrs, &[Domain::Vertex], 1)?;
        let slot = self.reserve(Domain::Vertex, 1).start;
        self.write(names::VERTEX_COORDINATES, slot, &coord);
        self.fill_rows(Domain::Vertex, slot..slot + 1, attrs, None)?;
        Ok(slot)
    }

    /// Stage a new edge between two live nodes; returns its handle.
    ///
    /// Without `points` the polyline is the straight two-sample segment
    /// between the nodes. EDGE and POINT attributes not in `attrs` take the
    /// first live row's value, except label fields, which get fresh labels.
    ///
    /// # Errors
    /// `IndexOutOfRange` for a dead node, `InvalidTopology` for fewer than two
    /// samples or polyline ends away from the nodes.
    pub fn add_edge(
        &mut self,
        start: usize,
        end: usize,
        attrs: &Attributes,
        points: Option<&[[f64; 3]]>,
    ) -> Result<usize, GraphError> {
        let a = self.node_coord(start)?;
        let b = self.node_coord(end)?;
        let default = [a, b];
        let points = points.unwrap_or(&default[..]);
        self.check_polyline(points, a, b)?;
        self.check_attrs(attrs, &[Domain::Edge, Domain::Point], points.len())?;

        let e = self.reserve(Domain::Edge, 1).start;
        self.write(names::EDGE_CONNECTIVITY, e, &[start as i64, end as i64]);
        self.fill_rows(Domain::Edge, e..e + 1, attrs, None)?;
        let edge_label = self.fresh_label_if_point_field(LabelKind::Edge, attrs);
        self.stage_points(e, points, attrs, edge_label)?;
        Ok(e)
    }

    /// Replace the polyline of a live edge with new samples; returns the
    /// POINT slots used. The old samples are released.
    ///
    /// POINT attributes not in `attrs` keep the edge's first old sample value
    /// (label fields get fresh labels).
    pub fn add_edge_points(
        &mut self,
        edge: usize,
        points: &[[f64; 3]],
        attrs: &Attributes,
    ) -> Result<Range<usize>, GraphError> {
        let rec = self.edge(edge)?;
        let (a, b) = (self.node_rows()[rec.start], self.node_rows()[rec.end]);
        self.check_polyline(points, a, b)?;
        self.check_attrs(attrs, &[Domain::Point], points.len())?;

        let template = (!rec.points.is_empty()).then_some(rec.points.start);
        let edge_label = self.point_label_value(LabelKind::Edge, template);
        for p in rec.points {
            self.allocated[Domain::Point.slot()][p] = false;
        }
        self.stage_points_from(edge, points, attrs, edge_label, template)
    }

    fn stage_points(
        &mut self,
        edge: usize,
        points: &[[f64; 3]],
        attrs: &Attributes,
        edge_label: Option<i64>,
    ) -> Result<Range<usize>, GraphError> {
        self.stage_points_from(edge, points, attrs, edge_label, None)
    }

    /// Write `points` into fresh POINT slots owned by `edge`.
    fn stage_points_from(
        &mut self,
        edge: usize,
        points: &[[f64; 3]],
        attrs: &Attributes,
        edge_label: Option<i64>,
        template: Option<usize>,
    ) -> Result<Range<usize>, GraphError> {
        let slots = self.reserve(Domain::Point, points.len());
        for (k, p) in points.iter().enumerate() {
            self.write(names::EDGE_POINT_COORDINATES, slots.start + k, p);
        }
        self.fill_rows(Domain::Point, slots.clone(), attrs, template)?;
        if let (Some(label), Some(f)) = (edge_label, self.store.field(names::EDGE_LABEL)) {
            if f.domain() == Domain::Point {
                for s in slots.clone() {
                    self.write_label(names::EDGE_LABEL, s, label);
                }
            }
        }
        self.point_start[edge] = slots.start;
        self.write(names::NUM_EDGE_POINTS, edge, &[points.len() as i64]);
        Ok(slots)
    }

    fn check_polyline(&self, points: &[[f64; 3]], a: [f64; 3], b: [f64; 3]) -> Result<(), GraphError> {
        let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
            return Err(GraphError::InvalidTopology("edge needs at least 2 points".into()));
        };
        if points.len() < 2 {
            return Err(GraphError::InvalidTopology("edge needs at least 2 points".into()));
        }
        let tol = self.config.endpoint_tolerance;
        if !geometry::approx_eq(first, a, tol) || !geometry::approx_eq(last, b, tol) {
            return Err(GraphError::InvalidTopology(
                "polyline ends do not coincide with the edge's nodes".into(),
            ));
        }
        Ok(())
    }

    /// Supplied attributes must name existing non-standard fields of the
    /// given domains, match their type and hold one row or `rows` rows for
    /// POINT fields.
    fn check_attrs(&self, attrs: &Attributes, domains: &[Domain], rows: usize) -> Result<(), GraphError> {
        for (name, data) in attrs.iter() {
            let f = self
                .store
                .field(name)
                .filter(|f| domains.contains(&f.domain()) && !names::is_standard(name))
                .ok_or_else(|| GraphError::FieldNotFound(name.to_owned()))?;
            if f.scalar_type() != data.scalar_type() {
                return Err(GraphError::FieldTypeMismatch {
                    name: name.to_owned(),
                    expected: f.scalar_type(),
                    found: data.scalar_type(),
                });
            }
            let n = data.len() / f.arity();
            let ok_rows = n == 1 || (f.domain() == Domain::Point && n == rows);
            if data.len() % f.arity() != 0 || !ok_rows {
                return Err(GraphError::ShapeMismatch {
                    name: name.to_owned(),
                    domain: f.domain(),
                    expected: if f.domain() == Domain::Point { rows } else { 1 },
                    found: n,
                });
            }
        }
        Ok(())
    }

    /// Fill attribute rows `slots` of `domain` from `attrs`, a template row,
    /// or the first live row. Label fields get fresh labels.
    fn fill_rows(
        &mut self,
        domain: Domain,
        slots: Range<usize>,
        attrs: &Attributes,
        template: Option<usize>,
    ) -> Result<(), GraphError> {
        let template = template.or_else(|| {
            live(&self.allocated[domain.slot()]).find(|s| !slots.contains(s))
        });
        let targets: Vec<(String, usize)> = self
            .store
            .fields_in(domain)
            .filter(|f| !names::is_standard(f.name()))
            .map(|f| (f.name().to_owned(), f.arity()))
            .collect();

        for (name, arity) in targets {
            let label = LabelKind::from_field_name(&name).filter(|k| match k {
                LabelKind::Node => domain == Domain::Vertex,
                LabelKind::Edge => domain == Domain::Edge,
                LabelKind::Point => domain == Domain::Point,
            });
            if let Some(src) = attrs.get(&name) {
                let per_row = src.len() / arity > 1;
                let f = self.field_mut(&name)?;
                let expected = f.scalar_type();
                for (k, slot) in slots.clone().enumerate() {
                    f.data_mut()
                        .copy_row_from(arity, slot, src, if per_row { k } else { 0 })
                        .map_err(|found| type_mismatch(&name, expected, found))?;
                }
            } else if let Some(kind) = label {
                for slot in slots.clone() {
                    let fresh = self.fresh_label(kind);
                    self.write_label(&name, slot, fresh);
                }
            } else if let Some(t) = template {
                let f = self.field_mut(&name)?;
                let row = f.data().slice_rows(arity, t, t + 1);
                for slot in slots.clone() {
                    f.data_mut()
                        .copy_row_from(arity, slot, &row, 0)
                        .map_err(|found| type_mismatch(&name, row.scalar_type(), found))?;
                }
            }
        }
        Ok(())
    }

    fn field_mut(&mut self, name: &str) -> Result<&mut Field, GraphError> {
        self.store
            .field_mut(name)
            .ok_or_else(|| GraphError::FieldNotFound(name.to_owned()))
    }

    fn write_label(&mut self, name: &str, slot: usize, label: i64) {
        if let Some(f) = self.store.field_mut(name) {
            match f.data_mut() {
                FieldData::Int(v) => v[slot] = label,
                FieldData::Float(v) => v[slot] = label as f64,
                FieldData::Bool(_) => {}
            }
        }
    }

    /// Fresh label checked against the live rows of the label field.
    fn fresh_label(&mut self, kind: LabelKind) -> i64 {
        let existing = self.store.field(kind.field_name()).map(|f| {
            let mask = &self.allocated[f.domain().slot()];
            f.data().filter_rows(f.arity(), mask)
        });
        self.labels.next(kind, existing.as_ref())
    }

    /// Fresh label for a label field stored per POINT, unless supplied.
    fn fresh_label_if_point_field(&mut self, kind: LabelKind, attrs: &Attributes) -> Option<i64> {
        let f = self.store.field(kind.field_name())?;
        if f.domain() != Domain::Point || attrs.get(kind.field_name()).is_some() {
            return None;
        }
        Some(self.fresh_label(kind))
    }

    /// Current per-point label value at `slot`, if that label field is
    /// stored per POINT.
    fn point_label_value(&self, kind: LabelKind, slot: Option<usize>) -> Option<i64> {
        let f = self.store.field(kind.field_name())?;
        if f.domain() != Domain::Point {
            return None;
        }
        f.data().get_i64(slot?)
    }

    // ---- removal --------------------------------------------------------

    /// Remove live nodes and every live edge incident to them.
    pub fn remove_nodes(&mut self, nodes: &[usize]) -> Result<(), GraphError> {
        for &n in nodes {
            self.check_live(Domain::Vertex, n)?;
        }
        let mut doomed = vec![false; self.capacity(Domain::Vertex)];
        for &n in nodes {
            doomed[n] = true;
            self.allocated[Domain::Vertex.slot()][n] = false;
        }
        let incident: Vec<usize> = self
            .live_edges()
            .filter(|&e| {
                let [a, b] = self.conn_rows()[e];
                let gone = |v: i64| doomed.get(to_index(v)).copied().unwrap_or(false);
                gone(a) || gone(b)
            })
            .collect();
        self.release_edges(&incident);
        log::trace!(
            "EditBuffer: removed {} nodes, {} edges",
            nodes.len(),
            incident.len()
        );
        Ok(())
    }

    /// Remove live edges and their samples. Nodes are kept.
    pub fn remove_edges(&mut self, edges: &[usize]) -> Result<(), GraphError> {
        for &e in edges {
            self.check_live(Domain::Edge, e)?;
        }
        self.release_edges(edges);
        Ok(())
    }

    fn release_edges(&mut self, edges: &[usize]) {
        for &e in edges {
            let start = self.point_start[e];
            for p in start..start + self.count_of(e) {
                self.allocated[Domain::Point.slot()][p] = false;
            }
            self.allocated[Domain::Edge.slot()][e] = false;
        }
    }

    // ---- structural edits -----------------------------------------------

    /// Split a live edge at arc-length fraction `fraction` in (0, 1).
    ///
    /// The edge keeps its handle for the first half; the second half and the
    /// new node get new handles. If the split position coincides with an
    /// interior sample, that sample becomes the node. POINT attributes are
    /// split with the seam row duplicated from the preceding sample; the new
    /// node copies the start node's attributes. `NodeLabel` and the second
    /// half's `EdgeLabel` are fresh.
    pub fn insert_node_in_edge(&mut self, edge: usize, fraction: f64) -> Result<SplitOutcome, GraphError> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(GraphError::InvalidTopology(format!(
                "split fraction {fraction} outside (0, 1)"
            )));
        }
        let rec = self.edge(edge)?;
        let pts: Vec<[f64; 3]> = self.point_rows()[rec.points.clone()].to_vec();
        let cum = geometry::cumulative_length(&pts);
        let total = cum.last().copied().unwrap_or(0.0);
        if !(total > 0.0) {
            return Err(GraphError::InvalidTopology(format!("edge {edge} has zero length")));
        }

        let tol = self.config.endpoint_tolerance;
        let s = fraction * total;
        let (i, t) = geometry::locate(&cum, s);
        let n = pts.len();
        // Interior sample hit: split there without a new sample.
        let hit = (1..n - 1).find(|&k| (cum[k] - s).abs() <= tol);
        let (head, tail, node_xyz, seam_src) = match hit {
            Some(k) => (k + 1, k, pts[k], k),
            None => (i + 1, i + 1, geometry::lerp(pts[i], pts[i + 1], t), i),
        };
        // first half: pts[..head] (+ node), second: (node +) pts[tail..]
        let mut first: Vec<[f64; 3]> = pts[..head].to_vec();
        let mut second: Vec<[f64; 3]> = pts[tail..].to_vec();
        if hit.is_none() {
            first.push(node_xyz);
            second.insert(0, node_xyz);
        }
        let first_rows: Vec<usize> = (0..head)
            .chain(hit.is_none().then_some(seam_src))
            .map(|k| rec.points.start + k)
            .collect();
        let second_rows: Vec<usize> = hit
            .is_none()
            .then_some(seam_src)
            .into_iter()
            .chain(tail..n)
            .map(|k| rec.points.start + k)
            .collect();

        // new node, attributes copied from the start node
        let node = self.reserve(Domain::Vertex, 1).start;
        self.write(names::VERTEX_COORDINATES, node, &node_xyz);
        self.copy_rows(Domain::Vertex, &[rec.start], node)?;
        if self.store.field(names::NODE_LABEL).is_some_and(|f| f.domain() == Domain::Vertex) {
            let fresh = self.fresh_label(LabelKind::Node);
            self.write_label(names::NODE_LABEL, node, fresh);
        }

        // second half as a new edge
        let second_edge = self.reserve(Domain::Edge, 1).start;
        self.copy_rows(Domain::Edge, &[edge], second_edge)?;
        self.write(names::EDGE_CONNECTIVITY, second_edge, &[node as i64, rec.end as i64]);
        let fresh_edge_label = self
            .store
            .field(names::EDGE_LABEL)
            .is_some()
            .then(|| self.fresh_label(LabelKind::Edge));
        let second_slots = self.reserve(Domain::Point, second.len());
        self.copy_rows(Domain::Point, &second_rows, second_slots.start)?;
        for (k, p) in second.iter().enumerate() {
            self.write(names::EDGE_POINT_COORDINATES, second_slots.start + k, p);
        }
        if let (Some(label), Some(domain)) = (
            fresh_edge_label,
            self.store.field(names::EDGE_LABEL).map(Field::domain),
        ) {
            match domain {
                Domain::Point => second_slots
                    .clone()
                    .for_each(|s| self.write_label(names::EDGE_LABEL, s, label)),
                Domain::Edge => self.write_label(names::EDGE_LABEL, second_edge, label),
                Domain::Vertex => {}
            }
        }
        self.point_start[second_edge] = second_slots.start;
        self.write(names::NUM_EDGE_POINTS, second_edge, &[second.len() as i64]);

        // first half keeps the original handle
        let first_slots = self.reserve(Domain::Point, first.len());
        self.copy_rows(Domain::Point, &first_rows, first_slots.start)?;
        for (k, p) in first.iter().enumerate() {
            self.write(names::EDGE_POINT_COORDINATES, first_slots.start + k, p);
        }
        for p in rec.points.clone() {
            self.allocated[Domain::Point.slot()][p] = false;
        }
        self.point_start[edge] = first_slots.start;
        self.write(names::NUM_EDGE_POINTS, edge, &[first.len() as i64]);
        self.write(names::EDGE_CONNECTIVITY, edge, &[rec.start as i64, node as i64]);

        Ok(SplitOutcome {
            node,
            first_edge: edge,
            second_edge,
        })
    }

    /// Copy all non-standard attribute rows `src` of `domain` into
    /// consecutive slots starting at `dst`.
    fn copy_rows(&mut self, domain: Domain, src: &[usize], dst: usize) -> Result<(), GraphError> {
        for f in self.store.fields_mut() {
            if f.domain() != domain || names::is_standard(f.name()) {
                continue;
            }
            let arity = f.arity();
            let rows = f.data().take_rows(arity, src);
            let name = f.name().to_owned();
            for k in 0..src.len() {
                f.data_mut()
                    .copy_row_from(arity, dst + k, &rows, k)
                    .map_err(|found| type_mismatch(&name, rows.scalar_type(), found))?;
            }
        }
        Ok(())
    }

    /// Join a chain of live edges into one new edge from `start` to `end`.
    ///
    /// `path` lists `(edge, forward)` in walking order; `forward` is false
    /// when the edge is stored end-to-start. Polylines and POINT attributes
    /// are concatenated with each shared seam sample kept once. EDGE
    /// attributes come from the first edge; a per-point `EdgeLabel` is fresh.
    /// The chain edges are released; interior nodes are left for the caller.
    pub(crate) fn splice_chain(
        &mut self,
        start: usize,
        end: usize,
        path: &[(usize, bool)],
    ) -> Result<usize, GraphError> {
        let Some(&(first_edge, _)) = path.first() else {
            return Err(GraphError::InvalidTopology("empty chain".into()));
        };
        self.check_live(Domain::Vertex, start)?;
        self.check_live(Domain::Vertex, end)?;
        let mut rows: Vec<usize> = Vec::new();
        for (k, &(e, forward)) in path.iter().enumerate() {
            let r = self.edge(e)?.points;
            let mut seq: Vec<usize> = r.collect();
            if !forward {
                seq.reverse();
            }
            let skip = usize::from(k > 0);
            rows.extend(seq.into_iter().skip(skip));
        }
        if rows.len() < 2 {
            return Err(GraphError::InvalidTopology("chain polyline too short".into()));
        }

        let e = self.reserve(Domain::Edge, 1).start;
        self.copy_rows(Domain::Edge, &[first_edge], e)?;
        self.write(names::EDGE_CONNECTIVITY, e, &[start as i64, end as i64]);

        let slots = self.reserve(Domain::Point, rows.len());
        let coords: Vec<[f64; 3]> = rows.iter().map(|&r| self.point_rows()[r]).collect();
        for (k, p) in coords.iter().enumerate() {
            self.write(names::EDGE_POINT_COORDINATES, slots.start + k, p);
        }
        self.copy_rows(Domain::Point, &rows, slots.start)?;
        if self.store.field(names::EDGE_LABEL).is_some_and(|f| f.domain() == Domain::Point) {
            let label = self.fresh_label(LabelKind::Edge);
            for s in slots.clone() {
                self.write_label(names::EDGE_LABEL, s, label);
            }
        }
        self.point_start[e] = slots.start;
        self.write(names::NUM_EDGE_POINTS, e, &[rows.len() as i64]);

        let chain: Vec<usize> = path.iter().map(|&(e, _)| e).collect();
        self.release_edges(&chain);
        Ok(e)
    }

    // ---- flush ----------------------------------------------------------

    /// Compact live rows into a new graph. Consumes the buffer.
    pub fn flush(self) -> Result<SpatialGraph, GraphError> {
        let nodes: Vec<usize> = self.live_nodes().collect();
        let edges: Vec<usize> = self.live_edges().collect();
        let mut lookup = vec![None; self.capacity(Domain::Vertex)];
        for (new, &old) in nodes.iter().enumerate() {
            lookup[old] = Some(new as i64);
        }

        let mut points = Vec::with_capacity(self.point_count());
        let mut conn = Vec::with_capacity(edges.len() * 2);
        for &e in &edges {
            let start = self.point_start[e];
            points.extend(start..start + self.count_of(e));
            for v in self.conn_rows()[e] {
                let mapped = lookup.get(to_index(v)).copied().flatten().ok_or_else(|| {
                    GraphError::InvalidTopology(format!("staged edge {e} references removed node {v}"))
                })?;
                conn.push(mapped);
            }
        }

        let mut store = self.store.gather([&nodes, &edges, &points]);
        store.set_field(names::EDGE_CONNECTIVITY, FieldData::Int(conn))?;
        let g = SpatialGraph::from_store_with_labels(store, self.labels);
        log::debug!(
            "EditBuffer flushed: {} nodes, {} edges, {} points",
            g.node_count(),
            g.edge_count(),
            g.point_count()
        );
        g.check_structure()?;
        Ok(g)
    }

    /// Live row counts per domain.
    pub fn sizes(&self) -> DomainSizes {
        DomainSizes::new(self.node_count(), self.edge_count(), self.point_count())
    }
}

impl DebugInvariants for EditBuffer {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "EditBuffer");
    }

    fn validate_invariants(&self) -> Result<(), GraphError> {
        // point totals only hold after compaction
        if let Some(v) = self
            .store
            .validate()
            .into_iter()
            .find(|v| !matches!(v, StoreViolation::PointTotal { .. }))
        {
            return Err(v.into());
        }
        for e in self.live_edges() {
            let rec = self.edge(e)?;
            if rec.point_count() < 2 {
                return Err(GraphError::InvalidTopology(format!(
                    "staged edge {e} has {} points",
                    rec.point_count()
                )));
            }
            self.check_live(Domain::Vertex, rec.start)?;
            self.check_live(Domain::Vertex, rec.end)?;
            if let Some(p) = rec.points.clone().find(|&p| !self.is_live(Domain::Point, p)) {
                return Err(GraphError::InvalidTopology(format!(
                    "staged edge {e} owns released point slot {p}"
                )));
            }
        }
        Ok(())
    }
}

fn live(mask: &[bool]) -> impl Iterator<Item = usize> + '_ {
    mask.iter().enumerate().filter(|&(_, &a)| a).map(|(i, _)| i)
}

fn type_mismatch(name: &str, expected: ScalarType, found: ScalarType) -> GraphError {
    GraphError::FieldTypeMismatch {
        name: name.to_owned(),
        expected,
        found,
    }
}
