//! Array interchange and render output.
//!
//! [`GraphArrays`] is the flat, serde-friendly form of a graph: domain sizes
//! plus every field as a typed record. File formats live outside this crate
//! and plug in through [`GraphReader`] / [`GraphWriter`], which only move
//! `GraphArrays` across a byte stream. [`RenderGeometry`] is the read-only
//! view handed to plotting collaborators.

use crate::data::domain::{Domain, DomainSizes};
use crate::data::field::{Field, FieldData, ScalarType};
use crate::data::names;
use crate::data::store::AttributeStore;
use crate::geometry;
use crate::graph::{Reduction, SpatialGraph, standard_fields};
use crate::graph_error::GraphError;
use std::io::{Read, Write};

/// One field in interchange form.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldRecord {
    pub name: String,
    pub domain: Domain,
    pub scalar_type: ScalarType,
    pub arity: usize,
    pub data: FieldData,
}

impl From<&Field> for FieldRecord {
    fn from(f: &Field) -> Self {
        Self {
            name: f.name().to_owned(),
            domain: f.domain(),
            scalar_type: f.scalar_type(),
            arity: f.arity(),
            data: f.data().clone(),
        }
    }
}

/// A whole graph as domain sizes plus field records.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GraphArrays {
    pub domain_sizes: DomainSizes,
    pub fields: Vec<FieldRecord>,
}

/// Source of [`GraphArrays`] from a byte stream.
pub trait GraphReader {
    /// Reader-specific error; must absorb graph errors.
    type Error: From<GraphError>;

    /// Parse arrays from a reader.
    fn read<R: Read>(&self, reader: R) -> Result<GraphArrays, Self::Error>;

    /// Parse and build a graph in one step.
    fn read_graph<R: Read>(&self, reader: R) -> Result<SpatialGraph, Self::Error> {
        let arrays = self.read(reader)?;
        Ok(SpatialGraph::from_arrays(arrays)?)
    }
}

/// Sink for [`GraphArrays`] into a byte stream.
pub trait GraphWriter {
    type Error: From<GraphError>;

    /// Serialize arrays to a writer.
    fn write<W: Write>(&self, writer: W, arrays: &GraphArrays) -> Result<(), Self::Error>;

    fn write_graph<W: Write>(&self, writer: W, g: &SpatialGraph) -> Result<(), Self::Error> {
        self.write(writer, &g.to_arrays())
    }
}

impl SpatialGraph {
    /// Build a graph from interchange arrays.
    ///
    /// Field order is kept. A record whose data tag disagrees with its
    /// declared scalar type is rejected, as is any field whose row count
    /// differs from its domain size.
    ///
    /// # Errors
    /// `MissingField` for an absent standard field, `ShapeMismatch` for a
    /// standard field with the wrong domain or arity or any field with the
    /// wrong row count, `FieldTypeMismatch`, `DuplicateField`, and any
    /// structural violation (point totals, endpoint ranges).
    pub fn from_arrays(arrays: GraphArrays) -> Result<Self, GraphError> {
        for (name, domain, ty, arity) in standard_fields() {
            let rec = arrays
                .fields
                .iter()
                .find(|r| r.name == name)
                .ok_or_else(|| GraphError::MissingField(name.to_owned()))?;
            if rec.domain != domain || rec.arity != arity {
                return Err(GraphError::ShapeMismatch {
                    name: name.to_owned(),
                    domain: rec.domain,
                    expected: arity,
                    found: rec.arity,
                });
            }
            if rec.scalar_type != ty {
                return Err(GraphError::FieldTypeMismatch {
                    name: name.to_owned(),
                    expected: ty,
                    found: rec.scalar_type,
                });
            }
        }

        let mut store = AttributeStore::new();
        for d in Domain::ALL {
            store.set_domain_size(d, arrays.domain_sizes.get(d));
        }
        for rec in arrays.fields {
            if rec.data.scalar_type() != rec.scalar_type {
                return Err(GraphError::FieldTypeMismatch {
                    name: rec.name,
                    expected: rec.scalar_type,
                    found: rec.data.scalar_type(),
                });
            }
            store.add_field(Field::new(rec.name, rec.domain, rec.arity, rec.data))?;
        }
        let g = SpatialGraph::from_store(store);
        g.check_structure()?;
        log::debug!(
            "ingested graph: {} nodes, {} edges, {} points, {} fields",
            g.node_count(),
            g.edge_count(),
            g.point_count(),
            g.store().len()
        );
        Ok(g)
    }

    /// Export every field, in order, with the domain sizes.
    pub fn to_arrays(&self) -> GraphArrays {
        GraphArrays {
            domain_sizes: self.domain_sizes(),
            fields: self.store().fields().map(FieldRecord::from).collect(),
        }
    }
}

/// Per-edge polylines with optional radius samples and category values,
/// ready for tube or line rendering.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderGeometry {
    pub polylines: Vec<Vec<[f64; 3]>>,
    /// One radius per polyline sample. Diameter fields are halved.
    pub radii: Option<Vec<Vec<f64>>>,
    /// One value per edge, POINT fields averaged.
    pub categories: Option<Vec<f64>>,
}

impl RenderGeometry {
    /// Collect render data. The radius field is resolved with
    /// [`SpatialGraph::radius_field`]; EDGE radii are repeated along the
    /// polyline and VERTEX radii are blended from the start node's value to
    /// the end node's by arc length.
    ///
    /// # Errors
    /// `FieldNotFound` if `category` names an absent field; structural errors
    /// for an inconsistent graph.
    pub fn from_graph(g: &SpatialGraph, category: Option<&str>) -> Result<Self, GraphError> {
        g.check_structure()?;
        let edges = g.edges();
        let pts = g.point_coords();
        let polylines: Vec<Vec<[f64; 3]>> =
            edges.iter().map(|rec| pts[rec.points.clone()].to_vec()).collect();

        let radii = g.radius_field().map(|f| {
            let k = if f.name().to_ascii_lowercase().contains("diameter") {
                0.5
            } else {
                1.0
            };
            let v = f.data().to_f64_vec();
            let at = |i: usize| v.get(i).copied().unwrap_or(0.0) * k;
            edges
                .iter()
                .enumerate()
                .map(|(e, rec)| match f.domain() {
                    Domain::Point => rec.points.clone().map(at).collect(),
                    Domain::Edge => vec![at(e); rec.point_count()],
                    Domain::Vertex => {
                        let (r0, r1) = (at(rec.start), at(rec.end));
                        let cum = geometry::cumulative_length(&polylines[e]);
                        let len = cum.last().copied().unwrap_or(0.0);
                        cum.iter()
                            .map(|&s| {
                                let t = if len > 0.0 { s / len } else { 0.0 };
                                geometry::lerp_scalar(r0, r1, t)
                            })
                            .collect()
                    }
                })
                .collect()
        });

        let categories = category
            .map(|name| g.edge_values(name, Reduction::Mean))
            .transpose()?;
        Ok(Self {
            polylines,
            radii,
            categories,
        })
    }

    /// Category values from the standard `VesselType` field, when present.
    pub fn with_vessel_type(g: &SpatialGraph) -> Result<Self, GraphError> {
        let name = g.field(names::VESSEL_TYPE).map(|_| names::VESSEL_TYPE);
        Self::from_graph(g, name)
    }
}
