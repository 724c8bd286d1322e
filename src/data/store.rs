//! AttributeStore: named, typed parallel arrays bound to the three domains.
//!
//! The store is the single owner of every array of a spatial graph, the
//! standard geometry/topology fields included. Domain sizes are authoritative
//! and are set independently of field contents, so multi-step updates can
//! temporarily violate shape invariants and be validated afterwards.

use crate::data::domain::{Domain, DomainSizes};
use crate::data::field::{Field, FieldData};
use crate::data::names;
use crate::debug_invariants::DebugInvariants;
use crate::graph_error::GraphError;
use hashbrown::HashSet;
use thiserror::Error;

/// A violated store invariant, as reported by [`AttributeStore::validate`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreViolation {
    /// Row count differs from the bound domain's size.
    #[error("field `{name}` ({domain}) has {found} rows, domain size is {expected}")]
    RowCount {
        /// Offending field.
        name: String,
        /// Domain the field is bound to.
        domain: Domain,
        /// Domain size.
        expected: usize,
        /// Rows the field holds.
        found: usize,
    },
    /// Flat length is not a multiple of the arity.
    #[error("field `{name}` has {len} scalars, not a multiple of arity {arity}")]
    PartialRow {
        /// Offending field.
        name: String,
        /// Flat scalar count.
        len: usize,
        /// Declared scalars per row.
        arity: usize,
    },
    /// `sum(NumEdgePoints)` disagrees with the POINT domain size.
    #[error("sum of {} is {sum}, POINT size is {points}", names::NUM_EDGE_POINTS)]
    PointTotal {
        /// Sum of the per-edge counts.
        sum: i64,
        /// POINT domain size.
        points: usize,
    },
    /// The same name is declared more than once.
    #[error("field name `{name}` declared {count} times")]
    DuplicateName {
        /// Repeated name.
        name: String,
        /// How many fields carry it.
        count: usize,
    },
}

impl From<StoreViolation> for GraphError {
    fn from(v: StoreViolation) -> Self {
        match v {
            StoreViolation::RowCount {
                name,
                domain,
                expected,
                found,
            } => GraphError::ShapeMismatch {
                name,
                domain,
                expected,
                found,
            },
            StoreViolation::DuplicateName { name, .. } => GraphError::DuplicateField(name),
            other => GraphError::InvalidTopology(other.to_string()),
        }
    }
}

/// Named parallel arrays over the VERTEX, EDGE and POINT domains.
///
/// Fields are kept in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeStore {
    sizes: DomainSizes,
    fields: Vec<Field>,
}

impl AttributeStore {
    /// Empty store with all domain sizes zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store over prepared fields, in the given order. Nothing is checked;
    /// callers validate afterwards.
    pub(crate) fn from_fields_unchecked(sizes: DomainSizes, fields: Vec<Field>) -> Self {
        Self { sizes, fields }
    }

    /// Set the authoritative size of `domain`. Field contents are not touched.
    pub fn set_domain_size(&mut self, domain: Domain, n: usize) {
        self.sizes.set(domain, n);
    }

    /// Authoritative row count of `domain`.
    #[inline]
    pub fn domain_size(&self, domain: Domain) -> usize {
        self.sizes.get(domain)
    }

    /// All three domain sizes.
    #[inline]
    pub fn domain_sizes(&self) -> DomainSizes {
        self.sizes
    }

    /// Declare a new field.
    ///
    /// # Errors
    /// `DuplicateField` if the name is taken, `ShapeMismatch` if the row count
    /// differs from the current domain size.
    pub fn add_field(&mut self, field: Field) -> Result<(), GraphError> {
        if self.position(field.name()).is_some() {
            return Err(GraphError::DuplicateField(field.name().to_owned()));
        }
        self.check_shape(&field)?;
        self.fields.push(field);
        Ok(())
    }

    /// Declare a field filled with neutral values for every existing row.
    pub fn declare_field(
        &mut self,
        name: impl Into<String>,
        domain: Domain,
        ty: crate::data::field::ScalarType,
        arity: usize,
    ) -> Result<(), GraphError> {
        let arity = arity.max(1);
        let data = FieldData::filled(ty, self.domain_size(domain) * arity);
        self.add_field(Field::new(name, domain, arity, data))
    }

    /// Replace the backing array of `name`.
    ///
    /// # Errors
    /// `FieldNotFound`, `FieldTypeMismatch`, or `ShapeMismatch` when the new
    /// row count differs from the domain size. On error the field is unchanged.
    pub fn set_field(&mut self, name: &str, data: FieldData) -> Result<(), GraphError> {
        let idx = self.index_of(name)?;
        let field = &self.fields[idx];
        Self::check_type(field, &data)?;
        let expected = self.sizes.get(field.domain());
        let found = data.len() / field.arity();
        if data.len() % field.arity() != 0 || found != expected {
            return Err(GraphError::ShapeMismatch {
                name: name.to_owned(),
                domain: field.domain(),
                expected,
                found,
            });
        }
        self.fields[idx].replace_data(data);
        Ok(())
    }

    /// Replace the backing array of `name` without checking its shape.
    ///
    /// Used for multi-step updates; call [`validate`](Self::validate) once
    /// all arrays and sizes have been written.
    pub fn set_field_deferred(&mut self, name: &str, data: FieldData) -> Result<(), GraphError> {
        let idx = self.index_of(name)?;
        Self::check_type(&self.fields[idx], &data)?;
        self.fields[idx].replace_data(data);
        Ok(())
    }

    /// Look up a field by name.
    pub fn get_field(&self, name: &str) -> Result<&Field, GraphError> {
        self.field(name)
            .ok_or_else(|| GraphError::FieldNotFound(name.to_owned()))
    }

    /// Look up a field by name, returning `None` when absent.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.position(name).map(|i| &self.fields[i])
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.position(name).map(move |i| &mut self.fields[i])
    }

    /// Whether a field named `name` is declared.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove a field and return it.
    pub fn remove_field(&mut self, name: &str) -> Result<Field, GraphError> {
        let idx = self.index_of(name)?;
        Ok(self.fields.remove(idx))
    }

    /// Rename a field in place, keeping its declaration position.
    pub fn rename_field(&mut self, old: &str, new: &str) -> Result<(), GraphError> {
        if old == new {
            return self.index_of(old).map(|_| ());
        }
        if self.position(new).is_some() {
            return Err(GraphError::DuplicateField(new.to_owned()));
        }
        let idx = self.index_of(old)?;
        self.fields[idx].set_name(new.to_owned());
        Ok(())
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub(crate) fn fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.iter_mut()
    }

    /// Fields bound to `domain`, in declaration order.
    pub fn fields_in(&self, domain: Domain) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.domain() == domain)
    }

    /// Number of declared fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field is declared.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// New store holding the given rows of every field, per domain and in
    /// the given order (`rows[d]` indexes domain `d` in `Domain::ALL` order).
    /// Domain sizes become the row counts.
    pub(crate) fn gather(&self, rows: [&[usize]; 3]) -> AttributeStore {
        let mut sizes = DomainSizes::default();
        for d in Domain::ALL {
            sizes.set(d, rows[d.slot()].len());
        }
        let fields = self
            .fields
            .iter()
            .map(|f| {
                let data = f.data().take_rows(f.arity(), rows[f.domain().slot()]);
                Field::new(f.name(), f.domain(), f.arity(), data)
            })
            .collect();
        AttributeStore { sizes, fields }
    }

    /// Report every violated store invariant. Never fails.
    pub fn validate(&self) -> Vec<StoreViolation> {
        let mut out = Vec::new();

        let mut seen = HashSet::new();
        for f in &self.fields {
            if !seen.insert(f.name()) {
                let count = self.fields.iter().filter(|g| g.name() == f.name()).count();
                if !out.iter().any(
                    |v| matches!(v, StoreViolation::DuplicateName { name, .. } if name == f.name()),
                ) {
                    out.push(StoreViolation::DuplicateName {
                        name: f.name().to_owned(),
                        count,
                    });
                }
            }
        }

        for f in &self.fields {
            if f.has_partial_row() {
                out.push(StoreViolation::PartialRow {
                    name: f.name().to_owned(),
                    len: f.data().len(),
                    arity: f.arity(),
                });
                continue;
            }
            let expected = self.sizes.get(f.domain());
            if f.rows() != expected {
                out.push(StoreViolation::RowCount {
                    name: f.name().to_owned(),
                    domain: f.domain(),
                    expected,
                    found: f.rows(),
                });
            }
        }

        if let Some(f) = self.field(names::NUM_EDGE_POINTS) {
            let sum: i64 = (0..f.data().len())
                .filter_map(|i| f.data().get_i64(i))
                .sum();
            if sum != self.sizes.point as i64 {
                out.push(StoreViolation::PointTotal {
                    sum,
                    points: self.sizes.point,
                });
            }
        }
        out
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    fn index_of(&self, name: &str) -> Result<usize, GraphError> {
        self.position(name)
            .ok_or_else(|| GraphError::FieldNotFound(name.to_owned()))
    }

    fn check_type(field: &Field, data: &FieldData) -> Result<(), GraphError> {
        if field.scalar_type() != data.scalar_type() {
            return Err(GraphError::FieldTypeMismatch {
                name: field.name().to_owned(),
                expected: field.scalar_type(),
                found: data.scalar_type(),
            });
        }
        Ok(())
    }

    fn check_shape(&self, field: &Field) -> Result<(), GraphError> {
        let expected = self.sizes.get(field.domain());
        if field.has_partial_row() || field.rows() != expected {
            return Err(GraphError::ShapeMismatch {
                name: field.name().to_owned(),
                domain: field.domain(),
                expected,
                found: field.rows(),
            });
        }
        Ok(())
    }
}

impl DebugInvariants for AttributeStore {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "AttributeStore");
    }

    fn validate_invariants(&self) -> Result<(), GraphError> {
        match self.validate().into_iter().next() {
            Some(v) => Err(v.into()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::field::ScalarType;

    fn store() -> AttributeStore {
        let mut s = AttributeStore::new();
        s.set_domain_size(Domain::Edge, 2);
        s.set_domain_size(Domain::Point, 5);
        s.add_field(Field::new(
            names::NUM_EDGE_POINTS,
            Domain::Edge,
            1,
            FieldData::Int(vec![2, 3]),
        ))
        .unwrap();
        s.declare_field("Radius", Domain::Point, ScalarType::Float, 1)
            .unwrap();
        s
    }

    #[test]
    fn consistent_store_has_no_violations() {
        let s = store();
        assert!(s.validate().is_empty());
        assert!(s.validate_invariants().is_ok());
        assert_eq!(s.get_field("Radius").unwrap().rows(), 5);
    }

    #[test]
    fn set_field_rejects_wrong_length() {
        let mut s = store();
        let err = s
            .set_field("Radius", FieldData::Float(vec![1.0; 4]))
            .unwrap_err();
        assert_eq!(
            err,
            GraphError::ShapeMismatch {
                name: "Radius".into(),
                domain: Domain::Point,
                expected: 5,
                found: 4
            }
        );
        assert_eq!(s.get_field("Radius").unwrap().rows(), 5);
    }

    #[test]
    fn deferred_update_is_reported_by_validate() {
        let mut s = store();
        s.set_field_deferred("Radius", FieldData::Float(vec![1.0; 4]))
            .unwrap();
        s.set_field_deferred(names::NUM_EDGE_POINTS, FieldData::Int(vec![2, 2]))
            .unwrap();
        let v = s.validate();
        assert!(v.iter().any(|x| matches!(x, StoreViolation::RowCount { .. })));
        assert!(v.contains(&StoreViolation::PointTotal { sum: 4, points: 5 }));
        s.set_domain_size(Domain::Point, 4);
        assert!(s.validate().is_empty());
    }

    #[test]
    fn names_are_unique_and_renamable() {
        let mut s = store();
        assert_eq!(
            s.declare_field("Radius", Domain::Vertex, ScalarType::Float, 1),
            Err(GraphError::DuplicateField("Radius".into()))
        );
        s.rename_field("Radius", "thickness").unwrap();
        assert!(s.contains("thickness"));
        assert!(matches!(
            s.get_field("Radius"),
            Err(GraphError::FieldNotFound(_))
        ));
        assert!(s.remove_field("thickness").is_ok());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut s = store();
        assert!(matches!(
            s.set_field("Radius", FieldData::Int(vec![0; 5])),
            Err(GraphError::FieldTypeMismatch { .. })
        ));
    }
}
