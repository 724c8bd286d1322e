//! Typed, named attribute arrays.
//!
//! A [`Field`] is a flat buffer of scalars bound to a [`Domain`]; each row of
//! the domain owns `arity` consecutive scalars. The scalar type is carried by
//! the [`FieldData`] tag so fields of different element types can live in one
//! store.

use crate::data::domain::Domain;
use crate::graph_error::GraphError;
use std::fmt;

/// Scalar type tag for field data.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ScalarType {
    /// 64-bit float.
    Float,
    /// 64-bit signed integer.
    Int,
    /// Boolean flag.
    Bool,
}

impl ScalarType {
    /// Returns a stable string label for the scalar type.
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::Float => "float",
            ScalarType::Int => "int",
            ScalarType::Bool => "bool",
        }
    }

    /// Parse a scalar type from a string label.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "float" | "double" | "f32" | "f64" => Some(ScalarType::Float),
            "int" | "i32" | "i64" => Some(ScalarType::Int),
            "bool" | "byte" => Some(ScalarType::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged flat buffer backing a field.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum FieldData {
    /// Float scalars, row-major.
    Float(Vec<f64>),
    /// Integer scalars, row-major.
    Int(Vec<i64>),
    /// Boolean scalars, row-major.
    Bool(Vec<bool>),
}

impl FieldData {
    /// Scalar type tag for this buffer.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            FieldData::Float(_) => ScalarType::Float,
            FieldData::Int(_) => ScalarType::Int,
            FieldData::Bool(_) => ScalarType::Bool,
        }
    }

    /// Empty buffer of the given type.
    pub fn empty(ty: ScalarType) -> Self {
        Self::filled(ty, 0)
    }

    /// Buffer of `len` scalars holding the neutral value of `ty`
    /// (`0.0`, `0`, `false`).
    pub fn filled(ty: ScalarType, len: usize) -> Self {
        match ty {
            ScalarType::Float => FieldData::Float(vec![0.0; len]),
            ScalarType::Int => FieldData::Int(vec![0; len]),
            ScalarType::Bool => FieldData::Bool(vec![false; len]),
        }
    }

    /// Length of the underlying flat buffer (scalars, not rows).
    pub fn len(&self) -> usize {
        match self {
            FieldData::Float(v) => v.len(),
            FieldData::Int(v) => v.len(),
            FieldData::Bool(v) => v.len(),
        }
    }

    /// Return true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read scalar `i` widened to `f64` (`true` → 1.0).
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        match self {
            FieldData::Float(v) => v.get(i).copied(),
            FieldData::Int(v) => v.get(i).map(|&x| x as f64),
            FieldData::Bool(v) => v.get(i).map(|&x| if x { 1.0 } else { 0.0 }),
        }
    }

    /// Read scalar `i` converted to `i64` (floats are rounded).
    pub fn get_i64(&self, i: usize) -> Option<i64> {
        match self {
            FieldData::Float(v) => v.get(i).map(|&x| x.round() as i64),
            FieldData::Int(v) => v.get(i).copied(),
            FieldData::Bool(v) => v.get(i).map(|&x| i64::from(x)),
        }
    }

    /// Whole buffer widened to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        (0..self.len()).filter_map(|i| self.get_f64(i)).collect()
    }

    /// Rows `[start, end)` (in units of `arity`) copied into a new buffer.
    pub fn slice_rows(&self, arity: usize, start: usize, end: usize) -> FieldData {
        let (a, b) = (start * arity, end * arity);
        match self {
            FieldData::Float(v) => FieldData::Float(v[a..b].to_vec()),
            FieldData::Int(v) => FieldData::Int(v[a..b].to_vec()),
            FieldData::Bool(v) => FieldData::Bool(v[a..b].to_vec()),
        }
    }

    /// Keep only the rows whose `keep` flag is set.
    pub fn filter_rows(&self, arity: usize, keep: &[bool]) -> FieldData {
        fn go<T: Copy>(v: &[T], arity: usize, keep: &[bool]) -> Vec<T> {
            v.chunks_exact(arity.max(1))
                .zip(keep)
                .filter(|(_, k)| **k)
                .flat_map(|(row, _)| row.iter().copied())
                .collect()
        }
        match self {
            FieldData::Float(v) => FieldData::Float(go(v, arity, keep)),
            FieldData::Int(v) => FieldData::Int(go(v, arity, keep)),
            FieldData::Bool(v) => FieldData::Bool(go(v, arity, keep)),
        }
    }

    /// Gather rows by index, in the given order.
    pub fn take_rows(&self, arity: usize, rows: &[usize]) -> FieldData {
        fn go<T: Copy>(v: &[T], arity: usize, rows: &[usize]) -> Vec<T> {
            let mut out = Vec::with_capacity(rows.len() * arity);
            for &r in rows {
                out.extend_from_slice(&v[r * arity..(r + 1) * arity]);
            }
            out
        }
        match self {
            FieldData::Float(v) => FieldData::Float(go(v, arity, rows)),
            FieldData::Int(v) => FieldData::Int(go(v, arity, rows)),
            FieldData::Bool(v) => FieldData::Bool(go(v, arity, rows)),
        }
    }

    /// Append `other` to `self`. Both buffers must hold the same scalar type.
    pub fn append(&mut self, other: &FieldData) -> Result<(), ScalarType> {
        match (self, other) {
            (FieldData::Float(a), FieldData::Float(b)) => a.extend_from_slice(b),
            (FieldData::Int(a), FieldData::Int(b)) => a.extend_from_slice(b),
            (FieldData::Bool(a), FieldData::Bool(b)) => a.extend_from_slice(b),
            (_, other) => return Err(other.scalar_type()),
        }
        Ok(())
    }

    /// Append `n` neutral scalars.
    pub fn extend_neutral(&mut self, n: usize) {
        match self {
            FieldData::Float(v) => v.resize(v.len() + n, 0.0),
            FieldData::Int(v) => v.resize(v.len() + n, 0),
            FieldData::Bool(v) => v.resize(v.len() + n, false),
        }
    }

    /// Copy the row `src_row` of `src` over row `dst_row` of `self`.
    /// Types must match; a mismatch is reported as the offending type.
    pub fn copy_row_from(
        &mut self,
        arity: usize,
        dst_row: usize,
        src: &FieldData,
        src_row: usize,
    ) -> Result<(), ScalarType> {
        let (d, s) = (dst_row * arity, src_row * arity);
        match (self, src) {
            (FieldData::Float(a), FieldData::Float(b)) => {
                a[d..d + arity].copy_from_slice(&b[s..s + arity])
            }
            (FieldData::Int(a), FieldData::Int(b)) => {
                a[d..d + arity].copy_from_slice(&b[s..s + arity])
            }
            (FieldData::Bool(a), FieldData::Bool(b)) => {
                a[d..d + arity].copy_from_slice(&b[s..s + arity])
            }
            (_, other) => return Err(other.scalar_type()),
        }
        Ok(())
    }

    /// Reverse the order of rows, keeping each row's scalars intact.
    pub fn reverse_rows(&mut self, arity: usize) {
        fn go<T: Copy>(v: &mut Vec<T>, arity: usize) {
            let rows: Vec<T> = v.chunks_exact(arity.max(1)).rev().flatten().copied().collect();
            *v = rows;
        }
        match self {
            FieldData::Float(v) => go(v, arity),
            FieldData::Int(v) => go(v, arity),
            FieldData::Bool(v) => go(v, arity),
        }
    }
}

impl From<f64> for FieldData {
    fn from(v: f64) -> Self {
        FieldData::Float(vec![v])
    }
}

impl From<i64> for FieldData {
    fn from(v: i64) -> Self {
        FieldData::Int(vec![v])
    }
}

impl From<bool> for FieldData {
    fn from(v: bool) -> Self {
        FieldData::Bool(vec![v])
    }
}

impl From<Vec<f64>> for FieldData {
    fn from(v: Vec<f64>) -> Self {
        FieldData::Float(v)
    }
}

impl From<Vec<i64>> for FieldData {
    fn from(v: Vec<i64>) -> Self {
        FieldData::Int(v)
    }
}

impl From<Vec<bool>> for FieldData {
    fn from(v: Vec<bool>) -> Self {
        FieldData::Bool(v)
    }
}

/// Trait to map scalar types to tagged buffers for typed accessors.
pub trait FieldScalar: Copy + Sized + 'static {
    /// Scalar type tag for this concrete type.
    const SCALAR_TYPE: ScalarType;

    /// Wrap a typed buffer into a tagged container.
    fn wrap(data: Vec<Self>) -> FieldData;
    /// Borrow a typed buffer if the tag matches.
    fn view(data: &FieldData) -> Option<&[Self]>;
    /// Mutably borrow a typed buffer if the tag matches.
    fn view_mut(data: &mut FieldData) -> Option<&mut Vec<Self>>;
}

impl FieldScalar for f64 {
    const SCALAR_TYPE: ScalarType = ScalarType::Float;

    fn wrap(data: Vec<Self>) -> FieldData {
        FieldData::Float(data)
    }

    fn view(data: &FieldData) -> Option<&[Self]> {
        if let FieldData::Float(v) = data {
            Some(v)
        } else {
            None
        }
    }

    fn view_mut(data: &mut FieldData) -> Option<&mut Vec<Self>> {
        if let FieldData::Float(v) = data {
            Some(v)
        } else {
            None
        }
    }
}

impl FieldScalar for i64 {
    const SCALAR_TYPE: ScalarType = ScalarType::Int;

    fn wrap(data: Vec<Self>) -> FieldData {
        FieldData::Int(data)
    }

    fn view(data: &FieldData) -> Option<&[Self]> {
        if let FieldData::Int(v) = data {
            Some(v)
        } else {
            None
        }
    }

    fn view_mut(data: &mut FieldData) -> Option<&mut Vec<Self>> {
        if let FieldData::Int(v) = data {
            Some(v)
        } else {
            None
        }
    }
}

impl FieldScalar for bool {
    const SCALAR_TYPE: ScalarType = ScalarType::Bool;

    fn wrap(data: Vec<Self>) -> FieldData {
        FieldData::Bool(data)
    }

    fn view(data: &FieldData) -> Option<&[Self]> {
        if let FieldData::Bool(v) = data {
            Some(v)
        } else {
            None
        }
    }

    fn view_mut(data: &mut FieldData) -> Option<&mut Vec<Self>> {
        if let FieldData::Bool(v) = data {
            Some(v)
        } else {
            None
        }
    }
}

/// A named array bound to a domain.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Field {
    name: String,
    domain: Domain,
    arity: usize,
    data: FieldData,
}

impl Field {
    /// Create a field. `arity` is clamped to at least 1.
    pub fn new(name: impl Into<String>, domain: Domain, arity: usize, data: FieldData) -> Self {
        Self {
            name: name.into(),
            domain,
            arity: arity.max(1),
            data,
        }
    }

    /// Create an empty field of the given type.
    pub fn empty(name: impl Into<String>, domain: Domain, ty: ScalarType, arity: usize) -> Self {
        Self::new(name, domain, arity, FieldData::empty(ty))
    }

    /// Field name, unique within its store.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Domain whose rows this field covers.
    #[inline]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Scalars per row.
    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Scalar type of the backing buffer.
    #[inline]
    pub fn scalar_type(&self) -> ScalarType {
        self.data.scalar_type()
    }

    /// The flat backing buffer.
    #[inline]
    pub fn data(&self) -> &FieldData {
        &self.data
    }

    /// Mutable backing buffer. Callers keep the row count in step with the
    /// domain.
    #[inline]
    pub fn data_mut(&mut self) -> &mut FieldData {
        &mut self.data
    }

    /// Number of complete rows (flat length divided by arity).
    #[inline]
    pub fn rows(&self) -> usize {
        self.data.len() / self.arity
    }

    /// True when the flat length is not a whole number of rows.
    #[inline]
    pub fn has_partial_row(&self) -> bool {
        self.data.len() % self.arity != 0
    }

    /// Scalar field with arity 1.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.arity == 1
    }

    /// Typed read-only view of the flat buffer.
    pub fn values<T: FieldScalar>(&self) -> Result<&[T], GraphError> {
        T::view(&self.data).ok_or_else(|| GraphError::FieldTypeMismatch {
            name: self.name.clone(),
            expected: self.scalar_type(),
            found: T::SCALAR_TYPE,
        })
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn replace_data(&mut self, data: FieldData) -> FieldData {
        std::mem::replace(&mut self.data, data)
    }

    pub(crate) fn into_data(self) -> FieldData {
        self.data
    }
}

/// Named per-row attribute values supplied to insertion operations.
///
/// Each entry holds either one row (broadcast to every inserted row) or
/// exactly as many rows as are being inserted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes {
    entries: Vec<(String, FieldData)>,
}

impl Attributes {
    /// No attributes; every field takes its neutral value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; a later value for the same name wins.
    pub fn with(mut self, name: impl Into<String>, data: impl Into<FieldData>) -> Self {
        self.insert(name, data);
        self
    }

    /// Insert or replace the value for `name`.
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<FieldData>) {
        let name = name.into();
        let data = data.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = data,
            None => self.entries.push((name, data)),
        }
    }

    /// Value supplied for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&FieldData> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d)
    }

    /// True when nothing was supplied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldData)> {
        self.entries.iter().map(|(n, d)| (n.as_str(), d))
    }
}
