//! Unique label generation for nodes, edges and points.
//!
//! Label fields (`NodeLabel`, `EdgeLabel`, `PointLabel`) carry identifiers that
//! survive renumbering. New labels come from monotone counters owned by the
//! graph; a candidate already present in the label field is bumped past the
//! field's maximum.

use crate::data::field::FieldData;
use crate::data::names;
use crate::data::store::AttributeStore;
use crate::data::domain::Domain;

/// Which label sequence to draw from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelKind {
    Node,
    Edge,
    Point,
}

impl LabelKind {
    /// Field holding labels of this kind.
    pub fn field_name(self) -> &'static str {
        match self {
            LabelKind::Node => names::NODE_LABEL,
            LabelKind::Edge => names::EDGE_LABEL,
            LabelKind::Point => names::POINT_LABEL,
        }
    }

    /// Resolve a field name to its label kind, if it is a label field.
    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            names::NODE_LABEL => Some(LabelKind::Node),
            names::EDGE_LABEL => Some(LabelKind::Edge),
            names::POINT_LABEL => Some(LabelKind::Point),
            _ => None,
        }
    }

    fn fallback_domain(self) -> Domain {
        match self {
            LabelKind::Node => Domain::Vertex,
            LabelKind::Edge => Domain::Edge,
            LabelKind::Point => Domain::Point,
        }
    }
}

/// Monotone label counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LabelCounters {
    node: i64,
    edge: i64,
    point: i64,
}

impl LabelCounters {
    /// Seed counters from a store: `max(label field) + 1`, or the domain size
    /// when the label field is absent.
    pub fn seeded_from(store: &AttributeStore) -> Self {
        let seed = |kind: LabelKind| {
            store
                .field(kind.field_name())
                .and_then(|f| max_label(f.data()))
                .map(|m| m + 1)
                .unwrap_or(store.domain_size(kind.fallback_domain()) as i64)
        };
        Self {
            node: seed(LabelKind::Node),
            edge: seed(LabelKind::Edge),
            point: seed(LabelKind::Point),
        }
    }

    /// Next unused label of `kind`, checked against `existing` label values.
    pub fn next(&mut self, kind: LabelKind, existing: Option<&FieldData>) -> i64 {
        let counter = match kind {
            LabelKind::Node => &mut self.node,
            LabelKind::Edge => &mut self.edge,
            LabelKind::Point => &mut self.point,
        };
        let mut candidate = *counter;
        if let Some(data) = existing {
            if contains_label(data, candidate) {
                candidate = max_label(data).map_or(candidate, |m| m.max(candidate) + 1);
            }
        }
        *counter = candidate + 1;
        candidate
    }

    /// Current counter value for `kind` (the next candidate).
    pub fn peek(&self, kind: LabelKind) -> i64 {
        match kind {
            LabelKind::Node => self.node,
            LabelKind::Edge => self.edge,
            LabelKind::Point => self.point,
        }
    }

    /// Combine two counter sets, keeping the larger of each.
    pub fn max(self, other: Self) -> Self {
        Self {
            node: self.node.max(other.node),
            edge: self.edge.max(other.edge),
            point: self.point.max(other.point),
        }
    }
}

fn max_label(data: &FieldData) -> Option<i64> {
    (0..data.len()).filter_map(|i| data.get_i64(i)).max()
}

fn contains_label(data: &FieldData, label: i64) -> bool {
    (0..data.len()).any(|i| data.get_i64(i) == Some(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::field::Field;

    #[test]
    fn seeds_from_field_maximum_or_domain_size() {
        let mut store = AttributeStore::new();
        store.set_domain_size(Domain::Vertex, 3);
        store.set_domain_size(Domain::Edge, 4);
        store
            .add_field(Field::new(
                names::NODE_LABEL,
                Domain::Vertex,
                1,
                FieldData::Int(vec![7, 2, 9]),
            ))
            .unwrap();
        let c = LabelCounters::seeded_from(&store);
        assert_eq!(c.peek(LabelKind::Node), 10);
        assert_eq!(c.peek(LabelKind::Edge), 4);
        assert_eq!(c.peek(LabelKind::Point), 0);
    }

    #[test]
    fn scan_and_bump_skips_existing_labels() {
        let mut c = LabelCounters::default();
        let existing = FieldData::Int(vec![0, 1, 5]);
        assert_eq!(c.next(LabelKind::Edge, Some(&existing)), 6);
        assert_eq!(c.next(LabelKind::Edge, Some(&existing)), 7);
        assert_eq!(c.next(LabelKind::Node, None), 0);
        assert_eq!(c.next(LabelKind::Node, None), 1);
    }
}
