//! Disjoint union of two graphs.

use crate::data::domain::{Domain, DomainSizes};
use crate::data::field::{Field, FieldData};
use crate::data::names;
use crate::data::store::AttributeStore;
use crate::graph::SpatialGraph;
use crate::graph::labels::LabelKind;
use crate::graph_error::GraphError;
use hashbrown::{HashMap, HashSet};

/// Concatenate `b` after `a`.
///
/// The result carries the union of both field sets, `a`'s fields first.
/// A field present on one side only is filled with neutral values (`0.0`,
/// `0`, `false`) for the other side's rows. `b`'s connectivity is offset by
/// `a.node_count()`.
///
/// Label fields stay unique: a `b` label value already used by `a` is
/// replaced by a fresh one (all rows sharing it get the same replacement),
/// and a side without the label field gets fresh labels instead of zeros.
/// An `EdgeLabel` stored per POINT gets one fresh label per edge.
///
/// # Errors
/// `ShapeMismatch` when a same-named field differs in domain, scalar type or
/// arity between the two graphs.
pub fn merge(a: &SpatialGraph, b: &SpatialGraph) -> Result<SpatialGraph, GraphError> {
    a.check_structure()?;
    b.check_structure()?;
    let (sa, sb) = (a.domain_sizes(), b.domain_sizes());
    let mut fields: Vec<Field> = Vec::with_capacity(a.store().len() + b.store().len());

    for fa in a.store().fields() {
        let mut data = fa.data().clone();
        let tail = match b.field(fa.name()) {
            Some(fb) => {
                check_compatible(fa, fb)?;
                fb.data().clone()
            }
            None => FieldData::filled(fa.scalar_type(), sb.get(fa.domain()) * fa.arity()),
        };
        data.append(&tail).map_err(|_| mismatch(fa, b.field(fa.name())))?;
        fields.push(Field::new(fa.name(), fa.domain(), fa.arity(), data));
    }
    for fb in b.store().fields().filter(|f| a.field(f.name()).is_none()) {
        let mut data = FieldData::filled(fb.scalar_type(), sa.get(fb.domain()) * fb.arity());
        data.append(fb.data()).map_err(|_| mismatch(fb, None))?;
        fields.push(Field::new(fb.name(), fb.domain(), fb.arity(), data));
    }

    let offset = a.node_count() as i64;
    let edges = a.edge_count() * 2;
    if let Some(conn) = fields.iter_mut().find(|f| f.name() == names::EDGE_CONNECTIVITY) {
        if let FieldData::Int(v) = conn.data_mut() {
            for x in &mut v[edges..] {
                *x += offset;
            }
        }
    }

    for kind in [LabelKind::Node, LabelKind::Edge, LabelKind::Point] {
        reissue_labels(&mut fields, kind, a, b);
    }

    let sizes = DomainSizes::new(sa.vertex + sb.vertex, sa.edge + sb.edge, sa.point + sb.point);
    let store = AttributeStore::from_fields_unchecked(sizes, fields);
    let out = SpatialGraph::from_store_with_labels(store, a.labels().max(b.labels()));
    out.check_structure()?;
    log::debug!(
        "merged graphs: {} + {} nodes, {} + {} edges",
        sa.vertex,
        sb.vertex,
        sa.edge,
        sb.edge
    );
    Ok(out)
}

fn reissue_labels(fields: &mut [Field], kind: LabelKind, a: &SpatialGraph, b: &SpatialGraph) {
    let name = kind.field_name();
    let Some(f) = fields.iter_mut().find(|f| f.name() == name && f.arity() == 1) else {
        return;
    };
    let domain = f.domain();
    let split = a.domain_sizes().get(domain);
    let (in_a, in_b) = (a.field(name).is_some(), b.field(name).is_some());
    let FieldData::Int(values) = f.data_mut() else {
        return;
    };
    let mut next = values
        .iter()
        .copied()
        .max()
        .map_or(0, |m| m + 1)
        .max(a.labels().peek(kind))
        .max(b.labels().peek(kind));
    let mut fresh = || {
        next += 1;
        next - 1
    };

    let len = values.len();
    let (head, tail) = values.split_at_mut(split.min(len));
    if !in_a {
        fill_fresh(head, &label_keys(a, kind, domain), &mut fresh);
    }
    if !in_b {
        fill_fresh(tail, &label_keys(b, kind, domain), &mut fresh);
    } else if in_a {
        let taken: HashSet<i64> = head.iter().copied().collect();
        let mut remap: HashMap<i64, i64> = HashMap::new();
        let mut clashes = 0usize;
        for x in tail.iter_mut().filter(|x| taken.contains(&**x)) {
            *x = *remap.entry(*x).or_insert_with(&mut fresh);
            clashes += 1;
        }
        if clashes > 0 {
            log::debug!("merge: reissued {} `{name}` values on {clashes} rows", remap.len());
        }
    }
}

/// Rows sharing a key share a label: the owning edge for a per-point
/// `EdgeLabel`, the row itself otherwise.
fn label_keys(g: &SpatialGraph, kind: LabelKind, domain: Domain) -> Vec<usize> {
    match (kind, domain) {
        (LabelKind::Edge, Domain::Point) => g.edge_point_edge_indices(),
        _ => (0..g.domain_sizes().get(domain)).collect(),
    }
}

fn fill_fresh(rows: &mut [i64], keys: &[usize], fresh: &mut impl FnMut() -> i64) {
    let mut by_key: HashMap<usize, i64> = HashMap::new();
    for (x, &k) in rows.iter_mut().zip(keys) {
        *x = *by_key.entry(k).or_insert_with(&mut *fresh);
    }
}

fn check_compatible(fa: &Field, fb: &Field) -> Result<(), GraphError> {
    if fa.domain() != fb.domain() || fa.scalar_type() != fb.scalar_type() || fa.arity() != fb.arity()
    {
        return Err(mismatch(fa, Some(fb)));
    }
    Ok(())
}

fn mismatch(fa: &Field, fb: Option<&Field>) -> GraphError {
    GraphError::ShapeMismatch {
        name: fa.name().to_owned(),
        domain: fb.map_or(fa.domain(), Field::domain),
        expected: fa.arity(),
        found: fb.map_or(0, Field::arity),
    }
}
