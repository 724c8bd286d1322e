//! Polyline resampling.
//!
//! Each edge is re-sampled at evenly spaced arc lengths. Short polylines
//! (four samples or fewer) are interpolated linearly; longer ones follow a
//! chord-length Catmull-Rom spline through the original samples. The first
//! and last samples are always the original endpoints. POINT attributes are
//! carried along: float fields are interpolated linearly in arc length, int
//! and bool fields take the nearest original sample. `PointLabel` values are
//! reissued since the samples are new.

use crate::data::domain::Domain;
use crate::data::field::FieldData;
use crate::data::names;
use crate::geometry::{self, lerp_scalar};
use crate::graph::SpatialGraph;
use crate::graph::labels::LabelKind;
use crate::graph_error::GraphError;

/// Upper bound on the samples one resampled edge may carry.
pub const MAX_SAMPLES_PER_EDGE: usize = 1 << 20;

/// How many samples each edge should carry after resampling.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ResampleTarget {
    /// Target arc-length spacing between consecutive samples.
    Spacing(f64),
    /// Fixed number of samples per edge.
    Count(usize),
    /// Divide each edge's current sample count by this factor.
    Factor(f64),
}

impl ResampleTarget {
    fn check(self) -> Result<(), GraphError> {
        match self {
            ResampleTarget::Spacing(d) if !(d.is_finite() && d > 0.0) => Err(
                GraphError::InvalidTopology(format!("resample spacing {d} must be positive")),
            ),
            ResampleTarget::Factor(f) if !(f.is_finite() && f > 0.0) => Err(
                GraphError::InvalidTopology(format!("resample factor {f} must be positive")),
            ),
            _ => Ok(()),
        }
    }

    /// Sample count for a polyline of `len` arc length and `current` samples.
    /// Never below 2.
    ///
    /// # Errors
    /// `InvalidTopology` when the edge would need more than
    /// [`MAX_SAMPLES_PER_EDGE`] samples.
    pub fn sample_count(self, len: f64, current: usize) -> Result<usize, GraphError> {
        let n = match self {
            ResampleTarget::Spacing(d) => (len / d).round() + 1.0,
            ResampleTarget::Count(n) => n as f64,
            ResampleTarget::Factor(f) => (current as f64 / f).round(),
        };
        if !(n <= MAX_SAMPLES_PER_EDGE as f64) {
            return Err(GraphError::InvalidTopology(format!(
                "{self:?} asks for {n} samples on one edge, limit is {MAX_SAMPLES_PER_EDGE}"
            )));
        }
        Ok((n as usize).max(2))
    }
}

/// Where a new sample falls on the original polyline.
#[derive(Debug, Clone, Copy)]
struct Sample {
    /// Original POINT row at the start of the segment.
    row: usize,
    /// Local parameter in the segment.
    t: f64,
    pos: [f64; 3],
}

impl Sample {
    fn nearest(&self) -> usize {
        if self.t < 0.5 { self.row } else { self.row + 1 }
    }
}

fn plan_edge(
    points: &[[f64; 3]],
    base: usize,
    target: ResampleTarget,
) -> Result<Vec<Sample>, GraphError> {
    let cum = geometry::cumulative_length(points);
    let len = cum.last().copied().unwrap_or(0.0);
    let n = target.sample_count(len, points.len())?;
    let last = points.len().saturating_sub(1);
    Ok((0..n)
        .map(|k| {
            if k == 0 {
                return Sample { row: base, t: 0.0, pos: points[0] };
            }
            if k == n - 1 {
                return Sample { row: (base + last).saturating_sub(1), t: 1.0, pos: points[last] };
            }
            let s = len * k as f64 / (n - 1) as f64;
            let (seg, t) = geometry::locate(&cum, s);
            let pos = if points.len() <= 4 {
                geometry::point_at(points, &cum, s)
            } else {
                geometry::catmull_rom_at(points, &cum, s)
            };
            Sample { row: base + seg, t, pos }
        })
        .collect())
}

fn carry(data: &FieldData, arity: usize, samples: &[Sample]) -> FieldData {
    match data {
        FieldData::Float(v) => {
            let mut out = Vec::with_capacity(samples.len() * arity);
            for s in samples {
                let (a, b) = (s.row * arity, (s.row + 1) * arity);
                for c in 0..arity {
                    let lo = v[a + c];
                    let hi = v.get(b + c).copied().unwrap_or(lo);
                    out.push(lerp_scalar(lo, hi, s.t));
                }
            }
            FieldData::Float(out)
        }
        _ => {
            let rows: Vec<usize> = samples.iter().map(Sample::nearest).collect();
            data.take_rows(arity, &rows)
        }
    }
}

/// Resample every edge polyline.
///
/// # Errors
/// `InvalidTopology` for a non-positive spacing or factor, or when an edge
/// would exceed [`MAX_SAMPLES_PER_EDGE`].
pub fn resample_edges(g: &SpatialGraph, target: ResampleTarget) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    target.check()?;
    let pts = g.point_coords();
    let offsets = g.edge_offsets();
    let plan = |w: &[usize]| plan_edge(&pts[w[0]..w[1]], w[0], target);
    #[cfg(feature = "rayon")]
    let plans: Vec<Vec<Sample>> = {
        use rayon::prelude::*;
        let windows: Vec<&[usize]> = offsets.windows(2).collect();
        windows.into_par_iter().map(plan).collect::<Result<_, _>>()?
    };
    #[cfg(not(feature = "rayon"))]
    let plans: Vec<Vec<Sample>> = offsets.windows(2).map(plan).collect::<Result<_, _>>()?;

    let samples: Vec<Sample> = plans.iter().flatten().copied().collect();
    let counts: Vec<i64> = plans.iter().map(|p| p.len() as i64).collect();
    let total = samples.len();

    let mut store = g.store().clone();
    let point_fields: Vec<(String, FieldData)> = store
        .fields_in(Domain::Point)
        .map(|f| (f.name().to_owned(), carry(f.data(), f.arity(), &samples)))
        .collect();
    for (name, data) in point_fields {
        store.set_field_deferred(&name, data)?;
    }
    let coords: Vec<f64> = samples.iter().flat_map(|s| s.pos).collect();
    store.set_field_deferred(names::EDGE_POINT_COORDINATES, FieldData::Float(coords))?;
    if store.field(names::POINT_LABEL).is_some_and(|f| f.domain() == Domain::Point) {
        let first = g.labels().peek(LabelKind::Point);
        let labels: Vec<i64> = (first..first + total as i64).collect();
        store.set_field_deferred(names::POINT_LABEL, FieldData::Int(labels))?;
    }
    store.set_domain_size(Domain::Point, total);
    store.set_field(names::NUM_EDGE_POINTS, FieldData::Int(counts))?;

    let out = SpatialGraph::from_store_with_labels(store, g.labels());
    out.check_structure()?;
    log::debug!(
        "resampled {} edges: {} -> {} points",
        g.edge_count(),
        g.point_count(),
        out.point_count()
    );
    Ok(out)
}
