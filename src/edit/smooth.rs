//! Radius smoothing along polylines.

use crate::data::domain::Domain;
use crate::data::field::FieldData;
use crate::graph::SpatialGraph;
use crate::graph_error::GraphError;

/// Moving-average smoothing of the POINT radius field along each edge.
///
/// The radius field is resolved with [`SpatialGraph::radius_field`]. Each
/// sample becomes the mean of the `window` samples centred on it, the window
/// shrinking symmetrically near the ends so the endpoint values are kept.
/// Edges with `window` samples or fewer are left alone, as are radius
/// fields outside the POINT domain.
///
/// # Errors
/// `InvalidTopology` for an even or zero `window`; `MissingField` when no
/// radius field resolves; `FieldTypeMismatch` for a non-float radius.
pub fn smooth_radii(g: &SpatialGraph, window: usize) -> Result<SpatialGraph, GraphError> {
    g.check_structure()?;
    if window == 0 || window % 2 == 0 {
        return Err(GraphError::InvalidTopology(format!(
            "smoothing window {window} must be odd"
        )));
    }
    let radius = g
        .radius_field()
        .ok_or_else(|| GraphError::MissingField("radius".to_owned()))?;
    if radius.domain() != Domain::Point {
        log::debug!("smooth_radii: `{}` is per {}, nothing to smooth", radius.name(), radius.domain());
        return Ok(g.copy());
    }
    let name = radius.name().to_owned();
    let mut values = radius.values::<f64>()?.to_vec();
    let half = window / 2;
    let mut smoothed = 0usize;
    for rec in g.edges().iter().filter(|r| r.point_count() > window) {
        let original = values[rec.points.clone()].to_vec();
        let n = original.len();
        for (i, v) in values[rec.points.clone()].iter_mut().enumerate() {
            let reach = half.min(i).min(n - 1 - i);
            let span = &original[i - reach..=i + reach];
            *v = span.iter().sum::<f64>() / span.len() as f64;
        }
        smoothed += 1;
    }
    log::debug!("smooth_radii: smoothed `{name}` on {smoothed} edges");
    let mut out = g.copy();
    out.set_data(&name, FieldData::Float(values))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::field::Field;

    fn noisy() -> SpatialGraph {
        let pts: Vec<[f64; 3]> = (0..6).map(|i| [i as f64, 0., 0.]).collect();
        let mut g = SpatialGraph::from_parts(
            &[pts[0], pts[5], [5., 2., 0.]],
            &[[0, 1], [1, 2]],
            &[pts.clone(), vec![pts[5], [5., 1., 0.], [5., 2., 0.]]],
        )
        .unwrap();
        g.add_field(Field::new(
            "Radius",
            Domain::Point,
            1,
            FieldData::Float(vec![1., 4., 1., 4., 1., 4., 9., 0., 9.]),
        ))
        .unwrap();
        g
    }

    #[test]
    fn window_shrinks_at_the_ends() {
        let h = smooth_radii(&noisy(), 3).unwrap();
        assert_eq!(
            h.field("Radius").unwrap().data(),
            // the three-sample edge is not longer than the window
            &FieldData::Float(vec![1., 2., 3., 2., 3., 4., 9., 0., 9.])
        );
        let wide = smooth_radii(&noisy(), 5).unwrap();
        assert_eq!(
            wide.field("Radius").unwrap().data().to_f64_vec()[..6],
            [1., 2., 2.2, 2.8, 3., 4.]
        );
    }

    #[test]
    fn bad_window_or_radius_is_an_error() {
        let g = noisy();
        assert!(smooth_radii(&g, 4).is_err());
        assert!(smooth_radii(&g, 0).is_err());
        assert_eq!(smooth_radii(&g, 1).unwrap(), g);

        let bare = SpatialGraph::from_parts(&[[0.; 3], [1., 0., 0.]], &[[0, 1]], &[vec![[0.; 3], [1., 0., 0.]]])
            .unwrap();
        assert!(matches!(smooth_radii(&bare, 3), Err(GraphError::MissingField(_))));

        let mut per_edge = bare.copy();
        per_edge
            .add_field(Field::new("radius", Domain::Edge, 1, FieldData::Float(vec![2.])))
            .unwrap();
        assert_eq!(smooth_radii(&per_edge, 3).unwrap(), per_edge);
    }
}
