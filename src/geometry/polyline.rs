//! Arc-length parametrisation and interpolation along polylines.

use super::{distance, lerp};
use itertools::Itertools;

/// Cumulative arc length at each sample; `out[0] == 0`.
pub fn cumulative_length(points: &[[f64; 3]]) -> Vec<f64> {
    let mut out = Vec::with_capacity(points.len());
    let mut acc = 0.0;
    if let Some(first) = points.first() {
        out.push(0.0);
        let mut prev = *first;
        for &p in &points[1..] {
            acc += distance(prev, p);
            out.push(acc);
            prev = p;
        }
    }
    out
}

/// Total length of a polyline.
pub fn polyline_length(points: &[[f64; 3]]) -> f64 {
    points
        .iter()
        .tuple_windows()
        .map(|(&a, &b)| distance(a, b))
        .sum()
}

/// Locate arc length `s` on a polyline with cumulative lengths `cum`.
///
/// Returns the segment index `i` with `cum[i] <= s <= cum[i + 1]` and the
/// local parameter within that segment. `s` is clamped to the polyline.
/// Zero-length segments are skipped.
pub fn locate(cum: &[f64], s: f64) -> (usize, f64) {
    let n = cum.len();
    if n < 2 {
        return (0, 0.0);
    }
    let total = cum[n - 1];
    let s = s.clamp(0.0, total);
    // first segment whose end reaches s
    let mut i = cum.partition_point(|&c| c < s).saturating_sub(1);
    if i >= n - 1 {
        i = n - 2;
    }
    while i < n - 2 && cum[i + 1] - cum[i] <= 0.0 {
        i += 1;
    }
    let len = cum[i + 1] - cum[i];
    let t = if len > 0.0 {
        ((s - cum[i]) / len).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (i, t)
}

/// Point at arc length `s`, interpolated linearly.
pub fn point_at(points: &[[f64; 3]], cum: &[f64], s: f64) -> [f64; 3] {
    match points.len() {
        0 => [0.0; 3],
        1 => points[0],
        _ => {
            let (i, t) = locate(cum, s);
            lerp(points[i], points[i + 1], t)
        }
    }
}

/// Point at arc length `s` on the chord-length Catmull-Rom spline through
/// `points` (knots are the cumulative lengths `cum`).
///
/// End tangents use reflected phantom samples. Segments with a zero-length
/// neighbour fall back to linear interpolation.
pub fn catmull_rom_at(points: &[[f64; 3]], cum: &[f64], s: f64) -> [f64; 3] {
    let n = points.len();
    if n < 3 {
        return point_at(points, cum, s);
    }
    let (i, _) = locate(cum, s);
    let s = s.clamp(0.0, cum[n - 1]);

    let (p1, p2) = (points[i], points[i + 1]);
    let (t1, t2) = (cum[i], cum[i + 1]);
    let (p0, t0) = if i == 0 {
        let d = distance(p1, p2);
        (super::sub(super::scale(p1, 2.0), p2), t1 - d)
    } else {
        (points[i - 1], cum[i - 1])
    };
    let (p3, t3) = if i + 2 >= n {
        let d = distance(p1, p2);
        (super::sub(super::scale(p2, 2.0), p1), t2 + d)
    } else {
        (points[i + 2], cum[i + 2])
    };

    if t1 - t0 <= 0.0 || t2 - t1 <= 0.0 || t3 - t2 <= 0.0 {
        return point_at(points, cum, s);
    }

    // Barry-Goldman pyramid
    let w = |ta: f64, tb: f64| (s - ta) / (tb - ta);
    let a1 = lerp(p0, p1, w(t0, t1));
    let a2 = lerp(p1, p2, w(t1, t2));
    let a3 = lerp(p2, p3, w(t2, t3));
    let b1 = lerp(a1, a2, w(t0, t2));
    let b2 = lerp(a2, a3, w(t1, t3));
    lerp(b1, b2, w(t1, t2))
}
