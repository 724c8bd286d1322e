//! Geometry utilities for spatial graphs.
//!
//! Points are plain `[f64; 3]` rows, matching the layout of the coordinate
//! fields, so flat coordinate buffers can be viewed with
//! `bytemuck::cast_slice` and passed straight in.

pub mod polyline;

pub use polyline::{catmull_rom_at, cumulative_length, locate, point_at, polyline_length};

static_assertions::assert_eq_size!([f64; 3], [u8; 24]);

#[inline]
pub fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(a: [f64; 3], s: f64) -> [f64; 3] {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

#[inline]
pub fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    norm(sub(a, b))
}

/// Linear interpolation between two points.
#[inline]
pub fn lerp(a: [f64; 3], b: [f64; 3], t: f64) -> [f64; 3] {
    [
        lerp_scalar(a[0], b[0], t),
        lerp_scalar(a[1], b[1], t),
        lerp_scalar(a[2], b[2], t),
    ]
}

/// Linear interpolation between two scalars of any float type.
#[inline]
pub fn lerp_scalar<T: num_traits::Float>(a: T, b: T, t: T) -> T {
    a + (b - a) * t
}

/// Whether two points coincide within `tol` (Euclidean).
#[inline]
pub fn approx_eq(a: [f64; 3], b: [f64; 3], tol: f64) -> bool {
    distance(a, b) <= tol
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing all `points`; `None` for an empty input.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f64; 3]>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = *it.next()?;
        let mut bb = Self::new(first, first);
        for p in it {
            for k in 0..3 {
                bb.min[k] = bb.min[k].min(p[k]);
                bb.max[k] = bb.max[k].max(p[k]);
            }
        }
        Some(bb)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: [f64; 3]) -> bool {
        (0..3).all(|k| p[k] >= self.min[k] && p[k] <= self.max[k])
    }

    /// Side lengths along x, y, z.
    pub fn extent(&self) -> [f64; 3] {
        sub(self.max, self.min)
    }
}

/// Affine map `x -> A x + t` stored as a 3x4 row-major matrix `[A | t]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Affine3 {
    pub rows: [[f64; 4]; 3],
}

impl Default for Affine3 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine3 {
    pub fn identity() -> Self {
        Self {
            rows: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ],
        }
    }

    /// Uniform scale about the origin.
    pub fn scaling(s: f64) -> Self {
        let mut m = Self::identity();
        for k in 0..3 {
            m.rows[k][k] = s;
        }
        m
    }

    pub fn translation(t: [f64; 3]) -> Self {
        let mut m = Self::identity();
        for k in 0..3 {
            m.rows[k][3] = t[k];
        }
        m
    }

    /// Apply the map to a point.
    pub fn apply(&self, p: [f64; 3]) -> [f64; 3] {
        let r = &self.rows;
        [
            r[0][0] * p[0] + r[0][1] * p[1] + r[0][2] * p[2] + r[0][3],
            r[1][0] * p[0] + r[1][1] * p[1] + r[1][2] * p[2] + r[1][3],
            r[2][0] * p[0] + r[2][1] * p[1] + r[2][2] * p[2] + r[2][3],
        ]
    }

    /// Rotation plus uniform scale about `anchor` that carries `from` onto
    /// `to`. `None` when either point coincides with the anchor.
    ///
    /// Opposite directions rotate half a turn about an axis perpendicular to
    /// `from - anchor`.
    pub fn pinned_similarity(anchor: [f64; 3], from: [f64; 3], to: [f64; 3]) -> Option<Self> {
        let (v0, v1) = (sub(from, anchor), sub(to, anchor));
        let (d0, d1) = (norm(v0), norm(v1));
        if !(d0 > 0.0 && d1 > 0.0 && d0.is_finite() && d1.is_finite()) {
            return None;
        }
        let (u0, u1) = (scale(v0, 1.0 / d0), scale(v1, 1.0 / d1));
        let axis = cross(u0, u1);
        let sin = norm(axis);
        let cos = dot(u0, u1).clamp(-1.0, 1.0);
        let k = if sin > 1e-12 {
            scale(axis, 1.0 / sin)
        } else {
            perpendicular(u0)
        };
        let s = d1 / d0;
        let skew = [[0.0, -k[2], k[1]], [k[2], 0.0, -k[0]], [-k[1], k[0], 0.0]];
        let mut m = Self::identity();
        for i in 0..3 {
            for j in 0..3 {
                let diag = if i == j { cos } else { 0.0 };
                m.rows[i][j] = s * (diag + (1.0 - cos) * k[i] * k[j] + sin * skew[i][j]);
            }
        }
        // x -> s R (x - anchor) + anchor
        let moved = m.apply(anchor);
        for i in 0..3 {
            m.rows[i][3] = anchor[i] - moved[i];
        }
        Some(m)
    }

    /// Diagonal entry of the linear part along `axis` (0..3).
    pub fn diagonal(&self, axis: usize) -> f64 {
        self.rows[axis % 3][axis % 3]
    }
}

/// A unit vector perpendicular to unit vector `u`.
fn perpendicular(u: [f64; 3]) -> [f64; 3] {
    let mut e = [0.0; 3];
    let k = (0..3)
        .min_by(|&a, &b| u[a].abs().total_cmp(&u[b].abs()))
        .unwrap_or(0);
    e[k] = 1.0;
    let c = cross(u, e);
    scale(c, 1.0 / norm(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_contains_is_inclusive() {
        let pts = [[0.0, 1.0, 2.0], [4.0, -1.0, 2.0]];
        let bb = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(bb.min, [0.0, -1.0, 2.0]);
        assert_eq!(bb.extent(), [4.0, 2.0, 0.0]);
        assert!(bb.contains([4.0, 1.0, 2.0]));
        assert!(!bb.contains([4.1, 0.0, 2.0]));
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn affine_composes_scale_and_shift() {
        let mut m = Affine3::scaling(2.0);
        m.rows[0][3] = 1.0;
        assert_eq!(m.apply([1.0, 2.0, 3.0]), [3.0, 4.0, 6.0]);
        assert_eq!(Affine3::translation([1.0, 0.0, 0.0]).apply([0.0; 3]), [1.0, 0.0, 0.0]);
        assert_eq!(m.diagonal(1), 2.0);
    }

    #[test]
    fn pinned_similarity_keeps_anchor_and_lands_on_target() {
        let anchor = [1.0, 1.0, 0.0];
        for to in [[1.0, 4.0, 0.0], [-2.0, 1.0, 0.0], [3.0, 1.0, 0.0], [1.0, 1.0, 2.5]] {
            let m = Affine3::pinned_similarity(anchor, [3.0, 1.0, 0.0], to).unwrap();
            assert!(approx_eq(m.apply(anchor), anchor, 1e-12));
            assert!(approx_eq(m.apply([3.0, 1.0, 0.0]), to, 1e-12), "{to:?}");
        }
        // quarter turn doubles the length: midpoint follows
        let m = Affine3::pinned_similarity([0.0; 3], [2.0, 0.0, 0.0], [0.0, 4.0, 0.0]).unwrap();
        assert!(approx_eq(m.apply([1.0, 1.0, 0.0]), [-2.0, 2.0, 0.0], 1e-12));
        assert!(Affine3::pinned_similarity([0.0; 3], [0.0; 3], [1.0, 0.0, 0.0]).is_none());
        assert!(Affine3::pinned_similarity([0.0; 3], [1.0, 0.0, 0.0], [0.0; 3]).is_none());
    }
}
