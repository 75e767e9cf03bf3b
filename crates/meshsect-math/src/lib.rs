#![warn(missing_docs)]

//! Math types for mesh sectioning.
//!
//! Thin wrappers around nalgebra providing the types the sectioning
//! pipeline works in: points, vectors, rigid transforms, and the three
//! independent tolerances used to compare geometry.

use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A 4x4 affine transformation made of a rotation and a translation.
///
/// The matrix acts on column vectors, so the translation lives in the last
/// column. When built from a flat 16-element array the array is read row by
/// row, which puts the translation at indices 3, 7 and 11.
///
/// Only rigid transforms are supported: [`AffineTransform::inverse_orthonormal`]
/// assumes the upper-left 3x3 block is a pure rotation. Feeding it a matrix
/// with scale or shear gives a wrong result without any error.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineTransform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl AffineTransform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Build from 16 values laid out row by row.
    pub fn from_array(values: [f64; 16]) -> Self {
        Self {
            matrix: Matrix4::from_row_slice(&values),
        }
    }

    /// The 16 matrix values, row by row (inverse of [`Self::from_array`]).
    pub fn to_array(&self) -> [f64; 16] {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[row * 4 + col] = self.matrix[(row, col)];
            }
        }
        out
    }

    /// Build from a local frame: `origin` plus the images of the X, Y and Z axes.
    ///
    /// The axes must be orthonormal and right-handed for the result to be a
    /// valid rigid transform.
    pub fn from_frame(origin: Point3, x_axis: Vec3, y_axis: Vec3, z_axis: Vec3) -> Self {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 1>(0, 0).copy_from(&x_axis);
        m.fixed_view_mut::<3, 1>(0, 1).copy_from(&y_axis);
        m.fixed_view_mut::<3, 1>(0, 2).copy_from(&z_axis);
        m[(0, 3)] = origin.x;
        m[(1, 3)] = origin.y;
        m[(2, 3)] = origin.z;
        Self { matrix: m }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// The translation part.
    pub fn translation_part(&self) -> Vec3 {
        Vec3::new(
            self.matrix[(0, 3)],
            self.matrix[(1, 3)],
            self.matrix[(2, 3)],
        )
    }

    /// The upper-left 3x3 rotation block.
    pub fn rotation_part(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Inverse of a rigid transform.
    ///
    /// Transposes the rotation block and maps the translation back through
    /// it: `t' = -Rᵀ·t`. Only valid when the rotation block is orthonormal.
    pub fn inverse_orthonormal(&self) -> Self {
        let rt = self.rotation_part().transpose();
        let t = -(rt * self.translation_part());
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&rt);
        m[(0, 3)] = t.x;
        m[(1, 3)] = t.y;
        m[(2, 3)] = t.z;
        Self { matrix: m }
    }

    /// Check whether this is a rigid transform within `tol`.
    ///
    /// Diagnostic only; the sectioning pipeline never calls it.
    pub fn is_orthonormal(&self, tol: f64) -> bool {
        let r = self.rotation_part();
        let gram = r.transpose() * r;
        let bottom = [
            self.matrix[(3, 0)],
            self.matrix[(3, 1)],
            self.matrix[(3, 2)],
            self.matrix[(3, 3)] - 1.0,
        ];
        (gram - Matrix3::identity()).amax() <= tol
            && bottom.iter().all(|v| v.abs() <= tol)
            && r.determinant() > 0.0
    }
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Angle between two vectors in radians, in `[0, π]`.
///
/// The dot product of the normalized vectors is clamped to `[-1, 1]` before
/// `acos` so round-off never produces NaN. Returns `None` when either vector
/// has zero length.
pub fn angle_between(a: &Vec3, b: &Vec3) -> Option<f64> {
    let a = a.try_normalize(f64::MIN_POSITIVE)?;
    let b = b.try_normalize(f64::MIN_POSITIVE)?;
    Some(a.dot(&b).clamp(-1.0, 1.0).acos())
}

/// Bearing of `v` in the XY plane, measured counter-clockwise from +X, in `[0, 2π)`.
pub fn bearing(v: &Vec3) -> f64 {
    let a = v.y.atan2(v.x);
    if a < 0.0 {
        a + TAU
    } else {
        a
    }
}

/// Counter-clockwise sweep from bearing `from` to bearing `to`, in `[0, 2π)`.
pub fn ccw_sweep(from: f64, to: f64) -> f64 {
    (to - from).rem_euclid(TAU)
}

/// Tolerances for geometric comparisons.
///
/// The three values are independent: one decides when two points are the
/// same location, one decides when a point lies on a fitted circle, and one
/// decides when three points are straight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerance {
    /// Maximum distance between two points treated as coincident.
    pub coincidence: f64,
    /// Maximum deviation of a point's distance-to-center from the radius.
    pub circle: f64,
    /// Maximum deviation (radians) of a corner angle from π to count as straight.
    pub collinear: f64,
}

impl Tolerance {
    /// Default tolerances (1e-6 coincidence, 1e-3 circle, 1e-4 rad collinear).
    pub const DEFAULT: Self = Self {
        coincidence: 1e-6,
        circle: 1e-3,
        collinear: 1e-4,
    };

    /// Check if two points are coincident (distance ≤ `coincidence`).
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() <= self.coincidence
    }

    /// Check if a distance from a circle's center matches its radius.
    pub fn on_circle(&self, distance: f64, radius: f64) -> bool {
        (distance - radius).abs() <= self.circle
    }

    /// Check if a corner angle (radians) is straight.
    pub fn is_straight(&self, angle: f64) -> bool {
        (PI - angle).abs() < self.collinear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
