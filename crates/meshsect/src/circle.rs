//! Circles through three points.

use meshsect_math::{Point3, Tolerance};

/// A circle in 3D, given by its center and radius.
///
/// The circle's plane is implied by the points it was fitted through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Center point.
    pub center: Point3,
    /// Radius.
    pub radius: f64,
}

impl Circle {
    /// The circle through three points.
    ///
    /// The center is where the perpendicular bisectors of `a`-`c` and
    /// `b`-`c` meet inside the points' plane. Returns `None` when the points
    /// are collinear or coincident, i.e. when the bisectors do not meet.
    pub fn through(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        let u = a - c;
        let v = b - c;
        let n = u.cross(&v);
        let det = n.norm_squared();

        if det <= f64::EPSILON * u.norm_squared() * v.norm_squared() || det == 0.0 {
            return None;
        }

        let offset = (v * u.norm_squared() - u * v.norm_squared()).cross(&n) / (2.0 * det);
        let center = c + offset;
        let radius = offset.norm();

        if !radius.is_finite() {
            return None;
        }

        Some(Self { center, radius })
    }

    /// Does `p` lie on this circle within the circle tolerance?
    ///
    /// Only the distance to the center is compared; points off the circle's
    /// plane are not rejected.
    pub fn contains(&self, p: &Point3, tol: &Tolerance) -> bool {
        tol.on_circle((p - self.center).norm(), self.radius)
    }
}
