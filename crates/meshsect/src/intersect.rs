//! Segments and their crossing with the z = 0 plane.

use meshsect_math::Point3;

/// A straight segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point.
    pub start: Point3,
    /// End point.
    pub end: Point3,
}

impl Segment {
    /// Create a segment.
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Segment length.
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// Point where the segment `start`→`end` crosses z = 0.
///
/// Interpolates by `|z_start| / (|z_start| + |z_end|)`. The caller must
/// guarantee the segment straddles the plane (opposite signs, at most one
/// zero); the division is not guarded.
pub fn intersect_z0(start: &Point3, end: &Point3) -> Point3 {
    let factor = start.z.abs() / (start.z.abs() + end.z.abs());
    start + (end - start) * factor
}
