//! Cutting plane construction.

use meshsect_math::{AffineTransform, Point3, Vec3};

/// Build a plane-to-world transform from an origin and a normal.
///
/// The plane's local Z axis is `normal`. The local X axis is `x_dir`
/// projected onto the plane; without a hint (or with one parallel to the
/// normal) world X is used, falling back to world Y for planes facing X.
/// Returns `None` for a zero normal.
pub fn plane_transform(origin: Point3, normal: Vec3, x_dir: Option<Vec3>) -> Option<AffineTransform> {
    let z = normal.try_normalize(f64::MIN_POSITIVE)?;

    let project = |v: Vec3| (v - z * z.dot(&v)).try_normalize(1e-9);
    let x = x_dir
        .and_then(project)
        .or_else(|| project(Vec3::x()))
        .or_else(|| project(Vec3::y()))?;
    let y = z.cross(&x);

    Some(AffineTransform::from_frame(origin, x, y, z))
}
