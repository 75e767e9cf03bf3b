//! Triangle slicing - intersect plane-local triangles with z = 0.

use meshsect_math::{Point3, Tolerance};
use rayon::prelude::*;
use tracing::debug;

use crate::intersect::{intersect_z0, Segment};
use crate::mesh::vertex_at;

/// Which side of the plane a vertex is on. Vertices exactly on the plane
/// count as above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Above,
    Below,
}

impl Side {
    fn of(p: &Point3) -> Self {
        if p.z >= 0.0 {
            Side::Above
        } else {
            Side::Below
        }
    }
}

/// Split a crossing triangle into its two same-side vertices and the lone one.
///
/// Returns `None` when all three vertices are on the same side.
fn split_minority(v: [Point3; 3]) -> Option<(Point3, Point3, Point3)> {
    use Side::*;

    let [a, b, c] = v;
    match (Side::of(&a), Side::of(&b), Side::of(&c)) {
        (Above, Above, Above) | (Below, Below, Below) => None,
        (Above, Above, Below) | (Below, Below, Above) => Some((a, b, c)),
        (Above, Below, Above) | (Below, Above, Below) => Some((a, c, b)),
        (Below, Above, Above) | (Above, Below, Below) => Some((b, c, a)),
    }
}

/// Intersect one plane-local triangle with z = 0.
///
/// A triangle crosses the plane when at least one vertex has z ≥ 0 and at
/// least one has z < 0, so a triangle lying in the plane does not cross.
/// The segment runs from the crossing on the first majority edge to the
/// crossing on the second. Segments shorter than the coincidence tolerance
/// (the plane only touches a vertex) are dropped.
pub fn slice_triangle(v: [Point3; 3], tol: &Tolerance) -> Option<Segment> {
    let (major_a, major_b, minor) = split_minority(v)?;

    let segment = Segment::new(intersect_z0(&major_a, &minor), intersect_z0(&major_b, &minor));
    (segment.length() > tol.coincidence).then_some(segment)
}

/// Slice every triangle of a plane-local mesh.
///
/// `vertices` must already be in the plane's frame and the buffers must be
/// valid (see [`crate::TriangleMesh::validate`]). Segments come out in
/// triangle order.
pub fn slice_triangles(vertices: &[f64], indices: &[u32], tol: &Tolerance) -> Vec<Segment> {
    let segments: Vec<Segment> = indices
        .par_chunks_exact(3)
        .filter_map(|tri| {
            let v = [
                vertex_at(vertices, tri[0] as usize),
                vertex_at(vertices, tri[1] as usize),
                vertex_at(vertices, tri[2] as usize),
            ];
            slice_triangle(v, tol)
        })
        .collect();

    debug!(
        triangles = indices.len() / 3,
        segments = segments.len(),
        "sliced mesh"
    );

    segments
}
