#![warn(missing_docs)]

//! Planar cross-sections of triangle meshes.
//!
//! This crate cuts an indexed triangle mesh with a plane and returns the
//! section as ordered loops of points in the plane's local frame, optionally
//! simplified into straight edges and three-point arcs for drawing.
//!
//! # Example
//!
//! ```
//! use meshsect::{plane_transform, section_mesh, Point3, SectionSettings, TriangleMesh, Vec3};
//!
//! let mesh = TriangleMesh::new(
//!     vec![0.0, 0.0, -1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0],
//!     vec![0, 1, 2],
//! );
//! let plane = plane_transform(Point3::origin(), Vec3::z(), None).unwrap();
//! let loops = section_mesh(&mesh, &plane, &SectionSettings::default()).unwrap();
//!
//! assert_eq!(loops.len(), 1);
//! assert_eq!(loops[0].len(), 2);
//! ```

pub mod arc;
pub mod assemble;
pub mod circle;
pub mod curve;
pub mod error;
pub mod intersect;
pub mod mesh;
pub mod plane;
pub mod section_loop;
pub mod simplify;
pub mod slice;

pub use arc::{fit_arcs, MIN_ARC_POINTS};
pub use assemble::{assemble_loops, unconnected_loop};
pub use circle::Circle;
pub use curve::SectionCurve;
pub use error::{Result, SectionError};
pub use intersect::Segment;
pub use mesh::{to_plane_local, TriangleMesh};
pub use plane::plane_transform;
pub use section_loop::{PointKind, SectionLoop, SectionPoint};
pub use simplify::merge_collinear;
pub use slice::{slice_triangle, slice_triangles};

pub use meshsect_math::{AffineTransform, Point3, Tolerance, Vec3};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sectioning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionSettings {
    /// Stitch segments into loops. When false the result is a single
    /// unconnected loop of raw (start, end) pairs.
    pub connect_loops: bool,
    /// Merge collinear runs into single straight edges.
    pub simplify_lines: bool,
    /// Replace runs of points on a common circle with three-point arcs.
    pub simplify_arcs: bool,
    /// Fewest points a run needs before it is replaced by an arc.
    pub min_arc_points: usize,
    /// Geometric tolerances.
    pub tolerance: Tolerance,
}

impl Default for SectionSettings {
    fn default() -> Self {
        Self {
            connect_loops: true,
            simplify_lines: true,
            simplify_arcs: false,
            min_arc_points: MIN_ARC_POINTS,
            tolerance: Tolerance::DEFAULT,
        }
    }
}

impl SectionSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        let tol = &self.tolerance;
        for (name, value) in [
            ("coincidence", tol.coincidence),
            ("circle", tol.circle),
            ("collinear", tol.collinear),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SectionError::InvalidSettings(format!(
                    "{name} tolerance must be positive and finite, got {value}"
                )));
            }
        }
        if self.min_arc_points < 3 {
            return Err(SectionError::InvalidSettings(format!(
                "min_arc_points must be at least 3, got {}",
                self.min_arc_points
            )));
        }
        Ok(())
    }
}

/// Cut a mesh with a plane.
///
/// `plane_to_world` maps the plane's local frame to world space; the plane
/// is its local z = 0 and it must be rigid (rotation plus translation).
/// Returned loops are in plane-local coordinates with z ≈ 0. An empty `Vec`
/// means no triangle crosses the plane.
pub fn section_mesh(
    mesh: &TriangleMesh,
    plane_to_world: &AffineTransform,
    settings: &SectionSettings,
) -> Result<Vec<SectionLoop>> {
    section_buffers(&mesh.vertices, &mesh.indices, plane_to_world, settings)
}

/// [`section_mesh`] on flat vertex and index buffers.
pub fn section_buffers(
    vertices: &[f64],
    indices: &[u32],
    plane_to_world: &AffineTransform,
    settings: &SectionSettings,
) -> Result<Vec<SectionLoop>> {
    settings.validate()?;
    mesh::validate_buffers(vertices, indices)?;

    if !plane_to_world.is_orthonormal(1e-6) {
        warn!("plane transform is not rigid; section coordinates will be distorted");
    }

    let tol = &settings.tolerance;
    let local = to_plane_local(vertices, plane_to_world);
    let segments = slice_triangles(&local, indices, tol);

    if segments.is_empty() {
        debug!(triangles = indices.len() / 3, "plane misses the mesh");
        return Ok(Vec::new());
    }

    if !settings.connect_loops {
        return Ok(vec![unconnected_loop(&segments)]);
    }

    let loops: Vec<SectionLoop> = assemble_loops(&segments, tol)
        .into_iter()
        .map(|section| {
            let section = if settings.simplify_lines {
                merge_collinear(&section, tol)
            } else {
                section
            };
            if settings.simplify_arcs {
                fit_arcs(&section, settings.min_arc_points, tol)
            } else {
                section
            }
        })
        .collect();

    debug!(
        segments = segments.len(),
        loops = loops.len(),
        points = loops.iter().map(SectionLoop::len).sum::<usize>(),
        "sectioned mesh"
    );

    Ok(loops)
}
