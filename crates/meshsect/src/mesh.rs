//! Indexed triangle mesh buffers and the move into plane-local space.

use meshsect_math::{AffineTransform, Point3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SectionError};

/// Indexed triangle soup as handed over by the host.
///
/// Vertices do not need to be shared between triangles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]`.
    pub vertices: Vec<f64>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]`.
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    /// Create a mesh from flat buffers.
    pub fn new(vertices: Vec<f64>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Is the mesh free of triangles?
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of vertex `index`.
    ///
    /// Panics if `index` is out of range; call [`Self::validate`] first.
    pub fn vertex(&self, index: usize) -> Point3 {
        vertex_at(&self.vertices, index)
    }

    /// Check that the buffers describe a well-formed triangle soup.
    pub fn validate(&self) -> Result<()> {
        validate_buffers(&self.vertices, &self.indices)
    }

    /// Axis-aligned bounds as `(min, max)`, or `None` for an empty vertex buffer.
    pub fn bounds(&self) -> Option<([f64; 3], [f64; 3])> {
        if self.vertices.len() < 3 {
            return None;
        }

        let mut min = [f64::MAX; 3];
        let mut max = [f64::MIN; 3];

        for v in self.vertices.chunks_exact(3) {
            for axis in 0..3 {
                min[axis] = min[axis].min(v[axis]);
                max[axis] = max[axis].max(v[axis]);
            }
        }

        Some((min, max))
    }
}

pub(crate) fn vertex_at(vertices: &[f64], index: usize) -> Point3 {
    Point3::new(
        vertices[index * 3],
        vertices[index * 3 + 1],
        vertices[index * 3 + 2],
    )
}

pub(crate) fn validate_buffers(vertices: &[f64], indices: &[u32]) -> Result<()> {
    if vertices.len() % 3 != 0 {
        return Err(SectionError::MalformedVertices(vertices.len()));
    }
    if indices.len() % 3 != 0 {
        return Err(SectionError::MalformedIndices(indices.len()));
    }
    let vertex_count = vertices.len() / 3;
    if let Some((pos, &index)) = indices
        .iter()
        .enumerate()
        .find(|(_, i)| **i as usize >= vertex_count)
    {
        return Err(SectionError::IndexOutOfRange {
            triangle: pos / 3,
            index,
            vertex_count,
        });
    }
    Ok(())
}

/// Move a flat vertex buffer into the cutting plane's local frame.
///
/// `plane_to_world` maps plane-local coordinates to world coordinates; its
/// rigid inverse is applied to every vertex so the cutting plane becomes
/// z = 0. A transform with scale or shear gives meaningless output.
pub fn to_plane_local(vertices: &[f64], plane_to_world: &AffineTransform) -> Vec<f64> {
    let world_to_plane = plane_to_world.inverse_orthonormal();

    vertices
        .par_chunks_exact(3)
        .flat_map_iter(|v| {
            let p = world_to_plane.apply_point(&Point3::new(v[0], v[1], v[2]));
            [p.x, p.y, p.z]
        })
        .collect()
}
