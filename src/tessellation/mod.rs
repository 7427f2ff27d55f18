//! Closed triangle meshes of layered regions.

mod extrude;
mod triangulate;

pub use extrude::BuildRegionMesh;
pub use triangulate::triangulate_polygon;

use crate::math::{Point3, Vector3};

/// A triangle mesh with per-vertex normals.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

/// Flat render buffers: `positions`/`normals` hold `3n` values, `indices`
/// three per triangle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Appends a vertex and returns its index.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn push_vertex(&mut self, position: Point3, normal: Vector3) -> u32 {
        let idx = self.vertices.len() as u32;
        self.vertices.push(position);
        self.normals.push(normal);
        idx
    }

    /// Enclosed volume from the signed tetrahedra against the origin.
    ///
    /// Positive for a closed mesh whose triangles wind counter-clockwise
    /// seen from outside.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        self.indices
            .iter()
            .map(|&[a, b, c]| {
                let (a, b, c) = (
                    self.vertices[a as usize].coords,
                    self.vertices[b as usize].coords,
                    self.vertices[c as usize].coords,
                );
                a.dot(&b.cross(&c))
            })
            .sum::<f64>()
            / 6.0
    }

    /// Converts to single-precision render buffers.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn into_buffers(self) -> MeshBuffers {
        let flatten = |v: &[f64]| v.iter().map(|&x| x as f32).collect::<Vec<_>>();
        MeshBuffers {
            positions: self.vertices.iter().flat_map(|p| flatten(p.coords.as_slice())).collect(),
            normals: self.normals.iter().flat_map(|n| flatten(n.as_slice())).collect(),
            indices: self.indices.into_iter().flatten().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit right tetrahedron with outward winding.
    fn tetra() -> TriangleMesh {
        let mut mesh = TriangleMesh::default();
        for p in [
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ] {
            mesh.push_vertex(p, Vector3::zeros());
        }
        mesh.indices = vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
        mesh
    }

    #[test]
    fn tetra_volume() {
        assert!((tetra().signed_volume() - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn buffers_are_flat() {
        let buffers = tetra().into_buffers();
        assert_eq!(buffers.positions.len(), 12);
        assert_eq!(buffers.normals.len(), 12);
        assert_eq!(buffers.indices.len(), 12);
        assert_eq!(&buffers.positions[3..6], &[1.0, 0.0, 0.0]);
        assert_eq!(&buffers.indices[..3], &[0, 2, 1]);
    }
}
