use tracing::{debug, instrument, warn};

use crate::math::{Point2, Point3, Vector3};
use crate::region::{Polygon, Region};

use super::{triangulate_polygon, TriangleMesh};

/// Builds a closed mesh of a region in UVW coordinates.
///
/// Every polygon of every layer becomes a prism spanning
/// `z_center ± thickness / 2`: a top cap facing `+w`, a bottom cap facing
/// `-w`, and one quad per loop edge whose normal is `edge × w`. Outer walls
/// thus face away from the polygon and hole walls face into the hole.
/// Polygons that cannot be triangulated are skipped.
pub struct BuildRegionMesh<'a> {
    region: &'a Region,
}

impl<'a> BuildRegionMesh<'a> {
    #[must_use]
    pub fn new(region: &'a Region) -> Self {
        Self { region }
    }

    #[instrument(skip_all, fields(layers = self.region.layers().len()))]
    #[must_use]
    pub fn execute(&self) -> TriangleMesh {
        let mut mesh = TriangleMesh::default();
        for layer in self.region.layers() {
            let z0 = layer.z_center - layer.thickness / 2.0;
            let z1 = layer.z_center + layer.thickness / 2.0;
            for polygon in &layer.polygons {
                extrude_polygon(&mut mesh, polygon, z0, z1);
            }
        }
        debug!(
            vertices = mesh.vertices.len(),
            triangles = mesh.triangle_count(),
            "region mesh built"
        );
        mesh
    }
}

fn extrude_polygon(mesh: &mut TriangleMesh, polygon: &Polygon, z0: f64, z1: f64) {
    let triangles = match triangulate_polygon(polygon) {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, "skipping polygon that could not be triangulated");
            return;
        }
    };

    let at = |p: &Point2, z: f64| Point3::new(p.x, p.y, z);
    for [a, b, c] in &triangles {
        let top = Vector3::z();
        let ia = mesh.push_vertex(at(a, z1), top);
        let ib = mesh.push_vertex(at(b, z1), top);
        let ic = mesh.push_vertex(at(c, z1), top);
        mesh.indices.push([ia, ib, ic]);

        let bottom = -Vector3::z();
        let ia = mesh.push_vertex(at(a, z0), bottom);
        let ib = mesh.push_vertex(at(b, z0), bottom);
        let ic = mesh.push_vertex(at(c, z0), bottom);
        mesh.indices.push([ia, ic, ib]);
    }

    for ring in std::iter::once(&polygon.outer).chain(&polygon.holes) {
        extrude_walls(mesh, ring, z0, z1);
    }
}

fn extrude_walls(mesh: &mut TriangleMesh, ring: &[Point2], z0: f64, z1: f64) {
    let n = ring.len();
    for i in 0..n {
        let (p, q) = (ring[i], ring[(i + 1) % n]);
        let edge = Vector3::new(q.x - p.x, q.y - p.y, 0.0);
        let Some(normal) = edge.cross(&Vector3::z()).try_normalize(0.0) else {
            continue;
        };
        let i0 = mesh.push_vertex(Point3::new(p.x, p.y, z0), normal);
        let i1 = mesh.push_vertex(Point3::new(q.x, q.y, z0), normal);
        let i2 = mesh.push_vertex(Point3::new(q.x, q.y, z1), normal);
        let i3 = mesh.push_vertex(Point3::new(p.x, p.y, z1), normal);
        mesh.indices.push([i0, i1, i2]);
        mesh.indices.push([i0, i2, i3]);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::UvwFrame;
    use crate::region::Layer;
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    fn region_of(polygons: Vec<Polygon>, z_center: f64, thickness: f64) -> Region {
        Region::from_layers(
            UvwFrame::default(),
            vec![Layer {
                z_center,
                thickness,
                polygons,
            }],
        )
    }

    #[allow(clippy::cast_precision_loss)]
    fn ngon(n: usize, r: f64) -> Vec<Point2> {
        (0..n)
            .map(|i| {
                let t = TAU * i as f64 / n as f64;
                Point2::new(r * t.cos() + 5.0, r * t.sin() - 3.0)
            })
            .collect()
    }

    #[test]
    fn convex_ngon_volume_round_trip() {
        for n in [3, 5, 8, 17] {
            let region = region_of(vec![Polygon::new(ngon(n, 12.0), vec![])], 7.0, 3.0);
            let mesh = BuildRegionMesh::new(&region).execute();
            assert_relative_eq!(mesh.signed_volume(), region.volume(), max_relative = 0.01);
        }
    }

    #[test]
    fn hole_volume_round_trip() {
        let outer = ngon(12, 10.0);
        let hole: Vec<Point2> = ngon(6, 4.0);
        let region = region_of(vec![Polygon::new(outer, vec![hole])], -2.0, 2.5);
        let mesh = BuildRegionMesh::new(&region).execute();
        assert_relative_eq!(mesh.signed_volume(), region.volume(), max_relative = 0.01);
    }

    #[test]
    fn unit_cube_structure() {
        let square = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let mesh = BuildRegionMesh::new(&region_of(vec![Polygon::new(square, vec![])], 0.5, 1.0)).execute();
        // 2 cap triangles top and bottom, 2 per wall
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.vertices.len(), mesh.normals.len());
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-12);

        // Wall along the bottom edge faces -v.
        assert!(mesh.normals.iter().any(|n| (n - Vector3::new(0.0, -1.0, 0.0)).norm() < 1e-12));
        assert!(mesh.normals.iter().any(|n| (n - Vector3::z()).norm() < 1e-12));
    }

    #[test]
    fn empty_region_gives_empty_mesh() {
        let region = Region::from_layers(UvwFrame::default(), vec![]);
        assert!(BuildRegionMesh::new(&region).execute().is_empty());
    }
}
