use crate::math::polygon_2d::{loop_centroid, signed_area};
use crate::math::{Point3, AREA_EPS};

use super::{Bounds3d, Region};

/// Volume-weighted centroid of a region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionCentroid {
    /// Centroid in UVW coordinates.
    pub uvw: Point3,
    /// Centroid in patient coordinates.
    pub patient: Point3,
    /// Volume the centroid was accumulated over (mm³).
    pub volume: f64,
}

impl Region {
    /// Bounds of the outer loops in `u`/`v` and the layer slabs in `w`.
    ///
    /// Returns `None` for a region without any polygon vertex.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds3d> {
        let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for layer in self.layers() {
            let half = layer.thickness / 2.0;
            min.z = min.z.min(layer.z_center - half);
            max.z = max.z.max(layer.z_center + half);
            for p in layer.polygons.iter().flat_map(|poly| &poly.outer) {
                min.x = min.x.min(p.x);
                min.y = min.y.min(p.y);
                max.x = max.x.max(p.x);
                max.y = max.y.max(p.y);
            }
        }
        min.x.is_finite().then_some(Bounds3d { min, max })
    }

    /// Centroid of the region, accumulated layer by layer.
    ///
    /// Each polygon contributes its hole-corrected area centroid weighted by
    /// `area * thickness`. Polygons with near-zero effective area are
    /// skipped.
    #[must_use]
    pub fn centroid(&self) -> Option<RegionCentroid> {
        let mut volume = 0.0;
        let mut sum = Point3::origin().coords;
        for layer in self.layers() {
            for poly in &layer.polygons {
                let outer = loop_centroid(&poly.outer);
                let mut area = outer.area;
                let mut cu = outer.centroid.x * outer.area;
                let mut cv = outer.centroid.y * outer.area;
                for hole in &poly.holes {
                    let h = loop_centroid(hole);
                    // Holes wind clockwise, so their signed area is negative;
                    // subtract the magnitude.
                    area -= h.area.abs();
                    cu -= h.centroid.x * h.area.abs();
                    cv -= h.centroid.y * h.area.abs();
                }
                if !area.is_finite() || area.abs() < AREA_EPS {
                    continue;
                }
                let dv = area.abs() * layer.thickness;
                volume += dv;
                sum.x += cu / area * dv;
                sum.y += cv / area * dv;
                sum.z += layer.z_center * dv;
            }
        }
        if volume <= 0.0 {
            return None;
        }
        let uvw = Point3::from(sum / volume);
        Some(RegionCentroid {
            uvw,
            patient: self.frame().to_patient(&uvw),
            volume,
        })
    }

    /// Total volume (mm³): filled area minus holes, times layer thickness.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.layers()
            .iter()
            .map(|layer| {
                let area: f64 = layer
                    .polygons
                    .iter()
                    .map(|poly| {
                        let holes: f64 = poly.holes.iter().map(|h| signed_area(h).abs()).sum();
                        (signed_area(&poly.outer).abs() - holes).max(0.0)
                    })
                    .sum();
                area * layer.thickness
            })
            .sum()
    }
}
