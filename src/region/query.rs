use std::f64::consts::PI;
use std::sync::OnceLock;

use crate::error::{RegionError, Result};
use crate::math::polygon_2d::point_in_loop;
use crate::math::{Point2, Point3, Vector3};

use super::{Layer, Polygon, Region};

/// Extra slack (mm) when matching an offset to a layer's slab.
pub const LAYER_SLACK: f64 = 1e-3;

/// Number of surface directions sampled by [`Region::sphere_fully_inside`].
pub const SURFACE_SAMPLES: usize = 64;

/// Inward bias (mm) applied to the sampled radius.
pub const INWARD_BIAS: f64 = 0.25;

/// Roughly uniform unit directions on a golden-angle spiral.
///
/// At least 8 directions are produced. The first and last point at the
/// poles of the second axis.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn fibonacci_sphere_directions(n: usize) -> Vec<Vector3> {
    let m = n.max(8);
    let golden = PI * (3.0 - 5.0_f64.sqrt());
    (0..m)
        .map(|i| {
            let y = 1.0 - (i as f64 / (m - 1) as f64) * 2.0;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden * i as f64;
            Vector3::new(theta.cos() * r, y, theta.sin() * r)
        })
        .collect()
}

fn surface_directions() -> &'static [Vector3] {
    static DIRS: OnceLock<Vec<Vector3>> = OnceLock::new();
    DIRS.get_or_init(|| fibonacci_sphere_directions(SURFACE_SAMPLES))
}

impl Polygon {
    /// Inside the outer loop and outside every hole.
    #[must_use]
    pub fn contains(&self, pt: &Point2) -> bool {
        point_in_loop(pt, &self.outer) && !self.holes.iter().any(|h| point_in_loop(pt, h))
    }
}

impl Layer {
    /// Inside any polygon of the layer.
    #[must_use]
    pub fn contains(&self, pt: &Point2) -> bool {
        self.polygons.iter().any(|p| p.contains(pt))
    }
}

impl Region {
    /// Finds the layer whose slab contains stacking-axis offset `w`.
    ///
    /// Only the two layers bracketing `w` are considered; the closer one wins
    /// if `w` is within half its thickness plus [`LAYER_SLACK`].
    #[must_use]
    pub fn find_layer(&self, w: f64) -> Option<&Layer> {
        let layers = self.layers();
        let lo = layers.partition_point(|l| l.z_center < w);
        let candidates = [layers.get(lo), lo.checked_sub(1).and_then(|i| layers.get(i))];
        candidates
            .into_iter()
            .flatten()
            .map(|l| (l, (w - l.z_center).abs()))
            .filter(|(l, dist)| *dist <= l.thickness / 2.0 + LAYER_SLACK)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(l, _)| l)
    }

    /// Like [`find_layer`](Self::find_layer), reporting why no layer matched.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError::Empty`] for a region without layers and
    /// [`RegionError::NoLayerForOffset`] when no slab contains `w`.
    pub fn layer_at(&self, w: f64) -> Result<&Layer> {
        if self.is_empty() {
            return Err(RegionError::Empty.into());
        }
        self.find_layer(w).ok_or_else(|| RegionError::NoLayerForOffset(w).into())
    }

    /// Tests whether a UVW point lies inside the region.
    #[must_use]
    pub fn contains_point(&self, uvw: &Point3) -> bool {
        self.find_layer(uvw.z)
            .is_some_and(|layer| layer.contains(&Point2::new(uvw.x, uvw.y)))
    }

    /// Approximate test that a sphere lies entirely inside the region.
    ///
    /// Samples [`SURFACE_SAMPLES`] directions at `radius - INWARD_BIAS` from
    /// `center` (UVW); every sample must be inside.
    #[must_use]
    pub fn sphere_fully_inside(&self, center: &Point3, radius: f64) -> bool {
        let r = (radius - INWARD_BIAS).max(0.0);
        surface_directions()
            .iter()
            .all(|d| self.contains_point(&(center + d * r)))
    }
}
