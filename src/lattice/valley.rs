use std::f64::consts::SQRT_2;

use tracing::warn;

use crate::math::{Point3, Vector3};
use crate::region::Bounds3d;

use super::dedup::PointGrid;
use super::HcpCell;

/// Upper bound on accepted pairs in [`midpoints_near_distance`].
pub const MAX_VALLEY_PAIRS: usize = 300_000;

/// Secondary sphere centers between primary lattice points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValleyCenters {
    /// Intra-layer interstitial positions.
    pub warm: Vec<Point3>,
    /// Inter-layer interstitial positions.
    pub cold: Vec<Point3>,
}

/// Analytic valley positions for the HCP lattice built by
/// [`lattice_centers`](super::lattice_centers) over the same bounds.
///
/// Per cell: two warm sites in the A layer at `(2a1+a2)/3` and `(a1+2a2)/3`,
/// the same two sites in the B layer (shifted by `(a1+2a2)/3 + a3/2`), and
/// two octahedral cold sites at planar offset `(2a1+a2)/3` and heights
/// `a3/4`, `3a3/4`.
#[must_use]
pub fn hcp_valley_centers(spacing: f64, bounds: &Bounds3d) -> ValleyCenters {
    if !(spacing.is_finite() && spacing > 0.0) {
        return ValleyCenters::default();
    }
    let cell = HcpCell::covering(spacing, bounds);
    let warm1 = cell.at(Vector3::new(2.0 / 3.0, 1.0 / 3.0, 0.0));
    let warm2 = cell.at(Vector3::new(1.0 / 3.0, 2.0 / 3.0, 0.0));
    let b_layer = warm2 + cell.a3 * 0.5;
    let cold1 = warm1 + cell.a3 * 0.25;
    let cold2 = warm1 + cell.a3 * 0.75;

    let mut out = ValleyCenters::default();
    for origin in cell.cells() {
        out.warm.extend([
            origin + warm1,
            origin + warm2,
            origin + b_layer + warm1,
            origin + b_layer + warm2,
        ]);
        out.cold.extend([origin + cold1, origin + cold2]);
    }
    out
}

/// Midpoints of all pairs whose distance is within `tolerance` of
/// `target`.
///
/// Pairs are found through a spatial hash with cell size `target`; at most
/// `max_pairs` midpoints are returned.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn midpoints_near_distance(
    points: &[Point3],
    target: f64,
    tolerance: f64,
    max_pairs: usize,
) -> Vec<Point3> {
    if points.len() < 2 || !target.is_finite() {
        return Vec::new();
    }
    let d0 = target.max(1e-6);
    let tol = if tolerance.is_finite() { tolerance.max(0.0) } else { 0.0 };

    let mut grid = PointGrid::new(d0);
    for (i, p) in points.iter().enumerate() {
        grid.insert(p, i);
    }
    let reach = ((d0 + tol) / d0).ceil().max(1.0) as i64;

    let mut out = Vec::new();
    for (i, a) in points.iter().enumerate() {
        for j in grid.around(a, reach) {
            if j <= i {
                continue;
            }
            let b = &points[j];
            if ((a - b).norm() - d0).abs() > tol {
                continue;
            }
            out.push(Point3::from((a.coords + b.coords) * 0.5));
            if out.len() >= max_pairs {
                warn!(max_pairs, "valley pair cap reached");
                return out;
            }
        }
    }
    out
}

/// Valley positions for the alternating cubic pattern.
///
/// `primary` must already be aligned and filtered. Warm sites are midpoints
/// of nearest-neighbour pairs (`s`), cold sites midpoints of next-nearest
/// pairs (`√2·s`).
#[must_use]
pub fn ac_valley_centers(primary: &[Point3], spacing: f64) -> ValleyCenters {
    let s = if spacing.is_finite() { spacing.max(0.0) } else { 0.0 };
    if primary.is_empty() || s == 0.0 {
        return ValleyCenters::default();
    }
    ValleyCenters {
        warm: midpoints_near_distance(primary, s, (0.08 * s).max(0.75), MAX_VALLEY_PAIRS),
        cold: midpoints_near_distance(primary, SQRT_2 * s, (0.10 * s).max(1.0), MAX_VALLEY_PAIRS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{lattice_centers, Packing};
    use approx::assert_abs_diff_eq;

    fn cube(side: f64) -> Bounds3d {
        Bounds3d {
            min: Point3::origin(),
            max: Point3::new(side, side, side),
        }
    }

    fn nearest(p: &Point3, set: &[Point3]) -> f64 {
        set.iter().map(|q| (p - q).norm()).fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn hcp_valleys_sit_between_primaries() {
        let s = 10.0;
        let b = cube(30.0);
        let primary = lattice_centers(Packing::Hcp, s, &b);
        let valleys = hcp_valley_centers(s, &b);
        assert_eq!(valleys.warm.len(), primary.len() * 2);
        assert_eq!(valleys.cold.len(), primary.len());

        // Trigonal sites sit s/√3 from three in-plane neighbours.
        let interior = |p: &&Point3| p.x > 10.0 && p.x < 20.0 && p.y > 10.0 && p.y < 20.0 && p.z > 10.0 && p.z < 20.0;
        for w in valleys.warm.iter().filter(interior) {
            assert_abs_diff_eq!(nearest(w, &primary), s / 3.0_f64.sqrt(), epsilon = 1e-9);
        }
        // Octahedral sites are s/√2 from their six neighbours.
        for c in valleys.cold.iter().filter(interior) {
            assert_abs_diff_eq!(nearest(c, &primary), s / SQRT_2, epsilon = 1e-9);
        }
    }

    #[test]
    fn midpoints_of_a_unit_grid() {
        let pts: Vec<Point3> = (0..3)
            .flat_map(|i| (0..3).map(move |j| Point3::new(f64::from(i), f64::from(j), 0.0)))
            .collect();
        // 12 axis-adjacent pairs in a 3x3 grid
        assert_eq!(midpoints_near_distance(&pts, 1.0, 0.01, usize::MAX).len(), 12);
        // 8 diagonal pairs
        assert_eq!(midpoints_near_distance(&pts, SQRT_2, 0.01, usize::MAX).len(), 8);
        assert_eq!(midpoints_near_distance(&pts, 1.0, 0.01, 5).len(), 5);
    }

    #[test]
    fn ac_valleys_from_primaries() {
        let s = 10.0;
        let primary = lattice_centers(Packing::AlternatingCubic, s, &cube(20.0));
        let valleys = ac_valley_centers(&primary, s);
        assert!(!valleys.warm.is_empty());
        assert!(!valleys.cold.is_empty());
        for w in &valleys.warm {
            assert_abs_diff_eq!(nearest(w, &primary), s / 2.0, epsilon = 1e-9);
        }
        // Next-nearest pairs lie along a cube axis; their midpoint is an
        // octahedral hole half that distance from both ends.
        for c in &valleys.cold {
            assert_abs_diff_eq!(nearest(c, &primary), SQRT_2 * s / 2.0, epsilon = 1e-9);
        }
        assert!(ac_valley_centers(&[], s).warm.is_empty());
    }
}
