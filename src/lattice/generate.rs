use std::f64::consts::SQRT_2;

use crate::math::{Point3, Vector3};
use crate::region::Bounds3d;

use super::Packing;

/// Number of cells along an axis covering `span` plus a margin of one cell
/// on the low side and two on the high side.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cell_count(span: f64, step: f64) -> usize {
    (span.max(0.0) / step).ceil() as usize + 3
}

/// HCP primitive cell for a given nearest-neighbour spacing, anchored one
/// cell below the bounds.
///
/// `a2` leans toward negative `u`, so each row starts half a cell further
/// left than the one below; the column count is widened by half the row
/// count to keep the upper rows spanning the bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HcpCell {
    pub a1: Vector3,
    pub a2: Vector3,
    pub a3: Vector3,
    pub origin: Point3,
    pub counts: [usize; 3],
}

impl HcpCell {
    /// Builds the cell covering `bounds`.
    #[must_use]
    pub fn covering(spacing: f64, bounds: &Bounds3d) -> Self {
        let s = spacing;
        let c = (8.0_f64 / 3.0).sqrt() * s;
        let row = 3.0_f64.sqrt() / 2.0 * s;
        let span = bounds.span();
        let ny = cell_count(span.y, row);
        Self {
            a1: Vector3::new(s, 0.0, 0.0),
            a2: Vector3::new(-0.5 * s, row, 0.0),
            a3: Vector3::new(0.0, 0.0, c),
            origin: bounds.min - Vector3::new(s, s, c),
            counts: [cell_count(span.x, s) + ny / 2 + 1, ny, cell_count(span.z, c)],
        }
    }

    /// Cartesian position of fractional coordinates inside the cell.
    #[must_use]
    pub fn at(&self, f: Vector3) -> Vector3 {
        self.a1 * f.x + self.a2 * f.y + self.a3 * f.z
    }

    /// Origin of every cell, in `i`, `j`, `k` order.
    #[allow(clippy::cast_precision_loss)]
    pub fn cells(&self) -> impl Iterator<Item = Point3> + '_ {
        let [nx, ny, nz] = self.counts;
        (0..nx).flat_map(move |i| {
            (0..ny).flat_map(move |j| {
                (0..nz).map(move |k| {
                    self.origin + self.a1 * i as f64 + self.a2 * j as f64 + self.a3 * k as f64
                })
            })
        })
    }
}

/// Enumerates lattice points of `packing` covering `bounds` plus a margin.
///
/// Returns an empty list for a non-positive or non-finite spacing.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn lattice_centers(packing: Packing, spacing: f64, bounds: &Bounds3d) -> Vec<Point3> {
    if !(spacing.is_finite() && spacing > 0.0) {
        return Vec::new();
    }

    if packing == Packing::Hcp {
        let cell = HcpCell::covering(spacing, bounds);
        let basis = [Vector3::zeros(), cell.at(Vector3::new(1.0 / 3.0, 2.0 / 3.0, 0.5))];
        return cell
            .cells()
            .flat_map(|origin| basis.map(|b| origin + b))
            .collect();
    }

    let step = match packing {
        Packing::AlternatingCubic => spacing / SQRT_2,
        _ => spacing,
    };
    let span = bounds.span();
    let counts = [
        cell_count(span.x, step),
        cell_count(span.y, step),
        cell_count(span.z, step),
    ];
    let origin = bounds.min - Vector3::repeat(step);

    let mut centers = Vec::new();
    for iu in 0..counts[0] {
        for iv in 0..counts[1] {
            for iw in 0..counts[2] {
                if packing == Packing::AlternatingCubic && (iu + iv + iw) % 2 != 0 {
                    continue;
                }
                centers.push(origin + Vector3::new(iu as f64, iv as f64, iw as f64) * step);
            }
        }
    }
    centers
}
