use std::collections::HashMap;

use crate::math::Point3;

/// Smallest cell size accepted by [`PointGrid`].
const MIN_CELL: f64 = 1e-6;

/// Uniform spatial hash over point indices.
pub(super) struct PointGrid {
    cell: f64,
    cells: HashMap<(i64, i64, i64), Vec<usize>>,
}

impl PointGrid {
    pub(super) fn new(cell: f64) -> Self {
        Self {
            cell: cell.max(MIN_CELL),
            cells: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub(super) fn key(&self, p: &Point3) -> (i64, i64, i64) {
        (
            (p.x / self.cell).floor() as i64,
            (p.y / self.cell).floor() as i64,
            (p.z / self.cell).floor() as i64,
        )
    }

    pub(super) fn insert(&mut self, p: &Point3, index: usize) {
        let key = self.key(p);
        self.cells.entry(key).or_default().push(index);
    }

    /// Indices stored in the `(2 * reach + 1)³` block of cells around `p`.
    pub(super) fn around(&self, p: &Point3, reach: i64) -> impl Iterator<Item = usize> + '_ {
        let (ix, iy, iz) = self.key(p);
        (-reach..=reach)
            .flat_map(move |dx| (-reach..=reach).flat_map(move |dy| (-reach..=reach).map(move |dz| (dx, dy, dz))))
            .filter_map(move |(dx, dy, dz)| self.cells.get(&(ix + dx, iy + dy, iz + dz)))
            .flatten()
            .copied()
    }
}

/// Greedy deduplication: keeps each point (in input order) unless a kept
/// point lies closer than `min_distance`.
///
/// Non-finite points are dropped.
#[must_use]
pub fn dedup_points_grid(points: &[Point3], min_distance: f64) -> Vec<Point3> {
    let d = if min_distance.is_finite() { min_distance.max(MIN_CELL) } else { MIN_CELL };
    let finite = points.iter().filter(|p| p.coords.iter().all(|c| c.is_finite()));
    if points.len() <= 1 {
        return finite.copied().collect();
    }

    let mut grid = PointGrid::new(d);
    let mut kept: Vec<Point3> = Vec::new();
    for p in finite {
        if grid.around(p, 1).any(|j| (p - kept[j]).norm() < d) {
            continue;
        }
        grid.insert(p, kept.len());
        kept.push(*p);
    }
    kept
}
