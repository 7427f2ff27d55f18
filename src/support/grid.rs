use std::ops::Range;

use crate::error::{Result, VoxelError};
use crate::math::{Point3, UvwFrame, Vector3};
use crate::region::{sort_slices, SliceGeometry};

/// Placement of the image volume that shell masks are rasterized on.
///
/// Column index grows along `frame.u`, row index along `frame.v` and slice
/// index along `frame.w`. `origin` is the patient position of voxel
/// `(0, 0, 0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    pub cols: usize,
    pub rows: usize,
    pub depth: usize,
    pub col_spacing: f64,
    pub row_spacing: f64,
    pub slice_spacing: f64,
    pub origin: Point3,
    pub frame: UvwFrame,
}

impl VoxelGrid {
    /// Builds the grid from slice placements.
    ///
    /// Slices are ordered along the stacking axis; pixel spacing comes from
    /// the first slice and slice spacing is the mean positive distance
    /// between neighbours, or `fallback_thickness` with fewer than two
    /// distinct slices.
    ///
    /// # Errors
    ///
    /// Returns [`VoxelError::InvalidDimensions`] if there are no slices or
    /// `rows`/`cols` is zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_slices(slices: &[SliceGeometry], rows: usize, cols: usize, fallback_thickness: f64) -> Result<Self> {
        if slices.is_empty() || rows == 0 || cols == 0 {
            return Err(VoxelError::InvalidDimensions(cols, rows, slices.len()).into());
        }
        let mut sorted = slices.to_vec();
        let offsets = sort_slices(&mut sorted);
        let first = &sorted[0];

        let deltas: Vec<f64> = offsets
            .windows(2)
            .map(|w| (w[1] - w[0]).abs())
            .filter(|d| d.is_finite() && *d > 0.0)
            .collect();
        let slice_spacing = if deltas.is_empty() {
            positive_or_one(fallback_thickness)
        } else {
            deltas.iter().sum::<f64>() / deltas.len() as f64
        };

        Ok(Self {
            cols,
            rows,
            depth: sorted.len(),
            col_spacing: positive_or_one(first.pixel_spacing[1]),
            row_spacing: positive_or_one(first.pixel_spacing[0]),
            slice_spacing,
            origin: first.image_position,
            frame: first.frame(),
        })
    }

    /// Volume of one voxel (mm³).
    #[must_use]
    pub fn voxel_volume(&self) -> f64 {
        self.col_spacing * self.row_spacing * self.slice_spacing
    }

    /// Continuous voxel coordinates `(col, row, slice)` of a patient point.
    #[must_use]
    pub fn to_voxel(&self, patient: &Point3) -> Vector3 {
        let rel = self.frame.to_uvw(patient) - self.frame.to_uvw(&self.origin);
        Vector3::new(rel.x / self.col_spacing, rel.y / self.row_spacing, rel.z / self.slice_spacing)
    }

    /// Patient position of continuous voxel coordinates `(col, row, slice)`.
    #[must_use]
    pub fn to_patient(&self, col: f64, row: f64, slice: f64) -> Point3 {
        self.origin
            + self.frame.u * (col * self.col_spacing)
            + self.frame.v * (row * self.row_spacing)
            + self.frame.w * (slice * self.slice_spacing)
    }
}

fn positive_or_one(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        1.0
    }
}

/// A sub-box of a [`VoxelGrid`], addressed with box-local `x` (column), `y`
/// (row) and `z` (slice) indices. `x` varies fastest in box-local buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelBox {
    pub origin_col: usize,
    pub origin_row: usize,
    pub origin_slice: usize,
    pub size_x: usize,
    pub size_y: usize,
    pub size_z: usize,
}

impl VoxelBox {
    /// Linear index of box-local voxel `(x, y, z)`.
    #[must_use]
    pub fn index3(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.size_x * (y + self.size_y * z)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.size_x * self.size_y * self.size_z
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn dims(&self) -> [usize; 3] {
        [self.size_x, self.size_y, self.size_z]
    }

    /// Range of one box-local slice within a box buffer.
    #[must_use]
    pub fn slice_range(&self, z: usize) -> Range<usize> {
        let plane = self.size_x * self.size_y;
        z * plane..(z + 1) * plane
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn slice(z: f64) -> SliceGeometry {
        SliceGeometry {
            image_position: Point3::new(-10.0, -20.0, z),
            row_cosine: Vector3::x(),
            col_cosine: Vector3::y(),
            pixel_spacing: [0.5, 0.8],
            sop_instance_uid: None,
        }
    }

    #[test]
    fn grid_from_unsorted_slices() {
        let slices = vec![slice(6.0), slice(0.0), slice(3.0)];
        let grid = VoxelGrid::from_slices(&slices, 64, 32, 2.0).unwrap();
        assert_eq!((grid.cols, grid.rows, grid.depth), (32, 64, 3));
        assert_relative_eq!(grid.slice_spacing, 3.0);
        assert_relative_eq!(grid.row_spacing, 0.5);
        assert_relative_eq!(grid.col_spacing, 0.8);
        assert_relative_eq!(grid.origin.z, 0.0);
    }

    #[test]
    fn single_slice_uses_fallback() {
        let grid = VoxelGrid::from_slices(&[slice(1.0)], 4, 4, 2.5).unwrap();
        assert_relative_eq!(grid.slice_spacing, 2.5);
        let grid = VoxelGrid::from_slices(&[slice(1.0)], 4, 4, 0.0).unwrap();
        assert_relative_eq!(grid.slice_spacing, 1.0);
    }

    #[test]
    fn voxel_round_trip() {
        let grid = VoxelGrid::from_slices(&[slice(0.0), slice(2.0)], 8, 8, 1.0).unwrap();
        let p = grid.to_patient(3.0, 5.0, 1.0);
        assert_relative_eq!(p, Point3::new(-10.0 + 2.4, -20.0 + 2.5, 2.0), epsilon = 1e-12);
        assert_relative_eq!(grid.to_voxel(&p), Vector3::new(3.0, 5.0, 1.0), epsilon = 1e-12);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(VoxelGrid::from_slices(&[], 4, 4, 1.0).is_err());
        assert!(VoxelGrid::from_slices(&[slice(0.0)], 0, 4, 1.0).is_err());
    }

    #[test]
    fn box_indexing() {
        let b = VoxelBox {
            origin_col: 3,
            origin_row: 4,
            origin_slice: 5,
            size_x: 4,
            size_y: 3,
            size_z: 2,
        };
        assert_eq!(b.len(), 24);
        assert_eq!(b.index3(0, 0, 0), 0);
        assert_eq!(b.index3(3, 2, 1), 23);
        assert_eq!(b.index3(1, 1, 0), 5);
        assert_eq!(b.slice_range(1), 12..24);
    }
}
