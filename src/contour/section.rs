use std::f64::consts::TAU;

use crate::error::{Result, VoxelError};
use crate::math::{Point3, UvwFrame};
use crate::support::{VoxelBox, VoxelGrid};

use super::{mask_to_edge_loops, simplify_grid_loop};

/// Fewest segments of a cross-section circle.
pub const MIN_CIRCLE_SEGMENTS: usize = 12;

/// Circle where a sphere meets the slice plane at stacking offset `slice_w`.
///
/// Points are in patient coordinates; the first point is repeated at the
/// end. Returns `None` if the plane misses the sphere.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sphere_cross_section(
    center: &Point3,
    radius: f64,
    slice_w: f64,
    frame: &UvwFrame,
    segments: usize,
) -> Option<Vec<Point3>> {
    let dz = slice_w - frame.offset(center);
    if !dz.is_finite() || dz.abs() > radius {
        return None;
    }
    let rz = (radius * radius - dz * dz).max(0.0).sqrt();
    let on_plane = center + frame.w * dz;
    let n = segments.max(MIN_CIRCLE_SEGMENTS);

    let mut points: Vec<Point3> = (0..n)
        .map(|i| {
            let t = TAU * i as f64 / n as f64;
            on_plane + frame.u * (t.cos() * rz) + frame.v * (t.sin() * rz)
        })
        .collect();
    points.push(points[0]);
    Some(points)
}

/// Boundary loops of slice `z` of a box-local mask, in patient coordinates.
///
/// Pixel corner `(x, y)` maps to grid column `origin_col + x` and row
/// `origin_row + y`; loops are simplified before mapping.
///
/// # Errors
///
/// Returns [`VoxelError::MaskLength`] if `mask` does not cover the box and
/// [`VoxelError::InvalidDimensions`] if `z` lies outside it.
#[allow(clippy::cast_precision_loss)]
pub fn shell_slice_loops(grid: &VoxelGrid, voxel_box: &VoxelBox, mask: &[u8], z: usize) -> Result<Vec<Vec<Point3>>> {
    if mask.len() != voxel_box.len() {
        return Err(VoxelError::MaskLength {
            expected: voxel_box.len(),
            actual: mask.len(),
        }
        .into());
    }
    if z >= voxel_box.size_z {
        return Err(VoxelError::InvalidDimensions(voxel_box.size_x, voxel_box.size_y, z).into());
    }

    let plane = &mask[voxel_box.slice_range(z)];
    let slice = (voxel_box.origin_slice + z) as f64;
    Ok(mask_to_edge_loops(plane, voxel_box.size_y, voxel_box.size_x)?
        .iter()
        .map(|ring| {
            simplify_grid_loop(ring)
                .into_iter()
                .map(|[x, y]| {
                    grid.to_patient(
                        (voxel_box.origin_col + x) as f64,
                        (voxel_box.origin_row + y) as f64,
                        slice,
                    )
                })
                .collect()
        })
        .collect())
}
