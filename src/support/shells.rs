use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::lattice::{Sphere, SphereKind};
use crate::math::distance_transform::edt_3d_squared;
use crate::math::Vector3;

use super::{VoxelBox, VoxelGrid};

/// Slack added to the squared thresholds (mm²).
const THRESHOLD_EPS: f64 = 1e-6;
/// Box padding in voxels around the padded sphere union, in-plane.
const PAD_IN_PLANE: f64 = 2.0;
/// Box padding in voxels along the stacking axis.
const PAD_SLICES: f64 = 1.0;

/// Voxel index `v + offset` clamped to `[0, n - 1]`. Clamping happens in
/// `f64`, so an unbounded reach saturates at the grid edge.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn clamp_index(v: f64, offset: f64, n: usize) -> usize {
    (v + offset).clamp(0.0, n.saturating_sub(1) as f64) as usize
}

/// Shell widths (mm), measured outward from the sphere union.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShellThickness {
    pub inner: f64,
    pub mid: f64,
    pub outer: f64,
}

impl ShellThickness {
    #[must_use]
    pub fn new(inner: f64, mid: f64, outer: f64) -> Self {
        Self { inner, mid, outer }
    }

    /// Cumulative outer radii of the three shells; negative or non-finite
    /// widths count as zero.
    fn cumulative(&self) -> [f64; 3] {
        let clean = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let t1 = clean(self.inner);
        let t2 = t1 + clean(self.mid);
        [t1, t2, t2 + clean(self.outer)]
    }
}

/// Approximate shell volumes in cubic centimetres.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShellVolumes {
    pub inner: f64,
    pub mid: f64,
    pub outer: f64,
}

/// Disjoint shell masks over a common voxel box.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportShells {
    pub voxel_box: VoxelBox,
    pub inner: Vec<u8>,
    pub mid: Vec<u8>,
    pub outer: Vec<u8>,
    pub volumes_cc: ShellVolumes,
}

/// Builds distance shells around the union of primary spheres.
///
/// Voxels outside the union whose distance to it is at most `t1`, `t2` or
/// `t3` (the cumulative widths) land in the inner, mid or outer mask
/// respectively.
pub struct BuildSupportShells<'a> {
    grid: &'a VoxelGrid,
    spheres: &'a [Sphere],
    thickness: ShellThickness,
}

/// A sphere in continuous voxel coordinates.
struct VoxelSphere {
    center: Vector3,
    radius: f64,
}

impl<'a> BuildSupportShells<'a> {
    #[must_use]
    pub fn new(grid: &'a VoxelGrid, spheres: &'a [Sphere], thickness: ShellThickness) -> Self {
        Self {
            grid,
            spheres,
            thickness,
        }
    }

    /// Executes the operation.
    ///
    /// Returns `Ok(None)` if there is no primary sphere or every width is
    /// zero.
    ///
    /// # Errors
    ///
    /// Propagates [`VoxelError`](crate::error::VoxelError) from the distance
    /// transform, which only occurs for an empty grid.
    #[instrument(skip_all, fields(spheres = self.spheres.len()))]
    #[allow(clippy::cast_precision_loss)]
    pub fn execute(&self) -> Result<Option<SupportShells>> {
        let [t1, t2, t3] = self.thickness.cumulative();
        if t3 <= 0.0 {
            return Ok(None);
        }
        let grid = self.grid;
        let spheres: Vec<VoxelSphere> = self
            .spheres
            .iter()
            .filter(|s| s.kind == SphereKind::Primary)
            .map(|s| VoxelSphere {
                center: grid.to_voxel(&s.center),
                radius: s.radius.max(0.0),
            })
            .collect();
        if spheres.is_empty() || grid.cols == 0 || grid.rows == 0 || grid.depth == 0 {
            return Ok(None);
        }

        let voxel_box = self.padded_box(&spheres, t3);
        let base = self.rasterize(&spheres, &voxel_box);
        let dt = edt_3d_squared(
            &base,
            voxel_box.dims(),
            [grid.col_spacing, grid.row_spacing, grid.slice_spacing],
        )?;

        let n = voxel_box.len();
        let (s1, s2, s3) = (t1 * t1, t2 * t2, t3 * t3);
        let mut inner = vec![0u8; n];
        let mut mid = vec![0u8; n];
        let mut outer = vec![0u8; n];
        let mut counts = [0usize; 3];
        for i in 0..n {
            if base[i] != 0 {
                continue;
            }
            let d2 = dt[i];
            if d2 <= s1 + THRESHOLD_EPS {
                inner[i] = 1;
                counts[0] += 1;
            } else if d2 <= s2 + THRESHOLD_EPS {
                mid[i] = 1;
                counts[1] += 1;
            } else if d2 <= s3 + THRESHOLD_EPS {
                outer[i] = 1;
                counts[2] += 1;
            }
        }

        let cc = |count: usize| count as f64 * grid.voxel_volume() / 1000.0;
        let volumes_cc = ShellVolumes {
            inner: cc(counts[0]),
            mid: cc(counts[1]),
            outer: cc(counts[2]),
        };
        info!(
            inner_cc = volumes_cc.inner,
            mid_cc = volumes_cc.mid,
            outer_cc = volumes_cc.outer,
            "support shells built"
        );

        Ok(Some(SupportShells {
            voxel_box,
            inner,
            mid,
            outer,
            volumes_cc,
        }))
    }

    /// Integer box around all spheres grown by `pad_mm`, plus a safety
    /// margin, clamped to the grid.
    fn padded_box(&self, spheres: &[VoxelSphere], pad_mm: f64) -> VoxelBox {
        let grid = self.grid;
        let spacing = Vector3::new(grid.col_spacing, grid.row_spacing, grid.slice_spacing);
        let mut lo = Vector3::repeat(f64::INFINITY);
        let mut hi = Vector3::repeat(f64::NEG_INFINITY);
        for s in spheres {
            let reach = Vector3::repeat(s.radius + pad_mm).component_div(&spacing);
            lo = lo.inf(&(s.center - reach));
            hi = hi.sup(&(s.center + reach));
        }

        let (c0, c1) = (
            clamp_index(lo.x.floor(), -PAD_IN_PLANE, grid.cols),
            clamp_index(hi.x.ceil(), PAD_IN_PLANE, grid.cols),
        );
        let (r0, r1) = (
            clamp_index(lo.y.floor(), -PAD_IN_PLANE, grid.rows),
            clamp_index(hi.y.ceil(), PAD_IN_PLANE, grid.rows),
        );
        let (k0, k1) = (
            clamp_index(lo.z.floor(), -PAD_SLICES, grid.depth),
            clamp_index(hi.z.ceil(), PAD_SLICES, grid.depth),
        );
        let voxel_box = VoxelBox {
            origin_col: c0,
            origin_row: r0,
            origin_slice: k0,
            size_x: c1 - c0 + 1,
            size_y: r1 - r0 + 1,
            size_z: k1 - k0 + 1,
        };
        debug!(?voxel_box, "shell voxel box");
        voxel_box
    }

    /// Binary mask of the sphere union over `voxel_box`, tested at voxel
    /// centers in physical units.
    #[allow(clippy::cast_precision_loss)]
    fn rasterize(&self, spheres: &[VoxelSphere], voxel_box: &VoxelBox) -> Vec<u8> {
        let grid = self.grid;
        let mut base = vec![0u8; voxel_box.len()];
        let origin = [voxel_box.origin_col, voxel_box.origin_row, voxel_box.origin_slice];
        let dims = voxel_box.dims();
        let spacing = [grid.col_spacing, grid.row_spacing, grid.slice_spacing];

        // Box-local index range covering `[c - r, c + r]` on one axis.
        let span = |axis: usize, c: f64, r: f64| {
            let o = origin[axis] as f64;
            let a = clamp_index((c - r).floor(), -o - 1.0, dims[axis]);
            let b = clamp_index((c + r).ceil(), 1.0 - o, dims[axis]);
            a..=b
        };

        for s in spheres {
            if s.radius <= 0.0 {
                continue;
            }
            let r2 = s.radius * s.radius;
            let c = s.center;
            for z in span(2, c.z, s.radius / spacing[2]) {
                let dz = ((origin[2] + z) as f64 - c.z) * spacing[2];
                let dz2 = dz * dz;
                if dz2 > r2 {
                    continue;
                }
                for y in span(1, c.y, s.radius / spacing[1]) {
                    let dy = ((origin[1] + y) as f64 - c.y) * spacing[1];
                    let dyz2 = dy * dy + dz2;
                    if dyz2 > r2 {
                        continue;
                    }
                    for x in span(0, c.x, s.radius / spacing[0]) {
                        let dx = ((origin[0] + x) as f64 - c.x) * spacing[0];
                        if dx * dx + dyz2 <= r2 {
                            base[voxel_box.index3(x, y, z)] = 1;
                        }
                    }
                }
            }
        }
        base
    }
}
