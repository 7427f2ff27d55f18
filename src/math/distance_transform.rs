//! Exact squared Euclidean distance transform.
//!
//! The 1D kernel computes the lower envelope of parabolas rooted at every
//! sample (Felzenszwalb & Huttenlocher). Running it once per axis yields the
//! exact squared distance in 3D, with each axis weighted by its voxel spacing
//! squared so the result is in physical units (mm²).

use super::DIVISOR_EPS;
use crate::error::{Result, VoxelError};

/// Squared distance assigned to background samples before the transform.
pub const FAR: f64 = 1e20;

/// Reusable buffers for [`dt_1d_squared`].
#[derive(Debug, Default)]
pub struct EnvelopeScratch {
    vertices: Vec<usize>,
    bounds: Vec<f64>,
}

impl EnvelopeScratch {
    /// Allocates scratch space for rows of up to `n` samples.
    #[must_use]
    pub fn with_capacity(n: usize) -> Self {
        Self {
            vertices: vec![0; n.max(1)],
            bounds: vec![0.0; n + 1],
        }
    }

    fn reserve(&mut self, n: usize) {
        if self.vertices.len() < n {
            self.vertices.resize(n, 0);
        }
        if self.bounds.len() < n + 1 {
            self.bounds.resize(n + 1, 0.0);
        }
    }
}

/// One-dimensional squared distance transform of the sampled function `f`.
///
/// `out[q] = min_p (weight_sq * (q - p)² + f[p])`. `out` must be at least as
/// long as `f`.
#[allow(clippy::cast_precision_loss)]
pub fn dt_1d_squared(f: &[f64], weight_sq: f64, out: &mut [f64], scratch: &mut EnvelopeScratch) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let w2 = weight_sq.max(DIVISOR_EPS);
    scratch.reserve(n);
    let v = &mut scratch.vertices;
    let z = &mut scratch.bounds;

    let mut k = 0usize;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    for q in 1..n {
        let qf = q as f64;
        let mut s;
        loop {
            let p = v[k];
            let pf = p as f64;
            s = ((f[q] + w2 * qf * qf) - (f[p] + w2 * pf * pf)) / (2.0 * w2 * (qf - pf));
            if s <= z[k] && k > 0 {
                k -= 1;
            } else {
                break;
            }
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, slot) in out.iter_mut().enumerate().take(n) {
        let qf = q as f64;
        while z[k + 1] < qf {
            k += 1;
        }
        let p = v[k];
        let d = qf - p as f64;
        *slot = w2 * d * d + f[p];
    }
}

/// Squared distance (mm²) from every voxel to the nearest non-zero voxel of
/// `mask`.
///
/// `dims` is `[x, y, z]` with `x` varying fastest; `spacing` is the physical
/// voxel size along each of those axes. Foreground voxels map to `0.0`. If
/// the mask has no foreground every value stays at [`FAR`].
///
/// # Errors
///
/// Returns [`VoxelError::InvalidDimensions`] if any dimension is zero and
/// [`VoxelError::MaskLength`] if the mask does not match `dims`.
pub fn edt_3d_squared(mask: &[u8], dims: [usize; 3], spacing: [f64; 3]) -> Result<Vec<f64>> {
    let [bx, by, bz] = dims;
    if bx == 0 || by == 0 || bz == 0 {
        return Err(VoxelError::InvalidDimensions(bx, by, bz).into());
    }
    let n = bx * by * bz;
    if mask.len() != n {
        return Err(VoxelError::MaskLength {
            expected: n,
            actual: mask.len(),
        }
        .into());
    }

    let w2 = spacing.map(|s| (s * s).max(DIVISOR_EPS));
    let max_dim = bx.max(by).max(bz);
    let mut scratch = EnvelopeScratch::with_capacity(max_dim);
    let mut f = vec![0.0; max_dim];
    let mut out = vec![0.0; max_dim];
    let idx = |x: usize, y: usize, z: usize| x + bx * (y + by * z);

    let mut pass_x = vec![0.0; n];
    for z in 0..bz {
        for y in 0..by {
            let off = idx(0, y, z);
            for x in 0..bx {
                f[x] = if mask[off + x] != 0 { 0.0 } else { FAR };
            }
            dt_1d_squared(&f[..bx], w2[0], &mut out, &mut scratch);
            pass_x[off..off + bx].copy_from_slice(&out[..bx]);
        }
    }

    let mut pass_y = vec![0.0; n];
    for z in 0..bz {
        for x in 0..bx {
            for y in 0..by {
                f[y] = pass_x[idx(x, y, z)];
            }
            dt_1d_squared(&f[..by], w2[1], &mut out, &mut scratch);
            for y in 0..by {
                pass_y[idx(x, y, z)] = out[y];
            }
        }
    }

    let mut dist = pass_x;
    for y in 0..by {
        for x in 0..bx {
            for z in 0..bz {
                f[z] = pass_y[idx(x, y, z)];
            }
            dt_1d_squared(&f[..bz], w2[2], &mut out, &mut scratch);
            for z in 0..bz {
                dist[idx(x, y, z)] = out[z];
            }
        }
    }

    Ok(dist)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn brute_force(mask: &[u8], dims: [usize; 3], spacing: [f64; 3]) -> Vec<f64> {
        let [bx, by, bz] = dims;
        let fg: Vec<(usize, usize, usize)> = (0..bz)
            .flat_map(|z| (0..by).flat_map(move |y| (0..bx).map(move |x| (x, y, z))))
            .filter(|&(x, y, z)| mask[x + bx * (y + by * z)] != 0)
            .collect();
        let mut out = vec![FAR; bx * by * bz];
        for z in 0..bz {
            for y in 0..by {
                for x in 0..bx {
                    for &(fx, fy, fz) in &fg {
                        let dx = (x as f64 - fx as f64) * spacing[0];
                        let dy = (y as f64 - fy as f64) * spacing[1];
                        let dz = (z as f64 - fz as f64) * spacing[2];
                        let d = dx * dx + dy * dy + dz * dz;
                        let i = x + bx * (y + by * z);
                        out[i] = out[i].min(d);
                    }
                }
            }
        }
        out
    }

    #[test]
    fn one_dimensional_kernel() {
        let f = [FAR, FAR, 0.0, FAR, FAR, FAR, 0.0];
        let mut out = [0.0; 7];
        let mut scratch = EnvelopeScratch::default();
        dt_1d_squared(&f, 1.0, &mut out, &mut scratch);
        assert_eq!(out, [4.0, 1.0, 0.0, 1.0, 4.0, 1.0, 0.0]);
    }

    #[test]
    fn single_center_voxel_unit_spacing() {
        let dims = [5, 5, 5];
        let mut mask = vec![0u8; 125];
        mask[2 + 5 * (2 + 5 * 2)] = 1;
        let dt = edt_3d_squared(&mask, dims, [1.0, 1.0, 1.0]).unwrap();
        let expected = brute_force(&mask, dims, [1.0, 1.0, 1.0]);
        for (got, want) in dt.iter().zip(&expected) {
            assert_relative_eq!(*got, *want, epsilon = 1e-9);
        }
        assert_relative_eq!(dt[0], 12.0);
    }

    #[test]
    fn anisotropic_spacing_matches_brute_force() {
        let dims = [7, 4, 5];
        let mut mask = vec![0u8; 7 * 4 * 5];
        mask[1 + 7 * (1 + 4 * 1)] = 1;
        mask[6 + 7 * (3 + 4 * 4)] = 1;
        mask[3 + 7 * (0 + 4 * 2)] = 1;
        let spacing = [0.8, 1.5, 3.0];
        let dt = edt_3d_squared(&mask, dims, spacing).unwrap();
        let expected = brute_force(&mask, dims, spacing);
        for (got, want) in dt.iter().zip(&expected) {
            assert_relative_eq!(*got, *want, epsilon = 1e-9);
        }
    }

    #[test]
    fn mask_length_mismatch() {
        assert!(edt_3d_squared(&[0u8; 10], [2, 2, 2], [1.0; 3]).is_err());
        assert!(edt_3d_squared(&[], [0, 2, 2], [1.0; 3]).is_err());
    }
}
