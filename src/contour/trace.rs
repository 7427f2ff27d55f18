use std::collections::{HashMap, HashSet};

use crate::error::{Result, VoxelError};

/// Upper bound on the length of a single traced loop.
const MAX_LOOP_STEPS: usize = 200_000;
/// Point budget of a simplified loop.
pub const MAX_LOOP_POINTS: usize = 4000;

/// A pixel corner: `[x, y]` with `x` in `0..=cols`, `y` in `0..=rows`.
pub type GridCorner = [usize; 2];

/// Traces the boundaries of the foreground of a row-major 2D mask.
///
/// Each foreground pixel contributes one directed edge per side that
/// borders background or the mask border, oriented clockwise around the
/// foreground in image coordinates (`y` down). Edges are chained into closed
/// loops of pixel corners; loops that do not close or have fewer than four
/// corners are dropped. The closing corner is not repeated.
///
/// # Errors
///
/// Returns [`VoxelError::InvalidDimensions`] if `rows * cols` overflows and
/// [`VoxelError::MaskLength`] if `mask` is shorter than `rows * cols`.
pub fn mask_to_edge_loops(mask: &[u8], rows: usize, cols: usize) -> Result<Vec<Vec<GridCorner>>> {
    let n = rows
        .checked_mul(cols)
        .ok_or(VoxelError::InvalidDimensions(cols, rows, 1))?;
    if mask.len() < n {
        return Err(VoxelError::MaskLength {
            expected: n,
            actual: mask.len(),
        }
        .into());
    }

    let filled = |r: usize, c: usize| mask[r * cols + c] != 0;
    let mut order: Vec<(GridCorner, GridCorner)> = Vec::new();
    let mut outgoing: HashMap<GridCorner, Vec<GridCorner>> = HashMap::new();
    let mut push_edge = |from: GridCorner, to: GridCorner| {
        outgoing.entry(from).or_default().push(to);
        order.push((from, to));
    };

    for r in 0..rows {
        for c in 0..cols {
            if !filled(r, c) {
                continue;
            }
            if r == 0 || !filled(r - 1, c) {
                push_edge([c, r], [c + 1, r]);
            }
            if c + 1 == cols || !filled(r, c + 1) {
                push_edge([c + 1, r], [c + 1, r + 1]);
            }
            if r + 1 == rows || !filled(r + 1, c) {
                push_edge([c + 1, r + 1], [c, r + 1]);
            }
            if c == 0 || !filled(r, c - 1) {
                push_edge([c, r + 1], [c, r]);
            }
        }
    }

    let mut unused: HashSet<(GridCorner, GridCorner)> = order.iter().copied().collect();
    let mut loops = Vec::new();
    for &(start, first) in &order {
        if !unused.remove(&(start, first)) {
            continue;
        }
        let mut ring = vec![start];
        let mut next = first;
        let mut steps = 0;
        while next != start && steps < MAX_LOOP_STEPS {
            steps += 1;
            ring.push(next);
            let Some(to) = outgoing
                .get(&next)
                .and_then(|cands| cands.iter().find(|to| unused.contains(&(next, **to))))
                .copied()
            else {
                break;
            };
            unused.remove(&(next, to));
            next = to;
        }
        if next == start && ring.len() >= 4 {
            loops.push(ring);
        }
    }
    Ok(loops)
}

/// Drops corners where the walking direction does not change and
/// subsamples loops longer than [`MAX_LOOP_POINTS`] with a uniform stride.
///
/// Loops that would shrink below four points are returned unchanged.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn simplify_grid_loop(ring: &[GridCorner]) -> Vec<GridCorner> {
    let n = ring.len();
    if n < 4 {
        return ring.to_vec();
    }
    let step = |a: GridCorner, b: GridCorner| {
        (
            (b[0] as i64 - a[0] as i64).signum(),
            (b[1] as i64 - a[1] as i64).signum(),
        )
    };
    let corners: Vec<GridCorner> = (0..n)
        .filter(|&i| {
            let (prev, curr, next) = (ring[(i + n - 1) % n], ring[i], ring[(i + 1) % n]);
            step(prev, curr) != step(curr, next)
        })
        .map(|i| ring[i])
        .collect();

    if corners.len() > MAX_LOOP_POINTS {
        let stride = corners.len().div_ceil(MAX_LOOP_POINTS);
        let slim: Vec<GridCorner> = corners.iter().step_by(stride).copied().collect();
        return if slim.len() >= 4 { slim } else { corners };
    }
    if corners.len() >= 4 {
        corners
    } else {
        ring.to_vec()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mask(rows: &[&str]) -> (Vec<u8>, usize, usize) {
        let data = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| u8::from(b == b'#')))
            .collect();
        (data, rows.len(), rows[0].len())
    }

    #[test]
    fn single_pixel_is_a_clockwise_square() {
        let (m, rows, cols) = mask(&["...", ".#.", "..."]);
        let loops = mask_to_edge_loops(&m, rows, cols).unwrap();
        assert_eq!(loops, vec![vec![[1, 1], [2, 1], [2, 2], [1, 2]]]);
    }

    #[test]
    fn block_touching_the_border() {
        let (m, rows, cols) = mask(&["##.", "##.", "..."]);
        let loops = mask_to_edge_loops(&m, rows, cols).unwrap();
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 8);
        let simple = simplify_grid_loop(&loops[0]);
        assert_eq!(simple.len(), 4);
        for corner in [[0, 0], [2, 0], [2, 2], [0, 2]] {
            assert!(simple.contains(&corner));
        }
    }

    #[test]
    fn ring_has_outer_and_inner_loop() {
        let (m, rows, cols) = mask(&["###", "#.#", "###"]);
        let loops = mask_to_edge_loops(&m, rows, cols).unwrap();
        assert_eq!(loops.len(), 2);
        let mut sizes: Vec<usize> = loops.iter().map(|l| simplify_grid_loop(l).len()).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![4, 4]);
    }

    #[test]
    fn separate_islands() {
        let (m, rows, cols) = mask(&["#..#", "....", "#..."]);
        assert_eq!(mask_to_edge_loops(&m, rows, cols).unwrap().len(), 3);
    }

    #[test]
    fn short_mask_is_rejected() {
        assert!(mask_to_edge_loops(&[1, 0], 2, 2).is_err());
        assert!(mask_to_edge_loops(&[], 0, 0).unwrap().is_empty());
    }

    #[test]
    fn overflowing_dimensions_are_rejected() {
        let err = mask_to_edge_loops(&[1], usize::MAX, 2).unwrap_err();
        assert!(matches!(
            err,
            crate::error::LatticeError::Voxel(VoxelError::InvalidDimensions(2, usize::MAX, 1))
        ));
    }

    #[test]
    fn long_loops_are_subsampled() {
        // Staircase: every corner is a direction change.
        let mut ring = Vec::new();
        for i in 0..3000 {
            ring.push([i, i]);
            ring.push([i + 1, i]);
        }
        ring.push([3000, 3000]);
        ring.push([0, 3000]);
        let simple = simplify_grid_loop(&ring);
        assert!(simple.len() <= MAX_LOOP_POINTS);
        assert!(simple.len() >= 4);
    }
}
