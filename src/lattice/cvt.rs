use rand::Rng;
use tracing::{debug, warn};

use crate::math::{Point3, Vector3};
use crate::region::{Bounds3d, Region};

use super::{lattice_centers, Packing};

/// Lower bound on samples drawn per relaxation round.
const MIN_SAMPLES: usize = 1500;
/// Rejection-sampling attempts per sample.
const MAX_SAMPLE_TRIES: usize = 20_000;
/// Jittered retries when a moved seed lands outside the region.
const JITTER_TRIES: usize = 40;
/// Jitter amplitude as a fraction of the spacing.
const JITTER_FRACTION: f64 = 0.15;
/// Average seed displacement (mm) below which relaxation stops.
const CONVERGED_MM: f64 = 0.25;
/// Floor of the post-relaxation minimum separation (mm).
const MIN_SEPARATION_MM: f64 = 0.1;

/// Parameters of the Lloyd relaxation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvtParams {
    pub max_iters: usize,
    /// Samples per round; never fewer than 1500.
    pub samples_per_iter: usize,
    /// Seed for the sampling generator; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for CvtParams {
    fn default() -> Self {
        Self {
            max_iters: 15,
            samples_per_iter: 3500,
            seed: None,
        }
    }
}

fn uniform_in<R: Rng + ?Sized>(rng: &mut R, bounds: &Bounds3d) -> Point3 {
    let span = bounds.span();
    bounds.min + Vector3::new(rng.gen::<f64>() * span.x, rng.gen::<f64>() * span.y, rng.gen::<f64>() * span.z)
}

fn sample_inside<R: Rng + ?Sized>(rng: &mut R, region: &Region, bounds: &Bounds3d) -> Option<Point3> {
    (0..MAX_SAMPLE_TRIES)
        .map(|_| uniform_in(rng, bounds))
        .find(|p| region.contains_point(p))
}

/// Where a seed moves given the centroid of its samples: the centroid itself
/// if it is inside `region`, else the first of up to 40 jittered copies that
/// is. `None` means the seed stays put this round.
fn relocate<R: Rng + ?Sized>(centroid: Point3, region: &Region, jitter: f64, rng: &mut R) -> Option<Point3> {
    if region.contains_point(&centroid) {
        return Some(centroid);
    }
    (0..JITTER_TRIES)
        .map(|_| {
            centroid
                + Vector3::new(
                    rng.gen_range(-1.0..=1.0),
                    rng.gen_range(-1.0..=1.0),
                    rng.gen_range(-1.0..=1.0),
                ) * jitter
        })
        .find(|c| region.contains_point(c))
}

/// Centroidal Voronoi sphere centers constrained to `region` (UVW).
///
/// Seeds are HCP points inside the region. Each round draws uniform samples
/// inside the region, assigns each to its nearest seed and moves every seed
/// to the centroid of its samples; a centroid outside the region is
/// jittered up to 40 times and otherwise left in place for that round.
/// Finally seeds closer than `max(spacing, 0.1)` to an earlier kept seed are
/// dropped.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cvt3d_centers<R: Rng + ?Sized>(
    region: &Region,
    bounds: &Bounds3d,
    spacing: f64,
    params: &CvtParams,
    rng: &mut R,
) -> Vec<Point3> {
    let mut seeds: Vec<Point3> = lattice_centers(Packing::Hcp, spacing, bounds)
        .into_iter()
        .filter(|p| region.contains_point(p))
        .collect();
    if seeds.is_empty() {
        return seeds;
    }

    let k = seeds.len();
    let m = params.samples_per_iter.max(MIN_SAMPLES);
    let jitter = spacing * JITTER_FRACTION;

    for iter in 0..params.max_iters {
        let mut sums = vec![Vector3::zeros(); k];
        let mut counts = vec![0usize; k];
        let mut misses = 0usize;

        for _ in 0..m {
            let Some(p) = sample_inside(rng, region, bounds) else {
                misses += 1;
                continue;
            };
            let mut best = 0;
            let mut best_d2 = f64::INFINITY;
            for (i, g) in seeds.iter().enumerate() {
                let d2 = (p - g).norm_squared();
                if d2 < best_d2 {
                    best_d2 = d2;
                    best = i;
                }
            }
            sums[best] += p.coords;
            counts[best] += 1;
        }
        if misses > 0 {
            warn!(iter, misses, "region sampling exhausted its tries");
        }

        let mut total_move = 0.0;
        for i in 0..k {
            if counts[i] == 0 {
                continue;
            }
            let centroid = Point3::from(sums[i] / counts[i] as f64);
            if let Some(moved) = relocate(centroid, region, jitter, rng) {
                total_move += (moved - seeds[i]).norm();
                seeds[i] = moved;
            }
        }

        let avg_move = total_move / k as f64;
        debug!(iter, seeds = k, avg_move, "cvt relaxation round");
        if avg_move < CONVERGED_MM {
            break;
        }
    }

    let min_d = spacing.max(MIN_SEPARATION_MM);
    let mut kept: Vec<Point3> = Vec::with_capacity(seeds.len());
    for g in seeds {
        if kept.iter().all(|q| (g - q).norm() >= min_d) {
            kept.push(g);
        }
    }
    kept
}
