use super::{Sphere, SphereKind};

/// Spheres considered by [`min_ctc_pair`].
const MAX_CTC_SPHERES: usize = 2000;

/// Spheres grouped by [`SphereKind`], each group in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpheresByKind {
    pub primary: Vec<Sphere>,
    pub warm: Vec<Sphere>,
    pub cold: Vec<Sphere>,
}

/// The closest pair of sphere centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CtcPair {
    pub id_a: u32,
    pub id_b: u32,
    /// Center-to-center distance (mm).
    pub distance: f64,
}

#[must_use]
pub fn split_by_kind(spheres: &[Sphere]) -> SpheresByKind {
    let mut out = SpheresByKind::default();
    for s in spheres {
        match s.kind {
            SphereKind::Primary => out.primary.push(s.clone()),
            SphereKind::Warm => out.warm.push(s.clone()),
            SphereKind::Cold => out.cold.push(s.clone()),
        }
    }
    out
}

/// Minimum center-to-center distance by brute force over the first 2000
/// spheres. `None` with fewer than two spheres.
#[must_use]
pub fn min_ctc_pair(spheres: &[Sphere]) -> Option<CtcPair> {
    let list = &spheres[..spheres.len().min(MAX_CTC_SPHERES)];
    let mut best: Option<CtcPair> = None;
    for (i, a) in list.iter().enumerate() {
        for b in &list[i + 1..] {
            let distance = (a.center - b.center).norm();
            if distance.is_finite() && best.is_none_or(|p| distance < p.distance) {
                best = Some(CtcPair {
                    id_a: a.id,
                    id_b: b.id,
                    distance,
                });
            }
        }
    }
    best
}

/// [`min_ctc_pair`] restricted to primary spheres.
#[must_use]
pub fn min_ctc_pair_primary(spheres: &[Sphere]) -> Option<CtcPair> {
    min_ctc_pair(&split_by_kind(spheres).primary)
}
