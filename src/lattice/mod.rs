//! Sphere lattice generation inside a [`Region`](crate::region::Region).

mod analysis;
mod cvt;
mod dedup;
mod flow;
mod generate;
mod valley;

pub use analysis::{min_ctc_pair, min_ctc_pair_primary, split_by_kind, CtcPair, SpheresByKind};
pub use cvt::{cvt3d_centers, CvtParams};
pub use dedup::dedup_points_grid;
pub use flow::{GenerateSpheres, SphereParams};
pub use generate::{lattice_centers, HcpCell};
pub use valley::{ac_valley_centers, hcp_valley_centers, midpoints_near_distance, ValleyCenters, MAX_VALLEY_PAIRS};

use crate::math::Point3;

/// Regular packing used to enumerate lattice points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packing {
    /// Hexagonal close packing.
    Hcp,
    /// Orthogonal grid with step equal to the spacing.
    SimpleCubic,
    /// Orthogonal grid with step `spacing / √2` and an even-parity filter,
    /// giving face-centred nearest neighbours at `spacing`.
    AlternatingCubic,
}

/// Placement pattern requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Pattern {
    #[default]
    Hcp,
    Sc,
    Ac,
    /// Centroidal Voronoi relaxation seeded from HCP.
    Cvt3d,
}

impl Pattern {
    /// The regular packing behind this pattern, `None` for CVT3D.
    #[must_use]
    pub fn packing(self) -> Option<Packing> {
        match self {
            Self::Hcp => Some(Packing::Hcp),
            Self::Sc => Some(Packing::SimpleCubic),
            Self::Ac => Some(Packing::AlternatingCubic),
            Self::Cvt3d => None,
        }
    }
}

/// Which sphere classes the pipeline emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SphereSet {
    #[default]
    Primary,
    PrimaryCold,
    PrimaryWarmCold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SphereKind {
    Primary,
    /// Intra-layer interstitial position.
    Warm,
    /// Inter-layer interstitial position.
    Cold,
}

/// A generated sphere. Centers are in patient coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub id: u32,
    pub center: Point3,
    pub radius: f64,
    pub kind: SphereKind,
}
