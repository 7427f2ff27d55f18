use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument};

use crate::error::{GenerationError, RegionError, Result};
use crate::math::{mean_point, Point3, Vector3};
use crate::region::Region;

use super::{
    ac_valley_centers, cvt3d_centers, dedup_points_grid, hcp_valley_centers, lattice_centers, CvtParams, Pattern,
    Sphere, SphereKind, SphereSet, ValleyCenters,
};

/// Floor of the deduplication distance (mm).
const MIN_DEDUP_MM: f64 = 0.25;
/// Deduplication distance as a fraction of the radius.
const DEDUP_RADIUS_FRACTION: f64 = 0.1;

/// Sphere generation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereParams {
    pub pattern: Pattern,
    /// Nearest-neighbour center distance (mm).
    pub spacing: f64,
    /// Sphere radius (mm).
    pub radius: f64,
    /// Lateral shift along `u` applied after centroid alignment (mm).
    pub shift_u: f64,
    /// Lateral shift along `v` applied after centroid alignment (mm).
    pub shift_v: f64,
    /// Keep only spheres whose `radius + margin` ball lies inside the region.
    pub full_spheres_only: bool,
    /// Clearance from the region boundary (mm).
    pub margin: f64,
    pub sphere_set: SphereSet,
    pub cvt: CvtParams,
}

impl SphereParams {
    #[must_use]
    pub fn new(pattern: Pattern, spacing: f64, radius: f64) -> Self {
        Self {
            pattern,
            spacing,
            radius,
            shift_u: 0.0,
            shift_v: 0.0,
            full_spheres_only: false,
            margin: 0.0,
            sphere_set: SphereSet::Primary,
            cvt: CvtParams::default(),
        }
    }

    fn validate(&self) -> Result<()> {
        let checks = [
            ("spacing", self.spacing, self.spacing > 0.0),
            ("radius", self.radius, self.radius > 0.0),
            ("shift_u", self.shift_u, true),
            ("shift_v", self.shift_v, true),
            ("margin", self.margin, true),
        ];
        for (parameter, value, ok) in checks {
            if !value.is_finite() || !ok {
                return Err(GenerationError::InvalidParameter { parameter, value }.into());
            }
        }
        Ok(())
    }

    /// Radius used by the containment test, `0` when no test applies.
    fn test_radius(&self) -> f64 {
        if self.full_spheres_only {
            self.radius + self.margin
        } else {
            self.margin.max(0.0)
        }
    }
}

/// Places spheres inside a region.
///
/// Base lattice points are aligned so that the mean of the points inside
/// the region coincides with the region centroid, shifted laterally, then
/// filtered against the region and deduplicated.
#[derive(Debug)]
pub struct GenerateSpheres<'a> {
    region: &'a Region,
    params: SphereParams,
}

impl<'a> GenerateSpheres<'a> {
    #[must_use]
    pub fn new(region: &'a Region, params: SphereParams) -> Self {
        Self { region, params }
    }

    /// Executes the pipeline.
    ///
    /// Spheres are numbered from 1: primary spheres first, then warm, then
    /// cold. Centers are returned in patient coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidParameter`] for non-finite or
    /// non-positive parameters, [`RegionError::NoCentroid`] when the region
    /// has no measurable area, and [`GenerationError::NoPointsInside`] when
    /// no lattice point lands inside the region or none survives filtering.
    #[instrument(skip_all, fields(spacing = self.params.spacing, radius = self.params.radius))]
    pub fn execute(&self) -> Result<Vec<Sphere>> {
        let p = &self.params;
        p.validate()?;
        let region = self.region;

        let (Some(centroid), Some(bounds)) = (region.centroid(), region.bounds()) else {
            return Err(RegionError::NoCentroid.into());
        };

        let base = match p.pattern.packing() {
            Some(packing) => lattice_centers(packing, p.spacing, &bounds),
            None => {
                let mut rng = match p.cvt.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                cvt3d_centers(region, &bounds, p.spacing, &p.cvt, &mut rng)
            }
        };

        let inside: Vec<Point3> = base.iter().copied().filter(|q| region.contains_point(q)).collect();
        debug!(base = base.len(), inside = inside.len(), "base lattice generated");
        if inside.is_empty() {
            return Err(GenerationError::NoPointsInside.into());
        }
        let mean = mean_point(&inside).ok_or(GenerationError::NoLatticeCentroid)?;
        let offset = (centroid.uvw - mean) + Vector3::new(p.shift_u, p.shift_v, 0.0);

        let keep = |points: Vec<Point3>| self.keep_inside(points);
        let primary = keep(base.iter().map(|q| q + offset).collect());
        if primary.is_empty() {
            return Err(GenerationError::NoPointsInside.into());
        }

        let valleys = match (p.sphere_set, p.pattern) {
            (SphereSet::Primary, _) => ValleyCenters::default(),
            (_, Pattern::Hcp) => {
                let raw = hcp_valley_centers(p.spacing, &bounds);
                ValleyCenters {
                    warm: keep(raw.warm.iter().map(|q| q + offset).collect()),
                    cold: keep(raw.cold.iter().map(|q| q + offset).collect()),
                }
            }
            (_, Pattern::Ac) => {
                let raw = ac_valley_centers(&primary, p.spacing);
                ValleyCenters {
                    warm: keep(raw.warm),
                    cold: keep(raw.cold),
                }
            }
            _ => ValleyCenters::default(),
        };

        let frame = region.frame();
        let mut next_id = 1u32;
        let mut emit = |points: &[Point3], kind: SphereKind, out: &mut Vec<Sphere>| {
            for q in points {
                out.push(Sphere {
                    id: next_id,
                    center: frame.to_patient(q),
                    radius: p.radius,
                    kind,
                });
                next_id += 1;
            }
        };

        let mut spheres = Vec::with_capacity(primary.len() + valleys.warm.len() + valleys.cold.len());
        emit(&primary, SphereKind::Primary, &mut spheres);
        if p.sphere_set == SphereSet::PrimaryWarmCold {
            emit(&valleys.warm, SphereKind::Warm, &mut spheres);
        }
        if p.sphere_set != SphereSet::Primary {
            emit(&valleys.cold, SphereKind::Cold, &mut spheres);
        }

        info!(
            total = spheres.len(),
            primary = primary.len(),
            warm = valleys.warm.len(),
            cold = valleys.cold.len(),
            "spheres generated"
        );
        Ok(spheres)
    }

    /// Filters aligned points against the region and the containment test,
    /// then deduplicates.
    fn keep_inside(&self, points: Vec<Point3>) -> Vec<Point3> {
        let p = &self.params;
        let region = self.region;
        let test_radius = p.test_radius();
        let filtered: Vec<Point3> = points
            .into_iter()
            .filter(|q| region.contains_point(q))
            .filter(|q| test_radius <= 0.0 || region.sphere_fully_inside(q, test_radius))
            .collect();
        dedup_points_grid(&filtered, MIN_DEDUP_MM.max(p.radius * DEDUP_RADIUS_FRACTION))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::LatticeError;
    use crate::math::{Point2, UvwFrame};
    use crate::region::{Layer, Polygon};

    fn box_region(side: f64, count: u32, layer: f64) -> Region {
        let outer = vec![
            Point2::new(0.0, 0.0),
            Point2::new(side, 0.0),
            Point2::new(side, side),
            Point2::new(0.0, side),
        ];
        let layers = (0..count)
            .map(|i| Layer {
                z_center: (f64::from(i) + 0.5) * layer,
                thickness: layer,
                polygons: vec![Polygon::new(outer.clone(), vec![])],
            })
            .collect();
        Region::from_layers(UvwFrame::default(), layers)
    }

    #[test]
    fn primary_spheres_are_inside_and_numbered() {
        let region = box_region(40.0, 20, 2.0);
        let spheres = GenerateSpheres::new(&region, SphereParams::new(Pattern::Hcp, 10.0, 3.0))
            .execute()
            .unwrap();
        assert!(!spheres.is_empty());
        for (i, s) in spheres.iter().enumerate() {
            assert_eq!(s.id as usize, i + 1);
            assert_eq!(s.kind, SphereKind::Primary);
            assert!(region.contains_point(&s.center));
        }
    }

    #[test]
    fn full_spheres_only_respects_radius() {
        let region = box_region(40.0, 20, 2.0);
        let mut params = SphereParams::new(Pattern::Sc, 10.0, 4.0);
        params.full_spheres_only = true;
        let spheres = GenerateSpheres::new(&region, params).execute().unwrap();
        assert!(!spheres.is_empty());
        for s in &spheres {
            assert!(region.sphere_fully_inside(&s.center, 4.0));
        }
    }

    #[test]
    fn valley_kinds_follow_sphere_set() {
        let region = box_region(40.0, 20, 2.0);
        let mut params = SphereParams::new(Pattern::Hcp, 10.0, 2.0);
        params.sphere_set = SphereSet::PrimaryCold;
        let spheres = GenerateSpheres::new(&region, params).execute().unwrap();
        assert!(spheres.iter().any(|s| s.kind == SphereKind::Cold));
        assert!(spheres.iter().all(|s| s.kind != SphereKind::Warm));

        params.sphere_set = SphereSet::PrimaryWarmCold;
        let spheres = GenerateSpheres::new(&region, params).execute().unwrap();
        assert!(spheres.iter().any(|s| s.kind == SphereKind::Warm));
        // primaries precede valleys
        let first_valley = spheres.iter().position(|s| s.kind != SphereKind::Primary).unwrap();
        assert!(spheres[first_valley..].iter().all(|s| s.kind != SphereKind::Primary));
    }

    #[test]
    fn sc_has_no_valleys() {
        let region = box_region(40.0, 20, 2.0);
        let mut params = SphereParams::new(Pattern::Sc, 10.0, 2.0);
        params.sphere_set = SphereSet::PrimaryWarmCold;
        let spheres = GenerateSpheres::new(&region, params).execute().unwrap();
        assert!(spheres.iter().all(|s| s.kind == SphereKind::Primary));
    }

    #[test]
    fn seeded_cvt_is_reproducible() {
        let region = box_region(30.0, 15, 2.0);
        let mut params = SphereParams::new(Pattern::Cvt3d, 10.0, 2.0);
        params.cvt = CvtParams {
            max_iters: 3,
            samples_per_iter: 1500,
            seed: Some(11),
        };
        let a = GenerateSpheres::new(&region, params).execute().unwrap();
        let b = GenerateSpheres::new(&region, params).execute().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let region = box_region(40.0, 20, 2.0);
        let err = GenerateSpheres::new(&region, SphereParams::new(Pattern::Sc, 0.0, 3.0))
            .execute()
            .unwrap_err();
        assert!(matches!(
            err,
            LatticeError::Generation(GenerationError::InvalidParameter { parameter: "spacing", .. })
        ));
    }

    #[test]
    fn empty_region_has_no_centroid() {
        let region = Region::from_layers(UvwFrame::default(), vec![]);
        let err = GenerateSpheres::new(&region, SphereParams::new(Pattern::Sc, 10.0, 3.0))
            .execute()
            .unwrap_err();
        assert!(matches!(err, LatticeError::Region(RegionError::NoCentroid)));
    }

    #[test]
    fn oversized_radius_leaves_nothing() {
        let region = box_region(10.0, 5, 2.0);
        let mut params = SphereParams::new(Pattern::Sc, 2.0, 20.0);
        params.full_spheres_only = true;
        let err = GenerateSpheres::new(&region, params).execute().unwrap_err();
        assert!(matches!(err, LatticeError::Generation(GenerationError::NoPointsInside)));
    }
}
