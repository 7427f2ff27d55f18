//! Layered region representation ("layered cake").
//!
//! A [`Region`] is a stack of [`Layer`]s ordered by their offset along the
//! stacking axis. Each layer holds filled [`Polygon`]s (outer loop plus
//! holes) expressed in the in-plane `u`, `v` coordinates of the region's
//! [`UvwFrame`].

mod analysis;
mod build;
mod nesting;
mod query;

pub use analysis::RegionCentroid;
pub use build::{sort_slices, BuildRegion, Contour, EndcapMode, RegionOptions, SliceGeometry, StructureContours};
pub use query::{fibonacci_sphere_directions, INWARD_BIAS, LAYER_SLACK, SURFACE_SAMPLES};

use crate::math::{Point2, Point3, UvwFrame, Vector3};

/// A filled area with zero or more holes.
///
/// Loops are stored open (the first vertex is not repeated). `outer` winds
/// counter-clockwise, every hole clockwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    pub outer: Vec<Point2>,
    pub holes: Vec<Vec<Point2>>,
}

impl Polygon {
    /// Creates a polygon, enforcing outer/hole orientation.
    #[must_use]
    pub fn new(mut outer: Vec<Point2>, mut holes: Vec<Vec<Point2>>) -> Self {
        crate::math::polygon_2d::ensure_orientation(&mut outer, true);
        for hole in &mut holes {
            crate::math::polygon_2d::ensure_orientation(hole, false);
        }
        Self { outer, holes }
    }
}

/// One slab of a region.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// Signed offset of the slab center along the stacking axis (mm).
    pub z_center: f64,
    /// Slab thickness (mm).
    pub thickness: f64,
    pub polygons: Vec<Polygon>,
}

/// Axis-aligned bounds in UVW coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3d {
    pub min: Point3,
    pub max: Point3,
}

impl Bounds3d {
    /// Extent along each axis.
    #[must_use]
    pub fn span(&self) -> Vector3 {
        self.max - self.min
    }
}

/// A queryable volumetric region built from per-slice contours.
///
/// Immutable once built; rebuild to change it.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    roi_number: i32,
    name: String,
    frame: UvwFrame,
    layers: Vec<Layer>,
}

impl Region {
    /// Creates a region from layers, sorting them by `z_center`.
    #[must_use]
    pub fn from_layers(frame: UvwFrame, mut layers: Vec<Layer>) -> Self {
        layers.sort_by(|a, b| a.z_center.total_cmp(&b.z_center));
        Self {
            roi_number: 0,
            name: String::new(),
            frame,
            layers,
        }
    }

    /// Attaches the structure number and name.
    #[must_use]
    pub fn with_identity(mut self, roi_number: i32, name: impl Into<String>) -> Self {
        self.roi_number = roi_number;
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn roi_number(&self) -> i32 {
        self.roi_number
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn frame(&self) -> &UvwFrame {
        &self.frame
    }

    /// Layers, ascending by `z_center`.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
