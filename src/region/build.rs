use std::collections::{BTreeMap, HashMap};

use tracing::{debug, instrument, warn};

use crate::math::{Point2, Point3, UvwFrame, Vector3, AREA_EPS};

use super::{nesting, Layer, Region};

/// Placement of one image slice.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceGeometry {
    /// Patient-space position of the first transmitted pixel.
    pub image_position: Point3,
    /// Direction of increasing column index.
    pub row_cosine: Vector3,
    /// Direction of increasing row index.
    pub col_cosine: Vector3,
    /// `[row spacing, column spacing]` in mm.
    pub pixel_spacing: [f64; 2],
    pub sop_instance_uid: Option<String>,
}

impl SliceGeometry {
    /// Frame spanned by this slice's orientation, falling back to the
    /// identity frame for degenerate cosines.
    #[must_use]
    pub fn frame(&self) -> UvwFrame {
        UvwFrame::from_cosines(self.row_cosine, self.col_cosine).unwrap_or_else(|e| {
            warn!(error = %e, "degenerate slice orientation, using identity frame");
            UvwFrame::default()
        })
    }
}

/// One closed planar contour.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Slice the contour was drawn on, if known.
    pub referenced_sop_instance_uid: Option<String>,
    pub points: Vec<Point3>,
}

/// All contours of one named structure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructureContours {
    pub roi_number: i32,
    pub name: String,
    pub contours: Vec<Contour>,
}

/// How the first and last layer of a region extend past their contour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EndcapMode {
    /// End layers extend only toward their inner neighbour.
    #[default]
    Trapezoid,
    /// End layers also extend outward by the capped half spacing.
    HalfSlab,
}

/// Options controlling layer thickness.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RegionOptions {
    pub endcap_mode: EndcapMode,
    /// Neighbour gaps larger than `typical spacing * gap_factor` are treated
    /// as missing data and capped like a region end. Ignored unless `> 1`.
    pub gap_factor: Option<f64>,
}

/// Sorts slices ascending by their offset along the stacking axis of the
/// first slice and returns that offset for each (in the new order).
pub fn sort_slices(slices: &mut [SliceGeometry]) -> Vec<f64> {
    let Some(first) = slices.first() else {
        return Vec::new();
    };
    let frame = first.frame();
    slices.sort_by(|a, b| {
        frame
            .offset(&a.image_position)
            .total_cmp(&frame.offset(&b.image_position))
    });
    slices.iter().map(|s| frame.offset(&s.image_position)).collect()
}

/// Builds a [`Region`] from the contours of one structure.
///
/// Contours are grouped into layers by their stacking-axis offset rounded to
/// 0.01 mm; the offset of a referenced slice is preferred over projecting
/// the contour's own points. Malformed contours are skipped, never reported.
pub struct BuildRegion<'a> {
    slices: &'a [SliceGeometry],
    structure: &'a StructureContours,
    options: RegionOptions,
}

impl<'a> BuildRegion<'a> {
    /// Creates a new `BuildRegion` operation with default options.
    #[must_use]
    pub fn new(slices: &'a [SliceGeometry], structure: &'a StructureContours) -> Self {
        Self {
            slices,
            structure,
            options: RegionOptions::default(),
        }
    }

    /// Sets endcap and gap handling.
    #[must_use]
    pub fn with_options(mut self, options: RegionOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes the build. Empty input yields an empty region.
    #[must_use]
    #[instrument(skip_all, fields(roi = self.structure.roi_number, contours = self.structure.contours.len()))]
    pub fn execute(&self) -> Region {
        let frame = self.slices.first().map(SliceGeometry::frame).unwrap_or_default();

        let slice_offsets: HashMap<&str, f64> = self
            .slices
            .iter()
            .filter_map(|s| {
                let uid = s.sop_instance_uid.as_deref()?;
                let w = frame.offset(&s.image_position);
                w.is_finite().then_some((uid, w))
            })
            .collect();

        let mut by_key: BTreeMap<i64, Vec<Vec<Point2>>> = BTreeMap::new();
        for contour in &self.structure.contours {
            if contour.points.len() < 3 {
                continue;
            }
            let w = contour
                .referenced_sop_instance_uid
                .as_deref()
                .and_then(|uid| slice_offsets.get(uid).copied())
                .unwrap_or_else(|| frame.offset(&contour.points[0]));
            let Some(key) = layer_key(w) else {
                continue;
            };
            let uv = contour
                .points
                .iter()
                .map(|p| Point2::new(p.coords.dot(&frame.u), p.coords.dot(&frame.v)))
                .collect();
            by_key.entry(key).or_default().push(uv);
        }

        let mut dropped = 0;
        #[allow(clippy::cast_precision_loss)]
        let mut layers: Vec<Layer> = by_key
            .into_iter()
            .map(|(key, loops)| {
                let nesting = nesting::resolve(loops);
                dropped += nesting.dropped;
                Layer {
                    z_center: key as f64 / 100.0,
                    thickness: 1.0,
                    polygons: nesting.polygons,
                }
            })
            .collect();

        assign_thickness(&mut layers, self.options);
        debug!(layers = layers.len(), dropped_loops = dropped, "built region");

        Region::from_layers(frame, layers).with_identity(self.structure.roi_number, self.structure.name.clone())
    }
}

/// Rounds an offset to a 0.01 mm bucket.
#[allow(clippy::cast_possible_truncation)]
fn layer_key(w: f64) -> Option<i64> {
    let key = (w * 100.0).round();
    (key.is_finite() && key.abs() < 9.0e15).then_some(key as i64)
}

/// Sets each layer's thickness from half the distance to its neighbours,
/// capped by half the median neighbour spacing. Layers must be sorted.
fn assign_thickness(layers: &mut [Layer], options: RegionOptions) {
    if layers.is_empty() {
        return;
    }
    let mut deltas: Vec<f64> = layers
        .windows(2)
        .map(|w| w[1].z_center - w[0].z_center)
        .filter(|dz| dz.is_finite() && *dz > AREA_EPS)
        .collect();
    deltas.sort_by(f64::total_cmp);
    let typical = deltas.get(deltas.len() / 2).copied().unwrap_or(1.0);
    let half_cap = (typical / 2.0).max(AREA_EPS);
    let gap_factor = options
        .gap_factor
        .filter(|g| g.is_finite() && *g > 1.0)
        .unwrap_or(f64::INFINITY);
    let endcap = match options.endcap_mode {
        EndcapMode::Trapezoid => 0.0,
        EndcapMode::HalfSlab => half_cap,
    };

    let centers: Vec<f64> = layers.iter().map(|l| l.z_center).collect();
    let single = centers.len() == 1;
    for (i, layer) in layers.iter_mut().enumerate() {
        let side = |neighbour: Option<&f64>| -> f64 {
            match neighbour {
                Some(&z) => {
                    let dz = (z - centers[i]).abs();
                    if dz.is_finite() && dz <= typical * gap_factor {
                        (dz / 2.0).min(half_cap)
                    } else {
                        endcap
                    }
                }
                None => endcap,
            }
        };
        let (lower, upper) = if single {
            (half_cap, half_cap)
        } else {
            let prev = i.checked_sub(1).and_then(|j| centers.get(j));
            (side(prev), side(centers.get(i + 1)))
        };
        layer.thickness = (lower + upper).max(AREA_EPS);
    }
}
