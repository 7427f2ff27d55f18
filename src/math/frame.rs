use super::{Point3, Vector3};
use crate::error::{GeometryError, Result};

/// Orthonormal frame used to flatten contour points into per-layer
/// polygons.
///
/// `u` follows the image row direction, `v` the column direction and `w` is
/// the stacking axis (`u × v`). Coordinates expressed in this frame are
/// called UVW.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvwFrame {
    pub u: Vector3,
    pub v: Vector3,
    pub w: Vector3,
}

impl Default for UvwFrame {
    fn default() -> Self {
        Self {
            u: Vector3::x(),
            v: Vector3::y(),
            w: Vector3::z(),
        }
    }
}

impl UvwFrame {
    /// Builds a frame from image row and column cosines.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroVector`] if either cosine is zero-length
    /// and [`GeometryError::Degenerate`] if they are parallel.
    pub fn from_cosines(row: Vector3, col: Vector3) -> Result<Self> {
        let u = row.try_normalize(0.0).ok_or(GeometryError::ZeroVector)?;
        let v = col.try_normalize(0.0).ok_or(GeometryError::ZeroVector)?;
        let w = u
            .cross(&v)
            .try_normalize(1e-12)
            .ok_or_else(|| GeometryError::Degenerate("row and column cosines are parallel".into()))?;
        Ok(Self { u, v, w })
    }

    /// Projects a patient-space point onto the frame axes.
    #[must_use]
    pub fn to_uvw(&self, p: &Point3) -> Point3 {
        Point3::new(p.coords.dot(&self.u), p.coords.dot(&self.v), p.coords.dot(&self.w))
    }

    /// Maps UVW coordinates back to patient space.
    #[must_use]
    pub fn to_patient(&self, uvw: &Point3) -> Point3 {
        Point3::from(self.u * uvw.x + self.v * uvw.y + self.w * uvw.z)
    }

    /// Offset of a patient-space point along the stacking axis.
    #[must_use]
    pub fn offset(&self, p: &Point3) -> f64 {
        p.coords.dot(&self.w)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_round_trip() {
        let f = UvwFrame::default();
        let p = Point3::new(1.0, -2.0, 3.5);
        assert_relative_eq!(f.to_uvw(&p), p);
        assert_relative_eq!(f.to_patient(&p), p);
    }

    #[test]
    fn oblique_round_trip() {
        let f = UvwFrame::from_cosines(Vector3::new(1.0, 1.0, 0.0), Vector3::new(0.0, 0.0, -1.0))
            .unwrap();
        assert_relative_eq!(f.w.norm(), 1.0, epsilon = 1e-12);
        let p = Point3::new(12.0, -7.0, 40.0);
        let back = f.to_patient(&f.to_uvw(&p));
        assert_relative_eq!(back, p, epsilon = 1e-9);
    }

    #[test]
    fn parallel_cosines_rejected() {
        assert!(UvwFrame::from_cosines(Vector3::x(), Vector3::x() * 2.0).is_err());
        assert!(UvwFrame::from_cosines(Vector3::zeros(), Vector3::y()).is_err());
    }
}
