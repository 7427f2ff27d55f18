pub mod distance_transform;
pub mod frame;
pub mod polygon_2d;

pub use frame::UvwFrame;

/// 2D point type (in-plane `u`, `v` coordinates, mm).
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Epsilon for polygon areas (mm²) and loop coordinate comparisons.
pub const AREA_EPS: f64 = 1e-6;

/// Guard for near-zero divisors in ray casting and centroid formulas.
pub const DIVISOR_EPS: f64 = 1e-12;

/// Arithmetic mean of a point set, or `None` if the set is empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_point(points: &[Point3]) -> Option<Point3> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_of_empty_is_none() {
        assert!(mean_point(&[]).is_none());
    }

    #[test]
    fn mean_of_two_points() {
        let m = mean_point(&[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, -6.0)]).unwrap();
        assert_relative_eq!(m, Point3::new(1.0, 2.0, -3.0));
    }
}
