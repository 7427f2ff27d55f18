use super::{Point2, AREA_EPS, DIVISOR_EPS};

/// Computes the signed area of a closed loop (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise. The loop may or
/// may not repeat its first vertex at the end.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Reverses `points` in place if needed so the loop winds counter-clockwise
/// (`ccw == true`) or clockwise (`ccw == false`).
pub fn ensure_orientation(points: &mut [Point2], ccw: bool) {
    let area = signed_area(points);
    if (ccw && area < 0.0) || (!ccw && area > 0.0) {
        points.reverse();
    }
}

/// Even-odd ray casting test of `pt` against a closed loop.
///
/// Points exactly on an edge may land on either side.
#[must_use]
pub fn point_in_loop(pt: &Point2, points: &[Point2]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (points[i].x, points[i].y);
        let (xj, yj) = (points[j].x, points[j].y);
        if (yi > pt.y) != (yj > pt.y) {
            let dy = yj - yi;
            let dy = if dy.abs() < DIVISOR_EPS { DIVISOR_EPS } else { dy };
            if pt.x < (xj - xi) * (pt.y - yi) / dy + xi {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Centroid and signed area of a single loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopCentroid {
    /// Centroid of the enclosed area.
    pub centroid: Point2,
    /// Signed area (positive for CCW).
    pub area: f64,
}

/// Computes the area centroid of a closed loop.
///
/// Returns a zero centroid with zero area for loops with fewer than three
/// vertices.
#[must_use]
pub fn loop_centroid(points: &[Point2]) -> LoopCentroid {
    let n = points.len();
    if n < 3 {
        return LoopCentroid {
            centroid: Point2::origin(),
            area: 0.0,
        };
    }
    let mut a = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        let cross = points[i].x * points[j].y - points[j].x * points[i].y;
        a += cross;
        cx += (points[i].x + points[j].x) * cross;
        cy += (points[i].y + points[j].y) * cross;
    }
    a *= 0.5;
    let denom = 6.0 * if a.abs() < DIVISOR_EPS { DIVISOR_EPS } else { a };
    LoopCentroid {
        centroid: Point2::new(cx / denom, cy / denom),
        area: a,
    }
}

/// Axis-aligned bounds of a 2D loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2d {
    pub min: Point2,
    pub max: Point2,
}

impl Bounds2d {
    /// Bounds of the finite points in `points`, or `None` if there are none.
    #[must_use]
    pub fn of(points: &[Point2]) -> Option<Self> {
        let mut finite = points.iter().filter(|p| p.x.is_finite() && p.y.is_finite());
        let first = finite.next()?;
        let mut b = Self {
            min: *first,
            max: *first,
        };
        for p in finite {
            b.min.x = b.min.x.min(p.x);
            b.min.y = b.min.y.min(p.y);
            b.max.x = b.max.x.max(p.x);
            b.max.y = b.max.y.max(p.y);
        }
        Some(b)
    }

    /// Containment with an [`AREA_EPS`] slack on every side.
    #[must_use]
    pub fn contains(&self, pt: &Point2) -> bool {
        pt.x >= self.min.x - AREA_EPS
            && pt.x <= self.max.x + AREA_EPS
            && pt.y >= self.min.y - AREA_EPS
            && pt.y <= self.max.y + AREA_EPS
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square(x0: f64, y0: f64, side: f64) -> Vec<Point2> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + side, y0),
            Point2::new(x0 + side, y0 + side),
            Point2::new(x0, y0 + side),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        assert_abs_diff_eq!(signed_area(&square(0.0, 0.0, 1.0)), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = square(0.0, 0.0, 2.0);
        pts.reverse();
        assert_abs_diff_eq!(signed_area(&pts), -4.0, epsilon = 1e-12);
    }

    #[test]
    fn signed_area_ignores_closing_duplicate() {
        let mut pts = square(0.0, 0.0, 1.0);
        pts.push(pts[0]);
        assert_abs_diff_eq!(signed_area(&pts), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn signed_area_degenerate() {
        assert_abs_diff_eq!(signed_area(&[Point2::new(0.0, 0.0)]), 0.0);
        assert_abs_diff_eq!(signed_area(&[]), 0.0);
    }

    #[test]
    fn orientation_is_enforced() {
        let mut pts = square(0.0, 0.0, 1.0);
        ensure_orientation(&mut pts, false);
        assert!(signed_area(&pts) < 0.0);
        ensure_orientation(&mut pts, true);
        assert!(signed_area(&pts) > 0.0);
    }

    #[test]
    fn point_in_square() {
        let sq = square(0.0, 0.0, 10.0);
        assert!(point_in_loop(&Point2::new(5.0, 5.0), &sq));
        assert!(point_in_loop(&Point2::new(0.1, 9.9), &sq));
        assert!(!point_in_loop(&Point2::new(-0.1, 5.0), &sq));
        assert!(!point_in_loop(&Point2::new(5.0, 10.5), &sq));
    }

    #[test]
    fn point_in_concave_loop() {
        // U shape opening upwards.
        let u = vec![
            Point2::new(0.0, 0.0),
            Point2::new(3.0, 0.0),
            Point2::new(3.0, 3.0),
            Point2::new(2.0, 3.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 3.0),
            Point2::new(0.0, 3.0),
        ];
        assert!(point_in_loop(&Point2::new(0.5, 2.0), &u));
        assert!(!point_in_loop(&Point2::new(1.5, 2.0), &u));
        assert!(point_in_loop(&Point2::new(1.5, 0.5), &u));
    }

    #[test]
    fn centroid_of_offset_square() {
        let c = loop_centroid(&square(2.0, 4.0, 2.0));
        assert_abs_diff_eq!(c.centroid.x, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.centroid.y, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c.area, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn bounds_skip_non_finite() {
        let pts = vec![
            Point2::new(1.0, 2.0),
            Point2::new(f64::NAN, 0.0),
            Point2::new(-1.0, 5.0),
        ];
        let b = Bounds2d::of(&pts).unwrap();
        assert_abs_diff_eq!(b.min.x, -1.0);
        assert_abs_diff_eq!(b.max.y, 5.0);
        assert!(b.contains(&Point2::new(0.0, 3.0)));
        assert!(!b.contains(&Point2::new(2.0, 3.0)));
    }
}
