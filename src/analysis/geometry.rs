// src/analysis/geometry.rs

use nalgebra::Point2;

/// Below this length a lane-center segment has no usable direction.
pub const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Signed perpendicular distance from `p` to the line through `a` and `b`.
///
/// `cross(b - a, p - a) / |b - a|` over the ground plane's (x, z) axes.
/// With the world frame's left-handed ground axes and `a -> b` running from
/// the near to the far end of the lane, positive means right of the line.
/// `None` when `a` and `b` coincide.
pub fn signed_distance_to_line(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> Option<f64> {
    let dir = b - a;
    let norm = dir.norm();
    if norm < MIN_SEGMENT_LENGTH || !norm.is_finite() {
        return None;
    }
    let rel = p - a;
    Some(dir.perp(&rel) / norm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_sign_and_magnitude() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(0.0, 10.0);
        // dir = (0, 10); cross((0,10), (3,5)) = 0*5 - 10*3 = -30
        assert_relative_eq!(
            signed_distance_to_line(&Point2::new(3.0, 5.0), &a, &b).unwrap(),
            -3.0
        );
        assert_relative_eq!(
            signed_distance_to_line(&Point2::new(-2.0, 1.0), &a, &b).unwrap(),
            2.0
        );
    }

    #[test]
    fn test_point_on_line_is_zero() {
        let a = Point2::new(1.0, 1.0);
        let b = Point2::new(4.0, 5.0);
        let d = signed_distance_to_line(&Point2::new(7.0, 9.0), &a, &b).unwrap();
        assert_relative_eq!(d, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_segment() {
        let a = Point2::new(2.0, 2.0);
        assert!(signed_distance_to_line(&Point2::new(0.0, 0.0), &a, &a).is_none());
    }
}
