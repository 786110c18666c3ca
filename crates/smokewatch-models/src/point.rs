//! Image-space point type.

use serde::{Deserialize, Serialize};

/// A point in pixel coordinates (origin top-left, y pointing down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point in pixels.
    pub fn distance(&self, other: &Point2D) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Round to integer pixel coordinates for drawing.
    pub fn to_pixel(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

impl From<(f32, f32)> for Point2D {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let nose = Point2D::new(320.0, 240.0);
        let tip = Point2D::new(350.0, 260.0);
        assert!((nose.distance(&tip) - 36.055).abs() < 0.01);
        assert_eq!(nose.distance(&nose), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Point2D::new(320.0, 240.0);
        let b = Point2D::new(500.0, 400.0);
        assert_eq!(a.distance(&b), b.distance(&a));
        assert!((a.distance(&b) - 240.83).abs() < 0.01);
    }

    #[test]
    fn test_to_pixel_rounds() {
        assert_eq!(Point2D::new(10.4, 20.6).to_pixel(), (10, 21));
    }
}
