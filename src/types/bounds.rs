//! Axis-aligned bounds of plan geometry

use super::Point;
use std::fmt;

/// 2D bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox2D {
    /// Minimum point (lower-left corner)
    pub min: Point,
    /// Maximum point (upper-right corner)
    pub max: Point,
}

impl BoundingBox2D {
    /// Create a new bounding box from min and max points
    pub fn new(min: Point, max: Point) -> Self {
        BoundingBox2D { min, max }
    }

    /// Create a bounding box from a single point
    pub fn from_point(point: Point) -> Self {
        BoundingBox2D {
            min: point,
            max: point,
        }
    }

    /// Create a bounding box that contains all given points
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let mut bounds = BoundingBox2D::from_point(*iter.next()?);
        for point in iter {
            bounds.expand_to_include(*point);
        }
        Some(bounds)
    }

    /// Get the width of the bounding box
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Get the height of the bounding box
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Get the center point of the bounding box
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Check if this bounding box contains a point
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Expand the bounding box to include another point
    pub fn expand_to_include(&mut self, point: Point) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Grow the box by `amount` on every side
    pub fn padded(&self, amount: f64) -> Self {
        BoundingBox2D {
            min: Point::new(self.min.x - amount, self.min.y - amount),
            max: Point::new(self.max.x + amount, self.max.y + amount),
        }
    }
}

impl fmt::Display for BoundingBox2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} - {}]", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let pts = [Point::new(1.0, 5.0), Point::new(-2.0, 3.0), Point::new(4.0, -1.0)];
        let bb = BoundingBox2D::from_points(&pts).unwrap();
        assert_eq!(bb.min, Point::new(-2.0, -1.0));
        assert_eq!(bb.max, Point::new(4.0, 5.0));
        assert_eq!(bb.width(), 6.0);
        assert_eq!(bb.height(), 6.0);
    }

    #[test]
    fn test_empty() {
        let pts: [Point; 0] = [];
        assert!(BoundingBox2D::from_points(&pts).is_none());
    }

    #[test]
    fn test_padded() {
        let bb = BoundingBox2D::new(Point::ZERO, Point::new(10.0, 10.0)).padded(2.0);
        assert_eq!(bb.min, Point::new(-2.0, -2.0));
        assert!(bb.contains(Point::new(11.0, 11.0)));
    }
}
