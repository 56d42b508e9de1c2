//! 2D point type shared by the plan model and the geometry kernel

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A point (or displacement) in drawing units
///
/// One drawing unit is one inch by convention.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Origin
    pub const ZERO: Point = Point::new(0.0, 0.0);

    /// Length of the vector from the origin to this point
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Squared length (avoids sqrt)
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Unit vector in the same direction, or `self` for a zero vector
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Point::new(self.x / len, self.y / len)
        } else {
            *self
        }
    }

    /// Dot product
    pub fn dot(&self, other: &Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Cross product (z component of the 3D cross product)
    pub fn cross(&self, other: &Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        (*self - *other).length()
    }

    /// Rotate 90 degrees counter-clockwise
    pub fn perpendicular(&self) -> Self {
        Point::new(-self.y, self.x)
    }

    /// True when both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, other: Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(self, scalar: f64) -> Point {
        Point::new(self.x / scalar, self.y / scalar)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_ops() {
        let a = Point::new(3.0, 4.0);
        let b = Point::new(1.0, 1.0);
        assert_eq!(a + b, Point::new(4.0, 5.0));
        assert_eq!(a - b, Point::new(2.0, 3.0));
        assert_eq!(a * 2.0, Point::new(6.0, 8.0));
        assert_eq!(-a, Point::new(-3.0, -4.0));
        assert_eq!(a.length(), 5.0);
    }

    #[test]
    fn test_normalize_zero() {
        assert_eq!(Point::ZERO.normalize(), Point::ZERO);
    }

    #[test]
    fn test_perpendicular() {
        let p = Point::new(1.0, 0.0).perpendicular();
        assert_eq!(p, Point::new(0.0, 1.0));
        assert_eq!(Point::new(2.0, 5.0).cross(&Point::new(2.0, 5.0)), 0.0);
    }
}
