//! Polygon measurements

use crate::types::Point;

/// Signed shoelace area; positive for counter-clockwise winding
pub fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum / 2.0
}

/// Enclosed area in square feet
///
/// `scale` is drawing units per foot: 12 for inch coordinates, 1 when the
/// coordinates are already feet. Winding order does not matter.
pub fn polygon_area_sq_ft(points: &[Point], scale: f64) -> f64 {
    if scale <= 0.0 {
        return 0.0;
    }
    signed_area(points).abs() / (scale * scale)
}

/// Length of the closed boundary
pub fn polygon_perimeter(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| points[i].distance(&points[(i + 1) % n])).sum()
}

/// Area-weighted centroid; degenerate polygons use the vertex average
pub fn polygon_centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ZERO;
    }
    let area = signed_area(points);
    if area.abs() < 1e-9 {
        let sum = points.iter().fold(Point::ZERO, |acc, p| acc + *p);
        return sum / points.len() as f64;
    }

    let n = points.len();
    let (mut cx, mut cy) = (0.0, 0.0);
    for i in 0..n {
        let (p, q) = (points[i], points[(i + 1) % n]);
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    Point::new(cx / (6.0 * area), cy / (6.0 * area))
}

/// Triangle index triples fanning from vertex 0
pub fn fan_triangulate(vertex_count: usize) -> Vec<[usize; 3]> {
    if vertex_count < 3 {
        return Vec::new();
    }
    (1..vertex_count - 1).map(|i| [0, i, i + 1]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    #[test]
    fn test_unit_square_area() {
        assert_eq!(polygon_area_sq_ft(&square(), 1.0), 100.0);
    }

    #[test]
    fn test_reversed_winding_same_area() {
        let mut pts = square();
        pts.reverse();
        assert_eq!(polygon_area_sq_ft(&pts, 1.0), 100.0);
        assert!(signed_area(&pts) < 0.0);
    }

    #[test]
    fn test_inch_scale() {
        let pts: Vec<Point> = square().into_iter().map(|p| p * 12.0).collect();
        assert!((polygon_area_sq_ft(&pts, 12.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_perimeter_and_centroid() {
        assert_eq!(polygon_perimeter(&square()), 40.0);
        assert_eq!(polygon_centroid(&square()), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_l_shape_centroid_inside() {
        let l = [
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            Point::new(20.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 20.0),
            Point::new(0.0, 20.0),
        ];
        let c = polygon_centroid(&l);
        assert!(crate::geometry::point_in_polygon(c, &l));
    }

    #[test]
    fn test_fan() {
        assert_eq!(fan_triangulate(4), vec![[0, 1, 2], [0, 2, 3]]);
        assert!(fan_triangulate(2).is_empty());
    }
}
