//! Segment intersection, distance, and hit testing

use crate::model::Wall;
use crate::types::Point;

/// Denominators below this are treated as parallel
const PARALLEL_EPSILON: f64 = 0.001;

/// Intersection of segments `a1-a2` and `b1-b2`
///
/// Returns `None` for parallel (or nearly parallel) segments and for lines
/// that cross outside either segment.
pub fn line_intersect(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<Point> {
    let d1 = a2 - a1;
    let d2 = b2 - b1;
    let denom = d1.cross(&d2);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let w = b1 - a1;
    let t = w.cross(&d2) / denom;
    let u = w.cross(&d1) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    Some(a1 + d1 * t)
}

/// Minimum distance from `p` to segment `a-b`
pub fn distance_point_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let d = b - a;
    let len_sq = d.length_squared();
    if len_sq < 0.001 {
        return p.distance(&a);
    }
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    p.distance(&(a + d * t))
}

/// Wall closest to `pt` strictly within `threshold`
pub fn find_nearest_wall<'a>(pt: Point, walls: &'a [Wall], threshold: f64) -> Option<&'a Wall> {
    let mut best = None;
    let mut best_dist = threshold;
    for wall in walls {
        let d = distance_point_to_segment(pt, wall.start, wall.end);
        if d < best_dist {
            best_dist = d;
            best = Some(wall);
        }
    }
    best
}

/// Even-odd ray casting point-in-polygon test
pub fn point_in_polygon(pt: Point, polygon: &[Point]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > pt.y) != (pj.y > pt.y)
            && pt.x < (pj.x - pi.x) * (pt.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
