//! Chord approximation of arcs, circles, and ellipses
//!
//! The segment-count heuristics are fixed so exported files stay comparable
//! across versions: arcs use one chord per 12 units of arc length clamped to
//! 4..=32, drafting circles use 16 chords above radius 24 and 8 below, and
//! markup circles and ellipses always use 12.

use std::f64::consts::TAU;

use crate::types::Point;

/// Chords per circle or ellipse in vector markup
pub const MARKUP_CIRCLE_SEGMENTS: usize = 12;

const MIN_ARC_SEGMENTS: usize = 4;
const MAX_ARC_SEGMENTS: usize = 32;
const ARC_LENGTH_PER_SEGMENT: f64 = 12.0;

/// Normalized counter-clockwise sweep from `start` to `end` (radians)
fn ccw_sweep(start: f64, end: f64) -> f64 {
    let sweep = end - start;
    if sweep <= 0.0 {
        sweep + TAU
    } else {
        sweep
    }
}

/// Number of chords for an arc of `radius` sweeping `sweep` radians
pub fn arc_segment_count(radius: f64, sweep: f64) -> usize {
    let raw = (radius.abs() * sweep.abs() / ARC_LENGTH_PER_SEGMENT).round();
    if !raw.is_finite() {
        return MIN_ARC_SEGMENTS;
    }
    (raw as usize).clamp(MIN_ARC_SEGMENTS, MAX_ARC_SEGMENTS)
}

/// Number of chords for a full drafting circle
pub fn circle_segment_count(radius: f64) -> usize {
    if radius > 24.0 {
        16
    } else {
        8
    }
}

/// Points along a counter-clockwise arc, angles in radians
///
/// Returns `segments + 1` points from the start angle to the end angle; an end
/// angle at or before the start wraps around a full turn.
pub fn arc_points(center: Point, radius: f64, start_angle: f64, end_angle: f64) -> Vec<Point> {
    let sweep = ccw_sweep(start_angle, end_angle);
    let segments = arc_segment_count(radius, sweep);
    (0..=segments)
        .map(|i| {
            let a = start_angle + sweep * i as f64 / segments as f64;
            Point::new(center.x + radius * a.cos(), center.y + radius * a.sin())
        })
        .collect()
}

/// Closed ring of `segments` points (the first point is not repeated)
pub fn circle_points(center: Point, radius: f64, segments: usize) -> Vec<Point> {
    ellipse_points(center, radius, radius, segments)
}

/// Closed ring of `segments` points on an axis-aligned ellipse
pub fn ellipse_points(center: Point, rx: f64, ry: f64, segments: usize) -> Vec<Point> {
    let segments = segments.max(3);
    (0..segments)
        .map(|i| {
            let a = TAU * i as f64 / segments as f64;
            Point::new(center.x + rx * a.cos(), center.y + ry * a.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_quarter_arc_radius_120() {
        let n = arc_segment_count(120.0, FRAC_PI_2);
        assert!((4..=32).contains(&n));
        assert_eq!(n, 16);
    }

    #[test]
    fn test_arc_clamps() {
        assert_eq!(arc_segment_count(1.0, FRAC_PI_2), 4);
        assert_eq!(arc_segment_count(10_000.0, TAU), 32);
        assert_eq!(arc_segment_count(f64::INFINITY, 1.0), 4);
    }

    #[test]
    fn test_arc_points_wrap() {
        // 270° → 0° wraps to a 90° sweep
        let pts = arc_points(Point::ZERO, 120.0, 3.0 * FRAC_PI_2, 0.0);
        assert_eq!(pts.len(), 17);
        let last = pts[pts.len() - 1];
        assert!((last.x - 120.0).abs() < 1e-9);
        assert!(last.y.abs() < 1e-9);
    }

    #[test]
    fn test_circle_counts() {
        assert_eq!(circle_segment_count(24.0), 8);
        assert_eq!(circle_segment_count(24.5), 16);
        assert_eq!(circle_points(Point::ZERO, 5.0, 12).len(), 12);
    }
}
