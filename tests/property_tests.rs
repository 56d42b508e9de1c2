//! Property tests for report accounting and plan geometry

mod common;

use proptest::prelude::*;
use std::f64::consts::FRAC_PI_2;

use common::builders::{rectangle_plan, rectangle_walls};
use sketchport::geometry::{arc_segment_count, polygon_area_sq_ft, signed_area};
use sketchport::report::{Converted, Skipped};
use sketchport::{
    detect_rooms, export, import, CompatibilityReport, FileFormat, ImportConfiguration, Point,
    RoomDetectionConfig, TargetFormat, Wall,
};

const CONVERTED: [Converted; 8] = [
    Converted::Walls,
    Converted::Rooms,
    Converted::Doors,
    Converted::Windows,
    Converted::Fixtures,
    Converted::Labels,
    Converted::Dimensions,
    Converted::TradeLayers,
];

const SKIPPED: [Skipped; 7] = [
    Skipped::Blocks,
    Skipped::Hatches,
    Skipped::ThreeDSolids,
    Skipped::CustomLayers,
    Skipped::Materials,
    Skipped::Annotations,
    Skipped::Other,
];

proptest! {
    #[test]
    fn test_conversion_rate_bounds(
        converted in prop::collection::vec((0usize..8, 0usize..50), 0..10),
        skipped in prop::collection::vec((0usize..7, 0usize..50), 0..10),
    ) {
        let mut report = CompatibilityReport::new(FileFormat::Dxf, "p.dxf");
        for (kind, n) in &converted {
            report.convert_n(CONVERTED[*kind], *n);
        }
        for (kind, n) in &skipped {
            report.skip_n(SKIPPED[*kind], *n);
        }
        let report = report.finalize();

        let c: usize = converted.iter().map(|(_, n)| n).sum();
        let s: usize = skipped.iter().map(|(_, n)| n).sum();
        prop_assert_eq!(report.total_converted, c);
        prop_assert_eq!(report.total_skipped, s);
        prop_assert_eq!(report.total_entities_in_source, c + s);
        prop_assert!(report.conversion_rate <= 100);
        if c + s == 0 {
            prop_assert_eq!(report.conversion_rate, 100);
        }
        if s == 0 {
            prop_assert_eq!(report.conversion_rate, 100);
        }
        if c == 0 && s > 0 {
            prop_assert_eq!(report.conversion_rate, 0);
        }
    }

    #[test]
    fn test_finalize_is_idempotent(walls in 0usize..100, other in 0usize..100) {
        let mut report = CompatibilityReport::new(FileFormat::Svg, "p.svg");
        report.convert_n(Converted::Walls, walls);
        report.skip_n(Skipped::Other, other);
        let once = report.finalize();
        let twice = once.clone().finalize();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn test_area_is_winding_invariant(
        x in -500.0f64..500.0,
        y in -500.0f64..500.0,
        w in 1.0f64..400.0,
        h in 1.0f64..400.0,
    ) {
        let ccw = vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ];
        let cw: Vec<Point> = ccw.iter().rev().copied().collect();

        prop_assert!(signed_area(&ccw) > 0.0);
        prop_assert!(signed_area(&cw) < 0.0);
        let a = polygon_area_sq_ft(&ccw, 12.0);
        let b = polygon_area_sq_ft(&cw, 12.0);
        prop_assert!((a - b).abs() < 1e-9 * a.max(1.0));
        prop_assert!((a - w * h / 144.0).abs() < 1e-6 * a.max(1.0));
    }

    #[test]
    fn test_arc_segments_stay_in_range(radius in 0.0f64..10_000.0, sweep in 0.0f64..7.0) {
        let n = arc_segment_count(radius, sweep);
        prop_assert!((4..=32).contains(&n));
    }

    #[test]
    fn test_arc_segments_grow_with_radius(r in 1.0f64..2_000.0, grow in 0.0f64..2_000.0) {
        prop_assert!(arc_segment_count(r, FRAC_PI_2) <= arc_segment_count(r + grow, FRAC_PI_2));
    }

    #[test]
    fn test_rectangle_encloses_one_room(
        x in -1_000.0f64..1_000.0,
        y in -1_000.0f64..1_000.0,
        w in 24.0f64..600.0,
        h in 24.0f64..600.0,
    ) {
        let walls = rectangle_walls("w", Point::new(x, y), w, h);
        let rooms = detect_rooms(&walls, &RoomDetectionConfig::default());
        prop_assert_eq!(rooms.len(), 1);
        prop_assert!((rooms[0].area - w * h / 144.0).abs() < 0.01);
        prop_assert!((rooms[0].center.x - (x + w / 2.0)).abs() < 1e-6);
        prop_assert!((rooms[0].center.y - (y + h / 2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_sketch_round_trip_keeps_walls(
        coords in prop::collection::vec((-5_000.0f64..5_000.0, -5_000.0f64..5_000.0), 2..20),
    ) {
        let mut plan = rectangle_plan(96.0, 96.0);
        for (i, pair) in coords.windows(2).enumerate() {
            let (a, b) = (Point::new(pair[0].0, pair[0].1), Point::new(pair[1].0, pair[1].1));
            plan.walls.push(Wall::new(format!("x{}", i), a, b));
        }
        let bytes = export(&plan, TargetFormat::SketchPlan, &common::pinned_options())
            .unwrap()
            .data;
        let back = import(&bytes, "p.splan", &ImportConfiguration::default()).unwrap().plan;

        prop_assert_eq!(back.walls.len(), plan.walls.len());
        for (a, b) in back.walls.iter().zip(&plan.walls) {
            prop_assert_eq!(&a.id, &b.id);
            prop_assert!(a.start.distance(&b.start) < 1e-3);
            prop_assert!(a.end.distance(&b.end) < 1e-3);
        }
    }
}

#[test]
fn test_reference_square_area() {
    let square = [
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
        Point::new(0.0, 10.0),
    ];
    assert_eq!(polygon_area_sq_ft(&square, 1.0), 100.0);
}

#[test]
fn test_reference_arc_segments() {
    // 120" radius quarter arc: round(188.5 / 12) chords
    assert_eq!(arc_segment_count(120.0, FRAC_PI_2), 16);
    assert_eq!(arc_segment_count(1.0, FRAC_PI_2), 4);
    assert_eq!(arc_segment_count(10_000.0, FRAC_PI_2), 32);
}

#[test]
fn test_open_chain_has_no_room() {
    let walls = vec![
        Wall::new("a", Point::new(0.0, 0.0), Point::new(120.0, 0.0)),
        Wall::new("b", Point::new(120.0, 0.0), Point::new(120.0, 120.0)),
        Wall::new("c", Point::new(120.0, 120.0), Point::new(0.0, 120.0)),
    ];
    assert!(detect_rooms(&walls, &RoomDetectionConfig::default()).is_empty());
}

#[test]
fn test_grid_rooms() {
    let plan = common::builders::grid_plan(3, 2, 120.0);
    let rooms = detect_rooms(&plan.walls, &RoomDetectionConfig::default());
    assert_eq!(rooms.len(), 6);
    for room in &rooms {
        assert!((room.area - 100.0).abs() < 0.01);
        assert_eq!(room.wall_ids.len(), 4);
    }
}
