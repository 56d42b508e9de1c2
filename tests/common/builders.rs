//! Test plan builders.
//!
//! `sample_plan()` holds at least one of every entity kind the model
//! supports; `rectangle_plan()` is the smallest plan that encloses a room.

#![allow(dead_code)]

use sketchport::model::{DamageZone, DoorType, TradeElement, TradePath, WindowType};
use sketchport::{
    ArcWall, DimensionLine, Door, Fixture, FloorPlanData, Label, Point, Room, TradeLayer,
    TradeLayerType, Wall, Window,
};

/// Four walls `w1..w4` around a `width` by `depth` rectangle at the origin.
pub fn rectangle_plan(width: f64, depth: f64) -> FloorPlanData {
    let mut plan = FloorPlanData::new();
    plan.walls = rectangle_walls("w", Point::ZERO, width, depth);
    plan
}

/// Walls `<prefix>1..<prefix>4` running counter-clockwise from `origin`.
pub fn rectangle_walls(prefix: &str, origin: Point, width: f64, depth: f64) -> Vec<Wall> {
    let corners = [
        origin,
        Point::new(origin.x + width, origin.y),
        Point::new(origin.x + width, origin.y + depth),
        Point::new(origin.x, origin.y + depth),
    ];
    (0..4)
        .map(|i| Wall::new(format!("{}{}", prefix, i + 1), corners[i], corners[(i + 1) % 4]))
        .collect()
}

/// A 12' x 10' room with every entity kind attached.
pub fn sample_plan() -> FloorPlanData {
    let mut plan = rectangle_plan(144.0, 120.0);
    plan.walls[2] = plan.walls[2].clone().with_thickness(8.0).with_height(108.0);

    plan.arc_walls.push(ArcWall::new(
        "a1",
        Point::new(144.0, 0.0),
        Point::new(200.0, 60.0),
        Point::new(144.0, 120.0),
    ));

    let mut entry = Door::new("d1", "w1", 0.5, 36.0);
    entry.door_type = DoorType::Single;
    entry.swing_angle = Some(90.0);
    plan.doors.push(entry);
    let mut closet = Door::new("d2", "w3", 0.25, 30.0);
    closet.door_type = DoorType::Sliding;
    plan.doors.push(closet);

    let mut window = Window::new("win1", "w2", 0.5, 48.0);
    window.window_type = WindowType::Standard;
    window.sill_height = Some(30.0);
    plan.windows.push(window);

    let mut sink = Fixture::new("f1", Point::new(24.0, 100.0), "sink");
    sink.width = Some(24.0);
    sink.depth = Some(20.0);
    plan.fixtures.push(sink);

    let mut room = Room::new("r1", "Kitchen");
    room.wall_ids = vec!["w1".into(), "w2".into(), "w3".into(), "w4".into()];
    room.center = Point::new(72.0, 60.0);
    room.area = 120.0;
    plan.rooms.push(room);

    plan.dimensions
        .push(DimensionLine::new("dim1", Point::new(0.0, 0.0), Point::new(144.0, 0.0)));
    plan.labels.push(Label::new("l1", Point::new(72.0, 30.0), "North Kitchen"));

    let mut electrical = TradeLayer::new("t1", TradeLayerType::Electrical);
    electrical.elements.push(TradeElement {
        id: "e1".into(),
        symbol: "outlet".into(),
        position: Point::new(10.0, 10.0),
        rotation: 90.0,
        label: Some("GFCI".into()),
    });
    electrical.paths.push(TradePath {
        id: "p1".into(),
        path_type: "circuit".into(),
        points: vec![Point::new(10.0, 10.0), Point::new(60.0, 10.0), Point::new(60.0, 50.0)],
        stroke_width: 2.0,
    });
    plan.trade_layers.push(electrical);

    let mut damage = TradeLayer::new("t2", TradeLayerType::Damage);
    damage.opacity = 0.5;
    damage.damage_zones.push(DamageZone {
        id: "z1".into(),
        points: vec![Point::new(0.0, 0.0), Point::new(40.0, 0.0), Point::new(40.0, 40.0)],
        damage_class: "2".into(),
        iicrc_category: "1".into(),
        label: None,
    });
    plan.trade_layers.push(damage);

    plan
}

/// `plan` plus a door, a window and a room whose walls do not exist.
pub fn with_dangling_references(mut plan: FloorPlanData) -> FloorPlanData {
    plan.doors.push(Door::new("d-ghost", "ghost-wall", 0.5, 36.0));
    plan.windows.push(Window::new("win-ghost", "ghost-wall", 0.5, 36.0));
    let mut room = Room::new("r-ghost", "Ghost Closet");
    room.wall_ids = vec!["ghost-a".into(), "ghost-b".into(), "ghost-c".into()];
    room.center = Point::new(500.0, 500.0);
    room.area = 40.0;
    plan.rooms.push(room);
    plan
}

/// A `cols` by `rows` grid of adjoining square rooms with shared walls.
pub fn grid_plan(cols: usize, rows: usize, cell: f64) -> FloorPlanData {
    let mut plan = FloorPlanData::new();
    let mut next = 0;
    let mut wall = |a: Point, b: Point, plan: &mut FloorPlanData| {
        next += 1;
        plan.walls.push(Wall::new(format!("g{}", next), a, b));
    };
    for r in 0..=rows {
        for c in 0..cols {
            let y = r as f64 * cell;
            let a = Point::new(c as f64 * cell, y);
            let b = Point::new((c + 1) as f64 * cell, y);
            wall(a, b, &mut plan);
        }
    }
    for c in 0..=cols {
        for r in 0..rows {
            let x = c as f64 * cell;
            let a = Point::new(x, r as f64 * cell);
            let b = Point::new(x, (r + 1) as f64 * cell);
            wall(a, b, &mut plan);
        }
    }
    plan
}
