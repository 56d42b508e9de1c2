//! Import, export and room detection throughput on generated grid plans

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sketchport::{
    detect_rooms, export, import, ExportOptions, FloorPlanData, ImportConfiguration, Point,
    RoomDetectionConfig, TargetFormat, Wall,
};

/// `n` by `n` rooms of 10' squares sharing their walls
fn grid_plan(n: usize) -> FloorPlanData {
    let cell = 120.0;
    let mut plan = FloorPlanData::new();
    let mut id = 0;
    for i in 0..=n {
        for j in 0..n {
            let (a, b) = (i as f64 * cell, j as f64 * cell);
            id += 1;
            plan.walls.push(Wall::new(
                format!("h{}", id),
                Point::new(b, a),
                Point::new(b + cell, a),
            ));
            plan.walls.push(Wall::new(
                format!("v{}", id),
                Point::new(a, b),
                Point::new(a, b + cell),
            ));
        }
    }
    plan
}

fn bench_room_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_rooms");
    let config = RoomDetectionConfig::default();
    for n in [4, 8, 16] {
        let plan = grid_plan(n);
        group.bench_with_input(BenchmarkId::from_parameter(n * n), &plan, |b, plan| {
            b.iter(|| detect_rooms(black_box(&plan.walls), &config))
        });
    }
    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let options = ExportOptions::default();
    let config = ImportConfiguration::default();
    let plan = grid_plan(8);

    let mut group = c.benchmark_group("import");
    for target in [TargetFormat::Dxf, TargetFormat::Svg, TargetFormat::Ifc, TargetFormat::SketchPlan] {
        let Ok(payload) = export(&plan, target, &options) else {
            continue;
        };
        let name = format!("grid.{}", target.extension());
        group.bench_function(target.to_string(), |b| {
            b.iter(|| import(black_box(&payload.data), &name, &config))
        });
    }
    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let options = ExportOptions::default();
    let mut plan = grid_plan(8);
    plan.rooms = detect_rooms(&plan.walls, &RoomDetectionConfig::default());

    let mut group = c.benchmark_group("export");
    for target in TargetFormat::ALL {
        group.bench_function(target.to_string(), |b| {
            b.iter(|| export(black_box(&plan), target, &options))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_room_detection, bench_import, bench_export);
criterion_main!(benches);
