//! SketchPlan import

use ahash::AHashSet;
use std::str::FromStr;

use crate::detect::{FileFormat, SKETCH_ROOT_TAG};
use crate::io::context::{ImportContext, SkipRule};
use crate::io::xml::{parse_document, parse_number, XmlElement};
use crate::io::{ImportConfiguration, ImportResult};
use crate::model::{
    ArcWall, DamageZone, DimensionLine, Door, DoorType, Fixture, Label, MeasurementUnit, Room,
    TradeElement, TradeLayer, TradeLayerType, TradePath, Wall, Window, WindowType,
    DEFAULT_DIMENSION_OFFSET, DEFAULT_FONT_SIZE,
};
use crate::report::{Converted, ReportCategory, Severity, Skipped};
use crate::types::Point;

const MALFORMED_ELEMENT: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Geometry,
    "required attributes are missing or not numeric",
);

const DANGLING_REFERENCE: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Openings,
    "the referenced wall is not in the plan",
);

const UNKNOWN_LAYER_TYPE: SkipRule = SkipRule::new(
    Skipped::CustomLayers,
    Severity::Warning,
    ReportCategory::TradeLayers,
    "trade layer type is not recognised",
);

fn point(el: &XmlElement, x: &str, y: &str) -> Option<Point> {
    Some(Point::new(el.attr_f64(x)?, el.attr_f64(y)?)).filter(Point::is_finite)
}

fn flag(el: &XmlElement, name: &str) -> Option<bool> {
    match el.attr(name)? {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// `x,y x,y ...`; any unreadable pair rejects the whole list
fn points(value: &str) -> Option<Vec<Point>> {
    value
        .split_whitespace()
        .map(|pair| {
            let (x, y) = pair.split_once(',')?;
            Some(Point::new(parse_number(x)?, parse_number(y)?))
        })
        .collect()
}

/// Children of the `<group>` section, with an id; others are inert
fn entities<'a>(root: &'a XmlElement, group: &'a str, name: &'a str) -> impl Iterator<Item = (&'a str, &'a XmlElement)> + 'a {
    root.elements_named(group)
        .flat_map(move |g| g.elements_named(name))
        .filter_map(|el| el.attr("id").filter(|id| !id.is_empty()).map(|id| (id, el)))
}

struct SketchImport<'c, 'a> {
    ctx: &'c mut ImportContext<'a>,
}

impl SketchImport<'_, '_> {
    fn read_walls(&mut self, root: &XmlElement) {
        let config = self.ctx.config;
        for (id, el) in entities(root, "Walls", "Wall") {
            let (Some(start), Some(end)) = (point(el, "x1", "y1"), point(el, "x2", "y2")) else {
                self.ctx.skip("wall", MALFORMED_ELEMENT);
                continue;
            };
            self.ctx.plan.walls.push(Wall {
                id: id.to_string(),
                start,
                end,
                thickness: el.attr_f64("thickness").unwrap_or(config.default_wall_thickness),
                height: el.attr_f64("height").unwrap_or(config.default_wall_height),
            });
            self.ctx.report.convert(Converted::Walls);
        }
        for (id, el) in entities(root, "ArcWalls", "ArcWall") {
            let (Some(start), Some(control), Some(end)) =
                (point(el, "x1", "y1"), point(el, "cx", "cy"), point(el, "x2", "y2"))
            else {
                self.ctx.skip("arc wall", MALFORMED_ELEMENT);
                continue;
            };
            let mut arc = ArcWall::new(id, start, control, end);
            arc.thickness = el.attr_f64("thickness").unwrap_or(config.default_wall_thickness);
            arc.height = el.attr_f64("height").unwrap_or(config.default_wall_height);
            self.ctx.plan.arc_walls.push(arc);
            self.ctx.report.convert(Converted::Walls);
        }
    }

    fn read_openings(&mut self, root: &XmlElement) {
        let wall_ids: AHashSet<String> =
            self.ctx.plan.walls.iter().map(|w| w.id.clone()).collect();

        for (id, el) in entities(root, "Doors", "Door") {
            let (Some(wall_id), Some(position), Some(width)) =
                (el.attr("wallId"), el.attr_f64("position"), el.attr_f64("width"))
            else {
                self.ctx.skip("door", MALFORMED_ELEMENT);
                continue;
            };
            if !wall_ids.contains(wall_id) {
                self.ctx.skip("door", DANGLING_REFERENCE);
                continue;
            }
            let mut door = Door::new(id, wall_id, position, width);
            if let Some(kind) = el.attr("type") {
                match DoorType::from_str(kind) {
                    Ok(kind) => door.door_type = kind,
                    Err(_) => self.ctx.report.warning(
                        ReportCategory::Openings,
                        format!("Door {} has unknown type '{}'; imported as single", id, kind),
                    ),
                }
            }
            door.swing_angle = el.attr_f64("swingAngle");
            door.flip_side = flag(el, "flipSide");
            self.ctx.plan.doors.push(door);
            self.ctx.report.convert(Converted::Doors);
        }

        for (id, el) in entities(root, "Windows", "Window") {
            let (Some(wall_id), Some(position), Some(width)) =
                (el.attr("wallId"), el.attr_f64("position"), el.attr_f64("width"))
            else {
                self.ctx.skip("window", MALFORMED_ELEMENT);
                continue;
            };
            if !wall_ids.contains(wall_id) {
                self.ctx.skip("window", DANGLING_REFERENCE);
                continue;
            }
            let mut window = Window::new(id, wall_id, position, width);
            if let Some(kind) = el.attr("type") {
                match WindowType::from_str(kind) {
                    Ok(kind) => window.window_type = kind,
                    Err(_) => self.ctx.report.warning(
                        ReportCategory::Openings,
                        format!("Window {} has unknown type '{}'; imported as standard", id, kind),
                    ),
                }
            }
            window.sill_height = el.attr_f64("sillHeight");
            self.ctx.plan.windows.push(window);
            self.ctx.report.convert(Converted::Windows);
        }

        for (id, el) in entities(root, "Rooms", "Room") {
            let refs: Vec<String> = el
                .elements_named("WallRef")
                .filter_map(|r| r.attr("id"))
                .map(str::to_string)
                .collect();
            if refs.iter().any(|r| !wall_ids.contains(r)) {
                self.ctx.skip("room", DANGLING_REFERENCE);
                continue;
            }
            let mut room = Room::new(id, el.attr("name").unwrap_or("Room"));
            room.wall_ids = refs;
            room.center = point(el, "cx", "cy").unwrap_or(Point::ZERO);
            room.area = el.attr_f64("area").unwrap_or(0.0);
            self.ctx.plan.rooms.push(room);
            self.ctx.report.convert(Converted::Rooms);
        }
    }

    fn read_annotations(&mut self, root: &XmlElement) {
        for (id, el) in entities(root, "Fixtures", "Fixture") {
            let Some(position) = point(el, "x", "y") else {
                self.ctx.skip("fixture", MALFORMED_ELEMENT);
                continue;
            };
            let mut fixture = Fixture::new(id, position, el.attr("type").unwrap_or("generic"));
            fixture.rotation = el.attr_f64("rotation").unwrap_or(0.0);
            fixture.width = el.attr_f64("width");
            fixture.depth = el.attr_f64("depth");
            self.ctx.plan.fixtures.push(fixture);
            self.ctx.report.convert(Converted::Fixtures);
        }

        for (id, el) in entities(root, "Dimensions", "Dimension") {
            let (Some(start), Some(end)) = (point(el, "x1", "y1"), point(el, "x2", "y2")) else {
                self.ctx.skip("dimension", MALFORMED_ELEMENT);
                continue;
            };
            let mut dim = DimensionLine::new(id, start, end);
            dim.offset = el.attr_f64("offset").unwrap_or(DEFAULT_DIMENSION_OFFSET);
            dim.is_auto = flag(el, "auto").unwrap_or(false);
            self.ctx.plan.dimensions.push(dim);
            self.ctx.report.convert(Converted::Dimensions);
        }

        for (id, el) in entities(root, "Labels", "Label") {
            let Some(position) = point(el, "x", "y") else {
                self.ctx.skip("label", MALFORMED_ELEMENT);
                continue;
            };
            let mut label = Label::new(id, position, el.text());
            label.font_size = el.attr_f64("fontSize").unwrap_or(DEFAULT_FONT_SIZE);
            label.rotation = el.attr_f64("rotation").unwrap_or(0.0);
            self.ctx.plan.labels.push(label);
            self.ctx.report.convert(Converted::Labels);
        }
    }

    fn read_trade_layers(&mut self, root: &XmlElement) {
        for (id, el) in entities(root, "TradeLayers", "TradeLayer") {
            let Some(layer_type) = el.attr("type").and_then(|t| TradeLayerType::from_str(t).ok())
            else {
                self.ctx.skip("trade layer", UNKNOWN_LAYER_TYPE);
                continue;
            };
            let mut layer = TradeLayer::new(id, layer_type);
            if let Some(name) = el.attr("name") {
                layer.name = name.to_string();
            }
            layer.visible = flag(el, "visible").unwrap_or(true);
            layer.locked = flag(el, "locked").unwrap_or(false);
            layer.opacity = el.attr_f64("opacity").unwrap_or(1.0).clamp(0.0, 1.0);

            let mut malformed = 0;
            for child in el.elements() {
                let Some(child_id) = child.attr("id").filter(|id| !id.is_empty()) else {
                    continue;
                };
                let label = child.attr("label").map(str::to_string);
                match child.local_name() {
                    "Element" => match point(child, "x", "y") {
                        Some(position) => layer.elements.push(TradeElement {
                            id: child_id.to_string(),
                            symbol: child.attr("type").unwrap_or_default().to_string(),
                            position,
                            rotation: child.attr_f64("rotation").unwrap_or(0.0),
                            label,
                        }),
                        None => malformed += 1,
                    },
                    "Path" => match child.attr("points").and_then(points) {
                        Some(points) => layer.paths.push(TradePath {
                            id: child_id.to_string(),
                            path_type: child.attr("type").unwrap_or_default().to_string(),
                            points,
                            stroke_width: child.attr_f64("strokeWidth").unwrap_or(1.0),
                        }),
                        None => malformed += 1,
                    },
                    "DamageZone" => match child.attr("points").and_then(points) {
                        Some(points) => layer.damage_zones.push(DamageZone {
                            id: child_id.to_string(),
                            points,
                            damage_class: child.attr("damageClass").unwrap_or("1").to_string(),
                            iicrc_category: child.attr("iicrcCategory").unwrap_or("1").to_string(),
                            label,
                        }),
                        None => malformed += 1,
                    },
                    _ => {}
                }
            }
            if malformed > 0 {
                self.ctx.report.warning(
                    ReportCategory::TradeLayers,
                    format!("{} malformed item(s) dropped from trade layer {}", malformed, id),
                );
            }
            self.ctx.plan.trade_layers.push(layer);
            self.ctx.report.convert(Converted::TradeLayers);
        }
    }
}

/// Import SketchPlan content
pub fn import_sketch(content: &[u8], file_name: &str, config: &ImportConfiguration) -> ImportResult {
    let mut ctx = ImportContext::new(FileFormat::SketchPlan, "splan", file_name, config);
    let text = String::from_utf8_lossy(content);
    let root = match parse_document(&text) {
        Ok(root) => root,
        Err(err) => return ctx.fail(format!("SketchPlan parse error: {}", err)),
    };
    if root.local_name() != SKETCH_ROOT_TAG {
        return ctx.fail(format!(
            "Root element is <{}>, expected <{}>",
            root.local_name(),
            SKETCH_ROOT_TAG
        ));
    }

    if let Some(version) = root.attr("version") {
        ctx.report.source_version = Some(version.to_string());
        ctx.report
            .info(ReportCategory::Metadata, format!("SketchPlan version {}", version));
    }
    if let Some(scale) = root.attr_f64("scale").filter(|s| s.is_finite() && *s > 0.0) {
        ctx.plan.scale = scale;
    }
    if let Some(units) = root.attr("units") {
        match MeasurementUnit::from_str(units) {
            Ok(units) => ctx.plan.units = units,
            Err(_) => ctx.report.warning(
                ReportCategory::Metadata,
                format!("Unknown units '{}'; using imperial", units),
            ),
        }
    }

    let mut import = SketchImport { ctx: &mut ctx };
    import.read_walls(&root);
    import.read_openings(&root);
    import.read_annotations(&root);
    import.read_trade_layers(&root);
    ctx.finish(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::sketch::SketchExporter;
    use crate::io::PlanExporter;
    use crate::model::FloorPlanData;

    fn sample_plan() -> FloorPlanData {
        let mut plan = FloorPlanData::new();
        plan.units = MeasurementUnit::Metric;
        plan.walls.push(Wall::new("w1", Point::new(0.0, 0.0), Point::new(144.25, 0.0)));
        plan.walls.push(
            Wall::new("w2", Point::new(144.25, 0.0), Point::new(144.25, 96.125)).with_thickness(4.5),
        );
        plan.arc_walls.push(ArcWall::new(
            "a1",
            Point::new(0.0, 0.0),
            Point::new(-20.0, 48.0),
            Point::new(0.0, 96.0),
        ));
        let mut door = Door::new("d1", "w1", 0.3333, 30.0);
        door.door_type = DoorType::Pocket;
        door.flip_side = Some(false);
        plan.doors.push(door);
        let mut window = Window::new("win1", "w2", 0.5, 36.0);
        window.sill_height = Some(42.0);
        plan.windows.push(window);
        let mut fixture = Fixture::new("f1", Point::new(10.0, 10.0), "toilet");
        fixture.width = Some(18.0);
        plan.fixtures.push(fixture);
        let mut room = Room::new("r1", "Den \"North\"");
        room.wall_ids = vec!["w1".into(), "w2".into()];
        room.area = 96.1;
        plan.rooms.push(room);
        plan.dimensions.push(DimensionLine::new("dim1", Point::ZERO, Point::new(144.25, 0.0)));
        plan.labels.push(Label::new("l1", Point::new(5.0, 5.0), "Kitchen & Bath"));
        let mut layer = TradeLayer::new("t1", TradeLayerType::Plumbing);
        layer.visible = false;
        layer.elements.push(TradeElement {
            id: "e1".into(),
            symbol: "valve".into(),
            position: Point::new(3.0, 4.0),
            rotation: 90.0,
            label: Some("Main".into()),
        });
        layer.paths.push(TradePath {
            id: "p1".into(),
            path_type: "supply".into(),
            points: vec![Point::new(0.0, 0.0), Point::new(10.5, 0.0)],
            stroke_width: 2.0,
        });
        layer.damage_zones.push(DamageZone {
            id: "z1".into(),
            points: vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 1.0)],
            damage_class: "2".into(),
            iicrc_category: "3".into(),
            label: None,
        });
        plan.trade_layers.push(layer);
        plan
    }

    #[test]
    fn test_round_trip_is_exact_at_written_precision() {
        let plan = sample_plan();
        let bytes = SketchExporter::new(&plan).write_to_vec().unwrap();
        let result = import_sketch(&bytes, "p.splan", &ImportConfiguration::default());
        assert_eq!(result.plan, plan);
        assert_eq!(result.report.conversion_rate, 100);
        assert_eq!(result.report.total_skipped, 0);
        assert_eq!(result.report.converted.trade_layers, 1);
        assert_eq!(result.report.source_version.as_deref(), Some("1"));
    }

    #[test]
    fn test_elements_without_id_are_inert() {
        let xml = r#"<SketchPlan version="1"><Walls><Wall x1="0" y1="0" x2="1" y2="0"/>
            <Wall id="w1" x1="0" y1="0" x2="10" y2="0"/></Walls><Extra id="x"/></SketchPlan>"#;
        let result = import_sketch(xml.as_bytes(), "p.splan", &ImportConfiguration::default());
        assert_eq!(result.plan.walls.len(), 1);
        assert_eq!(result.report.total_entities_in_source, 1);
    }

    #[test]
    fn test_dangling_and_malformed_are_reported() {
        let xml = r#"<SketchPlan><Walls><Wall id="w1" x1="0" y1="0" x2="10" y2="0"/>
            <Wall id="w2" x1="zero" y1="0" x2="10" y2="0"/></Walls>
            <Doors><Door id="d1" wallId="nope" position="0.5" width="32"/></Doors>
            <Rooms><Room id="r1"><WallRef id="w1"/><WallRef id="ghost"/></Room></Rooms>
            </SketchPlan>"#;
        let result = import_sketch(xml.as_bytes(), "p.splan", &ImportConfiguration::default());
        assert_eq!(result.plan.walls.len(), 1);
        assert!(result.plan.doors.is_empty());
        assert!(result.plan.rooms.is_empty());
        assert_eq!(result.report.skipped.other, 3);
        assert!(result.plan.integrity_issues().is_empty());
    }

    #[test]
    fn test_wrong_root_fails() {
        let result = import_sketch(b"<svg/>", "p.splan", &ImportConfiguration::default());
        assert!(result.plan.is_empty());
        assert!(result.report.has_severity(Severity::Error));

        let broken = import_sketch(b"<SketchPlan><Walls></SketchPlan>", "p.splan", &ImportConfiguration::default());
        assert!(broken.report.items[0].message.starts_with("SketchPlan parse error"));
    }
}
