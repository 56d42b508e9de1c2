//! IFC (STEP) import
//!
//! Walls come from their placement and extruded body; doors and windows are
//! attached to the nearest imported wall; spaces become rooms. Every other
//! product is counted by type so a sparse result can be explained.

use tracing::debug;

use super::resolver::{EntityGraph, Placement, Profile, ARG_NAME};
use super::step::{parse_step, StepEntity};
use crate::detect::FileFormat;
use crate::geometry::{find_nearest_wall, project_onto_wall};
use crate::io::context::{ImportContext, SkipRule};
use crate::io::{ImportConfiguration, ImportResult};
use crate::model::{Door, Room, Wall, Window, DEFAULT_DOOR_WIDTH, DEFAULT_WINDOW_WIDTH};
use crate::report::{Converted, ReportCategory, Severity, Skipped};
use crate::types::Point;

/// Wall length used when no extruded body resolves
const FALLBACK_WALL_LENGTH: f64 = 120.0;

const WALL_LABEL_FONT: f64 = 12.0;
const OPENING_LABEL_FONT: f64 = 10.0;

/// `OverallWidth` of IfcDoor and IfcWindow
const ARG_OVERALL_WIDTH: usize = 9;

const UNRESOLVED_PLACEMENT: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Geometry,
    "object placement could not be resolved",
);

const SOLID_ELEMENT: SkipRule = SkipRule::new(
    Skipped::ThreeDSolids,
    Severity::Warning,
    ReportCategory::Geometry,
    "3D building elements have no plan equivalent",
);

const MATERIAL_DEFINITION: SkipRule = SkipRule::new(
    Skipped::Materials,
    Severity::Info,
    ReportCategory::Materials,
    "materials and surface styles are not applied",
);

const OTHER_ENTITY: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Info,
    ReportCategory::Geometry,
    "entities of this type are not converted",
);

const WALL_TYPES: [&str; 2] = ["IFCWALL", "IFCWALLSTANDARDCASE"];

/// Types consumed while resolving the converted products
const STRUCTURAL_TYPES: &[&str] = &[
    "IFCWALL",
    "IFCWALLSTANDARDCASE",
    "IFCDOOR",
    "IFCWINDOW",
    "IFCSPACE",
    "IFCCARTESIANPOINT",
    "IFCDIRECTION",
    "IFCLOCALPLACEMENT",
    "IFCAXIS2PLACEMENT2D",
    "IFCAXIS2PLACEMENT3D",
    "IFCOWNERHISTORY",
    "IFCPERSON",
    "IFCORGANIZATION",
    "IFCPERSONANDORGANIZATION",
    "IFCAPPLICATION",
    "IFCPROJECT",
    "IFCSITE",
    "IFCBUILDING",
    "IFCBUILDINGSTOREY",
    "IFCRELAGGREGATES",
    "IFCRELCONTAINEDINSPATIALSTRUCTURE",
    "IFCGEOMETRICREPRESENTATIONCONTEXT",
    "IFCGEOMETRICREPRESENTATIONSUBCONTEXT",
    "IFCUNITASSIGNMENT",
    "IFCSIUNIT",
    "IFCCONVERSIONBASEDUNIT",
    "IFCDIMENSIONALEXPONENTS",
    "IFCMEASUREWITHUNIT",
    "IFCPRODUCTDEFINITIONSHAPE",
    "IFCSHAPEREPRESENTATION",
    "IFCEXTRUDEDAREASOLID",
    "IFCRECTANGLEPROFILEDEF",
    "IFCARBITRARYCLOSEDPROFILEDEF",
    "IFCPOLYLINE",
];

fn skip_rule_for(type_name: &str) -> SkipRule {
    if type_name.contains("MATERIAL") || type_name.contains("SURFACESTYLE") {
        MATERIAL_DEFINITION
    } else if ["SLAB", "STAIR", "RAMP", "ROOF"]
        .iter()
        .any(|kind| type_name.contains(kind))
    {
        SOLID_ELEMENT
    } else {
        OTHER_ENTITY
    }
}

struct IfcImport<'c, 'a> {
    ctx: &'c mut ImportContext<'a>,
    graph: EntityGraph,
    /// Inches per file length unit
    scale: f64,
}

impl IfcImport<'_, '_> {
    fn placement(&mut self, product: &StepEntity, kind: &str) -> Option<Placement> {
        let placement = self.graph.product_placement(product, self.scale);
        if placement.is_none() {
            debug!(id = product.id, kind, "unresolved IFC placement");
            self.ctx.skip(kind.to_string(), UNRESOLVED_PLACEMENT);
        }
        placement
    }

    fn read_units(&mut self) {
        match self.graph.length_unit_inches() {
            Some(inches) if self.ctx.config.apply_source_units => {
                self.scale = inches;
                if (inches - 1.0).abs() > 1e-9 {
                    self.ctx.report.info(
                        ReportCategory::Metadata,
                        format!("Length unit is {} inches; coordinates scaled to inches", inches),
                    );
                }
            }
            Some(_) => self.ctx.report.info(
                ReportCategory::Metadata,
                "Length unit ignored; coordinates kept unscaled",
            ),
            None => self.ctx.report.info(
                ReportCategory::Metadata,
                "No length unit assigned; coordinates read as inches",
            ),
        }
    }

    fn read_walls(&mut self) {
        let walls: Vec<StepEntity> = WALL_TYPES
            .iter()
            .flat_map(|t| self.graph.of_type(t))
            .cloned()
            .collect();
        let mut defaulted = 0;
        for entity in &walls {
            let Some(placement) = self.placement(entity, "wall") else {
                continue;
            };
            let dir = Point::new(placement.angle.cos(), placement.angle.sin());
            let extrusion = self.graph.extrusion(entity);

            let (offset, length, thickness) = match extrusion.as_ref().map(|e| &e.profile) {
                Some(Profile::Rectangle { x_dim, y_dim, center }) => {
                    (center.x - x_dim / 2.0, *x_dim, *y_dim)
                }
                Some(Profile::Polygon(points)) => {
                    let (min_x, max_x, min_y, max_y) = extents(points);
                    (min_x, max_x - min_x, max_y - min_y)
                }
                None => {
                    defaulted += 1;
                    (
                        0.0,
                        FALLBACK_WALL_LENGTH / self.scale,
                        self.ctx.config.default_wall_thickness / self.scale,
                    )
                }
            };
            let height = extrusion
                .map(|e| e.depth * self.scale)
                .unwrap_or(self.ctx.config.default_wall_height);

            let start = placement.origin + dir * (offset * self.scale);
            let end = start + dir * (length * self.scale);
            if !start.is_finite() || !end.is_finite() || start.distance(&end) < crate::geometry::DEGENERATE_LENGTH {
                self.ctx.skip("wall", crate::io::context::DEGENERATE_SEGMENT);
                continue;
            }
            let id = self.ctx.next_id("w");
            self.ctx.plan.walls.push(Wall {
                id,
                start,
                end,
                thickness: thickness * self.scale,
                height,
            });
            self.ctx.report.convert(Converted::Walls);

            if let Some(name) = entity.str_arg(ARG_NAME).filter(|n| *n != "Wall") {
                let mid = start + (end - start) * 0.5;
                self.ctx.add_label(mid, name, WALL_LABEL_FONT, 0.0);
            }
        }
        if defaulted > 0 {
            self.ctx.report.warning(
                ReportCategory::Walls,
                format!(
                    "{} wall(s) without a rectangular extruded body used default dimensions",
                    defaulted
                ),
            );
        }
    }

    /// Attach openings to the nearest wall; unplaced ones become labels
    fn read_openings(&mut self, type_name: &str) {
        let is_door = type_name == "IFCDOOR";
        let kind = if is_door { "door" } else { "window" };
        let entities: Vec<StepEntity> = self.graph.of_type(type_name).cloned().collect();
        let mut orphaned = 0;
        for entity in &entities {
            let Some(placement) = self.placement(entity, kind) else {
                continue;
            };
            let tolerance = self.ctx.config.opening_snap_tolerance;
            let host = find_nearest_wall(placement.origin, &self.ctx.plan.walls, tolerance)
                .map(|wall| (wall.id.clone(), project_onto_wall(placement.origin, wall)));

            let Some((wall_id, position)) = host else {
                orphaned += 1;
                let fallback = if is_door { "Door" } else { "Window" };
                let text = entity.str_arg(ARG_NAME).unwrap_or(fallback).to_string();
                self.ctx.add_label(placement.origin, &text, OPENING_LABEL_FONT, 0.0);
                continue;
            };

            let width = entity
                .f64_arg(ARG_OVERALL_WIDTH)
                .filter(|w| *w > 0.0)
                .map(|w| w * self.scale);
            if is_door {
                let id = self.ctx.next_id("door");
                let width = width.unwrap_or(DEFAULT_DOOR_WIDTH);
                self.ctx.plan.doors.push(Door::new(id, wall_id, position, width));
                self.ctx.report.convert(Converted::Doors);
            } else {
                let id = self.ctx.next_id("win");
                let mut window =
                    Window::new(id, wall_id, position, width.unwrap_or(DEFAULT_WINDOW_WIDTH));
                if placement.elevation > 0.0 {
                    window.sill_height = Some(placement.elevation);
                }
                self.ctx.plan.windows.push(window);
                self.ctx.report.convert(Converted::Windows);
            }
        }
        if orphaned > 0 {
            self.ctx.report.push(
                crate::report::ReportItem::new(
                    Severity::Warning,
                    ReportCategory::Openings,
                    format!("{} {}(s) not near any wall were imported as labels", orphaned, kind),
                )
                .with_count(orphaned),
            );
        }
    }

    fn read_spaces(&mut self) {
        let spaces: Vec<StepEntity> = self.graph.of_type("IFCSPACE").cloned().collect();
        for entity in &spaces {
            let Some(placement) = self.placement(entity, "space") else {
                continue;
            };
            let id = self.ctx.next_id("r");
            let mut room = Room::new(id, entity.str_arg(ARG_NAME).unwrap_or("Room"));
            room.center = placement.origin;
            if let Some(extrusion) = self.graph.extrusion(entity) {
                room.area = extrusion.profile.area() * self.scale * self.scale / 144.0;
            }
            self.ctx.plan.rooms.push(room);
            self.ctx.report.convert(Converted::Rooms);
        }
    }

    fn report_unhandled(&mut self) {
        let unhandled: Vec<(String, usize)> = self
            .graph
            .type_counts()
            .into_iter()
            .filter(|(t, _)| !STRUCTURAL_TYPES.contains(t))
            .map(|(t, n)| (t.to_string(), n))
            .collect();
        for (type_name, count) in unhandled {
            self.ctx.skip_n(type_name.clone(), skip_rule_for(&type_name), count);
        }
    }
}

fn extents(points: &[Point]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY),
        |(min_x, max_x, min_y, max_y), p| {
            (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
        },
    )
}

/// Import IFC STEP content
pub fn import_ifc(content: &[u8], file_name: &str, config: &ImportConfiguration) -> ImportResult {
    let mut ctx = ImportContext::new(FileFormat::Ifc, "ifc", file_name, config);
    let text = String::from_utf8_lossy(content);
    let file = parse_step(&text);
    if file.entities.is_empty() {
        return ctx.fail("No IFC entities found");
    }

    if let Some(schema) = &file.schema {
        ctx.report.source_version = Some(schema.clone());
        ctx.report
            .info(ReportCategory::Metadata, format!("IFC schema: {}", schema));
    }
    ctx.report.info(
        ReportCategory::Metadata,
        format!("Parsed {} IFC entities", file.entities.len()),
    );
    if file.malformed > 0 {
        ctx.report.warning(
            ReportCategory::Metadata,
            format!("{} malformed STEP statement(s) ignored", file.malformed),
        );
    }

    let mut import = IfcImport {
        ctx: &mut ctx,
        graph: EntityGraph::new(file.entities),
        scale: 1.0,
    };
    import.read_units();
    import.read_walls();
    import.read_openings("IFCDOOR");
    import.read_openings("IFCWINDOW");
    import.read_spaces();
    import.report_unhandled();
    debug!(entities = import.graph.len(), "IFC entity graph processed");

    ctx.finish(false)
}
