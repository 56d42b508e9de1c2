//! IFC2X3 export
//!
//! Writes the mandatory project scaffold, then one `IfcWallStandardCase`
//! with a rectangular extruded body per wall, one placed `IfcDoor` or
//! `IfcWindow` per opening and one `IfcSpace` per room. Lengths are inches.

use std::fmt::Write as _;
use std::io::Write;

use tracing::debug;
use uuid::Uuid;

use super::step::encode_string;
use crate::error::Result;
use crate::geometry::{format_fixed, position_on_wall, room_polygon, RoomDetectionConfig};
use crate::io::{ExportOptions, PlanExporter};
use crate::model::{FloorPlanData, Wall, DEFAULT_WALL_HEIGHT};
use crate::types::Point;

const IFC_DECIMALS: usize = 4;

/// Walls shorter than this are left out
const MIN_WALL_LENGTH: f64 = 0.01;

const GUID_ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

/// A fresh 22-character IFC GlobalId
pub fn new_guid() -> String {
    encode_guid(Uuid::new_v4().as_u128())
}

/// Compress 128 bits into the IFC base-64 form: 2 bits, then 21 groups of 6
fn encode_guid(value: u128) -> String {
    let mut out = String::with_capacity(22);
    out.push(GUID_ALPHABET[((value >> 126) & 0x3) as usize] as char);
    for i in 0..21 {
        let shift = 120 - 6 * i;
        out.push(GUID_ALPHABET[((value >> shift) & 0x3F) as usize] as char);
    }
    out
}

fn real(value: f64) -> String {
    format_fixed(value, IFC_DECIMALS)
}

fn reference(id: u64) -> String {
    format!("#{}", id)
}

fn ref_list(ids: &[u64]) -> String {
    let items: Vec<String> = ids.iter().map(|id| reference(*id)).collect();
    format!("({})", items.join(","))
}

/// Sequentially numbered `#id=TYPE(args);` lines
struct StepWriter {
    data: String,
    next_id: u64,
}

impl StepWriter {
    fn new() -> Self {
        Self {
            data: String::new(),
            next_id: 1,
        }
    }

    fn add(&mut self, type_name: &str, args: impl AsRef<str>) -> Result<u64> {
        let id = self.next_id;
        self.next_id += 1;
        writeln!(self.data, "#{}={}({});", id, type_name, args.as_ref())?;
        Ok(id)
    }

    fn point2(&mut self, p: Point) -> Result<u64> {
        self.add("IFCCARTESIANPOINT", format!("({},{})", real(p.x), real(p.y)))
    }

    fn point3(&mut self, x: f64, y: f64, z: f64) -> Result<u64> {
        self.add("IFCCARTESIANPOINT", format!("({},{},{})", real(x), real(y), real(z)))
    }

    fn direction(&mut self, x: f64, y: f64, z: f64) -> Result<u64> {
        self.add("IFCDIRECTION", format!("({},{},{})", real(x), real(y), real(z)))
    }
}

/// Entities every product refers to
struct Scaffold {
    owner: u64,
    world: u64,
    z_axis: u64,
    body_context: u64,
    storey: u64,
    storey_placement: u64,
}

/// A door or window resolved against its host wall
struct PlacedOpening<'w> {
    wall: &'w Wall,
    position: f64,
    elevation: f64,
    type_name: &'static str,
    name: &'static str,
    height: f64,
    width: f64,
}

/// Writes a plan as an IFC2X3 STEP file
pub struct IfcExporter<'a> {
    plan: &'a FloorPlanData,
    options: &'a ExportOptions,
}

impl<'a> IfcExporter<'a> {
    pub fn new(plan: &'a FloorPlanData, options: &'a ExportOptions) -> Self {
        Self { plan, options }
    }

    fn header(&self) -> String {
        let stamp = self.options.timestamp().format("%Y-%m-%dT%H:%M:%S");
        let author = encode_string(&self.options.company_name);
        let producer = encode_string(&format!("sketchport {}", crate::VERSION));
        format!(
            "ISO-10303-21;\nHEADER;\n\
             FILE_DESCRIPTION(('ViewDefinition [CoordinationView_V2.0]'),'2;1');\n\
             FILE_NAME({},'{}',({}),({}),{},'sketchport','');\n\
             FILE_SCHEMA(('IFC2X3'));\nENDSEC;\n",
            encode_string(&format!("{}.ifc", self.options.file_stem)),
            stamp,
            author,
            author,
            producer,
        )
    }

    fn write_scaffold(&self, w: &mut StepWriter) -> Result<Scaffold> {
        let opts = self.options;
        let organization_name = if opts.company_name.is_empty() {
            "sketchport"
        } else {
            opts.company_name.as_str()
        };

        let person = w.add("IFCPERSON", "$,$,'',$,$,$,$,$")?;
        let organization = w.add(
            "IFCORGANIZATION",
            format!("$,{},$,$,$", encode_string(organization_name)),
        )?;
        let person_org = w.add(
            "IFCPERSONANDORGANIZATION",
            format!("{},{},$", reference(person), reference(organization)),
        )?;
        let application = w.add(
            "IFCAPPLICATION",
            format!(
                "{},{},'sketchport','sketchport'",
                reference(organization),
                encode_string(crate::VERSION)
            ),
        )?;
        let owner = w.add(
            "IFCOWNERHISTORY",
            format!(
                "{},{},$,.ADDED.,$,$,$,{}",
                reference(person_org),
                reference(application),
                opts.timestamp().timestamp()
            ),
        )?;

        let origin = w.point3(0.0, 0.0, 0.0)?;
        let z_axis = w.direction(0.0, 0.0, 1.0)?;
        let x_axis = w.direction(1.0, 0.0, 0.0)?;
        let world = w.add(
            "IFCAXIS2PLACEMENT3D",
            format!("{},{},{}", reference(origin), reference(z_axis), reference(x_axis)),
        )?;
        let context = w.add(
            "IFCGEOMETRICREPRESENTATIONCONTEXT",
            format!("$,'Model',3,1.E-05,{},$", reference(world)),
        )?;
        let body_context = w.add(
            "IFCGEOMETRICREPRESENTATIONSUBCONTEXT",
            format!("'Body','Model',*,*,*,*,{},$,.MODEL_VIEW.,$", reference(context)),
        )?;

        // inches, declared as a conversion of millimetres
        let millimetre = w.add("IFCSIUNIT", "*,.LENGTHUNIT.,.MILLI.,.METRE.")?;
        let inch_measure = w.add(
            "IFCMEASUREWITHUNIT",
            format!("IFCLENGTHMEASURE(25.4),{}", reference(millimetre)),
        )?;
        let exponents = w.add("IFCDIMENSIONALEXPONENTS", "1,0,0,0,0,0,0")?;
        let inch = w.add(
            "IFCCONVERSIONBASEDUNIT",
            format!("{},.LENGTHUNIT.,'INCH',{}", reference(exponents), reference(inch_measure)),
        )?;
        let area = w.add("IFCSIUNIT", "*,.AREAUNIT.,$,.SQUARE_METRE.")?;
        let angle = w.add("IFCSIUNIT", "*,.PLANEANGLEUNIT.,$,.RADIAN.")?;
        let units = w.add("IFCUNITASSIGNMENT", ref_list(&[inch, area, angle]))?;

        let project = w.add(
            "IFCPROJECT",
            format!(
                "'{}',{},{},$,$,$,$,({}),{}",
                new_guid(),
                reference(owner),
                encode_string(&opts.project_title),
                reference(context),
                reference(units)
            ),
        )?;

        let site_placement = w.add("IFCLOCALPLACEMENT", format!("$,{}", reference(world)))?;
        let site = w.add(
            "IFCSITE",
            format!(
                "'{}',{},'Site',$,$,{},$,$,.ELEMENT.,$,$,$,$,$",
                new_guid(),
                reference(owner),
                reference(site_placement)
            ),
        )?;
        let building_placement = w.add(
            "IFCLOCALPLACEMENT",
            format!("{},{}", reference(site_placement), reference(world)),
        )?;
        let building = w.add(
            "IFCBUILDING",
            format!(
                "'{}',{},{},$,$,{},$,$,.ELEMENT.,$,$,$",
                new_guid(),
                reference(owner),
                encode_string(&opts.building_name),
                reference(building_placement)
            ),
        )?;
        let storey_placement = w.add(
            "IFCLOCALPLACEMENT",
            format!("{},{}", reference(building_placement), reference(world)),
        )?;
        let storey = w.add(
            "IFCBUILDINGSTOREY",
            format!(
                "'{}',{},{},$,$,{},$,$,.ELEMENT.,0.",
                new_guid(),
                reference(owner),
                encode_string(&opts.floor_name),
                reference(storey_placement)
            ),
        )?;

        for (parent, child) in [(project, site), (site, building), (building, storey)] {
            w.add(
                "IFCRELAGGREGATES",
                format!(
                    "'{}',{},$,$,{},({})",
                    new_guid(),
                    reference(owner),
                    reference(parent),
                    reference(child)
                ),
            )?;
        }

        Ok(Scaffold {
            owner,
            world,
            z_axis,
            body_context,
            storey,
            storey_placement,
        })
    }

    /// Local placement under the storey at `origin`, x axis along `dir`
    fn placement(
        &self,
        w: &mut StepWriter,
        s: &Scaffold,
        origin: Point,
        elevation: f64,
        dir: Point,
    ) -> Result<u64> {
        let location = w.point3(origin.x, origin.y, elevation)?;
        let ref_dir = w.direction(dir.x, dir.y, 0.0)?;
        let axis = w.add(
            "IFCAXIS2PLACEMENT3D",
            format!("{},{},{}", reference(location), reference(s.z_axis), reference(ref_dir)),
        )?;
        w.add(
            "IFCLOCALPLACEMENT",
            format!("{},{}", reference(s.storey_placement), reference(axis)),
        )
    }

    /// `ProductDefinitionShape` of a profile extruded straight up
    fn extruded_body(&self, w: &mut StepWriter, s: &Scaffold, profile: u64, depth: f64) -> Result<u64> {
        let solid = w.add(
            "IFCEXTRUDEDAREASOLID",
            format!(
                "{},{},{},{}",
                reference(profile),
                reference(s.world),
                reference(s.z_axis),
                real(depth)
            ),
        )?;
        let representation = w.add(
            "IFCSHAPEREPRESENTATION",
            format!("{},'Body','SweptSolid',({})", reference(s.body_context), reference(solid)),
        )?;
        w.add(
            "IFCPRODUCTDEFINITIONSHAPE",
            format!("$,$,({})", reference(representation)),
        )
    }

    fn write_wall(&self, w: &mut StepWriter, s: &Scaffold, wall: &Wall) -> Result<Option<u64>> {
        let length = wall.length();
        if !length.is_finite() || length < MIN_WALL_LENGTH {
            return Ok(None);
        }
        let dir = (wall.end - wall.start) / length;
        let placement = self.placement(w, s, wall.start, 0.0, dir)?;

        // profile runs along local +x from the wall start
        let center = w.point2(Point::new(length / 2.0, 0.0))?;
        let profile_axis = w.add("IFCAXIS2PLACEMENT2D", format!("{},$", reference(center)))?;
        let profile = w.add(
            "IFCRECTANGLEPROFILEDEF",
            format!(
                ".AREA.,$,{},{},{}",
                reference(profile_axis),
                real(length),
                real(wall.thickness)
            ),
        )?;
        let body = self.extruded_body(w, s, profile, wall.height)?;
        let id = w.add(
            "IFCWALLSTANDARDCASE",
            format!(
                "'{}',{},'Wall',$,$,{},{},$",
                new_guid(),
                reference(s.owner),
                reference(placement),
                reference(body)
            ),
        )?;
        Ok(Some(id))
    }

    fn write_opening(&self, w: &mut StepWriter, s: &Scaffold, opening: &PlacedOpening<'_>) -> Result<Option<u64>> {
        let wall = opening.wall;
        if wall.is_degenerate() {
            return Ok(None);
        }
        let dir = (wall.end - wall.start) / wall.length();
        let origin = position_on_wall(wall, opening.position);
        let placement = self.placement(w, s, origin, opening.elevation, dir)?;
        let id = w.add(
            opening.type_name,
            format!(
                "'{}',{},{},$,$,{},$,$,{},{}",
                new_guid(),
                reference(s.owner),
                encode_string(opening.name),
                reference(placement),
                real(opening.height),
                real(opening.width)
            ),
        )?;
        Ok(Some(id))
    }

    fn write_products(&self, w: &mut StepWriter, s: &Scaffold) -> Result<Vec<u64>> {
        let plan = self.plan;
        let opts = self.options;
        let mut products = Vec::new();

        let chords: Vec<Wall> = plan.arc_walls.iter().flat_map(|a| a.to_chord_walls()).collect();
        for wall in plan.walls.iter().chain(&chords) {
            products.extend(self.write_wall(w, s, wall)?);
        }

        let walls = plan.wall_index();
        for door in &plan.doors {
            let Some(&wall) = walls.get(door.wall_id.as_str()) else {
                debug!(door = %door.id, wall = %door.wall_id, "door on missing wall omitted");
                continue;
            };
            let opening = PlacedOpening {
                wall,
                position: door.position,
                elevation: 0.0,
                type_name: "IFCDOOR",
                name: "Door",
                height: opts.door_height,
                width: door.width,
            };
            products.extend(self.write_opening(w, s, &opening)?);
        }
        for window in &plan.windows {
            let Some(&wall) = walls.get(window.wall_id.as_str()) else {
                debug!(window = %window.id, wall = %window.wall_id, "window on missing wall omitted");
                continue;
            };
            let sill = window.sill_height.unwrap_or(opts.default_sill_height);
            let opening = PlacedOpening {
                wall,
                position: window.position,
                elevation: sill,
                type_name: "IFCWINDOW",
                name: "Window",
                height: opts.window_height,
                width: window.width,
            };
            products.extend(self.write_opening(w, s, &opening)?);
        }

        let epsilon = RoomDetectionConfig::default().snap_epsilon;
        for room in &plan.rooms {
            if let Some(missing) = room.wall_ids.iter().find(|id| !walls.contains_key(id.as_str())) {
                debug!(room = %room.id, wall = %missing, "room on missing wall omitted");
                continue;
            }
            let placement = self.placement(w, s, room.center, 0.0, Point::new(1.0, 0.0))?;
            let body = match room_polygon(room, &plan.walls, epsilon) {
                Some(polygon) => {
                    let mut points = Vec::with_capacity(polygon.len() + 1);
                    for p in &polygon {
                        points.push(w.point2(*p - room.center)?);
                    }
                    points.push(points[0]);
                    let polyline = w.add("IFCPOLYLINE", format!("({})", ref_list(&points)))?;
                    let profile = w.add(
                        "IFCARBITRARYCLOSEDPROFILEDEF",
                        format!(".AREA.,{},{}", encode_string(&room.name), reference(polyline)),
                    )?;
                    let height = room
                        .wall_ids
                        .iter()
                        .filter_map(|id| walls.get(id.as_str()))
                        .map(|wall| wall.height)
                        .fold(f64::NAN, f64::max);
                    let height = if height.is_finite() { height } else { DEFAULT_WALL_HEIGHT };
                    reference(self.extruded_body(w, s, profile, height)?)
                }
                None => "$".to_string(),
            };
            products.push(w.add(
                "IFCSPACE",
                format!(
                    "'{}',{},{},$,$,{},{},$,.ELEMENT.,.INTERNAL.,$",
                    new_guid(),
                    reference(s.owner),
                    encode_string(&room.name),
                    reference(placement),
                    body
                ),
            )?);
        }
        Ok(products)
    }

    fn render(&self) -> Result<String> {
        let mut w = StepWriter::new();
        let scaffold = self.write_scaffold(&mut w)?;
        let products = self.write_products(&mut w, &scaffold)?;
        if !products.is_empty() {
            w.add(
                "IFCRELCONTAINEDINSPATIALSTRUCTURE",
                format!(
                    "'{}',{},'Storey contents',$,{},{}",
                    new_guid(),
                    reference(scaffold.owner),
                    ref_list(&products),
                    reference(scaffold.storey)
                ),
            )?;
        }
        debug!(entities = w.next_id - 1, products = products.len(), "IFC data section written");

        let mut out = self.header();
        out.push_str("DATA;\n");
        out.push_str(&w.data);
        out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
        Ok(out)
    }
}

impl PlanExporter for IfcExporter<'_> {
    fn write_to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        let document = self.render()?;
        writer.write_all(document.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
