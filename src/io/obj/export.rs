//! OBJ export with a companion material library

use std::io::Write;

use tracing::info;

use crate::error::Result;
use crate::geometry::format_fixed;
use crate::io::solid::{plan_surfaces, Surface};
use crate::io::{ExportOptions, PlanExporter};
use crate::model::FloorPlanData;

const OBJ_DECIMALS: usize = 4;

/// Writes a plan as an extruded OBJ mesh
pub struct ObjExporter<'a> {
    plan: &'a FloorPlanData,
    options: &'a ExportOptions,
}

impl<'a> ObjExporter<'a> {
    pub fn new(plan: &'a FloorPlanData, options: &'a ExportOptions) -> Self {
        Self { plan, options }
    }

    /// File name referenced by `mtllib`
    pub fn material_library_name(&self) -> String {
        format!("{}.mtl", self.options.file_stem)
    }

    /// Write the `.mtl` companion with one material per surface
    pub fn write_material_library<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "# {}", self.options.project_title)?;
        for surface in Surface::ALL {
            let [r, g, b] = surface.color().to_unit_rgb();
            writeln!(writer)?;
            writeln!(writer, "newmtl {}", surface.name())?;
            writeln!(writer, "Ka 0.1000 0.1000 0.1000")?;
            writeln!(
                writer,
                "Kd {} {} {}",
                format_fixed(r, OBJ_DECIMALS),
                format_fixed(g, OBJ_DECIMALS),
                format_fixed(b, OBJ_DECIMALS)
            )?;
            writeln!(writer, "Ks 0.0000 0.0000 0.0000")?;
            writeln!(writer, "d {}", format_fixed(surface.opacity(), OBJ_DECIMALS))?;
            writeln!(writer, "illum 1")?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn material_library_to_vec(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_material_library(&mut buffer)?;
        Ok(buffer)
    }
}

impl PlanExporter for ObjExporter<'_> {
    fn write_to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        let surfaces = plan_surfaces(self.plan, self.options);

        writeln!(writer, "# {}", self.options.project_title)?;
        if !self.options.company_name.is_empty() {
            writeln!(writer, "# {}", self.options.company_name)?;
        }
        writeln!(writer, "# units: inches, Y up")?;
        writeln!(writer, "mtllib {}", self.material_library_name())?;

        let mut offset = 1u32;
        let mut faces = 0;
        for mesh in surfaces.iter().filter(|m| !m.is_empty()) {
            writeln!(writer, "o {}", mesh.surface.name())?;
            for [x, y, z] in &mesh.vertices {
                writeln!(
                    writer,
                    "v {} {} {}",
                    format_fixed(*x, OBJ_DECIMALS),
                    format_fixed(*y, OBJ_DECIMALS),
                    format_fixed(*z, OBJ_DECIMALS)
                )?;
            }
            writeln!(writer, "usemtl {}", mesh.surface.name())?;
            for face in &mesh.faces {
                let indices: Vec<String> = face.iter().map(|i| (i + offset).to_string()).collect();
                writeln!(writer, "f {}", indices.join(" "))?;
            }
            offset += mesh.vertices.len() as u32;
            faces += mesh.faces.len();
        }
        writer.flush()?;
        info!(vertices = offset - 1, faces, "wrote OBJ mesh");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Door, Room, Wall};
    use crate::types::Point;

    fn room_plan() -> FloorPlanData {
        let mut plan = FloorPlanData::new();
        let c = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 80.0),
            Point::new(0.0, 80.0),
        ];
        for i in 0..4 {
            plan.walls.push(Wall::new(format!("w{}", i + 1), c[i], c[(i + 1) % 4]));
        }
        let mut room = Room::new("r1", "Office");
        room.wall_ids = (1..=4).map(|i| format!("w{}", i)).collect();
        plan.rooms.push(room);
        plan.doors.push(Door::new("d1", "w1", 0.5, 30.0));
        plan
    }

    #[test]
    fn test_mesh_layout() {
        let plan = room_plan();
        let options = ExportOptions::default();
        let obj = String::from_utf8(ObjExporter::new(&plan, &options).write_to_vec().unwrap()).unwrap();

        // 4 boxes, one floor quad ring, one door plane
        assert_eq!(obj.lines().filter(|l| l.starts_with("v ")).count(), 32 + 4 + 4);
        assert_eq!(obj.lines().filter(|l| l.starts_with("f ")).count(), 24 + 2 + 1);
        assert!(obj.contains("mtllib floorplan.mtl"));
        assert!(obj.contains("usemtl floor"));
        assert!(!obj.contains("usemtl window"));
        // floor vertices follow the 32 wall vertices
        assert!(obj.contains("\nf 33 34 35\n"));
    }

    #[test]
    fn test_material_library() {
        let plan = FloorPlanData::new();
        let options = ExportOptions::default();
        let mtl = String::from_utf8(ObjExporter::new(&plan, &options).material_library_to_vec().unwrap()).unwrap();
        assert_eq!(mtl.matches("newmtl ").count(), 4);
        assert!(mtl.contains("newmtl window\nKa 0.1000 0.1000 0.1000\nKd 0.5333 0.8000 0.9333\nKs 0.0000 0.0000 0.0000\nd 0.5000"));
    }
}
