//! glTF export

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use byteorder::{LittleEndian, WriteBytesExt};
use serde_json::{json, Value};
use tracing::info;

use super::{COMPONENT_F32, COMPONENT_U32, MODE_TRIANGLES, TARGET_ARRAY_BUFFER, TARGET_ELEMENT_ARRAY_BUFFER};
use crate::error::Result;
use crate::io::solid::{plan_surfaces, Surface};
use crate::io::{ExportOptions, PlanExporter, INCHES_PER_METRE};
use crate::model::FloorPlanData;

/// Writes a plan as a glTF 2.0 scene with one embedded buffer
///
/// Units are metres and +Y is up.
pub struct GltfExporter<'a> {
    plan: &'a FloorPlanData,
    options: &'a ExportOptions,
}

impl<'a> GltfExporter<'a> {
    pub fn new(plan: &'a FloorPlanData, options: &'a ExportOptions) -> Self {
        Self { plan, options }
    }

    /// Build the JSON document
    pub fn document(&self) -> Result<Value> {
        let surfaces = plan_surfaces(self.plan, self.options);
        let mut buffer: Vec<u8> = Vec::new();
        let mut views = Vec::new();
        let mut accessors = Vec::new();
        let mut primitives = Vec::new();

        for mesh in surfaces.iter().filter(|m| !m.is_empty()) {
            let positions: Vec<[f32; 3]> = mesh
                .vertices
                .iter()
                .map(|v| v.map(|c| (c / INCHES_PER_METRE) as f32))
                .collect();
            let mut min = [f32::MAX; 3];
            let mut max = [f32::MIN; 3];
            for p in &positions {
                for axis in 0..3 {
                    min[axis] = min[axis].min(p[axis]);
                    max[axis] = max[axis].max(p[axis]);
                }
            }

            let position_offset = buffer.len();
            for p in &positions {
                for c in p {
                    buffer.write_f32::<LittleEndian>(*c)?;
                }
            }
            views.push(json!({
                "buffer": 0,
                "byteOffset": position_offset,
                "byteLength": buffer.len() - position_offset,
                "target": TARGET_ARRAY_BUFFER,
            }));
            accessors.push(json!({
                "bufferView": views.len() - 1,
                "componentType": COMPONENT_F32,
                "count": positions.len(),
                "type": "VEC3",
                "min": min,
                "max": max,
            }));
            let position_accessor = accessors.len() - 1;

            let triangles = mesh.triangles();
            let index_offset = buffer.len();
            for tri in &triangles {
                for i in tri {
                    buffer.write_u32::<LittleEndian>(*i)?;
                }
            }
            views.push(json!({
                "buffer": 0,
                "byteOffset": index_offset,
                "byteLength": buffer.len() - index_offset,
                "target": TARGET_ELEMENT_ARRAY_BUFFER,
            }));
            accessors.push(json!({
                "bufferView": views.len() - 1,
                "componentType": COMPONENT_U32,
                "count": triangles.len() * 3,
                "type": "SCALAR",
            }));

            let material = Surface::ALL
                .iter()
                .position(|s| *s == mesh.surface)
                .unwrap_or(0);
            primitives.push(json!({
                "attributes": { "POSITION": position_accessor },
                "indices": accessors.len() - 1,
                "material": material,
                "mode": MODE_TRIANGLES,
            }));
        }

        let materials: Vec<Value> = Surface::ALL.iter().map(material).collect();
        let mut node = json!({ "name": self.options.project_title });
        let mut doc = json!({
            "asset": {
                "version": "2.0",
                "generator": concat!("sketchport ", env!("CARGO_PKG_VERSION")),
                "copyright": self.options.company_name,
            },
            "scene": 0,
            "scenes": [{ "name": self.options.floor_name, "nodes": [0] }],
            "materials": materials,
        });
        if !primitives.is_empty() {
            node["mesh"] = json!(0);
            doc["meshes"] = json!([{ "name": "floorplan", "primitives": primitives }]);
            doc["accessors"] = json!(accessors);
            doc["bufferViews"] = json!(views);
            doc["buffers"] = json!([{
                "byteLength": buffer.len(),
                "uri": format!("data:application/octet-stream;base64,{}", STANDARD.encode(&buffer)),
            }]);
        }
        doc["nodes"] = json!([node]);
        Ok(doc)
    }
}

fn material(surface: &Surface) -> Value {
    let [r, g, b] = surface.color().to_unit_rgb();
    let alpha = surface.opacity();
    let mut m = json!({
        "name": surface.name(),
        "pbrMetallicRoughness": {
            "baseColorFactor": [r, g, b, alpha],
            "metallicFactor": 0.0,
            "roughnessFactor": 0.9,
        },
        "doubleSided": true,
    });
    if alpha < 1.0 {
        m["alphaMode"] = json!("BLEND");
    }
    m
}

impl PlanExporter for GltfExporter<'_> {
    fn write_to_writer<W: Write>(&self, mut writer: W) -> Result<()> {
        let doc = self.document()?;
        serde_json::to_writer_pretty(&mut writer, &doc)?;
        writer.flush()?;
        info!(
            meshes = doc.get("meshes").map_or(0, |_| 1),
            "wrote glTF scene"
        );
        Ok(())
    }
}
