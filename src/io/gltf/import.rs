//! glTF / GLB import

use std::io::{Cursor, Read};

use ahash::AHashSet;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use nalgebra::{Matrix4, Quaternion, UnitQuaternion, Vector3, Vector4};
use tracing::debug;

use super::document::{Accessor, GltfDocument, Node};
use super::{
    COMPONENT_F32, COMPONENT_U16, COMPONENT_U32, COMPONENT_U8, GLB_CHUNK_BIN, GLB_CHUNK_JSON,
    MODE_TRIANGLES,
};
use crate::detect::{FileFormat, GLB_MAGIC};
use crate::error::{PlanError, Result};
use crate::io::context::{ImportContext, SkipRule};
use crate::io::mesh::EdgeCollector;
use crate::io::{ImportConfiguration, ImportResult};
use crate::report::{ReportCategory, Severity, Skipped};
use crate::types::Point;

/// Deepest node hierarchy followed
const MAX_NODE_DEPTH: usize = 64;

const LIGHT: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Info,
    ReportCategory::Geometry,
    "lights have no plan equivalent",
);

const CAMERA: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Info,
    ReportCategory::Geometry,
    "cameras have no plan equivalent",
);

const MATERIAL: SkipRule = SkipRule::new(
    Skipped::Materials,
    Severity::Info,
    ReportCategory::Materials,
    "materials are not applied to plan geometry",
);

const NON_TRIANGLES: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Warning,
    ReportCategory::Geometry,
    "only triangle lists are projected to walls",
);

const UNREADABLE_PRIMITIVE: SkipRule = SkipRule::new(
    Skipped::Other,
    Severity::Error,
    ReportCategory::Geometry,
    "vertex data is missing, external, or out of range",
);

/// Split a GLB container into its JSON text and optional binary chunk
fn read_glb(content: &[u8]) -> Result<(u32, String, Option<Vec<u8>>)> {
    let mut cursor = Cursor::new(content);
    let magic = cursor.read_u32::<LittleEndian>()?;
    if magic != GLB_MAGIC {
        return Err(PlanError::Parse("missing glTF magic".into()));
    }
    let version = cursor.read_u32::<LittleEndian>()?;
    let declared = cursor.read_u32::<LittleEndian>()? as usize;
    if declared > content.len() {
        return Err(PlanError::Parse(format!(
            "container declares {} bytes but holds {}",
            declared,
            content.len()
        )));
    }

    let mut json = None;
    let mut bin = None;
    while (cursor.position() as usize) + 8 <= declared {
        let length = cursor.read_u32::<LittleEndian>()? as usize;
        let chunk_type = cursor.read_u32::<LittleEndian>()?;
        let remaining = declared.saturating_sub(cursor.position() as usize);
        if length > remaining {
            return Err(PlanError::Parse(format!(
                "chunk declares {} bytes but {} remain",
                length, remaining
            )));
        }
        let mut data = vec![0u8; length];
        cursor.read_exact(&mut data)?;
        match chunk_type {
            GLB_CHUNK_JSON if json.is_none() => {
                let text = String::from_utf8(data)
                    .map_err(|e| PlanError::Encoding(format!("JSON chunk: {}", e)))?;
                json = Some(text);
            }
            GLB_CHUNK_BIN if bin.is_none() => bin = Some(data),
            other => debug!(chunk_type = other, length, "ignoring GLB chunk"),
        }
    }
    let json = json.ok_or_else(|| PlanError::Parse("GLB has no JSON chunk".into()))?;
    Ok((version, json, bin))
}

/// Local transform of a node
fn node_matrix(node: &Node) -> Matrix4<f64> {
    if let Some(m) = &node.matrix {
        return Matrix4::from_column_slice(m);
    }
    let t = node.translation.unwrap_or([0.0; 3]);
    let [x, y, z, w] = node.rotation.unwrap_or([0.0, 0.0, 0.0, 1.0]);
    let s = node.scale.unwrap_or([1.0; 3]);
    let rotation = UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z));
    Matrix4::new_translation(&Vector3::new(t[0], t[1], t[2]))
        * rotation.to_homogeneous()
        * Matrix4::new_nonuniform_scaling(&Vector3::new(s[0], s[1], s[2]))
}

struct SceneReader<'d> {
    doc: &'d GltfDocument,
    /// Decoded buffers; `None` when a buffer could not be loaded
    buffers: Vec<Option<Vec<u8>>>,
}

impl SceneReader<'_> {
    /// Bytes, start offset and stride of one accessor
    fn accessor_view(&self, accessor: &Accessor, element_size: usize) -> Option<(&[u8], usize, usize)> {
        let view = self.doc.buffer_views.get(accessor.buffer_view?)?;
        let data = self.buffers.get(view.buffer)?.as_deref()?;
        let end = view.byte_offset.checked_add(view.byte_length)?;
        let data = data.get(view.byte_offset..end)?;
        let stride = view.byte_stride.unwrap_or(element_size).max(element_size);
        if accessor.count > 0 {
            let last = (accessor.count - 1)
                .checked_mul(stride)?
                .checked_add(accessor.byte_offset)?
                .checked_add(element_size)?;
            if last > data.len() {
                return None;
            }
        }
        Some((data, accessor.byte_offset, stride))
    }

    fn positions(&self, index: usize) -> Option<Vec<Vector3<f64>>> {
        let accessor = self.doc.accessors.get(index)?;
        if accessor.component_type != COMPONENT_F32 || accessor.element_type != "VEC3" {
            return None;
        }
        let (data, offset, stride) = self.accessor_view(accessor, 12)?;
        Some(
            (0..accessor.count)
                .map(|i| {
                    let at = offset + i * stride;
                    Vector3::new(
                        LittleEndian::read_f32(&data[at..]) as f64,
                        LittleEndian::read_f32(&data[at + 4..]) as f64,
                        LittleEndian::read_f32(&data[at + 8..]) as f64,
                    )
                })
                .collect(),
        )
    }

    fn indices(&self, index: usize) -> Option<Vec<usize>> {
        let accessor = self.doc.accessors.get(index)?;
        if accessor.element_type != "SCALAR" {
            return None;
        }
        let size = match accessor.component_type {
            COMPONENT_U8 => 1,
            COMPONENT_U16 => 2,
            COMPONENT_U32 => 4,
            _ => return None,
        };
        let (data, offset, stride) = self.accessor_view(accessor, size)?;
        Some(
            (0..accessor.count)
                .map(|i| {
                    let at = offset + i * stride;
                    match size {
                        1 => data[at] as usize,
                        2 => LittleEndian::read_u16(&data[at..]) as usize,
                        _ => LittleEndian::read_u32(&data[at..]) as usize,
                    }
                })
                .collect(),
        )
    }
}

fn decode_buffers(doc: &GltfDocument, bin: Option<Vec<u8>>, ctx: &mut ImportContext<'_>) -> Vec<Option<Vec<u8>>> {
    let mut bin = bin;
    doc.buffers
        .iter()
        .enumerate()
        .map(|(i, buffer)| {
            let data = match buffer.uri.as_deref() {
                None if i == 0 => bin.take(),
                None => None,
                Some(uri) if uri.starts_with("data:") => {
                    let payload = uri.split_once(',').map(|(_, p)| p).unwrap_or("");
                    match STANDARD.decode(payload) {
                        Ok(bytes) => Some(bytes),
                        Err(err) => {
                            ctx.report.error(
                                ReportCategory::Geometry,
                                format!("Buffer {} has an invalid data URI: {}", i, err),
                            );
                            None
                        }
                    }
                }
                Some(uri) => {
                    ctx.report.error(
                        ReportCategory::Geometry,
                        format!("External buffer '{}' is not available; meshes using it were skipped", uri),
                    );
                    None
                }
            };
            match data {
                Some(bytes) if bytes.len() < buffer.byte_length => {
                    ctx.report.error(
                        ReportCategory::Geometry,
                        format!(
                            "Buffer {} holds {} of {} declared bytes",
                            i,
                            bytes.len(),
                            buffer.byte_length
                        ),
                    );
                    Some(bytes)
                }
                other => other,
            }
        })
        .collect()
}

/// Import a glTF JSON document or GLB container
pub fn import_gltf(content: &[u8], file_name: &str, config: &ImportConfiguration) -> ImportResult {
    let is_glb = content.len() >= 4 && LittleEndian::read_u32(content) == GLB_MAGIC;
    let mut ctx = ImportContext::new(
        if is_glb { FileFormat::Glb } else { FileFormat::Gltf },
        "gltf",
        file_name,
        config,
    );

    let (container_version, json, bin) = if is_glb {
        match read_glb(content) {
            Ok((version, json, bin)) => (Some(version), json, bin),
            Err(err) => return ctx.fail(format!("Invalid GLB container: {}", err)),
        }
    } else {
        (None, String::from_utf8_lossy(content).into_owned(), None)
    };

    let doc: GltfDocument = match serde_json::from_str(&json) {
        Ok(doc) => doc,
        Err(err) => return ctx.fail(format!("Invalid glTF JSON: {}", err)),
    };

    ctx.report.source_version = doc
        .asset
        .version
        .clone()
        .or_else(|| container_version.map(|v| v.to_string()));
    if let Some(generator) = &doc.asset.generator {
        ctx.report
            .info(ReportCategory::Metadata, format!("Generated by {}", generator));
    }

    ctx.skip_n("light", LIGHT, doc.light_count());
    ctx.skip_n("camera", CAMERA, doc.cameras.len());
    ctx.skip_n("material", MATERIAL, doc.materials.len());

    let buffers = decode_buffers(&doc, bin, &mut ctx);
    let reader = SceneReader { doc: &doc, buffers };
    let mut edges = EdgeCollector::new(config.edge_key_precision);
    let scale = config.scene_unit_scale;

    let mut stack: Vec<(usize, Matrix4<f64>, usize)> = doc
        .root_nodes()
        .into_iter()
        .rev()
        .map(|n| (n, Matrix4::identity(), 0))
        .collect();
    let mut visited = AHashSet::new();
    let mut triangles = 0usize;

    while let Some((index, parent, depth)) = stack.pop() {
        let Some(node) = doc.nodes.get(index) else {
            continue;
        };
        if depth > MAX_NODE_DEPTH || !visited.insert(index) {
            ctx.report.warning(
                ReportCategory::Geometry,
                format!("Node {} is referenced more than once or nested too deeply; ignored", index),
            );
            continue;
        }
        let world = parent * node_matrix(node);

        if let Some(mesh) = node.mesh.and_then(|m| doc.meshes.get(m)) {
            for primitive in &mesh.primitives {
                if primitive.mode.unwrap_or(MODE_TRIANGLES) != MODE_TRIANGLES {
                    ctx.skip("non-triangle primitive", NON_TRIANGLES);
                    continue;
                }
                let positions = primitive
                    .attributes
                    .get("POSITION")
                    .and_then(|&a| reader.positions(a));
                let Some(positions) = positions else {
                    ctx.skip("unreadable primitive", UNREADABLE_PRIMITIVE);
                    continue;
                };
                let order = match primitive.indices {
                    Some(a) => reader.indices(a),
                    None => Some((0..positions.len()).collect()),
                };
                let Some(order) = order.filter(|o| o.iter().all(|&i| i < positions.len())) else {
                    ctx.skip("unreadable primitive", UNREADABLE_PRIMITIVE);
                    continue;
                };

                let plan: Vec<Point> = positions
                    .iter()
                    .map(|p| {
                        let w = world * Vector4::new(p.x, p.y, p.z, 1.0);
                        Point::new(w.x * scale, w.z * scale)
                    })
                    .collect();
                for tri in order.chunks_exact(3) {
                    triangles += 1;
                    let (a, b, c) = (plan[tri[0]], plan[tri[1]], plan[tri[2]]);
                    edges.add(&mut ctx, a, b);
                    edges.add(&mut ctx, b, c);
                    edges.add(&mut ctx, c, a);
                }
            }
        }

        for &child in node.children.iter().rev() {
            stack.push((child, world, depth + 1));
        }
    }

    ctx.report.info(
        ReportCategory::Geometry,
        format!(
            "Projected {} triangles from {} nodes; {} unique edges",
            triangles,
            visited.len(),
            edges.unique()
        ),
    );
    edges.report(&mut ctx);
    ctx.finish(true)
}
