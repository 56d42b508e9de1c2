//! glTF 2.0 scene import and export
//!
//! Import reads the JSON form and the binary GLB container, walks the node
//! hierarchy of the default scene and projects every triangle edge onto the
//! ground plane. Export writes a JSON document with one embedded buffer.

mod document;
mod export;
mod import;

pub use export::GltfExporter;
pub use import::import_gltf;

/// GLB chunk type of the JSON chunk (`JSON`)
pub const GLB_CHUNK_JSON: u32 = 0x4E4F_534A;
/// GLB chunk type of the binary chunk (`BIN\0`)
pub const GLB_CHUNK_BIN: u32 = 0x004E_4942;

/// Accessor component types
pub(crate) const COMPONENT_U8: u32 = 5121;
pub(crate) const COMPONENT_U16: u32 = 5123;
pub(crate) const COMPONENT_U32: u32 = 5125;
pub(crate) const COMPONENT_F32: u32 = 5126;

/// Primitive topology of triangle lists
pub(crate) const MODE_TRIANGLES: u32 = 4;

/// Buffer view targets
pub(crate) const TARGET_ARRAY_BUFFER: u32 = 34962;
pub(crate) const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;
