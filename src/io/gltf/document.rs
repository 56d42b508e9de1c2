//! The subset of the glTF JSON schema the importer reads

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GltfDocument {
    pub asset: Asset,
    pub scene: Option<usize>,
    pub scenes: Vec<Scene>,
    pub nodes: Vec<Node>,
    pub meshes: Vec<Mesh>,
    pub accessors: Vec<Accessor>,
    pub buffer_views: Vec<BufferView>,
    pub buffers: Vec<Buffer>,
    pub materials: Vec<Value>,
    pub cameras: Vec<Value>,
    pub extensions: BTreeMap<String, Value>,
}

impl GltfDocument {
    /// Lights declared through `KHR_lights_punctual`
    pub fn light_count(&self) -> usize {
        self.extensions
            .get("KHR_lights_punctual")
            .and_then(|ext| ext.get("lights"))
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Root nodes of the default scene; every parentless node without scenes
    pub fn root_nodes(&self) -> Vec<usize> {
        if !self.scenes.is_empty() {
            let index = self.scene.unwrap_or(0);
            return self
                .scenes
                .get(index)
                .map(|s| s.nodes.clone())
                .unwrap_or_default();
        }
        let mut is_child = vec![false; self.nodes.len()];
        for node in &self.nodes {
            for &c in &node.children {
                if let Some(flag) = is_child.get_mut(c) {
                    *flag = true;
                }
            }
        }
        (0..self.nodes.len()).filter(|&i| !is_child[i]).collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Asset {
    pub version: Option<String>,
    pub generator: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Scene {
    pub nodes: Vec<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Node {
    pub children: Vec<usize>,
    pub mesh: Option<usize>,
    /// Column-major 4x4
    pub matrix: Option<[f64; 16]>,
    pub translation: Option<[f64; 3]>,
    /// Quaternion `x, y, z, w`
    pub rotation: Option<[f64; 4]>,
    pub scale: Option<[f64; 3]>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Mesh {
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct Primitive {
    pub attributes: BTreeMap<String, usize>,
    pub indices: Option<usize>,
    pub mode: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Accessor {
    pub buffer_view: Option<usize>,
    pub byte_offset: usize,
    pub component_type: u32,
    pub count: usize,
    #[serde(rename = "type")]
    pub element_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct BufferView {
    pub buffer: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
    pub byte_stride: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct Buffer {
    pub uri: Option<String>,
    pub byte_length: usize,
}
