//! SketchPlan round-trip format
//!
//! The engine's own XML format: one element per canonical entity, every
//! attribute of the model kept. Exporting a plan and importing the result
//! reproduces it to the written precision.

mod export;
mod import;

pub use export::SketchExporter;
pub use import::import_sketch;

/// Format revision written to the root `version` attribute
pub const SKETCH_FORMAT_VERSION: &str = "1";
