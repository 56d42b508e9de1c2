//! Wavefront OBJ mesh import and export
//!
//! Import projects every face and line edge onto the ground plane. Export
//! extrudes the plan into wall boxes, floor polygons and opening planes, with
//! a companion material library.

mod export;
mod import;

pub use export::ObjExporter;
pub use import::import_obj;
