//! IFC (ISO 10303-21 STEP) interchange

mod export;
mod import;
mod resolver;
pub mod step;

pub use export::{new_guid, IfcExporter};
pub use import::import_ifc;
pub use step::{parse_step, StepEntity, StepFile, StepValue};
