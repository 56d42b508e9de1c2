//! Drawing exchange format (ASCII DXF)
//!
//! Import maps drafting entities onto walls, labels, and dimensions and counts
//! everything else in the report; export writes an AutoCAD 2000 drawing with
//! one layer per plan element kind.

mod code_page;
pub mod reader;
pub mod writer;

pub use code_page::encoding_from_code_page;
pub use reader::{import_dxf, DxfCodePair, DxfHeader, DxfReader, DxfStreamReader, DxfTextReader};
pub use writer::{DxfExporter, DxfStreamWriter, DxfStreamWriterExt, DxfTextWriter, DXF_DECIMALS};
