//! Core value types shared across the crate

mod bounds;
mod color;
mod handle;
mod vector;

pub use bounds::BoundingBox2D;
pub use color::Color;
pub use handle::{Handle, HandleSeed};
pub use vector::Point;
