// src/map/mod.rs
pub mod level;
pub mod linedef;
pub mod sidedef;
pub mod vertex;

pub use level::{Level, PolySpot};
pub use linedef::LineDef;
pub use sidedef::SideDef;
pub use vertex::Vertex;
