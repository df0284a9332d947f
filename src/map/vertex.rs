// src/map/vertex.rs
use serde::{Deserialize, Serialize};

/// A map vertex in whole map units, as handed over by the level loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub raw_x: i32,
    pub raw_y: i32,
}

impl Vertex {
    pub fn new(raw_x: i32, raw_y: i32) -> Self {
        Vertex { raw_x, raw_y }
    }

    pub fn matches(&self, tx: i32, ty: i32) -> bool {
        self.raw_x == tx && self.raw_y == ty
    }
}
