// src/map/sidedef.rs
use serde::{Deserialize, Serialize};

/// One side of a linedef.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideDef {
    /// Sector index this side faces into.
    pub sector: usize,

    /// Starting distance along the line for segs built from this side, in map units.
    #[serde(default)]
    pub offset: i32,
}

impl SideDef {
    pub fn new(sector: usize) -> Self {
        SideDef { sector, offset: 0 }
    }
}
