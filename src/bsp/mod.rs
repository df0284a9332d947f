// src/bsp/mod.rs
pub mod bsp_config;
pub mod bsp_level;
pub mod bsp_node;
mod bsp_plane;
mod bsp_poly;
#[cfg(test)]
mod bsp_procedural; // Room-grid generator for the property tests
mod bsp_seg;
mod bsp_select;
mod bsp_split;
pub mod bsp_util;
mod bsp_vertex;

use serde::{Deserialize, Serialize};

pub use bsp_config::BuildOptions;
pub use bsp_level::{build_levels, build_nodes, BspLevel};
pub use bsp_node::{BspTree, BuildStats, Node, NodeChild, OutputSeg, Subsector};
pub use bsp_util::{BoundingBox, Fixed, Line2D, Point2D, FRACBITS, FRACUNIT}; // Re-export geometry types

// Where a seg lies relative to a partition line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegPosition {
    Front,
    Back,
    Spanning,
}

/// Which side of its linedef a seg traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentSide {
    Front, // Right side of linedef
    Back,  // Left side of linedef
}
