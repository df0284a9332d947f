// src/lib.rs
//! Node builder for Doom-style levels: turns a level's lines into a BSP tree
//! of nodes and convex subsectors, optionally with closed (GL) subsectors.

pub mod bsp;
pub mod error;
pub mod map;

pub use bsp::{build_levels, build_nodes, BspTree, BuildOptions};
pub use error::BuildError;
pub use map::Level;
