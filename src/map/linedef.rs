// src/map/linedef.rs
use serde::{Deserialize, Serialize};

/// A line between two vertices. `right` is the front side, `left` the back
/// side; each names an index into the level's sidedefs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDef {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub right: Option<usize>,
    #[serde(default)]
    pub left: Option<usize>,
}

impl LineDef {
    /// A one-sided wall.
    pub fn one_sided(start: usize, end: usize, right: usize) -> Self {
        LineDef {
            start,
            end,
            right: Some(right),
            left: None,
        }
    }

    /// A two-sided line, e.g. the boundary between two sectors.
    pub fn two_sided(start: usize, end: usize, right: usize, left: usize) -> Self {
        LineDef {
            start,
            end,
            right: Some(right),
            left: Some(left),
        }
    }

    pub fn is_two_sided(&self) -> bool {
        self.right.is_some() && self.left.is_some()
    }
}
