// src/map/level.rs

use serde::{Deserialize, Serialize};

use crate::map::{LineDef, SideDef, Vertex};

/// A point inside a polyobject container, in map units. The builder finds
/// the wall loop around it and keeps splitters from cutting through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolySpot {
    pub x: i32,
    pub y: i32,
}

/// The geometry a level loader hands to the node builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub vertices: Vec<Vertex>,
    pub linedefs: Vec<LineDef>,
    pub sidedefs: Vec<SideDef>,
    pub sector_count: usize,
    #[serde(default)]
    pub poly_spots: Vec<PolySpot>,
}

impl Level {
    /// Create a new empty level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, x: i32, y: i32) -> usize {
        self.vertices.push(Vertex::new(x, y));
        self.vertices.len() - 1
    }

    /// Adds a sector and returns its index.
    pub fn add_sector(&mut self) -> usize {
        self.sector_count += 1;
        self.sector_count - 1
    }

    /// Adds a sidedef facing `sector` and returns its index.
    pub fn add_sidedef(&mut self, sector: usize) -> usize {
        self.sidedefs.push(SideDef::new(sector));
        self.sidedefs.len() - 1
    }

    /// Adds a one-sided wall whose front faces `sector`.
    pub fn add_wall(&mut self, start: usize, end: usize, sector: usize) -> usize {
        let right = self.add_sidedef(sector);
        self.linedefs.push(LineDef::one_sided(start, end, right));
        self.linedefs.len() - 1
    }

    /// Adds a two-sided line between `front` (right) and `back` (left).
    pub fn add_two_sided(&mut self, start: usize, end: usize, front: usize, back: usize) -> usize {
        let right = self.add_sidedef(front);
        let left = self.add_sidedef(back);
        self.linedefs.push(LineDef::two_sided(start, end, right, left));
        self.linedefs.len() - 1
    }

    /// Adds a closed loop of one-sided walls through `points` (in order),
    /// all facing `sector`. Returns the linedef indices.
    pub fn add_loop(&mut self, points: &[(i32, i32)], sector: usize) -> Vec<usize> {
        let first = self.vertices.len();
        for &(x, y) in points {
            self.add_vertex(x, y);
        }
        (0..points.len())
            .map(|i| {
                let start = first + i;
                let end = first + (i + 1) % points.len();
                self.add_wall(start, end, sector)
            })
            .collect()
    }

    pub fn add_poly_spot(&mut self, x: i32, y: i32) {
        self.poly_spots.push(PolySpot { x, y });
    }
}
