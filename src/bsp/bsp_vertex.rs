// src/bsp/bsp_vertex.rs
//! Vertex store for a build. Every vertex the builder creates goes through
//! [`VertexMap::intern`], which folds near-coincident points together so a
//! split landing next to an existing vertex reuses it.

use crate::bsp::bsp_util::{to_fixed, BoundingBox, Fixed, Point2D, FRACBITS};
use crate::error::{BuildError, MalformedReason};
use crate::map::Level;

// 256 map units per block.
const BLOCK_SHIFT: i32 = 8 + FRACBITS;

#[derive(Debug)]
pub struct VertexMap {
    vertices: Vec<Point2D>,
    blocks: Vec<Vec<u32>>,
    min_x: i64,
    min_y: i64,
    blocks_wide: i64,
    blocks_tall: i64,
    epsilon: i64,
}

impl VertexMap {
    pub fn new(bounds: &BoundingBox, epsilon: Fixed) -> Self {
        let (min_x, min_y, max_x, max_y) = if bounds.is_empty() {
            (0, 0, 0, 0)
        } else {
            (
                bounds.min_x as i64,
                bounds.min_y as i64,
                bounds.max_x as i64,
                bounds.max_y as i64,
            )
        };
        let blocks_wide = ((max_x - min_x) >> BLOCK_SHIFT) + 1;
        let blocks_tall = ((max_y - min_y) >> BLOCK_SHIFT) + 1;

        VertexMap {
            vertices: Vec::new(),
            blocks: vec![Vec::new(); (blocks_wide * blocks_tall) as usize],
            min_x,
            min_y,
            blocks_wide,
            blocks_tall,
            epsilon: epsilon as i64,
        }
    }

    /// Interns every vertex a line refers to, in line order. Vertices no line
    /// uses never enter the map. The second value maps input vertex indices
    /// to interned ones.
    pub fn from_level(
        level: &Level,
        epsilon: Fixed,
    ) -> Result<(VertexMap, Vec<Option<u32>>), BuildError> {
        let mut bounds = BoundingBox::new_empty();
        let mut fixed = vec![None; level.vertices.len()];

        for (line, linedef) in level.linedefs.iter().enumerate() {
            for index in [linedef.start, linedef.end] {
                let malformed = |reason| BuildError::MalformedGeometry { line, reason };
                let vertex = level
                    .vertices
                    .get(index)
                    .ok_or_else(|| malformed(MalformedReason::BadVertex(index)))?;
                let point = match (to_fixed(vertex.raw_x), to_fixed(vertex.raw_y)) {
                    (Some(x), Some(y)) => Point2D::new(x, y),
                    _ => return Err(malformed(MalformedReason::VertexOutOfRange(index))),
                };
                bounds.expand_point(point.x, point.y);
                if !bounds.fits_fixed_deltas() {
                    return Err(malformed(MalformedReason::SpanTooWide(index)));
                }
                fixed[index] = Some(point);
            }
        }

        let mut map = VertexMap::new(&bounds, epsilon);
        let mut ids = vec![None; level.vertices.len()];
        for linedef in &level.linedefs {
            for index in [linedef.start, linedef.end] {
                if ids[index].is_none() {
                    if let Some(point) = fixed[index] {
                        ids[index] = Some(map.intern(point));
                    }
                }
            }
        }

        Ok((map, ids))
    }

    fn block_coords(&self, x: i64, y: i64) -> (i64, i64) {
        let bx = ((x - self.min_x) >> BLOCK_SHIFT).clamp(0, self.blocks_wide - 1);
        let by = ((y - self.min_y) >> BLOCK_SHIFT).clamp(0, self.blocks_tall - 1);
        (bx, by)
    }

    /// The earliest vertex within epsilon of `point` on both axes.
    pub fn find(&self, point: Point2D) -> Option<u32> {
        let (x, y) = (point.x as i64, point.y as i64);
        let (bx0, by0) = self.block_coords(x - self.epsilon, y - self.epsilon);
        let (bx1, by1) = self.block_coords(x + self.epsilon, y + self.epsilon);

        let mut best: Option<u32> = None;
        for by in by0..=by1 {
            for bx in bx0..=bx1 {
                for &index in &self.blocks[(by * self.blocks_wide + bx) as usize] {
                    let vertex = self.vertices[index as usize];
                    let dx = (vertex.x as i64 - x).abs();
                    let dy = (vertex.y as i64 - y).abs();
                    let close = dx < self.epsilon && dy < self.epsilon;
                    if (close || (dx == 0 && dy == 0)) && best.map_or(true, |b| index < b) {
                        best = Some(index);
                    }
                }
            }
        }
        best
    }

    pub fn intern(&mut self, point: Point2D) -> u32 {
        if let Some(index) = self.find(point) {
            return index;
        }

        let index = self.vertices.len() as u32;
        self.vertices.push(point);
        let (bx, by) = self.block_coords(point.x as i64, point.y as i64);
        self.blocks[(by * self.blocks_wide + bx) as usize].push(index);
        index
    }

    pub fn point(&self, index: u32) -> Point2D {
        self.vertices[index as usize]
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn into_points(self) -> Vec<Point2D> {
        self.vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsp::bsp_util::FRACUNIT;

    fn map_over(size: i32) -> VertexMap {
        VertexMap::new(&BoundingBox::new(0, 0, size << FRACBITS, size << FRACBITS), 6)
    }

    #[test]
    fn test_intern_is_idempotent() {
        let mut map = map_over(1024);
        let a = map.intern(Point2D::new(64 * FRACUNIT, 32 * FRACUNIT));
        let b = map.intern(Point2D::new(64 * FRACUNIT, 32 * FRACUNIT));
        assert_eq!(a, b);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_intern_merges_within_epsilon() {
        let mut map = map_over(1024);
        let a = map.intern(Point2D::new(100 * FRACUNIT, 100 * FRACUNIT));
        let near = map.intern(Point2D::new(100 * FRACUNIT + 5, 100 * FRACUNIT - 5));
        let far = map.intern(Point2D::new(100 * FRACUNIT + 6, 100 * FRACUNIT));
        assert_eq!(a, near);
        assert_ne!(a, far);
    }

    #[test]
    fn test_lowest_index_wins() {
        let mut map = map_over(1024);
        let first = map.intern(Point2D::new(0, 0));
        let second = map.intern(Point2D::new(10, 0));
        assert_ne!(first, second);
        assert_eq!(map.intern(Point2D::new(5, 0)), first);
    }

    #[test]
    fn test_lookup_crosses_block_boundary() {
        let mut map = map_over(1024);
        let edge = (1 << BLOCK_SHIFT) - 1;
        let a = map.intern(Point2D::new(edge, 0));
        assert_eq!(map.intern(Point2D::new(edge + 3, 0)), a);
    }

    #[test]
    fn test_out_of_bounds_points_are_clamped() {
        let mut map = map_over(256);
        let a = map.intern(Point2D::new(-50 * FRACUNIT, 900 * FRACUNIT));
        assert_eq!(map.find(Point2D::new(-50 * FRACUNIT, 900 * FRACUNIT)), Some(a));
    }

    #[test]
    fn test_from_level_skips_unused_vertices() {
        let mut level = Level::new();
        let sector = level.add_sector();
        let unused = level.add_vertex(5000, 5000);
        level.add_loop(&[(0, 0), (0, 64), (64, 64)], sector);

        let (map, ids) = VertexMap::from_level(&level, 6).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(ids[unused], None);
        assert_eq!(ids[1], Some(0));
    }

    #[test]
    fn test_from_level_reports_bad_vertex() {
        let mut level = Level::new();
        let sector = level.add_sector();
        level.add_vertex(0, 0);
        level.add_wall(0, 9, sector);

        let err = VertexMap::from_level(&level, 6).unwrap_err();
        assert_eq!(
            err,
            BuildError::MalformedGeometry {
                line: 0,
                reason: MalformedReason::BadVertex(9)
            }
        );
    }

    #[test]
    fn test_from_level_rejects_too_wide_span() {
        let mut level = Level::new();
        let sector = level.add_sector();
        level.add_vertex(-20000, 0);
        level.add_vertex(20000, 0);
        level.add_vertex(0, 64);
        level.add_wall(0, 2, sector);
        level.add_wall(2, 1, sector);
        level.add_wall(1, 0, sector);

        let err = VertexMap::from_level(&level, 6).unwrap_err();
        assert_eq!(
            err,
            BuildError::MalformedGeometry {
                line: 1,
                reason: MalformedReason::SpanTooWide(1)
            }
        );
    }

    #[test]
    fn test_from_level_reports_out_of_range() {
        let mut level = Level::new();
        let sector = level.add_sector();
        level.add_vertex(0, 0);
        level.add_vertex(40000, 0);
        level.add_wall(0, 1, sector);

        let err = VertexMap::from_level(&level, 6).unwrap_err();
        assert!(matches!(
            err,
            BuildError::MalformedGeometry {
                reason: MalformedReason::VertexOutOfRange(1),
                ..
            }
        ));
    }
}
