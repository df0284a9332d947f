// src/bsp/bsp_procedural.rs
//! Seeded room-grid levels for the builder's property tests.
//!
//! The grid has columns and rows of random size. Neighbouring cells share a
//! two-sided line; now and then a cell takes over its western neighbour's
//! sector, and some cells get a square pillar in the middle.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::map::Level;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub columns: usize,
    pub rows: usize,
    pub min_cell_size: i32,
    pub max_cell_size: i32,
    /// Chance that a cell shares its western neighbour's sector.
    pub merge_chance: f64,
    /// Chance that a cell (at least 64 units each way) gets a pillar.
    pub pillar_chance: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            columns: 4,
            rows: 3,
            min_cell_size: 64,
            max_cell_size: 256,
            merge_chance: 0.2,
            pillar_chance: 0.3,
        }
    }
}

#[derive(Default, Debug)]
pub struct GenerationStats {
    pub cells: usize,
    pub sectors: usize,
    pub pillars: usize,
    /// Floor area in square map units, pillars excluded.
    pub area: f64,
}

pub struct ProceduralGenerator {
    config: GeneratorConfig,
    rng: StdRng,
    stats: GenerationStats,
}

impl ProceduralGenerator {
    pub fn new(config: GeneratorConfig, seed: u64) -> Self {
        ProceduralGenerator {
            config,
            rng: StdRng::seed_from_u64(seed),
            stats: GenerationStats::default(),
        }
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    pub fn generate(&mut self) -> Level {
        let (columns, rows) = (self.config.columns, self.config.rows);
        let xs = self.grid_lines(columns);
        let ys = self.grid_lines(rows);

        let mut level = Level::new();
        for &y in &ys {
            for &x in &xs {
                level.add_vertex(x, y);
            }
        }
        let vertex = |column: usize, row: usize| row * (columns + 1) + column;

        let cell_sectors = self.assign_sectors(&mut level);
        let sector = |column: usize, row: usize| cell_sectors[row * columns + column];

        // Vertical grid lines, drawn northwards.
        for column in 0..=columns {
            for row in 0..rows {
                let (south, north) = (vertex(column, row), vertex(column, row + 1));
                if column == 0 {
                    level.add_wall(south, north, sector(0, row));
                } else if column == columns {
                    level.add_wall(north, south, sector(columns - 1, row));
                } else {
                    level.add_two_sided(south, north, sector(column, row), sector(column - 1, row));
                }
            }
        }

        // Horizontal grid lines, drawn eastwards.
        for row in 0..=rows {
            for column in 0..columns {
                let (west, east) = (vertex(column, row), vertex(column + 1, row));
                if row == 0 {
                    level.add_wall(east, west, sector(column, 0));
                } else if row == rows {
                    level.add_wall(west, east, sector(column, rows - 1));
                } else {
                    level.add_two_sided(west, east, sector(column, row - 1), sector(column, row));
                }
            }
        }

        let width = (xs[columns] - xs[0]) as f64;
        let height = (ys[rows] - ys[0]) as f64;
        self.stats.cells = columns * rows;
        self.stats.area = width * height;

        for row in 0..rows {
            for column in 0..columns {
                let (x0, x1) = (xs[column], xs[column + 1]);
                let (y0, y1) = (ys[row], ys[row + 1]);
                self.maybe_add_pillar(&mut level, (x0, y0, x1, y1), sector(column, row));
            }
        }

        level
    }

    // Cumulative positions of `cells + 1` grid lines, on an 8-unit grid.
    fn grid_lines(&mut self, cells: usize) -> Vec<i32> {
        let (min, max) = (self.config.min_cell_size / 8, self.config.max_cell_size / 8);
        let mut lines = vec![0];
        let mut position = 0;
        for _ in 0..cells {
            position += self.rng.random_range(min..=max) * 8;
            lines.push(position);
        }
        lines
    }

    fn assign_sectors(&mut self, level: &mut Level) -> Vec<usize> {
        let columns = self.config.columns;
        let mut sectors = Vec::with_capacity(columns * self.config.rows);
        for row in 0..self.config.rows {
            for column in 0..columns {
                if column > 0 && self.rng.random_bool(self.config.merge_chance) {
                    let west = sectors[row * columns + column - 1];
                    sectors.push(west);
                } else {
                    sectors.push(level.add_sector());
                }
            }
        }
        self.stats.sectors = level.sector_count;
        sectors
    }

    // Pillar walls run counterclockwise so they face out into the cell.
    fn maybe_add_pillar(&mut self, level: &mut Level, cell: (i32, i32, i32, i32), sector: usize) {
        let (x0, y0, x1, y1) = cell;
        let size = (x1 - x0).min(y1 - y0);
        if size < 64 || !self.rng.random_bool(self.config.pillar_chance) {
            return;
        }

        let half = size / 8;
        let (cx, cy) = ((x0 + x1) / 2, (y0 + y1) / 2);
        level.add_loop(
            &[
                (cx - half, cy - half),
                (cx + half, cy - half),
                (cx + half, cy + half),
                (cx - half, cy + half),
            ],
            sector,
        );
        self.stats.pillars += 1;
        self.stats.area -= (2 * half) as f64 * (2 * half) as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_has_expected_lines() {
        let config = GeneratorConfig {
            columns: 3,
            rows: 2,
            pillar_chance: 0.0,
            ..GeneratorConfig::default()
        };
        let mut generator = ProceduralGenerator::new(config, 7);
        let level = generator.generate();

        assert_eq!(level.vertices.len(), 4 * 3);
        // 4 vertical lines of 2 segments, 3 horizontal lines of 3 segments.
        assert_eq!(level.linedefs.len(), 4 * 2 + 3 * 3);
        let two_sided = level.linedefs.iter().filter(|l| l.is_two_sided()).count();
        assert_eq!(two_sided, 2 * 2 + 3);
        assert_eq!(generator.stats().cells, 6);
        assert_eq!(generator.stats().pillars, 0);
        assert!(generator.stats().sectors >= 2 && generator.stats().sectors <= 6);
        assert!(generator.stats().area > 0.0);
    }

    #[test]
    fn test_same_seed_same_level() {
        let a = ProceduralGenerator::new(GeneratorConfig::default(), 42).generate();
        let b = ProceduralGenerator::new(GeneratorConfig::default(), 42).generate();
        assert_eq!(a, b);
    }
}
