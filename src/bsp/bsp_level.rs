// src/bsp/bsp_level.rs
//! Drives a node build: turns a level into segs, divides them recursively
//! and flattens the result into a [`BspTree`].

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::bsp::bsp_config::BuildOptions;
use crate::bsp::bsp_node::{
    BspTree, BuildStats, DraftSubsector, Node, NodeChild, OutputSeg, Subsector,
};
use crate::bsp::bsp_plane::group_seg_planes;
use crate::bsp::bsp_poly::find_poly_containers;
use crate::bsp::bsp_seg::SegTable;
use crate::bsp::bsp_select::{LeafVerdict, Splitter, SplitterChoice, SplitterSelector};
use crate::bsp::bsp_split::SegSplitter;
use crate::bsp::bsp_util::{point_to_angle, BoundingBox};
use crate::bsp::bsp_vertex::VertexMap;
use crate::error::BuildError;
use crate::map::Level;

/// Builds the tree for one level.
pub fn build_nodes(level: &Level, options: BuildOptions) -> Result<BspTree, BuildError> {
    Ok(BspLevel::new(level, options)?.build())
}

/// Builds every level on the rayon pool. Results come back in input order.
pub fn build_levels(levels: &[Level], options: BuildOptions) -> Vec<Result<BspTree, BuildError>> {
    levels
        .par_iter()
        .map(|level| build_nodes(level, options))
        .collect()
}

pub struct BspLevel {
    options: BuildOptions,
    vertices: VertexMap,
    map_vertex_count: usize,
    segs: SegTable,
    selector: SplitterSelector,
    splitter: SegSplitter,
    nodes: Vec<Node>,
    drafts: Vec<DraftSubsector>,
    stats: BuildStats,
    segs_stuffed: usize,
}

impl BspLevel {
    /// Checks the options and the level and prepares the initial seg set.
    pub fn new(level: &Level, options: BuildOptions) -> Result<Self, BuildError> {
        options.validate()?;
        if level.linedefs.is_empty() {
            return Err(BuildError::EmptyLevel);
        }

        let (vertices, vertex_ids) = VertexMap::from_level(level, options.vertex_epsilon)?;
        let mut segs = SegTable::from_level(level, &vertex_ids)?;
        let poly_containers =
            find_poly_containers(&level.poly_spots, &mut segs, &vertices, options.side_epsilon);
        let planes = group_seg_planes(&mut segs, &vertices, options.side_epsilon);
        debug!(
            "Prepared {} segs on {} planes from {} lines ({} vertices used)",
            segs.len(),
            planes,
            level.linedefs.len(),
            vertices.len()
        );

        Ok(BspLevel {
            options,
            map_vertex_count: vertices.len(),
            vertices,
            segs,
            selector: SplitterSelector::new(options),
            splitter: SegSplitter::new(options),
            nodes: Vec::new(),
            drafts: Vec::new(),
            stats: BuildStats {
                poly_containers,
                ..BuildStats::default()
            },
            segs_stuffed: 0,
        })
    }

    pub fn build(mut self) -> BspTree {
        info!(
            "Building {}nodes for {} segs",
            if self.options.gl_nodes { "GL " } else { "" },
            self.segs.len()
        );

        let count = self.segs.len();
        let (root, bbox) = self.create_node(0, count, 0);
        let (segs, subsectors) = self.create_subsectors_for_real();

        self.stats.nodes = self.nodes.len();
        self.stats.subsectors = subsectors.len();
        self.stats.segs = segs.len();
        self.stats.minisegs = segs.iter().filter(|seg| seg.is_miniseg()).count();
        info!(
            "Built {} nodes and {} subsectors from {} segs ({} minisegs, {} splits, {} shoves, depth {}) covering ({}, {})-({}, {})",
            self.stats.nodes,
            self.stats.subsectors,
            self.stats.segs,
            self.stats.minisegs,
            self.stats.splits,
            self.stats.shoves,
            self.stats.max_depth,
            bbox.min_x >> 16,
            bbox.min_y >> 16,
            bbox.max_x >> 16,
            bbox.max_y >> 16
        );

        BspTree {
            vertices: self.vertices.into_points(),
            map_vertex_count: self.map_vertex_count,
            segs,
            subsectors,
            nodes: self.nodes,
            root,
            stats: self.stats,
        }
    }

    /// Divides the set until every piece is a subsector. `count` only sizes
    /// the splitter search step, so an estimate is fine.
    fn create_node(&mut self, set: u32, count: usize, depth: usize) -> (NodeChild, BoundingBox) {
        self.stats.max_depth = self.stats.max_depth.max(depth);

        let splitter = match self.choose_splitter(set, count) {
            Some(splitter) => splitter,
            None => return self.create_subsector(set),
        };
        if splitter.forced.is_some() {
            self.stats.shoves += 1;
        }

        let result = self
            .splitter
            .split_segs(&mut self.segs, &mut self.vertices, set, &splitter);
        self.stats.splits += result.splits;

        let (front, back) = match (result.front, result.back) {
            (Some(front), Some(back)) => (front, back),
            (front, back) => {
                warn!("Splitter on seg {} left one side empty", splitter.seg);
                return self.create_subsector(front.or(back).unwrap_or(set));
            }
        };

        let (front_child, front_bbox) = self.create_node(front, result.front_count, depth + 1);
        let (back_child, back_bbox) = self.create_node(back, result.back_count, depth + 1);

        let line = splitter.line;
        self.nodes.push(Node {
            x: line.x,
            y: line.y,
            dx: line.dx,
            dy: line.dy,
            bbox: [front_bbox, back_bbox],
            children: [front_child, back_child],
        });
        (
            NodeChild::node(self.nodes.len() as u32 - 1),
            BoundingBox::union(&front_bbox, &back_bbox),
        )
    }

    // Tries the full search step first, then every seg, and only gives up
    // on protected segs when nothing else divides the set.
    fn choose_splitter(&mut self, set: u32, count: usize) -> Option<Splitter> {
        let real_segs = self
            .segs
            .set_iter(Some(set))
            .filter(|&index| !self.segs.get(index).is_miniseg())
            .take(2)
            .count();
        if real_segs <= 1 {
            return None;
        }

        let skip = count / self.options.max_segs;
        let mut choice = self.select(set, skip, true);
        if skip > 0 && !matches!(choice, SplitterChoice::Found(_)) {
            choice = self.select(set, 1, true);
        }
        if choice == SplitterChoice::NoneButUnsplittable {
            choice = self.select(set, skip, false);
            if skip > 0 && !matches!(choice, SplitterChoice::Found(_)) {
                choice = self.select(set, 1, false);
            }
        }
        if let SplitterChoice::Found(splitter) = choice {
            return Some(splitter);
        }

        match self.selector.check_subsector(&self.segs, &self.vertices, set) {
            LeafVerdict::Yes => None,
            LeafVerdict::No(splitter) => Some(splitter),
        }
    }

    fn select(&mut self, set: u32, step: usize, honor_no_split: bool) -> SplitterChoice {
        self.selector
            .select_splitter(&self.segs, &self.vertices, set, step, honor_no_split)
    }

    // Only the set head is kept: splits further down the tree may still add
    // partner pieces to this set.
    fn create_subsector(&mut self, set: u32) -> (NodeChild, BoundingBox) {
        let mut bbox = BoundingBox::new_empty();
        let mut count = 0;
        for index in self.segs.set_iter(Some(set)) {
            let (v1, v2) = self.segs.endpoints(index, &self.vertices);
            bbox.expand_point(v1.x, v1.y);
            bbox.expand_point(v2.x, v2.y);
            count += 1;
        }

        self.drafts.push(DraftSubsector { set_head: set });
        self.report_progress(count);
        (NodeChild::subsector(self.drafts.len() as u32 - 1), bbox)
    }

    fn report_progress(&mut self, count: usize) {
        let before = self.segs_stuffed;
        self.segs_stuffed += count;
        if before & !63 != self.segs_stuffed & !63 {
            let percent = self.segs_stuffed as f64 * 100.0 / self.segs.len() as f64;
            debug!("BSP: {:.1}%", percent.min(100.0));
        }
    }

    /// Lays out every subsector's segs in one list. Within a subsector, segs
    /// between two sectors come first, then same-sector segs, then minisegs;
    /// real segs are ordered by linedef.
    fn create_subsectors_for_real(&self) -> (Vec<OutputSeg>, Vec<Subsector>) {
        let mut order: Vec<u32> = Vec::with_capacity(self.segs.len());
        let mut subsectors = Vec::with_capacity(self.drafts.len());

        for (number, draft) in self.drafts.iter().enumerate() {
            let first = order.len();
            order.extend(self.segs.set_iter(Some(draft.set_head)));

            let leaf = &mut order[first..];
            leaf.sort_by_key(|&index| self.sort_key(index));
            if leaf.iter().all(|&index| self.segs.get(index).is_miniseg()) {
                warn!("Subsector {} has only minisegs", number);
            }

            subsectors.push(Subsector {
                first: first as u32,
                count: (order.len() - first) as u32,
            });
        }
        debug_assert_eq!(order.len(), self.segs.len());

        let mut position: Vec<Option<u32>> = vec![None; self.segs.len()];
        for (out, &index) in order.iter().enumerate() {
            position[index as usize] = Some(out as u32);
        }

        let segs = order
            .iter()
            .map(|&index| {
                let seg = self.segs.get(index);
                let (v1, v2) = self.segs.endpoints(index, &self.vertices);
                let angle = point_to_angle(v2.x.wrapping_sub(v1.x), v2.y.wrapping_sub(v1.y));
                OutputSeg {
                    v1: seg.v1,
                    v2: seg.v2,
                    linedef: seg.linedef,
                    side: seg.side,
                    angle: (angle >> 16) as u16,
                    offset: seg.offset,
                    front_sector: seg.front_sector,
                    back_sector: seg.back_sector,
                    partner: seg.partner.and_then(|partner| position[partner as usize]),
                }
            })
            .collect();

        (segs, subsectors)
    }

    fn sort_key(&self, index: u32) -> (u8, u32) {
        let seg = self.segs.get(index);
        match seg.linedef {
            None => (2, 0),
            Some(linedef) if seg.is_special() => (1, linedef),
            Some(linedef) => (0, linedef),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_approx_eq::assert_approx_eq;

    use super::*;
    use crate::bsp::bsp_procedural::{GeneratorConfig, ProceduralGenerator};
    use crate::bsp::bsp_util::{Point2D, FRACBITS};

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn quad() -> Level {
        let mut level = Level::new();
        let sector = level.add_sector();
        level.add_loop(&[(0, 0), (0, 64), (64, 64), (64, 0)], sector);
        level
    }

    fn l_room() -> Level {
        let mut level = Level::new();
        let sector = level.add_sector();
        level.add_loop(
            &[(0, 0), (0, 256), (128, 256), (128, 128), (256, 128), (256, 0)],
            sector,
        );
        level
    }

    fn two_rooms() -> Level {
        let mut level = Level::new();
        let west = level.add_sector();
        let east = level.add_sector();
        let a = level.add_vertex(0, 0);
        let b = level.add_vertex(0, 128);
        let c = level.add_vertex(128, 128);
        let d = level.add_vertex(128, 0);
        let e = level.add_vertex(256, 128);
        let f = level.add_vertex(256, 0);
        level.add_wall(a, b, west);
        level.add_wall(b, c, west);
        level.add_two_sided(c, d, west, east);
        level.add_wall(d, a, west);
        level.add_wall(c, e, east);
        level.add_wall(e, f, east);
        level.add_wall(f, d, east);
        level
    }

    // A triangle cut in two by a line from its apex to the base.
    fn split_triangle() -> Level {
        let mut level = Level::new();
        let west = level.add_sector();
        let east = level.add_sector();
        let a = level.add_vertex(0, 0);
        let c = level.add_vertex(128, 256);
        let b = level.add_vertex(256, 0);
        let m = level.add_vertex(128, 0);
        level.add_wall(a, c, west);
        level.add_wall(m, a, west);
        level.add_wall(c, b, east);
        level.add_wall(b, m, east);
        level.add_two_sided(c, m, west, east);
        level
    }

    // The L room again, plus a two-sided line facing the room on both sides.
    // It continues the inner corner's wall part of the way south and is added
    // first, so it has the lowest linedef number.
    fn l_room_with_inner_line() -> Level {
        let mut level = Level::new();
        let sector = level.add_sector();
        let top = level.add_vertex(128, 128);
        let bottom = level.add_vertex(128, 64);
        level.add_two_sided(top, bottom, sector, sector);
        level.add_loop(
            &[(0, 0), (0, 256), (128, 256), (128, 128), (256, 128), (256, 0)],
            sector,
        );
        level
    }

    fn point(tree: &BspTree, vertex: u32) -> Point2D {
        tree.vertices[vertex as usize]
    }

    // Unsigned area of a closed subsector, in square map units.
    fn subsector_area(tree: &BspTree, subsector: usize) -> f64 {
        let unit = (1 << FRACBITS) as f64;
        let twice: f64 = tree
            .subsector_segs(subsector)
            .iter()
            .map(|seg| {
                let (p1, p2) = (point(tree, seg.v1), point(tree, seg.v2));
                let (x1, y1) = (p1.x as f64 / unit, p1.y as f64 / unit);
                let (x2, y2) = (p2.x as f64 / unit, p2.y as f64 / unit);
                x1 * y2 - x2 * y1
            })
            .sum();
        twice.abs() / 2.0
    }

    fn assert_closed(tree: &BspTree) {
        for subsector in 0..tree.subsectors.len() {
            let mut balance: HashMap<u32, i32> = HashMap::new();
            for seg in tree.subsector_segs(subsector) {
                *balance.entry(seg.v1).or_default() += 1;
                *balance.entry(seg.v2).or_default() -= 1;
            }
            assert!(
                balance.values().all(|&b| b == 0),
                "subsector {} is not closed",
                subsector
            );
        }
    }

    fn assert_partners(tree: &BspTree) {
        for (index, seg) in tree.segs.iter().enumerate() {
            if let Some(partner) = seg.partner {
                let other = &tree.segs[partner as usize];
                assert_eq!(other.partner, Some(index as u32));
                assert_eq!((other.v1, other.v2), (seg.v2, seg.v1));
            }
        }
    }

    fn assert_no_degenerate_segs(tree: &BspTree) {
        for seg in &tree.segs {
            assert_ne!(point(tree, seg.v1), point(tree, seg.v2));
        }
    }

    fn assert_sector_pure(tree: &BspTree) {
        for subsector in 0..tree.subsectors.len() {
            let mut sectors = tree
                .subsector_segs(subsector)
                .iter()
                .filter(|seg| !seg.is_miniseg())
                .map(|seg| seg.front_sector);
            let first = sectors.next().expect("subsector without real segs");
            assert!(sectors.all(|sector| sector == first));
        }
    }

    // Each node child's bbox is exactly the bounds of the segs beneath it.
    fn assert_bboxes(tree: &BspTree) {
        fn bounds_under(tree: &BspTree, child: NodeChild) -> BoundingBox {
            let mut bounds = BoundingBox::new_empty();
            if child.is_subsector() {
                for seg in tree.subsector_segs(child.index() as usize) {
                    for vertex in [seg.v1, seg.v2] {
                        let p = point(tree, vertex);
                        bounds.expand_point(p.x, p.y);
                    }
                }
            } else {
                let node = &tree.nodes[child.index() as usize];
                for side in 0..2 {
                    let beneath = bounds_under(tree, node.children[side]);
                    assert_eq!(node.bbox[side], beneath, "node {} side {}", child.index(), side);
                    bounds.combine(&beneath);
                }
            }
            bounds
        }

        bounds_under(tree, tree.root);
    }

    fn check_tree(tree: &BspTree, gl_nodes: bool) {
        assert_eq!(tree.stats.subsectors, tree.subsectors.len());
        assert_eq!(tree.stats.nodes, tree.nodes.len());
        assert_eq!(tree.subsectors.len(), tree.nodes.len() + 1);
        let total: u32 = tree.subsectors.iter().map(|sub| sub.count).sum();
        assert_eq!(total as usize, tree.segs.len());
        assert_partners(tree);
        assert_no_degenerate_segs(tree);
        assert_bboxes(tree);
        if gl_nodes {
            assert_closed(tree);
        } else {
            assert!(tree.segs.iter().all(|seg| !seg.is_miniseg()));
        }
    }

    #[test]
    fn test_convex_quad_is_one_subsector() {
        init_logging();
        for options in [BuildOptions::default(), BuildOptions::gl()] {
            let tree = build_nodes(&quad(), options).unwrap();
            assert!(tree.nodes.is_empty());
            assert_eq!(tree.root, NodeChild::subsector(0));
            assert_eq!(tree.subsectors, vec![Subsector { first: 0, count: 4 }]);
            assert_eq!(tree.stats.minisegs, 0);
            assert_eq!(tree.map_vertex_count, 4);
            check_tree(&tree, options.gl_nodes);
        }
    }

    #[test]
    fn test_l_room_needs_one_node() {
        init_logging();
        let tree = build_nodes(&l_room(), BuildOptions::default()).unwrap();
        check_tree(&tree, false);
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.subsectors.len(), 2);
        assert_eq!(tree.root, NodeChild::node(0));
        assert_eq!(tree.stats.splits, 1);

        let node = &tree.nodes[0];
        assert_eq!((node.x, node.dx), (128 << FRACBITS, 0));
        assert!(node.dy < 0);
        assert_eq!(node.children, [NodeChild::subsector(0), NodeChild::subsector(1)]);
        assert_eq!(
            node.bbox[0],
            BoundingBox::new(0, 0, 128 << FRACBITS, 256 << FRACBITS)
        );
        assert_eq!(
            node.bbox[1],
            BoundingBox::new(128 << FRACBITS, 0, 256 << FRACBITS, 128 << FRACBITS)
        );
        // One new vertex where the splitter crosses the south wall.
        assert_eq!(tree.vertices.len(), tree.map_vertex_count + 1);
    }

    #[test]
    fn test_gl_l_room_subsectors_are_closed() {
        init_logging();
        let tree = build_nodes(&l_room(), BuildOptions::gl()).unwrap();
        check_tree(&tree, true);
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.stats.minisegs, 2);

        let west = tree.subsector_segs(0);
        assert_eq!(west.len(), 5);
        assert!(west[..4].iter().all(|seg| !seg.is_miniseg()));
        assert!(west[4].is_miniseg());
        let linedefs: Vec<_> = west[..4].iter().map(|seg| seg.linedef).collect();
        assert_eq!(linedefs, vec![Some(0), Some(1), Some(2), Some(5)]);

        let area = subsector_area(&tree, 0) + subsector_area(&tree, 1);
        assert_approx_eq!(subsector_area(&tree, 0), 128.0 * 256.0, 1e-6);
        assert_approx_eq!(area, 256.0 * 128.0 + 128.0 * 128.0, 1e-6);
    }

    #[test]
    fn test_subsector_segs_sorted_by_kind() {
        init_logging();
        for options in [BuildOptions::default(), BuildOptions::gl()] {
            let tree = build_nodes(&l_room_with_inner_line(), options).unwrap();
            check_tree(&tree, options.gl_nodes);
            assert_sector_pure(&tree);
            assert_eq!(tree.nodes.len(), 1);

            let leaf_with = |linedef: u32| {
                (0..tree.subsectors.len())
                    .find(|&sub| {
                        tree.subsector_segs(sub)
                            .iter()
                            .any(|seg| seg.linedef == Some(linedef))
                    })
                    .unwrap()
            };
            let linedefs = |sub: usize| -> Vec<Option<u32>> {
                tree.subsector_segs(sub).iter().map(|seg| seg.linedef).collect()
            };

            // One-sided walls by linedef, then the inner line, then minisegs.
            let mut west = vec![Some(1), Some(2), Some(3), Some(6), Some(0)];
            let mut east = vec![Some(4), Some(5), Some(6), Some(0)];
            if options.gl_nodes {
                west.push(None);
                east.push(None);
                assert_eq!(tree.stats.minisegs, 2);
            }
            assert_eq!(linedefs(leaf_with(1)), west);
            assert_eq!(linedefs(leaf_with(4)), east);

            let inner = &tree.subsector_segs(leaf_with(1))[4];
            assert_eq!(inner.front_sector, inner.back_sector);
        }
    }

    #[test]
    fn test_two_rooms_keep_sectors_apart() {
        init_logging();
        for options in [BuildOptions::default(), BuildOptions::gl()] {
            let tree = build_nodes(&two_rooms(), options).unwrap();
            check_tree(&tree, options.gl_nodes);
            assert_sector_pure(&tree);
            assert_eq!(tree.nodes.len(), 1);
            assert_eq!(tree.stats.minisegs, 0);

            // The shared line's two segs end up in different subsectors.
            let shared: Vec<usize> = tree
                .segs
                .iter()
                .enumerate()
                .filter(|(_, seg)| seg.linedef == Some(2))
                .map(|(index, _)| index)
                .collect();
            assert_eq!(shared.len(), 2);
            assert_eq!(tree.segs[shared[0]].partner, Some(shared[1] as u32));
            let owner = |index: usize| {
                tree.subsectors
                    .iter()
                    .position(|sub| {
                        (sub.first as usize..(sub.first + sub.count) as usize).contains(&index)
                    })
                    .unwrap()
            };
            assert_ne!(owner(shared[0]), owner(shared[1]));
        }
    }

    #[test]
    fn test_gl_split_triangle_needs_no_minisegs() {
        init_logging();
        let tree = build_nodes(&split_triangle(), BuildOptions::gl()).unwrap();
        check_tree(&tree, true);
        assert_sector_pure(&tree);
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.stats.minisegs, 0);
        assert_eq!(tree.stats.splits, 0);
        for subsector in 0..2 {
            assert_eq!(tree.subsector_segs(subsector).len(), 3);
            assert_approx_eq!(subsector_area(&tree, subsector), 128.0 * 256.0 / 2.0, 1e-6);
        }
    }

    #[test]
    fn test_locate_finds_the_right_room() {
        let tree = build_nodes(&two_rooms(), BuildOptions::default()).unwrap();
        let west = tree.locate(Point2D::new(32 << FRACBITS, 64 << FRACBITS));
        let east = tree.locate(Point2D::new(200 << FRACBITS, 64 << FRACBITS));
        assert_ne!(west, east);
        assert_eq!(tree.subsector_segs(west)[0].front_sector, Some(0));
        assert_eq!(tree.subsector_segs(east)[0].front_sector, Some(1));
    }

    #[test]
    fn test_output_seg_angles() {
        let tree = build_nodes(&quad(), BuildOptions::default()).unwrap();
        let angles: Vec<u16> = tree.segs.iter().map(|seg| seg.angle).collect();
        // North, east, south, west.
        assert_eq!(angles, vec![0x4000, 0, 0xc000, 0x8000]);
    }

    #[test]
    fn test_bad_input_is_rejected() {
        assert_eq!(
            build_nodes(&Level::new(), BuildOptions::default()).unwrap_err(),
            BuildError::EmptyLevel
        );

        let options = BuildOptions {
            max_segs: 0,
            ..BuildOptions::default()
        };
        assert!(matches!(
            build_nodes(&quad(), options),
            Err(BuildError::InvalidOptions(_))
        ));

        let mut level = quad();
        level.linedefs[1].end = 99;
        assert!(matches!(
            build_nodes(&level, BuildOptions::default()),
            Err(BuildError::MalformedGeometry { line: 1, .. })
        ));
    }

    #[test]
    fn test_level_from_json() {
        let json = r#"{
            "vertices": [{"raw_x": 0, "raw_y": 0}, {"raw_x": 0, "raw_y": 64},
                         {"raw_x": 64, "raw_y": 64}, {"raw_x": 64, "raw_y": 0}],
            "linedefs": [{"start": 0, "end": 1, "right": 0, "left": null},
                         {"start": 1, "end": 2, "right": 1, "left": null},
                         {"start": 2, "end": 3, "right": 2, "left": null},
                         {"start": 3, "end": 0, "right": 3, "left": null}],
            "sidedefs": [{"sector": 0, "offset": 0}, {"sector": 0, "offset": 0},
                         {"sector": 0, "offset": 0}, {"sector": 0, "offset": 0}],
            "sector_count": 1
        }"#;
        let level: Level = serde_json::from_str(json).unwrap();
        let options: BuildOptions = serde_json::from_str(r#"{"gl_nodes": true}"#).unwrap();
        let tree = build_nodes(&level, options).unwrap();
        assert_eq!(tree.subsectors.len(), 1);
        assert_eq!(tree.segs.len(), 4);
    }

    #[test]
    fn test_poly_container_is_not_split() {
        init_logging();
        let mut level = l_room();
        let container = level.add_sector();
        // Sits right where the splitter through x = 128 would cut it.
        level.add_loop(&[(112, 32), (112, 64), (144, 64), (144, 32)], container);
        level.add_poly_spot(128, 48);

        let tree = build_nodes(&level, BuildOptions::default()).unwrap();
        assert_eq!(tree.stats.poly_containers, 1);
        check_tree(&tree, false);
        let container_lines = level.linedefs.len() - 4..level.linedefs.len();
        let pieces = tree
            .segs
            .iter()
            .filter(|seg| seg.linedef.map_or(false, |l| container_lines.contains(&(l as usize))))
            .count();
        assert_eq!(pieces, 4);
    }

    #[test]
    fn test_procedural_grids() {
        init_logging();
        for seed in 0..12 {
            let mut generator = ProceduralGenerator::new(GeneratorConfig::default(), seed);
            let level = generator.generate();

            let tree = build_nodes(&level, BuildOptions::default()).unwrap();
            check_tree(&tree, false);
            assert_sector_pure(&tree);

            let gl = build_nodes(&level, BuildOptions::gl()).unwrap();
            check_tree(&gl, true);
            assert_sector_pure(&gl);
            let area: f64 = (0..gl.subsectors.len())
                .map(|subsector| subsector_area(&gl, subsector))
                .sum();
            assert_approx_eq!(area, generator.stats().area, 1e-3);
        }
    }

    #[test]
    fn test_small_search_step_still_builds() {
        init_logging();
        let options = BuildOptions {
            max_segs: 4,
            ..BuildOptions::gl()
        };
        let level = ProceduralGenerator::new(GeneratorConfig::default(), 99).generate();
        let tree = build_nodes(&level, options).unwrap();
        check_tree(&tree, true);
    }

    #[test]
    fn test_build_levels_in_parallel() {
        init_logging();
        let levels = vec![quad(), l_room(), Level::new(), two_rooms()];
        let results = build_levels(&levels, BuildOptions::gl());
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().subsectors.len(), 1);
        assert_eq!(results[1].as_ref().unwrap().subsectors.len(), 2);
        assert_eq!(results[2].as_ref().unwrap_err(), &BuildError::EmptyLevel);
        assert_eq!(results[3].as_ref().unwrap().nodes.len(), 1);
    }
}
