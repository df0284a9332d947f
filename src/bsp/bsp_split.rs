// src/bsp/bsp_split.rs
//! Divides a seg set along a splitter.
//!
//! Segs crossing the line are cut in two, together with their partners. When
//! building GL nodes the splitter also records every vertex it touches
//! ("events") and afterwards closes both halves with minisegs along the line.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::f64::consts::{PI, TAU};
use std::ops::Bound::Excluded;

use log::{debug, warn};

use crate::bsp::bsp_config::BuildOptions;
use crate::bsp::bsp_seg::SegTable;
use crate::bsp::bsp_select::{ForcedSeg, Splitter};
use crate::bsp::bsp_util::{Fixed, Line2D, Point2D, PointSide};
use crate::bsp::bsp_vertex::VertexMap;
use crate::bsp::SegPosition;

// Directions closer than this (radians) to the ray count as lying along it.
const RAY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SplitResult {
    pub front: Option<u32>,
    pub back: Option<u32>,
    pub front_count: usize,
    pub back_count: usize,
    /// Segs cut in two (partners not counted).
    pub splits: usize,
    pub minisegs: usize,
}

impl SplitResult {
    fn push_front(&mut self, segs: &mut SegTable, index: u32) {
        segs.get_mut(index).next = self.front;
        self.front = Some(index);
        self.front_count += 1;
    }

    fn push_back(&mut self, segs: &mut SegTable, index: u32) {
        segs.get_mut(index).next = self.back;
        self.back = Some(index);
        self.back_count += 1;
    }
}

pub struct SegSplitter {
    options: BuildOptions,
    // Vertices on the splitter, keyed by distance along it.
    events: BTreeMap<i128, u32>,
    // Segs of the set lying on the splitter.
    sharers: Vec<u32>,
    // Event intervals a seg already runs along.
    covered: HashSet<(i128, i128)>,
}

impl SegSplitter {
    pub fn new(options: BuildOptions) -> Self {
        SegSplitter {
            options,
            events: BTreeMap::new(),
            sharers: Vec::new(),
            covered: HashSet::new(),
        }
    }

    pub fn split_segs(
        &mut self,
        segs: &mut SegTable,
        vertices: &mut VertexMap,
        set: u32,
        splitter: &Splitter,
    ) -> SplitResult {
        self.events.clear();
        self.sharers.clear();
        self.covered.clear();

        let gl_nodes = self.options.gl_nodes;
        let line = splitter.line;
        let forced = splitter.forced.map(|forced| forced.seg);
        let mut result = SplitResult::default();

        let mut current = Some(set);
        while let Some(index) = current {
            current = segs.get(index).next;
            let (v1, v2) = segs.endpoints(index, vertices);

            let (position, sides) = if forced == Some(index) {
                (SegPosition::Back, [PointSide::On; 2])
            } else {
                line.classify(&v1, &v2, self.options.side_epsilon)
            };

            match position {
                SegPosition::Front => result.push_front(segs, index),
                SegPosition::Back => result.push_back(segs, index),
                SegPosition::Spanning => {
                    let vertex = Self::cut_point(segs, vertices, index, &line, v1, v2);
                    let piece =
                        segs.split_pair(index, vertex, sides[0] == PointSide::Back, vertices);
                    result.push_front(segs, piece);
                    result.push_back(segs, index);
                    result.splits += 1;

                    if gl_nodes {
                        self.add_event(&line, vertex, vertices);
                    }
                }
            }

            if gl_nodes && position != SegPosition::Spanning {
                let seg = segs.get(index);
                let (start, end) = (seg.v1, seg.v2);
                if sides[0] == PointSide::On {
                    self.add_event(&line, start, vertices);
                    if sides[1] == PointSide::On {
                        self.add_event(&line, end, vertices);
                        self.sharers.push(index);
                    }
                } else if sides[1] == PointSide::On {
                    self.add_event(&line, end, vertices);
                }
            }

            if gl_nodes && forced == Some(index) {
                if let Some(forced) = splitter.forced {
                    Self::close_forced_seg(segs, forced, &mut result);
                }
            }
        }

        if gl_nodes {
            self.fix_split_sharers(segs, vertices, &line);
            self.add_minisegs(segs, vertices, splitter, &mut result);
        }

        debug!(
            "Split set {} into {} front / {} back segs ({} cut, {} minisegs)",
            set, result.front_count, result.back_count, result.splits, result.minisegs
        );
        result
    }

    // Interns the point where `line` crosses the seg.
    fn cut_point(
        segs: &SegTable,
        vertices: &mut VertexMap,
        index: u32,
        line: &Line2D,
        v1: Point2D,
        v2: Point2D,
    ) -> u32 {
        let seg = segs.get(index);
        if let Some(tag) = seg.loop_tag {
            warn!(
                "Splitting seg {} ({}, {})-({}, {}) of protected loop {} on line {:?}",
                index,
                v1.x >> 16,
                v1.y >> 16,
                v2.x >> 16,
                v2.y >> 16,
                tag,
                seg.linedef
            );
        }

        let frac = line.intercept(&v1, &v2);
        let cut = Point2D::new(
            v1.x + (frac * (v2.x as f64 - v1.x as f64)) as Fixed,
            v1.y + (frac * (v2.y as f64 - v1.y as f64)) as Fixed,
        );
        let vertex = vertices.intern(cut);
        if vertex == seg.v1 || vertex == seg.v2 {
            warn!("Cut point of seg {} snapped to one of its endpoints", index);
        }
        vertex
    }

    fn add_event(&mut self, line: &Line2D, vertex: u32, vertices: &VertexMap) -> i128 {
        let key = line.distance_along(&vertices.point(vertex));
        self.events.entry(key).or_insert(vertex);
        key
    }

    // The forced seg sits alone behind the splitter. Give it a reversed
    // miniseg so the back subsector has two sides, and put either a copy of
    // it or its mate in front as that miniseg's partner.
    fn close_forced_seg(segs: &mut SegTable, forced: ForcedSeg, result: &mut SplitResult) {
        let shoved = segs.get(forced.seg);
        let (v1, v2, sector) = (shoved.v1, shoved.v2, shoved.front_sector);

        let back = segs.add_miniseg(v2, v1, None, true, sector);
        let front = match forced.mate {
            Some(mate) => {
                if let Some(old) = segs.get(mate).partner {
                    segs.get_mut(old).partner = None;
                }
                mate
            }
            None => {
                let front = segs.add_miniseg(v1, v2, None, true, sector);
                result.push_front(segs, front);
                result.minisegs += 1;
                front
            }
        };
        segs.pair(front, back);
        result.push_back(segs, back);
        result.minisegs += 1;
    }

    // Cuts every seg lying on the splitter at each event strictly inside it,
    // so that the seg pieces line up with the event intervals.
    fn fix_split_sharers(&mut self, segs: &mut SegTable, vertices: &VertexMap, line: &Line2D) {
        for &sharer in &self.sharers {
            let key = |vertex: u32| line.distance_along(&vertices.point(vertex));
            let start = key(segs.get(sharer).v1);
            let end = key(segs.get(sharer).v2);
            if start == end {
                continue;
            }

            let cuts: Vec<u32> = if start < end {
                self.events
                    .range((Excluded(start), Excluded(end)))
                    .map(|(_, &vertex)| vertex)
                    .collect()
            } else {
                self.events
                    .range((Excluded(end), Excluded(start)))
                    .rev()
                    .map(|(_, &vertex)| vertex)
                    .collect()
            };

            let mut piece = sharer;
            let mut pieces = vec![piece];
            for vertex in cuts {
                let seg = segs.get(piece);
                if vertex == seg.v1 || vertex == seg.v2 {
                    continue;
                }
                piece = segs.split_pair(piece, vertex, true, vertices);
                pieces.push(piece);
            }

            for piece in pieces {
                let seg = segs.get(piece);
                let (a, b) = (key(seg.v1), key(seg.v2));
                self.covered.insert((a.min(b), a.max(b)));
            }
        }
    }

    // Walks the events in order along the splitter, tracking whether the
    // stretch of line after each one is inside the map, and adds a miniseg
    // pair across every inside stretch no seg covers.
    fn add_minisegs(
        &mut self,
        segs: &mut SegTable,
        vertices: &VertexMap,
        splitter: &Splitter,
        result: &mut SplitResult,
    ) {
        if self.events.len() < 2 {
            return;
        }

        let mut incident: HashMap<u32, Vec<u32>> = self
            .events
            .values()
            .map(|&vertex| (vertex, Vec::new()))
            .collect();
        for index in segs.set_iter(result.front).chain(segs.set_iter(result.back)) {
            let seg = segs.get(index);
            for vertex in [seg.v1, seg.v2] {
                if let Some(list) = incident.get_mut(&vertex) {
                    list.push(index);
                }
            }
        }

        let line = splitter.line;
        let forward = (line.dy as f64).atan2(line.dx as f64);
        let backward = forward + PI;
        // Planeless segs always count as running along their own line.
        let back_plane_front = splitter.plane.is_none();

        let events: Vec<(i128, u32)> = self.events.iter().map(|(&k, &v)| (k, v)).collect();
        let mut inside = false;
        let mut sector = None;
        let mut previous: Option<(i128, u32)> = None;

        for (key, vertex) in events {
            let around = incident.get(&vertex).map(Vec::as_slice).unwrap_or(&[]);

            if let Some((prev_key, prev_vertex)) = previous {
                let arriving_inside = ray_status(segs, vertices, vertex, around, backward)
                    .map_or(true, |(is_inside, _)| is_inside);
                if inside && arriving_inside && !self.covered.contains(&(prev_key, key)) {
                    let front = segs.add_miniseg(prev_vertex, vertex, splitter.plane, true, sector);
                    let back = segs.add_miniseg(
                        vertex,
                        prev_vertex,
                        splitter.plane,
                        back_plane_front,
                        sector,
                    );
                    segs.pair(front, back);
                    result.push_front(segs, front);
                    result.push_back(segs, back);
                    result.minisegs += 2;
                }
            }

            if let Some((is_inside, found)) = ray_status(segs, vertices, vertex, around, forward) {
                inside = is_inside;
                sector = found;
            }
            previous = Some((key, vertex));
        }
    }
}

// Turns counterclockwise from `direction` to the first seg leaving or
// entering `vertex`. Segs keep the map on their right, so the ray is inside
// exactly when that first seg leaves the vertex. Returns `None` when no seg
// touches the vertex, along with the sector of the seg found otherwise.
fn ray_status(
    segs: &SegTable,
    vertices: &VertexMap,
    vertex: u32,
    around: &[u32],
    direction: f64,
) -> Option<(bool, Option<u32>)> {
    let origin = vertices.point(vertex);
    let mut best: Option<(f64, bool, Option<u32>)> = None;

    for &index in around {
        let seg = segs.get(index);
        let (outgoing, other) = if seg.v1 == vertex {
            (true, seg.v2)
        } else {
            (false, seg.v1)
        };
        let towards = vertices.point(other);
        let angle = (towards.y as f64 - origin.y as f64).atan2(towards.x as f64 - origin.x as f64);

        let mut turn = (angle - direction).rem_euclid(TAU);
        if turn < RAY_TOLERANCE || turn > TAU - RAY_TOLERANCE {
            turn = TAU;
        }

        best = match best {
            Some((best_turn, _, _)) if turn < best_turn => Some((turn, outgoing, seg.front_sector)),
            Some((best_turn, false, _)) if turn == best_turn && outgoing => {
                Some((turn, true, seg.front_sector))
            }
            None => Some((turn, outgoing, seg.front_sector)),
            kept => kept,
        };
    }

    best.map(|(_, outgoing, sector)| (outgoing, sector))
}
