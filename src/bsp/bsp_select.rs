// src/bsp/bsp_select.rs
//! Splitter selection.
//!
//! Candidates are taken from the segs of the set being divided, one per
//! plane, and scored by [`SplitterSelector::heuristic`]. When nothing divides
//! the set, [`SplitterSelector::check_subsector`] decides whether it can stand
//! as a subsector or needs a seg shoved behind a synthesized splitter.

use log::{debug, trace, warn};

use crate::bsp::bsp_config::BuildOptions;
use crate::bsp::bsp_seg::SegTable;
use crate::bsp::bsp_util::{Line2D, PointSide};
use crate::bsp::bsp_vertex::VertexMap;
use crate::bsp::SegPosition;

/// A seg that must end up behind its splitter regardless of geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForcedSeg {
    pub seg: u32,
    /// Seg that takes the forced seg's place in front (GL nodes only).
    pub mate: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splitter {
    pub line: Line2D,
    /// The seg the line was taken from.
    pub seg: u32,
    /// Plane given to minisegs created along this splitter.
    pub plane: Option<u32>,
    pub forced: Option<ForcedSeg>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitterChoice {
    Found(Splitter),
    /// No candidate divides the set.
    NoneConvex,
    /// Some candidates would divide the set, but each one cuts something it
    /// must not.
    NoneButUnsplittable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LeafVerdict {
    Yes,
    No(Splitter),
}

pub struct SplitterSelector {
    options: BuildOptions,
    plane_checked: Vec<bool>,
    touched: Vec<u32>,
    colinear: Vec<u32>,
}

impl SplitterSelector {
    pub fn new(options: BuildOptions) -> Self {
        SplitterSelector {
            options,
            plane_checked: Vec::new(),
            touched: Vec::new(),
            colinear: Vec::new(),
        }
    }

    /// Scores every `step`-th seg of the set whose plane has not been scored
    /// yet this pass. Ties go to the earliest candidate.
    pub fn select_splitter(
        &mut self,
        segs: &SegTable,
        vertices: &VertexMap,
        set: u32,
        step: usize,
        honor_no_split: bool,
    ) -> SplitterChoice {
        self.plane_checked.clear();
        self.plane_checked.resize(segs.plane_count(), false);

        let mut step_left: isize = 0;
        let mut best: Option<(i32, u32)> = None;
        let mut unsplittable = false;

        for index in segs.set_iter(Some(set)) {
            step_left -= 1;
            if step_left > 0 {
                continue;
            }
            if let Some(plane) = segs.get(index).plane {
                if self.plane_checked[plane as usize] {
                    continue;
                }
                self.plane_checked[plane as usize] = true;
            }
            step_left = step as isize;

            let line = segs.seg_line(index, vertices);
            let score = self.heuristic(segs, vertices, &line, set, honor_no_split, None);
            trace!("Seg {} scores {} as a splitter for set {}", index, score, set);

            if score > best.map_or(0, |(best_score, _)| best_score) {
                best = Some((score, index));
            } else if score < 0 {
                unsplittable = true;
            }
        }

        match best {
            Some((score, index)) => {
                debug!(
                    "Split set {} on seg {} (score {}, step {}, honor no-split {})",
                    set, index, score, step, honor_no_split
                );
                SplitterChoice::Found(Splitter {
                    line: segs.seg_line(index, vertices),
                    seg: index,
                    plane: segs.get(index).plane,
                    forced: None,
                })
            }
            None if unsplittable => SplitterChoice::NoneButUnsplittable,
            None => SplitterChoice::NoneConvex,
        }
    }

    /// Scores `line` as a splitter for the set. Higher is better, `0` means
    /// it leaves one side empty and `-1` means it must not be used.
    pub fn heuristic(
        &mut self,
        segs: &SegTable,
        vertices: &VertexMap,
        line: &Line2D,
        set: u32,
        honor_no_split: bool,
        forced: Option<u32>,
    ) -> i32 {
        // Start well above zero so near-vertex penalties rarely push a usable
        // splitter negative.
        let mut score: i32 = 1_000_000;
        let mut segs_in_set: i32 = 0;
        let mut counts = [0i32; 2];
        let mut real_segs = [0i32; 2];
        let mut special_segs = [0i32; 2];
        let mut splits_protected = false;

        self.touched.clear();
        self.colinear.clear();

        for index in segs.set_iter(Some(set)) {
            let seg = segs.get(index);
            let (v1, v2) = segs.endpoints(index, vertices);
            segs_in_set += 1;

            let (position, sides) = if forced == Some(index) {
                (SegPosition::Back, [PointSide::On; 2])
            } else {
                line.classify(&v1, &v2, self.options.side_epsilon)
            };

            match position {
                SegPosition::Front | SegPosition::Back => {
                    let side = usize::from(position == SegPosition::Back);

                    // A protected seg touching the splitter is only fine if
                    // the splitter also runs along a seg of the same loop.
                    if let Some(tag) = seg.loop_tag {
                        if honor_no_split && sides.contains(&PointSide::On) {
                            let list = if sides == [PointSide::On; 2] {
                                &mut self.colinear
                            } else {
                                &mut self.touched
                            };
                            if !list.contains(&tag) {
                                list.push(tag);
                            }
                        }
                    }

                    counts[side] += 1;
                    if seg.is_miniseg() {
                        score += self.options.split_cost / 4;
                    } else {
                        real_segs[side] += 1;
                        if seg.is_special() {
                            special_segs[side] += 1;
                        }
                        score += self.options.split_cost;
                    }
                }
                SegPosition::Spanning => {
                    if seg.loop_tag.is_some() {
                        if honor_no_split {
                            trace!("Splitter cuts protected seg {}", index);
                            return -1;
                        }
                        splits_protected = true;
                    }

                    // A cut that would snap onto an endpoint leaves a
                    // zero-length piece, however long the seg is.
                    let mut frac = line.intercept(&v1, &v2);
                    let x = v1.x as f64 + frac * (v2.x as f64 - v1.x as f64);
                    let y = v1.y as f64 + frac * (v2.y as f64 - v1.y as f64);
                    let near = (self.options.vertex_epsilon + 1) as f64;
                    if (x - v1.x as f64).abs() < near && (y - v1.y as f64).abs() < near {
                        trace!("Splitter lands on the start of seg {}", index);
                        return -1;
                    }
                    if (x - v2.x as f64).abs() < near && (y - v2.y as f64).abs() < near {
                        trace!("Splitter lands on the end of seg {}", index);
                        return -1;
                    }
                    if frac < 0.001 || frac > 0.999 {
                        if frac > 0.999 {
                            frac = 1.0 - frac;
                        }
                        let penalty = (1.0 / frac) as i32;
                        score = score.saturating_sub(penalty).max(1);
                    }

                    counts[0] += 1;
                    counts[1] += 1;
                    if !seg.is_miniseg() {
                        real_segs[0] += 1;
                        real_segs[1] += 1;
                        if seg.is_special() {
                            special_segs[0] += 1;
                            special_segs[1] += 1;
                        }
                    }
                }
            }
        }

        if counts[0] == 0 || counts[1] == 0 {
            return 0;
        }

        // Each side needs a real seg to tell which sector it is in.
        if real_segs[0] == 0 || real_segs[1] == 0 {
            return -1;
        }

        if honor_no_split
            && (special_segs[0] == real_segs[0] || special_segs[1] == real_segs[1])
        {
            return -1;
        }

        if self.colinear.is_empty() && !self.touched.is_empty() {
            return -1;
        }
        if self.touched.iter().any(|tag| !self.colinear.contains(tag)) {
            return -1;
        }

        if line.is_axis_aligned() {
            if splits_protected {
                score += segs_in_set * 8;
            } else {
                score += segs_in_set / self.options.aa_preference;
            }
        }

        score + (counts[0] + counts[1]) - (counts[0] - counts[1]).abs()
    }

    /// Decides whether a set no splitter divides can be a subsector. Real segs
    /// must all face the same sector; in GL mode no two may share both
    /// vertices either. Otherwise one seg is shoved behind a splitter.
    pub fn check_subsector(&mut self, segs: &SegTable, vertices: &VertexMap, set: u32) -> LeafVerdict {
        let mut sector = None;
        let mut offender = None;

        for index in segs.set_iter(Some(set)) {
            let seg = segs.get(index);
            if seg.is_miniseg() {
                continue;
            }
            if sector.is_none() {
                sector = seg.front_sector;
            } else if seg.front_sector != sector {
                offender = Some(index);
                break;
            }
        }

        match offender {
            Some(seg) => {
                debug!("Set {} mixes sectors; shoving seg {} behind", set, seg);
                self.shove_seg_behind(segs, vertices, set, seg, None)
            }
            None if self.options.gl_nodes => self.check_overlapping_segs(segs, vertices, set),
            None => LeafVerdict::Yes,
        }
    }

    fn check_overlapping_segs(&mut self, segs: &SegTable, vertices: &VertexMap, set: u32) -> LeafVerdict {
        for first in segs.set_iter(Some(set)) {
            let seg = segs.get(first);
            if seg.is_miniseg() {
                continue;
            }
            let twin = segs.set_iter(seg.next).find(|&other| {
                let other = segs.get(other);
                other.v1 == seg.v1 && other.v2 == seg.v2
            });

            if let Some(second) = twin {
                // Never shove a miniseg into a subsector of its own.
                let (shoved, mate) = if segs.get(second).is_miniseg() {
                    (first, second)
                } else {
                    (second, first)
                };
                debug!("Segs {} and {} overlap in set {}", shoved, mate, set);
                return self.shove_seg_behind(segs, vertices, set, shoved, Some(mate));
            }
        }
        LeafVerdict::Yes
    }

    /// Builds a splitter along `seg` that puts the seg alone behind it. The
    /// rest of the set is convex, so everything else lands in front.
    pub fn shove_seg_behind(
        &mut self,
        segs: &SegTable,
        vertices: &VertexMap,
        set: u32,
        seg: u32,
        mate: Option<u32>,
    ) -> LeafVerdict {
        let mut line = segs.seg_line(seg, vertices);
        if !segs.get(seg).plane_front {
            line = line.flipped();
        }

        if self.heuristic(segs, vertices, &line, set, false, Some(seg)) > 0 {
            LeafVerdict::No(Splitter {
                line,
                seg,
                plane: None,
                forced: Some(ForcedSeg { seg, mate }),
            })
        } else {
            warn!(
                "Could not shove seg {} out of set {}; keeping it as a subsector",
                seg, set
            );
            LeafVerdict::Yes
        }
    }
}
