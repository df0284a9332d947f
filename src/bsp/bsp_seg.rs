// src/bsp/bsp_seg.rs
//! The seg arena. All segs of a build live in one `Vec`; a working set is a
//! chain through `Seg::next`, so moving a seg between sets never copies it and
//! partner indices stay valid for the whole build.

use crate::bsp::bsp_util::{Fixed, Line2D, Point2D, FRACUNIT};
use crate::bsp::bsp_vertex::VertexMap;
use crate::bsp::SegmentSide;
use crate::error::{BuildError, MalformedReason};
use crate::map::Level;

#[derive(Debug, Clone, PartialEq)]
pub struct Seg {
    pub v1: u32,
    pub v2: u32,
    pub linedef: Option<u32>, // None for minisegs
    pub side: SegmentSide,
    pub front_sector: Option<u32>,
    pub back_sector: Option<u32>,
    pub partner: Option<u32>,
    pub offset: Fixed,
    pub plane: Option<u32>,
    pub plane_front: bool,
    pub loop_tag: Option<u32>,
    pub next: Option<u32>,
}

impl Seg {
    pub fn is_miniseg(&self) -> bool {
        self.linedef.is_none()
    }

    /// A real seg with the same sector on both sides.
    pub fn is_special(&self) -> bool {
        self.front_sector == self.back_sector
    }
}

#[derive(Debug, Default)]
pub struct SegTable {
    segs: Vec<Seg>,
    planes: Vec<Line2D>,
}

impl SegTable {
    /// One seg per side of every line, front side first. Segs of a two-sided
    /// line are partners. The returned table holds a single set with every seg
    /// in creation order, starting at index 0.
    pub fn from_level(level: &Level, vertex_ids: &[Option<u32>]) -> Result<SegTable, BuildError> {
        let mut segs: Vec<Seg> = Vec::with_capacity(level.linedefs.len() * 2);

        for (line, linedef) in level.linedefs.iter().enumerate() {
            let malformed = |reason| BuildError::MalformedGeometry { line, reason };
            let v1 = vertex_ids
                .get(linedef.start)
                .copied()
                .flatten()
                .ok_or_else(|| malformed(MalformedReason::BadVertex(linedef.start)))?;
            let v2 = vertex_ids
                .get(linedef.end)
                .copied()
                .flatten()
                .ok_or_else(|| malformed(MalformedReason::BadVertex(linedef.end)))?;

            if v1 == v2 {
                return Err(malformed(MalformedReason::ZeroLength));
            }
            if linedef.right.is_none() && linedef.left.is_none() {
                return Err(malformed(MalformedReason::NoSides));
            }
            if linedef.right.is_some() && linedef.right == linedef.left {
                return Err(malformed(MalformedReason::SharedSidedef));
            }

            let right = linedef
                .right
                .map(|side| Self::side_info(level, side))
                .transpose()
                .map_err(malformed)?;
            let left = linedef
                .left
                .map(|side| Self::side_info(level, side))
                .transpose()
                .map_err(malformed)?;

            let front_sector = right.map(|(sector, _)| sector);
            let back_sector = left.map(|(sector, _)| sector);

            let mut front_index = None;
            if let Some((sector, offset)) = right {
                front_index = Some(segs.len() as u32);
                segs.push(Seg {
                    v1,
                    v2,
                    linedef: Some(line as u32),
                    side: SegmentSide::Front,
                    front_sector: Some(sector),
                    back_sector,
                    partner: None,
                    offset,
                    plane: None,
                    plane_front: true,
                    loop_tag: None,
                    next: None,
                });
            }
            if let Some((sector, offset)) = left {
                let back_index = segs.len() as u32;
                segs.push(Seg {
                    v1: v2,
                    v2: v1,
                    linedef: Some(line as u32),
                    side: SegmentSide::Back,
                    front_sector: Some(sector),
                    back_sector: front_sector,
                    partner: front_index,
                    offset,
                    plane: None,
                    plane_front: true,
                    loop_tag: None,
                    next: None,
                });
                if let Some(front) = front_index {
                    segs[front as usize].partner = Some(back_index);
                }
            }
        }

        if segs.is_empty() {
            return Err(BuildError::EmptyLevel);
        }

        let count = segs.len();
        for (index, seg) in segs.iter_mut().enumerate() {
            seg.next = if index + 1 < count {
                Some(index as u32 + 1)
            } else {
                None
            };
        }

        Ok(SegTable {
            segs,
            planes: Vec::new(),
        })
    }

    // Sector and starting offset of a sidedef.
    fn side_info(level: &Level, side: usize) -> Result<(u32, Fixed), MalformedReason> {
        let sidedef = level
            .sidedefs
            .get(side)
            .ok_or(MalformedReason::BadSidedef(side))?;
        if sidedef.sector >= level.sector_count {
            return Err(MalformedReason::BadSector(sidedef.sector));
        }
        Ok((
            sidedef.sector as u32,
            sidedef.offset.saturating_mul(FRACUNIT),
        ))
    }

    pub fn len(&self) -> usize {
        self.segs.len()
    }

    pub fn get(&self, index: u32) -> &Seg {
        &self.segs[index as usize]
    }

    pub fn get_mut(&mut self, index: u32) -> &mut Seg {
        &mut self.segs[index as usize]
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = &Seg> {
        self.segs.iter()
    }

    /// Indices of the set starting at `head`, in chain order.
    pub fn set_iter(&self, head: Option<u32>) -> impl Iterator<Item = u32> + '_ {
        std::iter::successors(head, move |&index| self.segs[index as usize].next)
    }

    #[cfg(test)]
    pub fn set_len(&self, head: Option<u32>) -> usize {
        self.set_iter(head).count()
    }

    pub fn endpoints(&self, index: u32, vertices: &VertexMap) -> (Point2D, Point2D) {
        let seg = self.get(index);
        (vertices.point(seg.v1), vertices.point(seg.v2))
    }

    pub fn set_planes(&mut self, planes: Vec<Line2D>) {
        self.planes = planes;
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// The line a seg defines as a splitter: its plane if it has one,
    /// otherwise the seg itself.
    pub fn seg_line(&self, index: u32, vertices: &VertexMap) -> Line2D {
        match self.get(index).plane {
            Some(plane) => self.planes[plane as usize],
            None => {
                let (v1, v2) = self.endpoints(index, vertices);
                Line2D::from_points(v1, v2)
            }
        }
    }

    pub fn push(&mut self, seg: Seg) -> u32 {
        self.segs.push(seg);
        self.segs.len() as u32 - 1
    }

    // Cuts `index` at `vertex`. The old seg keeps the piece on `v1`'s side when
    // `v1_in_back` is set and the piece on `v2`'s side otherwise; the other
    // piece is appended and its index returned. It is not linked into any set.
    fn split_seg(&mut self, index: u32, vertex: u32, v1_in_back: bool, vertices: &VertexMap) -> u32 {
        let mut piece = self.get(index).clone();
        let start = vertices.point(piece.v1);
        let cut = vertices.point(vertex);
        let along = start.distance_to(&cut) as Fixed;

        let old = self.get_mut(index);
        if v1_in_back {
            piece.v1 = vertex;
            piece.offset = piece.offset.saturating_add(along);
            old.v2 = vertex;
        } else {
            piece.v2 = vertex;
            old.v1 = vertex;
            old.offset = old.offset.saturating_add(along);
        }
        piece.next = None;
        self.push(piece)
    }

    /// Splits a seg and its partner at `vertex`. The new piece of each is
    /// linked right after its original, so both stay in whatever set they are
    /// in. Old halves stay paired with each other, as do the new ones.
    /// Returns the index of the seg's new piece.
    pub fn split_pair(&mut self, index: u32, vertex: u32, v1_in_back: bool, vertices: &VertexMap) -> u32 {
        let piece = self.split_seg(index, vertex, v1_in_back, vertices);
        let next = self.get(index).next;
        self.get_mut(piece).next = next;
        self.get_mut(index).next = Some(piece);

        if let Some(partner) = self.get(index).partner {
            // The partner runs the other way, so its v1 is on the opposite side.
            let partner_piece = self.split_seg(partner, vertex, !v1_in_back, vertices);
            let next = self.get(partner).next;
            self.get_mut(partner_piece).next = next;
            self.get_mut(partner).next = Some(partner_piece);
            self.pair(piece, partner_piece);

            debug_assert!(self.mirrored(index, partner));
            debug_assert!(self.mirrored(piece, partner_piece));
        }
        piece
    }

    pub fn pair(&mut self, a: u32, b: u32) {
        self.get_mut(a).partner = Some(b);
        self.get_mut(b).partner = Some(a);
    }

    /// True if `a` and `b` trace the same two vertices in opposite directions.
    pub fn mirrored(&self, a: u32, b: u32) -> bool {
        let (a, b) = (self.get(a), self.get(b));
        a.v1 == b.v2 && a.v2 == b.v1
    }

    pub fn add_miniseg(
        &mut self,
        v1: u32,
        v2: u32,
        plane: Option<u32>,
        plane_front: bool,
        sector: Option<u32>,
    ) -> u32 {
        self.push(Seg {
            v1,
            v2,
            linedef: None,
            side: SegmentSide::Front,
            front_sector: sector,
            back_sector: sector,
            partner: None,
            offset: 0,
            plane,
            plane_front,
            loop_tag: None,
            next: None,
        })
    }
}
