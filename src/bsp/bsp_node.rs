// src/bsp/bsp_node.rs
//! The finished tree, laid out flat the way a level format stores it.

use serde::{Deserialize, Serialize};

use crate::bsp::bsp_util::{BoundingBox, Fixed, Point2D};
use crate::bsp::SegmentSide;

const SUBSECTOR_FLAG: u32 = 0x8000_0000;

/// A reference from a node to one of its children: another node, or a
/// subsector when the top bit is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeChild(pub u32);

impl NodeChild {
    pub fn node(index: u32) -> Self {
        debug_assert!(index & SUBSECTOR_FLAG == 0);
        NodeChild(index)
    }

    pub fn subsector(index: u32) -> Self {
        debug_assert!(index & SUBSECTOR_FLAG == 0);
        NodeChild(index | SUBSECTOR_FLAG)
    }

    pub fn is_subsector(&self) -> bool {
        self.0 & SUBSECTOR_FLAG != 0
    }

    /// Index into the node or subsector list, without the flag.
    pub fn index(&self) -> u32 {
        self.0 & !SUBSECTOR_FLAG
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub x: Fixed,
    pub y: Fixed,
    pub dx: Fixed,
    pub dy: Fixed,
    /// Front then back.
    pub bbox: [BoundingBox; 2],
    pub children: [NodeChild; 2],
}

/// A leaf still in seg-set form. Turned into a [`Subsector`] once the whole
/// tree is built, since later splits may still add pieces to its set.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DraftSubsector {
    pub set_head: u32,
}

/// A run of `count` segs starting at `first` in [`BspTree::segs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subsector {
    pub first: u32,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSeg {
    pub v1: u32,
    pub v2: u32,
    pub linedef: Option<u32>,
    pub side: SegmentSide,
    /// Direction v1→v2, a full turn being 65536.
    pub angle: u16,
    pub offset: Fixed,
    pub front_sector: Option<u32>,
    pub back_sector: Option<u32>,
    /// Index of the mirrored seg in the same list.
    pub partner: Option<u32>,
}

impl OutputSeg {
    pub fn is_miniseg(&self) -> bool {
        self.linedef.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub nodes: usize,
    pub subsectors: usize,
    pub segs: usize,
    pub minisegs: usize,
    pub splits: usize,
    /// Forced splitters used to break up leaves that were not valid.
    pub shoves: usize,
    pub poly_containers: u32,
    pub max_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BspTree {
    /// Map vertices first, then every vertex created by splits.
    pub vertices: Vec<Point2D>,
    pub map_vertex_count: usize,
    pub segs: Vec<OutputSeg>,
    pub subsectors: Vec<Subsector>,
    /// Children come before their parents, so the root is last.
    pub nodes: Vec<Node>,
    pub root: NodeChild,
    pub stats: BuildStats,
}

impl BspTree {
    pub fn subsector_segs(&self, subsector: usize) -> &[OutputSeg] {
        let sub = &self.subsectors[subsector];
        let first = sub.first as usize;
        &self.segs[first..first + sub.count as usize]
    }

    /// Walks from the root to the subsector containing the point. Points on
    /// a partition line go to the front child.
    pub fn locate(&self, point: Point2D) -> usize {
        let mut child = self.root;
        while !child.is_subsector() {
            let node = &self.nodes[child.index() as usize];
            let side = (node.y as f64 - point.y as f64) * node.dx as f64
                - (node.x as f64 - point.x as f64) * node.dy as f64;
            child = node.children[usize::from(side < 0.0)];
        }
        child.index() as usize
    }
}
