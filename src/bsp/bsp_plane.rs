// src/bsp/bsp_plane.rs
//! Groups colinear segs onto shared planes. The splitter search only needs to
//! score one seg per plane, since every seg on a plane defines the same line.

use crate::bsp::bsp_seg::SegTable;
use crate::bsp::bsp_util::{point_to_angle, Line2D, PointSide, ANGLE_180};
use crate::bsp::bsp_vertex::VertexMap;

const PLANE_BUCKET_BITS: u32 = 12;

/// Gives every seg a plane and records whether the seg runs the same way as
/// it. Returns the number of distinct planes.
pub fn group_seg_planes(segs: &mut SegTable, vertices: &VertexMap, side_epsilon: f64) -> usize {
    let mut buckets: Vec<Vec<u32>> = vec![Vec::new(); 1 << PLANE_BUCKET_BITS];
    let mut planes: Vec<Line2D> = Vec::new();

    for index in 0..segs.len() as u32 {
        let (v1, v2) = segs.endpoints(index, vertices);

        // Fold opposite directions onto one half-turn.
        let mut angle = point_to_angle(v2.x.wrapping_sub(v1.x), v2.y.wrapping_sub(v1.y));
        if angle >= ANGLE_180 {
            angle = angle.wrapping_add(ANGLE_180);
        }
        let bucket = &mut buckets[(angle >> (31 - PLANE_BUCKET_BITS)) as usize];

        let found = bucket.iter().copied().find(|&plane| {
            let line = &planes[plane as usize];
            line.point_on_side(&v1, side_epsilon) == PointSide::On
                && line.point_on_side(&v2, side_epsilon) == PointSide::On
        });
        let plane = match found {
            Some(plane) => plane,
            None => {
                let plane = planes.len() as u32;
                planes.push(Line2D::from_points(v1, v2));
                bucket.push(plane);
                plane
            }
        };

        let plane_front = planes[plane as usize].same_direction(&v1, &v2);
        let seg = segs.get_mut(index);
        seg.plane = Some(plane);
        seg.plane_front = plane_front;
    }

    let count = planes.len();
    segs.set_planes(planes);
    count
}
