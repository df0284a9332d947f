// src/bsp/bsp_poly.rs
//! Polyobject containers. A container is a convex loop of walls around a
//! polyobject's start spot; its segs get a shared loop tag so the splitter
//! heuristic can refuse to cut through it.

use log::{debug, warn};

use crate::bsp::bsp_seg::SegTable;
use crate::bsp::bsp_util::{point_to_angle, to_fixed, Angle, Line2D, Point2D, PointSide, ANGLE_180};
use crate::bsp::bsp_vertex::VertexMap;
use crate::map::PolySpot;

/// Tags the wall loop around each spot. Returns the number of loops tagged.
pub fn find_poly_containers(
    spots: &[PolySpot],
    segs: &mut SegTable,
    vertices: &VertexMap,
    side_epsilon: f64,
) -> u32 {
    let mut next_tag = 1;

    for spot in spots {
        let point = match (to_fixed(spot.x), to_fixed(spot.y)) {
            (Some(x), Some(y)) => Point2D::new(x, y),
            _ => {
                warn!("Polyobject spot ({}, {}) is out of range", spot.x, spot.y);
                continue;
            }
        };

        match closest_seg_right_of(point, segs, vertices, side_epsilon) {
            Some(seg) if segs.get(seg).loop_tag.is_none() => {
                debug!(
                    "Polyobject spot ({}, {}) is inside loop {} starting at seg {}",
                    spot.x, spot.y, next_tag, seg
                );
                mark_loop(seg, next_tag, segs, vertices);
                next_tag += 1;
            }
            Some(_) => {}
            None => warn!(
                "Could not find a container for polyobject spot ({}, {})",
                spot.x, spot.y
            ),
        }
    }

    next_tag - 1
}

// Casts a ray from the spot towards +x and returns the nearest seg it hits
// from the seg's front side.
fn closest_seg_right_of(
    spot: Point2D,
    segs: &SegTable,
    vertices: &VertexMap,
    side_epsilon: f64,
) -> Option<u32> {
    let mut closest: Option<(f64, u32)> = None;

    for index in 0..segs.len() as u32 {
        let (v1, v2) = segs.endpoints(index, vertices);
        if v1.y == v2.y {
            continue;
        }
        if (v1.y < spot.y && v2.y < spot.y) || (v1.y > spot.y && v2.y > spot.y) {
            continue;
        }
        if Line2D::from_points(v1, v2).point_on_side(&spot, side_epsilon) == PointSide::Back {
            continue;
        }

        let t = (spot.y as f64 - v1.y as f64) / (v2.y as f64 - v1.y as f64);
        let sx = v1.x as f64 + t * (v2.x as f64 - v1.x as f64);
        let dist = sx - spot.x as f64;
        if dist >= 0.0 && closest.map_or(true, |(best, _)| dist < best) {
            closest = Some((dist, index));
        }
    }

    closest.map(|(_, index)| index)
}

fn seg_angle(index: u32, segs: &SegTable, vertices: &VertexMap) -> Angle {
    let (v1, v2) = segs.endpoints(index, vertices);
    point_to_angle(v2.x.wrapping_sub(v1.x), v2.y.wrapping_sub(v1.y))
}

// Walks the loop from `first`, always taking the tightest turn into a seg of
// the same sector, until it comes back to a tagged seg.
fn mark_loop(first: u32, tag: u32, segs: &mut SegTable, vertices: &VertexMap) {
    let sector = segs.get(first).front_sector;
    let mut current = first;

    loop {
        segs.get_mut(current).loop_tag = Some(tag);

        let end = segs.get(current).v2;
        let angle1 = seg_angle(current, segs, vertices);
        let mut best: Option<(Angle, u32)> = None;

        for index in 0..segs.len() as u32 {
            let candidate = segs.get(index);
            if candidate.v1 != end || candidate.front_sector != sector {
                continue;
            }
            let reversed = seg_angle(index, segs, vertices).wrapping_add(ANGLE_180);
            let diff = reversed.wrapping_sub(angle1);
            if diff > 0 && best.map_or(true, |(best_diff, _)| diff < best_diff) {
                best = Some((diff, index));
            }
        }

        match best {
            Some((_, next)) if segs.get(next).loop_tag.is_none() => current = next,
            Some(_) => break,
            None => {
                warn!("Loop {} is not closed after seg {}", tag, current);
                break;
            }
        }
    }
}
