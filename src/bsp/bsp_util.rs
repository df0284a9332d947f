// src/bsp/bsp_util.rs
//! Geometry helpers shared by the node builder. All coordinates are 16.16
//! fixed point; anything that needs more precision goes through f64 or i128.

use serde::{Deserialize, Serialize};

use crate::bsp::SegPosition;

pub type Fixed = i32;

pub const FRACBITS: i32 = 16;
pub const FRACUNIT: Fixed = 1 << FRACBITS;

/// Binary angle (BAM): a full turn is 2^32.
pub type Angle = u32;
pub const ANGLE_180: Angle = 1 << 31;

// Below this magnitude the cheap sign test is not trusted and the real
// distance is computed.
const FAR_ENOUGH: f64 = 17179869184.0;

pub fn to_fixed(map_units: i32) -> Option<Fixed> {
    map_units.checked_mul(FRACUNIT)
}

/// BAM angle of the vector (dx, dy).
pub fn point_to_angle(dx: Fixed, dy: Fixed) -> Angle {
    let radians = (dy as f64).atan2(dx as f64);
    (radians * (ANGLE_180 as f64 / std::f64::consts::PI)).round() as i64 as Angle
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point2D {
    pub x: Fixed,
    pub y: Fixed,
}

impl Point2D {
    pub fn new(x: Fixed, y: Fixed) -> Self {
        Point2D { x, y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = other.x as f64 - self.x as f64;
        let dy = other.y as f64 - self.y as f64;
        dx.hypot(dy)
    }
}

/// Where a single point lies relative to a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointSide {
    Front,
    On,
    Back,
}

/// An infinite line through (x, y) running along (dx, dy). Front is the
/// right-hand side, the same side a linedef's front sidedef faces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line2D {
    pub x: Fixed,
    pub y: Fixed,
    pub dx: Fixed,
    pub dy: Fixed,
}

impl Line2D {
    pub fn new(x: Fixed, y: Fixed, dx: Fixed, dy: Fixed) -> Self {
        Line2D { x, y, dx, dy }
    }

    pub fn from_points(start: Point2D, end: Point2D) -> Self {
        Line2D::new(
            start.x,
            start.y,
            end.x - start.x,
            end.y - start.y,
        )
    }

    pub fn is_axis_aligned(&self) -> bool {
        self.dx == 0 || self.dy == 0
    }

    /// The same line running the other way.
    pub fn flipped(&self) -> Self {
        Line2D::new(self.x + self.dx, self.y + self.dy, -self.dx, -self.dy)
    }

    // Twice the signed area of (start, start+d, point); positive is front.
    fn side_numerator(&self, point: &Point2D) -> f64 {
        (self.y as f64 - point.y as f64) * self.dx as f64
            - (self.x as f64 - point.x as f64) * self.dy as f64
    }

    fn side_from_numerator(&self, s_num: f64, side_epsilon: f64) -> PointSide {
        if s_num.abs() < FAR_ENOUGH {
            let l = self.dx as f64 * self.dx as f64 + self.dy as f64 * self.dy as f64;
            if s_num * s_num / l < side_epsilon * side_epsilon {
                return PointSide::On;
            }
        }
        if s_num > 0.0 {
            PointSide::Front
        } else {
            PointSide::Back
        }
    }

    pub fn point_on_side(&self, point: &Point2D, side_epsilon: f64) -> PointSide {
        self.side_from_numerator(self.side_numerator(point), side_epsilon)
    }

    /// True if travelling v1→v2 goes the same way as the line.
    pub fn same_direction(&self, v1: &Point2D, v2: &Point2D) -> bool {
        if self.dx != 0 {
            (self.dx > 0 && v2.x > v1.x) || (self.dx < 0 && v2.x < v1.x)
        } else {
            (self.dy > 0 && v2.y > v1.y) || (self.dy < 0 && v2.y < v1.y)
        }
    }

    /// Classifies the segment v1→v2. Segments lying on the line go to the
    /// front when they run the same way as the line, else to the back.
    pub fn classify(
        &self,
        v1: &Point2D,
        v2: &Point2D,
        side_epsilon: f64,
    ) -> (SegPosition, [PointSide; 2]) {
        let sides = [
            self.point_on_side(v1, side_epsilon),
            self.point_on_side(v2, side_epsilon),
        ];
        let position = match sides {
            [PointSide::On, PointSide::On] => {
                if self.same_direction(v1, v2) {
                    SegPosition::Front
                } else {
                    SegPosition::Back
                }
            }
            [a, b] if a != PointSide::Back && b != PointSide::Back => SegPosition::Front,
            [a, b] if a != PointSide::Front && b != PointSide::Front => SegPosition::Back,
            _ => SegPosition::Spanning,
        };
        (position, sides)
    }

    /// Fraction along v1→v2 where the segment meets this line. Parallel
    /// segments report 0.
    pub fn intercept(&self, v1: &Point2D, v2: &Point2D) -> f64 {
        let v2x = v1.x as f64;
        let v2y = v1.y as f64;
        let v2dx = v2.x as f64 - v2x;
        let v2dy = v2.y as f64 - v2y;
        let v1dx = self.dx as f64;
        let v1dy = self.dy as f64;

        let den = v1dy * v2dx - v1dx * v2dy;
        if den == 0.0 {
            return 0.0;
        }

        let num = (self.x as f64 - v2x) * v1dy + (v2y - self.y as f64) * v1dx;
        num / den
    }

    /// Unnormalised distance of a point's projection along the line. Only
    /// the ordering matters, so no square root is taken.
    pub fn distance_along(&self, point: &Point2D) -> i128 {
        (point.x as i128 - self.x as i128) * self.dx as i128
            + (point.y as i128 - self.y as i128) * self.dy as i128
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: Fixed,
    pub min_y: Fixed,
    pub max_x: Fixed,
    pub max_y: Fixed,
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::new_empty()
    }
}

impl BoundingBox {
    pub fn new_empty() -> Self {
        BoundingBox {
            min_x: Fixed::MAX,
            min_y: Fixed::MAX,
            max_x: Fixed::MIN,
            max_y: Fixed::MIN,
        }
    }

    pub fn new(min_x: Fixed, min_y: Fixed, max_x: Fixed, max_y: Fixed) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn expand_point(&mut self, x: Fixed, y: Fixed) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn combine(&mut self, other: &BoundingBox) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    pub fn union(a: &BoundingBox, b: &BoundingBox) -> BoundingBox {
        let mut bbox = *a;
        bbox.combine(b);
        bbox
    }

    /// True if the difference between any two points inside the box fits
    /// into a `Fixed`.
    pub fn fits_fixed_deltas(&self) -> bool {
        let max = Fixed::MAX as i64;
        self.max_x as i64 - self.min_x as i64 <= max
            && self.max_y as i64 - self.min_y as i64 <= max
    }
}
