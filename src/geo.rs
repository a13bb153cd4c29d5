//! Page geometry shared by every object on a page.
//!
//! Coordinates are page-relative and carried as `f64`. Orientation tests go
//! through the `geo` crate's robust kernel so that collinear triples are
//! reported exactly rather than as tiny signed areas.

use ::geo::kernels::{Kernel, Orientation, RobustKernel};
use ::geo::{coord, Coord, Intersects};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    fn coord(self) -> Coord<f64> {
        coord! { x: self.x, y: self.y }
    }
}

impl From<Coord<f64>> for Point {
    fn from(c: Coord<f64>) -> Self {
        Self { x: c.x, y: c.y }
    }
}

/// Axis-aligned rectangle with `x0 <= x1` and `y0 <= y1`.
///
/// Corners may be supplied in either order; every constructor normalizes
/// them, including deserialization from a `[x0, y0, x1, y1]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        ::geo::Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 }).into()
    }

    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    /// Smallest rectangle covering all `points`, `None` when there are none.
    pub fn covering<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        points.into_iter().fold(None, |acc: Option<Rect>, p| {
            Some(match acc {
                Some(r) => Rect::new(r.x0.min(p.x), r.y0.min(p.y), r.x1.max(p.x), r.y1.max(p.y)),
                None => Rect::new(p.x, p.y, p.x, p.y),
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> Point {
        Point::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x0, self.y0),
            Point::new(self.x1, self.y0),
            Point::new(self.x1, self.y1),
            Point::new(self.x0, self.y1),
        ]
    }

    pub fn contains_point(&self, p: &Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.to_geo().intersects(&other.to_geo())
    }

    fn to_geo(self) -> ::geo::Rect<f64> {
        ::geo::Rect::new(coord! { x: self.x0, y: self.y0 }, coord! { x: self.x1, y: self.y1 })
    }
}

impl From<::geo::Rect<f64>> for Rect {
    fn from(r: ::geo::Rect<f64>) -> Self {
        let (min, max) = (r.min(), r.max());
        Self {
            x0: min.x,
            y0: min.y,
            x1: max.x,
            y1: max.y,
        }
    }
}

impl From<[f64; 4]> for Rect {
    fn from(v: [f64; 4]) -> Self {
        Rect::new(v[0], v[1], v[2], v[3])
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x0, r.y0, r.x1, r.y1]
    }
}

/// Direction of travel at the middle point of an ordered triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Turn {
    Left,
    Right,
}

/// Turn taken at `current` when walking `previous -> current -> next`.
///
/// Positive signed area is a left turn. Collinear triples have no turn.
pub fn turn(previous: Point, current: Point, next: Point) -> Option<Turn> {
    match <RobustKernel as Kernel<f64>>::orient2d(previous.coord(), current.coord(), next.coord())
    {
        Orientation::CounterClockwise => Some(Turn::Left),
        Orientation::Clockwise => Some(Turn::Right),
        Orientation::Collinear => None,
    }
}

/// Whether the infinite line through `start` and `end` meets `rect`.
///
/// The test is against the whole line, not the finite segment, so a
/// connector that stops short of an object still counts as pointing at it.
/// A degenerate line (both points equal) meets the rectangle only if the
/// point lies inside it.
pub fn line_intersects_rect(start: Point, end: Point, rect: &Rect) -> bool {
    let rect = Rect::new(rect.x0, rect.y0, rect.x1, rect.y1);
    if start == end {
        return rect.contains_point(&start);
    }

    let mut left = false;
    let mut right = false;
    for corner in rect.corners() {
        match turn(start, end, corner) {
            None => return true,
            Some(Turn::Left) => left = true,
            Some(Turn::Right) => right = true,
        }
    }
    left && right
}

/// Extent of a rectangle measured in an [`ArrowFrame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalExtent {
    pub along_min: f64,
    pub along_max: f64,
    pub perp_min: f64,
    pub perp_max: f64,
}

impl LocalExtent {
    pub fn along_center(&self) -> f64 {
        (self.along_min + self.along_max) / 2.0
    }

    pub fn perp_center(&self) -> f64 {
        (self.perp_min + self.perp_max) / 2.0
    }
}

/// Coordinate frame with its origin at an arrow's tail and its first axis
/// pointing at the head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowFrame {
    origin: Point,
    ux: f64,
    uy: f64,
    length: f64,
}

impl ArrowFrame {
    /// `None` for a zero-length arrow, which has no direction.
    pub fn new(tail: Point, head: Point) -> Option<Self> {
        let length = tail.distance(&head);
        if length <= f64::EPSILON {
            return None;
        }
        Some(Self {
            origin: tail,
            ux: (head.x - tail.x) / length,
            uy: (head.y - tail.y) / length,
            length,
        })
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// `(along, perp)` coordinates of `p`.
    pub fn project(&self, p: Point) -> (f64, f64) {
        let dx = p.x - self.origin.x;
        let dy = p.y - self.origin.y;
        (dx * self.ux + dy * self.uy, dy * self.ux - dx * self.uy)
    }

    pub fn project_rect(&self, rect: &Rect) -> LocalExtent {
        let mut extent = LocalExtent {
            along_min: f64::MAX,
            along_max: f64::MIN,
            perp_min: f64::MAX,
            perp_max: f64::MIN,
        };
        for corner in rect.corners() {
            let (along, perp) = self.project(corner);
            extent.along_min = extent.along_min.min(along);
            extent.along_max = extent.along_max.max(along);
            extent.perp_min = extent.perp_min.min(perp);
            extent.perp_max = extent.perp_max.max(perp);
        }
        extent
    }
}
