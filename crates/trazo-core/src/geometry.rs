//! Geometric primitives for diagram layout and positioning.
//!
//! This module provides the geometric types used throughout Trazo for
//! calculating positions, sizes, and bounding boxes of diagram elements.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - An axis-aligned box defined by minimum and maximum coordinates
//! - [`Insets`] - Padding values for four sides
//!
//! # Coordinate System
//!
//! Trazo uses a coordinate system consistent with SVG:
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! The origin is the top-left corner and Y grows downward. The PDF encoder
//! flips the Y axis itself when serializing.

/// A 2D point in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use trazo_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 7.5);
/// assert_eq!(mid.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Euclidean distance from the origin
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Swaps the x and y coordinates.
    ///
    /// Layout engines compute in a top-to-bottom frame and transpose the
    /// result for left-to-right diagrams.
    pub fn transpose(self) -> Self {
        Self {
            x: self.y,
            y: self.x,
        }
    }
}

/// Width and height of an element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn width(self) -> f32 {
        self.width
    }

    pub fn height(self) -> f32 {
        self.height
    }

    /// Component-wise maximum of two sizes.
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Grows the size by the given insets.
    pub fn add_padding(self, insets: Insets) -> Self {
        Self {
            width: self.width + insets.horizontal_sum(),
            height: self.height + insets.vertical_sum(),
        }
    }

    /// Swaps width and height.
    pub fn transpose(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// An axis-aligned bounding box.
///
/// # Examples
///
/// ```
/// # use trazo_core::geometry::{Bounds, Point, Size};
/// let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
/// let b = Bounds::new_from_top_left(Point::new(20.0, 0.0), Size::new(10.0, 10.0));
///
/// assert!(!a.intersects(&b));
/// assert_eq!(a.merge(&b).width(), 30.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds centered on `center`.
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width() / 2.0;
        let half_height = size.height() / 2.0;
        Self {
            min_x: center.x() - half_width,
            min_y: center.y() - half_height,
            max_x: center.x() + half_width,
            max_y: center.y() + half_height,
        }
    }

    /// Creates bounds whose top-left corner is `top_left`.
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x(),
            min_y: top_left.y(),
            max_x: top_left.x() + size.width(),
            max_y: top_left.y() + size.height(),
        }
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn min_point(self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Returns the smallest bounds that contain both `self` and `other`.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Moves the bounds by `offset`.
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x(),
            min_y: self.min_y + offset.y(),
            max_x: self.max_x + offset.x(),
            max_y: self.max_y + offset.y(),
        }
    }

    /// Expands the bounds outward by the given insets.
    pub fn add_padding(&self, insets: Insets) -> Self {
        Self {
            min_x: self.min_x - insets.left(),
            min_y: self.min_y - insets.top(),
            max_x: self.max_x + insets.right(),
            max_y: self.max_y + insets.bottom(),
        }
    }

    /// Swaps the axes of the bounds.
    pub fn transpose(&self) -> Self {
        Self {
            min_x: self.min_y,
            min_y: self.min_x,
            max_x: self.max_y,
            max_y: self.max_x,
        }
    }

    /// Returns `true` if the interiors of the two boxes overlap.
    ///
    /// Boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Returns `true` if `point` lies strictly inside the box.
    pub fn contains_point(&self, point: Point) -> bool {
        point.x() > self.min_x
            && point.x() < self.max_x
            && point.y() > self.min_y
            && point.y() < self.max_y
    }

    /// Returns `true` if the segment from `a` to `b` passes through the
    /// interior of the box.
    ///
    /// Uses Liang-Barsky clipping against the open box, so a segment that
    /// only grazes the border is not reported.
    pub fn intersects_segment(&self, a: Point, b: Point) -> bool {
        const EPSILON: f32 = 1e-3;
        let inner = self.add_padding(Insets::uniform(-EPSILON));
        if inner.width() <= 0.0 || inner.height() <= 0.0 {
            return false;
        }

        let dx = b.x() - a.x();
        let dy = b.y() - a.y();
        let mut t0 = 0.0f32;
        let mut t1 = 1.0f32;

        let checks = [
            (-dx, a.x() - inner.min_x),
            (dx, inner.max_x - a.x()),
            (-dy, a.y() - inner.min_y),
            (dy, inner.max_y - a.y()),
        ];

        for (p, q) in checks {
            if p == 0.0 {
                if q < 0.0 {
                    return false;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return false;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return false;
                }
                t1 = t1.min(r);
            }
        }

        t0 < t1
    }

    /// Finds where the ray from the box center toward `target` leaves the box.
    ///
    /// Returns the center itself when `target` coincides with it.
    pub fn border_point_toward(&self, target: Point) -> Point {
        let center = self.center();
        let delta = target.sub_point(center);
        if delta.x() == 0.0 && delta.y() == 0.0 {
            return center;
        }

        let half_width = self.width() / 2.0;
        let half_height = self.height() / 2.0;
        let scale_x = if delta.x() != 0.0 {
            half_width / delta.x().abs()
        } else {
            f32::INFINITY
        };
        let scale_y = if delta.y() != 0.0 {
            half_height / delta.y().abs()
        } else {
            f32::INFINITY
        };

        center.add_point(delta.scale(scale_x.min(scale_y)))
    }
}

/// Padding values for the four sides of a box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    /// Creates insets with individual values for each side (CSS order).
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates insets with the same value on every side.
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn top(self) -> f32 {
        self.top
    }

    pub fn right(self) -> f32 {
        self.right
    }

    pub fn bottom(self) -> f32 {
        self.bottom
    }

    pub fn left(self) -> f32 {
        self.left
    }

    /// Sum of the left and right insets
    pub fn horizontal_sum(self) -> f32 {
        self.left + self.right
    }

    /// Sum of the top and bottom insets
    pub fn vertical_sum(self) -> f32 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f32, y: f32, side: f32) -> Bounds {
        Bounds::new_from_top_left(Point::new(x, y), Size::new(side, side))
    }

    #[test]
    fn test_bounds_from_center() {
        let bounds = Bounds::new_from_center(Point::new(10.0, 10.0), Size::new(4.0, 6.0));
        assert_eq!(bounds.min_x(), 8.0);
        assert_eq!(bounds.min_y(), 7.0);
        assert_eq!(bounds.max_x(), 12.0);
        assert_eq!(bounds.max_y(), 13.0);
        assert_eq!(bounds.center(), Point::new(10.0, 10.0));
    }

    #[test]
    fn test_touching_bounds_do_not_intersect() {
        let a = square(0.0, 0.0, 10.0);
        let b = square(10.0, 0.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&square(9.0, 9.0, 10.0)));
    }

    #[test]
    fn test_segment_through_box() {
        let b = square(10.0, 10.0, 10.0);
        assert!(b.intersects_segment(Point::new(0.0, 15.0), Point::new(30.0, 15.0)));
        assert!(!b.intersects_segment(Point::new(0.0, 0.0), Point::new(30.0, 0.0)));
        // Segment along the border only grazes it.
        assert!(!b.intersects_segment(Point::new(10.0, 0.0), Point::new(10.0, 30.0)));
        // Segment ending before the box.
        assert!(!b.intersects_segment(Point::new(0.0, 15.0), Point::new(9.0, 15.0)));
    }

    #[test]
    fn test_border_point_toward() {
        let b = square(0.0, 0.0, 10.0);
        let right = b.border_point_toward(Point::new(100.0, 5.0));
        assert_eq!(right, Point::new(10.0, 5.0));

        let below = b.border_point_toward(Point::new(5.0, 100.0));
        assert_eq!(below, Point::new(5.0, 10.0));

        assert_eq!(b.border_point_toward(b.center()), b.center());
    }

    #[test]
    fn test_transpose() {
        let b = Bounds::new_from_top_left(Point::new(1.0, 2.0), Size::new(3.0, 4.0));
        let t = b.transpose();
        assert_eq!(t.min_x(), 2.0);
        assert_eq!(t.min_y(), 1.0);
        assert_eq!(t.width(), 4.0);
        assert_eq!(t.height(), 3.0);
    }
}
