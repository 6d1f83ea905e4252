#![forbid(unsafe_code)]

//! Geometric primitives in document pixel space.
//!
//! Unlike terminal cells, document coordinates can go negative once offsets
//! are applied (an overlay pushed above the top edge), so everything here is
//! signed.

/// A point in document pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)`.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle: bounding boxes, viewports and hit testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// A zero-sized rectangle sitting on `point`.
    ///
    /// Pointer-anchored placement uses this so the same placement math
    /// serves both element and pointer anchors.
    #[inline]
    pub const fn at_point(point: Point) -> Self {
        Self::new(point.x, point.y, 0, 0)
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Horizontal center.
    #[inline]
    pub const fn center_x(&self) -> i32 {
        self.x.saturating_add(self.width / 2)
    }

    /// Vertical center.
    #[inline]
    pub const fn center_y(&self) -> i32 {
        self.y.saturating_add(self.height / 2)
    }

    /// Top-left corner.
    #[inline]
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Check if the rectangle has zero area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub const fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Place a rectangle of `size` with its top-left corner at `origin`.
    #[inline]
    pub const fn with_origin(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_and_centers() {
        let r = Rect::new(10, 20, 100, 40);
        assert_eq!(r.right(), 110);
        assert_eq!(r.bottom(), 60);
        assert_eq!(r.center_x(), 60);
        assert_eq!(r.center_y(), 40);
        assert_eq!(r.origin(), Point::new(10, 20));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains(Point::new(0, 0)));
        assert!(r.contains(Point::new(9, 9)));
        assert!(!r.contains(Point::new(10, 5)));
        assert!(!r.contains(Point::new(-1, 5)));
    }

    #[test]
    fn point_rect_is_empty() {
        let r = Rect::at_point(Point::new(5, 7));
        assert!(r.is_empty());
        assert_eq!(r.right(), 5);
        assert_eq!(r.bottom(), 7);
    }

    #[test]
    fn offset_saturates() {
        let p = Point::new(i32::MAX, 0).offset(1, -3);
        assert_eq!(p, Point::new(i32::MAX, -3));
    }
}
