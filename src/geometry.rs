//! Geometry primitives shared by the layout engine and the backends
//!
//! Integer pixel geometry, matching what window systems report. `Rect` stores
//! position and size; the wire encoding in `stream` uses inclusive
//! right/bottom edges.

use serde::{Deserialize, Serialize};

// ============================================================================
// Point / Size
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width/height pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Component-wise maximum of `self` and `other`
    pub fn expanded_to(self, other: Size) -> Size {
        Size::new(self.width.max(other.width), self.height.max(other.height))
    }

    /// Component-wise minimum of `self` and `other`
    pub fn bounded_to(self, other: Size) -> Size {
        Size::new(self.width.min(other.width), self.height.min(other.height))
    }

    /// True if either dimension is zero or negative
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

impl std::ops::Add for Size {
    type Output = Size;

    fn add(self, rhs: Size) -> Size {
        Size::new(
            self.width.saturating_add(rhs.width),
            self.height.saturating_add(rhs.height),
        )
    }
}

// ============================================================================
// Rect
// ============================================================================

/// Rectangle in pixels (top-left origin)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// Build a rect from inclusive edges, the way layout streams store them.
    /// `None` if the width or height does not fit in an `i32`.
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Option<Self> {
        let width = right.checked_sub(left)?.checked_add(1)?;
        let height = bottom.checked_sub(top)?.checked_add(1)?;
        Some(Self::new(left, top, width, height))
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Inclusive right edge
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width).saturating_sub(1)
    }

    /// Inclusive bottom edge
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height).saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn with_size(self, size: Size) -> Rect {
        Rect::new(self.x, self.y, size.width, size.height)
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x
            && px < self.x.saturating_add(self.width)
            && py >= self.y
            && py < self.y.saturating_add(self.height)
    }

    /// Overlapping area of two rects; empty (zero-sized) when disjoint
    pub fn intersected(&self, other: &Rect) -> Rect {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self
            .x
            .saturating_add(self.width)
            .min(other.x.saturating_add(other.width));
        let bottom = self
            .y
            .saturating_add(self.height)
            .min(other.y.saturating_add(other.height));
        if right <= left || bottom <= top {
            return Rect::new(left, top, 0, 0);
        }
        Rect::new(left, top, right.saturating_sub(left), bottom.saturating_sub(top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expanded_to_is_componentwise() {
        let requested = Size::new(50, 400);
        let minimum = Size::new(120, 90);
        assert_eq!(requested.expanded_to(minimum), Size::new(120, 400));
    }

    #[test]
    fn test_inclusive_edges() {
        let rect = Rect::new(10, 10, 300, 200);
        assert_eq!(rect.right(), 309);
        assert_eq!(rect.bottom(), 209);
        assert_eq!(Rect::from_edges(10, 10, 309, 209), Some(rect));
    }

    #[test]
    fn test_intersected() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 60, 100, 100);
        assert_eq!(a.intersected(&b), Rect::new(50, 60, 50, 40));

        let far = Rect::new(500, 500, 10, 10);
        assert!(a.intersected(&far).is_empty());
    }

    #[test]
    fn test_extreme_edges_do_not_overflow() {
        assert_eq!(Rect::from_edges(i32::MIN, 0, i32::MAX, 10), None);
        assert_eq!(Rect::from_edges(0, i32::MIN, 10, i32::MAX), None);
        assert_eq!(
            Rect::from_edges(0, 0, i32::MAX - 1, 0),
            Some(Rect::new(0, 0, i32::MAX, 1))
        );

        let huge = Rect::new(i32::MAX - 5, i32::MAX - 5, i32::MAX, i32::MAX);
        assert_eq!(huge.right(), i32::MAX - 1);
        assert_eq!(huge.bottom(), i32::MAX - 1);
        assert!(huge.contains(i32::MAX - 2, i32::MAX - 2));

        let wide = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert!(wide.intersected(&huge).is_empty());
        let everything = Rect::new(i32::MIN, 0, i32::MAX, 10)
            .intersected(&Rect::new(-10, 0, i32::MAX, 10));
        assert_eq!(everything, Rect::new(-10, 0, 9, 10));
    }
}
