//! Axis-aligned rectangles for footprint math.

use crate::tolerance::{approx_eq, definitely_lt};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle on a projection plane.
///
/// Rectangles that merely touch along an edge do not overlap: two cartons
/// standing side by side share no footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect2 {
    /// Minimum first coordinate.
    pub min_x: f64,
    /// Minimum second coordinate.
    pub min_y: f64,
    /// Maximum first coordinate.
    pub max_x: f64,
    /// Maximum second coordinate.
    pub max_y: f64,
}

impl Rect2 {
    /// Creates a rectangle from min/max coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates a rectangle from an origin and an extent.
    pub fn from_origin(x: f64, y: f64, length: f64, width: f64) -> Self {
        Self::new(x, y, x + length, y + width)
    }

    /// Returns the extent along the first axis.
    pub fn length(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Returns the extent along the second axis.
    pub fn width(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Returns the area of the rectangle.
    pub fn area(&self) -> f64 {
        self.length() * self.width()
    }

    /// Checks if this rectangle contains a point, boundary included.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Checks if the interiors of two rectangles overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        definitely_lt(self.min_x, other.max_x)
            && definitely_lt(other.min_x, self.max_x)
            && definitely_lt(self.min_y, other.max_y)
            && definitely_lt(other.min_y, self.max_y)
    }

    /// Returns the overlapping part of two rectangles, if it has an area.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }

        Some(Self {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Returns the area shared with `other`, zero if disjoint.
    pub fn intersection_area(&self, other: &Self) -> f64 {
        self.intersection(other).map_or(0.0, |r| r.area())
    }

    /// Returns the union (bounding rectangle) of two rectangles.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Returns true if both rectangles cover the same region.
    pub fn approx_eq(&self, other: &Self) -> bool {
        approx_eq(self.min_x, other.min_x)
            && approx_eq(self.min_y, other.min_y)
            && approx_eq(self.max_x, other.max_x)
            && approx_eq(self.max_y, other.max_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_touching_rectangles_do_not_overlap() {
        let a = Rect2::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect2::new(10.0, 0.0, 20.0, 10.0);
        assert!(!a.overlaps(&b));
        assert!(a.intersection(&b).is_none());
        assert_relative_eq!(a.intersection_area(&b), 0.0);
    }

    #[test]
    fn test_intersection() {
        let a = Rect2::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect2::new(5.0, 5.0, 15.0, 15.0);
        let intersection = a.intersection(&b).unwrap();
        assert_relative_eq!(intersection.min_x, 5.0);
        assert_relative_eq!(intersection.min_y, 5.0);
        assert_relative_eq!(intersection.max_x, 10.0);
        assert_relative_eq!(intersection.max_y, 10.0);
        assert_relative_eq!(a.intersection_area(&b), 25.0);
    }

    #[test]
    fn test_union_and_extent() {
        let a = Rect2::from_origin(0.0, 0.0, 4.0, 2.0);
        let b = Rect2::from_origin(4.0, 1.0, 2.0, 3.0);
        let u = a.union(&b);
        assert_relative_eq!(u.length(), 6.0);
        assert_relative_eq!(u.width(), 4.0);
        assert!(u.contains_point(6.0, 4.0));
    }
}
