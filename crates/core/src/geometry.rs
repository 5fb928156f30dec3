//! Oriented cuboid primitives.
//!
//! Axis convention used throughout the workspace:
//! - `x` runs along the container width,
//! - `y` is vertical (height),
//! - `z` runs along the container depth (loading direction).

use nalgebra::{Point2, Point3};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::sync::Arc;

use crate::tolerance::{approx_le, whole_count};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Anything with an axis-aligned extent.
pub trait Dimensions {
    /// Extent along `x`.
    fn width(&self) -> f64;
    /// Extent along `y`.
    fn height(&self) -> f64;
    /// Extent along `z`.
    fn depth(&self) -> f64;

    /// Bounding volume.
    fn volume(&self) -> f64 {
        self.width() * self.height() * self.depth()
    }
}

/// A solid with an extent and a weight.
pub trait Cuboid: Dimensions {
    /// Total weight.
    fn weight(&self) -> f64;

    /// Volume actually occupied by goods. Composite units override this to
    /// exclude the air between their members.
    fn actual_volume(&self) -> f64 {
        self.volume()
    }
}

impl<T: Dimensions + ?Sized> Dimensions for Arc<T> {
    fn width(&self) -> f64 {
        (**self).width()
    }

    fn height(&self) -> f64 {
        (**self).height()
    }

    fn depth(&self) -> f64 {
        (**self).depth()
    }

    fn volume(&self) -> f64 {
        (**self).volume()
    }
}

impl<T: Cuboid + ?Sized> Cuboid for Arc<T> {
    fn weight(&self) -> f64 {
        (**self).weight()
    }

    fn actual_volume(&self) -> f64 {
        (**self).actual_volume()
    }
}

/// The three families of axis-aligned orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OrientationCategory {
    /// Original height stays vertical.
    Upright,
    /// Original width becomes vertical.
    Side,
    /// Original depth becomes vertical.
    Lie,
}

/// One of the six axis-aligned orientations of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Orientation {
    /// No rotation.
    #[default]
    Upright,
    /// Upright, turned a quarter around the vertical axis.
    UprightRotated,
    /// Standing on its side.
    Side,
    /// Standing on its side, turned a quarter around the vertical axis.
    SideRotated,
    /// Lying on its back.
    Lie,
    /// Lying on its back, turned a quarter around the vertical axis.
    LieRotated,
}

impl Orientation {
    /// All orientations in declaration order.
    pub const ALL: [Orientation; 6] = [
        Orientation::Upright,
        Orientation::UprightRotated,
        Orientation::Side,
        Orientation::SideRotated,
        Orientation::Lie,
        Orientation::LieRotated,
    ];

    /// Returns the category this orientation belongs to.
    pub fn category(self) -> OrientationCategory {
        match self {
            Orientation::Upright | Orientation::UprightRotated => OrientationCategory::Upright,
            Orientation::Side | Orientation::SideRotated => OrientationCategory::Side,
            Orientation::Lie | Orientation::LieRotated => OrientationCategory::Lie,
        }
    }

    /// Returns the orientation turned a quarter around the vertical axis.
    pub fn rotation(self) -> Orientation {
        match self {
            Orientation::Upright => Orientation::UprightRotated,
            Orientation::UprightRotated => Orientation::Upright,
            Orientation::Side => Orientation::SideRotated,
            Orientation::SideRotated => Orientation::Side,
            Orientation::Lie => Orientation::LieRotated,
            Orientation::LieRotated => Orientation::Lie,
        }
    }

    /// Returns true for the quarter-turned variants.
    pub fn is_rotated(self) -> bool {
        matches!(
            self,
            Orientation::UprightRotated | Orientation::SideRotated | Orientation::LieRotated
        )
    }

    /// Maps unoriented `(width, height, depth)` to the oriented
    /// `(width, height, depth)`.
    pub fn dimensions(self, width: f64, height: f64, depth: f64) -> (f64, f64, f64) {
        match self {
            Orientation::Upright => (width, height, depth),
            Orientation::UprightRotated => (depth, height, width),
            Orientation::Side => (height, width, depth),
            Orientation::SideRotated => (depth, width, height),
            Orientation::Lie => (width, depth, height),
            Orientation::LieRotated => (height, depth, width),
        }
    }

    /// Drops orientations that yield the same oriented extent as an earlier
    /// one, keeping the input order.
    pub fn merge<D: Dimensions + ?Sized>(unit: &D, orientations: &[Orientation]) -> Vec<Orientation> {
        let mut merged: Vec<(Orientation, (f64, f64, f64))> = Vec::with_capacity(orientations.len());
        for &orientation in orientations {
            let dims = orientation.dimensions(unit.width(), unit.height(), unit.depth());
            let duplicated = merged.iter().any(|(_, other)| {
                crate::tolerance::approx_eq(dims.0, other.0)
                    && crate::tolerance::approx_eq(dims.1, other.1)
                    && crate::tolerance::approx_eq(dims.2, other.2)
            });
            if !duplicated {
                merged.push((orientation, dims));
            }
        }
        merged.into_iter().map(|(o, _)| o).collect()
    }
}

/// A 2D projection plane used to lay out footprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProjectivePlane {
    /// The floor (z/x). Length runs along depth, width along `x`.
    Bottom,
    /// The side wall (x/y). Length runs along `x`, width along `y`.
    Side,
    /// The front wall (z/y). Length runs along depth, width along `y`.
    Front,
}

impl ProjectivePlane {
    /// Extent of `unit` along the plane's first axis.
    pub fn length<D: Dimensions + ?Sized>(self, unit: &D) -> f64 {
        match self {
            ProjectivePlane::Bottom | ProjectivePlane::Front => unit.depth(),
            ProjectivePlane::Side => unit.width(),
        }
    }

    /// Extent of `unit` along the plane's second axis.
    pub fn width<D: Dimensions + ?Sized>(self, unit: &D) -> f64 {
        match self {
            ProjectivePlane::Bottom => unit.width(),
            ProjectivePlane::Side | ProjectivePlane::Front => unit.height(),
        }
    }

    /// Extent of `unit` along the plane normal.
    pub fn height<D: Dimensions + ?Sized>(self, unit: &D) -> f64 {
        match self {
            ProjectivePlane::Bottom => unit.height(),
            ProjectivePlane::Side => unit.depth(),
            ProjectivePlane::Front => unit.width(),
        }
    }

    /// Projects a 3D point onto the plane.
    pub fn point2(self, point: &Point3<f64>) -> Point2<f64> {
        match self {
            ProjectivePlane::Bottom => Point2::new(point.z, point.x),
            ProjectivePlane::Side => Point2::new(point.x, point.y),
            ProjectivePlane::Front => Point2::new(point.z, point.y),
        }
    }

    /// Lifts a plane point to 3D at `distance` along the plane normal.
    pub fn point3(self, point: &Point2<f64>, distance: f64) -> Point3<f64> {
        match self {
            ProjectivePlane::Bottom => Point3::new(point.y, distance, point.x),
            ProjectivePlane::Side => Point3::new(point.x, point.y, distance),
            ProjectivePlane::Front => Point3::new(distance, point.y, point.x),
        }
    }

    /// Distance of a 3D point from the plane.
    pub fn distance(self, point: &Point3<f64>) -> f64 {
        match self {
            ProjectivePlane::Bottom => point.y,
            ProjectivePlane::Side => point.z,
            ProjectivePlane::Front => point.x,
        }
    }
}

/// Free space inside a container, unbounded by default.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Container3Shape {
    /// Extent along `x`.
    pub width: f64,
    /// Extent along `y`.
    pub height: f64,
    /// Extent along `z`.
    pub depth: f64,
}

impl Default for Container3Shape {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl Container3Shape {
    /// Creates a bounded shape.
    pub fn new(width: f64, height: f64, depth: f64) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// Creates a shape with infinite extent on every axis.
    pub fn unbounded() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY, f64::INFINITY)
    }

    /// Returns true if an extent of `width x height x depth` fits inside.
    pub fn fits(&self, width: f64, height: f64, depth: f64) -> bool {
        approx_le(width, self.width) && approx_le(height, self.height) && approx_le(depth, self.depth)
    }

    /// Returns true if `unit` fits inside as it is currently oriented.
    pub fn enabled<D: Dimensions + ?Sized>(&self, unit: &D) -> bool {
        self.fits(unit.width(), unit.height(), unit.depth())
    }

    /// Returns the space left beyond `offset`.
    pub fn rest_space(&self, offset: &Point3<f64>) -> Container3Shape {
        Container3Shape::new(
            (self.width - offset.x).max(0.0),
            (self.height - offset.y).max(0.0),
            (self.depth - offset.z).max(0.0),
        )
    }

    /// Upper bound on how many copies of `unit` fit by volume.
    pub fn max_amount<D: Dimensions + ?Sized>(&self, unit: &D) -> u64 {
        whole_count(self.width, unit.width())
            .saturating_mul(whole_count(self.height, unit.height()))
            .saturating_mul(whole_count(self.depth, unit.depth()))
    }
}

impl Dimensions for Container3Shape {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn depth(&self) -> f64 {
        self.depth
    }
}

/// Weight and footprint area carried by the units directly beneath a
/// candidate placement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BottomSupport {
    /// Supported footprint area.
    pub area: f64,
    /// Share of supporter weight under the supported area.
    pub weight: f64,
}

impl BottomSupport {
    /// No support at all.
    pub const EMPTY: BottomSupport = BottomSupport {
        area: 0.0,
        weight: 0.0,
    };

    /// Creates a support aggregate.
    pub fn new(area: f64, weight: f64) -> Self {
        Self { area, weight }
    }
}

impl Add for BottomSupport {
    type Output = BottomSupport;

    fn add(self, rhs: Self) -> Self::Output {
        BottomSupport::new(self.area + rhs.area, self.weight + rhs.weight)
    }
}

impl AddAssign for BottomSupport {
    fn add_assign(&mut self, rhs: Self) {
        self.area += rhs.area;
        self.weight += rhs.weight;
    }
}

impl Sum for BottomSupport {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(BottomSupport::EMPTY, Add::add)
    }
}
