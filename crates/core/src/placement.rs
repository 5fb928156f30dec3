//! Placement representation for positioned units.
//!
//! A [`Placement3`] positions a unit relative to its parent container.
//! Nested containers (an item inside a block inside a layer inside a bin)
//! resolve absolute positions by re-offsetting children with
//! [`Placement3::offset`] while they are flattened.

use nalgebra::{Point2, Point3};
use std::cmp::Ordering;

use crate::footprint::Rect2;
use crate::geometry::{Cuboid, Dimensions, ProjectivePlane};
use crate::tolerance::{approx_eq, approx_le, definitely_gt, definitely_lt};

/// A unit placed at a position inside its parent container.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement3<T> {
    /// The placed unit.
    pub unit: T,
    /// Position of the unit's minimum corner relative to the parent.
    pub position: Point3<f64>,
}

impl<T> Placement3<T> {
    /// Creates a new placement.
    pub fn new(unit: T, position: Point3<f64>) -> Self {
        Self { unit, position }
    }

    /// Creates a placement from coordinates.
    pub fn at(unit: T, x: f64, y: f64, z: f64) -> Self {
        Self::new(unit, Point3::new(x, y, z))
    }

    /// Returns the x coordinate.
    pub fn x(&self) -> f64 {
        self.position.x
    }

    /// Returns the y coordinate.
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Returns the z coordinate.
    pub fn z(&self) -> f64 {
        self.position.z
    }

    /// Converts the unit while keeping the position.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Placement3<U> {
        Placement3::new(f(self.unit), self.position)
    }

    /// Returns a copy shifted by the parent's `origin`.
    pub fn offset(&self, origin: &Point3<f64>) -> Self
    where
        T: Clone,
    {
        Self::new(self.unit.clone(), self.position + origin.coords)
    }

    /// Canonical order inside containers: by z, then y, then x.
    pub fn cmp_position(&self, other: &Self) -> Ordering {
        self.z()
            .total_cmp(&other.z())
            .then_with(|| self.y().total_cmp(&other.y()))
            .then_with(|| self.x().total_cmp(&other.x()))
    }

    /// Returns true if the units are equal and positions agree within the
    /// tolerance.
    pub fn approx_eq(&self, other: &Self) -> bool
    where
        T: PartialEq,
    {
        self.unit == other.unit
            && approx_eq(self.x(), other.x())
            && approx_eq(self.y(), other.y())
            && approx_eq(self.z(), other.z())
    }
}

impl<T: Dimensions> Placement3<T> {
    /// Upper x bound.
    pub fn max_x(&self) -> f64 {
        self.position.x + self.unit.width()
    }

    /// Upper y bound (top face).
    pub fn max_y(&self) -> f64 {
        self.position.y + self.unit.height()
    }

    /// Upper z bound.
    pub fn max_z(&self) -> f64 {
        self.position.z + self.unit.depth()
    }

    /// Projection on the floor, in bottom-plane coordinates (z, x).
    pub fn footprint(&self) -> Rect2 {
        Rect2::from_origin(
            self.position.z,
            self.position.x,
            self.unit.depth(),
            self.unit.width(),
        )
    }

    /// Returns true if the floor projections share an area.
    pub fn bottom_overlapped<U: Dimensions>(&self, other: &Placement3<U>) -> bool {
        self.footprint().overlaps(&other.footprint())
    }

    /// Returns true if the two boxes share a volume.
    pub fn overlapped<U: Dimensions>(&self, other: &Placement3<U>) -> bool {
        self.bottom_overlapped(other)
            && definitely_lt(self.y(), other.max_y())
            && definitely_lt(other.y(), self.max_y())
    }

    /// Returns true if the top face of `self` is no higher than the bottom
    /// face of `other`.
    pub fn is_below<U: Dimensions>(&self, other: &Placement3<U>) -> bool {
        approx_le(self.max_y(), other.y())
    }
}

impl<T: Dimensions> Dimensions for Placement3<T> {
    fn width(&self) -> f64 {
        self.unit.width()
    }

    fn height(&self) -> f64 {
        self.unit.height()
    }

    fn depth(&self) -> f64 {
        self.unit.depth()
    }
}

impl<T: Cuboid> Cuboid for Placement3<T> {
    fn weight(&self) -> f64 {
        self.unit.weight()
    }

    fn actual_volume(&self) -> f64 {
        self.unit.actual_volume()
    }
}

/// Placements that nothing else in the set covers: no other placement with
/// an overlapping footprint reaches higher.
pub fn top_placements<T: Dimensions>(placements: &[Placement3<T>]) -> Vec<&Placement3<T>> {
    let refs: Vec<&Placement3<T>> = placements.iter().collect();
    top_placement_refs(&refs)
}

/// Same as [`top_placements`] over a borrowed subset.
pub fn top_placement_refs<'a, T: Dimensions>(
    placements: &[&'a Placement3<T>],
) -> Vec<&'a Placement3<T>> {
    placements
        .iter()
        .enumerate()
        .filter(|(i, p)| {
            !placements.iter().enumerate().any(|(j, q)| {
                *i != j && p.bottom_overlapped(*q) && definitely_gt(q.max_y(), p.max_y())
            })
        })
        .map(|(_, p)| *p)
        .collect()
}

/// Placements that nothing else in the set lies beneath.
pub fn bottom_placements<T: Dimensions>(placements: &[Placement3<T>]) -> Vec<&Placement3<T>> {
    placements
        .iter()
        .enumerate()
        .filter(|(i, p)| {
            !placements.iter().enumerate().any(|(j, q)| {
                *i != j && p.bottom_overlapped(q) && definitely_lt(q.y(), p.y())
            })
        })
        .map(|(_, p)| p)
        .collect()
}

/// How one or more oriented views occupy a slot on a projection plane.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection<V> {
    /// A single view.
    Plane {
        /// The projected view.
        view: V,
        /// Projection plane.
        plane: ProjectivePlane,
    },
    /// `layer` copies of one view stacked along the plane normal.
    Pile {
        /// The repeated view.
        view: V,
        /// Projection plane.
        plane: ProjectivePlane,
        /// Number of copies.
        layer: u64,
    },
    /// Different views stacked along the plane normal, first one lowest.
    MultiPile {
        /// Views from bottom to top.
        views: Vec<V>,
        /// Projection plane.
        plane: ProjectivePlane,
    },
}

impl<V: Cuboid> Projection<V> {
    /// Returns the projection plane.
    pub fn plane(&self) -> ProjectivePlane {
        match self {
            Projection::Plane { plane, .. }
            | Projection::Pile { plane, .. }
            | Projection::MultiPile { plane, .. } => *plane,
        }
    }

    /// Extent along the plane's first axis.
    pub fn length(&self) -> f64 {
        let plane = self.plane();
        match self {
            Projection::Plane { view, .. } | Projection::Pile { view, .. } => plane.length(view),
            Projection::MultiPile { views, .. } => views
                .iter()
                .map(|v| plane.length(v))
                .fold(0.0, f64::max),
        }
    }

    /// Extent along the plane's second axis.
    pub fn width(&self) -> f64 {
        let plane = self.plane();
        match self {
            Projection::Plane { view, .. } | Projection::Pile { view, .. } => plane.width(view),
            Projection::MultiPile { views, .. } => views
                .iter()
                .map(|v| plane.width(v))
                .fold(0.0, f64::max),
        }
    }

    /// Extent along the plane normal.
    pub fn height(&self) -> f64 {
        let plane = self.plane();
        match self {
            Projection::Plane { view, .. } => plane.height(view),
            Projection::Pile { view, layer, .. } => plane.height(view) * *layer as f64,
            Projection::MultiPile { views, .. } => views.iter().map(|v| plane.height(v)).sum(),
        }
    }

    /// Total weight of the projected views.
    pub fn weight(&self) -> f64 {
        match self {
            Projection::Plane { view, .. } => view.weight(),
            Projection::Pile { view, layer, .. } => view.weight() * *layer as f64,
            Projection::MultiPile { views, .. } => views.iter().map(Cuboid::weight).sum(),
        }
    }

    /// Counts the views matching `predicate`, copies included.
    pub fn amount(&self, predicate: impl Fn(&V) -> bool) -> u64 {
        match self {
            Projection::Plane { view, .. } => u64::from(predicate(view)),
            Projection::Pile { view, layer, .. } => {
                if predicate(view) {
                    *layer
                } else {
                    0
                }
            }
            Projection::MultiPile { views, .. } => views.iter().filter(|v| predicate(*v)).count() as u64,
        }
    }
}

/// A projection placed on its plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement2<V> {
    /// What occupies the slot.
    pub projection: Projection<V>,
    /// Position of the slot's minimum corner on the plane.
    pub position: Point2<f64>,
}

impl<V: Cuboid> Placement2<V> {
    /// Creates a new plane placement.
    pub fn new(projection: Projection<V>, position: Point2<f64>) -> Self {
        Self {
            projection,
            position,
        }
    }

    /// First plane coordinate.
    pub fn x(&self) -> f64 {
        self.position.x
    }

    /// Second plane coordinate.
    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Upper bound along the first axis.
    pub fn max_x(&self) -> f64 {
        self.position.x + self.projection.length()
    }

    /// Upper bound along the second axis.
    pub fn max_y(&self) -> f64 {
        self.position.y + self.projection.width()
    }

    /// The occupied rectangle on the plane.
    pub fn rect(&self) -> Rect2 {
        Rect2::from_origin(
            self.position.x,
            self.position.y,
            self.projection.length(),
            self.projection.width(),
        )
    }

    /// Returns true if two slots share an area.
    pub fn overlapped(&self, other: &Self) -> bool {
        self.rect().overlaps(&other.rect())
    }

    /// Lifts the slot into 3D placements, starting `distance` away from the
    /// plane and stacking views along its normal.
    pub fn to_placement3(&self, distance: f64) -> Vec<Placement3<V>>
    where
        V: Clone,
    {
        let plane = self.projection.plane();
        let mut placements = Vec::new();
        let mut level = distance;
        match &self.projection {
            Projection::Plane { view, .. } => {
                placements.push(Placement3::new(view.clone(), plane.point3(&self.position, level)));
            }
            Projection::Pile { view, layer, .. } => {
                for _ in 0..*layer {
                    placements.push(Placement3::new(view.clone(), plane.point3(&self.position, level)));
                    level += plane.height(view);
                }
            }
            Projection::MultiPile { views, .. } => {
                for view in views {
                    placements.push(Placement3::new(view.clone(), plane.point3(&self.position, level)));
                    level += plane.height(view);
                }
            }
        }
        placements
    }
}
