//! Containers of item placements and the units layers are built from.

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::Point3;
use rayon::prelude::*;

use u_loading_core::geometry::{Container3Shape, Cuboid, Dimensions};
use u_loading_core::placement::{bottom_placements, top_placements, Placement3};

use crate::block::Block;
use crate::item::{Item, ItemPlacement, ItemView};
use crate::package::PackageType;
use crate::stacking::Stackable;

/// Aggregate queries over a composite of item placements.
///
/// Flags are derived from the contents on demand; implementors with a
/// known structure may answer them directly.
pub trait ItemContainer: Cuboid {
    /// Item placements relative to the container's origin.
    fn items(&self) -> Vec<ItemPlacement>;

    /// Item placements shifted by the container's own position.
    fn dump(&self, origin: &Point3<f64>) -> Vec<ItemPlacement> {
        self.items().iter().map(|p| p.offset(origin)).collect()
    }

    /// Number of placements per item.
    fn amounts(&self) -> HashMap<Arc<Item>, u64> {
        let mut amounts = HashMap::new();
        for placement in self.items() {
            *amounts.entry(Arc::clone(placement.unit.item())).or_insert(0) += 1;
        }
        amounts
    }

    /// Number of placements of `item`.
    fn amount(&self, item: &Item) -> u64 {
        self.items()
            .iter()
            .filter(|p| p.unit.item().as_ref() == item)
            .count() as u64
    }

    /// Minimal package type of the contents.
    fn package_type(&self) -> Option<PackageType> {
        self.items().iter().map(|p| p.unit.package_type()).min()
    }

    /// True if any unit on the container's floor must stay at the bottom.
    fn bottom_only(&self) -> bool {
        let items = self.items();
        bottom_placements(&items).iter().any(|p| p.unit.bottom_only())
    }

    /// Highest top face among bottom-only contents.
    fn bottom_only_height(&self) -> f64 {
        self.items()
            .iter()
            .filter(|p| p.unit.bottom_only())
            .map(|p| p.max_y())
            .fold(0.0, f64::max)
    }

    /// True if every unit at the top can carry other units.
    fn top_flat(&self) -> bool {
        let items = self.items();
        top_placements(&items).iter().all(|p| p.unit.top_flat())
    }

    /// Share of the bounding volume occupied by goods.
    fn loading_rate(&self) -> f64 {
        let volume = self.volume();
        if volume > 0.0 {
            self.actual_volume() / volume
        } else {
            0.0
        }
    }
}

/// Something a layer holds: a single item or a prebuilt block.
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    /// A single oriented item.
    Item(ItemView),
    /// A composite block.
    Block(Arc<Block>),
}

/// A unit placed inside a layer.
pub type UnitPlacement = Placement3<Unit>;

impl Unit {
    /// Item placements of this unit positioned at `origin`.
    pub fn dump(&self, origin: &Point3<f64>) -> Vec<ItemPlacement> {
        match self {
            Unit::Item(view) => vec![Placement3::new(view.clone(), *origin)],
            Unit::Block(block) => block.dump(origin),
        }
    }

    /// Minimal package type.
    pub fn package_type(&self) -> Option<PackageType> {
        match self {
            Unit::Item(view) => Some(view.package_type()),
            Unit::Block(block) => ItemContainer::package_type(block.as_ref()),
        }
    }

    /// Bottom-only flag.
    pub fn bottom_only(&self) -> bool {
        match self {
            Unit::Item(view) => view.bottom_only(),
            Unit::Block(block) => ItemContainer::bottom_only(block.as_ref()),
        }
    }

    /// Height above the unit's origin that bottom-only contents reach.
    pub fn bottom_only_height(&self) -> f64 {
        match self {
            Unit::Item(view) => {
                if view.bottom_only() {
                    view.height()
                } else {
                    0.0
                }
            }
            Unit::Block(block) => block.bottom_only_height(),
        }
    }

    /// Top-flat flag.
    pub fn top_flat(&self) -> bool {
        match self {
            Unit::Item(view) => view.top_flat(),
            Unit::Block(block) => ItemContainer::top_flat(block.as_ref()),
        }
    }
}

impl From<ItemView> for Unit {
    fn from(view: ItemView) -> Self {
        Unit::Item(view)
    }
}

impl From<Block> for Unit {
    fn from(block: Block) -> Self {
        Unit::Block(Arc::new(block))
    }
}

impl Dimensions for Unit {
    fn width(&self) -> f64 {
        match self {
            Unit::Item(view) => view.width(),
            Unit::Block(block) => block.width(),
        }
    }

    fn height(&self) -> f64 {
        match self {
            Unit::Item(view) => view.height(),
            Unit::Block(block) => block.height(),
        }
    }

    fn depth(&self) -> f64 {
        match self {
            Unit::Item(view) => view.depth(),
            Unit::Block(block) => block.depth(),
        }
    }
}

impl Cuboid for Unit {
    fn weight(&self) -> f64 {
        match self {
            Unit::Item(view) => view.weight(),
            Unit::Block(block) => block.weight(),
        }
    }

    fn actual_volume(&self) -> f64 {
        match self {
            Unit::Item(view) => view.volume(),
            Unit::Block(block) => block.actual_volume(),
        }
    }
}

impl Stackable for Placement3<Arc<Block>> {
    fn enabled_stacking_on(&self, bottoms: &[ItemPlacement], space: &Container3Shape) -> bool {
        let items = self.unit.dump(&self.position);
        bottom_placements(&items)
            .par_iter()
            .all(|item| item.enabled_stacking_on(bottoms, space))
    }
}

impl Stackable for UnitPlacement {
    fn enabled_stacking_on(&self, bottoms: &[ItemPlacement], space: &Container3Shape) -> bool {
        match &self.unit {
            Unit::Item(view) => {
                Placement3::new(view.clone(), self.position).enabled_stacking_on(bottoms, space)
            }
            Unit::Block(block) => {
                Placement3::new(Arc::clone(block), self.position).enabled_stacking_on(bottoms, space)
            }
        }
    }
}

/// Container shape spanning a set of placements, measured from their
/// minimum corner.
pub fn bounding_shape<T: Dimensions>(placements: &[Placement3<T>]) -> Container3Shape {
    if placements.is_empty() {
        return Container3Shape::new(0.0, 0.0, 0.0);
    }
    let (mut min, mut max) = (
        Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
        Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
    );
    for p in placements {
        min.x = min.x.min(p.x());
        min.y = min.y.min(p.y());
        min.z = min.z.min(p.z());
        max.x = max.x.max(p.max_x());
        max.y = max.y.max(p.max_y());
        max.z = max.z.max(p.max_z());
    }
    Container3Shape::new(max.x - min.x, max.y - min.y, max.z - min.z)
}
