//! Blocks: immutable composites of item placements reused as one unit.
//!
//! A [`Block`] is one of a closed set of [`BlockKind`]s. Its bounding shape
//! and aggregate flags are computed once by the constructor from its
//! contents; equality compares the contents.

use std::fmt;
use std::sync::Arc;

use nalgebra::Point3;

use u_loading_core::geometry::{Container3Shape, Cuboid, Dimensions, Orientation};
use u_loading_core::placement::Placement3;
use u_loading_core::{Error, Result};

use crate::container::{bounding_shape, ItemContainer};
use crate::item::{ItemPlacement, ItemView};
use crate::package::PackageType;

/// A block placed inside a larger block or a layer.
pub type BlockPlacement = Placement3<Arc<Block>>;

/// Structure of a block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    /// Arbitrary placements, e.g. a generated footprint.
    Common,
    /// A grid of one view, `layer` high.
    Simple {
        /// The repeated view.
        view: ItemView,
        /// Number of vertical layers.
        layer: u64,
    },
    /// One item arranged in two orientations that are quarter turns of
    /// each other around a hollow core.
    HollowSquare {
        /// First orientation.
        view: ItemView,
        /// The quarter-turned view.
        rotated: ItemView,
        /// Number of vertical layers.
        layer: u64,
    },
    /// A vertical stack of views, first one lowest.
    Pile {
        /// Views from bottom to top.
        views: Vec<ItemView>,
    },
    /// Simple blocks stacked vertically, first one lowest.
    Layered {
        /// Blocks from bottom to top.
        blocks: Vec<Arc<Block>>,
    },
    /// Positioned sub-blocks.
    Complex {
        /// The sub-blocks.
        blocks: Vec<BlockPlacement>,
    },
}

/// An immutable composite of item placements.
#[derive(Debug, Clone)]
pub struct Block {
    kind: BlockKind,
    units: Vec<ItemPlacement>,
    shape: Container3Shape,
    package_type: PackageType,
    bottom_only: bool,
    top_flat: bool,
}

impl Block {
    fn build(kind: BlockKind, mut units: Vec<ItemPlacement>) -> Result<Self> {
        let package_type = units
            .iter()
            .map(|p| p.unit.package_type())
            .min()
            .ok_or_else(|| Error::InvalidGeometry("a block needs at least one unit".to_string()))?;
        units.sort_by(|a, b| a.cmp_position(b));
        let shape = bounding_shape(&units);
        let mut block = Self {
            kind,
            units,
            shape,
            package_type,
            bottom_only: false,
            top_flat: true,
        };
        block.bottom_only = match &block.kind {
            BlockKind::Simple { view, .. } | BlockKind::HollowSquare { view, .. } => view.bottom_only(),
            BlockKind::Pile { views } => views.first().is_some_and(ItemView::bottom_only),
            BlockKind::Layered { blocks } => blocks.first().is_some_and(|b| b.bottom_only),
            BlockKind::Common | BlockKind::Complex { .. } => {
                let items = block.items();
                u_loading_core::bottom_placements(&items)
                    .iter()
                    .any(|p| p.unit.bottom_only())
            }
        };
        block.top_flat = match &block.kind {
            BlockKind::Simple { view, .. } => view.top_flat(),
            BlockKind::HollowSquare { view, rotated, .. } => view.top_flat() && rotated.top_flat(),
            BlockKind::Pile { views } => views.last().is_some_and(ItemView::top_flat),
            BlockKind::Layered { blocks } => blocks.last().is_some_and(|b| b.top_flat),
            BlockKind::Common | BlockKind::Complex { .. } => {
                let items = block.items();
                u_loading_core::top_placements(&items)
                    .iter()
                    .all(|p| p.unit.top_flat())
            }
        };
        Ok(block)
    }

    /// Wraps arbitrary placements.
    pub fn common(units: Vec<ItemPlacement>) -> Result<Self> {
        Self::build(BlockKind::Common, units)
    }

    /// Builds a simple block; every unit must share one view.
    pub fn simple(units: Vec<ItemPlacement>) -> Result<Self> {
        let view = units
            .first()
            .map(|p| p.unit.clone())
            .ok_or_else(|| Error::InvalidGeometry("a simple block needs at least one unit".to_string()))?;
        if units.iter().any(|p| p.unit != view) {
            return Err(Error::InvalidGeometry(format!(
                "simple block of {} contains other views",
                view
            )));
        }
        let layer = (bounding_shape(&units).height / view.height()).round() as u64;
        Self::build(BlockKind::Simple { view, layer }, units)
    }

    /// Builds a hollow-square block; units must use one item in exactly two
    /// orientations that are quarter turns of each other.
    pub fn hollow_square(units: Vec<ItemPlacement>) -> Result<Self> {
        let view = units
            .first()
            .map(|p| p.unit.clone())
            .ok_or_else(|| Error::InvalidGeometry("a hollow square block needs units".to_string()))?;
        let mut orientations: Vec<Orientation> = Vec::with_capacity(2);
        for placement in &units {
            if placement.unit.item() != view.item() {
                return Err(Error::InvalidGeometry(format!(
                    "hollow square block of {} contains other items",
                    view.item()
                )));
            }
            if !orientations.contains(&placement.unit.orientation()) {
                orientations.push(placement.unit.orientation());
            }
        }
        if orientations.len() != 2 || orientations[0].rotation() != orientations[1] {
            return Err(Error::InvalidGeometry(format!(
                "hollow square block of {} needs two mutually rotated orientations, got {:?}",
                view.item(),
                orientations
            )));
        }
        let rotated = ItemView::new(Arc::clone(view.item()), orientations[1]);
        let layer = (bounding_shape(&units).height / view.height()).round() as u64;
        Self::build(BlockKind::HollowSquare { view, rotated, layer }, units)
    }

    /// Stacks views on top of each other at the block origin.
    pub fn pile(views: Vec<ItemView>) -> Result<Self> {
        let mut y = 0.0;
        let units = views
            .iter()
            .map(|view| {
                let placement = Placement3::at(view.clone(), 0.0, y, 0.0);
                y += view.height();
                placement
            })
            .collect();
        Self::build(BlockKind::Pile { views }, units)
    }

    /// Stacks simple blocks on top of each other at the block origin.
    pub fn layered(blocks: Vec<Block>) -> Result<Self> {
        if let Some(other) = blocks.iter().find(|b| !matches!(b.kind, BlockKind::Simple { .. })) {
            return Err(Error::InvalidGeometry(format!(
                "layered blocks stack simple blocks only, got {}",
                other
            )));
        }
        let mut y = 0.0;
        let mut units = Vec::new();
        for block in &blocks {
            units.extend(block.dump(&Point3::new(0.0, y, 0.0)));
            y += block.height();
        }
        let blocks = blocks.into_iter().map(Arc::new).collect();
        Self::build(BlockKind::Layered { blocks }, units)
    }

    /// Combines positioned sub-blocks.
    pub fn complex(blocks: Vec<BlockPlacement>) -> Result<Self> {
        let units = blocks
            .iter()
            .flat_map(|placement| placement.unit.dump(&placement.position))
            .collect();
        Self::build(BlockKind::Complex { blocks }, units)
    }

    /// Returns the structure.
    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    /// Returns the item placements, in canonical (z, y, x) order.
    pub fn units(&self) -> &[ItemPlacement] {
        &self.units
    }

    /// Returns the tight bounding shape of the contents.
    pub fn shape(&self) -> &Container3Shape {
        &self.shape
    }

    /// Vertical layer count for grid-like blocks.
    pub fn layer(&self) -> Option<u64> {
        match &self.kind {
            BlockKind::Simple { layer, .. } | BlockKind::HollowSquare { layer, .. } => Some(*layer),
            BlockKind::Pile { views } => Some(views.len() as u64),
            BlockKind::Layered { blocks } => Some(blocks.iter().filter_map(|b| b.layer()).sum()),
            BlockKind::Common | BlockKind::Complex { .. } => None,
        }
    }

    /// Length of the same-type run at the bottom of a pile or layered block.
    pub fn bottom_layer(&self) -> u64 {
        match &self.kind {
            BlockKind::Pile { views } => leading_run(views.iter().map(ItemView::item_type)),
            BlockKind::Layered { blocks } => {
                let types: Vec<_> = blocks.iter().map(|b| b.view_type()).collect();
                let run = leading_run(types.iter().copied());
                blocks.iter().take(run as usize).filter_map(|b| b.layer()).sum()
            }
            _ => self.layer().unwrap_or(1),
        }
    }

    /// Length of the same-type run at the top of a pile or layered block.
    pub fn top_layer(&self) -> u64 {
        match &self.kind {
            BlockKind::Pile { views } => leading_run(views.iter().rev().map(ItemView::item_type)),
            BlockKind::Layered { blocks } => {
                let types: Vec<_> = blocks.iter().rev().map(|b| b.view_type()).collect();
                let run = leading_run(types.iter().copied());
                blocks.iter().rev().take(run as usize).filter_map(|b| b.layer()).sum()
            }
            _ => self.layer().unwrap_or(1),
        }
    }

    /// The same pile with every view turned a quarter around the vertical
    /// axis, if all of them allow it.
    pub fn rotation(&self) -> Option<Block> {
        match &self.kind {
            BlockKind::Pile { views } => {
                let rotated = views.iter().map(ItemView::rotation).collect::<Option<Vec<_>>>()?;
                Block::pile(rotated).ok()
            }
            _ => None,
        }
    }

    fn view_type(&self) -> Option<crate::item::ItemType> {
        match &self.kind {
            BlockKind::Simple { view, .. } | BlockKind::HollowSquare { view, .. } => Some(view.item_type()),
            _ => None,
        }
    }
}

fn leading_run<T: PartialEq>(mut types: impl Iterator<Item = T>) -> u64 {
    let Some(first) = types.next() else {
        return 0;
    };
    1 + types.take_while(|t| *t == first).count() as u64
}

/// Same-type run at the top of `bottoms` that `item` would extend, as
/// `(layer count, run height)`.
pub fn pile_layer(item: &ItemView, bottoms: &[ItemView]) -> (u64, f64) {
    let item_type = item.item_type();
    bottoms
        .iter()
        .rev()
        .take_while(|view| view.item_type() == item_type)
        .fold((0, 0.0), |(layer, height), view| (layer + 1, height + view.height()))
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.units.len() == other.units.len()
            && self
                .units
                .iter()
                .zip(&other.units)
                .all(|(a, b)| a.approx_eq(b))
    }
}

impl Dimensions for Block {
    fn width(&self) -> f64 {
        self.shape.width
    }

    fn height(&self) -> f64 {
        self.shape.height
    }

    fn depth(&self) -> f64 {
        self.shape.depth
    }
}

impl Cuboid for Block {
    fn weight(&self) -> f64 {
        self.units.iter().map(|p| p.unit.weight()).sum()
    }

    fn actual_volume(&self) -> f64 {
        self.units.iter().map(|p| p.unit.volume()).sum()
    }
}

impl ItemContainer for Block {
    fn items(&self) -> Vec<ItemPlacement> {
        self.units.clone()
    }

    fn package_type(&self) -> Option<PackageType> {
        Some(self.package_type)
    }

    fn bottom_only(&self) -> bool {
        self.bottom_only
    }

    fn top_flat(&self) -> bool {
        self.top_flat
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BlockKind::Simple { view, layer } => write!(f, "{} x{}", view, layer),
            BlockKind::HollowSquare { view, layer, .. } => write!(f, "hollow {} x{}", view, layer),
            BlockKind::Pile { views } => {
                let names: Vec<String> = views.iter().map(ToString::to_string).collect();
                write!(f, "pile[{}]", names.join(", "))
            }
            BlockKind::Layered { blocks } => write!(f, "layered({} blocks)", blocks.len()),
            BlockKind::Complex { blocks } => write!(f, "complex({} blocks)", blocks.len()),
            BlockKind::Common => write!(f, "block({} units)", self.units.len()),
        }
    }
}

/// Positions in a block that differ only within the tolerance describe the
/// same arrangement.
pub fn same_arrangement(a: &[ItemPlacement], b: &[ItemPlacement]) -> bool {
    a.len() == b.len()
        && a.iter().all(|p| b.iter().any(|q| p.approx_eq(q)))
        && b.iter().all(|q| a.iter().any(|p| p.approx_eq(q)))
}
