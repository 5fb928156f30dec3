//! Layers: one packable cross-section of a bin or a pallet.

use std::fmt;
use std::sync::Arc;

use u_loading_core::geometry::{Container3Shape, Cuboid, Dimensions};
use u_loading_core::placement::Placement3;

use crate::block::same_arrangement;
use crate::container::{ItemContainer, Unit, UnitPlacement};
use crate::item::ItemPlacement;

/// A layer placed in a bin.
pub type LayerPlacement = Placement3<Arc<Layer>>;

/// Which axis a layer grows along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerKind {
    /// A wall across the bin; its depth is the deepest unit.
    Bin,
    /// A floor of a pallet; its height is the highest unit.
    Pallet,
}

/// What produced a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerSource {
    /// Lifted from a 2D plane layout.
    Plane,
    /// Generated by a pattern.
    Pattern,
    /// Any other producer, named by the caller.
    Custom(String),
}

/// One cross-section of placements.
///
/// Units are kept in (z, y, x) order. `bottom_only` and `top_flat` are
/// derived from the units on demand, except that a pallet layer is always
/// flat on top.
#[derive(Debug, Clone)]
pub struct Layer {
    iteration: u64,
    kind: LayerKind,
    source: LayerSource,
    shape: Container3Shape,
    units: Vec<UnitPlacement>,
}

impl Layer {
    /// Creates a bin layer spanning the width and height of `space`.
    pub fn bin_layer(
        iteration: u64,
        space: &Container3Shape,
        units: Vec<UnitPlacement>,
        source: LayerSource,
    ) -> Self {
        let units = Self::sorted(units);
        let depth = units.iter().map(|p| p.max_z()).fold(0.0, f64::max);
        Self {
            iteration,
            kind: LayerKind::Bin,
            source,
            shape: Container3Shape::new(space.width, space.height, depth),
            units,
        }
    }

    /// Creates a pallet layer spanning the floor of `space`.
    pub fn pallet_layer(
        iteration: u64,
        space: &Container3Shape,
        units: Vec<UnitPlacement>,
        source: LayerSource,
    ) -> Self {
        let units = Self::sorted(units);
        let height = units.iter().map(|p| p.max_y()).fold(0.0, f64::max);
        Self {
            iteration,
            kind: LayerKind::Pallet,
            source,
            shape: Container3Shape::new(space.width, height, space.depth),
            units,
        }
    }

    /// Creates a bin layer from plain item placements, e.g. a generated
    /// footprint.
    pub fn from_items(
        iteration: u64,
        space: &Container3Shape,
        items: Vec<ItemPlacement>,
        source: LayerSource,
    ) -> Self {
        let units = items
            .into_iter()
            .map(|p| p.map(Unit::Item))
            .collect();
        Self::bin_layer(iteration, space, units, source)
    }

    fn sorted(mut units: Vec<UnitPlacement>) -> Vec<UnitPlacement> {
        units.sort_by(|a, b| a.cmp_position(b));
        units
    }

    /// Generation round that produced the layer.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Returns the layer kind.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Returns the producer of the layer.
    pub fn source(&self) -> &LayerSource {
        &self.source
    }

    /// Returns the layer shape.
    pub fn shape(&self) -> &Container3Shape {
        &self.shape
    }

    /// Returns the units in (z, y, x) order.
    pub fn units(&self) -> &[UnitPlacement] {
        &self.units
    }

    /// Highest point that bottom-only contents reach, measured from the
    /// layer floor. Zero when the layer holds no bottom-only goods.
    pub fn bottom_required_height(&self) -> f64 {
        self.units
            .iter()
            .map(|p| {
                let height = p.unit.bottom_only_height();
                if height > 0.0 {
                    p.y() + height
                } else {
                    0.0
                }
            })
            .fold(0.0, f64::max)
    }
}

impl Dimensions for Layer {
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

impl Cuboid for Layer {
    fn weight(&self) -> f64 {
        self.units.iter().map(|p| p.unit.weight()).sum()
    }

    fn actual_volume(&self) -> f64 {
        self.units.iter().map(|p| p.unit.actual_volume()).sum()
    }
}

impl ItemContainer for Layer {
    fn items(&self) -> Vec<ItemPlacement> {
        self.units
            .iter()
            .flat_map(|p| p.unit.dump(&p.position))
            .collect()
    }

    fn top_flat(&self) -> bool {
        match self.kind {
            LayerKind::Pallet => true,
            LayerKind::Bin => {
                let items = self.items();
                u_loading_core::top_placements(&items)
                    .iter()
                    .all(|p| p.unit.top_flat())
            }
        }
    }
}

impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.shape == other.shape
            && same_arrangement(&self.items(), &other.items())
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} layer #{} ({} units, {}x{}x{})",
            self.kind,
            self.iteration,
            self.units.len(),
            self.shape.width,
            self.shape.height,
            self.shape.depth
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::PackageAttribute;
    use crate::block::Block;
    use crate::item::{Item, ItemView};
    use crate::package::PackageType;
    use approx::assert_relative_eq;

    fn view(id: &str, w: f64, h: f64, d: f64) -> ItemView {
        ItemView::upright(Arc::new(Item::new(id, w, h, d).with_weight(1.0)))
    }

    fn space() -> Container3Shape {
        Container3Shape::new(10.0, 8.0, 20.0)
    }

    #[test]
    fn test_bin_layer_depth_follows_units() {
        let a = view("A", 2.0, 2.0, 3.0);
        let layer = Layer::from_items(
            0,
            &space(),
            vec![
                Placement3::at(a.clone(), 2.0, 0.0, 1.0),
                Placement3::at(a, 0.0, 0.0, 0.0),
            ],
            LayerSource::Pattern,
        );
        assert_eq!(layer.kind(), LayerKind::Bin);
        assert_relative_eq!(layer.width(), 10.0);
        assert_relative_eq!(layer.height(), 8.0);
        assert_relative_eq!(layer.depth(), 4.0);
        assert_relative_eq!(layer.units()[0].x(), 0.0);
        assert_relative_eq!(layer.weight(), 2.0);
    }

    #[test]
    fn test_pallet_layer_is_top_flat() {
        let soft = Arc::new(
            Item::new("S", 2.0, 3.0, 2.0)
                .with_attribute(PackageAttribute::new(PackageType::CartonContainer).with_top_flat(false)),
        );
        let units = vec![Placement3::at(Unit::Item(ItemView::upright(soft)), 0.0, 0.0, 0.0)];
        let pallet = Layer::pallet_layer(1, &space(), units.clone(), LayerSource::Plane);
        let bin = Layer::bin_layer(1, &space(), units, LayerSource::Plane);
        assert_relative_eq!(pallet.height(), 3.0);
        assert!(pallet.top_flat());
        assert!(!bin.top_flat());
    }

    #[test]
    fn test_bottom_required_height_through_blocks() {
        let heavy = Arc::new(
            Item::new("H", 2.0, 2.0, 2.0)
                .with_attribute(PackageAttribute::new(PackageType::WoodenContainer).with_bottom_only(true)),
        );
        let a = view("A", 2.0, 1.0, 2.0);
        let pile = Block::pile(vec![ItemView::upright(heavy), a.clone()]).unwrap();
        let layer = Layer::bin_layer(
            0,
            &space(),
            vec![
                Placement3::at(Unit::from(pile), 0.0, 0.0, 0.0),
                Placement3::at(Unit::Item(a), 2.0, 0.0, 0.0),
            ],
            LayerSource::Custom("merge".to_string()),
        );
        assert!(layer.bottom_only());
        assert_relative_eq!(layer.bottom_required_height(), 2.0);
        assert_eq!(layer.items().len(), 3);
        assert_eq!(layer.package_type(), Some(PackageType::WoodenContainer));
    }

    #[test]
    fn test_equality_ignores_unit_order() {
        let a = view("A", 2.0, 2.0, 3.0);
        let first = Layer::from_items(
            0,
            &space(),
            vec![
                Placement3::at(a.clone(), 0.0, 0.0, 0.0),
                Placement3::at(a.clone(), 2.0, 0.0, 0.0),
            ],
            LayerSource::Pattern,
        );
        let second = Layer::from_items(
            7,
            &space(),
            vec![
                Placement3::at(a.clone(), 2.0, 0.0, 0.0),
                Placement3::at(a.clone(), 0.0, 0.0, 0.0),
            ],
            LayerSource::Plane,
        );
        assert_eq!(first, second);

        let shifted = Layer::from_items(0, &space(), vec![Placement3::at(a, 4.0, 0.0, 0.0)], LayerSource::Pattern);
        assert_ne!(first, shifted);
    }
}
