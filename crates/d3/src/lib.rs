//! # U-Loading 3D
//!
//! Stacking rules, pattern footprints and layer ordering for 3D load
//! planning.
//!
//! This crate provides:
//! - **Stacking rules**: package attributes deciding which unit may rest on
//!   which, from single views up to whole placement sets
//! - **Containers**: blocks, layers and bins that flatten to item placements
//! - **Patterns**: template-driven footprint generation with mixed piles
//! - **Layer ordering**: the permutation search behind [`BinType::program`]

pub mod attribute;
pub mod bin;
pub mod block;
pub mod container;
pub mod height_combinator;
pub mod item;
pub mod layer;
pub mod package;
pub mod pattern;
pub mod permutation;
pub mod stacking;

// Re-exports
pub use attribute::{
    HangingPolicy, OrientationRule, PackageAttribute, PairRule, Rule, StackingOnPolicy, StackingRule,
};
pub use bin::{compare_layers, group_bins, unpack_bins, Bin, BinCheckRule, BinType, ItemBin, LayerBin, LayerComparator};
pub use block::{pile_layer, same_arrangement, Block, BlockKind, BlockPlacement};
pub use container::{bounding_shape, ItemContainer, Unit, UnitPlacement};
pub use height_combinator::{HeightCombinator, HeightGroups};
pub use item::{total_amount, Inventory, Item, ItemPlacement, ItemType, ItemView};
pub use layer::{Layer, LayerKind, LayerPlacement, LayerSource};
pub use package::{PackageCategory, PackageType};
pub use pattern::{
    left_upper, right_bottom, ItemPlacement2, ItemPredicate, NextPointFn, Pattern, PatternConfig, Step,
    WEIGHT_BALANCE_FACTOR,
};
pub use stacking::{bottom_support, Stackable};
pub use u_loading_core::{CancellationToken, Container3Shape, Error, Orientation, ProjectivePlane, Result};
