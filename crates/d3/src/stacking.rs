//! Stacking-rule evaluation.
//!
//! Three levels of checks, from cheap to expensive:
//! - [`PackageAttribute::enabled_stacking_on_support`]: the overhang rule
//!   against an aggregated [`BottomSupport`];
//! - [`PackageAttribute::enabled_stacking_on_view`]: one item resting on one
//!   supporter;
//! - [`PackageAttribute::enabled_stacking_on_placements`]: a positioned item
//!   against every unit beneath it.
//!
//! [`Stackable`] combines the first and the last for positioned units.
//! Every check is a pure function of its inputs. Supporters always lie
//! strictly lower than the item, so the recursive layer count terminates.

use rayon::prelude::*;

use u_loading_core::geometry::{BottomSupport, Container3Shape, Cuboid, Dimensions, OrientationCategory};
use u_loading_core::placement::{top_placement_refs, Placement3};
use u_loading_core::tolerance::approx_eq;

use crate::attribute::PackageAttribute;
use crate::item::{ItemPlacement, ItemView};
use crate::package::PackageCategory;

/// A positioned unit that can be checked against the units beneath it.
pub trait Stackable {
    /// Returns true if the unit may rest at its position on `bottoms`
    /// inside the free `space`.
    fn enabled_stacking_on(&self, bottoms: &[ItemPlacement], space: &Container3Shape) -> bool;
}

impl Stackable for ItemPlacement {
    fn enabled_stacking_on(&self, bottoms: &[ItemPlacement], space: &Container3Shape) -> bool {
        let attribute = self.unit.attribute();
        if approx_eq(self.y(), 0.0) {
            return attribute.enabled_stacking_on_placements(self, &[], space);
        }
        let support = bottom_support(self, bottoms);
        attribute.enabled_stacking_on_support(&self.unit, &support)
            && attribute.enabled_stacking_on_placements(self, bottoms, space)
    }
}

/// Aggregates the area and the weight share carried by the units whose top
/// face touches the bottom face of `unit`.
pub fn bottom_support<T: Dimensions, U: Cuboid>(
    unit: &Placement3<T>,
    bottoms: &[Placement3<U>],
) -> BottomSupport {
    let footprint = unit.footprint();
    bottoms
        .iter()
        .filter(|bottom| approx_eq(bottom.max_y(), unit.y()))
        .map(|bottom| {
            let base = bottom.footprint();
            let area = footprint.intersection_area(&base);
            let weight = if base.area() > 0.0 {
                area / base.area() * bottom.weight()
            } else {
                0.0
            };
            BottomSupport::new(area, weight)
        })
        .sum()
}

/// Splits supporters into the direct ones (nothing in the set above them)
/// and the indirect rest.
pub fn split_supporters<'a>(
    supporters: &[&'a ItemPlacement],
) -> (Vec<&'a ItemPlacement>, Vec<&'a ItemPlacement>) {
    let direct = top_placement_refs(supporters);
    let indirect = supporters
        .iter()
        .copied()
        .filter(|p| !direct.iter().any(|d| std::ptr::eq(*d, *p)))
        .collect();
    (direct, indirect)
}

/// Longest contiguous run of the item's own type beneath it, as
/// `(layer count, run height)`.
///
/// Each direct supporter of matching type extends the run and recurses into
/// the indirect supporters under its own footprint; branches are evaluated
/// in parallel and combined by maximum.
pub fn stacked_run(item: &ItemPlacement, supporters: &[&ItemPlacement]) -> (u64, f64) {
    let (direct, indirect) = split_supporters(supporters);
    let item_type = item.unit.item_type();

    direct
        .par_iter()
        .filter(|bottom| bottom.unit.item_type() == item_type)
        .map(|bottom| {
            let beneath: Vec<&ItemPlacement> = indirect
                .iter()
                .copied()
                .filter(|p| p.bottom_overlapped(*bottom) && p.is_below(*bottom))
                .collect();
            let (layer, height) = if beneath.is_empty() {
                (0, 0.0)
            } else {
                stacked_run(bottom, &beneath)
            };
            (layer + 1, height + bottom.height())
        })
        .reduce(|| (0, 0.0), |a, b| (a.0.max(b.0), a.1.max(b.1)))
}

impl PackageAttribute {
    /// Overhang check against an aggregated support.
    pub fn enabled_stacking_on_support<C: Cuboid + ?Sized>(&self, unit: &C, support: &BottomSupport) -> bool {
        self.hanging_policy.enabled_stacking_on(unit, support)
    }

    /// Checks `item` resting on `bottom` (or on the floor when `None`).
    ///
    /// `layer` and `height` describe the same-type run already beneath the
    /// item; `space` is the free space available to it.
    pub fn enabled_stacking_on_view(
        &self,
        item: &ItemView,
        bottom: Option<&ItemView>,
        layer: u64,
        height: f64,
        space: &Container3Shape,
    ) -> bool {
        let is_filler = item.package_category() == PackageCategory::Filler;
        if let Some(bottom) = bottom {
            if item.bottom_only() && !bottom.bottom_only() {
                return false;
            }
            if (!bottom.top_flat() || !bottom.is_enabled()) && !is_filler {
                return false;
            }
        }

        if !item
            .item()
            .enabled_orientations_at(space, true)
            .contains(&item.orientation())
        {
            return false;
        }
        if !item.is_enabled() && !self.within_conditional_layer_cap(item, layer) {
            return false;
        }

        match bottom {
            Some(bottom) => self
                .stacking_on_policy
                .enabled_stacking_on(item, bottom, layer, height),
            None => true,
        }
    }

    /// Full positional check of `item` against the placements beneath it.
    pub fn enabled_stacking_on_placements(
        &self,
        item: &ItemPlacement,
        bottoms: &[ItemPlacement],
        space: &Container3Shape,
    ) -> bool {
        let supporters: Vec<&ItemPlacement> = bottoms
            .iter()
            .filter(|bottom| bottom.is_below(item) && bottom.bottom_overlapped(item))
            .collect();
        let (direct, indirect) = split_supporters(&supporters);

        if let Some(rule) = &self.extra_stacking_rule {
            if !rule(item, &direct, &indirect) {
                return false;
            }
        }

        if item.unit.bottom_only() && supporters.iter().any(|s| !s.unit.bottom_only()) {
            return false;
        }

        if !item
            .unit
            .item()
            .enabled_orientations_at(space, true)
            .contains(&item.unit.orientation())
        {
            return false;
        }

        let (layer, height) = stacked_run(item, &supporters);

        let is_filler = item.unit.package_category() == PackageCategory::Filler;
        for bottom in &direct {
            if bottom.unit.top_flat() {
                continue;
            }
            if !bottom.unit.is_enabled() && !item.unit.is_enabled() {
                if !self.within_conditional_layer_cap(&item.unit, layer) {
                    return false;
                }
            } else if !is_filler {
                return false;
            }
        }

        direct.par_iter().all(|bottom| {
            self.stacking_on_policy
                .enabled_stacking_on(&item.unit, &bottom.unit, layer, height)
        })
    }

    fn within_conditional_layer_cap(&self, item: &ItemView, layer: u64) -> bool {
        match item.orientation().category() {
            OrientationCategory::Side => layer < self.side_on_top_layer,
            OrientationCategory::Lie => layer < self.lie_on_top_layer,
            OrientationCategory::Upright => true,
        }
    }
}

impl ItemView {
    /// Checks this view resting on `bottom`, see
    /// [`PackageAttribute::enabled_stacking_on_view`].
    pub fn enabled_stacking_on(
        &self,
        bottom: Option<&ItemView>,
        layer: u64,
        height: f64,
        space: &Container3Shape,
    ) -> bool {
        self.attribute()
            .enabled_stacking_on_view(self, bottom, layer, height, space)
    }
}
