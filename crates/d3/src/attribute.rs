//! Package attributes: the rule bundle governing how a package type may be
//! oriented, stacked and supported.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use u_loading_core::geometry::{BottomSupport, Container3Shape, Cuboid, Dimensions, Orientation, ProjectivePlane};
use u_loading_core::tolerance::{approx_le, definitely_gt, definitely_lt};

use crate::item::{ItemPlacement, ItemView};
use crate::package::{PackageCategory, PackageType};

/// Weight delta an item may exceed its supporter by, unless configured.
pub const DEFAULT_MAX_OVER_WEIGHT: f64 = 10.0;

/// A shared predicate.
///
/// Closures have no structural equality; two rules compare equal when they
/// share the same allocation, which is what cloning an attribute preserves.
pub struct Rule<F: ?Sized>(Arc<F>);

impl<F: ?Sized> Rule<F> {
    /// Wraps a shared predicate.
    pub fn new(f: Arc<F>) -> Self {
        Self(f)
    }
}

impl<F: ?Sized> Clone for Rule<F> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> PartialEq for Rule<F> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<F: ?Sized> fmt::Debug for Rule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rule(..)")
    }
}

impl<F: ?Sized> Deref for Rule<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.0
    }
}

/// Extra check on the orientation chosen for an available space.
pub type OrientationRule = Rule<dyn Fn(&Container3Shape, Orientation) -> bool + Send + Sync>;

/// Extra check on an item placement against its direct and indirect
/// supporters.
pub type StackingRule =
    Rule<dyn Fn(&ItemPlacement, &[&ItemPlacement], &[&ItemPlacement]) -> bool + Send + Sync>;

/// Extra check on an item resting on one supporter.
pub type PairRule = Rule<dyn Fn(&ItemView, &ItemView) -> bool + Send + Sync>;

/// How much of an item's footprint may overhang unsupported space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HangingPolicy {
    /// The unsupported area may not exceed `max_difference` times the
    /// shorter footprint side.
    Absolute {
        /// Allowed overhang, as a length.
        max_difference: f64,
        /// Also require the supported weight to carry the item.
        with_weight: bool,
    },
    /// The unsupported area may not exceed a share of the footprint.
    Relative {
        /// Allowed overhang share in `[0, 1]`.
        hanging_percentage: f64,
        /// Also require the supported weight to carry the item.
        with_weight: bool,
    },
}

impl Default for HangingPolicy {
    fn default() -> Self {
        HangingPolicy::Relative {
            hanging_percentage: 0.0,
            with_weight: false,
        }
    }
}

impl HangingPolicy {
    /// Checks `unit` against the support measured beneath it.
    pub fn enabled_stacking_on<C: Cuboid + ?Sized>(&self, unit: &C, support: &BottomSupport) -> bool {
        let length = ProjectivePlane::Bottom.length(unit);
        let width = ProjectivePlane::Bottom.width(unit);
        let hanging = length * width - support.area;

        match *self {
            HangingPolicy::Absolute {
                max_difference,
                with_weight,
            } => {
                if with_weight && definitely_lt(support.weight, unit.weight()) {
                    return false;
                }
                approx_le(hanging, max_difference * length.min(width))
            }
            HangingPolicy::Relative {
                hanging_percentage,
                with_weight,
            } => {
                if with_weight && definitely_lt(support.weight, unit.weight()) {
                    return false;
                }
                approx_le(hanging, length * width * hanging_percentage)
            }
        }
    }
}

/// What an item may rest on.
#[derive(Debug, Clone, PartialEq)]
pub enum StackingOnPolicy {
    /// Rigid boxes: footprints must match within `max_difference` and pallets
    /// underneath must be flat.
    Box {
        /// Allowed `|Δwidth| + |Δdepth|`.
        max_difference: f64,
        /// Allowed excess of the item's weight over the supporter's.
        max_over_weight: f64,
        /// Additional pair check.
        extra_rule: Option<PairRule>,
    },
    /// Cartons: footprints are only compared between two soft boxes.
    CartonContainer {
        /// Allowed excess of the item's `width + depth` over the supporter's.
        max_difference: f64,
        /// Allowed excess of the item's weight over the supporter's.
        max_over_weight: f64,
        /// Additional pair check.
        extra_rule: Option<PairRule>,
    },
    /// Fillers: no footprint constraint.
    Filler {
        /// Allowed excess of the item's weight over the supporter's.
        max_over_weight: f64,
        /// Additional pair check.
        extra_rule: Option<PairRule>,
    },
}

impl Default for StackingOnPolicy {
    fn default() -> Self {
        Self::boxed()
    }
}

impl StackingOnPolicy {
    /// Box policy with no footprint limit and the default weight delta.
    pub fn boxed() -> Self {
        StackingOnPolicy::Box {
            max_difference: f64::INFINITY,
            max_over_weight: DEFAULT_MAX_OVER_WEIGHT,
            extra_rule: None,
        }
    }

    /// Carton policy with no footprint limit and the default weight delta.
    pub fn carton_container() -> Self {
        StackingOnPolicy::CartonContainer {
            max_difference: f64::INFINITY,
            max_over_weight: DEFAULT_MAX_OVER_WEIGHT,
            extra_rule: None,
        }
    }

    /// Filler policy with the default weight delta.
    pub fn filler() -> Self {
        StackingOnPolicy::Filler {
            max_over_weight: DEFAULT_MAX_OVER_WEIGHT,
            extra_rule: None,
        }
    }

    /// Sets the footprint limit. Fillers ignore it.
    pub fn with_max_difference(mut self, value: f64) -> Self {
        match &mut self {
            StackingOnPolicy::Box { max_difference, .. }
            | StackingOnPolicy::CartonContainer { max_difference, .. } => *max_difference = value,
            StackingOnPolicy::Filler { .. } => {}
        }
        self
    }

    /// Sets the allowed weight delta.
    pub fn with_max_over_weight(mut self, value: f64) -> Self {
        match &mut self {
            StackingOnPolicy::Box { max_over_weight, .. }
            | StackingOnPolicy::CartonContainer { max_over_weight, .. }
            | StackingOnPolicy::Filler { max_over_weight, .. } => *max_over_weight = value,
        }
        self
    }

    /// Sets an additional pair check.
    pub fn with_extra_rule(
        mut self,
        rule: impl Fn(&ItemView, &ItemView) -> bool + Send + Sync + 'static,
    ) -> Self {
        let rule: Arc<dyn Fn(&ItemView, &ItemView) -> bool + Send + Sync> = Arc::new(rule);
        match &mut self {
            StackingOnPolicy::Box { extra_rule, .. }
            | StackingOnPolicy::CartonContainer { extra_rule, .. }
            | StackingOnPolicy::Filler { extra_rule, .. } => *extra_rule = Some(Rule::new(rule)),
        }
        self
    }

    fn max_over_weight(&self) -> f64 {
        match self {
            StackingOnPolicy::Box { max_over_weight, .. }
            | StackingOnPolicy::CartonContainer { max_over_weight, .. }
            | StackingOnPolicy::Filler { max_over_weight, .. } => *max_over_weight,
        }
    }

    fn extra_rule(&self) -> Option<&PairRule> {
        match self {
            StackingOnPolicy::Box { extra_rule, .. }
            | StackingOnPolicy::CartonContainer { extra_rule, .. }
            | StackingOnPolicy::Filler { extra_rule, .. } => extra_rule.as_ref(),
        }
    }

    /// Checks `item` resting directly on `bottom`, where `layer` and `height`
    /// describe the same-type run already beneath the item.
    pub fn enabled_stacking_on(&self, item: &ItemView, bottom: &ItemView, layer: u64, height: f64) -> bool {
        if !bottom
            .attribute()
            .over_package_types
            .contains(&item.package_type())
        {
            return false;
        }
        if let Some(rule) = self.extra_rule() {
            if !rule(item, bottom) {
                return false;
            }
        }

        let item_category = item.package_category();
        let bottom_category = bottom.package_category();
        match self {
            StackingOnPolicy::Box { max_difference, .. } => {
                if bottom_category == PackageCategory::Pallet
                    && item_category != PackageCategory::Filler
                    && !bottom.top_flat()
                {
                    return false;
                }
                if item_category != PackageCategory::Filler
                    && bottom_category != PackageCategory::Filler
                {
                    let difference =
                        (item.width() - bottom.width()).abs() + (item.depth() - bottom.depth()).abs();
                    if definitely_gt(difference, *max_difference) {
                        return false;
                    }
                }
            }
            StackingOnPolicy::CartonContainer { max_difference, .. } => {
                if item_category == PackageCategory::SoftBox
                    && bottom_category == PackageCategory::SoftBox
                {
                    let difference = (item.width() + item.depth()) - (bottom.width() + bottom.depth());
                    if definitely_gt(difference, *max_difference) {
                        return false;
                    }
                }
            }
            StackingOnPolicy::Filler { .. } => {}
        }

        if definitely_gt(item.weight() - bottom.weight(), self.max_over_weight()) {
            return false;
        }

        layer < item.max_layer() && approx_le(height + item.height(), item.max_height())
    }
}

/// Rule bundle shared by every item of one package type.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageAttribute {
    /// Package type.
    pub package_type: PackageType,
    /// Layer cap from the package itself.
    pub package_max_layer: u64,
    /// Layer cap from the load-bearing capacity.
    pub weight_max_layer: u64,
    /// Maximum height of a same-type run including the item.
    pub max_height: f64,
    /// Minimum admissible oriented depth.
    pub min_depth: f64,
    /// Maximum admissible oriented depth.
    pub max_depth: f64,
    /// Package types allowed to rest on this one.
    pub over_package_types: Vec<PackageType>,
    /// Must rest on the floor or on other bottom-only units.
    pub bottom_only: bool,
    /// The upright top face can carry other units.
    pub top_flat: bool,
    /// Layer cap for side orientations granted at the top of a stack.
    pub side_on_top_layer: u64,
    /// Layer cap for lie orientations granted at the top of a stack.
    pub lie_on_top_layer: u64,
    /// Overhang rule.
    pub hanging_policy: HangingPolicy,
    /// Supporter rule.
    pub stacking_on_policy: StackingOnPolicy,
    /// Additional orientation check.
    pub extra_orientation_rule: Option<OrientationRule>,
    /// Additional positional check.
    pub extra_stacking_rule: Option<StackingRule>,
}

impl PackageAttribute {
    /// Creates an attribute with permissive defaults.
    pub fn new(package_type: PackageType) -> Self {
        let stacking_on_policy = match package_type.category() {
            PackageCategory::SoftBox => StackingOnPolicy::carton_container(),
            PackageCategory::Filler => StackingOnPolicy::filler(),
            PackageCategory::HardBox | PackageCategory::Pallet => StackingOnPolicy::boxed(),
        };
        Self {
            package_type,
            package_max_layer: u64::MAX,
            weight_max_layer: u64::MAX,
            max_height: f64::INFINITY,
            min_depth: 0.0,
            max_depth: f64::INFINITY,
            over_package_types: PackageType::ALL.to_vec(),
            bottom_only: false,
            top_flat: true,
            side_on_top_layer: 0,
            lie_on_top_layer: 0,
            hanging_policy: HangingPolicy::default(),
            stacking_on_policy,
            extra_orientation_rule: None,
            extra_stacking_rule: None,
        }
    }

    /// Sets the package layer cap.
    pub fn with_max_layer(mut self, layer: u64) -> Self {
        self.package_max_layer = layer;
        self
    }

    /// Sets the load-bearing layer cap.
    pub fn with_weight_max_layer(mut self, layer: u64) -> Self {
        self.weight_max_layer = layer;
        self
    }

    /// Sets the run height cap.
    pub fn with_max_height(mut self, height: f64) -> Self {
        self.max_height = height;
        self
    }

    /// Sets the admissible oriented depth range.
    pub fn with_depth_range(mut self, min_depth: f64, max_depth: f64) -> Self {
        self.min_depth = min_depth;
        self.max_depth = max_depth;
        self
    }

    /// Restricts which package types may rest on this one.
    pub fn with_over_package_types(mut self, types: impl IntoIterator<Item = PackageType>) -> Self {
        self.over_package_types = types.into_iter().collect();
        self
    }

    /// Sets the bottom-only flag.
    pub fn with_bottom_only(mut self, bottom_only: bool) -> Self {
        self.bottom_only = bottom_only;
        self
    }

    /// Sets the top-flat flag.
    pub fn with_top_flat(mut self, top_flat: bool) -> Self {
        self.top_flat = top_flat;
        self
    }

    /// Allows side orientations at the top of a stack below `layer`.
    pub fn with_side_on_top_layer(mut self, layer: u64) -> Self {
        self.side_on_top_layer = layer;
        self
    }

    /// Allows lie orientations at the top of a stack below `layer`.
    pub fn with_lie_on_top_layer(mut self, layer: u64) -> Self {
        self.lie_on_top_layer = layer;
        self
    }

    /// Sets the overhang rule.
    pub fn with_hanging_policy(mut self, policy: HangingPolicy) -> Self {
        self.hanging_policy = policy;
        self
    }

    /// Sets the supporter rule.
    pub fn with_stacking_on_policy(mut self, policy: StackingOnPolicy) -> Self {
        self.stacking_on_policy = policy;
        self
    }

    /// Sets an additional orientation check.
    pub fn with_extra_orientation_rule(
        mut self,
        rule: impl Fn(&Container3Shape, Orientation) -> bool + Send + Sync + 'static,
    ) -> Self {
        let rule: Arc<dyn Fn(&Container3Shape, Orientation) -> bool + Send + Sync> = Arc::new(rule);
        self.extra_orientation_rule = Some(Rule::new(rule));
        self
    }

    /// Sets an additional positional check.
    pub fn with_extra_stacking_rule(
        mut self,
        rule: impl Fn(&ItemPlacement, &[&ItemPlacement], &[&ItemPlacement]) -> bool + Send + Sync + 'static,
    ) -> Self {
        let rule: Arc<
            dyn Fn(&ItemPlacement, &[&ItemPlacement], &[&ItemPlacement]) -> bool + Send + Sync,
        > = Arc::new(rule);
        self.extra_stacking_rule = Some(Rule::new(rule));
        self
    }

    /// Effective layer cap.
    pub fn max_layer(&self) -> u64 {
        self.package_max_layer.min(self.weight_max_layer)
    }

    /// Returns the physical category.
    pub fn package_category(&self) -> PackageCategory {
        self.package_type.category()
    }

    /// Side orientations may be granted at the top of a stack.
    pub fn enabled_side_on_top(&self) -> bool {
        self.side_on_top_layer > 0
    }

    /// Lie orientations may be granted at the top of a stack.
    pub fn enabled_lie_on_top(&self) -> bool {
        self.lie_on_top_layer > 0
    }
}
