//! Items and their oriented views.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use u_loading_core::geometry::{Container3Shape, Cuboid, Dimensions, Orientation, OrientationCategory};
use u_loading_core::placement::Placement3;
use u_loading_core::tolerance::{approx_ge, approx_le};
use u_loading_core::{Error, Result};

use crate::attribute::PackageAttribute;
use crate::package::{PackageCategory, PackageType};

/// An item placed in a container, relative to its parent.
pub type ItemPlacement = Placement3<ItemView>;

/// Remaining amount per item.
pub type Inventory = Vec<(Arc<Item>, u64)>;

/// Sums the amounts of an inventory.
pub fn total_amount(inventory: &[(Arc<Item>, u64)]) -> u64 {
    inventory.iter().map(|(_, amount)| *amount).sum()
}

/// An immutable box to be loaded.
#[derive(Debug, Clone)]
pub struct Item {
    id: String,
    name: String,
    width: f64,
    height: f64,
    depth: f64,
    weight: f64,
    enabled_orientations: Vec<Orientation>,
    attribute: Arc<PackageAttribute>,
    batch_no: Option<String>,
    warehouse: Option<String>,
}

impl Item {
    /// Creates an upright carton with the given unoriented extent.
    pub fn new(id: impl Into<String>, width: f64, height: f64, depth: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            width,
            height,
            depth,
            weight: 0.0,
            enabled_orientations: vec![Orientation::Upright, Orientation::UprightRotated],
            attribute: Arc::new(PackageAttribute::new(PackageType::CartonContainer)),
            batch_no: None,
            warehouse: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the orientations the item may be loaded in.
    pub fn with_orientations(mut self, orientations: impl IntoIterator<Item = Orientation>) -> Self {
        self.enabled_orientations = orientations.into_iter().collect();
        self
    }

    /// Sets the package attribute.
    pub fn with_attribute(mut self, attribute: impl Into<Arc<PackageAttribute>>) -> Self {
        self.attribute = attribute.into();
        self
    }

    /// Sets the batch number.
    pub fn with_batch_no(mut self, batch_no: impl Into<String>) -> Self {
        self.batch_no = Some(batch_no.into());
        self
    }

    /// Sets the source warehouse.
    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse = Some(warehouse.into());
        self
    }

    /// Returns the identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the batch number.
    pub fn batch_no(&self) -> Option<&str> {
        self.batch_no.as_deref()
    }

    /// Returns the source warehouse.
    pub fn warehouse(&self) -> Option<&str> {
        self.warehouse.as_deref()
    }

    /// Returns the orientations the item may be loaded in.
    pub fn enabled_orientations(&self) -> &[Orientation] {
        &self.enabled_orientations
    }

    /// Returns the package attribute.
    pub fn attribute(&self) -> &PackageAttribute {
        &self.attribute
    }

    /// Returns the package type.
    pub fn package_type(&self) -> PackageType {
        self.attribute.package_type
    }

    /// Returns the package category.
    pub fn package_category(&self) -> PackageCategory {
        self.attribute.package_category()
    }

    /// Returns the effective layer cap.
    pub fn max_layer(&self) -> u64 {
        self.attribute.max_layer()
    }

    /// Returns the run height cap.
    pub fn max_height(&self) -> f64 {
        self.attribute.max_height
    }

    /// Returns true if the item must stay at the bottom.
    pub fn bottom_only(&self) -> bool {
        self.attribute.bottom_only
    }

    /// Returns true if the upright top face can carry other units.
    pub fn top_flat(&self) -> bool {
        self.attribute.top_flat
    }

    /// Orientations admissible inside `space`.
    ///
    /// Near the top of a stack (no more room than the upright height) the
    /// conditional side/lie orientations join the enabled set.
    pub fn enabled_orientations_at(&self, space: &Container3Shape, with_rotation: bool) -> Vec<Orientation> {
        let mut candidates = self.enabled_orientations.clone();
        if approx_le(space.height, self.height) {
            if self.attribute.enabled_side_on_top() {
                candidates.extend([Orientation::Side, Orientation::SideRotated]);
            }
            if self.attribute.enabled_lie_on_top() {
                candidates.extend([Orientation::Lie, Orientation::LieRotated]);
            }
        }

        let mut admissible: Vec<Orientation> = Vec::with_capacity(candidates.len());
        for orientation in candidates {
            if admissible.contains(&orientation) || (!with_rotation && orientation.is_rotated()) {
                continue;
            }
            let (width, height, depth) = orientation.dimensions(self.width, self.height, self.depth);
            if !space.fits(width, height, depth) {
                continue;
            }
            if !approx_ge(depth, self.attribute.min_depth) || !approx_le(depth, self.attribute.max_depth) {
                continue;
            }
            if let Some(rule) = &self.attribute.extra_orientation_rule {
                if !rule(space, orientation) {
                    continue;
                }
            }
            admissible.push(orientation);
        }
        admissible
    }

    /// Validates the item.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::InvalidGeometry("item id must not be empty".to_string()));
        }
        for (label, value) in [("width", self.width), ("height", self.height), ("depth", self.depth)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidGeometry(format!(
                    "{} of item '{}' must be positive and finite, got {}",
                    label, self.id, value
                )));
            }
        }
        if !(self.weight.is_finite() && self.weight >= 0.0) {
            return Err(Error::InvalidGeometry(format!(
                "weight of item '{}' must be non-negative, got {}",
                self.id, self.weight
            )));
        }
        if self.enabled_orientations.is_empty() {
            return Err(Error::InvalidGeometry(format!(
                "item '{}' has no enabled orientation",
                self.id
            )));
        }
        Ok(())
    }
}

impl Dimensions for Item {
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

impl Cuboid for Item {
    fn weight(&self) -> f64 {
        self.weight
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.width == other.width
            && self.height == other.height
            && self.depth == other.depth
            && self.weight == other.weight
            && self.enabled_orientations == other.enabled_orientations
            && (Arc::ptr_eq(&self.attribute, &other.attribute) || self.attribute == other.attribute)
            && self.batch_no == other.batch_no
            && self.warehouse == other.warehouse
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        for value in [self.width, self.height, self.depth, self.weight] {
            canonical_bits(value).hash(state);
        }
        self.attribute.package_type.hash(state);
    }
}

/// Bit pattern that agrees with `==`: both zeros hash alike.
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Package type plus orientation family; items of the same type form
/// contiguous runs when stacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemType {
    /// Package type.
    pub package_type: PackageType,
    /// Orientation family.
    pub orientation: OrientationCategory,
}

/// An item bound to one orientation.
#[derive(Debug, Clone)]
pub struct ItemView {
    item: Arc<Item>,
    orientation: Orientation,
}

impl ItemView {
    /// Binds `item` to `orientation`.
    pub fn new(item: Arc<Item>, orientation: Orientation) -> Self {
        Self { item, orientation }
    }

    /// Binds `item` upright.
    pub fn upright(item: Arc<Item>) -> Self {
        Self::new(item, Orientation::Upright)
    }

    /// Returns the underlying item.
    pub fn item(&self) -> &Arc<Item> {
        &self.item
    }

    /// Returns the orientation.
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Returns the package attribute.
    pub fn attribute(&self) -> &PackageAttribute {
        self.item.attribute()
    }

    /// Returns the package type.
    pub fn package_type(&self) -> PackageType {
        self.item.package_type()
    }

    /// Returns the package category.
    pub fn package_category(&self) -> PackageCategory {
        self.item.package_category()
    }

    /// Returns the stacking-run type.
    pub fn item_type(&self) -> ItemType {
        ItemType {
            package_type: self.package_type(),
            orientation: self.orientation.category(),
        }
    }

    /// Returns true if the orientation is in the item's enabled set, as
    /// opposed to one granted only at the top of a stack.
    pub fn is_enabled(&self) -> bool {
        self.item.enabled_orientations.contains(&self.orientation)
    }

    /// Returns true if the top face can carry other units.
    pub fn top_flat(&self) -> bool {
        match self.orientation.category() {
            OrientationCategory::Upright => self.item.top_flat(),
            OrientationCategory::Side | OrientationCategory::Lie => self.is_enabled(),
        }
    }

    /// Effective layer cap for this orientation.
    pub fn max_layer(&self) -> u64 {
        if self.top_flat() {
            return self.item.max_layer();
        }
        match self.orientation.category() {
            OrientationCategory::Side => self.attribute().side_on_top_layer,
            OrientationCategory::Lie => self.attribute().lie_on_top_layer,
            OrientationCategory::Upright => 1,
        }
    }

    /// Returns the run height cap.
    pub fn max_height(&self) -> f64 {
        self.item.max_height()
    }

    /// Returns true if the item must stay at the bottom.
    pub fn bottom_only(&self) -> bool {
        self.item.bottom_only()
    }

    /// The same item turned a quarter around the vertical axis, if that
    /// orientation is enabled.
    pub fn rotation(&self) -> Option<ItemView> {
        let rotated = self.orientation.rotation();
        if self.item.enabled_orientations.contains(&rotated) {
            Some(ItemView::new(Arc::clone(&self.item), rotated))
        } else {
            None
        }
    }
}

impl Dimensions for ItemView {
    fn width(&self) -> f64 {
        self.orientation
            .dimensions(self.item.width, self.item.height, self.item.depth)
            .0
    }

    fn height(&self) -> f64 {
        self.orientation
            .dimensions(self.item.width, self.item.height, self.item.depth)
            .1
    }

    fn depth(&self) -> f64 {
        self.orientation
            .dimensions(self.item.width, self.item.height, self.item.depth)
            .2
    }
}

impl Cuboid for ItemView {
    fn weight(&self) -> f64 {
        self.item.weight
    }
}

impl PartialEq for ItemView {
    fn eq(&self, other: &Self) -> bool {
        self.orientation == other.orientation
            && (Arc::ptr_eq(&self.item, &other.item) || self.item == other.item)
    }
}

impl Eq for ItemView {}

impl Hash for ItemView {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.item.hash(state);
        self.orientation.hash(state);
    }
}

impl fmt::Display for ItemView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.item, self.orientation)
    }
}
