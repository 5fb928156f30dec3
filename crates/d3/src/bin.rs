//! Bin types, bins and the layer-ordering search.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{self, AtomicBool};
use std::sync::{mpsc, Arc};
use std::thread;

use nalgebra::Point3;

use u_loading_core::geometry::{Container3Shape, Cuboid, Dimensions};
use u_loading_core::placement::Placement3;
use u_loading_core::tolerance::approx_le;
use u_loading_core::{CancellationToken, Error, Result};

use crate::attribute::Rule;
use crate::container::ItemContainer;
use crate::item::{Item, ItemPlacement, ItemView};
use crate::layer::{Layer, LayerPlacement};
use crate::permutation;

/// Whole-bin feasibility predicate over an ordered set of layer placements.
pub type BinCheckRule = Rule<dyn Fn(&BinType, &[LayerPlacement]) -> bool + Send + Sync>;

/// Caller-supplied layer ordering consulted before the built-in criteria.
pub type LayerComparator = dyn Fn(&Layer, &Layer) -> Ordering + Send + Sync;

/// Permutations buffered ahead of the consumer.
const PERMUTATION_BUFFER: usize = 16;

/// A container template: truck body, sea container or pallet footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct BinType {
    type_code: String,
    width: f64,
    height: f64,
    depth: f64,
    capacity: f64,
    longitudinal_balance: Option<f64>,
    lateral_balance: Option<f64>,
    is_main: bool,
    extra_check_rule: Option<BinCheckRule>,
}

impl BinType {
    /// Creates a bin type with unlimited capacity.
    pub fn new(type_code: impl Into<String>, width: f64, height: f64, depth: f64) -> Self {
        Self {
            type_code: type_code.into(),
            width,
            height,
            depth,
            capacity: f64::INFINITY,
            longitudinal_balance: None,
            lateral_balance: None,
            is_main: false,
            extra_check_rule: None,
        }
    }

    /// Sets the weight capacity.
    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Limits how far the center of gravity may drift from the middle of
    /// the depth axis.
    pub fn with_longitudinal_balance(mut self, limit: f64) -> Self {
        self.longitudinal_balance = Some(limit);
        self
    }

    /// Limits how far the center of gravity may drift from the middle of
    /// the width axis.
    pub fn with_lateral_balance(mut self, limit: f64) -> Self {
        self.lateral_balance = Some(limit);
        self
    }

    /// Marks the bin type as the main one of a fleet.
    pub fn with_main(mut self, is_main: bool) -> Self {
        self.is_main = is_main;
        self
    }

    /// Sets the whole-bin feasibility predicate used by [`program`](Self::program).
    pub fn with_extra_check_rule(
        mut self,
        rule: impl Fn(&BinType, &[LayerPlacement]) -> bool + Send + Sync + 'static,
    ) -> Self {
        let rule: Arc<dyn Fn(&BinType, &[LayerPlacement]) -> bool + Send + Sync> = Arc::new(rule);
        self.extra_check_rule = Some(Rule::new(rule));
        self
    }

    /// Returns the type code.
    pub fn type_code(&self) -> &str {
        &self.type_code
    }

    /// Returns the weight capacity.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Returns the longitudinal balance limit.
    pub fn longitudinal_balance(&self) -> Option<f64> {
        self.longitudinal_balance
    }

    /// Returns the lateral balance limit.
    pub fn lateral_balance(&self) -> Option<f64> {
        self.lateral_balance
    }

    /// Returns true for the main bin type.
    pub fn is_main(&self) -> bool {
        self.is_main
    }

    /// Returns the inner space.
    pub fn shape(&self) -> Container3Shape {
        Container3Shape::new(self.width, self.height, self.depth)
    }

    /// Validates the bin type.
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 || self.depth <= 0.0 {
            return Err(Error::InvalidBoundary(format!(
                "bin type {} must have positive dimensions, got {}x{}x{}",
                self.type_code, self.width, self.height, self.depth
            )));
        }
        if self.capacity <= 0.0 {
            return Err(Error::InvalidBoundary(format!(
                "bin type {} must have a positive capacity, got {}",
                self.type_code, self.capacity
            )));
        }
        for limit in [self.longitudinal_balance, self.lateral_balance].into_iter().flatten() {
            if limit < 0.0 {
                return Err(Error::InvalidBoundary(format!(
                    "bin type {} has a negative balance limit {}",
                    self.type_code, limit
                )));
            }
        }
        Ok(())
    }

    /// Returns true if `unit` fits the inner space and the capacity.
    pub fn enabled<C: Cuboid + ?Sized>(&self, unit: &C) -> bool {
        self.shape().enabled(unit) && approx_le(unit.weight(), self.capacity)
    }

    /// Returns true if the positioned `unit` stays inside the bin and
    /// within the capacity.
    pub fn enabled_placement<T: Cuboid>(&self, unit: &Placement3<T>) -> bool {
        unit.x() >= 0.0
            && unit.y() >= 0.0
            && unit.z() >= 0.0
            && approx_le(unit.max_x(), self.width)
            && approx_le(unit.max_y(), self.height)
            && approx_le(unit.max_z(), self.depth)
            && approx_le(unit.weight(), self.capacity)
    }

    /// Lower bound on the number of bins needed for the given totals.
    pub fn estimate_amount(&self, total_volume: f64, total_weight: f64, loading_rate: f64) -> f64 {
        let by_volume = if loading_rate > 0.0 {
            total_volume / self.volume() / loading_rate
        } else {
            f64::INFINITY
        };
        by_volume.max(total_weight / self.capacity)
    }

    /// Returns true if the weighted center of `items` stays within the
    /// balance limits around the middle of the floor.
    pub fn balanced(&self, items: &[ItemPlacement]) -> bool {
        let weight: f64 = items.iter().map(|p| p.unit.weight()).sum();
        if weight <= 0.0 {
            return true;
        }
        let center = |position: fn(&ItemPlacement) -> f64| {
            items.iter().map(|p| position(p) * p.unit.weight()).sum::<f64>() / weight
        };
        let longitudinal = self.longitudinal_balance.map_or(true, |limit| {
            approx_le((center(|p| p.z() + p.unit.depth() / 2.0) - self.depth / 2.0).abs(), limit)
        });
        let lateral = self.lateral_balance.map_or(true, |limit| {
            approx_le((center(|p| p.x() + p.unit.width() / 2.0) - self.width / 2.0).abs(), limit)
        });
        longitudinal && lateral
    }

    /// Runs the extra check rule, if any.
    pub fn check(&self, placements: &[LayerPlacement]) -> bool {
        self.extra_check_rule
            .as_ref()
            .map_or(true, |rule| rule(self, placements))
    }

    /// Orders `layers` along the depth of the bin.
    ///
    /// Returns the first arrangement, in permutation order of the sorted
    /// layers, that passes the extra check rule (or the very first one when
    /// `with_check` is false). Returns `None` if no arrangement passes.
    pub fn program(
        &self,
        layers: &[Arc<Layer>],
        with_check: bool,
        comparator: Option<&LayerComparator>,
    ) -> Option<Vec<LayerPlacement>> {
        self.program_with_token(layers, with_check, comparator, &CancellationToken::new())
    }

    /// Same as [`program`](Self::program), stopping early once `token` is
    /// cancelled. A stored winner is returned even after cancellation.
    pub fn program_with_token(
        &self,
        layers: &[Arc<Layer>],
        with_check: bool,
        comparator: Option<&LayerComparator>,
        token: &CancellationToken,
    ) -> Option<Vec<LayerPlacement>> {
        let mut sorted = layers.to_vec();
        sorted.sort_by(|lhs, rhs| compare_layers(lhs, rhs, comparator));

        let stop = AtomicBool::new(false);
        let (sender, receiver) = mpsc::sync_channel(PERMUTATION_BUFFER);
        let count = sorted.len();

        let state = thread::scope(|s| {
            s.spawn(|| permutation::produce(count, sender, &stop, token));

            let mut tried = 0usize;
            let mut state = SearchState::Searching;
            for order in receiver.iter() {
                if token.is_cancelled() {
                    state = SearchState::Cancelled;
                    break;
                }
                tried += 1;
                let placements = stack(&sorted, &order);
                if !with_check || self.check(&placements) {
                    state = SearchState::Found(placements);
                    break;
                }
            }
            if matches!(state, SearchState::Searching) {
                state = SearchState::Exhausted;
            }
            // winner is already in `state`
            stop.store(true, atomic::Ordering::Relaxed);
            drop(receiver);
            log::debug!(
                "bin {}: {} after {} permutations of {} layers",
                self,
                state,
                tried,
                count
            );
            state
        });

        match state {
            SearchState::Found(placements) => Some(placements),
            SearchState::Searching | SearchState::Exhausted | SearchState::Cancelled => None,
        }
    }
}

#[derive(Debug)]
enum SearchState {
    Searching,
    Found(Vec<LayerPlacement>),
    Exhausted,
    Cancelled,
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchState::Searching => write!(f, "searching"),
            SearchState::Found(_) => write!(f, "found"),
            SearchState::Exhausted => write!(f, "exhausted"),
            SearchState::Cancelled => write!(f, "cancelled"),
        }
    }
}

fn stack(layers: &[Arc<Layer>], order: &[usize]) -> Vec<LayerPlacement> {
    let mut z = 0.0;
    order
        .iter()
        .map(|&index| {
            let layer = Arc::clone(&layers[index]);
            let depth = layer.depth();
            let placement = Placement3::new(layer, Point3::new(0.0, 0.0, z));
            z += depth;
            placement
        })
        .collect()
}

/// Built-in layer order: caller comparator, ascending minimal package type,
/// bottom-only first, descending bottom-required height, descending loading
/// rate.
pub fn compare_layers(lhs: &Layer, rhs: &Layer, comparator: Option<&LayerComparator>) -> Ordering {
    comparator
        .map_or(Ordering::Equal, |compare| compare(lhs, rhs))
        .then_with(|| match (lhs.package_type(), rhs.package_type()) {
            (Some(l), Some(r)) => l.cmp(&r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| rhs.bottom_only().cmp(&lhs.bottom_only()))
        .then_with(|| rhs.bottom_required_height().total_cmp(&lhs.bottom_required_height()))
        .then_with(|| rhs.loading_rate().total_cmp(&lhs.loading_rate()))
}

impl Dimensions for BinType {
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

impl fmt::Display for BinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}*{}*{}", self.type_code, self.width, self.height, self.depth)
    }
}

/// A bin type filled with placements.
#[derive(Debug, Clone)]
pub struct Bin<T> {
    shape: BinType,
    units: Vec<Placement3<T>>,
    batch_no: Option<String>,
}

/// A bin filled with layers.
pub type LayerBin = Bin<Arc<Layer>>;

/// A bin filled with items.
pub type ItemBin = Bin<ItemView>;

impl<T> Bin<T> {
    /// Creates a bin.
    pub fn new(shape: BinType, units: Vec<Placement3<T>>) -> Self {
        Self {
            shape,
            units,
            batch_no: None,
        }
    }

    /// Tags the bin with a batch number.
    pub fn with_batch_no(mut self, batch_no: impl Into<String>) -> Self {
        self.batch_no = Some(batch_no.into());
        self
    }

    /// Returns the bin type.
    pub fn shape(&self) -> &BinType {
        &self.shape
    }

    /// Returns the placements.
    pub fn units(&self) -> &[Placement3<T>] {
        &self.units
    }

    /// Returns the batch number.
    pub fn batch_no(&self) -> Option<&str> {
        self.batch_no.as_deref()
    }

    /// Returns the weight capacity.
    pub fn capacity(&self) -> f64 {
        self.shape.capacity
    }
}

impl<T: Cuboid> Bin<T> {
    /// Total weight of the contents.
    pub fn weight(&self) -> f64 {
        self.units.iter().map(|p| p.unit.weight()).sum()
    }

    /// Share of the bin volume occupied by goods.
    pub fn loading_rate(&self) -> f64 {
        let volume = self.shape.volume();
        if volume > 0.0 {
            self.units.iter().map(|p| p.unit.actual_volume()).sum::<f64>() / volume
        } else {
            0.0
        }
    }

    /// Returns true if every placement stays inside the bin and the total
    /// weight fits the capacity.
    pub fn enabled(&self) -> bool {
        self.units.iter().all(|p| self.shape.enabled_placement(p))
            && approx_le(self.weight(), self.shape.capacity)
    }
}

impl<T: ItemContainer> Bin<Arc<T>> {
    /// Resolves every item to its absolute position through the container
    /// offsets.
    pub fn dump(&self) -> ItemBin {
        Bin {
            shape: self.shape.clone(),
            units: self.items(),
            batch_no: self.batch_no.clone(),
        }
    }

    /// Absolute item placements.
    pub fn items(&self) -> Vec<ItemPlacement> {
        self.units
            .iter()
            .flat_map(|p| p.unit.dump(&p.position))
            .collect()
    }

    /// Number of placements per item.
    pub fn amounts(&self) -> HashMap<Arc<Item>, u64> {
        count_items(&self.items())
    }
}

impl ItemBin {
    /// Number of placements per item.
    pub fn amounts(&self) -> HashMap<Arc<Item>, u64> {
        count_items(&self.units)
    }

    /// Number of placements of `item`.
    pub fn amount(&self, item: &Item) -> u64 {
        self.units
            .iter()
            .filter(|p| p.unit.item().as_ref() == item)
            .count() as u64
    }
}

fn count_items(items: &[ItemPlacement]) -> HashMap<Arc<Item>, u64> {
    let mut amounts = HashMap::new();
    for placement in items {
        *amounts.entry(Arc::clone(placement.unit.item())).or_insert(0) += 1;
    }
    amounts
}

/// Number of bins per bin type code.
pub fn group_bins<T>(bins: &[Bin<T>]) -> HashMap<String, u64> {
    let mut groups = HashMap::new();
    for bin in bins {
        *groups.entry(bin.shape.type_code.clone()).or_insert(0) += 1;
    }
    groups
}

/// Total item amounts over a set of item bins.
pub fn unpack_bins(bins: &[ItemBin]) -> HashMap<Arc<Item>, u64> {
    let mut amounts = HashMap::new();
    for bin in bins {
        for (item, amount) in bin.amounts() {
            *amounts.entry(item).or_insert(0) += amount;
        }
    }
    amounts
}

/// Compares two bin plans: fewer bins first, then the lower minimal
/// loading rate.
pub fn compare_bin_sets<T: Cuboid>(lhs: &[Bin<T>], rhs: &[Bin<T>]) -> Ordering {
    lhs.len().cmp(&rhs.len()).then_with(|| {
        if lhs.is_empty() || rhs.is_empty() {
            return Ordering::Equal;
        }
        let min_rate = |bins: &[Bin<T>]| bins.iter().map(Bin::loading_rate).fold(f64::INFINITY, f64::min);
        min_rate(lhs).total_cmp(&min_rate(rhs))
    })
}
