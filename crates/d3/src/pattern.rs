//! Pattern-based footprint generation.
//!
//! A pattern template is an ordered list of [`Step`]s, one per footprint
//! slot on the container floor. Each slot receives a pile: a mixed pile of
//! two or three items whose heights add up close to the container height,
//! or a pile of one item. The generator fills all slots of a template,
//! emits the filled template as one footprint, takes the consumed items out
//! of the inventory and starts over until nothing more can be placed.
//!
//! Templates run concurrently, one producer thread each, and feed one
//! stream. The first logic error stops every producer and is returned.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use u_loading_d3::{left_upper, right_bottom, Item, Pattern, PatternConfig, Step};
//! use u_loading_core::{Container3Shape, ProjectivePlane};
//!
//! let item = Arc::new(Item::new("A", 400.0, 500.0, 600.0).with_weight(20.0));
//! let template = vec![
//!     Step::new(ProjectivePlane::Front),
//!     Step::new(ProjectivePlane::Front).with_next_point(right_bottom),
//!     Step::new(ProjectivePlane::Side).with_next_point(left_upper),
//! ];
//! let footprints = Pattern::new(vec![template]).place(
//!     &[(item, 30)],
//!     &Container3Shape::new(1200.0, 2000.0, 1600.0),
//!     1000.0,
//!     &[],
//!     None,
//!     &PatternConfig::default(),
//! )?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use nalgebra::Point2;

use u_loading_core::geometry::{Container3Shape, Cuboid, Dimensions, ProjectivePlane};
use u_loading_core::placement::{Placement2, Projection};
use u_loading_core::tolerance::{approx_eq, approx_ge, approx_le, definitely_gt, whole_count};
use u_loading_core::{CancellationToken, Error, Result};

use crate::bin::BinType;
use crate::block::same_arrangement;
use crate::height_combinator::{HeightCombinator, HeightGroups};
use crate::item::{Item, ItemPlacement, ItemView};

/// Ratio between the running per-slot weight and the per-slot weight still
/// available above which slots are filled to equalize weight.
pub const WEIGHT_BALANCE_FACTOR: f64 = 2.0;

/// A pile placed on the container floor.
pub type ItemPlacement2 = Placement2<ItemView>;

/// Computes the anchor of the next slot from the projection to place and
/// the slots filled so far.
pub type NextPointFn = Arc<dyn Fn(&Projection<ItemView>, &[ItemPlacement2]) -> Point2<f64> + Send + Sync>;

/// Filter applied to inventory items before generation.
pub type ItemPredicate = dyn Fn(&Item) -> bool + Send + Sync;

/// Search tunables for [`Pattern::place`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatternConfig {
    /// Maximum number of items in one pile.
    pub with_piling: u64,
    /// Emit footprints whose slots are only partly filled.
    pub with_remainder: bool,
    /// See [`WEIGHT_BALANCE_FACTOR`].
    pub weight_balance_factor: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            with_piling: u64::MAX,
            with_remainder: false,
            weight_balance_factor: WEIGHT_BALANCE_FACTOR,
        }
    }
}

impl PatternConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum pile size.
    pub fn with_piling(mut self, piling: u64) -> Self {
        self.with_piling = piling;
        self
    }

    /// Accepts partly filled footprints.
    pub fn with_remainder(mut self, remainder: bool) -> Self {
        self.with_remainder = remainder;
        self
    }

    /// Sets the weight balancing factor.
    pub fn with_weight_balance_factor(mut self, factor: f64) -> Self {
        self.weight_balance_factor = factor;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.with_piling == 0 {
            return Err(Error::ConfigError("piling must allow at least one item per pile".to_string()));
        }
        if !(self.weight_balance_factor.is_finite() && self.weight_balance_factor > 0.0) {
            return Err(Error::ConfigError(format!(
                "weight balance factor must be positive and finite, got {}",
                self.weight_balance_factor
            )));
        }
        Ok(())
    }
}

/// One footprint slot of a template.
#[derive(Clone)]
pub struct Step {
    length_orientation: ProjectivePlane,
    next_point: Option<NextPointFn>,
}

impl Step {
    /// Creates a slot anchored at the origin.
    ///
    /// `length_orientation` picks how items are turned: [`ProjectivePlane::Front`]
    /// puts the longer floor side along the depth, [`ProjectivePlane::Side`]
    /// along the width.
    pub fn new(length_orientation: ProjectivePlane) -> Self {
        Self {
            length_orientation,
            next_point: None,
        }
    }

    /// Anchors the slot where `next_point` says, given the earlier slots.
    pub fn with_next_point(
        mut self,
        next_point: impl Fn(&Projection<ItemView>, &[ItemPlacement2]) -> Point2<f64> + Send + Sync + 'static,
    ) -> Self {
        let next_point: NextPointFn = Arc::new(next_point);
        self.next_point = Some(next_point);
        self
    }

    /// Returns the length orientation.
    pub fn length_orientation(&self) -> ProjectivePlane {
        self.length_orientation
    }

    /// Places `projection` as slot `index` after `placements`.
    pub fn generate_placement(
        &self,
        projection: Projection<ItemView>,
        placements: &[ItemPlacement2],
        index: usize,
    ) -> Result<ItemPlacement2> {
        let point = if index == 0 {
            Point2::origin()
        } else {
            let next_point = self.next_point.as_ref().ok_or_else(|| {
                Error::Logic(format!("slot {} has no anchor rule", index))
            })?;
            next_point(&projection, placements)
        };
        Ok(Placement2::new(projection, point))
    }

    /// First enabled orientation of `item` that matches the length
    /// orientation, if any.
    pub fn pattern_view(&self, item: &Arc<Item>) -> Result<Option<ItemView>> {
        self.ensure_orientable()?;
        for &orientation in item.enabled_orientations() {
            let view = ItemView::new(Arc::clone(item), orientation);
            let length = ProjectivePlane::Bottom.length(&view);
            let width = ProjectivePlane::Bottom.width(&view);
            let matched = match self.length_orientation {
                ProjectivePlane::Front => approx_ge(length, width),
                _ => approx_le(length, width),
            };
            if matched {
                return Ok(Some(view));
            }
        }
        Ok(None)
    }

    /// Mixed pile of `views`, first one lowest.
    pub fn multi_pile_projection(&self, views: Vec<ItemView>) -> Projection<ItemView> {
        Projection::MultiPile {
            views,
            plane: ProjectivePlane::Bottom,
        }
    }

    fn ensure_orientable(&self) -> Result<()> {
        match self.length_orientation {
            ProjectivePlane::Front | ProjectivePlane::Side => Ok(()),
            ProjectivePlane::Bottom => Err(Error::Logic(
                "a slot cannot orient item length along the floor normal".to_string(),
            )),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("length_orientation", &self.length_orientation)
            .field("next_point", &self.next_point.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Anchors the next slot right after the ground row, along the depth.
pub fn right_bottom(_projection: &Projection<ItemView>, placements: &[ItemPlacement2]) -> Point2<f64> {
    let x = placements
        .iter()
        .filter(|p| approx_eq(p.y(), 0.0))
        .map(|p| p.max_x())
        .fold(0.0, f64::max);
    Point2::new(x, 0.0)
}

/// Anchors the next slot on the row above the ground row, behind every
/// slot that reaches into that row.
pub fn left_upper(projection: &Projection<ItemView>, placements: &[ItemPlacement2]) -> Point2<f64> {
    let y = placements
        .iter()
        .filter(|p| approx_eq(p.y(), 0.0))
        .map(|p| p.max_y())
        .fold(0.0, f64::max);
    let top = placements
        .iter()
        .map(|p| p.max_y())
        .fold(y + projection.width(), f64::max);
    let x = placements
        .iter()
        .filter(|p| approx_le(p.y(), top) && definitely_gt(p.max_y(), y))
        .map(|p| p.max_x())
        .fold(0.0, f64::max);
    Point2::new(x, y)
}

/// A footprint generator: templates plus the floor-size window of the
/// items it accepts.
#[derive(Debug, Clone)]
pub struct Pattern {
    bottom_length_range: RangeInclusive<f64>,
    bottom_width_range: RangeInclusive<f64>,
    templates: Vec<Vec<Step>>,
    combinator: HeightCombinator,
}

impl Default for Pattern {
    fn default() -> Self {
        Self {
            bottom_length_range: 0.0..=f64::INFINITY,
            bottom_width_range: 0.0..=f64::INFINITY,
            templates: Vec::new(),
            combinator: HeightCombinator::default(),
        }
    }
}

impl Pattern {
    /// Creates a pattern with default templates.
    pub fn new(templates: Vec<Vec<Step>>) -> Self {
        Self {
            templates,
            ..Self::default()
        }
    }

    /// Accepts only items whose longer floor side lies in `range`.
    pub fn with_bottom_length_range(mut self, range: RangeInclusive<f64>) -> Self {
        self.bottom_length_range = range;
        self
    }

    /// Accepts only items whose shorter floor side lies in `range`.
    pub fn with_bottom_width_range(mut self, range: RangeInclusive<f64>) -> Self {
        self.bottom_width_range = range;
        self
    }

    /// Sets the height combinator used for mixed piles.
    pub fn with_combinator(mut self, combinator: HeightCombinator) -> Self {
        self.combinator = combinator;
        self
    }

    /// Returns the default templates.
    pub fn templates(&self) -> &[Vec<Step>] {
        &self.templates
    }

    /// Generates footprints for `space` from `inventory`.
    ///
    /// `templates` overrides the default templates when not empty. Each
    /// footprint holds at most `rest_weight` and fits the space; identical
    /// footprints from different templates are reported once.
    pub fn place(
        &self,
        inventory: &[(Arc<Item>, u64)],
        space: &Container3Shape,
        rest_weight: f64,
        templates: &[Vec<Step>],
        predicate: Option<&ItemPredicate>,
        config: &PatternConfig,
    ) -> Result<Vec<Vec<ItemPlacement>>> {
        self.place_with_token(
            inventory,
            space,
            rest_weight,
            templates,
            predicate,
            config,
            &CancellationToken::new(),
        )
    }

    /// Same as [`place`](Self::place) for a bin type, bounded by its space
    /// and capacity.
    pub fn place_bin(
        &self,
        inventory: &[(Arc<Item>, u64)],
        bin_type: &BinType,
        templates: &[Vec<Step>],
        predicate: Option<&ItemPredicate>,
        config: &PatternConfig,
    ) -> Result<Vec<Vec<ItemPlacement>>> {
        self.place(
            inventory,
            &bin_type.shape(),
            bin_type.capacity(),
            templates,
            predicate,
            config,
        )
    }

    /// Same as [`place`](Self::place), stopping early once `token` is
    /// cancelled. Footprints received before the cancellation are returned.
    #[allow(clippy::too_many_arguments)]
    pub fn place_with_token(
        &self,
        inventory: &[(Arc<Item>, u64)],
        space: &Container3Shape,
        rest_weight: f64,
        templates: &[Vec<Step>],
        predicate: Option<&ItemPredicate>,
        config: &PatternConfig,
        token: &CancellationToken,
    ) -> Result<Vec<Vec<ItemPlacement>>> {
        config.validate()?;
        let templates = if templates.is_empty() {
            self.templates.as_slice()
        } else {
            templates
        };

        let candidates = self.candidates(inventory, space, predicate)?;
        if candidates.is_empty() || templates.is_empty() {
            log::debug!(
                "pattern generation skipped: {} candidates, {} templates",
                candidates.len(),
                templates.len()
            );
            return Ok(Vec::new());
        }

        let groups = HeightGroups::new(candidates.iter().map(|(item, _)| Arc::clone(item)));
        let heights = groups.heights();
        let (two_sums, three_sums) = match config.with_piling {
            0 | 1 => (Vec::new(), Vec::new()),
            2 => (self.combinator.two_sum(space.height, &heights), Vec::new()),
            _ => (
                self.combinator.two_sum(space.height, &heights),
                self.combinator.three_sum(space.height, &heights),
            ),
        };
        log::debug!(
            "pattern generation started: {} candidates, {} templates, {} pairs, {} triples",
            candidates.len(),
            templates.len(),
            two_sums.len(),
            three_sums.len()
        );

        let stop = AtomicBool::new(false);
        let generator = Generator {
            candidates: &candidates,
            groups: &groups,
            two_sums: &two_sums,
            three_sums: &three_sums,
            space,
            rest_weight,
            config,
            combinator: &self.combinator,
            stop: &stop,
            token,
        };
        let (sender, receiver) = mpsc::channel::<Result<Vec<ItemPlacement2>>>();

        let outcome = thread::scope(|s| {
            for (index, template) in templates.iter().enumerate() {
                let sender = sender.clone();
                let generator = &generator;
                s.spawn(move || generator.run(index, template, &sender));
            }
            drop(sender);

            let mut results: Vec<Vec<ItemPlacement>> = Vec::new();
            for message in receiver.iter() {
                let wave = match message {
                    Ok(wave) => wave,
                    Err(error) => {
                        stop.store(true, Ordering::Relaxed);
                        log::warn!("pattern generation aborted: {}", error);
                        return Err(error);
                    }
                };
                let placements: Vec<ItemPlacement> = wave.iter().flat_map(|p| p.to_placement3(0.0)).collect();
                if !fits(&placements, space) {
                    continue;
                }
                if results.iter().any(|known| same_arrangement(known, &placements)) {
                    continue;
                }
                results.push(placements);
            }
            Ok(results)
        });

        if let Ok(results) = &outcome {
            log::debug!("pattern generation finished: {} footprints", results.len());
        }
        outcome
    }

    fn candidates(
        &self,
        inventory: &[(Arc<Item>, u64)],
        space: &Container3Shape,
        predicate: Option<&ItemPredicate>,
    ) -> Result<Vec<(Arc<Item>, u64)>> {
        let mut candidates = Vec::new();
        for (item, amount) in inventory {
            if *amount == 0 || !predicate.map_or(true, |accept| accept(item.as_ref())) {
                continue;
            }
            item.validate()?;
            let length = ProjectivePlane::Bottom.length(item.as_ref());
            let width = ProjectivePlane::Bottom.width(item.as_ref());
            if self.bottom_length_range.contains(&length.max(width))
                && self.bottom_width_range.contains(&length.min(width))
            {
                candidates.push((Arc::clone(item), *amount));
            }
        }
        // most wasted height first
        candidates.sort_by(|a, b| wasted_height(&b.0, b.1, space).total_cmp(&wasted_height(&a.0, a.1, space)));
        Ok(candidates)
    }
}

/// Height left unused in `space` by one pile of as many copies as the item
/// itself allows.
fn wasted_height(item: &Item, amount: u64, space: &Container3Shape) -> f64 {
    let layers = whole_count(space.height, item.height())
        .min(item.max_layer())
        .min(whole_count(item.max_height(), item.height()))
        .min(amount);
    space.height - layers as f64 * item.height()
}

fn fits(placements: &[ItemPlacement], space: &Container3Shape) -> bool {
    placements
        .iter()
        .all(|p| approx_le(p.max_z(), space.depth) && approx_le(p.max_x(), space.width))
}

/// Shared, read-only state of one generation run.
struct Generator<'a> {
    candidates: &'a [(Arc<Item>, u64)],
    groups: &'a HeightGroups,
    two_sums: &'a [(f64, f64)],
    three_sums: &'a [(f64, f64, f64)],
    space: &'a Container3Shape,
    rest_weight: f64,
    config: &'a PatternConfig,
    combinator: &'a HeightCombinator,
    stop: &'a AtomicBool,
    token: &'a CancellationToken,
}

impl Generator<'_> {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || self.token.is_cancelled()
    }

    /// Produces waves for one template until the inventory or the template
    /// runs dry.
    fn run(&self, index: usize, template: &[Step], sender: &mpsc::Sender<Result<Vec<ItemPlacement2>>>) {
        let mut amounts: HashMap<Arc<Item>, u64> = self.candidates.iter().cloned().collect();
        loop {
            if self.stopped() {
                log::trace!("template {} stopped", index);
                return;
            }
            let mut remaining = amounts.clone();
            let wave = match self.wave(template, &mut remaining) {
                Ok(wave) => wave,
                Err(error) => {
                    let _ = sender.send(Err(error));
                    return;
                }
            };
            let partial = wave.len() != template.len();
            if wave.is_empty() || (partial && !self.config.with_remainder) {
                break;
            }
            amounts = remaining;

            let items: u64 = wave.iter().map(|p| p.projection.amount(|_| true)).sum();
            log::trace!("template {} emitted {} slots holding {} items", index, wave.len(), items);
            if sender.send(Ok(wave)).is_err() {
                log::trace!("template {}: result stream closed", index);
                return;
            }
            if partial {
                break;
            }
        }
        log::trace!("template {} exhausted", index);
    }

    /// Fills the slots of `template` once: triples, then pairs, then single
    /// item piles.
    fn wave(&self, template: &[Step], amounts: &mut HashMap<Arc<Item>, u64>) -> Result<Vec<ItemPlacement2>> {
        let mut placements = Vec::with_capacity(template.len());
        for heights in self.three_sums {
            if placements.len() == template.len() {
                break;
            }
            self.mixed_pile(template, &[heights.0, heights.1, heights.2], &mut placements, amounts)?;
        }
        for heights in self.two_sums {
            if placements.len() == template.len() {
                break;
            }
            self.mixed_pile(template, &[heights.0, heights.1], &mut placements, amounts)?;
        }
        while placements.len() < template.len() {
            if self.stopped() || !self.single_piles(template, &mut placements, amounts)? {
                break;
            }
        }
        Ok(placements)
    }

    /// Weight still available and, once the slots filled so far carry too
    /// much, the per-slot share to aim for.
    fn budget(&self, slots: usize, placements: &[ItemPlacement2]) -> (f64, Option<f64>) {
        let loaded: f64 = placements.iter().map(|p| p.projection.weight()).sum();
        let rest_weight = self.rest_weight - loaded;
        let filled = placements.len();
        let average = if filled == 0 { 0.0 } else { loaded / filled as f64 };
        let rest_average = rest_weight / (slots - filled) as f64;
        let balanced = approx_ge(average, rest_average * self.config.weight_balance_factor);
        (rest_weight, balanced.then_some(rest_average))
    }

    fn mixed_pile(
        &self,
        template: &[Step],
        heights: &[f64],
        placements: &mut Vec<ItemPlacement2>,
        amounts: &mut HashMap<Arc<Item>, u64>,
    ) -> Result<()> {
        let slot = placements.len();
        let step = &template[slot];
        step.ensure_orientable()?;
        let (rest_weight, average) = self.budget(template.len(), placements);
        let views = self.combinator.item_combination(
            self.groups,
            amounts,
            heights,
            rest_weight,
            average,
            self.space,
            |item| step.pattern_view(item).ok().flatten(),
        );
        let Some(views) = views else {
            return Ok(());
        };
        for view in &views {
            if let Some(amount) = amounts.get_mut(view.item()) {
                *amount = amount.saturating_sub(1);
            }
        }
        let placement = step.generate_placement(step.multi_pile_projection(views), placements, slot)?;
        placements.push(placement);
        Ok(())
    }

    /// Places piles of one item into the following slots. Returns false if
    /// no slot could be filled.
    fn single_piles(
        &self,
        template: &[Step],
        placements: &mut Vec<ItemPlacement2>,
        amounts: &mut HashMap<Arc<Item>, u64>,
    ) -> Result<bool> {
        let (rest_weight, average) = self.budget(template.len(), placements);
        let pile_height = |item: &Item| {
            item.max_layer()
                .min(whole_count(rest_weight, item.weight()))
                .min(whole_count(item.max_height(), item.height()))
                .min(whole_count(self.space.height, item.height()))
        };

        let mut order: Vec<&Arc<Item>> = self
            .candidates
            .iter()
            .map(|(item, _)| item)
            .filter(|item| amounts.get(*item).is_some_and(|amount| *amount > 0))
            .collect();
        if let Some(target) = average {
            let distance = |item: &Item| match pile_height(item) {
                0 => f64::INFINITY,
                layer => (layer as f64 * item.weight() - target).abs(),
            };
            order.sort_by(|a, b| distance(a.as_ref()).total_cmp(&distance(b.as_ref())));
        }

        for item in order {
            let mut amount = amounts.get(item).copied().unwrap_or(0);
            let cap = self.config.with_piling.min(pile_height(item.as_ref()));
            let mut copies = whole_count(rest_weight, item.weight());
            let mut placed = false;
            while cap > 0 && placements.len() < template.len() {
                let slot = placements.len();
                let step = &template[slot];
                let Some(view) = step.pattern_view(item)? else {
                    break;
                };
                let layer = self.stacked_layers(&view, cap);
                if layer == 0 || layer > amount || layer > copies {
                    break;
                }
                let projection = Projection::Pile {
                    view,
                    plane: ProjectivePlane::Bottom,
                    layer,
                };
                let placement = step.generate_placement(projection, placements, slot)?;
                placements.push(placement);
                amount -= layer;
                copies -= layer;
                amounts.insert(Arc::clone(item), amount);
                placed = true;
            }
            if placed {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Number of copies of `view`, at most `cap`, that the stacking rules
    /// accept on top of each other from the floor up.
    fn stacked_layers(&self, view: &ItemView, cap: u64) -> u64 {
        let cap = cap.min(view.max_layer());
        if cap == 0 || !view.enabled_stacking_on(None, 0, 0.0, self.space) {
            return 0;
        }
        let height = view.height();
        let above = (1..cap)
            .take_while(|&layer| view.enabled_stacking_on(Some(view), layer, layer as f64 * height, self.space))
            .count();
        1 + above as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn item(id: &str, w: f64, h: f64, d: f64, weight: f64) -> Arc<Item> {
        Arc::new(Item::new(id, w, h, d).with_weight(weight))
    }

    fn row(slots: usize) -> Vec<Step> {
        (0..slots)
            .map(|i| {
                let step = Step::new(ProjectivePlane::Front);
                if i == 0 {
                    step
                } else {
                    step.with_next_point(right_bottom)
                }
            })
            .collect()
    }

    fn pile(view: ItemView, layer: u64, x: f64, y: f64) -> ItemPlacement2 {
        Placement2::new(
            Projection::Pile {
                view,
                plane: ProjectivePlane::Bottom,
                layer,
            },
            Point2::new(x, y),
        )
    }

    #[test]
    fn test_config_validate() {
        assert!(PatternConfig::default().validate().is_ok());
        assert!(PatternConfig::new().with_piling(0).validate().is_err());
        assert!(PatternConfig::new().with_weight_balance_factor(0.0).validate().is_err());
        assert_relative_eq!(PatternConfig::default().weight_balance_factor, WEIGHT_BALANCE_FACTOR);
    }

    #[test]
    fn test_pattern_view_follows_length_orientation() {
        let wide = item("W", 6.0, 2.0, 4.0, 1.0);
        let front = Step::new(ProjectivePlane::Front).pattern_view(&wide).unwrap().unwrap();
        assert!(front.depth() >= front.width());
        let side = Step::new(ProjectivePlane::Side).pattern_view(&wide).unwrap().unwrap();
        assert!(side.depth() <= side.width());
        assert!(Step::new(ProjectivePlane::Bottom).pattern_view(&wide).is_err());

        let fixed = Arc::new(Item::new("F", 6.0, 2.0, 4.0).with_orientations([u_loading_core::Orientation::Upright]));
        assert!(Step::new(ProjectivePlane::Front).pattern_view(&fixed).unwrap().is_none());
    }

    #[test]
    fn test_first_slot_at_origin_and_missing_anchor_rule() {
        let view = ItemView::upright(item("A", 2.0, 2.0, 3.0, 1.0));
        let step = Step::new(ProjectivePlane::Front);
        let projection = Projection::Plane {
            view,
            plane: ProjectivePlane::Bottom,
        };
        let first = step.generate_placement(projection.clone(), &[], 0).unwrap();
        assert_relative_eq!(first.x(), 0.0);
        assert_relative_eq!(first.y(), 0.0);
        assert!(matches!(step.generate_placement(projection, &[first], 1), Err(Error::Logic(_))));
    }

    #[test]
    fn test_right_bottom_and_left_upper() {
        let view = ItemView::upright(item("A", 2.0, 2.0, 3.0, 1.0));
        let placements = vec![pile(view.clone(), 1, 0.0, 0.0), pile(view.clone(), 1, 3.0, 0.0)];
        let projection = Projection::Plane {
            view: view.clone(),
            plane: ProjectivePlane::Bottom,
        };
        let next = right_bottom(&projection, &placements);
        assert_relative_eq!(next.x, 6.0);
        assert_relative_eq!(next.y, 0.0);

        let upper = left_upper(&projection, &placements);
        assert_relative_eq!(upper.x, 0.0);
        assert_relative_eq!(upper.y, 2.0);

        let mut stacked = placements.clone();
        stacked.push(pile(view, 1, 0.0, 2.0));
        let upper = left_upper(&projection, &stacked);
        assert_relative_eq!(upper.x, 3.0);
        assert_relative_eq!(upper.y, 2.0);
    }

    #[test]
    fn test_candidates_filter_and_order() {
        let pattern = Pattern::default().with_bottom_length_range(0.0..=5.0);
        let space = Container3Shape::new(10.0, 6.0, 10.0);
        let short = item("S", 2.0, 5.0, 2.0, 1.0);
        let tall = item("T", 2.0, 3.0, 2.0, 1.0);
        let long = item("L", 2.0, 3.0, 8.0, 1.0);
        let inventory = vec![(Arc::clone(&short), 4), (Arc::clone(&tall), 4), (long, 4), (item("Z", 2.0, 1.0, 2.0, 1.0), 0)];
        let candidates = pattern.candidates(&inventory, &space, None).unwrap();
        let ids: Vec<&str> = candidates.iter().map(|(i, _)| i.id()).collect();
        assert_eq!(ids, vec!["S", "T"]);

        let only_tall: &ItemPredicate = &|item: &Item| item.id() == "T";
        let candidates = pattern.candidates(&inventory, &space, Some(only_tall)).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_relative_eq!(wasted_height(&tall, 4, &space), 0.0);
        assert_relative_eq!(wasted_height(&short, 4, &space), 1.0);
    }

    #[test]
    fn test_single_item_row() {
        let a = item("A", 4.0, 5.0, 4.0, 2.0);
        let space = Container3Shape::new(4.0, 10.0, 12.0);
        let results = Pattern::new(vec![row(3)])
            .place(&[(a, 12)], &space, f64::INFINITY, &[], None, &PatternConfig::default())
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].len(), 6);
        for placement in &results[0] {
            assert!(placement.max_y() <= 10.0 + 1e-9);
            assert!(placement.max_z() <= 12.0 + 1e-9);
        }
    }

    #[test]
    fn test_piling_limit() {
        let a = item("A", 4.0, 2.0, 4.0, 1.0);
        let space = Container3Shape::new(4.0, 10.0, 8.0);
        let results = Pattern::new(vec![row(2)])
            .place(&[(a, 20)], &space, f64::INFINITY, &[], None, &PatternConfig::new().with_piling(2))
            .unwrap();
        assert!(!results.is_empty());
        assert!(results.iter().flatten().all(|p| p.max_y() <= 4.0 + 1e-9));
    }

    #[test]
    fn test_remainder() {
        let a = item("A", 4.0, 5.0, 4.0, 1.0);
        let space = Container3Shape::new(4.0, 5.0, 12.0);
        let pattern = Pattern::new(vec![row(3)]);
        let strict = pattern
            .place(&[(Arc::clone(&a), 2)], &space, f64::INFINITY, &[], None, &PatternConfig::default())
            .unwrap();
        assert!(strict.is_empty());
        let relaxed = pattern
            .place(&[(a, 2)], &space, f64::INFINITY, &[], None, &PatternConfig::new().with_remainder(true))
            .unwrap();
        assert_eq!(relaxed.len(), 1);
        assert_eq!(relaxed[0].len(), 2);
    }

    #[test]
    fn test_single_piles_follow_stacking_rules() {
        use crate::attribute::PackageAttribute;
        use crate::package::PackageType;
        use crate::stacking::Stackable;

        let attribute = PackageAttribute::new(PackageType::CartonContainer).with_top_flat(false);
        let peaked = Arc::new(Item::new("N", 4.0, 2.0, 4.0).with_weight(1.0).with_attribute(attribute));
        let space = Container3Shape::new(4.0, 6.0, 4.0);
        let results = Pattern::new(vec![row(1)])
            .place(&[(peaked, 3)], &space, f64::INFINITY, &[], None, &PatternConfig::default())
            .unwrap();
        assert!(!results.is_empty());
        for footprint in &results {
            for placement in footprint {
                assert_relative_eq!(placement.y(), 0.0);
                assert!(placement.enabled_stacking_on(footprint, &space));
            }
        }
    }

    #[test]
    fn test_side_only_item_fills_slot() {
        let standing = Arc::new(
            Item::new("S", 2.0, 4.0, 4.0)
                .with_weight(1.0)
                .with_orientations([u_loading_core::Orientation::Side]),
        );
        let space = Container3Shape::new(4.0, 4.0, 4.0);
        let results = Pattern::new(vec![row(1)])
            .place(&[(standing, 2)], &space, f64::INFINITY, &[], None, &PatternConfig::default())
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].len(), 1);
        assert_eq!(results[0][0].unit.orientation(), u_loading_core::Orientation::Side);
        assert_relative_eq!(results[0][0].max_y(), 2.0);
    }

    #[test]
    fn test_bottom_plane_step_aborts() {
        let a = item("A", 4.0, 5.0, 4.0, 1.0);
        let template = vec![Step::new(ProjectivePlane::Bottom)];
        let result = Pattern::new(vec![template]).place(
            &[(a, 4)],
            &Container3Shape::new(4.0, 5.0, 4.0),
            f64::INFINITY,
            &[],
            None,
            &PatternConfig::default(),
        );
        assert!(matches!(result, Err(Error::Logic(_))));
    }

    #[test]
    fn test_cancelled_token_returns_empty() {
        let a = item("A", 4.0, 5.0, 4.0, 1.0);
        let token = CancellationToken::new();
        token.cancel();
        let results = Pattern::new(vec![row(2)])
            .place_with_token(
                &[(a, 8)],
                &Container3Shape::new(4.0, 5.0, 8.0),
                f64::INFINITY,
                &[],
                None,
                &PatternConfig::default(),
                &token,
            )
            .unwrap();
        assert!(results.is_empty());
    }
}
