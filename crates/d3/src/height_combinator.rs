//! Height combinations for mixed piles.
//!
//! A mixed pile stacks items of different heights so that the pile gets as
//! close to the container height as possible. [`HeightCombinator`] finds
//! height pairs and triples under a target and picks concrete items for
//! them.

use std::collections::HashMap;
use std::sync::Arc;

use u_loading_core::geometry::{Container3Shape, Cuboid, Dimensions};
use u_loading_core::tolerance::{approx_eq, approx_ge, approx_le};

use crate::block::pile_layer;
use crate::item::{Item, ItemView};

/// Default tolerance band below the target height for pairs.
pub const DEFAULT_TWO_SUM_OFFSET: f64 = 300.0;
/// Default tolerance band below the target height for triples.
pub const DEFAULT_THREE_SUM_OFFSET: f64 = 300.0;

/// Band widths tried in order; the first band with any hit wins.
const OFFSET_SCALES: [f64; 2] = [1.0, 2.0];

/// Items grouped by height, in ascending height order.
#[derive(Debug, Clone, Default)]
pub struct HeightGroups {
    groups: Vec<(f64, Vec<Arc<Item>>)>,
}

impl HeightGroups {
    /// Groups `items` by height, merging heights within the tolerance.
    pub fn new(items: impl IntoIterator<Item = Arc<Item>>) -> Self {
        let mut groups: Vec<(f64, Vec<Arc<Item>>)> = Vec::new();
        for item in items {
            let height = item.height();
            match groups.iter_mut().find(|(h, _)| approx_eq(*h, height)) {
                Some((_, members)) => members.push(item),
                None => groups.push((height, vec![item])),
            }
        }
        groups.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { groups }
    }

    /// Distinct heights, ascending.
    pub fn heights(&self) -> Vec<f64> {
        self.groups.iter().map(|(h, _)| *h).collect()
    }

    /// Items of the given height.
    pub fn get(&self, height: f64) -> &[Arc<Item>] {
        self.groups
            .iter()
            .find(|(h, _)| approx_eq(*h, height))
            .map(|(_, members)| members.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true if there are no items.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Finds height tuples close to a target and items to fill them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightCombinator {
    two_sum_offset: f64,
    three_sum_offset: f64,
}

impl Default for HeightCombinator {
    fn default() -> Self {
        Self {
            two_sum_offset: DEFAULT_TWO_SUM_OFFSET,
            three_sum_offset: DEFAULT_THREE_SUM_OFFSET,
        }
    }
}

impl HeightCombinator {
    /// Creates a combinator with the default offsets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the band width for pairs.
    pub fn with_two_sum_offset(mut self, offset: f64) -> Self {
        self.two_sum_offset = offset;
        self
    }

    /// Sets the band width for triples.
    pub fn with_three_sum_offset(mut self, offset: f64) -> Self {
        self.three_sum_offset = offset;
        self
    }

    /// Pairs `heights[i] + heights[j]` (`i < j`) within the band below
    /// `target`, closest to the target first.
    pub fn two_sum(&self, target: f64, heights: &[f64]) -> Vec<(f64, f64)> {
        for scale in OFFSET_SCALES {
            let floor = target - self.two_sum_offset * scale;
            let mut pairs = Vec::new();
            for i in 0..heights.len() {
                for j in i + 1..heights.len() {
                    let sum = heights[i] + heights[j];
                    if approx_ge(sum, floor) && approx_le(sum, target) {
                        pairs.push((heights[i], heights[j]));
                    }
                }
            }
            if !pairs.is_empty() {
                pairs.sort_by(|a, b| (target - (a.0 + a.1)).total_cmp(&(target - (b.0 + b.1))));
                return pairs;
            }
        }
        Vec::new()
    }

    /// Triples `heights[i] + heights[j] + heights[k]` (`i < j <= k`) within
    /// the band below `target`, closest to the target first.
    pub fn three_sum(&self, target: f64, heights: &[f64]) -> Vec<(f64, f64, f64)> {
        for scale in OFFSET_SCALES {
            let floor = target - self.three_sum_offset * scale;
            let mut triples = Vec::new();
            for i in 0..heights.len() {
                for j in i + 1..heights.len() {
                    for k in j..heights.len() {
                        let sum = heights[i] + heights[j] + heights[k];
                        if approx_ge(sum, floor) && approx_le(sum, target) {
                            triples.push((heights[i], heights[j], heights[k]));
                        }
                    }
                }
            }
            if !triples.is_empty() {
                let gap = |t: &(f64, f64, f64)| target - (t.0 + t.1 + t.2);
                triples.sort_by(|a, b| gap(a).total_cmp(&gap(b)));
                return triples;
            }
        }
        Vec::new()
    }

    /// Picks one item per height so that the pile can stand.
    ///
    /// Each pick needs a free amount and must fit the remaining weight. With
    /// `average_weight`, candidates closest to their share of that weight
    /// are tried first. `view` orients an item for the pile, or rejects it.
    /// The returned views are ordered heaviest first (bottom to top) and
    /// every view may rest on the one below it.
    #[allow(clippy::too_many_arguments)]
    pub fn item_combination<F>(
        &self,
        groups: &HeightGroups,
        amounts: &HashMap<Arc<Item>, u64>,
        heights: &[f64],
        rest_weight: f64,
        average_weight: Option<f64>,
        space: &Container3Shape,
        view: F,
    ) -> Option<Vec<ItemView>>
    where
        F: Fn(&Arc<Item>) -> Option<ItemView>,
    {
        if heights.is_empty() {
            return None;
        }
        let search = CombinationSearch {
            groups,
            amounts,
            heights,
            space,
            view: &view,
        };
        let mut chosen = Vec::with_capacity(heights.len());
        search.pick(0, rest_weight, average_weight, &mut chosen)
    }
}

struct CombinationSearch<'a, F> {
    groups: &'a HeightGroups,
    amounts: &'a HashMap<Arc<Item>, u64>,
    heights: &'a [f64],
    space: &'a Container3Shape,
    view: &'a F,
}

impl<F> CombinationSearch<'_, F>
where
    F: Fn(&Arc<Item>) -> Option<ItemView>,
{
    fn pick(
        &self,
        index: usize,
        rest_weight: f64,
        average_weight: Option<f64>,
        chosen: &mut Vec<Arc<Item>>,
    ) -> Option<Vec<ItemView>> {
        if index == self.heights.len() {
            return self.stand(chosen);
        }
        let height = self.heights[index];
        let remaining: f64 = self.heights[index..].iter().sum();
        let target = average_weight.map(|average| average * height / remaining);

        let mut candidates: Vec<&Arc<Item>> = self
            .groups
            .get(height)
            .iter()
            .filter(|item| {
                let used = chosen.iter().filter(|c| c == item).count() as u64;
                self.amounts.get(*item).copied().unwrap_or(0) > used
                    && approx_le(item.weight(), rest_weight)
            })
            .collect();
        if let Some(target) = target {
            candidates.sort_by(|a, b| {
                (a.weight() - target)
                    .abs()
                    .total_cmp(&(b.weight() - target).abs())
            });
        }

        for item in candidates {
            chosen.push(Arc::clone(item));
            let found = self.pick(
                index + 1,
                rest_weight - item.weight(),
                average_weight.map(|average| average - item.weight()),
                chosen,
            );
            chosen.pop();
            if found.is_some() {
                return found;
            }
        }
        None
    }

    fn stand(&self, chosen: &[Arc<Item>]) -> Option<Vec<ItemView>> {
        let mut views = chosen
            .iter()
            .map(|item| (self.view)(item))
            .collect::<Option<Vec<_>>>()?;
        views.sort_by(|a, b| b.weight().total_cmp(&a.weight()));
        for k in 1..views.len() {
            let (layer, height) = pile_layer(&views[k], &views[..k]);
            if !views[k].enabled_stacking_on(Some(&views[k - 1]), layer, height, self.space) {
                return None;
            }
        }
        Some(views)
    }
}
