//! Integration tests for u-loading-d3.

use std::sync::Arc;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_loading_core::geometry::{Cuboid, Dimensions};
use u_loading_core::{Container3Shape, Placement3, ProjectivePlane};
use u_loading_d3::{
    left_upper, right_bottom, same_arrangement, BinType, Item, ItemContainer, ItemPlacement, ItemView, Layer,
    LayerComparator, LayerSource, PackageAttribute, PackageType, Pattern, PatternConfig, Stackable, Step,
};

fn carton(id: &str, width: f64, height: f64, depth: f64, weight: f64) -> Arc<Item> {
    Arc::new(Item::new(id, width, height, depth).with_weight(weight))
}

fn row(slots: usize) -> Vec<Step> {
    (0..slots)
        .map(|i| match i {
            0 => Step::new(ProjectivePlane::Front),
            _ => Step::new(ProjectivePlane::Front).with_next_point(right_bottom),
        })
        .collect()
}

fn shelf() -> Vec<Step> {
    vec![
        Step::new(ProjectivePlane::Side),
        Step::new(ProjectivePlane::Side).with_next_point(right_bottom),
        Step::new(ProjectivePlane::Side).with_next_point(left_upper),
        Step::new(ProjectivePlane::Side).with_next_point(left_upper),
    ]
}

mod stacking_tests {
    use super::*;

    #[test]
    fn test_item_is_never_its_own_supporter() {
        let a = carton("A", 4.0, 2.0, 4.0, 1.0);
        let space = Container3Shape::unbounded();
        let lifted = Placement3::at(ItemView::upright(Arc::clone(&a)), 0.0, 2.0, 0.0);
        // with only itself in the set there is nothing to rest on
        let alone = std::slice::from_ref(&lifted);
        let floor = Placement3::at(ItemView::upright(a), 0.0, 0.0, 0.0);
        assert!(lifted.enabled_stacking_on(&[floor.clone(), lifted.clone()], &space));
        assert!(!lifted.enabled_stacking_on(alone, &space));
        assert!(floor.enabled_stacking_on(std::slice::from_ref(&floor), &space));
    }

    #[test]
    fn test_heavier_supporter_never_rejects() {
        let mut rng = StdRng::seed_from_u64(42);
        let space = Container3Shape::unbounded();
        for round in 0..200 {
            let top_weight = rng.gen_range(0.0..50.0);
            let bottom_weight = rng.gen_range(0.0..50.0);
            let extra = rng.gen_range(0.0..20.0);
            let top = ItemView::upright(carton("T", 4.0, 2.0, 4.0, top_weight));
            let light = ItemView::upright(carton(&format!("L{}", round), 4.0, 2.0, 4.0, bottom_weight));
            let heavy = ItemView::upright(carton(&format!("H{}", round), 4.0, 2.0, 4.0, bottom_weight + extra));

            if top.enabled_stacking_on(Some(&light), 0, 0.0, &space) {
                assert!(
                    top.enabled_stacking_on(Some(&heavy), 0, 0.0, &space),
                    "top {} accepted on {} but rejected on {}",
                    top_weight,
                    bottom_weight,
                    bottom_weight + extra
                );
            }

            let placed_top = Placement3::at(top.clone(), 0.0, 2.0, 0.0);
            let on_light = placed_top.enabled_stacking_on(&[Placement3::at(light, 0.0, 0.0, 0.0)], &space);
            let on_heavy = placed_top.enabled_stacking_on(&[Placement3::at(heavy, 0.0, 0.0, 0.0)], &space);
            assert!(!on_light || on_heavy);
        }
    }

    #[test]
    fn test_bottom_only_needs_bottom_only_supporters() {
        let attribute = PackageAttribute::new(PackageType::WoodenContainer).with_bottom_only(true);
        let crate_item = Arc::new(Item::new("W", 4.0, 2.0, 4.0).with_attribute(attribute));
        let plain = carton("C", 4.0, 2.0, 4.0, 0.0);
        let space = Container3Shape::unbounded();

        let on_plain = Placement3::at(ItemView::upright(Arc::clone(&crate_item)), 0.0, 2.0, 0.0);
        assert!(!on_plain.enabled_stacking_on(&[Placement3::at(ItemView::upright(plain), 0.0, 0.0, 0.0)], &space));

        let on_crate = on_plain.clone();
        assert!(on_crate.enabled_stacking_on(&[Placement3::at(ItemView::upright(crate_item), 0.0, 0.0, 0.0)], &space));
    }
}

mod pattern_tests {
    use super::*;
    use std::collections::HashMap;

    fn random_inventory(seed: u64) -> Vec<(Arc<Item>, u64)> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..6)
            .map(|i| {
                let width = rng.gen_range(2..=4) as f64;
                let depth = rng.gen_range(2..=5) as f64;
                let height = rng.gen_range(1..=5) as f64;
                let weight = rng.gen_range(1..=10) as f64;
                (carton(&format!("R{}", i), width, height, depth, weight), rng.gen_range(1..=12))
            })
            .collect()
    }

    fn weight(placements: &[ItemPlacement]) -> f64 {
        placements.iter().map(|p| p.unit.weight()).sum()
    }

    #[test]
    fn test_empty_inventory_is_not_an_error() {
        let results = Pattern::new(vec![row(2)])
            .place(&[], &Container3Shape::new(8.0, 8.0, 8.0), 100.0, &[], None, &PatternConfig::default())
            .unwrap();
        assert!(results.is_empty());

        let zero = vec![(carton("A", 2.0, 2.0, 2.0, 1.0), 0)];
        let results = Pattern::new(vec![row(2)])
            .place(&zero, &Container3Shape::new(8.0, 8.0, 8.0), 100.0, &[], None, &PatternConfig::default())
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_footprints_respect_weight_and_depth() {
        let space = Container3Shape::new(8.0, 10.0, 12.0);
        let pattern = Pattern::new(vec![row(3), shelf()]);
        for seed in 0..8 {
            let inventory = random_inventory(seed);
            let config = PatternConfig::new().with_remainder(seed % 2 == 0);
            let results = pattern.place(&inventory, &space, 60.0, &[], None, &config).unwrap();
            for footprint in &results {
                assert!(weight(footprint) <= 60.0 + 1e-6, "seed {} weight {}", seed, weight(footprint));
                for placement in footprint {
                    assert!(placement.max_z() <= space.depth + 1e-6);
                    assert!(placement.max_x() <= space.width + 1e-6);
                    assert!(placement.max_y() <= space.height + 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_footprints_never_exceed_inventory() {
        let inventory = random_inventory(7);
        let amounts: HashMap<&str, u64> = inventory.iter().map(|(item, n)| (item.id(), *n)).collect();
        let results = Pattern::new(vec![row(2)])
            .place(
                &inventory,
                &Container3Shape::new(8.0, 10.0, 12.0),
                f64::INFINITY,
                &[],
                None,
                &PatternConfig::new().with_remainder(true),
            )
            .unwrap();
        for footprint in &results {
            let mut used: HashMap<&str, u64> = HashMap::new();
            for placement in footprint {
                *used.entry(placement.unit.item().id()).or_default() += 1;
            }
            for (id, count) in used {
                assert!(count <= amounts[id]);
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic_up_to_order() {
        let inventory = random_inventory(3);
        let space = Container3Shape::new(8.0, 10.0, 12.0);
        let pattern = Pattern::new(vec![row(3), shelf(), row(2)]);
        let config = PatternConfig::new().with_remainder(true);
        let first = pattern.place(&inventory, &space, 80.0, &[], None, &config).unwrap();
        let second = pattern.place(&inventory, &space, 80.0, &[], None, &config).unwrap();

        assert_eq!(first.len(), second.len());
        for footprint in &first {
            assert!(second.iter().any(|other| same_arrangement(footprint, other)));
        }
    }

    #[test]
    fn test_mixed_pile_preferred_over_single_heights() {
        let short = carton("S2", 4.0, 2.0, 4.0, 2.0);
        let middle = carton("M3", 4.0, 3.0, 4.0, 3.0);
        let tall = carton("T5", 4.0, 5.0, 4.0, 5.0);
        let inventory = vec![(short, 1), (middle, 1), (tall, 1)];
        let space = Container3Shape::new(4.0, 5.0, 8.0);

        let results = Pattern::new(vec![row(2)])
            .place(&inventory, &space, f64::INFINITY, &[], None, &PatternConfig::default())
            .unwrap();
        assert_eq!(results.len(), 1);
        let footprint = &results[0];
        assert_eq!(footprint.len(), 3);

        let front: Vec<&ItemPlacement> = footprint.iter().filter(|p| p.z() < 1e-6).collect();
        let mut ids: Vec<&str> = front.iter().map(|p| p.unit.item().id()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["M3", "S2"]);
        let top = front.iter().map(|p| p.max_y()).fold(0.0, f64::max);
        assert_relative_eq!(top, 5.0);

        let back: Vec<&ItemPlacement> = footprint.iter().filter(|p| p.z() > 1e-6).collect();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].unit.item().id(), "T5");
        assert_relative_eq!(back[0].z(), 4.0);
        assert!(footprint.iter().all(|p| p.max_y() <= 5.0 + 1e-6));
    }

    #[test]
    fn test_bottom_only_stays_on_bottom_only() {
        let attribute = PackageAttribute::new(PackageType::WoodenContainer).with_bottom_only(true);
        let bottom_only = Arc::new(Item::new("W", 4.0, 3.0, 4.0).with_weight(1.0).with_attribute(attribute));
        let plain = carton("C", 4.0, 2.0, 4.0, 9.0);
        let inventory = vec![(Arc::clone(&bottom_only), 4), (plain, 4)];

        let results = Pattern::new(vec![row(2), row(3)])
            .place(
                &inventory,
                &Container3Shape::new(4.0, 6.0, 12.0),
                f64::INFINITY,
                &[],
                None,
                &PatternConfig::new().with_remainder(true),
            )
            .unwrap();
        assert!(!results.is_empty());
        for footprint in &results {
            for placement in footprint.iter().filter(|p| p.unit.bottom_only() && p.y() > 1e-6) {
                let beneath = footprint
                    .iter()
                    .filter(|q| q.bottom_overlapped(placement) && q.is_below(placement));
                for q in beneath {
                    assert!(q.unit.bottom_only(), "{} rests on {}", placement.unit, q.unit);
                }
            }
        }
    }

    #[test]
    fn test_predicate_and_bin_capacity() {
        let a = carton("A", 4.0, 5.0, 4.0, 10.0);
        let b = carton("B", 4.0, 5.0, 4.0, 10.0);
        let bin = BinType::new("B", 4.0, 10.0, 8.0).with_capacity(30.0);
        let only_a: &u_loading_d3::ItemPredicate = &|item: &Item| item.id() == "A";
        let results = Pattern::default()
            .place_bin(
                &[(a, 10), (b, 10)],
                &bin,
                &[row(2)],
                Some(only_a),
                &PatternConfig::new().with_remainder(true),
            )
            .unwrap();
        assert!(!results.is_empty());
        for footprint in &results {
            assert!(footprint.iter().all(|p| p.unit.item().id() == "A"));
            assert!(weight(footprint) <= 30.0 + 1e-6);
        }
    }

    #[test]
    fn test_logic_error_aborts_generation() {
        let inventory = vec![(carton("A", 4.0, 5.0, 4.0, 1.0), 8)];
        let broken = vec![Step::new(ProjectivePlane::Bottom)];
        let result = Pattern::new(vec![row(2), broken]).place(
            &inventory,
            &Container3Shape::new(4.0, 5.0, 8.0),
            f64::INFINITY,
            &[],
            None,
            &PatternConfig::default(),
        );
        assert!(matches!(result, Err(u_loading_d3::Error::Logic(_))));
    }
}

mod program_tests {
    use super::*;

    fn bin_type() -> BinType {
        BinType::new("40FT", 10.0, 10.0, 40.0)
    }

    fn layer(id: &str, depth: f64) -> Arc<Layer> {
        let item = carton(id, 10.0, 10.0, depth, 1.0);
        Arc::new(Layer::from_items(
            0,
            &bin_type().shape(),
            vec![Placement3::at(ItemView::upright(item), 0.0, 0.0, 0.0)],
            LayerSource::Pattern,
        ))
    }

    #[test]
    fn test_offsets_are_cumulative_depths() {
        let layers = vec![layer("A", 4.0), layer("B", 9.0), layer("C", 2.0), layer("D", 6.0)];
        let bin = bin_type().with_extra_check_rule(|_, placements| {
            placements
                .last()
                .is_some_and(|p| p.unit.items()[0].unit.item().id() == "A")
        });
        let placements = bin.program(&layers, true, None).unwrap();
        assert_eq!(placements.len(), 4);
        let mut z = 0.0;
        for placement in &placements {
            assert_relative_eq!(placement.z(), z);
            z += placement.unit.depth();
        }
        assert_relative_eq!(z, 21.0);
    }

    #[test]
    fn test_infeasible_returns_none() {
        let layers = vec![layer("A", 4.0), layer("B", 9.0), layer("C", 2.0)];
        let bin = bin_type().with_extra_check_rule(|bin, placements| {
            placements.iter().map(|p| p.unit.depth()).sum::<f64>() <= bin.depth() - 30.0
        });
        assert!(bin.program(&layers, true, None).is_none());
    }

    #[test]
    fn test_first_permutation_winner_is_never_lost() {
        let layers = vec![layer("A", 4.0), layer("B", 9.0), layer("C", 2.0), layer("D", 6.0), layer("E", 1.0)];
        let bin = bin_type().with_extra_check_rule(|_, _| true);
        let expected = bin.program(&layers, true, None).unwrap();
        for _ in 0..100 {
            let placements = bin.program(&layers, true, None).unwrap();
            assert_eq!(placements.len(), expected.len());
            for (a, b) in placements.iter().zip(&expected) {
                assert!(Arc::ptr_eq(&a.unit, &b.unit));
                assert_relative_eq!(a.z(), b.z());
            }
        }
    }

    #[test]
    fn test_comparator_takes_precedence() {
        let layers = vec![layer("A", 4.0), layer("B", 9.0)];
        let deepest_first: &LayerComparator = &|l: &Layer, r: &Layer| r.depth().total_cmp(&l.depth());
        let placements = bin_type().program(&layers, false, Some(deepest_first)).unwrap();
        assert_relative_eq!(placements[0].unit.depth(), 9.0);
        assert_relative_eq!(placements[1].z(), 9.0);
    }
}
