//! Integration tests for u-loading-core.

use approx::assert_relative_eq;
use u_loading_core::geometry::{BottomSupport, Container3Shape, Cuboid, Dimensions, Orientation, ProjectivePlane};
use u_loading_core::placement::{top_placements, Placement2, Placement3, Projection};
use u_loading_core::{CancellationToken, Point2, Rect2};

#[derive(Debug, Clone, PartialEq)]
struct Carton {
    width: f64,
    height: f64,
    depth: f64,
    weight: f64,
}

impl Carton {
    fn new(width: f64, height: f64, depth: f64, weight: f64) -> Self {
        Self {
            width,
            height,
            depth,
            weight,
        }
    }
}

impl Dimensions for Carton {
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

impl Cuboid for Carton {
    fn weight(&self) -> f64 {
        self.weight
    }
}

mod orientation_tests {
    use super::*;

    #[test]
    fn test_rotation_is_an_involution() {
        for orientation in Orientation::ALL {
            assert_eq!(orientation.rotation().rotation(), orientation);
            assert_eq!(orientation.rotation().category(), orientation.category());
        }
    }

    #[test]
    fn test_dimensions_preserve_volume() {
        for orientation in Orientation::ALL {
            let (w, h, d) = orientation.dimensions(2.0, 3.0, 5.0);
            assert_relative_eq!(w * h * d, 30.0);
        }
    }

    #[test]
    fn test_merge_drops_equivalent_extents() {
        let cube = Carton::new(2.0, 2.0, 2.0, 1.0);
        assert_eq!(Orientation::merge(&cube, &Orientation::ALL), vec![Orientation::Upright]);

        let flat = Carton::new(2.0, 1.0, 2.0, 1.0);
        let merged = Orientation::merge(&flat, &Orientation::ALL);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0], Orientation::Upright);
    }
}

mod projection_tests {
    use super::*;

    #[test]
    fn test_bottom_plane_round_trip() {
        let point = ProjectivePlane::Bottom.point3(&Point2::new(4.0, 1.0), 2.5);
        assert_relative_eq!(point.x, 1.0);
        assert_relative_eq!(point.y, 2.5);
        assert_relative_eq!(point.z, 4.0);
        let back = ProjectivePlane::Bottom.point2(&point);
        assert_relative_eq!(back.x, 4.0);
        assert_relative_eq!(back.y, 1.0);
        assert_relative_eq!(ProjectivePlane::Bottom.distance(&point), 2.5);
    }

    #[test]
    fn test_multi_pile_lifts_in_order() {
        let slot = Placement2::new(
            Projection::MultiPile {
                views: vec![Carton::new(2.0, 3.0, 4.0, 5.0), Carton::new(2.0, 2.0, 3.0, 1.0)],
                plane: ProjectivePlane::Bottom,
            },
            Point2::new(6.0, 2.0),
        );
        assert_relative_eq!(slot.projection.height(), 5.0);
        assert_relative_eq!(slot.projection.length(), 4.0);
        assert_relative_eq!(slot.projection.weight(), 6.0);
        assert_eq!(slot.projection.amount(|c| c.weight > 2.0), 1);

        let lifted = slot.to_placement3(1.0);
        assert_eq!(lifted.len(), 2);
        assert_relative_eq!(lifted[0].x(), 2.0);
        assert_relative_eq!(lifted[0].y(), 1.0);
        assert_relative_eq!(lifted[0].z(), 6.0);
        assert_relative_eq!(lifted[1].y(), 4.0);
    }

    #[test]
    fn test_pile_counts_copies() {
        let pile = Projection::Pile {
            view: Carton::new(1.0, 2.0, 1.0, 3.0),
            plane: ProjectivePlane::Bottom,
            layer: 4,
        };
        assert_relative_eq!(pile.height(), 8.0);
        assert_relative_eq!(pile.weight(), 12.0);
        assert_eq!(pile.amount(|_| true), 4);
    }
}

mod placement_tests {
    use super::*;

    #[test]
    fn test_footprint_overlap_ignores_touching_faces() {
        let a = Placement3::at(Carton::new(2.0, 2.0, 2.0, 1.0), 0.0, 0.0, 0.0);
        let b = Placement3::at(Carton::new(2.0, 2.0, 2.0, 1.0), 2.0, 0.0, 0.0);
        let c = Placement3::at(Carton::new(2.0, 2.0, 2.0, 1.0), 1.0, 2.0, 1.0);
        assert!(!a.bottom_overlapped(&b));
        assert!(a.bottom_overlapped(&c));
        assert!(!a.overlapped(&c));
        assert!(a.is_below(&c));
    }

    #[test]
    fn test_top_placements() {
        let floor = Placement3::at(Carton::new(4.0, 2.0, 4.0, 1.0), 0.0, 0.0, 0.0);
        let top = Placement3::at(Carton::new(2.0, 2.0, 2.0, 1.0), 0.0, 2.0, 0.0);
        let aside = Placement3::at(Carton::new(2.0, 1.0, 2.0, 1.0), 6.0, 0.0, 0.0);
        let all = vec![floor, top.clone(), aside.clone()];
        let tops = top_placements(&all);
        assert_eq!(tops.len(), 2);
        assert!(tops.contains(&&top));
        assert!(tops.contains(&&aside));
    }
}

mod shape_tests {
    use super::*;
    use u_loading_core::Point3;

    #[test]
    fn test_rest_space_and_capacity() {
        let space = Container3Shape::new(10.0, 6.0, 20.0);
        let rest = space.rest_space(&Point3::new(4.0, 6.0, 25.0));
        assert_relative_eq!(rest.width, 6.0);
        assert_relative_eq!(rest.height, 0.0);
        assert_relative_eq!(rest.depth, 0.0);
        assert_eq!(space.max_amount(&Carton::new(5.0, 3.0, 5.0, 1.0)), 16);
        assert!(Container3Shape::unbounded().enabled(&Carton::new(1e9, 1e9, 1e9, 1.0)));
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect2::from_origin(0.0, 0.0, 4.0, 4.0);
        let b = Rect2::from_origin(2.0, 2.0, 4.0, 4.0);
        assert_relative_eq!(a.intersection_area(&b), 4.0);
        assert!(a.union(&b).approx_eq(&Rect2::new(0.0, 0.0, 6.0, 6.0)));
        assert_relative_eq!(a.intersection_area(&Rect2::from_origin(4.0, 0.0, 1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_bottom_support_sums() {
        let total: BottomSupport = [BottomSupport::new(2.0, 1.0), BottomSupport::new(3.0, 4.0)]
            .into_iter()
            .sum();
        assert_relative_eq!(total.area, 5.0);
        assert_relative_eq!(total.weight, 5.0);
    }
}

mod cancel_tests {
    use super::*;

    #[test]
    fn test_token_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
        clone.reset();
        assert!(!token.is_cancelled());
    }
}
