//! # U-Loading Core
//!
//! Core primitives for the U-Loading load-planning engine.
//!
//! This crate provides the foundational types shared by the stacking-rule
//! evaluator, the pattern footprint generator and the layer-ordering search.
//!
//! ## Core Components
//!
//! - **Geometry**: `Orientation`, `ProjectivePlane`, `Container3Shape`, `BottomSupport`
//! - **Placements**: `Placement3`, `Placement2`, `Projection` and the
//!   top/bottom placement queries
//! - **Footprints**: `Rect2` overlap and intersection math
//! - **Cancellation**: `CancellationToken` for cooperative stop requests
//! - **Tolerance**: explicit epsilon comparisons for accumulated positions
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization support

pub mod cancel;
pub mod error;
pub mod footprint;
pub mod geometry;
pub mod placement;
pub mod tolerance;

// Re-exports
pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use footprint::Rect2;
pub use geometry::{
    BottomSupport, Container3Shape, Cuboid, Dimensions, Orientation, OrientationCategory,
    ProjectivePlane,
};
pub use placement::{
    bottom_placements, top_placement_refs, top_placements, Placement2, Placement3, Projection,
};
pub use tolerance::EPSILON;

pub use nalgebra::{Point2, Point3};
