//! # U-Loading
//!
//! 3D load planning: stacking rules, pattern footprints and layer ordering.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use u_loading::d3::{right_bottom, BinType, Item, Pattern, PatternConfig, Step};
//! use u_loading::core::ProjectivePlane;
//!
//! let bin = BinType::new("20FT", 2352.0, 2393.0, 5898.0).with_capacity(21_000.0);
//! let item = Arc::new(Item::new("A", 400.0, 1100.0, 600.0).with_weight(35.0));
//! let template = vec![
//!     Step::new(ProjectivePlane::Front),
//!     Step::new(ProjectivePlane::Front).with_next_point(right_bottom),
//! ];
//! let footprints = Pattern::new(vec![template]).place_bin(
//!     &[(item, 40)],
//!     &bin,
//!     &[],
//!     None,
//!     &PatternConfig::default(),
//! )?;
//! ```
//!
//! ## Feature Flags
//!
//! - `d3` (default): stacking rules, patterns and layer ordering
//! - `serde`: Serialization support

/// Geometry, placements and shared error types.
pub use u_loading_core as core;

/// Stacking rules, patterns and layer ordering.
#[cfg(feature = "d3")]
pub use u_loading_d3 as d3;

// Re-export commonly used types at root level
pub use u_loading_core::{CancellationToken, Container3Shape, Error, Orientation, ProjectivePlane, Result};
