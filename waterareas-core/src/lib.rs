//! Core domain types for water-area extraction.
//!
//! Responsibilities:
//! - Model OSM tag sets and the areas assembled from ways and relations.
//! - Classify areas into water-body types and derive their attributes.
//! - Prepare accepted areas for persistence (validation and projection).
//!
//! Boundaries:
//! - No I/O; readers, indexes and writers live in `waterareas-data`.
//!
//! Invariants:
//! - Classification is a pure function of a tag set.
//! - A [`WaterAreaFeature`] always carries a water type; rejected areas
//!   never become features.
#![forbid(unsafe_code)]

mod area;
mod classify;
mod feature;
mod projection;
mod tags;

pub use area::{AreaOrigin, AssembledArea, area_id};
pub use classify::{
    Classification, WaterType, classify, display_name, is_water_area, water_type,
};
pub use feature::{
    GeometryErrorKind, GeometryResult, WaterAreaFeature, build_feature, check_geometry,
};
pub use projection::{MAX_MERCATOR_LATITUDE, Projection};
pub use tags::TagSet;
