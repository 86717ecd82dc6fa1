//! Facade crate for OSM water-area extraction.
//!
//! Re-exports the classification types from `waterareas-core` and the
//! extraction pipeline from `waterareas-data`, so embedders can depend on a
//! single crate.
//!
//! ```no_run
//! use osm_waterareas::{ExtractOptions, InputSource, OutputFormat, extract_water_areas};
//!
//! # fn main() -> Result<(), osm_waterareas::ExtractError> {
//! let mut options = ExtractOptions::new(InputSource::from_arg("-"), "water.gpkg");
//! options.format = OutputFormat::GeoPackage;
//! let report = extract_water_areas(&options)?;
//! println!("wrote {} water areas", report.written);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub use waterareas_core::{
    AreaOrigin, AssembledArea, Classification, GeometryErrorKind, GeometryResult, Projection,
    TagSet, WaterAreaFeature, WaterType, build_feature, classify, is_water_area,
};

pub use waterareas_data::{
    AssemblerConfig, AssemblerStats, ExtractError, ExtractOptions, ExtractReport, IndexType,
    InputSource, OutputFormat, ReadError, WriterError, extract_water_areas,
};
