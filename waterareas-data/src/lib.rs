//! Data access for water-area extraction.
//!
//! Responsibilities:
//! - Decode OSM PBF and OSM XML input ([`OsmInput`]).
//! - Store node locations for way resolution ([`LocationIndex`]).
//! - Assemble polygons from closed ways and multipolygon relations
//!   ([`MultipolygonCollector`]).
//! - Persist classified areas to Spatialite or GeoPackage ([`FeatureWriter`]).
//! - Drive the two-pass extraction ([`extract_water_areas`]).
//!
//! Classification itself lives in `waterareas-core`.

mod assembler;
mod index;
mod pipeline;
mod source;
mod store;

pub use assembler::{
    AREA_RELATION_TYPES, AreaSink, AssemblerConfig, AssemblerStats, AssemblyProblem,
    MultipolygonCollector, is_closed_area,
};
pub use index::{
    DenseMemArray, DenseMmapArray, IndexError, IndexType, Location, LocationHandler,
    LocationIndex, NodeRef, NullIndex, SparseMemArray, SparseMemMap, create_index,
};
pub use pipeline::{
    ExtractError, ExtractOptions, ExtractReport, WaterAreaHandler, extract_water_areas,
};
pub use source::{
    ElementScope, InputFormat, InputSource, Member, MemberKind, OsmElement, OsmInput, ReadError,
    Relation, Way,
};
pub use store::{
    BATCH_SIZE, FIELDS, FeatureWriter, FieldKind, FieldSpec, LAYER_NAME, OutputFormat,
    WriteOutcome, WriterError,
};
