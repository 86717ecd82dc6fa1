//! Two-pass water-area extraction.
//!
//! Pass 1 scans relations so the assembler knows which ways to keep. Pass 2
//! records node locations, assembles areas from ways and completed
//! relations, and classifies and writes each area as soon as it exists.

use std::ops::ControlFlow;

use camino::Utf8PathBuf;
use log::{debug, info, warn};
use thiserror::Error;
use waterareas_core::{AssembledArea, Projection, TagSet, build_feature, classify, is_water_area};

use crate::assembler::{AreaSink, AssemblerConfig, AssemblerStats, MultipolygonCollector};
use crate::index::{IndexType, LocationHandler, create_index};
use crate::source::{ElementScope, InputSource, OsmElement, OsmInput, ReadError};
use crate::store::{FeatureWriter, OutputFormat, WriteOutcome, WriterError};

/// Settings for one extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    /// OSM data to read.
    pub input: InputSource,
    /// Database to create.
    pub output: Utf8PathBuf,
    /// Output layout.
    pub format: OutputFormat,
    /// Node-location index implementation.
    pub index: IndexType,
    /// Projection applied to written geometries.
    pub projection: Projection,
    /// Assembler diagnostics.
    pub assembler: AssemblerConfig,
}

impl ExtractOptions {
    /// Options with default format, index, projection and diagnostics.
    pub fn new(input: InputSource, output: impl Into<Utf8PathBuf>) -> Self {
        Self {
            input,
            output: output.into(),
            format: OutputFormat::default(),
            index: IndexType::default(),
            projection: Projection::default(),
            assembler: AssemblerConfig::default(),
        }
    }
}

/// Summary of an extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Nodes read in pass 2.
    pub nodes: u64,
    /// Ways read in pass 2.
    pub ways: u64,
    /// Area relations tracked in pass 1, water or not.
    pub relations: u64,
    /// Assembler counters.
    pub assembler: AssemblerStats,
    /// Rows written to the layer.
    pub written: u64,
    /// Areas skipped because their geometry was illegal.
    pub rejected: u64,
    /// Area relations whose member ways were not all found, in input order.
    pub incomplete_relations: Vec<i64>,
}

/// Fatal extraction errors.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Reading the OSM input failed.
    #[error(transparent)]
    Read(#[from] ReadError),
    /// Creating or writing the output failed.
    #[error(transparent)]
    Write(#[from] WriterError),
}

/// Classifies assembled areas and hands accepted ones to the writer.
#[derive(Debug)]
pub struct WaterAreaHandler {
    writer: FeatureWriter,
    projection: Projection,
    rejected: u64,
    not_water: u64,
}

impl WaterAreaHandler {
    /// Wrap a writer.
    pub fn new(writer: FeatureWriter, projection: Projection) -> Self {
        Self {
            writer,
            projection,
            rejected: 0,
            not_water: 0,
        }
    }

    /// Areas skipped because of illegal geometry.
    pub const fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Commit the output and return the number of rows written.
    pub fn finish(self) -> Result<u64, WriterError> {
        if self.not_water > 0 {
            debug!("{} assembled areas were not water", self.not_water);
        }
        self.writer.finish()
    }

    fn reject(&mut self, area: &AssembledArea, reason: impl std::fmt::Display) {
        self.rejected += 1;
        warn!(
            "Ignoring illegal geometry for area {} created from {} with id={}.",
            area.id, area.origin, area.orig_id
        );
        debug!("area {} rejected: {reason}", area.id);
    }
}

impl AreaSink for WaterAreaHandler {
    type Error = WriterError;

    fn accepts(&self, tags: &TagSet) -> bool {
        is_water_area(tags)
    }

    fn area(&mut self, area: AssembledArea) -> Result<(), Self::Error> {
        let Some(classification) = classify(&area.tags) else {
            self.not_water += 1;
            return Ok(());
        };
        let feature = match build_feature(&area, classification, self.projection) {
            Ok(feature) => feature,
            Err(kind) => {
                self.reject(&area, kind);
                return Ok(());
            }
        };
        if let WriteOutcome::Rejected(kind) = self.writer.write(&feature)? {
            self.reject(&area, kind);
        }
        Ok(())
    }
}

/// Extract water areas from OSM data into a new spatial database.
///
/// # Examples
/// ```no_run
/// use waterareas_data::{ExtractOptions, InputSource, extract_water_areas};
///
/// # fn main() -> Result<(), waterareas_data::ExtractError> {
/// let options = ExtractOptions::new(InputSource::from_arg("region.osm.pbf"), "water.sqlite");
/// let report = extract_water_areas(&options)?;
/// println!("wrote {} water areas", report.written);
/// # Ok(())
/// # }
/// ```
pub fn extract_water_areas(options: &ExtractOptions) -> Result<ExtractReport, ExtractError> {
    let input = OsmInput::open(&options.input)?;
    debug!("reading {} as {:?}", input.path(), input.format());
    let mut report = ExtractReport::default();

    let mut collector = MultipolygonCollector::new(options.assembler);
    info!("Pass 1...");
    collector.read_relations(&input, is_water_area)?;
    report.relations = collector.stats().relations_tracked;
    info!("Pass 1 done");

    let writer = FeatureWriter::create(&options.output, options.format, options.projection)?;
    let mut handler = WaterAreaHandler::new(writer, options.projection);
    let mut locations = LocationHandler::new(create_index(options.index));

    info!("Pass 2...");
    let mut failure = None;
    input.read(ElementScope::All, |element| {
        match element {
            OsmElement::Node { id, lon, lat } => {
                report.nodes += 1;
                locations.node(id, lon, lat);
            }
            OsmElement::Way(way) => {
                report.ways += 1;
                if let Err(err) = collector.handle_way(&way, &mut locations, &mut handler) {
                    failure = Some(err);
                    return ControlFlow::Break(());
                }
            }
            OsmElement::Relation(_) => {}
        }
        ControlFlow::Continue(())
    })?;
    if let Some(err) = failure {
        return Err(err.into());
    }
    report.incomplete_relations = collector.finish(&mut handler)?;
    info!("Pass 2 done");
    debug!(
        "location index held {} nodes in {} bytes ({} rejected)",
        locations.stored(),
        locations.used_memory(),
        locations.rejected()
    );

    if !report.incomplete_relations.is_empty() {
        let ids: Vec<String> = report
            .incomplete_relations
            .iter()
            .map(ToString::to_string)
            .collect();
        warn!(
            "Some member ways missing for these multipolygon relations: {}",
            ids.join(" ")
        );
    }

    report.rejected = handler.rejected();
    report.written = handler.finish()?;
    report.assembler = collector.stats();
    info!(
        "Wrote {} water areas to {} ({} rejected, {} incomplete relations)",
        report.written,
        options.output,
        report.rejected,
        report.incomplete_relations.len()
    );
    Ok(report)
}
