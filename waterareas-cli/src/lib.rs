//! Command-line interface for extracting OSM water areas into a spatial
//! database.
//!
//! ```text
//! waterareas [OPTIONS] [INFILE [OUTFILE]]
//! ```
//!
//! `INFILE` is an OSM PBF or OSM XML file; `-` or no argument reads standard
//! input. `OUTFILE` defaults to `ogr_out`.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use env_logger::{Builder, Env};
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use waterareas_data::{
    AssemblerConfig, ExtractOptions, ExtractReport, IndexType, InputSource, OutputFormat,
    extract_water_areas,
};

mod error;

pub use error::CliError;

const ARG_DEBUG: &str = "debug";
const ARG_INDEX: &str = "index";
const ARG_FORMAT: &str = "format";
const ARG_INFILE: &str = "INFILE";
const STDIN_ARG: &str = "-";
const DEFAULT_OUTPUT: &str = "ogr_out";

/// Run the CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let args = ExtractArgs::try_parse().map_err(CliError::ArgumentParsing)?;
    let config = args.into_config()?;
    init_logging(config.log_filter());
    config.validate_sources()?;
    execute(&config)?;
    Ok(())
}

fn init_logging(filter: &'static str) {
    let installed = Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .try_init();
    if installed.is_err() {
        debug!("logger already installed; keeping it");
    }
}

fn execute(config: &ExtractConfig) -> Result<ExtractReport, CliError> {
    Ok(extract_water_areas(&config.options())?)
}

/// Command-line arguments, layered with configuration files and the
/// environment.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "waterareas",
    about = "Extract water areas from OSM data into a Spatialite or GeoPackage database",
    long_about = "Read OSM PBF or XML data, assemble polygons from closed ways and \
                  multipolygon relations, and write every water body to the \
                  `waterareas` layer of a new database.",
    version
)]
#[ortho_config(prefix = "WATERAREAS")]
struct ExtractArgs {
    /// Enable assembler diagnostics; `--debug=2` also logs at trace level.
    #[arg(
        short = 'd',
        long = ARG_DEBUG,
        value_name = "level",
        num_args = 0..=1,
        default_missing_value = "1",
        require_equals = true
    )]
    #[serde(default)]
    debug: Option<u8>,
    /// Location index type (default: dense_mmap_array).
    #[arg(short = 'i', long = ARG_INDEX, value_name = "INDEX_TYPE")]
    #[serde(default)]
    index: Option<String>,
    /// Output driver, `SQLite` or `GPKG` (default: SQLite).
    #[arg(short = 'f', long = ARG_FORMAT, value_name = "FORMAT")]
    #[serde(default)]
    format: Option<String>,
    /// OSM PBF or XML input; `-` reads standard input.
    #[arg(value_name = ARG_INFILE)]
    #[serde(default)]
    infile: Option<String>,
    /// Output database path.
    #[arg(value_name = "OUTFILE")]
    #[serde(default)]
    outfile: Option<Utf8PathBuf>,
}

impl ExtractArgs {
    fn into_config(self) -> Result<ExtractConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ExtractConfig::try_from(merged)
    }
}

/// Validated extraction settings.
#[derive(Debug, Clone, PartialEq)]
struct ExtractConfig {
    input: InputSource,
    output: Utf8PathBuf,
    format: OutputFormat,
    index: IndexType,
    debug: u8,
}

impl ExtractConfig {
    const fn log_filter(&self) -> &'static str {
        match self.debug {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    fn validate_sources(&self) -> Result<(), CliError> {
        match &self.input {
            InputSource::Stdin => Ok(()),
            InputSource::File(path) => Self::require_existing(path, ARG_INFILE),
        }
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match waterareas_fs::file_is_file(path) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingSourceFile {
                    field,
                    path: path.to_path_buf(),
                })
            }
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn options(&self) -> ExtractOptions {
        let mut options = ExtractOptions::new(self.input.clone(), self.output.clone());
        options.format = self.format;
        options.index = self.index;
        options.assembler = AssemblerConfig {
            debug_level: self.debug,
        };
        options
    }
}

impl TryFrom<ExtractArgs> for ExtractConfig {
    type Error = CliError;

    fn try_from(args: ExtractArgs) -> Result<Self, Self::Error> {
        let index = args
            .index
            .as_deref()
            .map(str::parse::<IndexType>)
            .transpose()
            .map_err(CliError::InvalidIndex)?
            .unwrap_or_default();
        let format = args
            .format
            .as_deref()
            .map(str::parse::<OutputFormat>)
            .transpose()
            .map_err(CliError::InvalidFormat)?
            .unwrap_or_default();
        let input = InputSource::from_arg(args.infile.as_deref().unwrap_or(STDIN_ARG));
        Ok(Self {
            input,
            output: args
                .outfile
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT)),
            format,
            index,
            debug: args.debug.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests;
