//! Error types emitted by the `waterareas` CLI.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use waterareas_data::{ExtractError, IndexError, WriterError};

/// Errors emitted by the `waterareas` CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation, or help was requested.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// The `--index` value names no location index.
    #[error("invalid --index value: {0}")]
    InvalidIndex(#[source] IndexError),
    /// The `--format` value names no output driver.
    #[error("invalid --format value: {0}")]
    InvalidFormat(#[source] WriterError),
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The extraction itself failed.
    #[error("failed to extract water areas: {0}")]
    Extract(#[from] ExtractError),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// Help and version requests surface as parse errors but are not
    /// failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ArgumentParsing(err) if !err.use_stderr() => 0,
            _ => 1,
        }
    }
}
