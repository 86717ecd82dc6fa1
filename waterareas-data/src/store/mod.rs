//! Persistence of water-area features into SQLite-based spatial databases.
#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use geo::Rect;
use log::warn;
use rusqlite::{Connection, Error as SqliteError};
use thiserror::Error;
use waterareas_core::{GeometryErrorKind, Projection, WaterAreaFeature};

mod blob;
mod schema;

pub use schema::{FIELDS, FieldKind, FieldSpec, LAYER_NAME};

/// Rows written per transaction.
pub const BATCH_SIZE: usize = 10_000;

const GPKG_APPLICATION_ID: i32 = 1_196_444_487;
const GPKG_USER_VERSION: i32 = 10_200;

/// Output database layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// SQLite with Spatialite metadata tables and geometry blobs.
    #[default]
    Spatialite,
    /// OGC GeoPackage.
    GeoPackage,
}

impl OutputFormat {
    /// Every supported format.
    pub const ALL: [Self; 2] = [Self::Spatialite, Self::GeoPackage];

    /// Driver name accepted on the command line.
    pub const fn driver_name(self) -> &'static str {
        match self {
            Self::Spatialite => "SQLite",
            Self::GeoPackage => "GPKG",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.driver_name())
    }
}

impl FromStr for OutputFormat {
    type Err = WriterError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.driver_name().eq_ignore_ascii_case(name))
            .ok_or_else(|| WriterError::UnknownFormat {
                name: name.to_owned(),
                supported: Self::ALL
                    .iter()
                    .map(|format| format.driver_name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Errors raised while creating or filling the output database.
#[derive(Debug, Error)]
pub enum WriterError {
    /// The output format name is not supported.
    #[error("unknown output format {name:?}; supported formats: {supported}")]
    UnknownFormat {
        /// Requested name.
        name: String,
        /// Comma-separated list of valid names.
        supported: String,
    },
    /// The output path is already taken.
    #[error("output {path:?} already exists")]
    AlreadyExists {
        /// Destination path.
        path: Utf8PathBuf,
    },
    /// Inspecting the output path or creating its parent failed.
    #[error("failed to prepare output location {path:?}")]
    Prepare {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Destination path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Setting a connection pragma failed.
    #[error("failed to set SQLite pragma {pragma}")]
    Pragma {
        /// Pragma name.
        pragma: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Creating the layer schema failed.
    #[error("failed to create output schema: {step}")]
    Schema {
        /// Schema step that failed.
        step: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Inserting a feature failed.
    #[error("failed to write area {id}")]
    Insert {
        /// Area id of the row.
        id: i64,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Beginning or committing a batch failed.
    #[error("failed to {action} write transaction")]
    Transaction {
        /// `begin` or `commit`.
        action: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Updating layer metadata after the last row failed.
    #[error("failed to update layer extent")]
    Extent {
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
}

/// Result of offering a feature to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The row was inserted.
    Written,
    /// The geometry could not be encoded; nothing was inserted.
    Rejected(GeometryErrorKind),
}

/// Writes the `waterareas` layer of a new database.
///
/// Rows are committed every [`BATCH_SIZE`] inserts and on
/// [`FeatureWriter::finish`]. A writer dropped without finishing commits its
/// pending rows on a best-effort basis.
pub struct FeatureWriter {
    connection: Connection,
    path: Utf8PathBuf,
    format: OutputFormat,
    projection: Projection,
    insert_sql: String,
    pending: usize,
    written: u64,
    in_transaction: bool,
    extent: Option<Rect<f64>>,
}

impl fmt::Debug for FeatureWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureWriter")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("projection", &self.projection)
            .field("pending", &self.pending)
            .field("written", &self.written)
            .finish_non_exhaustive()
    }
}

impl FeatureWriter {
    /// Create a new database at `path` with an empty `waterareas` layer.
    ///
    /// Fails if anything already exists at `path`. Missing parent directories
    /// are created.
    pub fn create(
        path: &Utf8Path,
        format: OutputFormat,
        projection: Projection,
    ) -> Result<Self, WriterError> {
        let prepare_error = |source| WriterError::Prepare {
            path: path.to_path_buf(),
            source,
        };
        if waterareas_fs::path_exists(path).map_err(prepare_error)? {
            return Err(WriterError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }
        waterareas_fs::ensure_parent_dir(path).map_err(prepare_error)?;

        let mut connection =
            Connection::open(path.as_std_path()).map_err(|source| WriterError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        connection
            .pragma_update(None, "synchronous", "OFF")
            .map_err(|source| WriterError::Pragma {
                pragma: "synchronous",
                source,
            })?;
        if format == OutputFormat::GeoPackage {
            connection
                .pragma_update(None, "application_id", GPKG_APPLICATION_ID)
                .map_err(|source| WriterError::Pragma {
                    pragma: "application_id",
                    source,
                })?;
            connection
                .pragma_update(None, "user_version", GPKG_USER_VERSION)
                .map_err(|source| WriterError::Pragma {
                    pragma: "user_version",
                    source,
                })?;
        }

        let transaction = connection
            .transaction()
            .map_err(|source| WriterError::Schema {
                step: "begin schema transaction",
                source,
            })?;
        schema::create(&transaction, format, projection)?;
        transaction
            .commit()
            .map_err(|source| WriterError::Schema {
                step: "commit schema transaction",
                source,
            })?;

        Ok(Self {
            connection,
            path: path.to_path_buf(),
            format,
            projection,
            insert_sql: format.insert_sql(),
            pending: 0,
            written: 0,
            in_transaction: false,
            extent: None,
        })
    }

    /// Path of the database being written.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Number of rows inserted so far.
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// Insert one feature.
    ///
    /// Geometries that cannot be encoded are reported as
    /// [`WriteOutcome::Rejected`] and leave the database untouched.
    pub fn write(&mut self, feature: &WaterAreaFeature<'_>) -> Result<WriteOutcome, WriterError> {
        let srid = self.projection.srid();
        let encoded = match self.format {
            OutputFormat::Spatialite => blob::spatialite(&feature.geometry, srid),
            OutputFormat::GeoPackage => blob::gpkg(&feature.geometry, srid),
        };
        let (geometry, bounds) = match encoded.and_then(|bytes| {
            blob::envelope(&feature.geometry).map(|bounds| (bytes, bounds))
        }) {
            Ok(encoded) => encoded,
            Err(kind) => return Ok(WriteOutcome::Rejected(kind)),
        };

        self.begin()?;
        let mut statement = self
            .connection
            .prepare_cached(&self.insert_sql)
            .map_err(|source| WriterError::Insert {
                id: feature.id,
                source,
            })?;
        statement
            .execute((
                feature.id_value(),
                feature.water_type.as_str(),
                feature.ftype(),
                i32::from(feature.intermittent),
                i32::from(feature.salt),
                i32::from(feature.maritime),
                feature.name,
                geometry,
            ))
            .map_err(|source| WriterError::Insert {
                id: feature.id,
                source,
            })?;
        drop(statement);

        self.written += 1;
        self.pending += 1;
        self.extent = Some(match self.extent {
            Some(extent) => merge(extent, bounds),
            None => bounds,
        });
        if self.pending >= BATCH_SIZE {
            self.commit()?;
        }
        Ok(WriteOutcome::Written)
    }

    /// Commit outstanding rows and finalise layer metadata.
    pub fn finish(mut self) -> Result<u64, WriterError> {
        if self.format == OutputFormat::GeoPackage {
            self.begin()?;
            self.record_extent()?;
        }
        self.commit()?;
        Ok(self.written)
    }

    fn record_extent(&self) -> Result<(), WriterError> {
        let Some(extent) = self.extent else {
            return Ok(());
        };
        self.connection
            .execute(
                "UPDATE gpkg_contents SET min_x = ?1, min_y = ?2, max_x = ?3, max_y = ?4
                 WHERE table_name = ?5",
                (
                    extent.min().x,
                    extent.min().y,
                    extent.max().x,
                    extent.max().y,
                    LAYER_NAME,
                ),
            )
            .map(|_| ())
            .map_err(|source| WriterError::Extent { source })
    }

    fn begin(&mut self) -> Result<(), WriterError> {
        if self.in_transaction {
            return Ok(());
        }
        self.connection
            .execute_batch("BEGIN")
            .map_err(|source| WriterError::Transaction {
                action: "begin",
                source,
            })?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), WriterError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.connection
            .execute_batch("COMMIT")
            .map_err(|source| WriterError::Transaction {
                action: "commit",
                source,
            })?;
        self.in_transaction = false;
        self.pending = 0;
        Ok(())
    }
}

impl Drop for FeatureWriter {
    fn drop(&mut self) {
        if let Err(err) = self.commit() {
            warn!("Could not commit pending rows to {}: {err}", self.path);
        }
    }
}

fn merge(a: Rect<f64>, b: Rect<f64>) -> Rect<f64> {
    Rect::new(
        geo::Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        geo::Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}
