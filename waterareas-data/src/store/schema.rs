//! Table layouts for the `waterareas` layer.

use rusqlite::Transaction;
use waterareas_core::Projection;

use super::{OutputFormat, WriterError};

/// Name of the output layer.
pub const LAYER_NAME: &str = "waterareas";

/// Attribute column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Double-precision number.
    Real,
    /// Integer flag or code.
    Integer,
    /// Text with a declared maximum width.
    String,
}

/// An attribute column of the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Column name.
    pub name: &'static str,
    /// Column type.
    pub kind: FieldKind,
    /// Declared width.
    pub width: u8,
}

const fn field(name: &'static str, kind: FieldKind, width: u8) -> FieldSpec {
    FieldSpec { name, kind, width }
}

/// Attribute columns in declaration order.
pub const FIELDS: [FieldSpec; 7] = [
    field("id", FieldKind::Real, 10),
    field("type", FieldKind::String, 30),
    field("ftype", FieldKind::Integer, 2),
    field("intermittent", FieldKind::Integer, 2),
    field("salt", FieldKind::Integer, 2),
    field("maritime", FieldKind::Integer, 2),
    field("name", FieldKind::String, 64),
];

impl OutputFormat {
    /// Name of the geometry column.
    pub const fn geometry_column(self) -> &'static str {
        match self {
            Self::Spatialite => "GEOMETRY",
            Self::GeoPackage => "geom",
        }
    }

    /// Name of the feature id column.
    pub const fn fid_column(self) -> &'static str {
        match self {
            Self::Spatialite => "ogc_fid",
            Self::GeoPackage => "fid",
        }
    }

    fn column_type(self, spec: FieldSpec) -> String {
        match (self, spec.kind) {
            (Self::Spatialite, FieldKind::Real) => "FLOAT".to_owned(),
            (Self::GeoPackage, FieldKind::Real) => "REAL".to_owned(),
            (Self::Spatialite, FieldKind::Integer) => "INTEGER".to_owned(),
            (Self::GeoPackage, FieldKind::Integer) => "MEDIUMINT".to_owned(),
            (Self::Spatialite, FieldKind::String) => format!("VARCHAR({})", spec.width),
            (Self::GeoPackage, FieldKind::String) => format!("TEXT({})", spec.width),
        }
    }

    fn layer_ddl(self) -> String {
        let geometry_type = match self {
            Self::Spatialite => "BLOB",
            Self::GeoPackage => "MULTIPOLYGON",
        };
        let columns: Vec<String> = FIELDS
            .iter()
            .map(|spec| format!("{} {}", spec.name, self.column_type(*spec)))
            .collect();
        format!(
            "CREATE TABLE {LAYER_NAME} (
                {fid} INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                {columns},
                {geometry} {geometry_type}
            )",
            fid = self.fid_column(),
            columns = columns.join(",\n                "),
            geometry = self.geometry_column(),
        )
    }

    pub(super) fn insert_sql(self) -> String {
        let names: Vec<&str> = FIELDS.iter().map(|spec| spec.name).collect();
        let placeholders: Vec<String> = (1..=FIELDS.len() + 1).map(|n| format!("?{n}")).collect();
        format!(
            "INSERT INTO {LAYER_NAME} ({}, {}) VALUES ({})",
            names.join(", "),
            self.geometry_column(),
            placeholders.join(", "),
        )
    }
}

fn run_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), WriterError> {
    transaction
        .execute_batch(sql)
        .map_err(|source| WriterError::Schema { step, source })
}

/// Create the metadata tables and the empty layer.
pub(super) fn create(
    transaction: &Transaction<'_>,
    format: OutputFormat,
    projection: Projection,
) -> Result<(), WriterError> {
    match format {
        OutputFormat::Spatialite => create_spatialite(transaction, projection)?,
        OutputFormat::GeoPackage => create_geopackage(transaction, projection)?,
    }
    run_step(transaction, "create layer table", &format.layer_ddl())
}

fn create_spatialite(
    transaction: &Transaction<'_>,
    projection: Projection,
) -> Result<(), WriterError> {
    run_step(
        transaction,
        "create spatial_ref_sys",
        "CREATE TABLE spatial_ref_sys (
            srid INTEGER NOT NULL PRIMARY KEY,
            auth_name TEXT NOT NULL,
            auth_srid INTEGER NOT NULL,
            ref_sys_name TEXT NOT NULL DEFAULT 'Unknown',
            proj4text TEXT NOT NULL,
            srtext TEXT NOT NULL DEFAULT 'Undefined'
        )",
    )?;
    run_step(
        transaction,
        "create geometry_columns",
        "CREATE TABLE geometry_columns (
            f_table_name TEXT NOT NULL,
            f_geometry_column TEXT NOT NULL,
            geometry_type INTEGER NOT NULL,
            coord_dimension INTEGER NOT NULL,
            srid INTEGER NOT NULL,
            spatial_index_enabled INTEGER NOT NULL,
            CONSTRAINT pk_geom_cols PRIMARY KEY (f_table_name, f_geometry_column),
            CONSTRAINT fk_gc_srs FOREIGN KEY (srid) REFERENCES spatial_ref_sys (srid)
        )",
    )?;
    transaction
        .execute(
            "INSERT INTO spatial_ref_sys (srid, auth_name, auth_srid, ref_sys_name, proj4text)
             VALUES (?1, 'epsg', ?1, ?2, ?3)",
            (projection.srid(), projection.name(), projection.proj_string()),
        )
        .map_err(|source| WriterError::Schema {
            step: "register reference system",
            source,
        })?;
    // Spatialite stores geometry column names in lower case.
    transaction
        .execute(
            "INSERT INTO geometry_columns
             (f_table_name, f_geometry_column, geometry_type, coord_dimension, srid,
              spatial_index_enabled)
             VALUES (?1, ?2, 6, 2, ?3, 0)",
            (
                LAYER_NAME,
                OutputFormat::Spatialite.geometry_column().to_ascii_lowercase(),
                projection.srid(),
            ),
        )
        .map(|_| ())
        .map_err(|source| WriterError::Schema {
            step: "register geometry column",
            source,
        })
}

fn create_geopackage(
    transaction: &Transaction<'_>,
    projection: Projection,
) -> Result<(), WriterError> {
    run_step(
        transaction,
        "create gpkg_spatial_ref_sys",
        "CREATE TABLE gpkg_spatial_ref_sys (
            srs_name TEXT NOT NULL,
            srs_id INTEGER NOT NULL PRIMARY KEY,
            organization TEXT NOT NULL,
            organization_coordsys_id INTEGER NOT NULL,
            definition TEXT NOT NULL,
            description TEXT
        );
        INSERT INTO gpkg_spatial_ref_sys VALUES
            ('Undefined cartesian SRS', -1, 'NONE', -1, 'undefined', 'undefined cartesian coordinate reference system'),
            ('Undefined geographic SRS', 0, 'NONE', 0, 'undefined', 'undefined geographic coordinate reference system')",
    )?;
    run_step(
        transaction,
        "create gpkg_contents",
        "CREATE TABLE gpkg_contents (
            table_name TEXT NOT NULL PRIMARY KEY,
            data_type TEXT NOT NULL,
            identifier TEXT UNIQUE,
            description TEXT DEFAULT '',
            last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
            min_x DOUBLE,
            min_y DOUBLE,
            max_x DOUBLE,
            max_y DOUBLE,
            srs_id INTEGER,
            CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
        )",
    )?;
    run_step(
        transaction,
        "create gpkg_geometry_columns",
        "CREATE TABLE gpkg_geometry_columns (
            table_name TEXT NOT NULL,
            column_name TEXT NOT NULL,
            geometry_type_name TEXT NOT NULL,
            srs_id INTEGER NOT NULL,
            z TINYINT NOT NULL,
            m TINYINT NOT NULL,
            CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name),
            CONSTRAINT fk_gc_tn FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
            CONSTRAINT fk_gc_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys (srs_id)
        )",
    )?;
    // GeoPackage readers expect EPSG:4326 to be present whatever the layer uses.
    let mut systems = vec![Projection::Wgs84];
    if projection != Projection::Wgs84 {
        systems.push(projection);
    }
    for system in systems {
        transaction
            .execute(
                "INSERT INTO gpkg_spatial_ref_sys
                 (srs_name, srs_id, organization, organization_coordsys_id, definition,
                  description)
                 VALUES (?1, ?2, 'EPSG', ?2, 'undefined', ?3)",
                (system.name(), system.srid(), system.proj_string()),
            )
            .map_err(|source| WriterError::Schema {
                step: "register reference system",
                source,
            })?;
    }
    transaction
        .execute(
            "INSERT INTO gpkg_contents (table_name, data_type, identifier, srs_id)
             VALUES (?1, 'features', ?1, ?2)",
            (LAYER_NAME, projection.srid()),
        )
        .map_err(|source| WriterError::Schema {
            step: "register layer contents",
            source,
        })?;
    transaction
        .execute(
            "INSERT INTO gpkg_geometry_columns
             (table_name, column_name, geometry_type_name, srs_id, z, m)
             VALUES (?1, ?2, 'MULTIPOLYGON', ?3, 0, 0)",
            (
                LAYER_NAME,
                OutputFormat::GeoPackage.geometry_column(),
                projection.srid(),
            ),
        )
        .map(|_| ())
        .map_err(|source| WriterError::Schema {
            step: "register geometry column",
            source,
        })
}
