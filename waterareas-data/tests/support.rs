//! Shared helpers for the extraction integration tests.

use camino::{Utf8Path, Utf8PathBuf};
use geo::Geometry;
use geozero::ToGeo;
use geozero::wkb::SpatiaLiteWkb;
use rusqlite::Connection;
use tempfile::TempDir;
use waterareas_data::{LAYER_NAME, OutputFormat};

/// Epsilon for comparing stored area ids.
const ID_EPSILON: f64 = 1.0e-9;

/// Directory containing the hand-written OSM XML fixtures.
pub fn fixtures_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Path of a named fixture, checked for existence.
pub fn fixture_path(name: &str) -> Utf8PathBuf {
    let path = fixtures_dir().join(name);
    assert!(path.is_file(), "missing fixture {path}");
    path
}

/// A temporary directory holding the output database of one test.
pub struct Scratch {
    _dir: TempDir,
    /// Database path inside the directory; not created yet.
    pub output: Utf8PathBuf,
}

impl Scratch {
    /// Reserve a fresh output path.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap_or_else(|err| panic!("failed to create temp dir: {err}"));
        let output = Utf8PathBuf::from_path_buf(dir.path().join("water.sqlite"))
            .unwrap_or_else(|path| panic!("temp path {path:?} is not UTF-8"));
        Self { _dir: dir, output }
    }
}

/// One row of the `waterareas` layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: f64,
    pub kind: String,
    pub ftype: i64,
    pub intermittent: i64,
    pub salt: i64,
    pub maritime: i64,
    pub name: Option<String>,
    pub geometry: Vec<u8>,
}

impl Row {
    /// Assert the stored id equals `expected`.
    pub fn assert_id(&self, expected: i64) {
        let expected = expected as f64;
        let delta = (self.id - expected).abs();
        assert!(
            delta <= ID_EPSILON,
            "expected id {expected}, got {} (|Δ| = {delta})",
            self.id
        );
    }

    /// Flags as `(intermittent, salt, maritime)`.
    pub fn flags(&self) -> (i64, i64, i64) {
        (self.intermittent, self.salt, self.maritime)
    }
}

/// Read every row of the layer, ordered by feature id.
pub fn read_rows(path: &Utf8Path, format: OutputFormat) -> Vec<Row> {
    let connection = Connection::open(path.as_std_path())
        .unwrap_or_else(|err| panic!("failed to open {path}: {err}"));
    let sql = format!(
        "SELECT id, type, ftype, intermittent, salt, maritime, name, {geometry}
         FROM {LAYER_NAME} ORDER BY {fid}",
        geometry = format.geometry_column(),
        fid = format.fid_column(),
    );
    let mut statement = connection
        .prepare(&sql)
        .unwrap_or_else(|err| panic!("failed to prepare {sql}: {err}"));
    statement
        .query_map([], |row| {
            Ok(Row {
                id: row.get(0)?,
                kind: row.get(1)?,
                ftype: row.get(2)?,
                intermittent: row.get(3)?,
                salt: row.get(4)?,
                maritime: row.get(5)?,
                name: row.get(6)?,
                geometry: row.get(7)?,
            })
        })
        .and_then(Iterator::collect)
        .unwrap_or_else(|err| panic!("failed to read rows from {path}: {err}"))
}

/// `(polygons, rings of the first polygon)` of a Spatialite geometry blob.
pub fn spatialite_shape(blob: &[u8]) -> (usize, usize) {
    assert_eq!(blob.first(), Some(&0x00), "not a Spatialite blob");
    let geometry = SpatiaLiteWkb(blob.to_vec())
        .to_geo()
        .unwrap_or_else(|err| panic!("undecodable Spatialite blob: {err}"));
    let Geometry::MultiPolygon(polygons) = geometry else {
        panic!("expected a multipolygon, got {geometry:?}");
    };
    let rings = polygons
        .0
        .first()
        .map_or(0, |polygon| polygon.interiors().len() + 1);
    (polygons.0.len(), rings)
}
