//! Test helpers for building CLI datasets.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

const LAKE_OSM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="53.500" lon="10.000"/>
  <node id="2" lat="53.500" lon="10.010"/>
  <node id="3" lat="53.510" lon="10.010"/>
  <node id="4" lat="53.510" lon="10.000"/>
  <way id="100">
    <nd ref="1"/>
    <nd ref="2"/>
    <nd ref="3"/>
    <nd ref="4"/>
    <nd ref="1"/>
    <tag k="natural" v="water"/>
    <tag k="name" v="Lake X"/>
  </way>
</osm>
"#;

/// A scratch directory with a one-lake OSM XML input.
#[derive(Debug)]
pub(super) struct Dataset {
    dir: TempDir,
    input: Utf8PathBuf,
}

impl Dataset {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let input = Utf8PathBuf::from_path_buf(dir.path().join("lake.osm")).expect("utf-8 path");
        fs::write(&input, LAKE_OSM).expect("write OSM fixture");
        Self { dir, input }
    }

    pub(super) fn input(&self) -> &Utf8Path {
        &self.input
    }

    pub(super) fn root(&self) -> &Utf8Path {
        Utf8Path::from_path(self.dir.path()).expect("utf-8 path")
    }

    pub(super) fn output(&self, name: &str) -> Utf8PathBuf {
        self.root().join(name)
    }
}

/// Parse an invocation of the binary.
pub(super) fn parse(args: &[&str]) -> Result<super::ExtractArgs, clap::Error> {
    use clap::Parser;
    super::ExtractArgs::try_parse_from(std::iter::once("waterareas").chain(args.iter().copied()))
}

/// Count rows of the output layer.
pub(super) fn count_rows(path: &Utf8Path) -> i64 {
    rusqlite::Connection::open(path.as_std_path())
        .and_then(|connection| {
            connection.query_row("SELECT COUNT(*) FROM waterareas", [], |row| row.get(0))
        })
        .expect("count output rows")
}
