//! OSM input decoding.
//!
//! Both supported encodings (PBF and XML) are normalised into
//! [`OsmElement`] values. Nodes only carry their location; ways and
//! relations keep their tags because the assembler needs them.

use std::io::{self, Read};
use std::ops::ControlFlow;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempPath;
use thiserror::Error;
use waterareas_core::TagSet;

mod pbf;
mod spool;
mod xml;

/// Where the OSM data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Read from standard input.
    Stdin,
    /// Read from a file.
    File(Utf8PathBuf),
}

impl InputSource {
    /// Interpret a command-line argument; `-` selects standard input.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(Utf8PathBuf::from(arg))
        }
    }
}

/// Encoding of an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// OSM PBF blobs.
    Pbf,
    /// OSM XML document.
    Xml,
}

impl InputFormat {
    /// Guess the encoding from the leading bytes of a file.
    ///
    /// XML documents start with `<` after optional whitespace and byte-order
    /// mark; anything else is handed to the PBF decoder.
    pub fn sniff(head: &[u8]) -> Self {
        let body = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
        match body.iter().find(|byte| !byte.is_ascii_whitespace()) {
            Some(b'<') => Self::Xml,
            _ => Self::Pbf,
        }
    }
}

/// Which element kinds a pass needs materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementScope {
    /// Only relations (relation scan).
    Relations,
    /// Nodes, ways and relations.
    All,
}

impl ElementScope {
    const fn wants_nodes_and_ways(self) -> bool {
        matches!(self, Self::All)
    }
}

/// Kind of a relation member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Node member.
    Node,
    /// Way member.
    Way,
    /// Relation member.
    Relation,
}

/// A relation member reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Member kind.
    pub kind: MemberKind,
    /// Referenced object id.
    pub id: i64,
    /// Member role, empty when unset.
    pub role: String,
}

/// A way with its node references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Way {
    /// Way id.
    pub id: i64,
    /// Node ids in path order.
    pub refs: Vec<i64>,
    /// Way tags.
    pub tags: TagSet,
}

impl Way {
    /// Return true when the first and last node references match.
    pub fn is_closed(&self) -> bool {
        self.refs.len() > 1 && self.refs.first() == self.refs.last()
    }
}

/// A relation with its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Relation id.
    pub id: i64,
    /// Members in source order.
    pub members: Vec<Member>,
    /// Relation tags.
    pub tags: TagSet,
}

/// A decoded OSM element.
#[derive(Debug, Clone, PartialEq)]
pub enum OsmElement {
    /// A node location in WGS84 degrees.
    Node {
        /// Node id.
        id: i64,
        /// Longitude in degrees.
        lon: f64,
        /// Latitude in degrees.
        lat: f64,
    },
    /// A way.
    Way(Way),
    /// A relation.
    Relation(Relation),
}

/// Errors raised while reading OSM input.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The input file could not be opened or read.
    #[error("failed to read OSM input at {path:?}")]
    Open {
        /// Input path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Standard input could not be copied to a temporary file.
    #[error("failed to buffer standard input")]
    Spool {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The PBF decoder rejected the data.
    #[error("failed to decode OSM PBF data at {path:?}")]
    Pbf {
        /// Input path.
        path: Utf8PathBuf,
        /// Source error returned by `osmpbf`.
        #[source]
        source: osmpbf::Error,
    },
    /// The XML parser rejected the document.
    #[error("failed to parse OSM XML at {path:?}")]
    Xml {
        /// Input path.
        path: Utf8PathBuf,
        /// Source error returned by `roxmltree`.
        #[source]
        source: roxmltree::Error,
    },
    /// An XML element lacks a required attribute or carries a bad value.
    #[error("malformed <{element}> in OSM XML at {path:?}: {detail}")]
    MalformedXml {
        /// Input path.
        path: Utf8PathBuf,
        /// Element name.
        element: String,
        /// What was wrong.
        detail: String,
    },
}

/// An opened OSM input that can be read several times.
///
/// Standard input is copied into a temporary file when opened; the file is
/// removed when the input is dropped.
#[derive(Debug)]
pub struct OsmInput {
    path: Utf8PathBuf,
    format: InputFormat,
    spool: Option<TempPath>,
}

impl OsmInput {
    /// Open an input source and detect its encoding.
    pub fn open(source: &InputSource) -> Result<Self, ReadError> {
        match source {
            InputSource::File(path) => {
                let format = detect_format(path)?;
                Ok(Self {
                    path: path.clone(),
                    format,
                    spool: None,
                })
            }
            InputSource::Stdin => {
                let (path, spool) = spool::spool_stdin()?;
                let format = detect_format(&path)?;
                Ok(Self {
                    path,
                    format,
                    spool: Some(spool),
                })
            }
        }
    }

    /// Path the data is read from.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Detected encoding.
    pub const fn format(&self) -> InputFormat {
        self.format
    }

    /// Return true when the data was buffered from standard input.
    pub const fn is_spooled(&self) -> bool {
        self.spool.is_some()
    }

    /// Decode the input, handing each element of `scope` to `visit` in file
    /// order.
    ///
    /// Returning [`ControlFlow::Break`] from `visit` stops delivery; the
    /// remaining data is skipped.
    pub fn read<F>(&self, scope: ElementScope, visit: F) -> Result<(), ReadError>
    where
        F: FnMut(OsmElement) -> ControlFlow<()>,
    {
        match self.format {
            InputFormat::Pbf => pbf::read(&self.path, scope, visit),
            InputFormat::Xml => xml::read(&self.path, scope, visit),
        }
    }
}

fn detect_format(path: &Utf8Path) -> Result<InputFormat, ReadError> {
    let open_error = |source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    };
    let file = waterareas_fs::open_file(path).map_err(open_error)?;
    let mut head = Vec::with_capacity(64);
    file.take(64).read_to_end(&mut head).map_err(open_error)?;
    Ok(InputFormat::sniff(&head))
}
