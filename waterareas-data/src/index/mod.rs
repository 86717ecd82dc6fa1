//! Node-location indexes.
//!
//! Ways only carry node ids, so the second pass records every node location
//! in an index and resolves way node references against it. Several storage
//! strategies are offered because the best choice depends on the extract
//! size and on whether node ids are dense.

use std::fmt;
use std::io;
use std::str::FromStr;

use geo::Coord;
use log::debug;
use thiserror::Error;

mod dense;
mod sparse;

pub use dense::{DenseMemArray, DenseMmapArray};
pub use sparse::{NullIndex, SparseMemArray, SparseMemMap};

const COORDINATE_PRECISION: f64 = 10_000_000.0;

/// A WGS84 location stored as fixed-point 1e-7 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    x: i32,
    y: i32,
}

impl Location {
    /// Build a location from degrees, rejecting non-finite or out-of-range
    /// values.
    ///
    /// # Examples
    /// ```
    /// use waterareas_data::Location;
    ///
    /// let location = Location::from_degrees(-0.1275, 51.507_222).expect("valid");
    /// assert_eq!(location.fixed(), (-1_275_000, 515_072_220));
    /// assert!(Location::from_degrees(181.0, 0.0).is_none());
    /// ```
    pub fn from_degrees(lon: f64, lat: f64) -> Option<Self> {
        let in_range = lon.is_finite()
            && lat.is_finite()
            && (-180.0..=180.0).contains(&lon)
            && (-90.0..=90.0).contains(&lat);
        in_range.then(|| Self {
            x: (lon * COORDINATE_PRECISION).round() as i32,
            y: (lat * COORDINATE_PRECISION).round() as i32,
        })
    }

    pub(crate) const fn from_fixed(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Fixed-point `(x, y)` pair.
    pub const fn fixed(self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Longitude in degrees.
    pub fn lon(self) -> f64 {
        f64::from(self.x) / COORDINATE_PRECISION
    }

    /// Latitude in degrees.
    pub fn lat(self) -> f64 {
        f64::from(self.y) / COORDINATE_PRECISION
    }

    /// Location as a `geo` coordinate with `x = longitude`.
    pub fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.lon(),
            y: self.lat(),
        }
    }
}

/// Errors raised by location indexes.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The requested index type does not exist.
    #[error("unknown index type {name:?}; supported types: {supported}")]
    UnknownType {
        /// Requested name.
        name: String,
        /// Comma-separated list of valid names.
        supported: String,
    },
    /// Dense indexes cannot store negative ids.
    #[error("node id {id} is negative and cannot be stored in a dense index")]
    NegativeId {
        /// Offending node id.
        id: i64,
    },
    /// The node id does not fit in the address space.
    #[error("node id {id} is too large for a dense index")]
    OutOfRange {
        /// Offending node id.
        id: i64,
    },
    /// Anonymous memory could not be mapped.
    #[error("failed to map {bytes} bytes of anonymous memory")]
    Map {
        /// Requested mapping size.
        bytes: usize,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Storage for node locations keyed by node id.
pub trait LocationIndex {
    /// Record the location of a node, replacing any previous value.
    fn set(&mut self, id: i64, location: Location) -> Result<(), IndexError>;

    /// Look up the location of a node.
    fn get(&self, id: i64) -> Option<Location>;

    /// Prepare the index for lookups. Called once before the first way.
    fn sort(&mut self) {}

    /// Number of stored locations.
    fn len(&self) -> usize;

    /// Return true when nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate heap or mapped memory held by the index, in bytes.
    fn used_memory(&self) -> usize;
}

/// Location index implementations selectable at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexType {
    /// Anonymous memory map indexed by node id.
    #[default]
    DenseMmapArray,
    /// Heap vector indexed by node id.
    DenseMemArray,
    /// Sorted vector of id/location pairs.
    SparseMemArray,
    /// Ordered map from id to location.
    SparseMemMap,
    /// Stores nothing.
    None,
}

impl IndexType {
    /// Every supported index type.
    pub const ALL: [Self; 5] = [
        Self::DenseMmapArray,
        Self::DenseMemArray,
        Self::SparseMemArray,
        Self::SparseMemMap,
        Self::None,
    ];

    /// Name used on the command line.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DenseMmapArray => "dense_mmap_array",
            Self::DenseMemArray => "dense_mem_array",
            Self::SparseMemArray => "sparse_mem_array",
            Self::SparseMemMap => "sparse_mem_map",
            Self::None => "none",
        }
    }

    fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexType {
    type Err = IndexError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| IndexError::UnknownType {
                name: name.to_owned(),
                supported: Self::supported_names(),
            })
    }
}

/// Instantiate an index of the given type.
pub fn create_index(kind: IndexType) -> Box<dyn LocationIndex> {
    match kind {
        IndexType::DenseMmapArray => Box::new(DenseMmapArray::new()),
        IndexType::DenseMemArray => Box::new(DenseMemArray::new()),
        IndexType::SparseMemArray => Box::new(SparseMemArray::new()),
        IndexType::SparseMemMap => Box::new(SparseMemMap::new()),
        IndexType::None => Box::new(NullIndex),
    }
}

/// A way node reference with its resolved location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef {
    /// Node id.
    pub id: i64,
    /// Location, or `None` when the node was not found in the index.
    pub location: Option<Location>,
}

/// Feeds node locations into an index and resolves way node references.
///
/// Errors from the index are not fatal: the node is simply missing later and
/// any area depending on it fails to assemble.
pub struct LocationHandler {
    index: Box<dyn LocationIndex>,
    sorted: bool,
    rejected: u64,
}

impl fmt::Debug for LocationHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationHandler")
            .field("stored", &self.index.len())
            .field("sorted", &self.sorted)
            .field("rejected", &self.rejected)
            .finish()
    }
}

impl LocationHandler {
    /// Wrap an index.
    pub fn new(index: Box<dyn LocationIndex>) -> Self {
        Self {
            index,
            sorted: false,
            rejected: 0,
        }
    }

    /// Record a node location.
    pub fn node(&mut self, id: i64, lon: f64, lat: f64) {
        let Some(location) = Location::from_degrees(lon, lat) else {
            debug!("ignoring node {id} with invalid location ({lon}, {lat})");
            self.rejected += 1;
            return;
        };
        if let Err(err) = self.index.set(id, location) {
            debug!("ignoring node {id}: {err}");
            self.rejected += 1;
        }
    }

    /// Resolve the node references of a way.
    ///
    /// The index is sorted on first use, which relies on nodes preceding
    /// ways in the input.
    pub fn resolve(&mut self, refs: &[i64]) -> Vec<NodeRef> {
        if !self.sorted {
            self.index.sort();
            self.sorted = true;
        }
        refs.iter()
            .map(|&id| NodeRef {
                id,
                location: self.index.get(id),
            })
            .collect()
    }

    /// Number of nodes whose location could not be recorded.
    pub const fn rejected(&self) -> u64 {
        self.rejected
    }

    /// Number of stored locations.
    pub fn stored(&self) -> usize {
        self.index.len()
    }

    /// Memory held by the index, in bytes.
    pub fn used_memory(&self) -> usize {
        self.index.used_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0.0, Some((0, 0)))]
    #[case(180.0, -90.0, Some((1_800_000_000, -900_000_000)))]
    #[case(13.377_704_5, 52.516_275_3, Some((133_777_045, 525_162_753)))]
    #[case(180.000_1, 0.0, None)]
    #[case(0.0, f64::NAN, None)]
    #[case(f64::INFINITY, 0.0, None)]
    fn converts_degrees_to_fixed_point(
        #[case] lon: f64,
        #[case] lat: f64,
        #[case] expected: Option<(i32, i32)>,
    ) {
        assert_eq!(Location::from_degrees(lon, lat).map(Location::fixed), expected);
    }

    #[rstest]
    fn round_trips_to_coordinates() {
        let location = Location::from_degrees(-74.006, 40.7128).expect("valid");
        let coord = location.to_coord();
        assert!((coord.x + 74.006).abs() < 1e-7);
        assert!((coord.y - 40.7128).abs() < 1e-7);
    }

    #[rstest]
    #[case("dense_mmap_array", IndexType::DenseMmapArray)]
    #[case("dense_mem_array", IndexType::DenseMemArray)]
    #[case("sparse_mem_array", IndexType::SparseMemArray)]
    #[case("sparse_mem_map", IndexType::SparseMemMap)]
    #[case("none", IndexType::None)]
    fn parses_index_names(#[case] name: &str, #[case] expected: IndexType) {
        assert_eq!(name.parse::<IndexType>().expect("known name"), expected);
        assert_eq!(expected.to_string(), name);
    }

    #[rstest]
    fn unknown_index_lists_supported_names() {
        let err = "flex_mem".parse::<IndexType>().expect_err("unknown name");
        let message = err.to_string();
        assert!(message.contains("flex_mem"));
        assert!(message.contains("dense_mmap_array, dense_mem_array"));
    }

    #[rstest]
    #[case(IndexType::DenseMmapArray)]
    #[case(IndexType::DenseMemArray)]
    #[case(IndexType::SparseMemArray)]
    #[case(IndexType::SparseMemMap)]
    fn every_storing_index_resolves_nodes(#[case] kind: IndexType) {
        let mut handler = LocationHandler::new(create_index(kind));
        handler.node(7, 1.5, 2.5);
        handler.node(3, -1.0, -2.0);
        handler.node(5, 400.0, 0.0);
        let resolved = handler.resolve(&[3, 5, 7, 9]);
        let locations: Vec<_> = resolved.iter().map(|node| node.location).collect();
        assert_eq!(
            locations,
            vec![
                Location::from_degrees(-1.0, -2.0),
                None,
                Location::from_degrees(1.5, 2.5),
                None,
            ]
        );
        assert_eq!(handler.rejected(), 1);
        assert_eq!(handler.stored(), 2);
    }

    #[rstest]
    fn null_index_never_resolves() {
        let mut handler = LocationHandler::new(create_index(IndexType::None));
        handler.node(1, 0.0, 0.0);
        assert_eq!(
            handler.resolve(&[1]),
            vec![NodeRef {
                id: 1,
                location: None
            }]
        );
    }

    #[rstest]
    #[case(IndexType::DenseMmapArray)]
    #[case(IndexType::DenseMemArray)]
    fn dense_indexes_skip_negative_ids(#[case] kind: IndexType) {
        let mut handler = LocationHandler::new(create_index(kind));
        handler.node(-4, 0.0, 0.0);
        assert_eq!(handler.rejected(), 1);
        assert_eq!(handler.resolve(&[-4]).first().and_then(|node| node.location), None);
    }
}
