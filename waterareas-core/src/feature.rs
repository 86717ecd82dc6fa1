//! Output rows for the `waterareas` layer.

use geo::{MultiPolygon, Validation};
use thiserror::Error;

use crate::{AreaOrigin, AssembledArea, Classification, Projection, WaterType};

/// Reasons an assembled area cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryErrorKind {
    /// The area contains no polygons.
    #[error("area contains no rings")]
    Empty,
    /// A ring has fewer than four coordinates.
    #[error("ring has fewer than four points")]
    TooFewPoints,
    /// A coordinate is not a finite number.
    #[error("invalid location")]
    InvalidLocation,
    /// The polygon is not topologically valid (self-intersection, crossing
    /// rings, degenerate rings).
    #[error("geometry is not valid")]
    Invalid,
    /// The output encoder refused the geometry.
    #[error("geometry cannot be encoded")]
    Unencodable,
}

/// Outcome of preparing an area for the writer.
pub type GeometryResult<'a> = Result<WaterAreaFeature<'a>, GeometryErrorKind>;

/// A classified, projected water area ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WaterAreaFeature<'a> {
    /// Area identifier, stored as a real number.
    pub id: i64,
    /// Water-body type.
    pub water_type: WaterType,
    /// Object kind the geometry was assembled from.
    pub origin: AreaOrigin,
    /// Identifier of the source object.
    pub orig_id: i64,
    /// Intermittent flag.
    pub intermittent: bool,
    /// Salt water flag.
    pub salt: bool,
    /// Maritime or tidal flag.
    pub maritime: bool,
    /// Display name, if any.
    pub name: Option<&'a str>,
    /// Geometry in the writer's projection.
    pub geometry: MultiPolygon<f64>,
}

impl WaterAreaFeature<'_> {
    /// Value of the `id` column.
    ///
    /// Area ids may exceed the range of 32-bit integer fields, so the column
    /// is a real.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "the id column is a real by schema"
    )]
    pub fn id_value(&self) -> f64 {
        self.id as f64
    }

    /// Value of the `ftype` column.
    #[must_use]
    pub const fn ftype(&self) -> i32 {
        self.origin.ftype()
    }
}

/// Validate and project an accepted area.
///
/// The classification decision is final; this step only checks that the
/// geometry can be written.
///
/// # Examples
/// ```
/// use geo::{LineString, MultiPolygon, Polygon};
/// use waterareas_core::{
///     AreaOrigin, AssembledArea, GeometryErrorKind, Projection, TagSet, build_feature, classify,
/// };
///
/// let square = Polygon::new(
///     LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)]),
///     vec![],
/// );
/// let tags = TagSet::from_pairs([("natural", "water"), ("name", "Lake X")]);
/// let area = AssembledArea::new(AreaOrigin::Way, 5, tags, MultiPolygon::new(vec![square]))
///     .expect("small id");
/// let class = classify(&area.tags).expect("water is accepted");
/// let feature = build_feature(&area, class, Projection::Wgs84).expect("square is valid");
/// assert_eq!(feature.name, Some("Lake X"));
/// assert_eq!(feature.ftype(), 1);
///
/// let empty = AssembledArea::new(AreaOrigin::Way, 6, TagSet::new(), MultiPolygon::new(vec![]))
///     .expect("small id");
/// assert_eq!(
///     build_feature(&empty, class, Projection::Wgs84).err(),
///     Some(GeometryErrorKind::Empty)
/// );
/// ```
pub fn build_feature<'a>(
    area: &AssembledArea,
    classification: Classification<'a>,
    projection: Projection,
) -> GeometryResult<'a> {
    check_geometry(&area.geometry)?;
    let geometry = projection.project_multipolygon(&area.geometry);
    if !all_finite(&geometry) {
        return Err(GeometryErrorKind::InvalidLocation);
    }
    Ok(WaterAreaFeature {
        id: area.id,
        water_type: classification.water_type,
        origin: area.origin,
        orig_id: area.orig_id,
        intermittent: classification.intermittent,
        salt: classification.salt,
        maritime: classification.maritime,
        name: classification.name,
        geometry,
    })
}

/// Check that a WGS84 multipolygon can be written.
pub fn check_geometry(geometry: &MultiPolygon<f64>) -> Result<(), GeometryErrorKind> {
    if geometry.0.is_empty() {
        return Err(GeometryErrorKind::Empty);
    }
    let short_ring = geometry.iter().any(|polygon| {
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .any(|ring| ring.0.len() < 4)
    });
    if short_ring {
        return Err(GeometryErrorKind::TooFewPoints);
    }
    if !all_finite(geometry) {
        return Err(GeometryErrorKind::InvalidLocation);
    }
    if !geometry.is_valid() {
        return Err(GeometryErrorKind::Invalid);
    }
    Ok(())
}

fn all_finite(geometry: &MultiPolygon<f64>) -> bool {
    geometry.iter().all(|polygon| {
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .flat_map(|ring| ring.0.iter())
            .all(|coord| coord.x.is_finite() && coord.y.is_finite())
    })
}
