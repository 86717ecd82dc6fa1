//! Areas produced by the multipolygon assembler.

use std::fmt;

use geo::MultiPolygon;

use crate::TagSet;

/// The kind of OSM object an area was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaOrigin {
    /// A single closed way.
    Way,
    /// A multipolygon or boundary relation.
    Relation,
}

impl AreaOrigin {
    /// Geometry-source flag written to the `ftype` column.
    ///
    /// Areas built from a single way are flagged `1`, relation areas `0`.
    #[must_use]
    pub const fn ftype(self) -> i32 {
        match self {
            Self::Way => 1,
            Self::Relation => 0,
        }
    }
}

impl fmt::Display for AreaOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Way => f.write_str("way"),
            Self::Relation => f.write_str("relation"),
        }
    }
}

/// Derive the area identifier for an OSM object.
///
/// The absolute object id is doubled, relations add one, and the sign of the
/// source id is kept. Returns `None` when the result would overflow.
///
/// # Examples
/// ```
/// use waterareas_core::{AreaOrigin, area_id};
///
/// assert_eq!(area_id(AreaOrigin::Way, 21), Some(42));
/// assert_eq!(area_id(AreaOrigin::Relation, 21), Some(43));
/// assert_eq!(area_id(AreaOrigin::Relation, -21), Some(-43));
/// assert_eq!(area_id(AreaOrigin::Way, i64::MAX), None);
/// ```
#[must_use]
pub fn area_id(origin: AreaOrigin, object_id: i64) -> Option<i64> {
    let doubled = object_id.checked_abs()?.checked_mul(2)?;
    let id = match origin {
        AreaOrigin::Way => doubled,
        AreaOrigin::Relation => doubled.checked_add(1)?,
    };
    Some(if object_id < 0 { -id } else { id })
}

/// A polygon assembled from a closed way or a relation.
///
/// Coordinates are WGS84 degrees with `x = longitude`, `y = latitude`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledArea {
    /// Area identifier, see [`area_id`].
    pub id: i64,
    /// Object kind the area came from.
    pub origin: AreaOrigin,
    /// Identifier of the source way or relation.
    pub orig_id: i64,
    /// Tags describing the area.
    pub tags: TagSet,
    /// Assembled outer shells and holes.
    pub geometry: MultiPolygon<f64>,
}

impl AssembledArea {
    /// Build an area, deriving its identifier from the source object.
    ///
    /// Returns `None` when the identifier cannot be represented.
    #[must_use]
    pub fn new(
        origin: AreaOrigin,
        orig_id: i64,
        tags: TagSet,
        geometry: MultiPolygon<f64>,
    ) -> Option<Self> {
        let id = area_id(origin, orig_id)?;
        Some(Self {
            id,
            origin,
            orig_id,
            tags,
            geometry,
        })
    }

    /// Return true when the area came from a single closed way.
    #[must_use]
    pub fn from_way(&self) -> bool {
        self.origin == AreaOrigin::Way
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AreaOrigin::Way, 1, Some(2))]
    #[case(AreaOrigin::Relation, 1, Some(3))]
    #[case(AreaOrigin::Way, -5, Some(-10))]
    #[case(AreaOrigin::Relation, 0, Some(1))]
    #[case(AreaOrigin::Relation, i64::MIN, None)]
    #[case(AreaOrigin::Way, i64::MAX / 2 + 1, None)]
    #[case(AreaOrigin::Relation, i64::MAX / 2, Some(i64::MAX))]
    fn derives_area_ids(#[case] origin: AreaOrigin, #[case] id: i64, #[case] expected: Option<i64>) {
        assert_eq!(area_id(origin, id), expected);
    }

    #[rstest]
    fn way_areas_are_flagged() {
        assert_eq!(AreaOrigin::Way.ftype(), 1);
        assert_eq!(AreaOrigin::Relation.ftype(), 0);
        assert_eq!(AreaOrigin::Relation.to_string(), "relation");
    }

    #[rstest]
    fn new_area_keeps_source_identity() {
        let area = AssembledArea::new(
            AreaOrigin::Relation,
            7,
            TagSet::new(),
            MultiPolygon::new(Vec::new()),
        )
        .expect("small ids are representable");
        assert_eq!(area.id, 15);
        assert_eq!(area.orig_id, 7);
        assert!(!area.from_way());
    }
}
