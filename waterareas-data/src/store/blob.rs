//! Geometry blobs for the supported output formats.
//!
//! Encoding is delegated to `geozero`; this module only supplies the SRID
//! and the envelope each dialect stores in its header.

use geo::{BoundingRect, Geometry, MultiPolygon, Rect};
use geozero::{CoordDimensions, ToWkb};
use log::debug;
use waterareas_core::GeometryErrorKind;

/// Bounding box of a non-empty geometry.
pub(crate) fn envelope(geometry: &MultiPolygon<f64>) -> Result<Rect<f64>, GeometryErrorKind> {
    geometry.bounding_rect().ok_or(GeometryErrorKind::Empty)
}

fn encode<F>(geometry: &MultiPolygon<f64>, write: F) -> Result<Vec<u8>, GeometryErrorKind>
where
    F: FnOnce(&Geometry<f64>) -> geozero::error::Result<Vec<u8>>,
{
    write(&Geometry::MultiPolygon(geometry.clone())).map_err(|err| {
        debug!("geometry encoding failed: {err}");
        GeometryErrorKind::Unencodable
    })
}

/// Encode a multipolygon as a GeoPackage geometry blob (header + WKB).
pub(crate) fn gpkg(geometry: &MultiPolygon<f64>, srid: i32) -> Result<Vec<u8>, GeometryErrorKind> {
    let bounds = envelope(geometry)?;
    // GeoPackage orders the envelope minx, maxx, miny, maxy.
    let header = vec![bounds.min().x, bounds.max().x, bounds.min().y, bounds.max().y];
    encode(geometry, |geometry| {
        geometry.to_gpkg_wkb(CoordDimensions::xy(), Some(srid), header)
    })
}

/// Encode a multipolygon in the Spatialite internal blob format.
pub(crate) fn spatialite(
    geometry: &MultiPolygon<f64>,
    srid: i32,
) -> Result<Vec<u8>, GeometryErrorKind> {
    let bounds = envelope(geometry)?;
    let mbr = vec![bounds.min().x, bounds.min().y, bounds.max().x, bounds.max().y];
    encode(geometry, |geometry| {
        geometry.to_spatialite_wkb(CoordDimensions::xy(), Some(srid), mbr)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};
    use geozero::ToGeo;
    use geozero::wkb::{GpkgWkb, SpatiaLiteWkb};
    use rstest::{fixture, rstest};

    #[fixture]
    fn square_with_hole() -> MultiPolygon<f64> {
        let exterior = LineString::from(vec![
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 6.0),
            (0.0, 6.0),
            (0.0, 0.0),
        ]);
        let hole = LineString::from(vec![
            (1.0, 1.0),
            (1.0, 2.0),
            (2.0, 2.0),
            (2.0, 1.0),
            (1.0, 1.0),
        ]);
        MultiPolygon::new(vec![Polygon::new(exterior, vec![hole])])
    }

    fn i32_at(bytes: &[u8], offset: usize) -> i32 {
        let chunk = bytes.get(offset..offset + 4).expect("i32 in range");
        i32::from_le_bytes(chunk.try_into().expect("four bytes"))
    }

    fn f64_at(bytes: &[u8], offset: usize) -> f64 {
        let chunk = bytes.get(offset..offset + 8).expect("f64 in range");
        f64::from_le_bytes(chunk.try_into().expect("eight bytes"))
    }

    #[rstest]
    fn gpkg_header_carries_srid_and_envelope(square_with_hole: MultiPolygon<f64>) {
        let bytes = gpkg(&square_with_hole, 3857).expect("encode");
        assert_eq!(bytes.get(..3), Some(&[b'G', b'P', 0][..]));
        assert_eq!(i32_at(&bytes, 4), 3857);
        let header: Vec<f64> = (0..4).map(|i| f64_at(&bytes, 8 + i * 8)).collect();
        assert_eq!(header, vec![0.0, 4.0, 0.0, 6.0]);

        let decoded = GpkgWkb(bytes).to_geo().expect("decode");
        assert_eq!(decoded, Geometry::MultiPolygon(square_with_hole));
    }

    #[rstest]
    fn spatialite_framing_and_mbr(square_with_hole: MultiPolygon<f64>) {
        let bytes = spatialite(&square_with_hole, 4326).expect("encode");
        assert_eq!(bytes.first(), Some(&0x00));
        assert_eq!(i32_at(&bytes, 2), 4326);
        let mbr: Vec<f64> = (0..4).map(|i| f64_at(&bytes, 6 + i * 8)).collect();
        assert_eq!(mbr, vec![0.0, 0.0, 4.0, 6.0]);
        assert_eq!(bytes.get(38), Some(&0x7C));
        assert_eq!(bytes.last(), Some(&0xFE));

        let decoded = SpatiaLiteWkb(bytes).to_geo().expect("decode");
        assert_eq!(decoded, Geometry::MultiPolygon(square_with_hole));
    }

    #[rstest]
    fn empty_geometry_has_no_envelope() {
        let empty = MultiPolygon::<f64>::new(Vec::new());
        assert_eq!(gpkg(&empty, 4326), Err(GeometryErrorKind::Empty));
        assert_eq!(spatialite(&empty, 4326), Err(GeometryErrorKind::Empty));
    }
}
