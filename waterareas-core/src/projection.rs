//! Coordinate reference systems for written geometries.

use std::f64::consts::FRAC_PI_4;

use geo::{Coord, MapCoords, MultiPolygon};

/// Semi-major axis of the WGS84 ellipsoid in metres.
const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which Web Mercator becomes a square.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_779_8;

/// Projection applied to geometries before they are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Projection {
    /// Unprojected longitude/latitude degrees (EPSG:4326).
    Wgs84,
    /// Spherical "Web Mercator" metres (EPSG:3857).
    #[default]
    WebMercator,
}

impl Projection {
    /// EPSG code of the target reference system.
    #[must_use]
    pub const fn srid(self) -> i32 {
        match self {
            Self::Wgs84 => 4326,
            Self::WebMercator => 3857,
        }
    }

    /// Human-readable reference system name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Wgs84 => "WGS 84",
            Self::WebMercator => "WGS 84 / Pseudo-Mercator",
        }
    }

    /// PROJ.4 definition recorded alongside the reference system.
    #[must_use]
    pub const fn proj_string(self) -> &'static str {
        match self {
            Self::Wgs84 => "+proj=longlat +datum=WGS84 +no_defs",
            Self::WebMercator => {
                "+proj=merc +a=6378137 +b=6378137 +lat_ts=0.0 +lon_0=0.0 +x_0=0.0 +y_0=0 \
                 +k=1.0 +units=m +nadgrids=@null +wktext +no_defs"
            }
        }
    }

    /// Project a single WGS84 coordinate.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use waterareas_core::Projection;
    ///
    /// let origin = Projection::WebMercator.project(Coord { x: 0.0, y: 0.0 });
    /// assert!(origin.x.abs() < 1e-6 && origin.y.abs() < 1e-6);
    ///
    /// let east = Projection::WebMercator.project(Coord { x: 180.0, y: 0.0 });
    /// assert!((east.x - 20_037_508.342_789_244).abs() < 1e-6);
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "map projection is floating-point maths"
    )]
    pub fn project(self, coord: Coord<f64>) -> Coord<f64> {
        match self {
            Self::Wgs84 => coord,
            Self::WebMercator => {
                let lat = coord
                    .y
                    .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE)
                    .to_radians();
                Coord {
                    x: EARTH_RADIUS * coord.x.to_radians(),
                    y: EARTH_RADIUS * (FRAC_PI_4 + lat / 2.0).tan().ln(),
                }
            }
        }
    }

    /// Project every coordinate of a multipolygon.
    #[must_use]
    pub fn project_multipolygon(self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        match self {
            Self::Wgs84 => geometry.clone(),
            Self::WebMercator => geometry.map_coords(|coord| self.project(coord)),
        }
    }
}
