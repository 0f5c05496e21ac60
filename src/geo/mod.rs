use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// WGS84 semi-major axis, also the sphere radius of EPSG:3857.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Meters per degree at the equator, used for map-unit conversion of geographic CRSs.
pub const METERS_PER_DEGREE: f64 = 111319.49079327357;

/// Web Mercator latitude limit in degrees.
const MERCATOR_MAX_LAT: f64 = 85.06;

/// A WGS84 position, longitude/latitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeodesicPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeodesicPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A point in the coordinates of some CRS (meters, degrees, ... depending on the CRS).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Authority identifier of a coordinate reference system, e.g. `EPSG:3857`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrsId(String);

impl CrsId {
    pub fn new(authid: impl Into<String>) -> Self {
        Self(authid.into())
    }

    pub fn wgs84() -> Self {
        Self::new("EPSG:4326")
    }

    pub fn web_mercator() -> Self {
        Self::new("EPSG:3857")
    }

    pub fn authid(&self) -> &str {
        &self.0
    }

    pub fn is_geographic(&self) -> bool {
        self.0.eq_ignore_ascii_case("EPSG:4326")
    }

    /// Factor converting meters to this CRS's map units.
    pub fn meters_to_map_units(&self) -> f64 {
        if self.is_geographic() {
            1.0 / METERS_PER_DEGREE
        } else {
            1.0
        }
    }
}

impl Default for CrsId {
    fn default() -> Self {
        Self::web_mercator()
    }
}

impl fmt::Display for CrsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),
    #[error("point ({x}, {y}) is outside the domain of {crs}")]
    OutOfDomain { crs: String, x: f64, y: f64 },
}

/// Point transforms between a CRS and WGS84, supplied by the host.
pub trait CrsTransform {
    fn to_wgs84(&self, point: MapPoint, crs: &CrsId) -> Result<GeodesicPoint, TransformError>;
    fn from_wgs84(&self, point: GeodesicPoint, crs: &CrsId) -> Result<MapPoint, TransformError>;
}

/// Transform service for the CRSs the bundled host knows about: EPSG:4326 and EPSG:3857.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTransform;

impl CrsTransform for BuiltinTransform {
    fn to_wgs84(&self, point: MapPoint, crs: &CrsId) -> Result<GeodesicPoint, TransformError> {
        match crs.authid().to_ascii_uppercase().as_str() {
            "EPSG:4326" => {
                if !point.x.is_finite() || !point.y.is_finite() || point.y.abs() > 90.0 {
                    return Err(out_of_domain(crs, point));
                }
                Ok(GeodesicPoint::new(point.x, point.y))
            }
            "EPSG:3857" => {
                if !point.x.is_finite() || !point.y.is_finite() {
                    return Err(out_of_domain(crs, point));
                }
                Ok(webmercator_to_wgs84(point))
            }
            other => Err(TransformError::UnsupportedCrs(other.to_string())),
        }
    }

    fn from_wgs84(&self, point: GeodesicPoint, crs: &CrsId) -> Result<MapPoint, TransformError> {
        match crs.authid().to_ascii_uppercase().as_str() {
            "EPSG:4326" => Ok(MapPoint::new(point.lon, point.lat)),
            "EPSG:3857" => {
                if point.lat.abs() > MERCATOR_MAX_LAT {
                    return Err(out_of_domain(crs, MapPoint::new(point.lon, point.lat)));
                }
                Ok(wgs84_to_webmercator(point))
            }
            other => Err(TransformError::UnsupportedCrs(other.to_string())),
        }
    }
}

fn out_of_domain(crs: &CrsId, point: MapPoint) -> TransformError {
    TransformError::OutOfDomain {
        crs: crs.authid().to_string(),
        x: point.x,
        y: point.y,
    }
}

/// Convert WGS84 to Web Mercator (EPSG:3857)
/// Note: Web Mercator is not conformal at high latitudes and distorts scale.
pub fn wgs84_to_webmercator(coord: GeodesicPoint) -> MapPoint {
    let x = coord.lon * (PI / 180.0) * EARTH_RADIUS;
    let y = ((coord.lat * PI / 360.0 + PI / 4.0).tan()).ln() * EARTH_RADIUS;
    MapPoint { x, y }
}

/// Convert Web Mercator (EPSG:3857) to WGS84
pub fn webmercator_to_wgs84(coord: MapPoint) -> GeodesicPoint {
    let lon = (coord.x / EARTH_RADIUS) * (180.0 / PI);
    let lat = (2.0 * (coord.y / EARTH_RADIUS).exp().atan() - PI / 2.0) * (180.0 / PI);
    GeodesicPoint { lon, lat }
}

/// Mercator scale factor: projected meters per ground meter at `latitude`.
pub fn get_scale_factor_at_lat(latitude: f64) -> f64 {
    1.0 / latitude.to_radians().cos()
}

/// Wrap a longitude into [-180, 180).
pub fn normalize_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
