//! Geodesic projection on the WGS84 ellipsoid.
//!
//! [`project`] solves the direct problem (start, bearing, distance → destination) and
//! [`line_between`] the inverse problem, returning a [`GeodesicLine`] that can be
//! sampled at any distance from its start.

pub mod vincenty;

use std::f64::consts::TAU;

use crate::geo::{normalize_lon, GeodesicPoint};

/// Points closer than this are treated as coincident by [`line_between`].
pub const COINCIDENT_EPSILON_M: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis in meters.
    pub a: f64,
    /// Flattening.
    pub f: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        a: 6378137.0,
        f: 1.0 / 298.257223563,
    };

    pub fn semi_minor_axis(&self) -> f64 {
        self.a * (1.0 - self.f)
    }

    /// (a² - b²) / b²
    pub fn second_eccentricity_sq(&self) -> f64 {
        let b = self.semi_minor_axis();
        (self.a * self.a - b * b) / (b * b)
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

/// Point reached by travelling `distance_m` from `origin` along the geodesic that starts
/// with bearing `bearing_rad` (0 = north, clockwise).
pub fn project(origin: GeodesicPoint, distance_m: f64, bearing_rad: f64) -> GeodesicPoint {
    project_on(&Ellipsoid::WGS84, origin, distance_m, bearing_rad)
}

pub fn project_on(ellps: &Ellipsoid, origin: GeodesicPoint, distance_m: f64, bearing_rad: f64) -> GeodesicPoint {
    if distance_m == 0.0 {
        return origin;
    }
    let d = vincenty::direct(
        ellps,
        origin.lat.to_radians(),
        origin.lon.to_radians(),
        bearing_rad.rem_euclid(TAU),
        distance_m,
    );
    GeodesicPoint::new(normalize_lon(d.lon.to_degrees()), d.lat.to_degrees())
}

/// Inverse problem between two points: distance in meters, azimuths in radians.
pub fn inverse(a: GeodesicPoint, b: GeodesicPoint) -> vincenty::Inverse {
    vincenty::inverse(
        &Ellipsoid::WGS84,
        a.lat.to_radians(),
        a.lon.to_radians(),
        b.lat.to_radians(),
        b.lon.to_radians(),
    )
}

/// Geodesic between two points, sampled by distance from its start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodesicLine {
    start: GeodesicPoint,
    azimuth1: f64,
    azimuth2: f64,
    length: f64,
}

pub fn line_between(a: GeodesicPoint, b: GeodesicPoint) -> GeodesicLine {
    let inv = inverse(a, b);
    if !inv.converged {
        tracing::warn!(
            "inverse geodesic from {:?} to {:?} did not converge, using last iterate",
            a,
            b
        );
    }
    if inv.distance < COINCIDENT_EPSILON_M {
        return GeodesicLine {
            start: a,
            azimuth1: 0.0,
            azimuth2: 0.0,
            length: 0.0,
        };
    }
    GeodesicLine {
        start: a,
        azimuth1: inv.azimuth1,
        azimuth2: inv.azimuth2,
        length: inv.distance,
    }
}

impl GeodesicLine {
    pub fn start(&self) -> GeodesicPoint {
        self.start
    }

    /// Arc length in meters.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn initial_bearing(&self) -> f64 {
        self.azimuth1
    }

    pub fn final_bearing(&self) -> f64 {
        self.azimuth2
    }

    /// Position `distance_m` along the line. Distances past `length()` keep following the
    /// same geodesic; a zero-length line always yields its start.
    pub fn position_at(&self, distance_m: f64) -> GeodesicPoint {
        if self.length == 0.0 {
            return self.start;
        }
        project(self.start, distance_m, self.azimuth1)
    }
}
