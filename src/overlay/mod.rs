//! Landing-pattern geometry: ring, axis pair and flight-line pair around a center.

use serde::{Deserialize, Serialize};

use crate::geo::{CrsId, GeodesicPoint, MapPoint};
use crate::geodesy::{line_between, project};

pub const NAUTICAL_MILE_M: f64 = 1852.0;

/// Radius of the ring drawn around the center.
pub const RING_RADIUS_M: f64 = 230.0;
pub const RING_SAMPLES: usize = 361;

pub const AXIS_RADIUS_M: f64 = NAUTICAL_MILE_M;
pub const AXIS_STEP_M: f64 = 500.0;

pub const FLIGHT_LINE_RADIUS_M: f64 = 1.5 * NAUTICAL_MILE_M;
pub const FLIGHT_LINE_STEP_M: f64 = 50.0;
/// Leading samples dropped from each flight line, leaving a gap around the center.
pub const FLIGHT_LINE_SKIP: usize = 2;

/// RGBA color, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const RED: Rgba = Rgba::new(255, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::RED
    }
}

/// State of one overlay: where it sits, how it is oriented and how it is stroked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    center: MapPoint,
    crs: CrsId,
    /// Primary bearing, degrees.
    pub azimut: f64,
    /// Left flight-line offset from `azimut`, degrees.
    pub azimut_left_fl: f64,
    /// Right flight-line offset from `azimut`, degrees.
    pub azimut_right_fl: f64,
    pub color: Rgba,
    /// Stroke width in pixels.
    pub line_width: u32,
    /// Percent opacity reduction, 0 = opaque.
    pub transparency: u8,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            center: MapPoint::default(),
            crs: CrsId::default(),
            azimut: 0.0,
            azimut_left_fl: 0.0,
            azimut_right_fl: 0.0,
            color: Rgba::RED,
            line_width: 3,
            transparency: 0,
        }
    }
}

impl OverlayConfig {
    pub fn new(center: MapPoint, crs: CrsId, azimut: f64, azimut_left_fl: f64, azimut_right_fl: f64) -> Self {
        Self {
            center,
            crs,
            azimut,
            azimut_left_fl,
            azimut_right_fl,
            ..Self::default()
        }
    }

    /// Position and orient the overlay. Center and CRS always change together.
    pub fn setup(&mut self, center: MapPoint, crs: CrsId, azimut: f64, azimut_left_fl: f64, azimut_right_fl: f64) {
        self.set_center(center, crs);
        self.azimut = azimut;
        self.azimut_left_fl = azimut_left_fl;
        self.azimut_right_fl = azimut_right_fl;
    }

    pub fn set_center(&mut self, center: MapPoint, crs: CrsId) {
        self.center = center;
        self.crs = crs;
    }

    pub fn center(&self) -> MapPoint {
        self.center
    }

    pub fn crs(&self) -> &CrsId {
        &self.crs
    }

    pub fn azimut_radians(&self) -> f64 {
        azimut_to_radians(self.azimut)
    }

    pub fn azimut_left_fl_radians(&self) -> f64 {
        azimut_to_radians(self.azimut_left_fl)
    }

    pub fn azimut_right_fl_radians(&self) -> f64 {
        azimut_to_radians(self.azimut_right_fl)
    }

    /// Painter opacity in [0, 1].
    pub fn opacity(&self) -> f32 {
        (100.0 - f32::from(self.transparency)) / 100.0
    }
}

pub fn azimut_to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

/// How a ray is cut into samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayPolicy {
    pub radius_m: f64,
    pub step_m: f64,
    pub skip: usize,
}

pub const AXIS_POLICY: RayPolicy = RayPolicy {
    radius_m: AXIS_RADIUS_M,
    step_m: AXIS_STEP_M,
    skip: 0,
};

pub const FLIGHT_LINE_POLICY: RayPolicy = RayPolicy {
    radius_m: FLIGHT_LINE_RADIUS_M,
    step_m: FLIGHT_LINE_STEP_M,
    skip: FLIGHT_LINE_SKIP,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Ring,
    Axis,
    FlightLine,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Ring => "ring",
            ShapeKind::Axis => "axis",
            ShapeKind::FlightLine => "flight_line",
        }
    }
}

/// WGS84 point sequences of one overlay, ready for projection to the display.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayGeometry {
    pub ring: Vec<GeodesicPoint>,
    pub axes: [Vec<GeodesicPoint>; 2],
    pub flight_lines: [Vec<GeodesicPoint>; 2],
}

impl OverlayGeometry {
    /// Ring, both axes, both flight lines, in that order.
    pub fn sequences(&self) -> impl Iterator<Item = (ShapeKind, &[GeodesicPoint])> {
        std::iter::once((ShapeKind::Ring, self.ring.as_slice()))
            .chain(self.axes.iter().map(|a| (ShapeKind::Axis, a.as_slice())))
            .chain(self.flight_lines.iter().map(|l| (ShapeKind::FlightLine, l.as_slice())))
    }

    pub fn point_count(&self) -> usize {
        self.sequences().map(|(_, points)| points.len()).sum()
    }
}

/// Bearing in degrees wrapped to [0, 360), converted to radians.
fn bearing_radians(degrees: f64) -> f64 {
    azimut_to_radians(degrees.rem_euclid(360.0))
}

/// Ring of [`RING_SAMPLES`] points at every whole degree 0..=360.
pub fn ring(center: GeodesicPoint) -> Vec<GeodesicPoint> {
    (0..RING_SAMPLES)
        .map(|deg| project(center, RING_RADIUS_M, bearing_radians(deg as f64)))
        .collect()
}

/// Samples along the geodesic from `center` towards `bearing_deg`.
///
/// The ray's endpoint is projected first and the geodesic to it is walked in `step_m`
/// increments, dropping the first `skip` samples. Increments stop short of the line
/// length and the exact endpoint is always appended, so the result is never empty.
pub fn sample_ray(center: GeodesicPoint, bearing_deg: f64, policy: RayPolicy) -> Vec<GeodesicPoint> {
    let end = project(center, policy.radius_m, bearing_radians(bearing_deg));
    let line = line_between(center, end);
    let length = line.length();
    let segments = ((length / policy.step_m).ceil() as usize).max(1);

    let mut points = Vec::with_capacity(segments.saturating_sub(policy.skip) + 1);
    for i in policy.skip..segments {
        points.push(line.position_at(i as f64 * policy.step_m));
    }
    points.push(line.position_at(length));
    points
}

pub fn axes(center: GeodesicPoint, azimut: f64) -> [Vec<GeodesicPoint>; 2] {
    [
        sample_ray(center, azimut, AXIS_POLICY),
        sample_ray(center, azimut + 180.0, AXIS_POLICY),
    ]
}

/// Flight-line offsets are relative to `azimut`.
pub fn flight_lines(center: GeodesicPoint, azimut: f64, left_fl: f64, right_fl: f64) -> [Vec<GeodesicPoint>; 2] {
    [
        sample_ray(center, azimut + left_fl, FLIGHT_LINE_POLICY),
        sample_ray(center, azimut + right_fl, FLIGHT_LINE_POLICY),
    ]
}

/// Build all shapes of `config` around `wgs_center`, the config's center in WGS84.
pub fn build_geometry(config: &OverlayConfig, wgs_center: GeodesicPoint) -> OverlayGeometry {
    OverlayGeometry {
        ring: ring(wgs_center),
        axes: axes(wgs_center, config.azimut),
        flight_lines: flight_lines(
            wgs_center,
            config.azimut,
            config.azimut_left_fl,
            config.azimut_right_fl,
        ),
    }
}
