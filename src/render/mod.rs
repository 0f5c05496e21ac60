pub mod gizmo;

use itertools::Itertools;
use thiserror::Error;

use crate::geo::{CrsId, CrsTransform, GeodesicPoint, MapPoint, TransformError};
use crate::overlay::{build_geometry, OverlayConfig, Rgba, ShapeKind};

/// Screen position in pixels, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: PixelPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    fn lerp(&self, other: PixelPoint, t: f64) -> PixelPoint {
        PixelPoint::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

/// One polyline to stroke.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderPath {
    pub points: Vec<PixelPoint>,
    pub closed: bool,
}

/// Dash lengths in units of the pen width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashPattern {
    pub on: f64,
    pub off: f64,
}

impl DashPattern {
    pub const DASH_LINE: DashPattern = DashPattern { on: 4.0, off: 2.0 };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub color: Rgba,
    pub width: u32,
    pub dash: Option<DashPattern>,
    pub opacity: f32,
}

impl Pen {
    pub fn solid(config: &OverlayConfig) -> Self {
        Self {
            color: config.color,
            width: config.line_width,
            dash: None,
            opacity: config.opacity(),
        }
    }

    pub fn dashed(config: &OverlayConfig) -> Self {
        Self {
            dash: Some(DashPattern::DASH_LINE),
            ..Self::solid(config)
        }
    }
}

/// Map coordinates (display CRS) to pixels.
pub trait MapToPixel {
    fn to_pixel(&self, point: MapPoint) -> PixelPoint;
}

impl<F> MapToPixel for F
where
    F: Fn(MapPoint) -> PixelPoint,
{
    fn to_pixel(&self, point: MapPoint) -> PixelPoint {
        self(point)
    }
}

/// Stroking primitives of the host.
pub trait Painter {
    fn save(&mut self) {}
    fn restore(&mut self) {}
    fn set_pen(&mut self, pen: &Pen);
    fn draw_path(&mut self, path: &RenderPath);
}

/// A view onto a projected map: `center` is shown in the middle of a
/// `width` x `height` pixel surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: MapPoint,
    pub map_units_per_pixel: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn to_map(&self, pixel: PixelPoint) -> MapPoint {
        MapPoint::new(
            self.center.x + (pixel.x - self.width / 2.0) * self.map_units_per_pixel,
            self.center.y - (pixel.y - self.height / 2.0) * self.map_units_per_pixel,
        )
    }
}

impl MapToPixel for Viewport {
    fn to_pixel(&self, point: MapPoint) -> PixelPoint {
        PixelPoint::new(
            (point.x - self.center.x) / self.map_units_per_pixel + self.width / 2.0,
            self.height / 2.0 - (point.y - self.center.y) / self.map_units_per_pixel,
        )
    }
}

/// Host services used by one render pass.
pub struct RenderContext<'a> {
    pub transform: &'a dyn CrsTransform,
    pub display_crs: CrsId,
    pub map_to_pixel: &'a dyn MapToPixel,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("cannot transform overlay center: {0}")]
    Center(#[source] TransformError),
    #[error("cannot transform {} point {index}: {source}", .shape.label())]
    Shape {
        shape: ShapeKind,
        index: usize,
        #[source]
        source: TransformError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub paths: usize,
    pub points: usize,
}

fn to_pixel_path(
    ctx: &RenderContext<'_>,
    shape: ShapeKind,
    points: &[GeodesicPoint],
) -> Result<RenderPath, RenderError> {
    let points = points
        .iter()
        .enumerate()
        .map(|(index, &p)| {
            ctx.transform
                .from_wgs84(p, &ctx.display_crs)
                .map(|m| ctx.map_to_pixel.to_pixel(m))
                .map_err(|source| RenderError::Shape { shape, index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RenderPath {
        points,
        closed: shape == ShapeKind::Ring,
    })
}

/// Draw one overlay. Every path is transformed before anything is painted, so a
/// transform failure leaves the painter untouched.
pub fn render_overlay(
    config: &OverlayConfig,
    ctx: &RenderContext<'_>,
    painter: &mut dyn Painter,
) -> Result<RenderStats, RenderError> {
    let wgs_center = ctx
        .transform
        .to_wgs84(config.center(), config.crs())
        .map_err(RenderError::Center)?;

    let geometry = build_geometry(config, wgs_center);
    let paths = geometry
        .sequences()
        .map(|(shape, points)| to_pixel_path(ctx, shape, points).map(|path| (shape, path)))
        .collect::<Result<Vec<_>, _>>()?;

    let solid = Pen::solid(config);
    let dashed = Pen::dashed(config);
    let mut stats = RenderStats::default();

    painter.save();
    for (shape, path) in &paths {
        painter.set_pen(if *shape == ShapeKind::FlightLine { &dashed } else { &solid });
        painter.draw_path(path);
        stats.paths += 1;
        stats.points += path.points.len();
    }
    painter.restore();

    tracing::debug!(
        "rendered overlay at {:?} ({}): {} paths, {} points",
        wgs_center,
        config.crs(),
        stats.paths,
        stats.points
    );
    Ok(stats)
}

/// Split a polyline into the "on" runs of a dash pattern scaled by `width`.
pub fn dash_path(path: &RenderPath, pattern: DashPattern, width: f64) -> Vec<Vec<PixelPoint>> {
    let on = pattern.on * width.max(1.0);
    let off = pattern.off * width.max(1.0);

    let mut dashes = Vec::new();
    let mut current: Vec<PixelPoint> = Vec::new();
    let mut drawing = true;
    let mut remaining = on;

    for (a, b) in path.points.iter().copied().tuple_windows() {
        let seg_len = a.distance(b);
        if seg_len == 0.0 {
            continue;
        }
        let mut t = 0.0;
        if drawing && current.is_empty() {
            current.push(a);
        }
        while (1.0 - t) * seg_len > remaining {
            t += remaining / seg_len;
            let p = a.lerp(b, t);
            if drawing {
                current.push(p);
                dashes.push(std::mem::take(&mut current));
                remaining = off;
            } else {
                current.push(p);
                remaining = on;
            }
            drawing = !drawing;
        }
        remaining -= (1.0 - t) * seg_len;
        if drawing {
            current.push(b);
        }
    }
    if current.len() > 1 {
        dashes.push(current);
    }
    dashes
}
