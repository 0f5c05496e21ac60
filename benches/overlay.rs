use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use pc7_overlay::geo::{wgs84_to_webmercator, BuiltinTransform, CrsId, GeodesicPoint};
use pc7_overlay::overlay::{build_geometry, OverlayConfig};
use pc7_overlay::render::{render_overlay, Painter, Pen, RenderContext, RenderPath, Viewport};

/// Painter that only counts what it is asked to draw.
#[derive(Default)]
struct NullPainter {
    points: usize,
}

impl Painter for NullPainter {
    fn set_pen(&mut self, _pen: &Pen) {}

    fn draw_path(&mut self, path: &RenderPath) {
        self.points += path.points.len();
    }
}

fn overlay_benchmark(c: &mut Criterion) {
    let wgs_center = GeodesicPoint::new(8.0, 47.0);
    let center = wgs84_to_webmercator(wgs_center);
    let config = OverlayConfig::new(center, CrsId::web_mercator(), 22.5, 45.0, 135.0);

    c.bench_function("build_geometry", |b| {
        b.iter(|| build_geometry(black_box(&config), black_box(wgs_center)))
    });

    let viewport = Viewport {
        center,
        map_units_per_pixel: 5.0,
        width: 1920.0,
        height: 1080.0,
    };
    let ctx = RenderContext {
        transform: &BuiltinTransform,
        display_crs: CrsId::web_mercator(),
        map_to_pixel: &viewport,
    };

    c.bench_function("render_overlay", |b| {
        b.iter(|| {
            let mut painter = NullPainter::default();
            let stats = render_overlay(black_box(&config), &ctx, &mut painter);
            black_box((stats, painter.points))
        })
    });
}

criterion_group!(benches, overlay_benchmark);
criterion_main!(benches);
