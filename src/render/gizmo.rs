use bevy::prelude::*;

use super::{dash_path, Painter, Pen, PixelPoint, RenderPath};

/// Paints render paths with bevy gizmos for a 2D camera centered on the window.
pub struct GizmoPainter<'a, 'w, 's> {
    gizmos: &'a mut Gizmos<'w, 's>,
    window_size: Vec2,
    pen: Option<Pen>,
    saved: Vec<Option<Pen>>,
}

impl<'a, 'w, 's> GizmoPainter<'a, 'w, 's> {
    pub fn new(gizmos: &'a mut Gizmos<'w, 's>, window_size: Vec2) -> Self {
        Self {
            gizmos,
            window_size,
            pen: None,
            saved: Vec::new(),
        }
    }

    /// Pixel coordinates (origin top-left, y down) to world coordinates of a 2D camera
    /// sitting at the origin (y up).
    fn to_world(&self, p: PixelPoint) -> Vec2 {
        Vec2::new(
            p.x as f32 - self.window_size.x / 2.0,
            self.window_size.y / 2.0 - p.y as f32,
        )
    }

    fn color(pen: &Pen) -> Color {
        let alpha = (f32::from(pen.color.a) * pen.opacity.clamp(0.0, 1.0)).round() as u8;
        Color::srgba_u8(pen.color.r, pen.color.g, pen.color.b, alpha)
    }
}

impl Painter for GizmoPainter<'_, '_, '_> {
    fn save(&mut self) {
        self.saved.push(self.pen);
    }

    fn restore(&mut self) {
        if let Some(pen) = self.saved.pop() {
            self.pen = pen;
        }
    }

    fn set_pen(&mut self, pen: &Pen) {
        self.pen = Some(*pen);
    }

    fn draw_path(&mut self, path: &RenderPath) {
        let Some(pen) = self.pen else {
            return;
        };
        let color = Self::color(&pen);
        match pen.dash {
            Some(pattern) => {
                for dash in dash_path(path, pattern, f64::from(pen.width)) {
                    let points: Vec<Vec2> = dash.into_iter().map(|p| self.to_world(p)).collect();
                    self.gizmos.linestrip_2d(points, color);
                }
            }
            None => {
                let mut points: Vec<Vec2> = path.points.iter().map(|p| self.to_world(*p)).collect();
                if path.closed && points.first() != points.last() {
                    if let Some(first) = points.first().copied() {
                        points.push(first);
                    }
                }
                self.gizmos.linestrip_2d(points, color);
            }
        }
    }
}
