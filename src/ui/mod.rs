use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::{egui, EguiContexts};

use crate::config::{LayerDefaults, PluginSettings, ViewSettings};
use crate::geo::{self, BuiltinTransform, CrsId, MapPoint};
use crate::io;
use crate::layer::{LayerId, LayerLookup, LayerRegistry, LAYER_TYPE};
use crate::overlay::{OverlayConfig, Rgba};
use crate::render::{PixelPoint, Viewport};

/// The map canvas: what part of the display CRS is shown and at which zoom.
#[derive(Resource, Debug, Clone)]
pub struct MapView {
    pub center: MapPoint,
    pub crs: CrsId,
    /// Map units per pixel.
    pub zoom: f64,
    pub move_speed: f32,
}

impl MapView {
    pub fn from_settings(view: &ViewSettings) -> Self {
        Self {
            center: geo::wgs84_to_webmercator(view.center),
            crs: CrsId::web_mercator(),
            zoom: view.meters_per_pixel,
            move_speed: 600.0,
        }
    }

    pub fn viewport(&self, width: f32, height: f32) -> Viewport {
        Viewport {
            center: self.center,
            map_units_per_pixel: self.zoom,
            width: f64::from(width),
            height: f64::from(height),
        }
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self::from_settings(&ViewSettings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolEvent {
    /// Mouse button released over the canvas at a position in the canvas CRS.
    Release { button: PointerButton, pos: MapPoint },
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolAction {
    None,
    CenterPicked(LayerId),
    Close,
}

/// Map tool placing and editing overlay layers.
#[derive(Resource, Debug, Default)]
pub struct OverlayTool {
    active: bool,
    picking: bool,
}

impl OverlayTool {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_picking(&self) -> bool {
        self.picking
    }

    pub fn set_picking(&mut self, picking: bool) {
        self.picking = picking && self.active;
    }

    /// Select the layer to edit: the canvas's current layer, else the first overlay layer,
    /// else a new layer at the canvas center.
    pub fn activate(
        &mut self,
        registry: &mut LayerRegistry,
        canvas_center: MapPoint,
        canvas_crs: &CrsId,
        defaults: &LayerDefaults,
    ) -> LayerId {
        self.active = true;
        let id = match registry
            .current()
            .or_else(|| registry.find_layers_of_type(LAYER_TYPE).first().copied())
        {
            Some(id) => id,
            None => create_layer(registry, &defaults.title, canvas_center, canvas_crs.clone(), defaults),
        };
        registry.set_current(Some(id));
        id
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.picking = false;
    }

    pub fn handle(&mut self, event: ToolEvent, registry: &mut LayerRegistry, canvas_crs: &CrsId) -> ToolAction {
        if !self.active {
            return ToolAction::None;
        }
        match event {
            ToolEvent::Release { pos, .. } if self.picking => {
                self.picking = false;
                let Some(id) = registry.current() else {
                    return ToolAction::None;
                };
                match registry.get_mut(id) {
                    Some(layer) => {
                        layer.config.set_center(pos, canvas_crs.clone());
                        ToolAction::CenterPicked(id)
                    }
                    None => ToolAction::None,
                }
            }
            ToolEvent::Release {
                button: PointerButton::Right,
                ..
            } => {
                self.deactivate();
                ToolAction::Close
            }
            ToolEvent::Release { .. } => ToolAction::None,
            ToolEvent::Escape if self.picking => {
                self.picking = false;
                ToolAction::None
            }
            ToolEvent::Escape => {
                self.deactivate();
                ToolAction::Close
            }
        }
    }
}

/// Register a layer with the default orientation and style.
pub fn create_layer(
    registry: &mut LayerRegistry,
    title: &str,
    center: MapPoint,
    crs: CrsId,
    defaults: &LayerDefaults,
) -> LayerId {
    let mut config = OverlayConfig::new(
        center,
        crs,
        defaults.azimut,
        defaults.azimut_left_fl,
        defaults.azimut_right_fl,
    );
    config.color = defaults.color;
    config.line_width = defaults.line_width;
    config.transparency = defaults.transparency;
    let title = if title.trim().is_empty() { defaults.title.as_str() } else { title };
    let id = registry.add(title, config);
    registry.set_current(Some(id));
    id
}

/// Panel-local state.
#[derive(Resource, Debug, Default)]
pub struct PanelState {
    pub new_layer_name: String,
    pub status: String,
}

pub fn map_control_system(
    mut view: ResMut<MapView>,
    keyboard: Res<ButtonInput<KeyCode>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_evr: EventReader<MouseWheel>,
    time: Res<Time>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut contexts: EguiContexts,
) {
    let ctx = match contexts.try_ctx_mut() {
        Some(ctx) => ctx,
        None => return,
    };
    if ctx.wants_pointer_input() || ctx.wants_keyboard_input() {
        mouse_motion.clear();
        scroll_evr.clear();
        return;
    }

    // --- Zoom (Mouse Wheel), keeping the map point under the cursor fixed ---
    let mut scroll_line = 0.0;
    for ev in scroll_evr.read() {
        scroll_line += ev.y;
    }
    if scroll_line != 0.0 {
        let zoom_sensitivity = 0.1;
        let factor = f64::from(1.0 - scroll_line * zoom_sensitivity).clamp(0.5, 2.0);
        let new_zoom = (view.zoom * factor).clamp(0.05, 5_000.0);

        if let Ok(window) = windows.get_single() {
            if let Some(cursor) = window.cursor_position() {
                let viewport = view.viewport(window.width(), window.height());
                let anchor = viewport.to_map(PixelPoint::new(f64::from(cursor.x), f64::from(cursor.y)));
                let scale = new_zoom / view.zoom;
                view.center = MapPoint::new(
                    anchor.x + (view.center.x - anchor.x) * scale,
                    anchor.y + (view.center.y - anchor.y) * scale,
                );
            }
        }
        view.zoom = new_zoom;
    }

    // --- Pan (Keyboard & middle-button drag) ---
    let pan = f64::from(view.move_speed * time.delta_secs()) * view.zoom;
    let mut delta = MapPoint::default();
    if keyboard.pressed(KeyCode::ArrowUp) || keyboard.pressed(KeyCode::KeyW) {
        delta.y += pan;
    }
    if keyboard.pressed(KeyCode::ArrowDown) || keyboard.pressed(KeyCode::KeyS) {
        delta.y -= pan;
    }
    if keyboard.pressed(KeyCode::ArrowLeft) || keyboard.pressed(KeyCode::KeyA) {
        delta.x -= pan;
    }
    if keyboard.pressed(KeyCode::ArrowRight) || keyboard.pressed(KeyCode::KeyD) {
        delta.x += pan;
    }

    if mouse_button.pressed(MouseButton::Middle) {
        for ev in mouse_motion.read() {
            delta.x -= f64::from(ev.delta.x) * view.zoom;
            delta.y += f64::from(ev.delta.y) * view.zoom;
        }
    } else {
        mouse_motion.clear();
    }

    view.center.x += delta.x;
    view.center.y += delta.y;
}

/// Feed canvas clicks and key releases to the tool.
pub fn tool_input_system(
    mut tool: ResMut<OverlayTool>,
    mut registry: ResMut<LayerRegistry>,
    mut panel: ResMut<PanelState>,
    view: Res<MapView>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut contexts: EguiContexts,
) {
    if !tool.is_active() {
        return;
    }
    let ctx = match contexts.try_ctx_mut() {
        Some(ctx) => ctx,
        None => return,
    };

    let mut events = Vec::new();
    if keyboard.just_released(KeyCode::Escape) && !ctx.wants_keyboard_input() {
        events.push(ToolEvent::Escape);
    }
    if !ctx.wants_pointer_input() {
        if let Ok(window) = windows.get_single() {
            if let Some(cursor) = window.cursor_position() {
                let viewport = view.viewport(window.width(), window.height());
                let pos = viewport.to_map(PixelPoint::new(f64::from(cursor.x), f64::from(cursor.y)));
                for (mouse, button) in [
                    (MouseButton::Left, PointerButton::Left),
                    (MouseButton::Right, PointerButton::Right),
                    (MouseButton::Middle, PointerButton::Middle),
                ] {
                    if mouse_button.just_released(mouse) {
                        events.push(ToolEvent::Release { button, pos });
                    }
                }
            }
        }
    }

    for event in events {
        match tool.handle(event, &mut registry, &view.crs) {
            ToolAction::CenterPicked(id) => {
                if let Some(layer) = registry.get(id) {
                    let c = layer.config.center();
                    panel.status = format!("Center of '{}' set to {:.1}, {:.1}", layer.title, c.x, c.y);
                    info!("picked center {:?} for layer {:?}", c, id);
                }
            }
            ToolAction::Close => panel.status.clear(),
            ToolAction::None => {}
        }
    }
}

pub fn overlay_panel_system(
    mut contexts: EguiContexts,
    mut tool: ResMut<OverlayTool>,
    mut registry: ResMut<LayerRegistry>,
    mut panel: ResMut<PanelState>,
    settings: Res<PluginSettings>,
    view: Res<MapView>,
) {
    let ctx = match contexts.try_ctx_mut() {
        Some(ctx) => ctx,
        None => return,
    };

    if !tool.is_active() {
        egui::Window::new("Tools").show(ctx, |ui| {
            if ui.button("Overlay PC7").clicked() {
                let id = tool.activate(&mut registry, view.center, &view.crs, &settings.defaults);
                info!("overlay tool activated on layer {:?}", id);
            }
            let ground = view.zoom / geo::get_scale_factor_at_lat(geo::webmercator_to_wgs84(view.center).lat);
            ui.label(format!("{:.2} m/px", ground));
        });
        return;
    }

    if tool.is_picking() {
        ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
    }

    egui::TopBottomPanel::bottom("overlay_pc7_panel").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let current = registry.current();
            let selected_text = current
                .and_then(|id| registry.get(id))
                .map(|l| l.title.clone())
                .unwrap_or_default();
            let mut selection = current;
            egui::ComboBox::from_label("Layer")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for layer in registry.iter() {
                        ui.selectable_value(&mut selection, Some(layer.id), layer.title.as_str());
                    }
                });
            if selection != current {
                registry.set_current(selection);
                tool.set_picking(false);
            }

            ui.text_edit_singleline(&mut panel.new_layer_name);
            if ui.button("Add layer").clicked() {
                let name = std::mem::take(&mut panel.new_layer_name);
                create_layer(&mut registry, &name, view.center, view.crs.clone(), &settings.defaults);
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Close").clicked() {
                    tool.deactivate();
                }
            });
        });

        ui.separator();

        let Some(id) = registry.current() else {
            ui.label("No overlay layer selected");
            return;
        };
        let Some(layer) = registry.get_mut(id) else {
            return;
        };

        ui.horizontal(|ui| {
            let config = &mut layer.config;
            let mut center = config.center();
            let crs = config.crs().clone();
            ui.label("Center");
            let dx = ui.add(egui::DragValue::new(&mut center.x).speed(view.zoom).prefix("x: "));
            let dy = ui.add(egui::DragValue::new(&mut center.y).speed(view.zoom).prefix("y: "));
            if dx.changed() || dy.changed() {
                config.set_center(center, crs.clone());
            }
            ui.label(crs.authid());
            let pick_label = if tool.is_picking() { "Picking..." } else { "Pick" };
            if ui.button(pick_label).clicked() {
                let picking = !tool.is_picking();
                tool.set_picking(picking);
            }

            ui.separator();
            ui.add(
                egui::DragValue::new(&mut config.azimut)
                    .range(0.0..=360.0)
                    .speed(0.5)
                    .prefix("Azimut: ")
                    .suffix("°"),
            );
            ui.add(
                egui::DragValue::new(&mut config.azimut_left_fl)
                    .range(-360.0..=360.0)
                    .speed(0.5)
                    .prefix("Left FL: ")
                    .suffix("°"),
            );
            ui.add(
                egui::DragValue::new(&mut config.azimut_right_fl)
                    .range(-360.0..=360.0)
                    .speed(0.5)
                    .prefix("Right FL: ")
                    .suffix("°"),
            );
        });

        ui.horizontal(|ui| {
            let config = &mut layer.config;
            ui.add(egui::Slider::new(&mut config.line_width, 1..=20).text("Line width"));
            ui.add(egui::Slider::new(&mut config.transparency, 0..=100).text("Transparency %"));
            let Rgba { r, g, b, a } = config.color;
            let mut rgba = [r, g, b, a];
            if ui.color_edit_button_srgba_unmultiplied(&mut rgba).changed() {
                config.color = Rgba::new(rgba[0], rgba[1], rgba[2], rgba[3]);
            }
            ui.checkbox(&mut layer.visible, "Visible");

            ui.separator();
            if ui.button("Export CSV").clicked() {
                let path = settings.export_dir.join(format!("{}.csv", layer.title));
                panel.status = match io::export_layer_csv(&path, layer, &BuiltinTransform) {
                    Ok(()) => format!("Exported {:?}", path),
                    Err(e) => {
                        warn!("CSV export failed: {:#}", e);
                        format!("Export failed: {e:#}")
                    }
                };
            }
        });

        ui.horizontal(|ui| {
            if ui.button("Save project").clicked() {
                panel.status = match io::save_project(&settings.project_path, &registry) {
                    Ok(()) => format!("Saved {:?}", settings.project_path),
                    Err(e) => format!("Save failed: {e:#}"),
                };
            }
            if ui.button("Load project").clicked() {
                panel.status = match io::load_project(&settings.project_path, &mut registry) {
                    Ok(n) => {
                        let first = registry.find_layers_of_type(LAYER_TYPE).first().copied();
                        registry.set_current(first);
                        format!("Loaded {n} layers")
                    }
                    Err(e) => format!("Load failed: {e:#}"),
                };
            }
            if tool.is_picking() {
                ui.label("Click on the map to place the center, Esc to cancel");
            } else {
                ui.label(panel.status.as_str());
            }
        });
    });
}
