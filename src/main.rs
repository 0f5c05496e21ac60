use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiPlugin;

use pc7_overlay::config::{settings_from_env, PluginSettings};
use pc7_overlay::geo::BuiltinTransform;
use pc7_overlay::io::load_project;
use pc7_overlay::layer::LayerRegistry;
use pc7_overlay::render::gizmo::GizmoPainter;
use pc7_overlay::render::{render_overlay, RenderContext};
use pc7_overlay::ui::{
    map_control_system, overlay_panel_system, tool_input_system, MapView, OverlayTool, PanelState,
};

fn main() {
    let settings = settings_from_env();

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "PC-7 Overlay".to_string(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin)
        .insert_resource(MapView::from_settings(&settings.view))
        .insert_resource(settings)
        .init_resource::<LayerRegistry>()
        .init_resource::<OverlayTool>()
        .init_resource::<PanelState>()
        .add_systems(Startup, (setup, load_layers))
        .add_systems(
            Update,
            (
                overlay_panel_system,
                map_control_system,
                tool_input_system,
                sync_gizmo_width,
                draw_overlays,
            )
                .chain(),
        )
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn(Camera2d);
}

fn load_layers(settings: Res<PluginSettings>, mut registry: ResMut<LayerRegistry>) {
    if !settings.project_path.exists() {
        return;
    }
    match load_project(&settings.project_path, &mut registry) {
        Ok(n) => info!("Restored {} overlay layers from {:?}", n, settings.project_path),
        Err(e) => warn!("Could not restore overlay layers: {:#}", e),
    }
}

/// Gizmo lines share one width; follow the layer being edited.
fn sync_gizmo_width(mut config_store: ResMut<GizmoConfigStore>, registry: Res<LayerRegistry>) {
    let width = registry
        .current()
        .and_then(|id| registry.get(id))
        .or_else(|| registry.iter().next())
        .map(|layer| layer.config.line_width)
        .unwrap_or(3);
    let (config, _) = config_store.config_mut::<DefaultGizmoConfigGroup>();
    config.line_width = width as f32;
}

/// Repaint every visible overlay layer. A layer whose transform fails is skipped for this
/// frame.
fn draw_overlays(
    mut gizmos: Gizmos,
    registry: Res<LayerRegistry>,
    view: Res<MapView>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let viewport = view.viewport(window.width(), window.height());
    let ctx = RenderContext {
        transform: &BuiltinTransform,
        display_crs: view.crs.clone(),
        map_to_pixel: &viewport,
    };
    let mut painter = GizmoPainter::new(&mut gizmos, Vec2::new(window.width(), window.height()));

    for layer in registry.iter().filter(|l| l.visible) {
        if let Err(e) = render_overlay(&layer.config, &ctx, &mut painter) {
            warn!("Skipping layer '{}': {}", layer.title, e);
        }
    }
}
