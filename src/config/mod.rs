use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::geo::GeodesicPoint;
use crate::overlay::Rgba;

/// Environment variable naming the settings file.
pub const SETTINGS_ENV: &str = "PC7_OVERLAY_SETTINGS";
pub const DEFAULT_SETTINGS_FILE: &str = "pc7_overlay.json";

/// Orientation and style given to newly created layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerDefaults {
    pub title: String,
    pub azimut: f64,
    pub azimut_left_fl: f64,
    pub azimut_right_fl: f64,
    pub color: Rgba,
    pub line_width: u32,
    pub transparency: u8,
}

impl Default for LayerDefaults {
    fn default() -> Self {
        Self {
            title: "OverlayPC7".to_string(),
            azimut: 22.5,
            azimut_left_fl: 45.0,
            azimut_right_fl: 135.0,
            color: Rgba::RED,
            line_width: 3,
            transparency: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub center: GeodesicPoint,
    /// Initial zoom, projected meters per pixel.
    pub meters_per_pixel: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            center: GeodesicPoint::new(8.0, 47.0),
            meters_per_pixel: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct PluginSettings {
    pub project_path: PathBuf,
    pub export_dir: PathBuf,
    pub defaults: LayerDefaults,
    pub view: ViewSettings,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            project_path: PathBuf::from("overlays.json"),
            export_dir: PathBuf::from("."),
            defaults: LayerDefaults::default(),
            view: ViewSettings::default(),
        }
    }
}

pub fn load_settings(path: impl AsRef<Path>) -> Result<PluginSettings> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let settings = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {:?}", path))?;
    Ok(settings)
}

/// Settings from `$PC7_OVERLAY_SETTINGS` or `pc7_overlay.json`. A missing file gives the
/// defaults; an unreadable one logs a warning and gives the defaults too.
pub fn settings_from_env() -> PluginSettings {
    let path = std::env::var_os(SETTINGS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    if !path.exists() {
        tracing::debug!("no settings file at {:?}, using defaults", path);
        return PluginSettings::default();
    }
    match load_settings(&path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("ignoring settings file: {:#}", e);
            PluginSettings::default()
        }
    }
}
