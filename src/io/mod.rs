use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{CrsId, CrsTransform, MapPoint};
use crate::layer::{LayerRegistry, OverlayLayer, LAYER_TYPE};
use crate::overlay::{build_geometry, OverlayConfig, OverlayGeometry, Rgba};

/// Flat string attributes of one persisted layer element.
pub type LayerAttributes = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error("missing attribute `{0}`")]
    Missing(&'static str),
    #[error("invalid value {value:?} for attribute `{name}`")]
    Invalid { name: &'static str, value: String },
    #[error("layer type `{0}` is not an overlay layer")]
    WrongLayerType(String),
    #[error("cannot decode color {0:?}")]
    Color(String),
}

pub fn encode_color(color: Rgba) -> String {
    format!("{},{},{},{}", color.r, color.g, color.b, color.a)
}

/// Accepts `r,g,b`, `r,g,b,a`, `#rrggbb` and `#rrggbbaa`.
pub fn decode_color(s: &str) -> Result<Rgba, AttributeError> {
    let err = || AttributeError::Color(s.to_string());
    let s_trim = s.trim();
    if let Some(hex) = s_trim.strip_prefix('#') {
        if !matches!(hex.len(), 6 | 8) || !hex.is_ascii() {
            return Err(err());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        return Ok(Rgba::new(channel(0)?, channel(2)?, channel(4)?, a));
    }
    let parts = s_trim
        .split(',')
        .map(|p| p.trim().parse::<u8>().map_err(|_| err()))
        .collect::<Result<Vec<_>, _>>()?;
    match parts.as_slice() {
        [r, g, b] => Ok(Rgba::new(*r, *g, *b, 255)),
        [r, g, b, a] => Ok(Rgba::new(*r, *g, *b, *a)),
        _ => Err(err()),
    }
}

pub fn write_layer_attributes(layer: &OverlayLayer) -> LayerAttributes {
    let config = &layer.config;
    let center = config.center();
    [
        ("type", "plugin".to_string()),
        ("name", LAYER_TYPE.to_string()),
        ("title", layer.title.clone()),
        ("transparency", config.transparency.to_string()),
        ("x", center.x.to_string()),
        ("y", center.y.to_string()),
        ("azimut", config.azimut.to_string()),
        ("azimutLeftFL", config.azimut_left_fl.to_string()),
        ("azimutRightFL", config.azimut_right_fl.to_string()),
        ("crs", config.crs().authid().to_string()),
        ("color", encode_color(config.color)),
        ("lineWidth", config.line_width.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn attr<'a>(attrs: &'a LayerAttributes, name: &'static str) -> Result<&'a str, AttributeError> {
    attrs
        .get(name)
        .map(String::as_str)
        .ok_or(AttributeError::Missing(name))
}

fn parse_attr<T: std::str::FromStr>(attrs: &LayerAttributes, name: &'static str) -> Result<T, AttributeError> {
    let value = attr(attrs, name)?;
    value.trim().parse().map_err(|_| AttributeError::Invalid {
        name,
        value: value.to_string(),
    })
}

/// Title and config of a persisted layer. The `name` attribute, when present, must be
/// the overlay layer type.
pub fn read_layer_attributes(attrs: &LayerAttributes) -> Result<(String, OverlayConfig), AttributeError> {
    if let Some(name) = attrs.get("name") {
        if name != LAYER_TYPE {
            return Err(AttributeError::WrongLayerType(name.clone()));
        }
    }
    let title = attr(attrs, "title")?.to_string();
    let center = MapPoint::new(parse_attr(attrs, "x")?, parse_attr(attrs, "y")?);
    let crs = CrsId::new(attr(attrs, "crs")?);

    let mut config = OverlayConfig::new(
        center,
        crs,
        parse_attr(attrs, "azimut")?,
        parse_attr(attrs, "azimutLeftFL")?,
        parse_attr(attrs, "azimutRightFL")?,
    );
    config.transparency = parse_attr(attrs, "transparency")?;
    config.color = decode_color(attr(attrs, "color")?)?;
    config.line_width = parse_attr(attrs, "lineWidth")?;
    Ok((title, config))
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProjectFile {
    pub layers: Vec<LayerAttributes>,
}

pub fn save_project(path: impl AsRef<Path>, registry: &LayerRegistry) -> Result<()> {
    let path = path.as_ref();
    let project = ProjectFile {
        layers: registry.iter().map(write_layer_attributes).collect(),
    };
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &project)?;
    writer.flush()?;
    tracing::info!("saved {} overlay layers to {:?}", project.layers.len(), path);
    Ok(())
}

/// Replace the registry's layers with those stored at `path`.
pub fn load_project(path: impl AsRef<Path>, registry: &mut LayerRegistry) -> Result<usize> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    let project: ProjectFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {:?}", path))?;

    let layers = project
        .layers
        .iter()
        .enumerate()
        .map(|(i, attrs)| read_layer_attributes(attrs).with_context(|| format!("layer #{i} in {:?}", path)))
        .collect::<Result<Vec<_>>>()?;

    registry.clear();
    for (title, config) in layers {
        registry.add(title, config);
    }
    tracing::info!("loaded {} overlay layers from {:?}", registry.len(), path);
    Ok(registry.len())
}

#[derive(Debug, Serialize)]
struct GeometryRecord<'a> {
    shape: &'a str,
    index: usize,
    lon: f64,
    lat: f64,
}

/// Write every sequence as `shape,index,lon,lat` rows. `index` counts sequences of the
/// same shape (ring 0, axis 0/1, flight_line 0/1).
pub fn export_geometry_csv<W: Write>(writer: W, geometry: &OverlayGeometry) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut seen = BTreeMap::new();
    for (shape, points) in geometry.sequences() {
        let counter = seen.entry(shape.label()).or_insert(0usize);
        for p in points {
            wtr.serialize(GeometryRecord {
                shape: shape.label(),
                index: *counter,
                lon: p.lon,
                lat: p.lat,
            })?;
        }
        *counter += 1;
    }
    wtr.flush()?;
    Ok(())
}

/// Build the geometry of `layer` and write it to `path` as CSV.
pub fn export_layer_csv(path: impl AsRef<Path>, layer: &OverlayLayer, transform: &dyn CrsTransform) -> Result<()> {
    let path = path.as_ref();
    let wgs_center = transform
        .to_wgs84(layer.config.center(), layer.config.crs())
        .with_context(|| format!("cannot locate layer '{}'", layer.title))?;
    let geometry = build_geometry(&layer.config, wgs_center);
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    export_geometry_csv(BufWriter::new(file), &geometry)?;
    tracing::info!("exported {} points of '{}' to {:?}", geometry.point_count(), layer.title, path);
    Ok(())
}
