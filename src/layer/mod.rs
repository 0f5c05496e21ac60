use bevy::prelude::Resource;

use crate::geo::MapPoint;
use crate::overlay::{OverlayConfig, RING_RADIUS_M};

/// Type name under which overlay layers are registered and persisted.
pub const LAYER_TYPE: &str = "overlaypc7";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

/// Axis-aligned rectangle in map units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: MapPoint,
    pub max: MapPoint,
}

impl Extent {
    pub fn contains(&self, p: MapPoint) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    pub id: LayerId,
    pub title: String,
    pub config: OverlayConfig,
    pub visible: bool,
}

impl OverlayLayer {
    pub fn new(id: LayerId, title: impl Into<String>, config: OverlayConfig) -> Self {
        Self {
            id,
            title: title.into(),
            config,
            visible: true,
        }
    }

    pub fn layer_type(&self) -> &'static str {
        LAYER_TYPE
    }

    /// Square around the center covering the ring, in the layer CRS's units.
    pub fn extent(&self) -> Extent {
        let center = self.config.center();
        let radius = RING_RADIUS_M * self.config.crs().meters_to_map_units();
        Extent {
            min: MapPoint::new(center.x - radius, center.y - radius),
            max: MapPoint::new(center.x + radius, center.y + radius),
        }
    }
}

/// Lookup of registered layers by type name.
pub trait LayerLookup {
    fn find_layers_of_type(&self, layer_type: &str) -> Vec<LayerId>;
}

/// Overlay layers known to the host, in insertion order, plus the canvas's current layer.
#[derive(Debug, Default, Resource)]
pub struct LayerRegistry {
    layers: Vec<OverlayLayer>,
    next_id: u64,
    current: Option<LayerId>,
}

impl LayerRegistry {
    pub fn add(&mut self, title: impl Into<String>, config: OverlayConfig) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.push(OverlayLayer::new(id, title, config));
        tracing::debug!("layer {:?} added", id);
        id
    }

    pub fn remove(&mut self, id: LayerId) -> Option<OverlayLayer> {
        let idx = self.layers.iter().position(|l| l.id == id)?;
        if self.current == Some(id) {
            self.current = None;
        }
        Some(self.layers.remove(idx))
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.current = None;
    }

    pub fn get(&self, id: LayerId) -> Option<&OverlayLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut OverlayLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverlayLayer> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn current(&self) -> Option<LayerId> {
        self.current
    }

    pub fn set_current(&mut self, id: Option<LayerId>) {
        self.current = id.filter(|id| self.get(*id).is_some());
    }
}

impl LayerLookup for LayerRegistry {
    fn find_layers_of_type(&self, layer_type: &str) -> Vec<LayerId> {
        self.layers
            .iter()
            .filter(|l| l.layer_type() == layer_type)
            .map(|l| l.id)
            .collect()
    }
}
