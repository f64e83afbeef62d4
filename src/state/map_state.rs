//! MapState - Markers, Viewport, and Pointer Gestures
//!
//! One gesture at a time: a pointer-down either pans the viewport or, in
//! edit mode, drags a single marker. Zoom input is ignored while a marker
//! is being dragged.

use ahash::AHashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::constants::UNPLACED_MARKER_PERCENT;
use crate::domain::aggregation::{EnrichedBin, MarkerStatus};
use crate::domain::bin::MapPosition;
use crate::domain::config::MapConfig;
use crate::domain::viewport::{MapGeometry, PanOffset, ScreenPoint, Viewport, ZoomLimits};
use crate::error::{Error, Result};
use crate::services::{BinService, ServiceEvent};

/// One bin as drawn on the map
#[derive(Debug, Clone, PartialEq)]
pub struct MapMarker {
    /// Registry document ID
    pub bin_id: Arc<str>,
    pub assigned_id: Arc<str>,
    /// Normalized position
    pub position: MapPosition,
    pub fill_level: f64,
    pub weight: f64,
    pub status: MarkerStatus,
}

impl MapMarker {
    fn from_enriched(bin: &EnrichedBin) -> Self {
        let position = bin.bin.position.unwrap_or(MapPosition {
            x: UNPLACED_MARKER_PERCENT,
            y: UNPLACED_MARKER_PERCENT,
        });
        Self {
            bin_id: bin.bin.id.as_str().into(),
            assigned_id: bin.bin.assigned_id.as_str().into(),
            position,
            fill_level: bin.fill_level,
            weight: bin.weight,
            status: bin.status(),
        }
    }
}

/// Marker counts per status, for the legend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub normal: usize,
    pub warning: usize,
    pub critical: usize,
}

/// Active pointer gesture
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    Panning {
        /// Pointer position at pointer-down
        start: ScreenPoint,
        /// Pan offset at pointer-down
        pan_origin: PanOffset,
    },
    DraggingMarker {
        bin_id: Arc<str>,
    },
}

/// Map view state
#[derive(Debug)]
pub struct MapState {
    viewport: Viewport,
    geometry: MapGeometry,
    markers: Vec<MapMarker>,
    /// Document ID -> index into `markers`
    index: AHashMap<Arc<str>, usize>,
    edit_mode: bool,
    gesture: Gesture,
    /// Dropped positions whose background write has not reported back
    pending: AHashMap<Arc<str>, MapPosition>,
}

impl MapState {
    pub fn new(limits: ZoomLimits, geometry: MapGeometry) -> Self {
        Self {
            viewport: Viewport::new(limits),
            geometry,
            markers: Vec::new(),
            index: AHashMap::new(),
            edit_mode: false,
            gesture: Gesture::Idle,
            pending: AHashMap::new(),
        }
    }

    /// Map at the screen origin with the configured size and zoom limits
    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(
            config.zoom_limits(),
            MapGeometry::new(ScreenPoint::default(), config.width_px, config.height_px),
        )
    }

    // ==================== Markers ====================

    /// Replace markers from the latest enriched bins
    ///
    /// A marker being dragged, or dropped and still being saved, keeps its
    /// on-screen position.
    pub fn set_markers(&mut self, bins: &[EnrichedBin]) {
        let dragged = match &self.gesture {
            Gesture::DraggingMarker { bin_id } => self
                .marker(bin_id)
                .map(|m| (bin_id.clone(), m.position)),
            _ => None,
        };

        self.markers = bins.iter().map(MapMarker::from_enriched).collect();
        for marker in &mut self.markers {
            if let Some(&position) = self.pending.get(&marker.bin_id) {
                marker.position = position;
            }
        }
        self.index = self
            .markers
            .iter()
            .enumerate()
            .map(|(i, m)| (m.bin_id.clone(), i))
            .collect();

        if let Some((bin_id, position)) = dragged {
            match self.index.get(&bin_id) {
                Some(&i) => self.markers[i].position = position,
                None => {
                    debug!("Dragged bin {} disappeared, cancelling drag", bin_id);
                    self.gesture = Gesture::Idle;
                }
            }
        }
    }

    pub fn markers(&self) -> &[MapMarker] {
        &self.markers
    }

    pub fn marker(&self, bin_id: &str) -> Option<&MapMarker> {
        self.index.get(bin_id).map(|&i| &self.markers[i])
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.markers
            .iter()
            .fold(StatusCounts::default(), |mut counts, marker| {
                match marker.status {
                    MarkerStatus::Normal => counts.normal += 1,
                    MarkerStatus::Warning => counts.warning += 1,
                    MarkerStatus::Critical => counts.critical += 1,
                }
                counts
            })
    }

    /// Where a marker is drawn under the current pan and zoom
    pub fn marker_screen_position(&self, bin_id: &str) -> Option<ScreenPoint> {
        self.marker(bin_id)
            .map(|m| self.viewport.normalized_to_screen(m.position, &self.geometry))
    }

    pub fn marker_scale(&self) -> f64 {
        self.viewport.marker_scale()
    }

    // ==================== Viewport ====================

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn geometry(&self) -> MapGeometry {
        self.geometry
    }

    pub fn set_geometry(&mut self, geometry: MapGeometry) {
        self.geometry = geometry;
    }

    pub fn zoom_in(&mut self) -> bool {
        if self.is_dragging_marker() {
            debug!("Ignoring zoom in during marker drag");
            return false;
        }
        self.viewport.zoom_in()
    }

    pub fn zoom_out(&mut self) -> bool {
        if self.is_dragging_marker() {
            debug!("Ignoring zoom out during marker drag");
            return false;
        }
        self.viewport.zoom_out()
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    // ==================== Gestures ====================

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn is_dragging_marker(&self) -> bool {
        matches!(self.gesture, Gesture::DraggingMarker { .. })
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Toggle edit mode; returns the new value
    pub fn toggle_edit_mode(&mut self) -> bool {
        self.set_edit_mode(!self.edit_mode);
        self.edit_mode
    }

    /// Leaving edit mode does not end a drag already in progress
    pub fn set_edit_mode(&mut self, enabled: bool) {
        self.edit_mode = enabled;
    }

    /// Pointer-down on the map background; ignored if a gesture is active
    pub fn begin_pan(&mut self, pointer: ScreenPoint) -> bool {
        if self.gesture != Gesture::Idle {
            return false;
        }
        self.gesture = Gesture::Panning {
            start: pointer,
            pan_origin: self.viewport.pan(),
        };
        true
    }

    pub fn update_pan(&mut self, pointer: ScreenPoint) {
        if let Gesture::Panning { start, pan_origin } = self.gesture {
            self.viewport.set_pan(PanOffset {
                dx: pan_origin.dx + pointer.x - start.x,
                dy: pan_origin.dy + pointer.y - start.y,
            });
        }
    }

    pub fn end_pan(&mut self) {
        if matches!(self.gesture, Gesture::Panning { .. }) {
            self.gesture = Gesture::Idle;
        }
    }

    /// Pointer-down on a marker
    pub fn begin_marker_drag(&mut self, bin_id: &str) -> Result<()> {
        if !self.edit_mode {
            return Err(Error::EditModeDisabled);
        }
        if self.gesture != Gesture::Idle {
            return Err(Error::GestureInProgress);
        }
        let Some(marker) = self.marker(bin_id) else {
            return Err(Error::UnknownBin {
                bin_id: bin_id.to_string(),
            });
        };
        self.gesture = Gesture::DraggingMarker {
            bin_id: marker.bin_id.clone(),
        };
        Ok(())
    }

    /// Move the dragged marker under the pointer, clamped to the map
    pub fn update_marker_drag(&mut self, pointer: ScreenPoint) -> Option<MapPosition> {
        let Gesture::DraggingMarker { bin_id } = &self.gesture else {
            return None;
        };
        let position = self.viewport.screen_to_normalized(pointer, &self.geometry);
        let &i = self.index.get(bin_id)?;
        self.markers[i].position = position;
        Some(position)
    }

    /// Finish the drag and persist the final position in the background
    ///
    /// The marker stays where it was dropped even if the write fails.
    pub fn end_marker_drag(&mut self, service: &BinService) -> Option<(Arc<str>, MapPosition)> {
        if !self.is_dragging_marker() {
            return None;
        }
        let Gesture::DraggingMarker { bin_id } = std::mem::replace(&mut self.gesture, Gesture::Idle)
        else {
            return None;
        };
        let position = self.marker(&bin_id)?.position;
        info!(
            "Moved bin {} to ({:.1}, {:.1})",
            bin_id, position.x, position.y
        );
        self.pending.insert(bin_id.clone(), position);
        service.persist_position_detached(bin_id.clone(), position);
        Some((bin_id, position))
    }

    /// Whether a dropped marker's position is still being saved
    pub fn is_saving(&self, bin_id: &str) -> bool {
        self.pending.contains_key(bin_id)
    }

    /// Settle pending positions from save results
    pub fn apply_event(&mut self, event: &ServiceEvent) {
        match event {
            ServiceEvent::PositionSaved { bin_id, position } => {
                // A later drop of the same bin may still be in flight
                if self.pending.get(bin_id) == Some(position) {
                    self.pending.remove(bin_id);
                }
            }
            ServiceEvent::PositionSaveFailed { bin_id, .. } => {
                self.pending.remove(bin_id);
            }
            _ => {}
        }
    }

    /// Pointer left the map: end whatever gesture is active
    pub fn pointer_leave(&mut self, service: &BinService) {
        match self.gesture {
            Gesture::Idle => {}
            Gesture::Panning { .. } => self.end_pan(),
            Gesture::DraggingMarker { .. } => {
                self.end_marker_drag(service);
            }
        }
    }
}

impl Default for MapState {
    fn default() -> Self {
        Self::from_config(&MapConfig::default())
    }
}
