//! Viewport - Map Pan/Zoom Transform
//!
//! Three coordinate spaces are involved:
//!
//! ```text
//! normalized [0,100]^2  <-- x width/100 -->  map pixels (unscaled)
//!                                               │
//!                                 * zoom + pan + origin
//!                                               ▼
//!                                        screen pixels
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_ZOOM_STEP, NORMALIZED_MAX};
use crate::domain::bin::MapPosition;
use crate::error::{Error, Result};

/// A point in screen (viewport) pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Viewport translation in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PanOffset {
    pub dx: f64,
    pub dy: f64,
}

/// Zoom bounds and step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_ZOOM,
            max: DEFAULT_MAX_ZOOM,
            step: DEFAULT_ZOOM_STEP,
        }
    }
}

impl ZoomLimits {
    /// Validate the limits; 1.0 must lie inside so that reset is reachable
    pub fn validate(&self) -> Result<()> {
        let ok = self.min > 0.0 && self.min <= 1.0 && self.max >= 1.0 && self.step > 0.0;
        if ok {
            Ok(())
        } else {
            Err(Error::Invalid {
                message: format!(
                    "zoom limits must satisfy 0 < min <= 1 <= max and step > 0 (got min={}, max={}, step={})",
                    self.min, self.max, self.step
                ),
            })
        }
    }
}

/// Where the map sits on screen and its unscaled size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapGeometry {
    /// Top-left corner of the viewport in screen pixels
    pub origin: ScreenPoint,
    /// Unscaled map width in pixels
    pub width: f64,
    /// Unscaled map height in pixels
    pub height: f64,
}

impl MapGeometry {
    pub fn new(origin: ScreenPoint, width: f64, height: f64) -> Self {
        Self {
            origin,
            width,
            height,
        }
    }
}

/// Pan offset plus zoom factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f64,
    pan: PanOffset,
    limits: ZoomLimits,
}

impl Viewport {
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            zoom: 1.0,
            pan: PanOffset::default(),
            limits,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> PanOffset {
        self.pan
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    /// Zoom level for display, e.g. 125 for 1.25x
    pub fn zoom_percent(&self) -> i64 {
        (self.zoom * 100.0).round() as i64
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom < self.limits.max
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom > self.limits.min
    }

    /// Step the zoom up; returns whether it changed
    pub fn zoom_in(&mut self) -> bool {
        self.set_zoom(self.zoom + self.limits.step)
    }

    /// Step the zoom down; returns whether it changed
    pub fn zoom_out(&mut self) -> bool {
        self.set_zoom(self.zoom - self.limits.step)
    }

    /// Set zoom, clamped to the limits; returns whether it changed
    pub fn set_zoom(&mut self, zoom: f64) -> bool {
        let clamped = zoom.clamp(self.limits.min, self.limits.max);
        let changed = clamped != self.zoom;
        self.zoom = clamped;
        changed
    }

    pub fn set_pan(&mut self, pan: PanOffset) {
        self.pan = pan;
    }

    /// Back to zoom 1 and no pan
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = PanOffset::default();
    }

    /// Marker scale that keeps markers a constant on-screen size
    pub fn marker_scale(&self) -> f64 {
        1.0 / self.zoom
    }

    /// Screen point to unscaled map pixels
    pub fn screen_to_map(&self, point: ScreenPoint, geometry: &MapGeometry) -> (f64, f64) {
        (
            (point.x - geometry.origin.x - self.pan.dx) / self.zoom,
            (point.y - geometry.origin.y - self.pan.dy) / self.zoom,
        )
    }

    /// Screen point to a normalized position, clamped to the map
    pub fn screen_to_normalized(&self, point: ScreenPoint, geometry: &MapGeometry) -> MapPosition {
        let (map_x, map_y) = self.screen_to_map(point, geometry);
        MapPosition::clamped(
            map_x / geometry.width * NORMALIZED_MAX,
            map_y / geometry.height * NORMALIZED_MAX,
        )
    }

    /// Normalized position to where it is drawn on screen
    pub fn normalized_to_screen(&self, position: MapPosition, geometry: &MapGeometry) -> ScreenPoint {
        let map_x = position.x / NORMALIZED_MAX * geometry.width;
        let map_y = position.y / NORMALIZED_MAX * geometry.height;
        ScreenPoint {
            x: geometry.origin.x + self.pan.dx + map_x * self.zoom,
            y: geometry.origin.y + self.pan.dy + map_y * self.zoom,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(ZoomLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> MapGeometry {
        MapGeometry::new(ScreenPoint::new(100.0, 50.0), 1000.0, 500.0)
    }

    #[test]
    fn zoom_clamps_and_is_idempotent_at_bounds() {
        let mut viewport = Viewport::default();
        viewport.set_zoom(3.0);
        assert!(!viewport.zoom_in());
        assert_eq!(viewport.zoom(), 3.0);
        assert!(!viewport.can_zoom_in());

        viewport.set_zoom(0.5);
        assert!(!viewport.zoom_out());
        assert_eq!(viewport.zoom(), 0.5);
        assert!(!viewport.can_zoom_out());
    }

    #[test]
    fn zoom_steps() {
        let mut viewport = Viewport::default();
        assert!(viewport.zoom_in());
        assert_eq!(viewport.zoom(), 1.25);
        assert_eq!(viewport.zoom_percent(), 125);
        viewport.zoom_out();
        viewport.zoom_out();
        assert_eq!(viewport.zoom(), 0.75);
        assert!((viewport.marker_scale() - 1.0 / 0.75).abs() < 1e-12);
    }

    #[test]
    fn reset_restores_identity() {
        let mut viewport = Viewport::default();
        viewport.zoom_in();
        viewport.set_pan(PanOffset { dx: 30.0, dy: -12.0 });
        viewport.reset();
        assert_eq!(viewport.zoom(), 1.0);
        assert_eq!(viewport.pan(), PanOffset::default());
    }

    #[test]
    fn screen_to_normalized_accounts_for_pan_and_zoom() {
        let mut viewport = Viewport::default();
        viewport.set_zoom(2.0);
        viewport.set_pan(PanOffset { dx: 20.0, dy: 10.0 });

        // origin (100,50) + pan (20,10) + map (250,125) * 2
        let point = ScreenPoint::new(620.0, 310.0);
        let position = viewport.screen_to_normalized(point, &geometry());
        assert!((position.x - 25.0).abs() < 1e-9);
        assert!((position.y - 25.0).abs() < 1e-9);

        let back = viewport.normalized_to_screen(position, &geometry());
        assert!((back.x - point.x).abs() < 1e-9);
        assert!((back.y - point.y).abs() < 1e-9);
    }

    #[test]
    fn screen_to_normalized_clamps_outside_map() {
        let viewport = Viewport::default();
        // x = -10% of 1000px, y = 140% of 500px
        let position = viewport.screen_to_normalized(ScreenPoint::new(0.0, 750.0), &geometry());
        assert_eq!(position, MapPosition { x: 0.0, y: 100.0 });

        let position = viewport.screen_to_normalized(ScreenPoint::new(1500.0, 40.0), &geometry());
        assert_eq!(position, MapPosition { x: 100.0, y: 0.0 });
    }

    #[test]
    fn limits_validation() {
        assert!(ZoomLimits::default().validate().is_ok());
        let bad = ZoomLimits {
            min: 1.5,
            max: 3.0,
            step: 0.25,
        };
        assert!(bad.validate().is_err());
        let no_step = ZoomLimits {
            step: 0.0,
            ..Default::default()
        };
        assert!(no_step.validate().is_err());
    }
}
