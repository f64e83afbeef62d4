//! Fleet Constants
//!
//! Centralized thresholds, limits, and collection names.

/// Fill percentage at or above which a bin is critical
pub const CRITICAL_FILL_PERCENT: f64 = 95.0;

/// Fill percentage at or above which a map marker shows a warning
pub const WARNING_FILL_PERCENT: f64 = 75.0;

/// History row fill bands (strictly greater than)
pub const HISTORY_HIGH_FILL_PERCENT: f64 = 90.0;
pub const HISTORY_ELEVATED_FILL_PERCENT: f64 = 75.0;

/// Map zoom defaults
pub const DEFAULT_MIN_ZOOM: f64 = 0.5;
pub const DEFAULT_MAX_ZOOM: f64 = 3.0;
pub const DEFAULT_ZOOM_STEP: f64 = 0.25;

/// Unscaled map image size in pixels
pub const DEFAULT_MAP_WIDTH_PX: f64 = 1200.0;
pub const DEFAULT_MAP_HEIGHT_PX: f64 = 800.0;

/// Normalized coordinate range (percent of map width/height)
pub const NORMALIZED_MIN: f64 = 0.0;
pub const NORMALIZED_MAX: f64 = 100.0;

/// Document collections
pub const BIN_REGISTRY_COLLECTION: &str = "bin_registry";
pub const BIN_HISTORY_COLLECTION: &str = "bin_history";

/// Status written for newly registered bins
pub const NEW_BIN_STATUS: &str = "active";

/// Assigned ID suggested when the registry holds no numeric IDs
pub const FIRST_ASSIGNED_ID: &str = "1";

/// Bounded notice buffer capacity
pub const NOTICE_CAPACITY: usize = 200;

/// Normalized position of markers for bins never placed on the map
pub const UNPLACED_MARKER_PERCENT: f64 = 50.0;
