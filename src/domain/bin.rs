//! Bin - Registry Records

use serde::{Deserialize, Serialize};

use crate::constants::{FIRST_ASSIGNED_ID, NEW_BIN_STATUS, NORMALIZED_MAX, NORMALIZED_MIN};
use crate::domain::timestamp::Timestamp;

/// A bin position as percentage of the map's width and height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPosition {
    pub x: f64,
    pub y: f64,
}

impl MapPosition {
    /// Create a position, clamping both axes into `[0, 100]`
    pub fn clamped(x: f64, y: f64) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return NORMALIZED_MIN;
    }
    value.clamp(NORMALIZED_MIN, NORMALIZED_MAX)
}

/// A bin registry document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinRecord {
    /// Document ID
    #[serde(default)]
    pub id: String,
    /// Stable external label, expected to be numeric
    #[serde(rename = "assignedID", alias = "assignedId", default)]
    pub assigned_id: String,
    /// Device MAC / hardware address
    #[serde(
        rename = "hardwareAddress",
        alias = "macAddress",
        alias = "macID",
        default
    )]
    pub hardware_address: String,
    /// Registration time (assigned by the store)
    #[serde(rename = "registeredAt", default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<Timestamp>,
    /// Status label ("active", "offline", ...)
    #[serde(default)]
    pub status: String,
    /// Map position, absent until placed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<MapPosition>,
}

impl BinRecord {
    /// The numeric bin ID used by sensor logs, if the assigned ID parses
    pub fn numeric_id(&self) -> Option<i64> {
        parse_assigned_id(&self.assigned_id)
    }

    /// Whether the hardware address matches, ignoring case and padding
    pub fn has_hardware_address(&self, address: &str) -> bool {
        self.hardware_address
            .trim()
            .eq_ignore_ascii_case(address.trim())
    }
}

/// A registry document to be created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBin {
    #[serde(rename = "hardwareAddress")]
    pub hardware_address: String,
    #[serde(rename = "assignedID")]
    pub assigned_id: String,
    pub status: String,
}

impl NewBin {
    pub fn new(hardware_address: impl Into<String>, assigned_id: impl Into<String>) -> Self {
        Self {
            hardware_address: hardware_address.into(),
            assigned_id: assigned_id.into(),
            status: NEW_BIN_STATUS.to_string(),
        }
    }
}

/// Strictly parse an assigned ID as an integer
///
/// Surrounding whitespace is ignored; anything else that is not an integer
/// (including the empty string) yields `None`.
pub fn parse_assigned_id(assigned_id: &str) -> Option<i64> {
    let trimmed = assigned_id.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<i64>().ok()
}

/// Lenient leading-integer parse (`"12abc"` -> 12)
fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Next free assigned ID: highest parseable ID plus one, or "1"
pub fn next_assigned_id<'a>(assigned_ids: impl IntoIterator<Item = &'a str>) -> String {
    assigned_ids
        .into_iter()
        .filter_map(parse_leading_int)
        .max()
        .map(|max| max.saturating_add(1).to_string())
        .unwrap_or_else(|| FIRST_ASSIGNED_ID.to_string())
}
