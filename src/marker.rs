//! Marker data types
//!
//! A marker is a numbered tap target on screen. Display settings describe
//! how markers are drawn by whatever renders the overlay; voxtap only
//! stores them.

use crate::error::MarkerError;
use serde::{Deserialize, Serialize};

/// Hard cap on the number of markers a registry may hold
pub const MAX_MARKERS: usize = 10;

/// A numbered tap target in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// 1-based position in the registry
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

impl Marker {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }

    /// Squared Euclidean distance from the marker center to a point
    pub fn distance_sq(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} ({:.0}, {:.0})", self.id, self.x, self.y)
    }
}

/// Reject points that would not survive a round trip through the store
pub fn check_point(x: f32, y: f32) -> Result<(), MarkerError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(MarkerError::InvalidPoint(format!("{}, {}", x, y)))
    }
}

/// Marker appearance, persisted independently of the markers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySettings {
    /// Marker diameter in density-independent units
    #[serde(default = "default_marker_size")]
    pub marker_size_units: u32,

    /// Marker opacity (0.0 to 1.0)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Marker color as ARGB
    #[serde(default = "default_color")]
    pub color_value: u32,
}

fn default_marker_size() -> u32 {
    30
}

fn default_opacity() -> f32 {
    0.7
}

fn default_color() -> u32 {
    0xFFFF_0000
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            marker_size_units: default_marker_size(),
            opacity: default_opacity(),
            color_value: default_color(),
        }
    }
}

impl DisplaySettings {
    /// Clamp values into their valid ranges
    pub fn clamped(self) -> Self {
        let opacity = if self.opacity.is_nan() {
            default_opacity()
        } else {
            self.opacity.clamp(0.0, 1.0)
        };

        Self {
            marker_size_units: self.marker_size_units.max(1),
            opacity,
            color_value: self.color_value,
        }
    }

    /// Color formatted as `#AARRGGBB`
    pub fn color_hex(&self) -> String {
        format!("#{:08X}", self.color_value)
    }
}

/// Parse a color written as `#RRGGBB`, `#AARRGGBB`, or a bare hex string.
/// Six-digit colors are made fully opaque.
pub fn parse_color(text: &str) -> Option<u32> {
    let hex = text
        .trim()
        .trim_start_matches('#')
        .trim_start_matches("0x")
        .trim_start_matches("0X");

    let value = u32::from_str_radix(hex, 16).ok()?;
    match hex.len() {
        6 => Some(0xFF00_0000 | value),
        8 => Some(value),
        _ => None,
    }
}
