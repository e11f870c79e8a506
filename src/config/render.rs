//! Render surface configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a decoded frame is placed on the surface.
///
/// Fixed for the lifetime of a surface; switching mid-session causes jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// Scale to fit the fixed surface, preserving aspect ratio, centered
    #[default]
    Letterbox,
    /// Resize the surface to the frame's native size and draw 1:1
    ResizeToFrame,
}

impl FromStr for PlacementPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "letterbox" => Ok(PlacementPolicy::Letterbox),
            "resize_to_frame" => Ok(PlacementPolicy::ResizeToFrame),
            _ => Err(format!("Invalid placement policy: {}", s)),
        }
    }
}

/// Render surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub placement: PlacementPolicy,
    /// RGBA fill used to clear the surface before each paint
    pub background: [u8; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            placement: PlacementPolicy::Letterbox,
            background: [0, 0, 0, 255],
        }
    }
}
