//! Advisory rule thresholds

use serde::{Deserialize, Serialize};

/// Thresholds for the built-in advisory rules. Rule order is not configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// Warn when the stride angle is below this many degrees
    pub stride_angle_min: f64,
    /// Warn when the throwing angle is above this many degrees
    pub throwing_angle_max: f64,
    /// Praise arm symmetry below this value
    pub arm_symmetry_max: f64,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            stride_angle_min: 15.0,
            throwing_angle_max: 120.0,
            arm_symmetry_max: 1.0,
        }
    }
}
