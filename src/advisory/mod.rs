//! Coaching advisories derived from metric snapshots.
//!
//! An [`AdvisoryEvaluator`] is a pure function of a snapshot. The shipped
//! [`ThresholdRules`] checks three thresholds in a fixed priority order and
//! only the first matching rule fires.

use crate::config::AdvisoryConfig;
use crate::snapshot::{MetricName, MetricSnapshot};
use serde::{Deserialize, Serialize};

/// Severity tag of an advisory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Good,
}

/// A single coaching suggestion shown in the advisory panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryMessage {
    pub severity: Severity,
    pub text: String,
}

impl AdvisoryMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }

    pub fn good(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Good,
            text: text.into(),
        }
    }

    /// Advisory shown while a session has started but no snapshot has arrived.
    pub fn pending() -> Self {
        Self::info("Waiting for the analysis to produce suggestions...")
    }
}

/// Maps a snapshot to the advisory to display.
///
/// Implementations must be deterministic and side-effect free.
pub trait AdvisoryEvaluator: Send + Sync {
    fn evaluate(&self, snapshot: &MetricSnapshot) -> AdvisoryMessage;
}

/// Threshold-based rules, checked in priority order:
///
/// 1. stride angle below `stride_angle_min` (warning)
/// 2. throwing angle above `throwing_angle_max` (warning)
/// 3. arm symmetry below `arm_symmetry_max` (good)
///
/// Falls back to an informational "awaiting data" message.
#[derive(Debug, Clone)]
pub struct ThresholdRules {
    stride_angle_min: f64,
    throwing_angle_max: f64,
    arm_symmetry_max: f64,
}

impl ThresholdRules {
    pub fn new(config: &AdvisoryConfig) -> Self {
        Self {
            stride_angle_min: config.stride_angle_min,
            throwing_angle_max: config.throwing_angle_max,
            arm_symmetry_max: config.arm_symmetry_max,
        }
    }
}

impl Default for ThresholdRules {
    fn default() -> Self {
        Self::new(&AdvisoryConfig::default())
    }
}

impl AdvisoryEvaluator for ThresholdRules {
    fn evaluate(&self, snapshot: &MetricSnapshot) -> AdvisoryMessage {
        if let Some(stride) = snapshot.get(MetricName::StrideAngle) {
            if stride < self.stride_angle_min {
                return AdvisoryMessage::warning(format!(
                    "Suggestion: stride angle is below {}°.",
                    self.stride_angle_min
                ));
            }
        }
        if let Some(throwing) = snapshot.get(MetricName::ThrowingAngle) {
            if throwing > self.throwing_angle_max {
                return AdvisoryMessage::warning(format!(
                    "Suggestion: throwing angle is above {}°.",
                    self.throwing_angle_max
                ));
            }
        }
        if let Some(symmetry) = snapshot.get(MetricName::ArmSymmetry) {
            if symmetry < self.arm_symmetry_max {
                return AdvisoryMessage::good("Arm symmetry looks good!");
            }
        }
        AdvisoryMessage::info("Analyzing... awaiting data.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(snapshot: MetricSnapshot) -> AdvisoryMessage {
        ThresholdRules::default().evaluate(&snapshot)
    }

    #[test]
    fn test_stride_rule_fires_below_threshold() {
        let advisory = eval(MetricSnapshot::new(1).with(MetricName::StrideAngle, 12.0));
        assert_eq!(advisory.severity, Severity::Warning);
        assert_eq!(advisory.text, "Suggestion: stride angle is below 15°.");
    }

    #[test]
    fn test_stride_rule_boundary_does_not_fire() {
        let advisory = eval(MetricSnapshot::new(1).with(MetricName::StrideAngle, 15.0));
        assert_eq!(advisory.severity, Severity::Info);
    }

    #[test]
    fn test_throwing_rule() {
        let advisory = eval(
            MetricSnapshot::new(1)
                .with(MetricName::StrideAngle, 20.0)
                .with(MetricName::ThrowingAngle, 121.0),
        );
        assert_eq!(advisory.severity, Severity::Warning);
        assert!(advisory.text.contains("throwing angle"));
    }

    #[test]
    fn test_arm_symmetry_rule() {
        let advisory = eval(MetricSnapshot::new(1).with(MetricName::ArmSymmetry, 0.4));
        assert_eq!(advisory, AdvisoryMessage::good("Arm symmetry looks good!"));
    }

    #[test]
    fn test_priority_stride_wins_over_everything() {
        let advisory = eval(
            MetricSnapshot::new(1)
                .with(MetricName::StrideAngle, 10.0)
                .with(MetricName::ThrowingAngle, 130.0)
                .with(MetricName::ArmSymmetry, 0.5),
        );
        assert_eq!(advisory.severity, Severity::Warning);
        assert!(advisory.text.contains("stride angle"));
    }

    #[test]
    fn test_priority_throwing_wins_over_symmetry() {
        let advisory = eval(
            MetricSnapshot::new(1)
                .with(MetricName::ThrowingAngle, 130.0)
                .with(MetricName::ArmSymmetry, 0.5),
        );
        assert!(advisory.text.contains("throwing angle"));
    }

    #[test]
    fn test_empty_snapshot_awaits_data() {
        let advisory = eval(MetricSnapshot::new(1));
        assert_eq!(advisory, AdvisoryMessage::info("Analyzing... awaiting data."));
    }

    #[test]
    fn test_custom_thresholds() {
        let rules = ThresholdRules::new(&AdvisoryConfig {
            stride_angle_min: 20.0,
            ..Default::default()
        });
        let advisory = rules.evaluate(&MetricSnapshot::new(1).with(MetricName::StrideAngle, 18.0));
        assert_eq!(advisory.text, "Suggestion: stride angle is below 20°.");
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let rules = ThresholdRules::default();
        let snapshot = MetricSnapshot::new(7)
            .with(MetricName::ThrowingAngle, 140.0)
            .with(MetricName::ArmSymmetry, 0.1);
        assert_eq!(rules.evaluate(&snapshot), rules.evaluate(&snapshot));
    }
}
