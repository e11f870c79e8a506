//! Metrics panel view model

use crate::snapshot::{MetricName, MetricSnapshot};
use serde::Serialize;

/// Text shown for a metric the latest snapshot did not define.
pub const PLACEHOLDER: &str = "---";

/// The labeled metric fields shown next to the live frame.
///
/// Applying a snapshot replaces every entry, so a metric missing from the
/// newest snapshot goes back to the placeholder rather than keeping a stale
/// value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsPanel {
    frame_num: Option<u64>,
    snapshot: Option<MetricSnapshot>,
}

impl MetricsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, snapshot: &MetricSnapshot) {
        self.frame_num = Some(snapshot.frame_num);
        self.snapshot = Some(snapshot.clone());
    }

    pub fn clear(&mut self) {
        self.frame_num = None;
        self.snapshot = None;
    }

    /// Frame number of the applied snapshot, if any
    pub fn frame_num(&self) -> Option<u64> {
        self.frame_num
    }

    pub fn value(&self, name: MetricName) -> Option<f64> {
        self.snapshot.as_ref().and_then(|s| s.get(name))
    }

    /// Display text for one metric
    pub fn entry(&self, name: MetricName) -> String {
        match self.value(name) {
            Some(v) => format_value(v),
            None => PLACEHOLDER.to_string(),
        }
    }

    /// All ten entries in display order
    pub fn entries(&self) -> Vec<(MetricName, String)> {
        MetricName::ALL
            .into_iter()
            .map(|name| (name, self.entry(name)))
            .collect()
    }

    /// Single-line summary, e.g. `frame 12 | stride_angle=12 throwing_angle=---`
    pub fn summary_line(&self) -> String {
        let frame = self
            .frame_num
            .map(|n| n.to_string())
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let fields = self
            .entries()
            .into_iter()
            .map(|(name, text)| format!("{}={}", name, text))
            .collect::<Vec<_>>()
            .join(" ");
        format!("frame {} | {}", frame, fields)
    }
}

fn format_value(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_panel_is_all_placeholders() {
        let panel = MetricsPanel::new();
        assert!(panel.entries().iter().all(|(_, text)| text == PLACEHOLDER));
        assert_eq!(panel.frame_num(), None);
    }

    #[test]
    fn test_apply_renders_defined_values() {
        let mut panel = MetricsPanel::new();
        panel.apply(&MetricSnapshot::new(1).with(MetricName::StrideAngle, 12.0));
        assert_eq!(panel.entry(MetricName::StrideAngle), "12");
        assert_eq!(panel.entry(MetricName::ThrowingAngle), PLACEHOLDER);
        assert_eq!(panel.frame_num(), Some(1));
    }

    #[test]
    fn test_zero_renders_as_zero_not_placeholder() {
        let mut panel = MetricsPanel::new();
        panel.apply(&MetricSnapshot::new(1).with(MetricName::HipRotation, 0.0));
        assert_eq!(panel.entry(MetricName::HipRotation), "0");
    }

    #[test]
    fn test_newer_snapshot_drops_stale_values() {
        let mut panel = MetricsPanel::new();
        panel.apply(&MetricSnapshot::new(1).with(MetricName::ElbowHeight, 1.5));
        panel.apply(&MetricSnapshot::new(2));
        assert_eq!(panel.entry(MetricName::ElbowHeight), PLACEHOLDER);
    }

    #[test]
    fn test_summary_line() {
        let mut panel = MetricsPanel::new();
        panel.apply(&MetricSnapshot::new(4).with(MetricName::ArmSymmetry, 0.75));
        let line = panel.summary_line();
        assert!(line.starts_with("frame 4 | stride_angle=---"));
        assert!(line.contains("arm_symmetry=0.75"));
    }

    proptest! {
        #[test]
        fn prop_missing_fields_render_placeholder(mask in 0u16..1024, value in -500.0f64..500.0) {
            let mut snapshot = MetricSnapshot::new(1);
            for (i, name) in MetricName::ALL.into_iter().enumerate() {
                if mask & (1 << i) != 0 {
                    snapshot.set(name, value);
                }
            }
            let mut panel = MetricsPanel::new();
            panel.apply(&snapshot);
            for (i, name) in MetricName::ALL.into_iter().enumerate() {
                let text = panel.entry(name);
                if mask & (1 << i) != 0 {
                    prop_assert_ne!(text, PLACEHOLDER);
                } else {
                    prop_assert_eq!(text, PLACEHOLDER);
                }
            }
        }
    }
}
