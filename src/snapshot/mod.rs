//! Metric record parsing.
//!
//! Text messages on the analysis stream are JSON records of the form
//!
//! ```json
//! {"frame_data": "<image>", "frame_num": 12, "metrics": {"stride_angle": 14.2}}
//! ```
//!
//! or an application-level failure `{"error": "..."}`. [`parse`] turns one
//! record into a [`StreamRecord`].

mod error;

pub use error::ParseError;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The biomechanical metrics the analysis service reports per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    StrideAngle,
    ThrowingAngle,
    ArmSymmetry,
    HipRotation,
    ElbowHeight,
    AnkleHeight,
    ShoulderRotation,
    TorsoTiltAngle,
    ReleaseDistance,
    ShoulderToHip,
}

impl MetricName {
    /// All recognized metrics, in panel display order.
    pub const ALL: [MetricName; 10] = [
        MetricName::StrideAngle,
        MetricName::ThrowingAngle,
        MetricName::ArmSymmetry,
        MetricName::HipRotation,
        MetricName::ElbowHeight,
        MetricName::AnkleHeight,
        MetricName::ShoulderRotation,
        MetricName::TorsoTiltAngle,
        MetricName::ReleaseDistance,
        MetricName::ShoulderToHip,
    ];

    /// Wire name of the metric
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::StrideAngle => "stride_angle",
            MetricName::ThrowingAngle => "throwing_angle",
            MetricName::ArmSymmetry => "arm_symmetry",
            MetricName::HipRotation => "hip_rotation",
            MetricName::ElbowHeight => "elbow_height",
            MetricName::AnkleHeight => "ankle_height",
            MetricName::ShoulderRotation => "shoulder_rotation",
            MetricName::TorsoTiltAngle => "torso_tilt_angle",
            MetricName::ReleaseDistance => "release_distance",
            MetricName::ShoulderToHip => "shoulder_to_hip",
        }
    }

    /// Human-readable panel label
    pub fn label(&self) -> &'static str {
        match self {
            MetricName::StrideAngle => "Stride angle",
            MetricName::ThrowingAngle => "Throwing angle",
            MetricName::ArmSymmetry => "Arm symmetry",
            MetricName::HipRotation => "Hip rotation",
            MetricName::ElbowHeight => "Elbow height",
            MetricName::AnkleHeight => "Ankle height",
            MetricName::ShoulderRotation => "Shoulder rotation",
            MetricName::TorsoTiltAngle => "Torso tilt angle",
            MetricName::ReleaseDistance => "Release distance",
            MetricName::ShoulderToHip => "Shoulder to hip",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame's worth of metric values. Every metric is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSnapshot {
    pub frame_num: u64,
    values: BTreeMap<MetricName, f64>,
}

impl MetricSnapshot {
    pub fn new(frame_num: u64) -> Self {
        Self {
            frame_num,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter, mostly useful in tests.
    pub fn with(mut self, name: MetricName, value: f64) -> Self {
        self.set(name, value);
        self
    }

    /// Set a value. Non-finite values are treated as absent.
    pub fn set(&mut self, name: MetricName, value: f64) {
        if value.is_finite() {
            self.values.insert(name, value);
        } else {
            self.values.remove(&name);
        }
    }

    pub fn get(&self, name: MetricName) -> Option<f64> {
        self.values.get(&name).copied()
    }

    /// Number of metrics present in this snapshot
    pub fn defined_count(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricName, Option<f64>)> + '_ {
        MetricName::ALL.into_iter().map(|m| (m, self.get(m)))
    }
}

/// A successfully parsed stream record.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamRecord {
    /// Metrics for one frame, optionally with an embedded image still in wire encoding
    Frame {
        snapshot: MetricSnapshot,
        image: Option<String>,
    },
    /// The analysis service reported a failure
    Failure(String),
}

#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(default, alias = "image")]
    frame_data: Option<String>,
    #[serde(default)]
    frame_num: Option<u64>,
    #[serde(default)]
    metrics: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse one text message from the stream.
///
/// # Example
///
/// ```
/// use pitchlens::snapshot::{parse, MetricName, StreamRecord};
///
/// let record = parse(r#"{"frame_num": 1, "metrics": {"stride_angle": 12}}"#).unwrap();
/// match record {
///     StreamRecord::Frame { snapshot, image } => {
///         assert_eq!(snapshot.get(MetricName::StrideAngle), Some(12.0));
///         assert!(image.is_none());
///     }
///     StreamRecord::Failure(_) => unreachable!(),
/// }
/// ```
pub fn parse(text: &str) -> Result<StreamRecord, ParseError> {
    let wire: WireRecord =
        serde_json::from_str(text).map_err(|e| ParseError::Malformed(e.to_string()))?;

    if let Some(message) = wire.error.filter(|m| !m.is_empty()) {
        return Ok(StreamRecord::Failure(message));
    }

    let frame_num = wire.frame_num.ok_or(ParseError::MissingField("frame_num"))?;
    let mut snapshot = MetricSnapshot::new(frame_num);
    for (key, value) in wire.metrics.unwrap_or_default() {
        let Some(name) = MetricName::from_wire(&key) else {
            tracing::trace!(metric = %key, "Ignoring unrecognized metric");
            continue;
        };
        match value.as_f64() {
            Some(v) => snapshot.set(name, v),
            None if value.is_null() => {}
            None => tracing::debug!(metric = %key, value = %value, "Non-numeric metric value treated as absent"),
        }
    }

    Ok(StreamRecord::Frame {
        snapshot,
        image: wire.frame_data.filter(|s| !s.is_empty()),
    })
}
