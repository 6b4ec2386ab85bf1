use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Face detector output, normalized to [0, 1] image space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FaceObservation {
    /// Head roll in radians; some detectors cannot estimate it.
    pub roll_radians: Option<f64>,
    pub bounding_box_height: f64,
    pub bounding_box_center_x: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum JointName {
    Nose,
    Neck,
    LeftShoulder,
    RightShoulder,
    LeftEar,
    RightEar,
    LeftHip,
    RightHip,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct JointPoint {
    pub x: f64,
    pub y: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BodyObservation {
    pub joint_positions: HashMap<JointName, JointPoint>,
}

impl BodyObservation {
    /// Joint position, only if it clears the confidence gate.
    pub fn confident_joint(&self, joint: JointName, min_confidence: f64) -> Option<JointPoint> {
        self.joint_positions
            .get(&joint)
            .copied()
            .filter(|point| point.confidence > min_confidence)
    }
}

/// Everything the detector produced for one sampled frame.
///
/// Both sides absent is a valid sample: nobody was detected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkSample {
    pub face: Option<FaceObservation>,
    pub body: Option<BodyObservation>,
}

impl LandmarkSample {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.face.is_none() && self.body.is_none()
    }
}
