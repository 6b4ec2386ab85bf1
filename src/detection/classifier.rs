use crate::models::PostureType;
use crate::settings::ClassifierSettings;

use super::smoother::{shoulder_angle, ShoulderSmoother};
use super::types::{BodyObservation, FaceObservation, JointName, LandmarkSample};

/// Slack for threshold comparisons on derived values (degree conversion,
/// offset from centre), so a value sitting on a threshold is judged as on it.
const THRESHOLD_EPSILON: f64 = 1e-9;

fn at_least(value: f64, threshold: f64) -> bool {
    value >= threshold - THRESHOLD_EPSILON
}

fn beyond(value: f64, threshold: f64) -> bool {
    value > threshold + THRESHOLD_EPSILON
}

/// Per-source verdicts for one frame, before they are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameAssessment {
    pub face: Option<PostureType>,
    pub shoulders: Option<PostureType>,
}

impl FrameAssessment {
    /// Shoulders are checked after the face: a shoulder tilt overwrites the
    /// face verdict, level shoulders never clear a bad face verdict.
    pub fn verdict(&self) -> Option<PostureType> {
        match (self.face, self.shoulders) {
            (None, None) => None,
            (Some(face), None) => Some(face),
            (None, Some(shoulders)) => Some(shoulders),
            (Some(face), Some(shoulders)) => {
                if shoulders.is_bad() {
                    Some(shoulders)
                } else {
                    Some(face)
                }
            }
        }
    }
}

pub struct LandmarkClassifier {
    settings: ClassifierSettings,
    smoother: ShoulderSmoother,
}

impl LandmarkClassifier {
    pub fn new(settings: ClassifierSettings) -> Self {
        let smoother = ShoulderSmoother::new(settings.shoulder_window);
        Self { settings, smoother }
    }

    /// Classify one frame. `None` means nothing usable was detected.
    pub fn classify(&mut self, sample: &LandmarkSample) -> Option<PostureType> {
        self.assess(sample).verdict()
    }

    pub fn assess(&mut self, sample: &LandmarkSample) -> FrameAssessment {
        FrameAssessment {
            face: sample.face.as_ref().map(|face| self.classify_face(face)),
            shoulders: sample
                .body
                .as_ref()
                .and_then(|body| self.classify_shoulders(body)),
        }
    }

    /// Later rules overwrite earlier ones: roll, then distance, then offset.
    pub fn classify_face(&self, face: &FaceObservation) -> PostureType {
        let mut status = PostureType::Good;

        if let Some(roll) = face.roll_radians {
            if at_least(roll.to_degrees().abs(), self.settings.face_roll_threshold_deg) {
                status = PostureType::FaceTilt;
            }
        }

        if face.bounding_box_height > self.settings.forward_lean_height {
            status = PostureType::ForwardLean;
        }

        if beyond((face.bounding_box_center_x - 0.5).abs(), self.settings.side_lean_offset) {
            status = PostureType::SideLean;
        }

        status
    }

    /// Skipped entirely (no sample pushed) unless both shoulders clear the
    /// confidence gate.
    fn classify_shoulders(&mut self, body: &BodyObservation) -> Option<PostureType> {
        let min_confidence = self.settings.min_joint_confidence;
        let left = body.confident_joint(JointName::LeftShoulder, min_confidence)?;
        let right = body.confident_joint(JointName::RightShoulder, min_confidence)?;

        let angle = shoulder_angle((left.x, left.y), (right.x, right.y));
        let smoothed_deg = self.smoother.push(angle);

        if at_least(smoothed_deg.abs(), self.settings.shoulder_tilt_threshold_deg) {
            Some(PostureType::ShoulderTilt)
        } else {
            Some(PostureType::Good)
        }
    }

    pub fn smoother(&self) -> &ShoulderSmoother {
        &self.smoother
    }
}
