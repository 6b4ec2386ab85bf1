pub mod classifier;
pub mod smoother;
pub mod types;

pub use classifier::{FrameAssessment, LandmarkClassifier};
pub use smoother::ShoulderSmoother;
pub use types::{BodyObservation, FaceObservation, JointName, JointPoint, LandmarkSample};
