pub mod controller;
mod loop_worker;
pub mod source;
pub mod throttle;

pub use controller::SensingController;
pub use loop_worker::LoopTimings;
pub use source::{JsonLinesSource, LandmarkSource};
pub use throttle::FrameThrottle;
