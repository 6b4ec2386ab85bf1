mod posture;

pub use posture::{DailySummary, PostureRecord, PostureType, WarningEvent};
