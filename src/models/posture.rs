use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Posture classification for a single sampled frame.
///
/// Declaration order is the report order; `Ord` follows it.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "camelCase")]
pub enum PostureType {
    #[default]
    Good,
    FaceTilt,
    ForwardLean,
    ShoulderTilt,
    SideLean,
}

impl PostureType {
    pub const ALL: [PostureType; 5] = [
        PostureType::Good,
        PostureType::FaceTilt,
        PostureType::ForwardLean,
        PostureType::ShoulderTilt,
        PostureType::SideLean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostureType::Good => "good",
            PostureType::FaceTilt => "faceTilt",
            PostureType::ForwardLean => "forwardLean",
            PostureType::ShoulderTilt => "shoulderTilt",
            PostureType::SideLean => "sideLean",
        }
    }

    /// Human-readable name used in warning bubbles and reports.
    pub fn label(&self) -> &'static str {
        match self {
            PostureType::Good => "good posture",
            PostureType::FaceTilt => "a tilted head",
            PostureType::ForwardLean => "a forward lean",
            PostureType::ShoulderTilt => "tilted shoulders",
            PostureType::SideLean => "a sideways lean",
        }
    }

    pub fn is_good(&self) -> bool {
        matches!(self, PostureType::Good)
    }

    pub fn is_bad(&self) -> bool {
        !self.is_good()
    }
}

/// A merged run of identical verdicts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostureRecord {
    pub id: String,
    pub posture_type: PostureType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl PostureRecord {
    pub fn open(posture_type: PostureType, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            posture_type,
            start_time: at,
            end_time: at,
        }
    }

    pub fn duration(&self) -> Duration {
        let span = self.end_time - self.start_time;
        if span < Duration::zero() {
            Duration::zero()
        } else {
            span
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration().num_milliseconds() as f64 / 1000.0
    }
}

/// Warning raised by the recorder or monitor, consumed by the arbiter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase", tag = "kind", content = "posture")]
pub enum WarningEvent {
    BadPosture(PostureType),
    Sedentary,
    BreakTime,
}

impl WarningEvent {
    /// Dispatch rank; higher goes first.
    pub fn priority(&self) -> u8 {
        match self {
            WarningEvent::Sedentary | WarningEvent::BreakTime => 2,
            WarningEvent::BadPosture(_) => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WarningEvent::BadPosture(_) => "badPosture",
            WarningEvent::Sedentary => "sedentary",
            WarningEvent::BreakTime => "breakTime",
        }
    }
}

/// Total bad-posture time for one local calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: chrono::NaiveDate,
    pub total_bad_secs: f64,
}

impl DailySummary {
    pub fn total_bad_duration(&self) -> Duration {
        Duration::milliseconds((self.total_bad_secs * 1000.0).round() as i64)
    }
}
