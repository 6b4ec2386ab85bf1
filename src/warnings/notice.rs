use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::models::WarningEvent;
use crate::stretches::{self, Stretch};

pub const BAD_POSTURE_CHARACTER: &str = "MeerkatCloseMouse";
pub const SEDENTARY_CHARACTER: &str = "character_warning";
pub const BREAK_CHARACTER: &str = "MeerkatUpArm";

/// What the presentation layer shows for one dispatched warning.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WarningNotice {
    pub event: WarningEvent,
    pub message: String,
    pub character: &'static str,
    pub stretch: Option<Stretch>,
    pub dispatched_at: DateTime<Utc>,
}

impl WarningNotice {
    pub fn for_event<R: Rng + ?Sized>(
        event: WarningEvent,
        dispatched_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Self {
        match event {
            WarningEvent::BadPosture(posture) => Self {
                event,
                message: format!("You're showing {}. Let's fix your posture!", posture.label()),
                character: BAD_POSTURE_CHARACTER,
                stretch: None,
                dispatched_at,
            },
            WarningEvent::Sedentary => Self {
                event,
                message: "You've been sitting for over an hour! Stand up and take a short break!"
                    .to_string(),
                character: SEDENTARY_CHARACTER,
                stretch: None,
                dispatched_at,
            },
            WarningEvent::BreakTime => {
                let stretch = stretches::pick_one(rng);
                Self {
                    event,
                    message: format!(
                        "Break time! Try this: {}. {}",
                        stretch.title, stretch.description
                    ),
                    character: BREAK_CHARACTER,
                    stretch: Some(stretch),
                    dispatched_at,
                }
            }
        }
    }
}
