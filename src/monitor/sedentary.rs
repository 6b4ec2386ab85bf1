use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{PostureType, WarningEvent};

/// Streak tracking for continuous good posture.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum SedentaryState {
    #[default]
    Idle,
    Tracking { started_at: DateTime<Utc> },
    /// Already warned for this streak; stays here until the streak breaks.
    Warned { started_at: DateTime<Utc> },
}

impl SedentaryState {
    pub fn streak_started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SedentaryState::Idle => None,
            SedentaryState::Tracking { started_at } | SedentaryState::Warned { started_at } => {
                Some(*started_at)
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SedentaryState::Idle)
    }
}

#[derive(Debug, Clone)]
pub struct SedentaryMonitor {
    threshold: Duration,
    state: SedentaryState,
}

impl SedentaryMonitor {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            state: SedentaryState::Idle,
        }
    }

    pub fn state(&self) -> SedentaryState {
        self.state
    }

    /// Feed one verdict. Returns `Sedentary` the first time a good streak
    /// outlasts the threshold.
    pub fn observe(&mut self, verdict: PostureType, now: DateTime<Utc>) -> Option<WarningEvent> {
        if verdict.is_bad() {
            self.state = SedentaryState::Idle;
            return None;
        }

        match self.state {
            SedentaryState::Idle => {
                self.state = SedentaryState::Tracking { started_at: now };
                None
            }
            SedentaryState::Tracking { started_at } => {
                if now - started_at > self.threshold {
                    self.state = SedentaryState::Warned { started_at };
                    Some(WarningEvent::Sedentary)
                } else {
                    None
                }
            }
            SedentaryState::Warned { .. } => None,
        }
    }

    /// Drop the streak. Returns whether there was anything to drop.
    pub fn reset(&mut self) -> bool {
        let was_active = !self.state.is_idle();
        self.state = SedentaryState::Idle;
        was_active
    }

    pub fn streak_duration(&self, now: DateTime<Utc>) -> Duration {
        self.state
            .streak_started_at()
            .map(|started_at| now - started_at)
            .unwrap_or_else(Duration::zero)
    }
}
