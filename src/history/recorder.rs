use chrono::{DateTime, Duration, Utc};

use crate::models::{PostureType, WarningEvent};
use crate::monitor::{SedentaryMonitor, SedentaryState};

use super::store::{PostureHistory, RecordChange};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Result of feeding one tick to the recorder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    pub change: Option<RecordChange>,
    pub events: Vec<WarningEvent>,
    /// The absence timeout cleared an active streak on this tick.
    pub session_reset: bool,
}

/// Owns the record sequence and the streak state derived from it.
pub struct SessionRecorder {
    history: PostureHistory,
    monitor: SedentaryMonitor,
    detection_timeout: Duration,
    last_detected_at: DateTime<Utc>,
}

impl SessionRecorder {
    /// `started_at` seeds the absence timer, as if someone was seen at start-up.
    pub fn new(
        history: PostureHistory,
        monitor: SedentaryMonitor,
        detection_timeout: Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            history,
            monitor,
            detection_timeout,
            last_detected_at: started_at,
        }
    }

    pub fn record(&mut self, verdict: Option<PostureType>, now: DateTime<Utc>) -> RecordOutcome {
        match verdict {
            Some(posture) => self.record_verdict(posture, now),
            None => self.record_absence(now),
        }
    }

    fn record_verdict(&mut self, posture: PostureType, now: DateTime<Utc>) -> RecordOutcome {
        let change = self.history.add(posture, now);
        self.last_detected_at = now;

        let mut events = Vec::new();
        if let Some(event) = self.monitor.observe(posture, now) {
            log_info!("good posture streak passed the sedentary threshold");
            events.push(event);
        }
        if posture.is_bad() {
            events.push(WarningEvent::BadPosture(posture));
        }

        RecordOutcome {
            change: Some(change),
            events,
            session_reset: false,
        }
    }

    fn record_absence(&mut self, now: DateTime<Utc>) -> RecordOutcome {
        let gap = now - self.last_detected_at;
        let mut session_reset = false;
        if gap > self.detection_timeout {
            session_reset = self.reset_session();
            if session_reset {
                log_info!(
                    "no person detected for {}ms, session reset",
                    gap.num_milliseconds()
                );
            }
        } else {
            log_debug!("no usable observation ({}ms since last)", gap.num_milliseconds());
        }

        RecordOutcome {
            change: None,
            events: Vec::new(),
            session_reset,
        }
    }

    /// Clear streak tracking. Records stay. Returns whether a streak was cleared.
    pub fn reset_session(&mut self) -> bool {
        self.monitor.reset()
    }

    pub fn history(&self) -> &PostureHistory {
        &self.history
    }

    pub fn session_state(&self) -> SedentaryState {
        self.monitor.state()
    }

    pub fn last_detected_at(&self) -> DateTime<Utc> {
        self.last_detected_at
    }
}
