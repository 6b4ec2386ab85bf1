use chrono::{DateTime, Duration, Utc};

/// Drops frames arriving sooner than the processing interval after the last
/// admitted one.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
    interval: Duration,
    last_admitted: Option<DateTime<Utc>>,
}

impl FrameThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admitted: None,
        }
    }

    pub fn admit(&mut self, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_admitted {
            if now - last < self.interval {
                return false;
            }
        }
        self.last_admitted = Some(now);
        true
    }
}
