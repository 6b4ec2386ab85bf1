use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday};

use crate::models::WarningEvent;

/// Wall-clock break reminders on selected weekdays.
///
/// Polled on a fixed interval; fires at most once per matching minute even
/// if polled more often.
#[derive(Debug, Clone)]
pub struct BreakReminder {
    times: Vec<NaiveTime>,
    weekdays: Vec<Weekday>,
    poll_interval: Duration,
    next_poll_at: Option<DateTime<Utc>>,
    last_fired: Option<(NaiveDate, u32, u32)>,
}

impl BreakReminder {
    pub fn new(times: Vec<NaiveTime>, weekdays: Vec<Weekday>, poll_interval: Duration) -> Self {
        Self {
            times,
            weekdays,
            poll_interval,
            next_poll_at: None,
            last_fired: None,
        }
    }

    /// Whether `local` (minute granularity) is a reminder slot.
    pub fn matches<Tz: TimeZone>(&self, local: &DateTime<Tz>) -> bool {
        if !self.weekdays.contains(&local.weekday()) {
            return false;
        }
        self.times
            .iter()
            .any(|time| time.hour() == local.hour() && time.minute() == local.minute())
    }

    /// Check the schedule at most once per poll interval. Poll slots are
    /// aligned to interval boundaries, so per-second callers land on the
    /// first tick of each minute.
    pub fn poll<Tz: TimeZone>(&mut self, local: &DateTime<Tz>) -> Option<WarningEvent> {
        let now = local.with_timezone(&Utc);
        if let Some(next) = self.next_poll_at {
            if now < next {
                return None;
            }
        }
        self.next_poll_at = Some(self.next_slot(now));
        self.check(local)
    }

    fn next_slot(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let step = self.poll_interval.num_seconds().max(1);
        let slot_start = now.timestamp().div_euclid(step) * step;
        DateTime::<Utc>::from_timestamp(slot_start + step, 0).unwrap_or(now + self.poll_interval)
    }

    /// Check the schedule immediately, ignoring the poll interval.
    pub fn check<Tz: TimeZone>(&mut self, local: &DateTime<Tz>) -> Option<WarningEvent> {
        if !self.matches(local) {
            return None;
        }
        let slot = (local.date_naive(), local.hour(), local.minute());
        if self.last_fired == Some(slot) {
            return None;
        }
        self.last_fired = Some(slot);
        Some(WarningEvent::BreakTime)
    }
}
