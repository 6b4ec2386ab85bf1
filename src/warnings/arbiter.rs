use chrono::{DateTime, Duration, Utc};

use crate::models::WarningEvent;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueuedWarning {
    event: WarningEvent,
    seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWarning {
    pub event: WarningEvent,
    pub started_at: DateTime<Utc>,
}

/// Sequences warnings toward the presentation layer: one on screen at a
/// time, highest priority first, new dispatch cycles spaced by a cooldown.
///
/// When a displayed warning finishes, the next queued one is handed over
/// immediately without waiting for the cooldown; the cooldown restarts from
/// that handoff.
#[derive(Debug, Clone)]
pub struct WarningArbiter {
    cooldown: Duration,
    queue: Vec<QueuedWarning>,
    next_seq: u64,
    displaying: Option<ActiveWarning>,
    cooldown_until: Option<DateTime<Utc>>,
}

impl WarningArbiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            queue: Vec::new(),
            next_seq: 0,
            displaying: None,
            cooldown_until: None,
        }
    }

    /// Queue an event. An identical event already waiting is kept in place
    /// instead of being queued twice.
    pub fn enqueue(&mut self, event: WarningEvent) -> bool {
        if self.queue.iter().any(|queued| queued.event == event) {
            log_debug!("warning {} already pending", event.as_str());
            return false;
        }
        self.queue.push(QueuedWarning {
            event,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        true
    }

    pub fn in_cooldown(&self, now: DateTime<Utc>) -> bool {
        self.cooldown_until.map_or(false, |until| now < until)
    }

    pub fn is_displaying(&self) -> bool {
        self.displaying.is_some()
    }

    pub fn displaying(&self) -> Option<ActiveWarning> {
        self.displaying
    }

    pub fn pending(&self) -> Vec<WarningEvent> {
        self.queue.iter().map(|queued| queued.event).collect()
    }

    /// Start a dispatch cycle if nothing is on screen and the cooldown has passed.
    pub fn try_dispatch(&mut self, now: DateTime<Utc>) -> Option<WarningEvent> {
        if self.is_displaying() || self.in_cooldown(now) {
            return None;
        }
        self.dispatch_next(now)
    }

    /// The presentation layer finished showing the current warning.
    /// Hands over the next queued warning right away, if any. With nothing
    /// on screen this is an ordinary dispatch attempt and the cooldown holds.
    pub fn finish_display(&mut self, now: DateTime<Utc>) -> Option<WarningEvent> {
        let Some(active) = self.displaying.take() else {
            log_debug!("display finished with nothing on screen");
            return self.try_dispatch(now);
        };
        log_debug!(
            "warning {} finished after {}ms",
            active.event.as_str(),
            (now - active.started_at).num_milliseconds()
        );
        self.dispatch_next(now)
    }

    /// Drop everything queued and on screen; cooldown is kept.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.displaying = None;
    }

    fn dispatch_next(&mut self, now: DateTime<Utc>) -> Option<WarningEvent> {
        let index = self.highest_priority_index()?;
        let QueuedWarning { event, .. } = self.queue.remove(index);

        self.displaying = Some(ActiveWarning {
            event,
            started_at: now,
        });
        self.cooldown_until = Some(now + self.cooldown);
        log_info!(
            "dispatching warning {} ({} still queued)",
            event.as_str(),
            self.queue.len()
        );
        Some(event)
    }

    /// Highest priority, earliest enqueued among equals.
    fn highest_priority_index(&self) -> Option<usize> {
        let mut best: Option<(usize, QueuedWarning)> = None;
        for (index, queued) in self.queue.iter().enumerate() {
            let better = match best {
                None => true,
                Some((_, current)) => {
                    queued.event.priority() > current.event.priority()
                        || (queued.event.priority() == current.event.priority()
                            && queued.seq < current.seq)
                }
            };
            if better {
                best = Some((index, *queued));
            }
        }
        best.map(|(index, _)| index)
    }
}
