use chrono::{DateTime, Utc};

use crate::models::{PostureRecord, PostureType};

/// What `PostureHistory::add` did with a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordChange {
    Opened,
    Extended,
}

/// Ordered, merged posture records for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct PostureHistory {
    records: Vec<PostureRecord>,
    last_updated: Option<DateTime<Utc>>,
}

impl PostureHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the open record when the verdict repeats, otherwise open a new one.
    pub fn add(&mut self, posture: PostureType, now: DateTime<Utc>) -> RecordChange {
        let change = match self.records.last_mut() {
            Some(last) if last.posture_type == posture => {
                if now > last.end_time {
                    last.end_time = now;
                }
                RecordChange::Extended
            }
            _ => {
                self.records.push(PostureRecord::open(posture, now));
                RecordChange::Opened
            }
        };
        self.last_updated = Some(now);
        change
    }

    pub fn records(&self) -> &[PostureRecord] {
        &self.records
    }

    pub fn snapshot(&self) -> Vec<PostureRecord> {
        self.records.clone()
    }

    pub fn current(&self) -> Option<&PostureRecord> {
        self.records.last()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Index of the first pair of adjacent records sharing a posture type.
pub fn find_unmerged_pair(records: &[PostureRecord]) -> Option<usize> {
    records
        .windows(2)
        .position(|pair| pair[0].posture_type == pair[1].posture_type)
}
