use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

use crate::detection::{LandmarkClassifier, LandmarkSample};
use crate::history::{self, PostureHistory, RecordOutcome, SessionRecorder};
use crate::models::{DailySummary, PostureRecord, PostureType, WarningEvent};
use crate::monitor::{BreakReminder, SedentaryMonitor, SedentaryState};
use crate::settings::MonitorSettings;
use crate::warnings::{ActiveWarning, WarningArbiter};

/// What one processed tick produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub verdict: Option<PostureType>,
    pub outcome: RecordOutcome,
    /// Warning handed to the presentation layer on this tick.
    pub dispatched: Option<WarningEvent>,
}

/// Classifier → recorder → monitor → arbiter, owned in one place.
///
/// Not thread-safe by itself; `MonitorController` serializes access.
pub struct PostureEngine {
    classifier: LandmarkClassifier,
    recorder: SessionRecorder,
    reminder: BreakReminder,
    arbiter: WarningArbiter,
}

impl PostureEngine {
    pub fn new(settings: &MonitorSettings, started_at: DateTime<Utc>) -> Result<Self> {
        settings.validate()?;
        let reminder_times = settings
            .parsed_reminder_times()
            .context("failed to build break reminder schedule")?;

        Ok(Self {
            classifier: LandmarkClassifier::new(settings.classifier.clone()),
            recorder: SessionRecorder::new(
                PostureHistory::new(),
                SedentaryMonitor::new(settings.sedentary_threshold()),
                settings.detection_timeout(),
                started_at,
            ),
            reminder: BreakReminder::new(
                reminder_times,
                settings.reminder_weekdays.clone(),
                settings.break_poll_interval(),
            ),
            arbiter: WarningArbiter::new(settings.warning_cooldown()),
        })
    }

    /// Classify a sampled frame and feed the verdict through.
    pub fn process_sample(&mut self, sample: &LandmarkSample, now: DateTime<Utc>) -> TickReport {
        let verdict = self.classifier.classify(sample);
        self.record_verdict(verdict, now)
    }

    /// Feed an already-classified verdict (or its absence) through.
    pub fn record_verdict(&mut self, verdict: Option<PostureType>, now: DateTime<Utc>) -> TickReport {
        let outcome = self.recorder.record(verdict, now);
        for event in &outcome.events {
            self.arbiter.enqueue(*event);
        }
        let dispatched = self.arbiter.try_dispatch(now);
        TickReport {
            verdict,
            outcome,
            dispatched,
        }
    }

    /// Check the break schedule against local wall-clock time.
    pub fn poll_break_reminder<Tz: TimeZone>(&mut self, local: &DateTime<Tz>) -> Option<WarningEvent> {
        if let Some(event) = self.reminder.poll(local) {
            self.arbiter.enqueue(event);
        }
        self.arbiter.try_dispatch(local.with_timezone(&Utc))
    }

    /// Retry a dispatch cycle, e.g. once the cooldown has run out.
    pub fn dispatch(&mut self, now: DateTime<Utc>) -> Option<WarningEvent> {
        self.arbiter.try_dispatch(now)
    }

    pub fn finish_display(&mut self, now: DateTime<Utc>) -> Option<WarningEvent> {
        self.arbiter.finish_display(now)
    }

    pub fn reset_session(&mut self) -> bool {
        self.recorder.reset_session()
    }

    pub fn history(&self) -> &PostureHistory {
        self.recorder.history()
    }

    pub fn records(&self) -> Vec<PostureRecord> {
        self.recorder.history().snapshot()
    }

    pub fn session_state(&self) -> SedentaryState {
        self.recorder.session_state()
    }

    pub fn displaying(&self) -> Option<ActiveWarning> {
        self.arbiter.displaying()
    }

    pub fn pending_warnings(&self) -> Vec<WarningEvent> {
        self.arbiter.pending()
    }

    pub fn summary_for_day(&self, date: NaiveDate) -> BTreeMap<PostureType, f64> {
        self.summary_for_day_in(date, &Local)
    }

    pub fn summary_for_day_in<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> BTreeMap<PostureType, f64> {
        history::summary_for_day(self.history().records(), date, tz)
    }

    pub fn summary_for_last_n_days(&self, n: usize, today: NaiveDate) -> Vec<DailySummary> {
        self.summary_for_last_n_days_in(n, today, &Local)
    }

    pub fn summary_for_last_n_days_in<Tz: TimeZone>(
        &self,
        n: usize,
        today: NaiveDate,
        tz: &Tz,
    ) -> Vec<DailySummary> {
        history::summary_for_last_n_days(self.history().records(), n, today, tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::FaceObservation;
    use crate::history::store::find_unmerged_pair;
    use chrono::{Duration, FixedOffset};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        // Monday 2025-09-15, 09:00 UTC
        Utc.with_ymd_and_hms(2025, 9, 15, 9, 0, 0).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + Duration::seconds(secs)
    }

    fn engine() -> PostureEngine {
        PostureEngine::new(&MonitorSettings::default(), t0()).unwrap()
    }

    fn upright() -> LandmarkSample {
        LandmarkSample {
            face: Some(FaceObservation {
                roll_radians: Some(0.0),
                bounding_box_height: 0.3,
                bounding_box_center_x: 0.5,
            }),
            body: None,
        }
    }

    fn tilted() -> LandmarkSample {
        LandmarkSample {
            face: Some(FaceObservation {
                roll_radians: Some(12f64.to_radians()),
                bounding_box_height: 0.3,
                bounding_box_center_x: 0.5,
            }),
            body: None,
        }
    }

    #[test]
    fn bad_frame_dispatches_a_warning() {
        let mut engine = engine();
        let report = engine.process_sample(&tilted(), at(1));
        assert_eq!(report.verdict, Some(PostureType::FaceTilt));
        assert_eq!(
            report.dispatched,
            Some(WarningEvent::BadPosture(PostureType::FaceTilt))
        );
    }

    #[test]
    fn repeated_bad_frames_respect_display_and_cooldown() {
        let mut engine = engine();
        let mut dispatched = Vec::new();
        for s in 0..20 {
            if s == 3 || s == 11 {
                if let Some(event) = engine.finish_display(at(s)) {
                    dispatched.push((s, event));
                }
            }
            if let Some(event) = engine.process_sample(&tilted(), at(s)).dispatched {
                dispatched.push((s, event));
            }
        }
        let face = WarningEvent::BadPosture(PostureType::FaceTilt);
        // display ends at 3 and 11; each end hands over the pending event
        // at once, nothing starts from a plain tick while one is on screen
        assert_eq!(dispatched, vec![(0, face), (3, face), (11, face)]);
    }

    #[test]
    fn empty_ticks_are_recorded_as_absence() {
        let mut engine = engine();
        engine.process_sample(&upright(), at(0));
        let report = engine.process_sample(&LandmarkSample::empty(), at(10));
        assert_eq!(report.verdict, None);
        assert!(report.outcome.session_reset);
        assert_eq!(engine.session_state(), SedentaryState::Idle);
        assert_eq!(engine.records().len(), 1);
    }

    #[test]
    fn sedentary_jumps_ahead_of_queued_bad_posture() {
        let mut settings = MonitorSettings::default();
        settings.sedentary_threshold_secs = 5;
        let mut engine = PostureEngine::new(&settings, t0()).unwrap();

        engine.process_sample(&tilted(), at(0));
        assert!(engine.displaying().is_some());
        for s in 1..=7 {
            engine.process_sample(&upright(), at(s));
        }
        engine.process_sample(&tilted(), at(8));
        assert_eq!(
            engine.pending_warnings(),
            vec![
                WarningEvent::Sedentary,
                WarningEvent::BadPosture(PostureType::FaceTilt)
            ]
        );
        assert_eq!(engine.finish_display(at(9)), Some(WarningEvent::Sedentary));
    }

    #[test]
    fn break_reminder_dispatches_on_schedule() {
        let mut engine = engine();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        // 01:30 UTC Monday is 10:30 Monday in UTC+9
        let local = Utc
            .with_ymd_and_hms(2025, 9, 15, 1, 30, 5)
            .unwrap()
            .with_timezone(&tokyo);
        assert_eq!(engine.poll_break_reminder(&local), Some(WarningEvent::BreakTime));
    }

    #[test]
    fn records_stay_merged_and_summaries_add_up() {
        let mut engine = engine();
        for s in 0..30 {
            let sample = if (10..20).contains(&s) { tilted() } else { upright() };
            engine.process_sample(&sample, at(s));
        }
        let records = engine.records();
        assert_eq!(records.len(), 3);
        assert_eq!(find_unmerged_pair(&records), None);

        let day = t0().date_naive();
        let summary = engine.summary_for_day_in(day, &Utc);
        assert_eq!(summary.get(&PostureType::FaceTilt), Some(&9.0));

        let week = engine.summary_for_last_n_days_in(7, day, &Utc);
        assert_eq!(week.len(), 7);
        assert_eq!(week.last().map(|d| d.total_bad_secs), Some(9.0));
        assert!(week[..6].iter().all(|d| d.total_bad_secs == 0.0));
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut settings = MonitorSettings::default();
        settings.reminder_times = vec!["lunch".into()];
        assert!(PostureEngine::new(&settings, t0()).is_err());
    }
}
