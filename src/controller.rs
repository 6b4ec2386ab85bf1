use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDate, Utc};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};

use crate::clock::Clock;
use crate::detection::LandmarkSample;
use crate::engine::{PostureEngine, TickReport};
use crate::history::{self, RecordOutcome};
use crate::metrics::{MetricEvent, MetricsCollector, MetricsSnapshot};
use crate::models::{DailySummary, PostureRecord, PostureType, WarningEvent};
use crate::monitor::SedentaryState;
use crate::sensing::FrameThrottle;
use crate::settings::MonitorSettings;
use crate::warnings::WarningNotice;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Live view for real-time displays.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    pub records: Vec<PostureRecord>,
    pub current: Option<PostureType>,
    pub last_updated: Option<DateTime<Utc>>,
    pub session: SedentaryState,
    pub displaying: Option<WarningEvent>,
    pub pending: Vec<WarningEvent>,
}

/// Cloneable handle that serializes every engine mutation behind one lock.
///
/// Dispatched warnings go out as `WarningNotice`s on the channel returned
/// from `new`; the receiver must call `acknowledge_display` once a notice
/// has been shown for its display duration.
#[derive(Clone)]
pub struct MonitorController {
    engine: Arc<Mutex<PostureEngine>>,
    throttle: Arc<Mutex<FrameThrottle>>,
    clock: Arc<dyn Clock>,
    notices: mpsc::UnboundedSender<WarningNotice>,
    metrics: MetricsCollector,
    rng: Arc<Mutex<StdRng>>,
}

impl MonitorController {
    pub fn new(
        settings: &MonitorSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, mpsc::UnboundedReceiver<WarningNotice>)> {
        let engine = PostureEngine::new(settings, clock.now())?;
        let (tx, rx) = mpsc::unbounded_channel();

        let controller = Self {
            engine: Arc::new(Mutex::new(engine)),
            throttle: Arc::new(Mutex::new(FrameThrottle::new(settings.processing_interval()))),
            clock,
            notices: tx,
            metrics: MetricsCollector::new(),
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
        };
        Ok((controller, rx))
    }

    /// Entry point for push-style capture: frames arriving faster than the
    /// processing interval are dropped before classification.
    pub async fn submit_frame(&self, sample: LandmarkSample) -> Option<TickReport> {
        let now = self.clock.now();
        if !self.throttle.lock().await.admit(now) {
            self.metrics.record(MetricEvent::FrameDropped).await;
            return None;
        }
        Some(self.process_tick(sample).await)
    }

    /// Process one already-throttled tick.
    pub async fn process_tick(&self, sample: LandmarkSample) -> TickReport {
        let report = {
            let mut engine = self.engine.lock().await;
            let now = self.clock.now();
            let report = engine.process_sample(&sample, now);
            self.poll_breaks_locked(&mut engine).await;
            report
        };

        self.metrics.record(MetricEvent::TickProcessed).await;
        self.record_outcome_metrics(report.verdict, &report.outcome).await;
        if let Some(event) = report.dispatched {
            self.emit(event).await;
        }
        report
    }

    /// A capture or detection error on this tick; counts as nothing detected.
    pub async fn record_detection_failure(&self) -> TickReport {
        self.metrics.record(MetricEvent::DetectionFailure).await;
        self.process_tick(LandmarkSample::empty()).await
    }

    /// The presentation layer is done showing the current warning.
    pub async fn acknowledge_display(&self) -> Option<WarningEvent> {
        let next = {
            let mut engine = self.engine.lock().await;
            engine.finish_display(self.clock.now())
        };
        if let Some(event) = next {
            self.emit(event).await;
        }
        next
    }

    pub async fn reset_session(&self) -> bool {
        let cleared = self.engine.lock().await.reset_session();
        if cleared {
            log_info!("session reset on request");
            self.metrics.record(MetricEvent::SessionReset).await;
        }
        cleared
    }

    pub async fn records(&self) -> Vec<PostureRecord> {
        self.engine.lock().await.records()
    }

    pub async fn snapshot(&self) -> MonitorSnapshot {
        let engine = self.engine.lock().await;
        MonitorSnapshot {
            records: engine.records(),
            current: engine.history().current().map(|r| r.posture_type),
            last_updated: engine.history().last_updated(),
            session: engine.session_state(),
            displaying: engine.displaying().map(|active| active.event),
            pending: engine.pending_warnings(),
        }
    }

    pub async fn summary_for_day(&self, date: NaiveDate) -> BTreeMap<PostureType, f64> {
        self.engine.lock().await.summary_for_day(date)
    }

    pub async fn ranked_summary_for_day(&self, date: NaiveDate) -> Vec<(PostureType, f64)> {
        let engine = self.engine.lock().await;
        history::ranked_summary_for_day(engine.history().records(), date, &Local)
    }

    /// Last `n` local days ending today, by the injected clock.
    pub async fn summary_for_last_n_days(&self, n: usize) -> Vec<DailySummary> {
        let today = self.today();
        self.engine.lock().await.summary_for_last_n_days(n, today)
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&Local).date_naive()
    }

    pub async fn metrics(&self) -> MetricsSnapshot {
        self.metrics.get_snapshot().await
    }

    /// Check the break schedule outside the frame path, so reminders still
    /// fire while the camera is stalled.
    pub async fn poll_breaks(&self) -> Option<WarningEvent> {
        let mut engine = self.engine.lock().await;
        self.poll_breaks_locked(&mut engine).await
    }

    async fn poll_breaks_locked(&self, engine: &mut PostureEngine) -> Option<WarningEvent> {
        let local = self.clock.now().with_timezone(&Local);
        let dispatched = engine.poll_break_reminder(&local);
        if let Some(event) = dispatched {
            self.emit(event).await;
        }
        dispatched
    }

    async fn record_outcome_metrics(&self, verdict: Option<PostureType>, outcome: &RecordOutcome) {
        if verdict.is_none() {
            self.metrics.record(MetricEvent::Undetected).await;
        }
        if outcome.session_reset {
            self.metrics.record(MetricEvent::SessionReset).await;
        }
    }

    async fn emit(&self, event: WarningEvent) {
        let now = self.clock.now();
        let notice = {
            let mut rng = self.rng.lock().await;
            WarningNotice::for_event(event, now, &mut *rng)
        };
        self.metrics.record(MetricEvent::WarningDispatched).await;
        log_debug!("warning notice: {}", notice.message);
        if self.notices.send(notice).is_err() {
            log_warn!("no presenter listening, warning {} dropped", event.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::detection::FaceObservation;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn t0() -> DateTime<Utc> {
        // Saturday, so no break reminders interfere
        Utc.with_ymd_and_hms(2025, 9, 20, 12, 0, 0).unwrap()
    }

    fn face(roll_deg: f64) -> LandmarkSample {
        LandmarkSample {
            face: Some(FaceObservation {
                roll_radians: Some(roll_deg.to_radians()),
                bounding_box_height: 0.3,
                bounding_box_center_x: 0.5,
            }),
            body: None,
        }
    }

    fn setup() -> (
        MonitorController,
        mpsc::UnboundedReceiver<WarningNotice>,
        Arc<ManualClock>,
    ) {
        let mut settings = MonitorSettings::default();
        settings.reminder_weekdays.clear();
        let clock = Arc::new(ManualClock::new(t0()));
        let (controller, rx) = MonitorController::new(&settings, clock.clone()).unwrap();
        (controller, rx, clock)
    }

    #[tokio::test]
    async fn frames_faster_than_interval_are_dropped() {
        let (controller, _rx, clock) = setup();
        assert!(controller.submit_frame(face(0.0)).await.is_some());
        clock.advance(Duration::milliseconds(400));
        assert!(controller.submit_frame(face(0.0)).await.is_none());
        clock.advance(Duration::milliseconds(600));
        assert!(controller.submit_frame(face(0.0)).await.is_some());

        let metrics = controller.metrics().await;
        assert_eq!(metrics.frames_dropped, 1);
        assert_eq!(metrics.ticks_processed, 2);
    }

    #[tokio::test]
    async fn bad_posture_reaches_the_presenter_and_ack_hands_over() {
        let (controller, mut rx, clock) = setup();
        controller.process_tick(face(15.0)).await;
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.event, WarningEvent::BadPosture(PostureType::FaceTilt));

        clock.advance(Duration::seconds(1));
        controller.process_tick(face(15.0)).await;
        assert!(rx.try_recv().is_err());

        clock.advance(Duration::seconds(2));
        assert_eq!(
            controller.acknowledge_display().await,
            Some(WarningEvent::BadPosture(PostureType::FaceTilt))
        );
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn detection_failures_count_as_absence() {
        let (controller, _rx, clock) = setup();
        controller.process_tick(face(0.0)).await;
        for _ in 0..5 {
            clock.advance(Duration::seconds(1));
            controller.record_detection_failure().await;
        }
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.session, SedentaryState::Idle);
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.current, Some(PostureType::Good));
        assert_eq!(snapshot.last_updated, Some(t0()));

        let metrics = controller.metrics().await;
        assert_eq!(metrics.detection_failures, 5);
        assert_eq!(metrics.undetected_ticks, 5);
        assert_eq!(metrics.session_resets, 1);
    }

    #[tokio::test]
    async fn reports_use_the_injected_clock() {
        let (controller, _rx, clock) = setup();
        for _ in 0..=10 {
            controller.process_tick(face(20.0)).await;
            clock.advance(Duration::seconds(1));
        }
        let week = controller.summary_for_last_n_days(7).await;
        assert_eq!(week.len(), 7);
        assert_eq!(week.last().unwrap().date, controller.today());
        assert_eq!(week.iter().map(|d| d.total_bad_secs).sum::<f64>(), 10.0);
    }

    #[tokio::test]
    async fn break_poll_fires_on_local_schedule_once() {
        let monday_break = Local
            .with_ymd_and_hms(2025, 9, 15, 10, 30, 5)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        let clock = Arc::new(ManualClock::new(monday_break));
        let (controller, mut rx) =
            MonitorController::new(&MonitorSettings::default(), clock.clone()).unwrap();

        assert_eq!(controller.poll_breaks().await, Some(WarningEvent::BreakTime));
        let notice = rx.try_recv().unwrap();
        assert!(notice.stretch.is_some());

        clock.advance(Duration::seconds(20));
        assert_eq!(controller.poll_breaks().await, None);
    }

    #[tokio::test]
    async fn reset_twice_is_a_noop_the_second_time() {
        let (controller, _rx, _clock) = setup();
        controller.process_tick(face(0.0)).await;
        assert!(controller.reset_session().await);
        assert!(!controller.reset_session().await);
        assert_eq!(controller.snapshot().await.session, SedentaryState::Idle);
    }
}
