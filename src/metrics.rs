use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Counters for the sensing pipeline since start-up or the last reset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub ticks_processed: u64,
    pub frames_dropped: u64,
    pub undetected_ticks: u64,
    pub detection_failures: u64,
    pub session_resets: u64,
    pub warnings_dispatched: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricEvent {
    TickProcessed,
    FrameDropped,
    Undetected,
    DetectionFailure,
    SessionReset,
    WarningDispatched,
}

#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsSnapshot>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, event: MetricEvent) {
        let mut state = self.inner.lock().await;
        let counter = match event {
            MetricEvent::TickProcessed => &mut state.ticks_processed,
            MetricEvent::FrameDropped => &mut state.frames_dropped,
            MetricEvent::Undetected => &mut state.undetected_ticks,
            MetricEvent::DetectionFailure => &mut state.detection_failures,
            MetricEvent::SessionReset => &mut state.session_resets,
            MetricEvent::WarningDispatched => &mut state.warnings_dispatched,
        };
        *counter = counter.saturating_add(1);
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().await.clone()
    }

    pub async fn reset(&self) {
        *self.inner.lock().await = MetricsSnapshot::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_and_resets() {
        let metrics = MetricsCollector::new();
        metrics.record(MetricEvent::TickProcessed).await;
        metrics.record(MetricEvent::TickProcessed).await;
        metrics.record(MetricEvent::FrameDropped).await;

        let clone = metrics.clone();
        clone.record(MetricEvent::WarningDispatched).await;

        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.ticks_processed, 2);
        assert_eq!(snapshot.frames_dropped, 1);
        assert_eq!(snapshot.warnings_dispatched, 1);

        metrics.reset().await;
        assert_eq!(metrics.get_snapshot().await, MetricsSnapshot::default());
    }
}
