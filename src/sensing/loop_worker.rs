use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::controller::MonitorController;
use crate::detection::LandmarkSample;
use crate::settings::MonitorSettings;

use super::source::LandmarkSource;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

type Pull = JoinHandle<(Box<dyn LandmarkSource>, Result<Option<LandmarkSample>>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopTimings {
    pub interval: Duration,
    pub break_poll_interval: Duration,
    /// A pull still running after this long counts as a failed tick.
    pub capture_timeout: Duration,
}

impl LoopTimings {
    pub fn from_settings(settings: &MonitorSettings) -> Result<Self> {
        Ok(Self {
            interval: settings
                .processing_interval()
                .to_std()
                .context("processing interval out of range")?,
            break_poll_interval: settings
                .break_poll_interval()
                .to_std()
                .context("break poll interval out of range")?,
            capture_timeout: settings
                .capture_timeout()
                .to_std()
                .context("capture timeout out of range")?,
        })
    }
}

fn spawn_pull(mut source: Box<dyn LandmarkSource>) -> Pull {
    tokio::task::spawn_blocking(move || {
        let result = source.next_sample();
        (source, result)
    })
}

/// Pull one sample per processing interval until cancelled or the source
/// runs dry. The break schedule is polled on its own ticker as well.
///
/// The source is blocking (camera capture, model inference, file reads) so
/// each pull runs on the blocking pool. A failed or timed-out pull is
/// recorded as a detection failure and the loop keeps going; a pull that
/// times out is awaited again on the next tick instead of starting another.
/// Cancellation is observed even while a pull is in flight.
pub async fn sensing_loop(
    source: Box<dyn LandmarkSource>,
    monitor: MonitorController,
    timings: LoopTimings,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(timings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut break_ticker = tokio::time::interval(timings.break_poll_interval);
    break_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut idle_source = Some(source);
    let mut in_flight: Option<Pull> = None;
    let mut failing = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut pull = match (in_flight.take(), idle_source.take()) {
                    (Some(pull), _) => pull,
                    (None, Some(source)) => spawn_pull(source),
                    (None, None) => {
                        log_error!("landmark source lost, sensing loop exiting");
                        break;
                    }
                };

                let joined = tokio::select! {
                    joined = tokio::time::timeout(timings.capture_timeout, &mut pull) => joined,
                    _ = cancel_token.cancelled() => {
                        log_info!("sensing loop shutting down with a capture in flight");
                        break;
                    }
                };

                let result = match joined {
                    Ok(Ok((source, result))) => {
                        idle_source = Some(source);
                        result
                    }
                    Ok(Err(err)) => {
                        log_error!("landmark source worker died: {err}");
                        break;
                    }
                    Err(_) => {
                        if failing {
                            log_debug!("landmark capture still stuck");
                        } else {
                            log_warn!(
                                "landmark capture timeout (> {}ms)",
                                timings.capture_timeout.as_millis()
                            );
                            failing = true;
                        }
                        in_flight = Some(pull);
                        monitor.record_detection_failure().await;
                        continue;
                    }
                };

                match result {
                    Ok(Some(sample)) => {
                        if failing {
                            log_info!("landmark detection recovered");
                            failing = false;
                        }
                        let report = monitor.process_tick(sample).await;
                        log_debug!("tick verdict: {:?}", report.verdict.map(|p| p.as_str()));
                    }
                    Ok(None) => {
                        log_info!("landmark source exhausted, sensing loop exiting");
                        break;
                    }
                    Err(err) => {
                        if failing {
                            log_debug!("landmark detection still failing: {err:#}");
                        } else {
                            log_error!("landmark detection failed: {err:#}");
                            failing = true;
                        }
                        monitor.record_detection_failure().await;
                    }
                }
            }
            _ = break_ticker.tick() => {
                if let Some(event) = monitor.poll_breaks().await {
                    log_debug!("break poll dispatched {}", event.as_str());
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("sensing loop shutting down");
                break;
            }
        }
    }
}
