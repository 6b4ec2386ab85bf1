use anyhow::{bail, Context, Result};
use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::controller::MonitorController;

use super::loop_worker::{sensing_loop, LoopTimings};
use super::source::LandmarkSource;

/// Owns the background sensing task.
pub struct SensingController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl Default for SensingController {
    fn default() -> Self {
        Self::new()
    }
}

impl SensingController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn start_sensing(
        &mut self,
        source: Box<dyn LandmarkSource>,
        monitor: MonitorController,
        timings: LoopTimings,
    ) -> Result<()> {
        if self.handle.is_some() {
            bail!("sensing already active");
        }

        info!(
            "starting sensing loop every {}ms",
            timings.interval.as_millis()
        );
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sensing_loop(
            source,
            monitor,
            timings,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// The loop can end on its own when the source is exhausted.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Wait for the loop to end without cancelling it. Safe to drop
    /// mid-wait; the task stays owned here.
    pub async fn wait(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.as_mut() {
            let joined = handle.await.context("sensing loop task failed to join");
            self.handle = None;
            self.cancel_token = None;
            joined?;
        }
        Ok(())
    }

    pub async fn stop_sensing(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sensing loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}
