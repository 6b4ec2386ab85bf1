pub mod clock;
pub mod controller;
pub mod detection;
pub mod engine;
pub mod history;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod sensing;
pub mod settings;
pub mod stretches;
mod utils;
pub mod warnings;

use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{info, warn};

use clock::SystemClock;
use controller::MonitorController;
use history::format_minutes;
use sensing::{JsonLinesSource, LandmarkSource, LoopTimings, SensingController};
use settings::{MonitorSettings, SettingsStore};

pub use controller::MonitorSnapshot;
pub use engine::{PostureEngine, TickReport};
pub use models::{DailySummary, PostureRecord, PostureType, WarningEvent};

const SETTINGS_ENV: &str = "POSTUREWATCH_SETTINGS";
const REPLAY_ENV: &str = "POSTUREWATCH_REPLAY";
const DEBUG_ENV: &str = "POSTUREWATCH_DEBUG";
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_millis(500);

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    let level = if std::env::var(DEBUG_ENV).is_ok_and(|v| v == "1") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    info!("PostureWatch starting up...");

    let settings = load_settings()?;
    let source = open_source()?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let result = runtime.block_on(monitor(settings, source));
    // a capture stuck in a blocking read (e.g. idle stdin) must not keep
    // the process alive
    runtime.shutdown_timeout(SHUTDOWN_GRACE);
    result
}

fn load_settings() -> Result<MonitorSettings> {
    match std::env::var_os(SETTINGS_ENV) {
        Some(path) => {
            let store = SettingsStore::new(PathBuf::from(path))?;
            Ok(store.current())
        }
        None => Ok(MonitorSettings::default()),
    }
}

/// Landmarks come from a replay file when one is given, otherwise from
/// stdin, one JSON sample per line.
fn open_source() -> Result<Box<dyn LandmarkSource>> {
    let replay = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(REPLAY_ENV))
        .map(PathBuf::from);

    match replay {
        Some(path) => {
            info!("replaying landmarks from {}", path.display());
            Ok(Box::new(JsonLinesSource::open(&path)?))
        }
        None => {
            info!("reading landmarks from stdin");
            Ok(Box::new(JsonLinesSource::new(BufReader::new(std::io::stdin()))))
        }
    }
}

async fn monitor(settings: MonitorSettings, source: Box<dyn LandmarkSource>) -> Result<()> {
    let (controller, mut notices) = MonitorController::new(&settings, Arc::new(SystemClock))?;

    // Stand-in presentation layer: show each notice for the display duration,
    // then hand the slot back.
    let presenter = {
        let controller = controller.clone();
        let display = settings
            .warning_display()
            .to_std()
            .context("warning display duration out of range")?;
        tokio::spawn(async move {
            while let Some(notice) = notices.recv().await {
                warn!("[{}] {}", notice.character, notice.message);
                tokio::time::sleep(display).await;
                controller.acknowledge_display().await;
            }
        })
    };

    let mut sensing = SensingController::new();
    sensing.start_sensing(
        source,
        controller.clone(),
        LoopTimings::from_settings(&settings)?,
    )?;

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for ctrl-c")?;
            info!("interrupt received, stopping");
        }
        finished = sensing.wait() => finished?,
    }
    sensing.stop_sensing().await?;
    presenter.abort();

    log_summary(&controller).await;
    Ok(())
}

async fn log_summary(controller: &MonitorController) {
    let today = controller.today();
    let ranked = controller.ranked_summary_for_day(today).await;
    if ranked.is_empty() {
        info!("no bad posture recorded today");
    }
    for (posture, secs) in ranked {
        info!("{}: {}", posture.label(), format_minutes(secs));
    }

    let metrics = controller.metrics().await;
    info!(
        "processed {} ticks ({} undetected, {} failures), {} warnings, {} session resets",
        metrics.ticks_processed,
        metrics.undetected_ticks,
        metrics.detection_failures,
        metrics.warnings_dispatched,
        metrics.session_resets
    );
}
