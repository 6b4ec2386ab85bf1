use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

const ENABLE_LOGS: bool = true;

/// Upper bound for every duration setting: one week.
const MAX_SETTING_SECS: u64 = 7 * 24 * 60 * 60;

fn secs(value: u64) -> Duration {
    Duration::seconds(value.min(MAX_SETTING_SECS) as i64)
}

fn millis(value: u64) -> Duration {
    Duration::milliseconds(value.min(MAX_SETTING_SECS * 1_000) as i64)
}

use crate::log_warn;

/// Thresholds used by the landmark classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassifierSettings {
    pub face_roll_threshold_deg: f64,
    /// Face bounding-box height (fraction of frame) above which the user is too close.
    pub forward_lean_height: f64,
    /// Allowed horizontal offset of the face centre from the frame centre.
    pub side_lean_offset: f64,
    pub shoulder_tilt_threshold_deg: f64,
    pub shoulder_window: usize,
    pub min_joint_confidence: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            face_roll_threshold_deg: 6.0,
            forward_lean_height: 0.45,
            side_lean_offset: 0.15,
            shoulder_tilt_threshold_deg: 5.0,
            shoulder_window: 10,
            min_joint_confidence: 0.3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSettings {
    pub processing_interval_ms: u64,
    pub detection_timeout_ms: u64,
    /// Longest a single landmark capture may block before the tick is
    /// counted as a detection failure.
    pub capture_timeout_ms: u64,
    pub sedentary_threshold_secs: u64,
    pub warning_display_ms: u64,
    pub warning_cooldown_ms: u64,
    pub break_poll_interval_secs: u64,
    /// Local wall-clock reminder times, `"HH:MM"`.
    pub reminder_times: Vec<String>,
    pub reminder_weekdays: Vec<Weekday>,
    pub classifier: ClassifierSettings,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            processing_interval_ms: 1_000,
            detection_timeout_ms: 3_000,
            capture_timeout_ms: 5_000,
            sedentary_threshold_secs: 3_600,
            warning_display_ms: 3_000,
            warning_cooldown_ms: 8_000,
            break_poll_interval_secs: 60,
            reminder_times: vec!["10:30".into(), "15:00".into()],
            reminder_weekdays: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            classifier: ClassifierSettings::default(),
        }
    }
}

impl MonitorSettings {
    pub fn processing_interval(&self) -> Duration {
        millis(self.processing_interval_ms)
    }

    pub fn detection_timeout(&self) -> Duration {
        millis(self.detection_timeout_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        millis(self.capture_timeout_ms)
    }

    pub fn sedentary_threshold(&self) -> Duration {
        secs(self.sedentary_threshold_secs)
    }

    pub fn warning_display(&self) -> Duration {
        millis(self.warning_display_ms)
    }

    pub fn warning_cooldown(&self) -> Duration {
        millis(self.warning_cooldown_ms)
    }

    pub fn break_poll_interval(&self) -> Duration {
        secs(self.break_poll_interval_secs)
    }

    /// Parsed reminder times, truncated to the minute.
    pub fn parsed_reminder_times(&self) -> Result<Vec<NaiveTime>> {
        self.reminder_times
            .iter()
            .map(|raw| {
                NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                    .with_context(|| format!("invalid reminder time {raw:?}, expected HH:MM"))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.processing_interval_ms == 0 {
            bail!("processingIntervalMs must be greater than zero");
        }
        if self.capture_timeout_ms == 0 {
            bail!("captureTimeoutMs must be greater than zero");
        }
        if self.break_poll_interval_secs == 0 {
            bail!("breakPollIntervalSecs must be greater than zero");
        }
        for (name, value) in [
            ("processingIntervalMs", self.processing_interval_ms),
            ("detectionTimeoutMs", self.detection_timeout_ms),
            ("captureTimeoutMs", self.capture_timeout_ms),
            ("warningDisplayMs", self.warning_display_ms),
            ("warningCooldownMs", self.warning_cooldown_ms),
        ] {
            if value > MAX_SETTING_SECS * 1_000 {
                bail!("{name} must be at most {}ms", MAX_SETTING_SECS * 1_000);
            }
        }
        for (name, value) in [
            ("sedentaryThresholdSecs", self.sedentary_threshold_secs),
            ("breakPollIntervalSecs", self.break_poll_interval_secs),
        ] {
            if value > MAX_SETTING_SECS {
                bail!("{name} must be at most {MAX_SETTING_SECS}s");
            }
        }
        if self.classifier.shoulder_window == 0 {
            bail!("classifier.shoulderWindow must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.classifier.min_joint_confidence) {
            bail!("classifier.minJointConfidence must be within [0, 1]");
        }
        self.parsed_reminder_times()?;
        Ok(())
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<MonitorSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<MonitorSettings>(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    log_warn!(
                        "Ignoring unreadable settings at {}: {err}; using defaults",
                        path.display()
                    );
                    MonitorSettings::default()
                }
            }
        } else {
            MonitorSettings::default()
        };

        data.validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> MonitorSettings {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, settings: MonitorSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &MonitorSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.current(), MonitorSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"warningCooldownMs": 5000, "classifier": {"faceRollThresholdDeg": 8.5}}"#,
        )
        .unwrap();

        let settings = SettingsStore::new(path).unwrap().current();
        assert_eq!(settings.warning_cooldown_ms, 5_000);
        assert_eq!(settings.classifier.face_roll_threshold_deg, 8.5);
        assert_eq!(settings.classifier.shoulder_window, 10);
        assert_eq!(settings.detection_timeout_ms, 3_000);
    }

    #[test]
    fn update_persists_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.current();
        settings.reminder_times = vec!["09:15".into()];
        settings.reminder_weekdays = vec![Weekday::Sat];
        store.update(settings.clone()).unwrap();

        let reloaded = SettingsStore::new(path).unwrap();
        assert_eq!(reloaded.current(), settings);
    }

    #[test]
    fn rejects_bad_reminder_time() {
        let mut settings = MonitorSettings::default();
        settings.reminder_times = vec!["25:99".into()];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_durations_past_one_week() {
        let mut settings = MonitorSettings::default();
        settings.sedentary_threshold_secs = u64::MAX;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("sedentaryThresholdSecs"));

        let mut settings = MonitorSettings::default();
        settings.warning_cooldown_ms = MAX_SETTING_SECS * 1_000 + 1;
        assert!(settings.validate().is_err());

        settings.warning_cooldown_ms = MAX_SETTING_SECS * 1_000;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn huge_values_never_turn_negative() {
        let mut settings = MonitorSettings::default();
        settings.sedentary_threshold_secs = u64::MAX;
        settings.break_poll_interval_secs = u64::MAX;
        settings.processing_interval_ms = u64::MAX;
        assert_eq!(settings.sedentary_threshold(), Duration::seconds(MAX_SETTING_SECS as i64));
        assert_eq!(settings.break_poll_interval(), Duration::weeks(1));
        assert!(settings.processing_interval() > Duration::zero());
    }

    #[test]
    fn rejects_zero_window() {
        let mut settings = MonitorSettings::default();
        settings.classifier.shoulder_window = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn reminder_times_parse() {
        let times = MonitorSettings::default().parsed_reminder_times().unwrap();
        assert_eq!(
            times,
            vec![
                NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
                NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            ]
        );
    }
}
