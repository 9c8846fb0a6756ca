use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, num::NonZeroUsize, path::PathBuf, time::Duration};

use crate::{dashboard::DashboardConfig, dashboard::RetentionPolicy, monitor::ServiceConfig};

const SETTINGS_ENV: &str = "DESKWATCH_SETTINGS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitorSettings {
    pub capture_interval_ms: u64,
    /// Screenshots kept by the dashboard; 0 keeps everything.
    pub retention: usize,
    pub active_time_tick_ms: u64,
    pub idle_threshold_secs: u64,
    pub capture_timeout_secs: u64,
    pub thumbnail_width: u32,
    pub blank_frame_width: u32,
    pub blank_frame_height: u32,
    pub render_interval_ms: u64,
    pub auto_start: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            capture_interval_ms: 5_000,
            retention: 240,
            active_time_tick_ms: 1_000,
            idle_threshold_secs: 60,
            capture_timeout_secs: 10,
            thumbnail_width: 640,
            blank_frame_width: 1280,
            blank_frame_height: 720,
            render_interval_ms: 1_000,
            auto_start: false,
        }
    }
}

impl MonitorSettings {
    fn validate(&self) -> Result<()> {
        if self.capture_interval_ms == 0 {
            bail!("captureIntervalMs must be greater than zero");
        }
        if self.active_time_tick_ms == 0 {
            bail!("activeTimeTickMs must be greater than zero");
        }
        if self.render_interval_ms == 0 {
            bail!("renderIntervalMs must be greater than zero");
        }
        if self.capture_timeout_secs == 0 {
            bail!("captureTimeoutSecs must be greater than zero");
        }
        if self.thumbnail_width == 0 || self.blank_frame_width == 0 || self.blank_frame_height == 0 {
            bail!("image dimensions must be greater than zero");
        }
        Ok(())
    }

    pub fn dashboard_config(&self) -> DashboardConfig {
        DashboardConfig {
            capture_interval: Duration::from_millis(self.capture_interval_ms),
            retention: NonZeroUsize::new(self.retention)
                .map(RetentionPolicy::KeepLatest)
                .unwrap_or(RetentionPolicy::Unbounded),
        }
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            active_time_tick: Duration::from_millis(self.active_time_tick_ms),
            idle_threshold: Duration::from_secs(self.idle_threshold_secs),
            capture_timeout: Duration::from_secs(self.capture_timeout_secs),
            thumbnail_width: self.thumbnail_width,
        }
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms)
    }
}

#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    data: MonitorSettings,
}

impl SettingsStore {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid settings file {}", path.display()))?
        } else {
            MonitorSettings::default()
        };

        data.validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        Ok(Self { path, data })
    }

    /// `$DESKWATCH_SETTINGS`, else `settings.json` in the platform config dir.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(SETTINGS_ENV) {
            return Ok(PathBuf::from(path));
        }

        let dirs = ProjectDirs::from("dev", "deskwatch", "Deskwatch")
            .context("Could not determine the config directory")?;
        Ok(dirs.config_dir().join("settings.json"))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn monitor(&self) -> &MonitorSettings {
        &self.data
    }
}
