//! Picks the capture sources this build can offer.
//!
//! `native-capture` pulls in xcap for real screenshots and window titles,
//! `input-hooks` pulls in rdev for click and key counts. Builds without them
//! still run the whole pipeline on a blank frame.

use std::sync::Arc;

use anyhow::Result;

use crate::settings::MonitorSettings;

use super::{
    activity::ActivityCounters,
    capture::{CaptureSources, ScreenSource, WindowProbe},
};

const ENABLE_LOGS: bool = true;

use crate::log_info;

pub fn default_sources(settings: &MonitorSettings) -> Result<CaptureSources> {
    let activity = input_counters()?;
    let (screen, windows) = screen_sources(settings);

    Ok(CaptureSources {
        screen,
        windows,
        activity,
    })
}

#[cfg(feature = "input-hooks")]
fn input_counters() -> Result<Arc<ActivityCounters>> {
    let counters = Arc::new(ActivityCounters::tracked());
    super::activity::spawn_input_hooks(Arc::clone(&counters))?;
    log_info!("global input hooks enabled");
    Ok(counters)
}

#[cfg(not(feature = "input-hooks"))]
fn input_counters() -> Result<Arc<ActivityCounters>> {
    log_info!("built without input hooks; click and key counts stay at zero");
    Ok(Arc::new(ActivityCounters::untracked()))
}

#[cfg(feature = "native-capture")]
fn screen_sources(_settings: &MonitorSettings) -> (Arc<dyn ScreenSource>, Arc<dyn WindowProbe>) {
    log_info!("capturing the primary monitor through xcap");
    (Arc::new(native::PrimaryMonitor), Arc::new(native::TopWindow))
}

#[cfg(not(feature = "native-capture"))]
fn screen_sources(settings: &MonitorSettings) -> (Arc<dyn ScreenSource>, Arc<dyn WindowProbe>) {
    use super::capture::{BlankScreen, NoWindowProbe};

    log_info!(
        "built without native capture; using a blank {}x{} frame",
        settings.blank_frame_width,
        settings.blank_frame_height
    );
    (
        Arc::new(BlankScreen::new(
            settings.blank_frame_width,
            settings.blank_frame_height,
        )),
        Arc::new(NoWindowProbe),
    )
}

#[cfg(feature = "native-capture")]
mod native {
    use anyhow::{anyhow, Context, Result};
    use image::RgbaImage;
    use xcap::{Monitor, Window};

    use crate::monitor::capture::{ScreenSource, WindowProbe};

    pub struct PrimaryMonitor;

    impl ScreenSource for PrimaryMonitor {
        fn capture(&self) -> Result<RgbaImage> {
            let monitors = Monitor::all().map_err(|e| anyhow!("failed to list monitors: {e}"))?;
            let monitor = monitors
                .iter()
                .find(|m| m.is_primary())
                .or_else(|| monitors.first())
                .context("no monitors found")?;

            let frame = monitor
                .capture_image()
                .map_err(|e| anyhow!("failed to capture {}: {e}", monitor.name()))?;
            let (width, height) = (frame.width(), frame.height());
            RgbaImage::from_raw(width, height, frame.into_raw())
                .context("captured frame has an unexpected buffer size")
        }
    }

    /// Front-most visible window with a title. xcap lists windows top-down.
    pub struct TopWindow;

    impl WindowProbe for TopWindow {
        fn active_window_title(&self) -> Result<Option<String>> {
            let windows = Window::all().map_err(|e| anyhow!("failed to list windows: {e}"))?;
            Ok(windows
                .iter()
                .filter(|w| !w.is_minimized())
                .map(|w| w.title().trim().to_string())
                .find(|title| !title.is_empty()))
        }
    }
}

#[cfg(all(test, not(feature = "native-capture")))]
mod tests {
    use super::*;

    #[test]
    fn headless_build_uses_configured_blank_frame() {
        let settings = MonitorSettings {
            blank_frame_width: 40,
            blank_frame_height: 30,
            ..MonitorSettings::default()
        };
        let sources = default_sources(&settings).unwrap();

        let frame = sources.screen.capture().unwrap();
        assert_eq!((frame.width(), frame.height()), (40, 30));
        assert_eq!(sources.windows.active_window_title().unwrap(), None);
    }
}
