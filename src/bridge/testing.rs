use std::sync::atomic::{AtomicUsize, Ordering};

use crate::models::{ActiveSeconds, ScreenshotRecord};

use super::{
    ActiveTimeListener, DeliveryChannels, ListenerId, MonitoringBridge, ScreenshotListener,
};

/// Bridge double that counts outward requests and lets a test push deliveries.
#[derive(Default)]
pub(crate) struct RecordingBridge {
    capture_requests: AtomicUsize,
    start_requests: AtomicUsize,
    stop_requests: AtomicUsize,
    channels: DeliveryChannels,
}

impl RecordingBridge {
    pub(crate) fn capture_requests(&self) -> usize {
        self.capture_requests.load(Ordering::SeqCst)
    }

    pub(crate) fn start_requests(&self) -> usize {
        self.start_requests.load(Ordering::SeqCst)
    }

    pub(crate) fn stop_requests(&self) -> usize {
        self.stop_requests.load(Ordering::SeqCst)
    }

    pub(crate) fn deliver_screenshot(&self, record: ScreenshotRecord) -> usize {
        self.channels.screenshots.dispatch(record)
    }

    pub(crate) fn deliver_active_time(&self, seconds: ActiveSeconds) -> usize {
        self.channels.active_time.dispatch(seconds)
    }

    pub(crate) fn screenshot_listeners(&self) -> Vec<ScreenshotListener> {
        self.channels.screenshots.snapshot()
    }

    pub(crate) fn active_time_listeners(&self) -> Vec<ActiveTimeListener> {
        self.channels.active_time.snapshot()
    }
}

impl MonitoringBridge for RecordingBridge {
    fn request_capture(&self) {
        self.capture_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn on_screenshot(&self, listener: ScreenshotListener) -> ListenerId {
        self.channels.screenshots.register(listener)
    }

    fn on_active_time(&self, listener: ActiveTimeListener) -> ListenerId {
        self.channels.active_time.register(listener)
    }

    fn remove_screenshot_listener(&self, id: ListenerId) {
        self.channels.screenshots.remove(id);
    }

    fn remove_active_time_listener(&self, id: ListenerId) {
        self.channels.active_time.remove(id);
    }

    fn start_monitoring(&self) {
        self.start_requests.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_monitoring(&self) {
        self.stop_requests.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn sample_record(capture_id: u64, title: &str) -> ScreenshotRecord {
    ScreenshotRecord {
        capture_id,
        time: format!("2026-10-19 10:00:{:02}", capture_id % 60),
        image_data: "data:image/png;base64,iVBORw0KGgo=".into(),
        active_window_title: title.into(),
        mouse_click_count: capture_id,
        keypress_count: capture_id * 2,
    }
}
