use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use crate::models::{ActiveSeconds, CaptureId, ScreenshotRecord};

use super::{ActiveTimeListener, ListenerId, ListenerRegistry, MonitoringBridge, ScreenshotListener};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// Commands carried from a [`LocalBridge`] to the monitor worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeRequest {
    Capture(CaptureId),
    StartMonitoring,
    StopMonitoring,
}

/// The two inward channels, shared by the bridge (registration) and the
/// monitor worker (dispatch).
#[derive(Default)]
pub struct DeliveryChannels {
    pub screenshots: ListenerRegistry<ScreenshotRecord>,
    pub active_time: ListenerRegistry<ActiveSeconds>,
}

/// In-process bridge to a [`crate::monitor::MonitorService`].
#[derive(Clone)]
pub struct LocalBridge {
    requests: mpsc::UnboundedSender<BridgeRequest>,
    channels: Arc<DeliveryChannels>,
    next_capture: Arc<AtomicU64>,
}

impl LocalBridge {
    pub(crate) fn new(
        requests: mpsc::UnboundedSender<BridgeRequest>,
        channels: Arc<DeliveryChannels>,
    ) -> Self {
        Self {
            requests,
            channels,
            next_capture: Arc::new(AtomicU64::new(1)),
        }
    }

    fn send(&self, request: BridgeRequest) {
        if let Err(err) = self.requests.send(request) {
            log_warn!("monitor service is gone, dropping {:?}", err.0);
        }
    }
}

impl MonitoringBridge for LocalBridge {
    fn request_capture(&self) {
        let capture_id = self.next_capture.fetch_add(1, Ordering::Relaxed);
        self.send(BridgeRequest::Capture(capture_id));
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
        self.send(BridgeRequest::StartMonitoring);
    }

    fn stop_monitoring(&self) {
        self.send(BridgeRequest::StopMonitoring);
    }
}
