use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    bridge::{ListenerId, MonitoringBridge},
    models::ScreenshotRecord,
};

use super::{
    render::{build_frame, DashboardFrame},
    state::{DashboardState, RetentionPolicy},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardConfig {
    pub capture_interval: Duration,
    pub retention: RetentionPolicy,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            capture_interval: Duration::from_millis(5_000),
            retention: RetentionPolicy::default(),
        }
    }
}

/// A mounted dashboard: the capture timer plus both delivery listeners.
///
/// Prefer [`DashboardView::unmount`]; dropping a mounted view cancels the
/// timer without waiting for it.
pub struct DashboardView {
    bridge: Arc<dyn MonitoringBridge>,
    config: DashboardConfig,
    state: Arc<Mutex<DashboardState>>,
    revisions: Arc<watch::Sender<u64>>,
    screenshot_listener: Option<ListenerId>,
    active_time_listener: Option<ListenerId>,
    ticker: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl DashboardView {
    /// Registers both listeners and starts the capture timer. Needs a tokio runtime.
    pub fn mount(bridge: Arc<dyn MonitoringBridge>, config: DashboardConfig) -> Self {
        let state = Arc::new(Mutex::new(DashboardState::new(config.retention)));
        let (revisions, _) = watch::channel(0);
        let revisions = Arc::new(revisions);

        let screenshot_listener = {
            let state = Arc::clone(&state);
            let revisions = Arc::clone(&revisions);
            bridge.on_screenshot(Arc::new(move |record: ScreenshotRecord| {
                let mut guard = lock_state(&state);
                let capture_id = record.capture_id;
                if guard.push_record(record) {
                    revisions.send_replace(guard.revision());
                } else {
                    log_debug!("ignoring screenshot {} delivered after unmount", capture_id);
                }
            }))
        };

        let active_time_listener = {
            let state = Arc::clone(&state);
            let revisions = Arc::clone(&revisions);
            bridge.on_active_time(Arc::new(move |seconds| {
                let mut guard = lock_state(&state);
                if guard.set_active_seconds(seconds) {
                    revisions.send_replace(guard.revision());
                }
            }))
        };

        let cancel_token = CancellationToken::new();
        // tokio intervals reject a zero period.
        let period = config.capture_interval.max(Duration::from_millis(1));
        let ticker = tokio::spawn(capture_loop(
            Arc::clone(&bridge),
            Instant::now() + period,
            period,
            cancel_token.clone(),
        ));

        log_info!(
            "dashboard mounted, capturing every {}ms",
            config.capture_interval.as_millis()
        );

        Self {
            bridge,
            config,
            state,
            revisions,
            screenshot_listener: Some(screenshot_listener),
            active_time_listener: Some(active_time_listener),
            ticker: Some(ticker),
            cancel_token,
        }
    }

    /// Tears the view down. Once this returns no capture request is issued
    /// and late deliveries leave the state untouched.
    pub async fn unmount(mut self) {
        lock_state(&self.state).unmount();
        self.cancel_token.cancel();

        if let Some(handle) = self.ticker.take() {
            if let Err(err) = handle.await {
                log_error!("capture timer task failed: {err}");
            }
        }

        self.release_listeners();
        log_info!("dashboard unmounted");
    }

    /// The "Start Monitoring" control. One outward request per call.
    pub fn start_monitoring(&self) {
        self.bridge.start_monitoring();
    }

    pub fn stop_monitoring(&self) {
        self.bridge.stop_monitoring();
    }

    pub fn render(&self) -> DashboardFrame {
        build_frame(&lock_state(&self.state), self.config.capture_interval)
    }

    pub fn records(&self) -> Vec<ScreenshotRecord> {
        lock_state(&self.state).records().iter().cloned().collect()
    }

    pub fn active_seconds(&self) -> u64 {
        lock_state(&self.state).active_seconds()
    }

    /// Revision counter; changes whenever a delivery altered the state.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revisions.subscribe()
    }

    fn release_listeners(&mut self) {
        if let Some(id) = self.screenshot_listener.take() {
            self.bridge.remove_screenshot_listener(id);
        }
        if let Some(id) = self.active_time_listener.take() {
            self.bridge.remove_active_time_listener(id);
        }
    }
}

impl Drop for DashboardView {
    fn drop(&mut self) {
        lock_state(&self.state).unmount();
        self.cancel_token.cancel();
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        self.release_listeners();
    }
}

async fn capture_loop(
    bridge: Arc<dyn MonitoringBridge>,
    first_tick: Instant,
    period: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => bridge.request_capture(),
        }
    }
}

fn lock_state(state: &Mutex<DashboardState>) -> MutexGuard<'_, DashboardState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::testing::{sample_record, RecordingBridge};
    use std::num::NonZeroUsize;

    fn unbounded() -> DashboardConfig {
        DashboardConfig {
            retention: RetentionPolicy::Unbounded,
            ..DashboardConfig::default()
        }
    }

    fn titles(view: &DashboardView) -> Vec<String> {
        view.records()
            .into_iter()
            .map(|r| r.active_window_title)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn twelve_seconds_yield_two_capture_requests() {
        let bridge = Arc::new(RecordingBridge::default());
        let view = DashboardView::mount(bridge.clone(), DashboardConfig::default());

        time::sleep(Duration::from_secs(12)).await;
        assert_eq!(bridge.capture_requests(), 2);

        view.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_requested_before_the_first_period() {
        let bridge = Arc::new(RecordingBridge::default());
        let view = DashboardView::mount(bridge.clone(), DashboardConfig::default());

        time::sleep(Duration::from_millis(4_999)).await;
        assert_eq!(bridge.capture_requests(), 0);

        view.unmount().await;
    }

    #[tokio::test]
    async fn records_keep_arrival_order() {
        let bridge = Arc::new(RecordingBridge::default());
        let view = DashboardView::mount(bridge.clone(), unbounded());

        bridge.deliver_screenshot(sample_record(1, "A"));
        bridge.deliver_screenshot(sample_record(2, "B"));

        assert_eq!(titles(&view), vec!["A", "B"]);
        view.unmount().await;
    }

    #[tokio::test]
    async fn every_delivered_record_is_shown() {
        let bridge = Arc::new(RecordingBridge::default());
        let view = DashboardView::mount(bridge.clone(), unbounded());

        for id in 0..37 {
            bridge.deliver_screenshot(sample_record(id, "A"));
        }

        let records = view.records();
        assert_eq!(records.len(), 37);
        assert!(records.windows(2).all(|w| w[0].capture_id < w[1].capture_id));
        assert_eq!(view.render().cells.len(), 37);
        view.unmount().await;
    }

    #[tokio::test]
    async fn active_time_is_last_write_wins() {
        let bridge = Arc::new(RecordingBridge::default());
        let view = DashboardView::mount(bridge.clone(), DashboardConfig::default());

        bridge.deliver_active_time(10);
        bridge.deliver_active_time(42);

        assert_eq!(view.active_seconds(), 42);
        assert_eq!(view.render().active_time, "00:42");
        view.unmount().await;
    }

    #[tokio::test]
    async fn retention_caps_the_gallery() {
        let bridge = Arc::new(RecordingBridge::default());
        let config = DashboardConfig {
            retention: RetentionPolicy::KeepLatest(NonZeroUsize::new(2).unwrap()),
            ..DashboardConfig::default()
        };
        let view = DashboardView::mount(bridge.clone(), config);

        bridge.deliver_screenshot(sample_record(1, "A"));
        bridge.deliver_screenshot(sample_record(2, "B"));
        bridge.deliver_screenshot(sample_record(3, "C"));

        assert_eq!(titles(&view), vec!["B", "C"]);
        view.unmount().await;
    }

    #[tokio::test]
    async fn start_monitoring_sends_one_request_per_click() {
        let bridge = Arc::new(RecordingBridge::default());
        let view = DashboardView::mount(bridge.clone(), DashboardConfig::default());

        view.start_monitoring();
        assert_eq!(bridge.start_requests(), 1);
        bridge.deliver_active_time(5);
        view.start_monitoring();
        view.start_monitoring();
        assert_eq!(bridge.start_requests(), 3);
        assert_eq!(bridge.capture_requests(), 0);

        view.stop_monitoring();
        assert_eq!(bridge.stop_requests(), 1);
        view.unmount().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unmount_stops_requests_and_ignores_late_deliveries() {
        let bridge = Arc::new(RecordingBridge::default());
        let view = DashboardView::mount(bridge.clone(), unbounded());
        let state = Arc::clone(&view.state);
        let mut revisions = view.subscribe();

        time::sleep(Duration::from_secs(11)).await;
        assert_eq!(bridge.capture_requests(), 2);
        bridge.deliver_screenshot(sample_record(1, "A"));
        bridge.deliver_active_time(7);
        let _ = revisions.borrow_and_update();

        // Held past unmount to simulate a delivery already in flight.
        let late_screenshot = bridge.screenshot_listeners().remove(0);
        let late_active_time = bridge.active_time_listeners().remove(0);

        view.unmount().await;
        assert!(bridge.screenshot_listeners().is_empty());
        assert!(bridge.active_time_listeners().is_empty());

        late_screenshot(sample_record(2, "B"));
        late_active_time(99);
        assert_eq!(bridge.deliver_screenshot(sample_record(3, "C")), 0);

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(bridge.capture_requests(), 2);

        let guard = state.lock().unwrap();
        assert_eq!(guard.records().len(), 1);
        assert_eq!(guard.active_seconds(), 7);
        assert!(!revisions.has_changed().unwrap_or(false));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_view_deregisters_and_stops_the_timer() {
        let bridge = Arc::new(RecordingBridge::default());
        let view = DashboardView::mount(bridge.clone(), DashboardConfig::default());
        drop(view);

        assert!(bridge.screenshot_listeners().is_empty());
        assert!(bridge.active_time_listeners().is_empty());

        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(bridge.capture_requests(), 0);
    }

    #[tokio::test]
    async fn subscribers_see_revisions() {
        let bridge = Arc::new(RecordingBridge::default());
        let view = DashboardView::mount(bridge.clone(), DashboardConfig::default());
        let mut revisions = view.subscribe();

        bridge.deliver_screenshot(sample_record(1, "A"));
        assert!(revisions.has_changed().unwrap());
        assert_eq!(*revisions.borrow_and_update(), 1);

        bridge.deliver_active_time(3);
        assert_eq!(*revisions.borrow_and_update(), 2);
        view.unmount().await;
    }
}
