use std::sync::Arc;

use tokio::{
    sync::mpsc,
    time::{self, Instant, Interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    bridge::{BridgeRequest, DeliveryChannels},
    models::CaptureId,
};

use super::{
    active_time::ActiveTimeTracker,
    capture::{attach_counts, capture_record, CaptureSources},
    ServiceConfig,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Routes bridge requests and drives the active-time ticker.
pub(super) async fn request_loop(
    mut requests: mpsc::UnboundedReceiver<BridgeRequest>,
    captures: mpsc::UnboundedSender<CaptureId>,
    channels: Arc<DeliveryChannels>,
    sources: CaptureSources,
    config: ServiceConfig,
    cancel_token: CancellationToken,
) {
    let mut tracker = ActiveTimeTracker::new(config.active_time_tick, config.idle_threshold);
    let mut ticker: Option<Interval> = None;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("monitor request loop shutting down");
                break;
            }
            request = requests.recv() => {
                let Some(request) = request else {
                    log_info!("all bridges dropped, monitor request loop exiting");
                    break;
                };
                match request {
                    BridgeRequest::Capture(capture_id) => {
                        if captures.send(capture_id).is_err() {
                            log_warn!("capture worker is gone, dropping capture {}", capture_id);
                        }
                    }
                    BridgeRequest::StartMonitoring => match tracker.start() {
                        Some(session_id) => {
                            log_info!("monitoring session {} started", session_id);
                            let period = tracker.tick();
                            let mut interval = time::interval_at(Instant::now() + period, period);
                            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                            ticker = Some(interval);
                        }
                        None => log_info!("monitoring already running, ignoring start request"),
                    },
                    BridgeRequest::StopMonitoring => match tracker.stop() {
                        Some(session_id) => {
                            log_info!(
                                "monitoring session {} stopped at {}s active",
                                session_id,
                                tracker.total_seconds()
                            );
                            ticker = None;
                        }
                        None => log_debug!("monitoring not running, ignoring stop request"),
                    },
                }
            }
            _ = next_tick(&mut ticker) => {
                let idle_for = sources.activity.idle_for(Instant::now());
                let total = tracker.on_tick(idle_for);
                channels.active_time.dispatch(total);
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Performs captures one at a time, in request order.
pub(super) async fn capture_loop(
    mut captures: mpsc::UnboundedReceiver<CaptureId>,
    channels: Arc<DeliveryChannels>,
    sources: CaptureSources,
    config: ServiceConfig,
    cancel_token: CancellationToken,
) {
    loop {
        let capture_id = tokio::select! {
            _ = cancel_token.cancelled() => break,
            next = captures.recv() => match next {
                Some(capture_id) => capture_id,
                None => break,
            },
        };

        let job = tokio::task::spawn_blocking({
            let sources = sources.clone();
            let width = config.thumbnail_width;
            move || capture_record(&sources, capture_id, width)
        });

        let outcome = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            outcome = time::timeout(config.capture_timeout, job) => outcome,
        };

        match outcome {
            Ok(Ok(Ok(mut record))) => {
                attach_counts(&mut record, &sources.activity);
                let reached = channels.screenshots.dispatch(record);
                log_debug!("capture {} delivered to {} listener(s)", capture_id, reached);
            }
            Ok(Ok(Err(err))) => log_error!("capture {} failed: {err:#}", capture_id),
            Ok(Err(join_err)) => log_error!("capture {} worker panicked: {join_err}", capture_id),
            Err(_) => log_warn!(
                "capture {} timed out (> {}s)",
                capture_id,
                config.capture_timeout.as_secs()
            ),
        }
    }

    log_info!("capture loop shutting down");
}
