//! The monitoring backend behind [`LocalBridge`]: screen capture, window
//! titles, input counts and active-time accounting.

pub mod active_time;
pub mod activity;
pub mod capture;
pub mod platform;
mod worker;

pub use active_time::ActiveTimeTracker;
pub use activity::ActivityCounters;
pub use capture::{BlankScreen, CaptureSources, NoWindowProbe, ScreenSource, WindowProbe};

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::bridge::{DeliveryChannels, LocalBridge};

use worker::{capture_loop, request_loop};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    pub active_time_tick: Duration,
    pub idle_threshold: Duration,
    pub capture_timeout: Duration,
    pub thumbnail_width: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            active_time_tick: Duration::from_secs(1),
            idle_threshold: Duration::from_secs(60),
            capture_timeout: Duration::from_secs(10),
            thumbnail_width: 640,
        }
    }
}

/// Handle to the running backend tasks.
pub struct MonitorService {
    bridge: LocalBridge,
    cancel_token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl MonitorService {
    /// Spawns the request and capture loops. Needs a tokio runtime.
    pub fn spawn(sources: CaptureSources, config: ServiceConfig) -> Self {
        let channels = Arc::new(DeliveryChannels::default());
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (capture_tx, capture_rx) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();

        let requests = tokio::spawn(request_loop(
            request_rx,
            capture_tx,
            Arc::clone(&channels),
            sources.clone(),
            config,
            cancel_token.clone(),
        ));
        let captures = tokio::spawn(capture_loop(
            capture_rx,
            Arc::clone(&channels),
            sources,
            config,
            cancel_token.clone(),
        ));

        Self {
            bridge: LocalBridge::new(request_tx, channels),
            cancel_token,
            handles: vec![requests, captures],
        }
    }

    /// A bridge into this service. Clones share one capture id sequence.
    pub fn bridge(&self) -> LocalBridge {
        self.bridge.clone()
    }

    /// Stops both loops and waits for them to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel_token.cancel();
        for handle in self.handles.drain(..) {
            handle.await.context("monitor task failed to join")?;
        }
        Ok(())
    }
}

impl Drop for MonitorService {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
