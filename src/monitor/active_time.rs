use std::time::Duration;

use uuid::Uuid;

use crate::models::ActiveSeconds;

/// Active-time accounting for one monitor service.
///
/// The total survives stop/start; each start opens a new session id.
#[derive(Debug)]
pub struct ActiveTimeTracker {
    tick: Duration,
    idle_threshold: Duration,
    total: Duration,
    session_id: Option<Uuid>,
}

impl ActiveTimeTracker {
    pub fn new(tick: Duration, idle_threshold: Duration) -> Self {
        Self {
            tick: tick.max(Duration::from_millis(1)),
            idle_threshold,
            total: Duration::ZERO,
            session_id: None,
        }
    }

    /// Opens a session. `None` if one is already running.
    pub fn start(&mut self) -> Option<Uuid> {
        if self.session_id.is_some() {
            return None;
        }
        let id = Uuid::new_v4();
        self.session_id = Some(id);
        Some(id)
    }

    /// Closes the running session, if any, and returns its id.
    pub fn stop(&mut self) -> Option<Uuid> {
        self.session_id.take()
    }

    pub fn is_running(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Credits one tick unless the user has been idle past the threshold.
    /// `idle_for == None` means input is not observable and counts as active.
    pub fn on_tick(&mut self, idle_for: Option<Duration>) -> ActiveSeconds {
        let active = idle_for.map_or(true, |idle| idle < self.idle_threshold);
        if active && self.is_running() {
            self.total += self.tick;
        }
        self.total_seconds()
    }

    pub fn total_seconds(&self) -> ActiveSeconds {
        self.total.as_secs()
    }
}
