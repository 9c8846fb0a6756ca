use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};
use std::time::Duration;

use tokio::time::Instant;

/// Input activity seen since the previous capture.
///
/// Fed from a global input hook when one is installed. Without a hook the
/// counts stay at zero and [`ActivityCounters::idle_for`] reports nothing,
/// which callers treat as "present".
#[derive(Debug)]
pub struct ActivityCounters {
    key_presses: AtomicU64,
    mouse_clicks: AtomicU64,
    last_input: Mutex<Instant>,
    tracks_input: bool,
}

impl ActivityCounters {
    /// Counters with an input source attached.
    pub fn tracked() -> Self {
        Self::new(true)
    }

    /// Counters nobody feeds.
    pub fn untracked() -> Self {
        Self::new(false)
    }

    fn new(tracks_input: bool) -> Self {
        Self {
            key_presses: AtomicU64::new(0),
            mouse_clicks: AtomicU64::new(0),
            last_input: Mutex::new(Instant::now()),
            tracks_input,
        }
    }

    pub fn record_key_press(&self) {
        self.key_presses.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    pub fn record_mouse_click(&self) {
        self.mouse_clicks.fetch_add(1, Ordering::Relaxed);
        self.touch();
    }

    /// Returns `(mouse_clicks, key_presses)` and resets both to zero.
    pub fn take_counts(&self) -> (u64, u64) {
        (
            self.mouse_clicks.swap(0, Ordering::Relaxed),
            self.key_presses.swap(0, Ordering::Relaxed),
        )
    }

    /// Time since the last input, or `None` when input is not tracked.
    pub fn idle_for(&self, now: Instant) -> Option<Duration> {
        if !self.tracks_input {
            return None;
        }
        let last = match self.last_input.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        };
        Some(now.saturating_duration_since(last))
    }

    fn touch(&self) {
        let now = Instant::now();
        match self.last_input.lock() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }
}

/// Starts the global keyboard/mouse hook on its own thread.
#[cfg(feature = "input-hooks")]
pub fn spawn_input_hooks(counters: std::sync::Arc<ActivityCounters>) -> anyhow::Result<()> {
    use anyhow::Context;
    use rdev::{listen, Event, EventType};

    const ENABLE_LOGS: bool = true;
    use crate::{log_error, log_info};

    std::thread::Builder::new()
        .name("deskwatch-input".into())
        .spawn(move || {
            let callback = move |event: Event| match event.event_type {
                EventType::KeyPress(_) => counters.record_key_press(),
                EventType::ButtonPress(_) => counters.record_mouse_click(),
                _ => {}
            };

            log_info!("input hook thread started");
            // Blocks for the life of the process unless the hook fails.
            if let Err(err) = listen(callback) {
                log_error!("input hook failed: {err:?}");
            }
        })
        .context("failed to spawn input hook thread")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_counts_resets() {
        let counters = ActivityCounters::tracked();
        counters.record_mouse_click();
        counters.record_key_press();
        counters.record_key_press();

        assert_eq!(counters.take_counts(), (1, 2));
        assert_eq!(counters.take_counts(), (0, 0));
    }

    #[test]
    fn untracked_counters_report_no_idle_time() {
        let counters = ActivityCounters::untracked();
        assert_eq!(counters.idle_for(Instant::now()), None);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_time_restarts_on_input() {
        let counters = ActivityCounters::tracked();
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(counters.idle_for(Instant::now()), Some(Duration::from_secs(30)));

        counters.record_key_press();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(counters.idle_for(Instant::now()), Some(Duration::from_secs(2)));
    }
}
