use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::models::{ActiveSeconds, ScreenshotRecord};

/// How many delivered screenshots the dashboard holds on to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    Unbounded,
    /// Oldest records are evicted first.
    KeepLatest(NonZeroUsize),
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        // 20 minutes at the default 5s cadence.
        RetentionPolicy::KeepLatest(NonZeroUsize::MIN.saturating_add(239))
    }
}

/// Everything the dashboard displays.
///
/// Once unmounted, every mutator turns into a no-op so deliveries that race
/// with teardown cannot touch a discarded view.
#[derive(Debug)]
pub struct DashboardState {
    records: VecDeque<ScreenshotRecord>,
    active_seconds: ActiveSeconds,
    retention: RetentionPolicy,
    mounted: bool,
    /// Bumped on every accepted mutation.
    revision: u64,
}

impl DashboardState {
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            records: VecDeque::new(),
            active_seconds: 0,
            retention,
            mounted: true,
            revision: 0,
        }
    }

    /// Appends in arrival order. Returns `false` if the view is gone.
    pub fn push_record(&mut self, record: ScreenshotRecord) -> bool {
        if !self.mounted {
            return false;
        }

        self.records.push_back(record);
        if let RetentionPolicy::KeepLatest(limit) = self.retention {
            while self.records.len() > limit.get() {
                self.records.pop_front();
            }
        }
        self.revision += 1;
        true
    }

    /// Last write wins. Returns `false` if the view is gone.
    pub fn set_active_seconds(&mut self, seconds: ActiveSeconds) -> bool {
        if !self.mounted {
            return false;
        }

        self.active_seconds = seconds;
        self.revision += 1;
        true
    }

    pub fn unmount(&mut self) {
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn records(&self) -> &VecDeque<ScreenshotRecord> {
        &self.records
    }

    pub fn active_seconds(&self) -> ActiveSeconds {
        self.active_seconds
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
