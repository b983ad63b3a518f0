//! Sleep schedule for the polling loops (endpoint wait, inbound reads).

use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// First sleep after an empty poll.
    pub interval: Duration,
    /// Ceiling for the doubling sleeps. Equal to `interval` means fixed-rate polling.
    pub max_backoff: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

/// Doubling backoff, reset whenever a poll finds something.
#[derive(Debug, Clone)]
pub struct Backoff {
    settings: PollSettings,
    current: Duration,
}

impl Backoff {
    pub fn new(settings: PollSettings) -> Self {
        Self {
            settings,
            current: settings.interval,
        }
    }

    /// Returns the sleep for this empty poll and advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let ceiling = self.settings.max_backoff.max(self.settings.interval);
        self.current = (self.current * 2).min(ceiling);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.settings.interval;
    }
}
