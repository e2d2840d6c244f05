use std::time::{Duration, Instant};

/// Suppresses a repeat read of the same tag within the cooldown window.
///
/// Only accepted scans are recorded; a rejected scan never arms the guard.
#[derive(Debug, Clone)]
pub struct DedupeGuard {
    cooldown: Duration,
    last: Option<(String, Instant)>,
}

impl DedupeGuard {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown, last: None }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn last_accepted(&self) -> Option<(&str, Instant)> {
        self.last.as_ref().map(|(code, at)| (code.as_str(), *at))
    }

    /// True when `barcode` repeats the last accepted code inside the window.
    ///
    /// An instant earlier than the recorded one counts as zero elapsed time.
    pub fn is_duplicate(&self, barcode: &str, at: Instant) -> bool {
        match &self.last {
            Some((last_code, last_at)) if last_code == barcode => {
                at.saturating_duration_since(*last_at) < self.cooldown
            }
            _ => false,
        }
    }

    pub fn record(&mut self, barcode: &str, at: Instant) {
        self.last = Some((barcode.to_string(), at));
    }
}
