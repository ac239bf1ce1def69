//! Observed sampling rate over one-second windows
//!
//! Counts delivered samples, not attempted polls. Time is passed in by the
//! caller (app-relative seconds) so the estimator runs on any clock.

/// Length of one measurement window in seconds
pub const RATE_WINDOW_SECS: f64 = 1.0;

#[derive(Debug, Clone, Default)]
pub struct RateEstimator {
    /// Successful polls in the current window
    ticks: u32,
    /// Start of the current window, None until started
    window_start: Option<f64>,
    /// Last published samples/sec
    rate: u32,
}

impl RateEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh window at `now`
    pub fn start(&mut self, now: f64) {
        self.ticks = 0;
        self.window_start = Some(now);
        self.rate = 0;
    }

    /// Count one delivered sample. Returns the newly published rate when a
    /// window closes.
    pub fn record(&mut self, now: f64) -> Option<u32> {
        let start = *self.window_start.get_or_insert(now);
        self.ticks += 1;

        let elapsed = now - start;
        if elapsed < RATE_WINDOW_SECS {
            return None;
        }

        self.rate = (self.ticks as f64 / elapsed).round() as u32;
        self.ticks = 0;
        self.window_start = Some(now);
        Some(self.rate)
    }

    /// Back to the inactive state: rate 0, no window
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Last published rate (0 until the first window closes)
    pub fn rate(&self) -> u32 {
        self.rate
    }

    pub fn pending_ticks(&self) -> u32 {
        self.ticks
    }
}
