//! Monotonic clock shared by the session, rate estimator and UI

use std::sync::OnceLock;
use std::time::Instant;

/// Seconds elapsed since the first call in this process
pub fn now_seconds() -> f64 {
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64()
}
