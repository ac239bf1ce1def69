//! Platform-agnostic core - shared between the dashboard and the CLI

pub mod frame;
pub mod rate;
pub mod session;
pub mod trail;
pub mod types;

pub use frame::{
    fade_alpha, render, FrameContent, Surface, TrailFrame, TrailSegment, DEFAULT_SURFACE_SIZE,
    WAITING_TEXT,
};
pub use rate::RateEstimator;
pub use session::{ApplyOutcome, DiscardReason, PollMessage, SessionStats, TrackingSession};
pub use trail::{TrailBuffer, JITTER_THRESHOLD, MAX_TRAIL_LENGTH};
pub use types::{Detection, Position, SensitivityConfig, StatusReport, StatusSnapshot};
