//! Trailscope - live position-trail dashboard for a blob-tracking backend
//!
//! Polls the backend's `/status` endpoint, keeps a bounded, jitter-filtered
//! history of detected positions and renders it as a fading trail next to
//! the current sampling rate.
//!
//! The `core` module is UI-free and shared by the dashboard and `trail-cli`.

pub mod config;
pub mod control;
pub mod core;
pub mod error;
pub mod poll_state;
pub mod poller;
pub mod time;

#[cfg(feature = "gui")]
pub mod app;
#[cfg(feature = "gui")]
pub mod theme;

pub use config::DashboardConfig;
pub use poll_state::PollState;
pub use poller::StatusPoller;
