//! Shared status-source connection state
//!
//! Written by the poller thread, read by the UI header and the CLI.

/// Health of the `/status` polling loop
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PollState {
    /// Tracking stopped, no poller running
    #[default]
    Idle,
    /// Poller started, no response yet
    Waiting,
    /// Last poll succeeded
    Online,
    /// Last poll failed; polling continues
    Degraded(String),
}

impl PollState {
    pub fn is_online(&self) -> bool {
        matches!(self, PollState::Online)
    }

    pub fn label(&self) -> &'static str {
        match self {
            PollState::Idle => "Stopped",
            PollState::Waiting => "Connecting...",
            PollState::Online => "Connected",
            PollState::Degraded(_) => "No data",
        }
    }
}
