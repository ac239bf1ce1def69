//! Tracking session: the single owner of trail, rate and latest status
//!
//! Poll results arrive from a background thread as `PollMessage`s and are
//! applied here in arrival order, on one thread. A message is only applied
//! if it belongs to the running session (epoch) and is newer than the last
//! applied one (sequence number).

use std::collections::VecDeque;
use tracing::{debug, info, warn};

use super::rate::RateEstimator;
use super::trail::TrailBuffer;
use super::types::{Detection, SensitivityConfig, StatusReport, StatusSnapshot};
use crate::error::FetchError;

/// Published rate values kept for the diagnostics plot (~1 min)
pub const RATE_HISTORY_LEN: usize = 60;

/// Result of one poll, tagged with the session and request it belongs to
#[derive(Debug)]
pub struct PollMessage {
    /// Session epoch the request was issued under
    pub epoch: u64,
    /// Issue order within the session, starting at 1
    pub seq: u64,
    pub result: Result<StatusReport, FetchError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Session stopped, or the message is from an earlier session
    Inactive,
    /// A newer response was already applied
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { sample_accepted: bool },
    Failed,
    Discarded(DiscardReason),
}

/// Per-session diagnostic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub polls_ok: u64,
    pub polls_failed: u64,
    pub stale_discarded: u64,
    pub malformed: u64,
    pub samples_accepted: u64,
    pub samples_rejected: u64,
}

pub struct TrackingSession {
    active: bool,
    epoch: u64,
    last_applied_seq: Option<u64>,
    trail: TrailBuffer,
    rate: RateEstimator,
    rate_history: VecDeque<u32>,
    snapshot: StatusSnapshot,
    sensitivity: Option<SensitivityConfig>,
    stats: SessionStats,
    last_error: Option<String>,
    /// Bumped whenever the rendered trail would change
    revision: u64,
}

impl Default for TrackingSession {
    fn default() -> Self {
        Self::new(TrailBuffer::new())
    }
}

impl TrackingSession {
    pub fn new(trail: TrailBuffer) -> Self {
        Self {
            active: false,
            epoch: 0,
            last_applied_seq: None,
            trail,
            rate: RateEstimator::new(),
            rate_history: VecDeque::with_capacity(RATE_HISTORY_LEN),
            snapshot: StatusSnapshot::default(),
            sensitivity: None,
            stats: SessionStats::default(),
            last_error: None,
            revision: 0,
        }
    }

    /// Activate tracking. Returns the epoch new poll requests must carry.
    ///
    /// Starting an already active session keeps the current epoch.
    pub fn start(&mut self, now: f64) -> u64 {
        if self.active {
            debug!(epoch = self.epoch, "Session already active");
            return self.epoch;
        }

        self.epoch += 1;
        self.active = true;
        self.last_applied_seq = None;
        self.stats = SessionStats::default();
        self.last_error = None;
        self.rate.start(now);
        self.revision += 1;

        info!(epoch = self.epoch, "Tracking started");
        self.epoch
    }

    /// Deactivate and tear down all per-session state in one step
    pub fn stop(&mut self) {
        let was_active = self.active;
        self.active = false;
        self.last_applied_seq = None;
        self.trail.reset();
        self.rate.reset();
        self.rate_history.clear();
        self.snapshot.detection = Detection::NotDetected;
        self.revision += 1;

        if was_active {
            info!(epoch = self.epoch, stats = ?self.stats, "Tracking stopped");
        }
    }

    /// Start/stop toggle. Returns the new active flag.
    pub fn toggle(&mut self, now: f64) -> bool {
        if self.active {
            self.stop();
        } else {
            self.start(now);
        }
        self.active
    }

    /// Apply one poll result at app-relative time `now`
    pub fn apply(&mut self, msg: PollMessage, now: f64) -> ApplyOutcome {
        if !self.active || msg.epoch != self.epoch {
            debug!(
                msg_epoch = msg.epoch,
                epoch = self.epoch,
                active = self.active,
                "Dropping poll result from inactive session"
            );
            return ApplyOutcome::Discarded(DiscardReason::Inactive);
        }

        let report = match msg.result {
            Ok(report) => report,
            Err(e) => {
                self.stats.polls_failed += 1;
                // Warn once per outage, the poller keeps retrying every tick
                if self.last_error.is_none() {
                    warn!(seq = msg.seq, error = %e, "Status poll failed");
                } else {
                    debug!(seq = msg.seq, error = %e, "Status poll failed");
                }
                self.last_error = Some(e.to_string());
                return ApplyOutcome::Failed;
            }
        };

        if let Some(last) = self.last_applied_seq {
            if msg.seq <= last {
                self.stats.stale_discarded += 1;
                debug!(seq = msg.seq, last_applied = last, "Stale status response discarded");
                return ApplyOutcome::Discarded(DiscardReason::Stale);
            }
        }
        self.last_applied_seq = Some(msg.seq);
        self.stats.polls_ok += 1;
        self.last_error = None;

        if let Some(rate) = self.rate.record(now) {
            if self.rate_history.len() >= RATE_HISTORY_LEN {
                self.rate_history.pop_front();
            }
            self.rate_history.push_back(rate);
            debug!(rate, "Observed sampling rate");
        }

        if !report.is_consistent() {
            self.stats.malformed += 1;
            warn!(
                seq = msg.seq,
                detected = report.last_detected,
                x = ?report.last_rel_x,
                y = ?report.last_rel_y,
                "Detected flag and coordinates disagree, treating as not detected"
            );
        }

        if let Some(sensitivity) = report.sensitivity() {
            self.sensitivity = Some(sensitivity);
        }

        let snapshot = report.to_snapshot();
        let sample_accepted = match snapshot.detection {
            Detection::Detected(pos) => {
                let accepted = self.trail.ingest(pos);
                if accepted {
                    self.stats.samples_accepted += 1;
                } else {
                    self.stats.samples_rejected += 1;
                }
                accepted
            }
            Detection::NotDetected => false,
        };

        if snapshot.target != self.snapshot.target {
            info!(from = %self.snapshot.target, to = %snapshot.target, "Target changed");
        }
        if sample_accepted || snapshot != self.snapshot {
            self.revision += 1;
        }
        self.snapshot = snapshot;

        ApplyOutcome::Applied { sample_accepted }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn trail(&self) -> &TrailBuffer {
        &self.trail
    }

    /// Samples/sec published by the last closed window, 0 while inactive
    pub fn observed_rate(&self) -> u32 {
        self.rate.rate()
    }

    pub fn rate_history(&self) -> &VecDeque<u32> {
        &self.rate_history
    }

    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    /// Last sensitivity echoed by the backend
    pub fn sensitivity(&self) -> Option<SensitivityConfig> {
        self.sensitivity
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Error text of the latest failed poll, cleared by the next success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Position;
    use crate::core::trail::MAX_TRAIL_LENGTH;

    fn detected(x: f64, y: f64) -> StatusReport {
        StatusReport {
            current_target_color: "red".into(),
            last_detected: true,
            last_rel_x: Some(x),
            last_rel_y: Some(y),
            min_area: None,
            min_circularity: None,
            min_solidity: None,
        }
    }

    fn not_detected() -> StatusReport {
        StatusReport {
            last_detected: false,
            last_rel_x: None,
            last_rel_y: None,
            ..detected(0.0, 0.0)
        }
    }

    fn msg(epoch: u64, seq: u64, report: StatusReport) -> PollMessage {
        PollMessage { epoch, seq, result: Ok(report) }
    }

    #[test]
    fn test_scenario_jitter_then_move() {
        let mut session = TrackingSession::default();
        let epoch = session.start(0.0);
        session.apply(msg(epoch, 1, detected(0.10, 0.10)), 0.05);
        let outcome = session.apply(msg(epoch, 2, detected(0.101, 0.101)), 0.10);
        assert_eq!(outcome, ApplyOutcome::Applied { sample_accepted: false });
        session.apply(msg(epoch, 3, detected(0.50, 0.50)), 0.15);

        assert_eq!(
            session.trail().to_vec(),
            vec![Position::new(0.10, 0.10), Position::new(0.50, 0.50)]
        );
        let stats = session.stats();
        assert_eq!(stats.polls_ok, 3);
        assert_eq!(stats.samples_accepted, 2);
        assert_eq!(stats.samples_rejected, 1);
    }

    #[test]
    fn test_not_detected_updates_snapshot_only() {
        let mut session = TrackingSession::default();
        let epoch = session.start(0.0);
        session.apply(msg(epoch, 1, detected(0.2, 0.2)), 0.05);
        let rev = session.revision();
        let outcome = session.apply(msg(epoch, 2, not_detected()), 0.10);
        assert_eq!(outcome, ApplyOutcome::Applied { sample_accepted: false });
        assert_eq!(session.trail().len(), 1);
        assert!(!session.snapshot().detection.is_detected());
        // Detection flipped, so the snapshot changed
        assert!(session.revision() > rev);

        let rev = session.revision();
        session.apply(msg(epoch, 3, not_detected()), 0.15);
        assert_eq!(session.revision(), rev);
    }

    #[test]
    fn test_stop_resets_everything() {
        let mut session = TrackingSession::default();
        let epoch = session.start(0.0);
        for i in 1..=40u64 {
            session.apply(msg(epoch, i, detected(i as f64 * 0.02, 0.5)), i as f64 * 0.05);
        }
        assert!(session.observed_rate() > 0);
        assert!(!session.trail().is_empty());

        session.stop();
        assert!(!session.is_active());
        assert!(session.trail().is_empty());
        assert_eq!(session.observed_rate(), 0);
        assert!(session.rate_history().is_empty());
        assert!(!session.snapshot().detection.is_detected());
        assert_eq!(session.snapshot().target, "red");
    }

    #[test]
    fn test_results_after_stop_are_ignored() {
        let mut session = TrackingSession::default();
        let epoch = session.start(0.0);
        session.stop();
        let outcome = session.apply(msg(epoch, 1, detected(0.3, 0.3)), 0.1);
        assert_eq!(outcome, ApplyOutcome::Discarded(DiscardReason::Inactive));
        assert!(session.trail().is_empty());
    }

    #[test]
    fn test_results_from_previous_epoch_are_ignored() {
        let mut session = TrackingSession::default();
        let old = session.start(0.0);
        session.stop();
        let new = session.start(1.0);
        assert_ne!(old, new);

        let outcome = session.apply(msg(old, 7, detected(0.3, 0.3)), 1.1);
        assert_eq!(outcome, ApplyOutcome::Discarded(DiscardReason::Inactive));
        // Sequence numbering restarts with the new epoch
        let outcome = session.apply(msg(new, 1, detected(0.3, 0.3)), 1.1);
        assert_eq!(outcome, ApplyOutcome::Applied { sample_accepted: true });
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut session = TrackingSession::default();
        let epoch = session.start(0.0);
        session.apply(msg(epoch, 2, detected(0.6, 0.6)), 0.1);
        let outcome = session.apply(msg(epoch, 1, detected(0.1, 0.1)), 0.11);
        assert_eq!(outcome, ApplyOutcome::Discarded(DiscardReason::Stale));
        assert_eq!(session.trail().to_vec(), vec![Position::new(0.6, 0.6)]);
        assert_eq!(session.snapshot().detection.position(), Some(Position::new(0.6, 0.6)));
        assert_eq!(session.stats().stale_discarded, 1);
    }

    #[test]
    fn test_failures_counted_and_do_not_stop() {
        let mut session = TrackingSession::default();
        let epoch = session.start(0.0);
        let failed = PollMessage {
            epoch,
            seq: 1,
            result: Err(FetchError::Status(reqwest::StatusCode::BAD_GATEWAY)),
        };
        assert_eq!(session.apply(failed, 0.05), ApplyOutcome::Failed);
        assert!(session.is_active());
        assert!(session.last_error().is_some());
        assert_eq!(session.stats().polls_failed, 1);

        session.apply(msg(epoch, 2, detected(0.4, 0.4)), 0.1);
        assert_eq!(session.last_error(), None);
        assert_eq!(session.trail().len(), 1);
    }

    #[test]
    fn test_failures_do_not_tick_rate() {
        let mut session = TrackingSession::default();
        let epoch = session.start(0.0);
        for seq in 1..=30u64 {
            let failed = PollMessage {
                epoch,
                seq,
                result: Err(FetchError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
            };
            session.apply(failed, seq as f64 * 0.05);
        }
        assert_eq!(session.observed_rate(), 0);
    }

    #[test]
    fn test_malformed_report_counted_not_ingested() {
        let mut session = TrackingSession::default();
        let epoch = session.start(0.0);
        let mut report = detected(0.5, 0.5);
        report.last_rel_y = None;
        let outcome = session.apply(msg(epoch, 1, report), 0.05);
        assert_eq!(outcome, ApplyOutcome::Applied { sample_accepted: false });
        assert_eq!(session.stats().malformed, 1);
        assert!(session.trail().is_empty());
    }

    #[test]
    fn test_observed_rate_published() {
        let mut session = TrackingSession::default();
        let epoch = session.start(0.0);
        for seq in 1..=20u64 {
            session.apply(msg(epoch, seq, not_detected()), seq as f64 * 0.05);
        }
        assert_eq!(session.observed_rate(), 20);
        assert_eq!(session.rate_history().iter().copied().collect::<Vec<_>>(), vec![20]);
    }

    #[test]
    fn test_capacity_through_session() {
        let mut session = TrackingSession::default();
        let epoch = session.start(0.0);
        for seq in 1..=151u64 {
            let x = (seq - 1) as f64 / 150.0;
            session.apply(msg(epoch, seq, detected(x, 0.5)), seq as f64 * 0.05);
        }
        let trail = session.trail().to_vec();
        assert_eq!(trail.len(), MAX_TRAIL_LENGTH);
        assert!((trail[0].x - 1.0 / 150.0).abs() < 1e-12);
        assert_eq!(trail[149].x, 1.0);
    }

    #[test]
    fn test_sensitivity_and_target_tracked() {
        let mut session = TrackingSession::default();
        let epoch = session.start(0.0);
        let mut report = not_detected();
        report.current_target_color = "blue".into();
        report.min_area = Some(2000);
        report.min_circularity = Some(0.6);
        report.min_solidity = Some(0.8);
        session.apply(msg(epoch, 1, report), 0.05);
        assert_eq!(session.snapshot().target, "blue");
        assert_eq!(session.sensitivity().map(|s| s.min_area), Some(2000));
    }

    #[test]
    fn test_toggle_and_double_start() {
        let mut session = TrackingSession::default();
        assert!(session.toggle(0.0));
        let epoch = session.epoch();
        assert_eq!(session.start(0.5), epoch);
        assert!(!session.toggle(1.0));
        assert!(session.toggle(2.0));
        assert_eq!(session.epoch(), epoch + 1);
    }

    #[test]
    fn test_revision_changes_on_visible_updates() {
        let mut session = TrackingSession::default();
        let r0 = session.revision();
        let epoch = session.start(0.0);
        let r1 = session.revision();
        assert!(r1 > r0);
        session.apply(msg(epoch, 1, detected(0.2, 0.2)), 0.05);
        let r2 = session.revision();
        assert!(r2 > r1);
        // Same report again: nothing visible changed
        session.apply(msg(epoch, 2, detected(0.2, 0.2)), 0.1);
        assert_eq!(session.revision(), r2);
        // Jitter is not ingested, but the reported position still moved
        session.apply(msg(epoch, 3, detected(0.2001, 0.2)), 0.15);
        assert_eq!(session.trail().len(), 1);
        let r3 = session.revision();
        assert!(r3 > r2);
        let retarget = StatusReport {
            current_target_color: "blue".into(),
            ..detected(0.2001, 0.2)
        };
        session.apply(msg(epoch, 4, retarget), 0.2);
        assert!(session.revision() > r3);
        let r4 = session.revision();
        session.stop();
        assert!(session.revision() > r4);
        assert!(session.revision() > r2);
    }
}
