//! Bounded, de-jittered position history
//!
//! Oldest entries are evicted first; near-duplicate samples never enter.

use std::collections::VecDeque;
use tracing::trace;

use super::types::Position;

/// Keep the last 150 positions (~7.5 s at 20 Hz)
pub const MAX_TRAIL_LENGTH: usize = 150;

/// Per-axis delta below which a sample counts as detector noise
pub const JITTER_THRESHOLD: f64 = 0.005;

/// Sliding window of accepted positions, oldest first
#[derive(Debug, Clone)]
pub struct TrailBuffer {
    points: VecDeque<Position>,
    capacity: usize,
    jitter_threshold: f64,
}

impl Default for TrailBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TrailBuffer {
    pub fn new() -> Self {
        Self::with_limits(MAX_TRAIL_LENGTH, JITTER_THRESHOLD)
    }

    /// Capacity is at least one point
    pub fn with_limits(capacity: usize, jitter_threshold: f64) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
            jitter_threshold,
        }
    }

    /// Offer a new sample. Returns `true` if it was appended.
    pub fn ingest(&mut self, pos: Position) -> bool {
        if let Some(last) = self.points.back() {
            let dx = (pos.x - last.x).abs();
            let dy = (pos.y - last.y).abs();
            if dx < self.jitter_threshold && dy < self.jitter_threshold {
                trace!(x = pos.x, y = pos.y, dx, dy, "Sample rejected as jitter");
                return false;
            }
        }

        self.points.push_back(pos);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }

        trace!(x = pos.x, y = pos.y, len = self.points.len(), "Sample accepted");
        true
    }

    pub fn reset(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent accepted position
    pub fn last(&self) -> Option<Position> {
        self.points.back().copied()
    }

    /// Oldest to newest
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Position> + '_ {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<Position> {
        self.points.iter().copied().collect()
    }
}
