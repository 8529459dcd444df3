//! Attention state tracking over time

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{AttentionConfig, AttentionEvent, AttentionLabel, DebouncedState, TrackerSnapshot};

/// Frame counts for a tracking session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatistics {
    pub total_frames: u64,
    pub frames_looking: u64,
    pub frames_not_looking: u64,
}

impl SessionStatistics {
    /// Share of frames spent looking (1.0 before any frame)
    pub fn attention_ratio(&self) -> f64 {
        if self.total_frames == 0 {
            return 1.0;
        }
        self.frames_looking as f64 / self.total_frames as f64
    }

    fn record(&mut self, state: AttentionLabel) {
        self.total_frames += 1;
        match state {
            AttentionLabel::Looking => self.frames_looking += 1,
            AttentionLabel::NotLooking => self.frames_not_looking += 1,
        }
    }
}

/// Attention state (tracked over time)
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerState {
    /// Debounced attention state
    pub current_state: AttentionLabel,

    /// Continuous time not looking (seconds)
    pub accumulated_not_looking_seconds: f64,

    /// Alert flag, always `accumulated >= threshold`
    pub alert_active: bool,

    /// Looking fraction of the last smoothing window
    pub last_confidence: f64,

    /// Pending votes and window vote from the last frame
    pub last_vote: AttentionLabel,
    pub pending_frames: usize,

    pub statistics: SessionStatistics,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            current_state: AttentionLabel::Looking,
            accumulated_not_looking_seconds: 0.0,
            alert_active: false,
            last_confidence: 1.0,
            last_vote: AttentionLabel::Looking,
            pending_frames: 0,
            statistics: SessionStatistics::default(),
        }
    }
}

/// Owns the durable attention state and advances it once per frame
#[derive(Debug, Clone)]
pub struct AttentionStateMachine {
    state: TrackerState,
    /// Edges caused by reset/restart, delivered with the next tick
    queued_events: Vec<AttentionEvent>,
    alert_threshold_seconds: f64,
    max_tick_delta_seconds: f64,
}

impl AttentionStateMachine {
    /// Create a state machine starting in `Looking`. The config is expected
    /// to be validated already.
    pub fn new(config: &AttentionConfig) -> Self {
        Self {
            state: TrackerState::default(),
            queued_events: Vec::new(),
            alert_threshold_seconds: config.alert_threshold_seconds,
            max_tick_delta_seconds: config.max_tick_delta_seconds,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// Advance by one frame
    pub fn tick(&mut self, debounced: &DebouncedState, delta_t_seconds: f64) -> TrackerSnapshot {
        let delta = self.clamp_delta(delta_t_seconds);
        let was_alert = self.state.alert_active;
        let mut events = std::mem::take(&mut self.queued_events);

        match (self.state.current_state, debounced.label) {
            (AttentionLabel::Looking, AttentionLabel::NotLooking) => {
                // Clock starts now; this frame's delta was spent looking
                self.state.current_state = AttentionLabel::NotLooking;
                self.state.accumulated_not_looking_seconds = 0.0;
                events.push(AttentionEvent::AttentionLost);
                info!("Attention lost");
            }
            (AttentionLabel::NotLooking, AttentionLabel::Looking) => {
                self.state.current_state = AttentionLabel::Looking;
                self.state.accumulated_not_looking_seconds = 0.0;
                events.push(AttentionEvent::AttentionRegained);
                info!("Attention regained");
            }
            (AttentionLabel::NotLooking, AttentionLabel::NotLooking) => {
                self.state.accumulated_not_looking_seconds += delta;
            }
            (AttentionLabel::Looking, AttentionLabel::Looking) => {}
        }

        self.state.alert_active =
            self.state.accumulated_not_looking_seconds >= self.alert_threshold_seconds;
        match (was_alert, self.state.alert_active) {
            (false, true) => {
                warn!(
                    "Alert raised: not looking for {:.1}s",
                    self.state.accumulated_not_looking_seconds
                );
                events.push(AttentionEvent::AlertRaised);
            }
            (true, false) => events.push(AttentionEvent::AlertCleared),
            _ => {}
        }

        self.state.last_confidence = debounced.confidence;
        self.state.last_vote = debounced.vote;
        self.state.pending_frames = debounced.pending;
        self.state.statistics.record(self.state.current_state);

        let mut snapshot = self.snapshot();
        snapshot.events = events;
        snapshot
    }

    /// Clear accumulated time and the alert; the debounced state is kept.
    /// A cleared alert is reported as `AlertCleared` on the next tick.
    pub fn reset(&mut self) {
        info!(
            "Resetting away timer ({:.1}s accumulated)",
            self.state.accumulated_not_looking_seconds
        );
        if self.state.alert_active {
            self.queued_events.push(AttentionEvent::AlertCleared);
        }
        self.state.accumulated_not_looking_seconds = 0.0;
        self.state.alert_active = false;
    }

    /// Return to the initial `Looking` state, keeping session statistics.
    /// The implied edges are reported on the next tick.
    pub fn restart(&mut self) {
        if self.state.current_state == AttentionLabel::NotLooking {
            self.queued_events.push(AttentionEvent::AttentionRegained);
        }
        if self.state.alert_active {
            self.queued_events.push(AttentionEvent::AlertCleared);
        }
        let statistics = self.state.statistics;
        self.state = TrackerState {
            statistics,
            ..TrackerState::default()
        };
    }

    /// Current state, without per-frame events
    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot {
            current_state: self.state.current_state,
            accumulated_not_looking_seconds: self.state.accumulated_not_looking_seconds,
            alert_active: self.state.alert_active,
            last_confidence: self.state.last_confidence,
            alert_threshold_seconds: self.alert_threshold_seconds,
            vote: self.state.last_vote,
            pending_frames: self.state.pending_frames,
            raw_label: None,
            head_pose: None,
            events: Vec::new(),
        }
    }

    /// Negative and NaN deltas count as zero; large ones are capped
    fn clamp_delta(&self, delta: f64) -> f64 {
        let clamped = if delta.is_nan() {
            0.0
        } else {
            delta.clamp(0.0, self.max_tick_delta_seconds)
        };
        if clamped != delta {
            debug!(delta, clamped, "Clamped frame delta");
        }
        clamped
    }
}
