//! Temporal smoothing of raw labels
//!
//! Two layers: a majority vote over the last `W` raw labels removes
//! single-frame noise, and a consecutive-vote confirmation counter stops a
//! borderline vote from flickering the confirmed state.

use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};

use crate::{AttentionError, AttentionLabel};

/// Smoothed attention state after one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebouncedState {
    /// Confirmed label
    pub label: AttentionLabel,
    /// Consecutive votes disagreeing with the confirmed label
    pub pending: usize,
    /// Majority vote over the current window
    pub vote: AttentionLabel,
    /// Fraction of `Looking` labels in the window (0-1)
    pub confidence: f64,
}

impl DebouncedState {
    /// State with no pending transition and a unanimous window
    pub fn settled(label: AttentionLabel) -> Self {
        Self {
            label,
            pending: 0,
            vote: label,
            confidence: if label.is_looking() { 1.0 } else { 0.0 },
        }
    }
}

/// Majority vote plus hysteresis over a fixed window of raw labels
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    window: RingBuffer<AttentionLabel>,
    confirmed: AttentionLabel,
    pending: usize,
    min_consecutive: usize,
}

impl TemporalSmoother {
    /// Create a smoother; starts confirmed as `Looking`
    pub fn new(window_size: usize, min_consecutive: usize) -> Result<Self, AttentionError> {
        if min_consecutive == 0 {
            return Err(AttentionError::InvalidConfig(
                "min_consecutive_frames must be at least 1".into(),
            ));
        }
        Ok(Self {
            window: RingBuffer::new(window_size)?,
            confirmed: AttentionLabel::Looking,
            pending: 0,
            min_consecutive,
        })
    }

    /// Feed one raw label; must be called once per frame, in frame order
    pub fn push(&mut self, raw: AttentionLabel) -> DebouncedState {
        self.window.push(raw);

        let looking = self.window.count_where(|label| label.is_looking());
        let total = self.window.len();
        // Strict majority of the samples present; ties go to NotLooking
        let vote = if looking * 2 > total {
            AttentionLabel::Looking
        } else {
            AttentionLabel::NotLooking
        };

        if vote == self.confirmed {
            self.pending = 0;
        } else {
            self.pending += 1;
            if self.pending >= self.min_consecutive {
                self.confirmed = vote;
                self.pending = 0;
            }
        }

        DebouncedState {
            label: self.confirmed,
            pending: self.pending,
            vote,
            confidence: looking as f64 / total as f64,
        }
    }

    pub fn confirmed(&self) -> AttentionLabel {
        self.confirmed
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Number of labels currently in the window
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Clear history and return to the initial `Looking` state
    pub fn reset(&mut self) {
        self.window.clear();
        self.confirmed = AttentionLabel::Looking;
        self.pending = 0;
    }
}
