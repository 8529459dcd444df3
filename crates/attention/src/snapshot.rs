//! Per-frame tracker output

use head_pose::HeadPose;
use serde::{Deserialize, Serialize};

use crate::AttentionLabel;

/// Edges emitted on the frame they happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionEvent {
    /// Debounced state changed to not looking
    AttentionLost,

    /// Debounced state changed back to looking
    AttentionRegained,

    /// Away time reached the alert threshold
    AlertRaised,

    /// Alert cleared (attention regained, reset or restart)
    AlertCleared,
}

/// Alert urgency, derived from progress towards the alert threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Tracker state after one frame, handed to renderers and loggers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    /// Debounced attention state
    pub current_state: AttentionLabel,

    /// Continuous time spent not looking (seconds)
    pub accumulated_not_looking_seconds: f64,

    /// Whether the away-time alert is active
    pub alert_active: bool,

    /// Fraction of `Looking` labels in the smoothing window
    pub last_confidence: f64,

    /// Alert threshold the accumulated time is measured against
    pub alert_threshold_seconds: f64,

    /// Windowed majority vote for this frame
    pub vote: AttentionLabel,

    /// Consecutive votes pending against the current state
    pub pending_frames: usize,

    /// Raw classification of this frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_label: Option<AttentionLabel>,

    /// Head pose, if this frame produced a valid estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_pose: Option<HeadPose>,

    /// Edges that happened on this frame
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<AttentionEvent>,
}

impl TrackerSnapshot {
    pub fn is_looking(&self) -> bool {
        self.current_state.is_looking()
    }

    /// Check if anything changed on this frame
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Progress towards the alert (0.0 to 1.0)
    pub fn alert_progress(&self) -> f64 {
        (self.accumulated_not_looking_seconds / self.alert_threshold_seconds).clamp(0.0, 1.0)
    }

    pub fn severity(&self) -> Severity {
        let progress = self.alert_progress();
        if self.alert_active {
            Severity::Critical
        } else if progress >= 0.8 {
            Severity::High
        } else if progress >= 0.5 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}
