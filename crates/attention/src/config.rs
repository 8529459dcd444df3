//! Attention tracking configuration

use serde::{Deserialize, Serialize};

use crate::AttentionError;

/// Attention tracking configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    /// Yaw deviation threshold (degrees from centre)
    pub yaw_threshold: f64,

    /// Pitch deviation threshold (degrees from centre)
    pub pitch_threshold: f64,

    /// Number of frames in the majority-vote window
    pub smoothing_window: usize,

    /// Consecutive agreeing votes required to change state
    pub min_consecutive_frames: usize,

    /// Time away before the alert fires (seconds)
    pub alert_threshold_seconds: f64,

    /// Upper bound applied to a single frame's elapsed time (seconds)
    pub max_tick_delta_seconds: f64,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            yaw_threshold: 25.0,
            pitch_threshold: 20.0,
            smoothing_window: 5,
            min_consecutive_frames: 3,
            alert_threshold_seconds: 5.0,
            max_tick_delta_seconds: 1.0,
        }
    }
}

impl AttentionConfig {
    /// Create strict config (narrower cone, quicker alert)
    pub fn strict() -> Self {
        Self {
            yaw_threshold: 15.0,
            pitch_threshold: 12.0,
            alert_threshold_seconds: 3.0,
            ..Default::default()
        }
    }

    /// Create lenient config (wider cone, slower alert)
    pub fn lenient() -> Self {
        Self {
            yaw_threshold: 35.0,
            pitch_threshold: 30.0,
            alert_threshold_seconds: 10.0,
            ..Default::default()
        }
    }

    /// Check every field is usable; called once before a tracker starts
    pub fn validate(&self) -> Result<(), AttentionError> {
        positive("yaw_threshold", self.yaw_threshold)?;
        positive("pitch_threshold", self.pitch_threshold)?;
        positive("alert_threshold_seconds", self.alert_threshold_seconds)?;
        positive("max_tick_delta_seconds", self.max_tick_delta_seconds)?;

        if self.smoothing_window == 0 {
            return Err(AttentionError::InvalidConfig(
                "smoothing_window must be at least 1".into(),
            ));
        }
        if self.min_consecutive_frames == 0 {
            return Err(AttentionError::InvalidConfig(
                "min_consecutive_frames must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Worst-case frames between a sustained change and the state flip
    pub fn max_latency_frames(&self) -> usize {
        self.smoothing_window + self.min_consecutive_frames
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), AttentionError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AttentionError::InvalidConfig(format!(
            "{} must be a positive number, got {}",
            field, value
        )))
    }
}
