//! Per-frame attention classification

use head_pose::PoseSample;
use serde::{Deserialize, Serialize};

use crate::AttentionConfig;

/// Binary attention label, used both for raw per-frame classification and
/// for the debounced state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionLabel {
    #[default]
    Looking,
    NotLooking,
}

impl AttentionLabel {
    pub fn is_looking(self) -> bool {
        self == AttentionLabel::Looking
    }
}

/// Maps a pose sample to a raw label.
///
/// Implementations must return [`AttentionLabel::NotLooking`] for invalid
/// samples: absence of an estimate never counts as attentive.
pub trait Classifier {
    fn classify(&self, sample: &PoseSample) -> AttentionLabel;
}

/// Angular threshold classifier. Roll is ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdClassifier {
    yaw_threshold: f64,
    pitch_threshold: f64,
}

impl ThresholdClassifier {
    pub fn new(yaw_threshold: f64, pitch_threshold: f64) -> Self {
        Self {
            yaw_threshold,
            pitch_threshold,
        }
    }

    pub fn from_config(config: &AttentionConfig) -> Self {
        Self::new(config.yaw_threshold, config.pitch_threshold)
    }
}

impl Classifier for ThresholdClassifier {
    fn classify(&self, sample: &PoseSample) -> AttentionLabel {
        match sample {
            PoseSample::Valid(pose)
                if pose.yaw.abs() < self.yaw_threshold
                    && pose.pitch.abs() < self.pitch_threshold =>
            {
                AttentionLabel::Looking
            }
            _ => AttentionLabel::NotLooking,
        }
    }
}
