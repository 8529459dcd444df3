//! Screen Attention Tracking
//!
//! Decides from head pose whether a user is looking at the screen:
//! - Threshold classification of each frame's head pose
//! - Majority-vote smoothing with consecutive-frame confirmation
//! - Away-time accumulation and alerting
//!
//! One [`AttentionTracker`] is one session. It is driven by an external
//! frame loop, one [`AttentionTracker::process`] call per frame, in order.

pub mod classifier;
pub mod config;
pub mod smoother;
pub mod snapshot;
pub mod state;

pub use classifier::{AttentionLabel, Classifier, ThresholdClassifier};
pub use config::AttentionConfig;
pub use smoother::{DebouncedState, TemporalSmoother};
pub use snapshot::{AttentionEvent, Severity, TrackerSnapshot};
pub use state::{AttentionStateMachine, SessionStatistics, TrackerState};

use head_pose::{CameraIntrinsics, LandmarkSet, PoseError, PoseEstimator, PoseSample};
use ring_buffer::RingBufferError;
use thiserror::Error;
use tracing::{debug, info};

/// Attention tracking error types
#[derive(Error, Debug)]
pub enum AttentionError {
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Smoothing window: {0}")]
    Window(#[from] RingBufferError),

    #[error("Pose estimation setup failed: {0}")]
    Pose(#[from] PoseError),
}

/// Attention tracking session
pub struct AttentionTracker<C = ThresholdClassifier> {
    config: AttentionConfig,
    intrinsics: CameraIntrinsics,
    estimator: PoseEstimator,
    classifier: C,
    smoother: TemporalSmoother,
    machine: AttentionStateMachine,
}

impl AttentionTracker<ThresholdClassifier> {
    /// Create a tracker with the default estimator and threshold classifier
    pub fn new(config: AttentionConfig, intrinsics: CameraIntrinsics) -> Result<Self, AttentionError> {
        let classifier = ThresholdClassifier::from_config(&config);
        Self::with_parts(config, intrinsics, PoseEstimator::default(), classifier)
    }
}

impl<C: Classifier> AttentionTracker<C> {
    /// Create a tracker from explicit parts. Fails if the config is invalid.
    pub fn with_parts(
        config: AttentionConfig,
        intrinsics: CameraIntrinsics,
        estimator: PoseEstimator,
        classifier: C,
    ) -> Result<Self, AttentionError> {
        config.validate()?;
        info!(
            "Creating attention tracker: yaw<{}°, pitch<{}°, window={}, confirm={}, alert={}s",
            config.yaw_threshold,
            config.pitch_threshold,
            config.smoothing_window,
            config.min_consecutive_frames,
            config.alert_threshold_seconds
        );

        Ok(Self {
            smoother: TemporalSmoother::new(config.smoothing_window, config.min_consecutive_frames)?,
            machine: AttentionStateMachine::new(&config),
            config,
            intrinsics,
            estimator,
            classifier,
        })
    }

    /// Process one frame: `None` means no face was detected
    pub fn process(&mut self, landmarks: Option<&LandmarkSet>, delta_t_seconds: f64) -> TrackerSnapshot {
        let sample = match landmarks {
            Some(landmarks) => self.estimator.estimate(landmarks, &self.intrinsics),
            None => PoseSample::no_face(),
        };
        self.process_sample(&sample, delta_t_seconds)
    }

    /// Process one frame from an already estimated pose
    pub fn process_sample(&mut self, sample: &PoseSample, delta_t_seconds: f64) -> TrackerSnapshot {
        let raw = self.classifier.classify(sample);
        let debounced = self.smoother.push(raw);
        let mut snapshot = self.machine.tick(&debounced, delta_t_seconds);

        debug!(
            raw = ?raw,
            vote = ?debounced.vote,
            state = ?snapshot.current_state,
            away_s = snapshot.accumulated_not_looking_seconds,
            "Frame processed"
        );

        snapshot.raw_label = Some(raw);
        snapshot.head_pose = sample.pose().copied();
        snapshot
    }

    /// Clear accumulated away time and the alert (the debounced state is kept)
    pub fn reset(&mut self) {
        self.machine.reset();
    }

    /// Full restart: empty smoothing window, back to `Looking`, timer
    /// cleared. Session statistics are kept.
    pub fn restart(&mut self) {
        info!("Restarting attention session");
        self.smoother.reset();
        self.machine.restart();
    }

    /// Current state without per-frame detail
    pub fn snapshot(&self) -> TrackerSnapshot {
        self.machine.snapshot()
    }

    pub fn statistics(&self) -> SessionStatistics {
        self.machine.state().statistics
    }

    pub fn config(&self) -> &AttentionConfig {
        &self.config
    }

    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use head_pose::{synthesize_landmarks, HeadPose};

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::from_image_size(640, 480).unwrap()
    }

    #[test]
    fn test_invalid_config_refuses_to_start() {
        let config = AttentionConfig {
            smoothing_window: 0,
            ..Default::default()
        };
        assert!(matches!(
            AttentionTracker::new(config, intrinsics()),
            Err(AttentionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_frontal_landmarks_keep_looking() {
        let k = intrinsics();
        let landmarks = synthesize_landmarks(0.0, 0.0, 0.0, 2500.0, &k).unwrap();
        let mut tracker = AttentionTracker::new(AttentionConfig::default(), k).unwrap();

        let snapshot = tracker.process(Some(&landmarks), 0.033);
        assert_eq!(snapshot.raw_label, Some(AttentionLabel::Looking));
        assert!(snapshot.head_pose.is_some());
        assert!(snapshot.is_looking());
    }

    #[test]
    fn test_turned_head_and_missing_face_count_as_away() {
        let k = intrinsics();
        let turned = synthesize_landmarks(45.0, 0.0, 0.0, 2500.0, &k).unwrap();
        let mut tracker = AttentionTracker::new(AttentionConfig::default(), k).unwrap();

        let snapshot = tracker.process(Some(&turned), 0.033);
        assert_eq!(snapshot.raw_label, Some(AttentionLabel::NotLooking));

        let snapshot = tracker.process(None, 0.033);
        assert_eq!(snapshot.raw_label, Some(AttentionLabel::NotLooking));
        assert!(snapshot.head_pose.is_none());
    }

    struct NeverLooking;

    impl Classifier for NeverLooking {
        fn classify(&self, _sample: &PoseSample) -> AttentionLabel {
            AttentionLabel::NotLooking
        }
    }

    #[test]
    fn test_custom_classifier() {
        let config = AttentionConfig {
            smoothing_window: 1,
            min_consecutive_frames: 1,
            ..Default::default()
        };
        let mut tracker =
            AttentionTracker::with_parts(config, intrinsics(), PoseEstimator::default(), NeverLooking)
                .unwrap();

        let frontal = PoseSample::Valid(HeadPose::default());
        let snapshot = tracker.process_sample(&frontal, 0.1);
        assert_eq!(snapshot.current_state, AttentionLabel::NotLooking);
        assert_eq!(snapshot.events, vec![AttentionEvent::AttentionLost]);
    }

    #[test]
    fn test_restart_returns_to_looking() {
        let config = AttentionConfig {
            smoothing_window: 1,
            min_consecutive_frames: 1,
            ..Default::default()
        };
        let mut tracker = AttentionTracker::new(config, intrinsics()).unwrap();
        tracker.process(None, 0.1);
        tracker.process(None, 0.1);
        assert!(!tracker.snapshot().is_looking());

        tracker.restart();
        assert!(tracker.snapshot().is_looking());
        assert_eq!(tracker.statistics().total_frames, 2);
    }
}
