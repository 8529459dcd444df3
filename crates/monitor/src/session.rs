//! Replay session: turns input records into tracker calls

use attention::{
    AttentionError, AttentionEvent, AttentionTracker, SessionStatistics, ThresholdClassifier,
    TrackerSnapshot,
};
use head_pose::PoseEstimator;
use tracing::{debug, info};

use crate::input::InputRecord;
use crate::settings::Settings;

/// Drives one tracker from a recorded or live landmark stream
pub struct ReplaySession {
    tracker: AttentionTracker,
    last_timestamp: Option<f64>,
    alerts_raised: u64,
}

impl ReplaySession {
    pub fn new(settings: &Settings) -> Result<Self, AttentionError> {
        let estimator = PoseEstimator::new(settings.estimator.clone())?;
        let classifier = ThresholdClassifier::from_config(&settings.tracker);
        let tracker = AttentionTracker::with_parts(
            settings.tracker.clone(),
            settings.intrinsics()?,
            estimator,
            classifier,
        )?;

        Ok(Self {
            tracker,
            last_timestamp: None,
            alerts_raised: 0,
        })
    }

    /// Apply one record. Frames yield a snapshot, commands yield `None`.
    ///
    /// Frame deltas come from consecutive timestamps; the first frame
    /// (and the first after a restart) gets zero.
    pub fn handle(&mut self, record: InputRecord) -> Option<TrackerSnapshot> {
        match record {
            InputRecord::Frame { timestamp, landmarks } => {
                let delta = self.last_timestamp.map_or(0.0, |previous| timestamp - previous);
                self.last_timestamp = Some(timestamp);

                let snapshot = self.tracker.process(landmarks.as_ref(), delta);
                if snapshot.events.contains(&AttentionEvent::AlertRaised) {
                    self.alerts_raised += 1;
                }
                Some(snapshot)
            }
            InputRecord::Reset => {
                debug!("Reset command");
                self.tracker.reset();
                None
            }
            InputRecord::Restart => {
                debug!("Restart command");
                self.tracker.restart();
                self.last_timestamp = None;
                None
            }
        }
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        self.tracker.snapshot()
    }

    pub fn statistics(&self) -> SessionStatistics {
        self.tracker.statistics()
    }

    pub fn alerts_raised(&self) -> u64 {
        self.alerts_raised
    }

    pub fn log_summary(&self) {
        let stats = self.statistics();
        let snapshot = self.snapshot();
        info!(
            total_frames = stats.total_frames,
            frames_looking = stats.frames_looking,
            frames_not_looking = stats.frames_not_looking,
            alerts_raised = self.alerts_raised,
            "Session summary: attention ratio {:.1}%, final state {:?}",
            stats.attention_ratio() * 100.0,
            snapshot.current_state
        );
    }
}
