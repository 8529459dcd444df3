//! Head Pose Estimation
//!
//! Recovers head orientation from a single frame of facial landmarks:
//! - Six named 2D landmarks (nose, chin, eye corners, mouth corners)
//! - Pinhole camera intrinsics derived from the image size
//! - Perspective-n-Point solve against an anthropometric reference model
//! - Euler angle extraction (yaw, pitch, roll in degrees)
//!
//! Failures never propagate as panics: the estimator reports an
//! [`PoseSample::Invalid`] and the caller decides what that means.

pub mod camera;
pub mod estimator;
pub mod landmarks;
pub mod model;

pub use camera::CameraIntrinsics;
pub use estimator::{EstimatorConfig, HeadPose, PoseEstimator, PoseSample};
pub use landmarks::{Landmark, LandmarkSet, Point2};
pub use model::{synthesize_landmarks, REFERENCE_MODEL};

use thiserror::Error;

/// Head pose error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    #[error("No face detected")]
    NoFace,

    #[error("Landmark missing: {0}")]
    MissingLandmark(Landmark),

    #[error("Landmark has non-finite coordinates: {0}")]
    NonFiniteLandmark(Landmark),

    #[error("Landmarks are degenerate (coincident or collinear)")]
    DegenerateLandmarks,

    #[error("PnP solver did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("Solved pose places the face behind the camera")]
    BehindCamera,

    #[error("Reprojection error {rms:.2}px exceeds tolerance {tolerance:.2}px")]
    ResidualTooHigh { rms: f64, tolerance: f64 },

    #[error("Invalid camera intrinsics: {0}")]
    InvalidIntrinsics(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
