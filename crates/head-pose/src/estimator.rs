//! PnP head pose estimator

use nalgebra::{Matrix6, Rotation3, SMatrix, SVector, Vector3, Vector6};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::model_points;
use crate::{CameraIntrinsics, LandmarkSet, Point2, PoseError};

type Residuals = SVector<f64, 12>;
type Jacobian = SMatrix<f64, 12, 6>;

/// Relative step for central-difference derivatives
const JACOBIAN_STEP: f64 = 1e-6;
const INITIAL_DAMPING: f64 = 1e-3;
/// Damping beyond which no descent direction remains
const MAX_DAMPING: f64 = 1e10;
const GRADIENT_TOLERANCE: f64 = 1e-9;
const STEP_TOLERANCE: f64 = 1e-10;
const COST_TOLERANCE: f64 = 1e-12;
/// Relative cost improvement below which the solve has settled
const IMPROVEMENT_TOLERANCE: f64 = 1e-10;
/// Smallest/largest spread ratio below which points count as collinear
const MIN_SPREAD_RATIO: f64 = 1e-4;
/// Minimum landmark spread (px²) before points count as coincident
const MIN_SPREAD: f64 = 1e-6;
/// Below this, sqrt(R00² + R10²) is treated as gimbal lock
const SINGULAR_EPSILON: f64 = 1e-6;

/// Estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Iteration cap for the Levenberg-Marquardt solve
    pub max_iterations: usize,

    /// RMS reprojection error (pixels) above which a solve is rejected
    pub max_reprojection_error: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_reprojection_error: 20.0,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<(), PoseError> {
        if self.max_iterations == 0 {
            return Err(PoseError::Config("max_iterations must be positive".into()));
        }
        if !(self.max_reprojection_error.is_finite() && self.max_reprojection_error > 0.0) {
            return Err(PoseError::Config(format!(
                "max_reprojection_error must be positive, got {}",
                self.max_reprojection_error
            )));
        }
        Ok(())
    }
}

/// Head pose (Euler angles)
///
/// Positive yaw is a turn toward the viewer's right (image right on an
/// unmirrored camera) and positive pitch is a tilt up. In the camera-aligned
/// head frame this is R = Rz(roll) · Ry(-yaw) · Rx(-pitch).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    /// Yaw (left-right rotation) in degrees
    pub yaw: f64,
    /// Pitch (up-down tilt) in degrees
    pub pitch: f64,
    /// Roll (side tilt) in degrees
    pub roll: f64,
    /// RMS reprojection error of the solve, in pixels
    pub reprojection_error: f64,
}

/// Outcome of one pose estimate
#[derive(Debug, Clone, PartialEq)]
pub enum PoseSample {
    Valid(HeadPose),
    Invalid(PoseError),
}

impl PoseSample {
    /// Sample for a frame where no face was found
    pub fn no_face() -> Self {
        PoseSample::Invalid(PoseError::NoFace)
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, PoseSample::Valid(_))
    }

    pub fn pose(&self) -> Option<&HeadPose> {
        match self {
            PoseSample::Valid(pose) => Some(pose),
            PoseSample::Invalid(_) => None,
        }
    }
}

impl From<Result<HeadPose, PoseError>> for PoseSample {
    fn from(result: Result<HeadPose, PoseError>) -> Self {
        match result {
            Ok(pose) => PoseSample::Valid(pose),
            Err(err) => PoseSample::Invalid(err),
        }
    }
}

/// Head pose estimator using facial landmarks
#[derive(Debug, Clone)]
pub struct PoseEstimator {
    config: EstimatorConfig,
    model: [Vector3<f64>; 6],
}

impl Default for PoseEstimator {
    fn default() -> Self {
        Self {
            config: EstimatorConfig::default(),
            model: model_points(),
        }
    }
}

impl PoseEstimator {
    pub fn new(config: EstimatorConfig) -> Result<Self, PoseError> {
        config.validate()?;
        Ok(Self {
            config,
            model: model_points(),
        })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate head pose from one frame of landmarks.
    ///
    /// Never fails loudly: missing or degenerate landmarks, a diverging
    /// solve and an excessive residual all come back as
    /// [`PoseSample::Invalid`].
    pub fn estimate(&self, landmarks: &LandmarkSet, intrinsics: &CameraIntrinsics) -> PoseSample {
        let sample = PoseSample::from(self.solve(landmarks, intrinsics));
        if let PoseSample::Invalid(err) = &sample {
            debug!("Pose estimate rejected: {}", err);
        }
        sample
    }

    /// Solve for the pose, reporting why a frame was rejected
    pub fn solve(
        &self,
        landmarks: &LandmarkSet,
        intrinsics: &CameraIntrinsics,
    ) -> Result<HeadPose, PoseError> {
        let image = landmarks.points()?;
        check_spread(&image)?;

        let problem = Problem {
            model: &self.model,
            image: &image,
            intrinsics,
        };
        let (params, cost) = problem.minimize(self.config.max_iterations)?;

        let rms = (cost / image.len() as f64).sqrt();
        if rms > self.config.max_reprojection_error {
            return Err(PoseError::ResidualTooHigh {
                rms,
                tolerance: self.config.max_reprojection_error,
            });
        }

        let rotation = Rotation3::new(Vector3::new(params[0], params[1], params[2]));
        let (yaw, pitch, roll) = euler_angles(&rotation);
        // Camera frame is y-down: flip to viewer-right / tilt-up positive
        Ok(HeadPose {
            yaw: -yaw,
            pitch: -pitch,
            roll,
            reprojection_error: rms,
        })
    }
}

/// Extract (yaw, pitch, roll) in degrees from a rotation matrix, in the
/// rotation's own frame (R = Rz(roll) · Ry(yaw) · Rx(pitch))
pub fn euler_angles(rotation: &Rotation3<f64>) -> (f64, f64, f64) {
    let r = rotation.matrix();
    let sy = (r[(0, 0)] * r[(0, 0)] + r[(1, 0)] * r[(1, 0)]).sqrt();
    let yaw = (-r[(2, 0)]).atan2(sy);

    let (pitch, roll) = if sy < SINGULAR_EPSILON {
        // Gimbal lock: roll is folded into pitch
        ((-r[(1, 2)]).atan2(r[(1, 1)]), 0.0)
    } else {
        (r[(2, 1)].atan2(r[(2, 2)]), r[(1, 0)].atan2(r[(0, 0)]))
    };

    (yaw.to_degrees(), pitch.to_degrees(), roll.to_degrees())
}

/// Reject point sets whose 2D spread is coincident or collinear
fn check_spread(points: &[Point2; 6]) -> Result<(), PoseError> {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.y).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for p in points {
        let dx = p.x - mean_x;
        let dy = p.y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    sxx /= n;
    syy /= n;
    sxy /= n;

    // Eigenvalues of the 2x2 covariance
    let half_trace = (sxx + syy) / 2.0;
    let disc = (((sxx - syy) / 2.0).powi(2) + sxy * sxy).sqrt();
    let major = half_trace + disc;
    let minor = half_trace - disc;

    // Negated so an overflowed (NaN) spread is rejected too
    if !(major >= MIN_SPREAD && minor / major >= MIN_SPREAD_RATIO) {
        return Err(PoseError::DegenerateLandmarks);
    }
    Ok(())
}

/// One PnP problem instance: parameters are (rotation vector, translation)
struct Problem<'a> {
    model: &'a [Vector3<f64>; 6],
    image: &'a [Point2; 6],
    intrinsics: &'a CameraIntrinsics,
}

impl Problem<'_> {
    fn residuals(&self, params: &Vector6<f64>) -> Option<Residuals> {
        let rotation = Rotation3::new(Vector3::new(params[0], params[1], params[2]));
        let translation = Vector3::new(params[3], params[4], params[5]);

        let mut residuals = Residuals::zeros();
        for (i, (model, observed)) in self.model.iter().zip(self.image.iter()).enumerate() {
            let projected = self.intrinsics.project(&(rotation * *model + translation))?;
            residuals[2 * i] = projected.x - observed.x;
            residuals[2 * i + 1] = projected.y - observed.y;
        }
        Some(residuals)
    }

    fn jacobian(&self, params: &Vector6<f64>) -> Option<Jacobian> {
        let mut jacobian = Jacobian::zeros();
        for j in 0..6 {
            let h = JACOBIAN_STEP * params[j].abs().max(1.0);
            let mut plus = *params;
            plus[j] += h;
            let mut minus = *params;
            minus[j] -= h;

            let column = (self.residuals(&plus)? - self.residuals(&minus)?) / (2.0 * h);
            jacobian.set_column(j, &column);
        }
        Some(jacobian)
    }

    /// Frontal starting pose: zero rotation, translation from the
    /// weak-perspective scale between model and image spread.
    fn initial_guess(&self) -> Vector6<f64> {
        let n = self.image.len() as f64;
        let image_mean = self
            .image
            .iter()
            .fold((0.0, 0.0), |(x, y), p| (x + p.x / n, y + p.y / n));
        let model_mean = self.model.iter().fold(Vector3::zeros(), |acc, m| acc + *m / n);

        let image_spread = (self
            .image
            .iter()
            .map(|p| (p.x - image_mean.0).powi(2) + (p.y - image_mean.1).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();
        let model_spread = (self
            .model
            .iter()
            .map(|m| (m.x - model_mean.x).powi(2) + (m.y - model_mean.y).powi(2))
            .sum::<f64>()
            / n)
            .sqrt();

        let k = self.intrinsics;
        let focal = (k.fx + k.fy) / 2.0;
        let depth = focal * model_spread / image_spread;

        Vector6::new(
            0.0,
            0.0,
            0.0,
            (image_mean.0 - k.cx) * depth / k.fx - model_mean.x,
            (image_mean.1 - k.cy) * depth / k.fy - model_mean.y,
            depth - model_mean.z,
        )
    }

    /// Levenberg-Marquardt minimisation of squared reprojection error.
    /// Returns the parameters and the final cost (sum of squared residuals).
    fn minimize(&self, max_iterations: usize) -> Result<(Vector6<f64>, f64), PoseError> {
        let mut params = self.initial_guess();
        let mut residuals = self.residuals(&params).ok_or(PoseError::BehindCamera)?;
        let mut cost = residuals.norm_squared();
        let mut damping = INITIAL_DAMPING;

        for iteration in 0..max_iterations {
            if cost < COST_TOLERANCE {
                return Ok((params, cost));
            }

            let jacobian = self.jacobian(&params).ok_or(PoseError::BehindCamera)?;
            let jtj: Matrix6<f64> = jacobian.transpose() * jacobian;
            let gradient: Vector6<f64> = jacobian.transpose() * residuals;
            if gradient.amax() < GRADIENT_TOLERANCE {
                return Ok((params, cost));
            }

            let mut damped = jtj;
            for i in 0..6 {
                damped[(i, i)] += damping * jtj[(i, i)].max(f64::EPSILON);
            }

            let step = damped.cholesky().map(|c| c.solve(&(-gradient)));
            let candidate = step.map(|step| (params + step, step));
            let accepted = candidate.and_then(|(next, step)| {
                self.residuals(&next)
                    .map(|r| (next, step, r))
                    .filter(|(_, _, r)| r.norm_squared() < cost)
            });

            match accepted {
                Some((next, step, next_residuals)) => {
                    let next_cost = next_residuals.norm_squared();
                    let improvement = cost - next_cost;
                    params = next;
                    residuals = next_residuals;
                    cost = next_cost;
                    damping = (damping / 10.0).max(f64::EPSILON);

                    if step.norm() < STEP_TOLERANCE * (params.norm() + STEP_TOLERANCE)
                        || improvement < IMPROVEMENT_TOLERANCE * cost
                    {
                        debug!(iteration, cost, "PnP converged");
                        return Ok((params, cost));
                    }
                }
                None => {
                    damping *= 10.0;
                    if damping > MAX_DAMPING {
                        // No step reduces the cost: local minimum reached
                        return Ok((params, cost));
                    }
                }
            }
        }

        Err(PoseError::NotConverged {
            iterations: max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{synthesize_landmarks, Landmark};
    use proptest::prelude::*;

    fn intrinsics() -> CameraIntrinsics {
        CameraIntrinsics::from_image_size(640, 480).unwrap()
    }

    fn estimate(yaw: f64, pitch: f64, roll: f64) -> PoseSample {
        let k = intrinsics();
        let landmarks = synthesize_landmarks(yaw, pitch, roll, 2500.0, &k).unwrap();
        PoseEstimator::default().estimate(&landmarks, &k)
    }

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_frontal_face() {
        let sample = estimate(0.0, 0.0, 0.0);
        let pose = sample.pose().expect("frontal face should solve");
        assert_close(pose.yaw, 0.0, 0.01);
        assert_close(pose.pitch, 0.0, 0.01);
        assert_close(pose.roll, 0.0, 0.01);
        assert!(pose.reprojection_error < 1e-3);
    }

    #[test]
    fn test_recovers_yaw() {
        let pose = *estimate(30.0, 0.0, 0.0).pose().unwrap();
        assert_close(pose.yaw, 30.0, 0.1);
        assert_close(pose.pitch, 0.0, 0.1);
        assert_close(pose.roll, 0.0, 0.1);

        let mirrored = *estimate(-30.0, 0.0, 0.0).pose().unwrap();
        assert_close(mirrored.yaw, -30.0, 0.1);
    }

    #[test]
    fn test_sign_conventions_follow_the_image() {
        let k = intrinsics();
        let frontal = synthesize_landmarks(0.0, 0.0, 0.0, 2500.0, &k).unwrap();
        let nose = frontal.nose_tip.unwrap();
        let eye_mid_x = (frontal.left_eye_outer.unwrap().x + frontal.right_eye_outer.unwrap().x) / 2.0;

        // Turned toward the viewer's right: nose right of the eye midpoint
        let turned = synthesize_landmarks(25.0, 0.0, 0.0, 2500.0, &k).unwrap();
        let turned_eye_mid =
            (turned.left_eye_outer.unwrap().x + turned.right_eye_outer.unwrap().x) / 2.0;
        assert!(turned.nose_tip.unwrap().x - turned_eye_mid > nose.x - eye_mid_x);
        let pose = *PoseEstimator::default().estimate(&turned, &k).pose().unwrap();
        assert!(pose.yaw > 0.0, "yaw {}", pose.yaw);

        // Tilted up: nose closer to the eye line
        let tilted = synthesize_landmarks(0.0, 20.0, 0.0, 2500.0, &k).unwrap();
        let gap = |set: &LandmarkSet| set.nose_tip.unwrap().y - set.left_eye_outer.unwrap().y;
        assert!(gap(&tilted) < gap(&frontal));
        let pose = *PoseEstimator::default().estimate(&tilted, &k).pose().unwrap();
        assert!(pose.pitch > 0.0, "pitch {}", pose.pitch);
    }

    #[test]
    fn test_recovers_combined_rotation() {
        let pose = *estimate(20.0, -15.0, 10.0).pose().unwrap();
        assert_close(pose.yaw, 20.0, 0.1);
        assert_close(pose.pitch, -15.0, 0.1);
        assert_close(pose.roll, 10.0, 0.1);
    }

    #[test]
    fn test_off_centre_face() {
        let k = intrinsics();
        // Shift every landmark: the solver absorbs it into translation,
        // with a small perspective change in apparent rotation.
        let landmarks = synthesize_landmarks(0.0, 0.0, 0.0, 2500.0, &k).unwrap();
        let shifted = Landmark::ALL.iter().fold(landmarks.clone(), |set, &l| {
            let p = landmarks.get(l).unwrap();
            set.with(l, Point2::new(p.x + 40.0, p.y - 25.0))
        });
        let sample = PoseEstimator::default().estimate(&shifted, &k);
        let pose = sample.pose().unwrap();
        assert!(pose.yaw.abs() < 5.0 && pose.pitch.abs() < 5.0);
    }

    #[test]
    fn test_missing_landmark_is_invalid() {
        let k = intrinsics();
        let landmarks = synthesize_landmarks(0.0, 0.0, 0.0, 2500.0, &k)
            .unwrap()
            .without(Landmark::LeftMouthCorner);
        assert_eq!(
            PoseEstimator::default().estimate(&landmarks, &k),
            PoseSample::Invalid(PoseError::MissingLandmark(Landmark::LeftMouthCorner))
        );
    }

    #[test]
    fn test_collinear_landmarks_are_invalid() {
        let k = intrinsics();
        let points = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0].map(|t| Point2::new(300.0 + t, 200.0 + t));
        let sample = PoseEstimator::default().estimate(&LandmarkSet::from_points(points), &k);
        assert_eq!(sample, PoseSample::Invalid(PoseError::DegenerateLandmarks));
    }

    #[test]
    fn test_coincident_landmarks_are_invalid() {
        let k = intrinsics();
        let points = [Point2::new(320.0, 240.0); 6];
        let sample = PoseEstimator::default().estimate(&LandmarkSet::from_points(points), &k);
        assert_eq!(sample, PoseSample::Invalid(PoseError::DegenerateLandmarks));
    }

    #[test]
    fn test_overflowing_spread_is_invalid() {
        let k = intrinsics();
        let frontal = synthesize_landmarks(0.0, 0.0, 0.0, 2500.0, &k).unwrap();
        let huge = Landmark::ALL.iter().fold(frontal.clone(), |set, &l| {
            let p = frontal.get(l).unwrap();
            set.with(l, Point2::new(p.x * 1e160, p.y * 1e160))
        });
        let sample = PoseEstimator::default().estimate(&huge, &k);
        assert_eq!(sample, PoseSample::Invalid(PoseError::DegenerateLandmarks));
    }

    #[test]
    fn test_residual_tolerance_rejects_inconsistent_landmarks() {
        let k = intrinsics();
        let landmarks = synthesize_landmarks(0.0, 0.0, 0.0, 2500.0, &k).unwrap();
        let chin = landmarks.chin.unwrap();
        let distorted = landmarks.with(Landmark::Chin, Point2::new(chin.x + 3.0, chin.y));

        let strict = PoseEstimator::new(EstimatorConfig {
            max_reprojection_error: 1e-6,
            ..Default::default()
        })
        .unwrap();
        assert!(matches!(
            strict.estimate(&distorted, &k),
            PoseSample::Invalid(PoseError::ResidualTooHigh { .. })
        ));

        // The default tolerance accepts a few pixels of landmark jitter
        assert!(PoseEstimator::default().estimate(&distorted, &k).is_valid());
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(estimate(12.0, 7.0, -3.0), estimate(12.0, 7.0, -3.0));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = PoseEstimator::new(EstimatorConfig {
            max_iterations: 0,
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, PoseError::Config(_)));

        assert!(PoseEstimator::new(EstimatorConfig {
            max_reprojection_error: f64::NAN,
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_euler_angles_of_identity() {
        assert_eq!(euler_angles(&Rotation3::identity()), (0.0, 0.0, 0.0));
    }

    proptest! {
        #[test]
        fn recovers_moderate_poses(yaw in -25.0f64..25.0, pitch in -20.0f64..20.0, roll in -15.0f64..15.0) {
            let pose = *estimate(yaw, pitch, roll).pose().unwrap();
            prop_assert!((pose.yaw - yaw).abs() < 0.5);
            prop_assert!((pose.pitch - pitch).abs() < 0.5);
            prop_assert!((pose.roll - roll).abs() < 0.5);
        }
    }
}
