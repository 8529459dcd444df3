//! Anthropometric reference model

use nalgebra::{Rotation3, Vector3};

use crate::{CameraIntrinsics, LandmarkSet, Point2};

/// 3D reference points in [`Landmark::ALL`](crate::Landmark::ALL) order,
/// nose tip at the origin.
///
/// Expressed in the camera-aligned head frame (x right, y down, z away from
/// the camera), so the identity rotation is a face looking straight into
/// the lens.
pub const REFERENCE_MODEL: [[f64; 3]; 6] = [
    [0.0, 0.0, 0.0],        // Nose tip
    [0.0, 330.0, 65.0],     // Chin
    [-225.0, -170.0, 135.0], // Left eye outer corner
    [225.0, -170.0, 135.0],  // Right eye outer corner
    [-150.0, 150.0, 125.0],  // Left mouth corner
    [150.0, 150.0, 125.0],   // Right mouth corner
];

pub(crate) fn model_points() -> [Vector3<f64>; 6] {
    REFERENCE_MODEL.map(|[x, y, z]| Vector3::new(x, y, z))
}

/// Camera-frame rotation for a reported head pose in degrees
/// (see [`HeadPose`](crate::HeadPose) for the sign conventions).
pub(crate) fn rotation_from_degrees(yaw: f64, pitch: f64, roll: f64) -> Rotation3<f64> {
    Rotation3::from_euler_angles(-pitch.to_radians(), -yaw.to_radians(), roll.to_radians())
}

/// Project the reference model posed at (yaw, pitch, roll) degrees with the
/// nose tip `distance` model units in front of the camera on the optical
/// axis. Returns `None` if any point ends up behind the camera.
pub fn synthesize_landmarks(
    yaw: f64,
    pitch: f64,
    roll: f64,
    distance: f64,
    intrinsics: &CameraIntrinsics,
) -> Option<LandmarkSet> {
    let rotation = rotation_from_degrees(yaw, pitch, roll);
    let translation = Vector3::new(0.0, 0.0, distance);

    let mut points = [Point2::default(); 6];
    for (slot, model) in points.iter_mut().zip(model_points()) {
        *slot = intrinsics.project(&(rotation * model + translation))?;
    }
    Some(LandmarkSet::from_points(points))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontal_face_is_symmetric() {
        let k = CameraIntrinsics::from_image_size(640, 480).unwrap();
        let set = synthesize_landmarks(0.0, 0.0, 0.0, 2000.0, &k).unwrap();

        let nose = set.nose_tip.unwrap();
        assert_eq!(nose, Point2::new(320.0, 240.0));

        let left = set.left_eye_outer.unwrap();
        let right = set.right_eye_outer.unwrap();
        assert!((left.x + right.x - 640.0).abs() < 1e-9);
        assert!((left.y - right.y).abs() < 1e-9);
        // Eyes above the nose, chin below in image coordinates
        assert!(left.y < nose.y);
        assert!(set.chin.unwrap().y > nose.y);
    }

    #[test]
    fn test_positive_yaw_moves_nose_to_image_right() {
        let k = CameraIntrinsics::from_image_size(640, 480).unwrap();
        let set = synthesize_landmarks(30.0, 0.0, 0.0, 2500.0, &k).unwrap();
        let eye_mid_x = (set.left_eye_outer.unwrap().x + set.right_eye_outer.unwrap().x) / 2.0;
        assert!(set.nose_tip.unwrap().x > eye_mid_x);
    }

    #[test]
    fn test_positive_pitch_moves_nose_up() {
        let k = CameraIntrinsics::from_image_size(640, 480).unwrap();
        let gap = |pitch: f64| {
            let set = synthesize_landmarks(0.0, pitch, 0.0, 2500.0, &k).unwrap();
            set.nose_tip.unwrap().y - set.left_eye_outer.unwrap().y
        };
        // Nose-to-eye distance shrinks as the head tilts up
        assert!(gap(20.0) < gap(0.0));
        assert!(gap(-20.0) > gap(0.0));
    }

    #[test]
    fn test_behind_camera_yields_none() {
        let k = CameraIntrinsics::from_image_size(640, 480).unwrap();
        // Nose tip lands at z = -100
        assert!(synthesize_landmarks(0.0, 0.0, 0.0, -100.0, &k).is_none());
    }
}
