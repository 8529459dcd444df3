//! Pinhole camera model

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{Point2, PoseError};

/// Depth below which a point is treated as not in front of the camera
const MIN_DEPTH: f64 = 1e-6;

/// Camera intrinsics (zero lens distortion)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// Focal length in pixels (x)
    pub fx: f64,
    /// Focal length in pixels (y)
    pub fy: f64,
    /// Principal point (x)
    pub cx: f64,
    /// Principal point (y)
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Approximate intrinsics from the image size: focal length equals the
    /// image width, principal point at the image centre.
    pub fn from_image_size(width: u32, height: u32) -> Result<Self, PoseError> {
        if width == 0 || height == 0 {
            return Err(PoseError::InvalidIntrinsics(format!(
                "image size must be non-zero, got {}x{}",
                width, height
            )));
        }
        let focal = width as f64;
        Ok(Self {
            fx: focal,
            fy: focal,
            cx: width as f64 / 2.0,
            cy: height as f64 / 2.0,
        })
    }

    /// Project a camera-frame point to pixels. `None` if it is not in front
    /// of the camera.
    pub fn project(&self, point: &Vector3<f64>) -> Option<Point2> {
        if !(point.z > MIN_DEPTH) {
            return None;
        }
        Some(Point2::new(
            self.fx * point.x / point.z + self.cx,
            self.fy * point.y / point.z + self.cy,
        ))
    }
}
