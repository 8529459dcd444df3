//! Facial landmark input

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::PoseError;

/// Named landmarks used for pose recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    NoseTip,
    Chin,
    LeftEyeOuter,
    RightEyeOuter,
    LeftMouthCorner,
    RightMouthCorner,
}

impl Landmark {
    /// All landmarks, in reference model order
    pub const ALL: [Landmark; 6] = [
        Landmark::NoseTip,
        Landmark::Chin,
        Landmark::LeftEyeOuter,
        Landmark::RightEyeOuter,
        Landmark::LeftMouthCorner,
        Landmark::RightMouthCorner,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Landmark::NoseTip => "nose_tip",
            Landmark::Chin => "chin",
            Landmark::LeftEyeOuter => "left_eye_outer",
            Landmark::RightEyeOuter => "right_eye_outer",
            Landmark::LeftMouthCorner => "left_mouth_corner",
            Landmark::RightMouthCorner => "right_mouth_corner",
        }
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Image-plane point in pixels (serialized as `[x, y]`)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2 {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point2> for [f64; 2] {
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}

/// One frame of detected landmarks. Any point may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandmarkSet {
    pub nose_tip: Option<Point2>,
    pub chin: Option<Point2>,
    pub left_eye_outer: Option<Point2>,
    pub right_eye_outer: Option<Point2>,
    pub left_mouth_corner: Option<Point2>,
    pub right_mouth_corner: Option<Point2>,
}

impl LandmarkSet {
    /// Build a complete set from points in [`Landmark::ALL`] order
    pub fn from_points(points: [Point2; 6]) -> Self {
        let [nose_tip, chin, left_eye_outer, right_eye_outer, left_mouth_corner, right_mouth_corner] =
            points;
        Self {
            nose_tip: Some(nose_tip),
            chin: Some(chin),
            left_eye_outer: Some(left_eye_outer),
            right_eye_outer: Some(right_eye_outer),
            left_mouth_corner: Some(left_mouth_corner),
            right_mouth_corner: Some(right_mouth_corner),
        }
    }

    pub fn get(&self, landmark: Landmark) -> Option<Point2> {
        match landmark {
            Landmark::NoseTip => self.nose_tip,
            Landmark::Chin => self.chin,
            Landmark::LeftEyeOuter => self.left_eye_outer,
            Landmark::RightEyeOuter => self.right_eye_outer,
            Landmark::LeftMouthCorner => self.left_mouth_corner,
            Landmark::RightMouthCorner => self.right_mouth_corner,
        }
    }

    fn slot_mut(&mut self, landmark: Landmark) -> &mut Option<Point2> {
        match landmark {
            Landmark::NoseTip => &mut self.nose_tip,
            Landmark::Chin => &mut self.chin,
            Landmark::LeftEyeOuter => &mut self.left_eye_outer,
            Landmark::RightEyeOuter => &mut self.right_eye_outer,
            Landmark::LeftMouthCorner => &mut self.left_mouth_corner,
            Landmark::RightMouthCorner => &mut self.right_mouth_corner,
        }
    }

    /// Copy of this set with one point replaced
    pub fn with(mut self, landmark: Landmark, point: Point2) -> Self {
        *self.slot_mut(landmark) = Some(point);
        self
    }

    /// Copy of this set with one point removed
    pub fn without(mut self, landmark: Landmark) -> Self {
        *self.slot_mut(landmark) = None;
        self
    }

    pub fn is_complete(&self) -> bool {
        Landmark::ALL.iter().all(|&l| self.get(l).is_some())
    }

    /// All six points in [`Landmark::ALL`] order, or the first problem found
    pub fn points(&self) -> Result<[Point2; 6], PoseError> {
        let mut points = [Point2::default(); 6];
        for (slot, landmark) in points.iter_mut().zip(Landmark::ALL) {
            let point = self
                .get(landmark)
                .ok_or(PoseError::MissingLandmark(landmark))?;
            if !point.is_finite() {
                return Err(PoseError::NonFiniteLandmark(landmark));
            }
            *slot = point;
        }
        Ok(points)
    }
}
