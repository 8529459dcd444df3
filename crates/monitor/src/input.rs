//! Replay input records (one JSON object per line)

use head_pose::LandmarkSet;
use serde::{Deserialize, Serialize};

/// One line of a landmark stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputRecord {
    /// A captured frame. `landmarks: null` means no face was detected.
    Frame {
        timestamp: f64,
        #[serde(default)]
        landmarks: Option<LandmarkSet>,
    },
    /// Clear the away timer and alert
    Reset,
    /// Start the session over
    Restart,
}

impl InputRecord {
    /// Parse a line; blank lines and `#` comments yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>, serde_json::Error> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        serde_json::from_str(line).map(Some)
    }
}
