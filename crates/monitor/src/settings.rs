//! Layered settings: preset defaults, optional file, `ATTENTION__*` env vars

use attention::AttentionConfig;
use config::{Config, ConfigError, Environment, File};
use head_pose::{CameraIntrinsics, EstimatorConfig, PoseError};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::args::Preset;

const ENV_PREFIX: &str = "ATTENTION";
const ENV_SEPARATOR: &str = "__";

/// Camera frame size, used to derive intrinsics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Monitor settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tracker: AttentionConfig,
    pub camera: CameraSettings,
    pub estimator: EstimatorConfig,
}

impl Settings {
    pub fn from_preset(preset: Preset) -> Self {
        let tracker = match preset {
            Preset::Default => AttentionConfig::default(),
            Preset::Strict => AttentionConfig::strict(),
            Preset::Lenient => AttentionConfig::lenient(),
        };
        Self {
            tracker,
            ..Default::default()
        }
    }

    /// Load settings from the preset, an optional file and the environment
    pub fn load(path: Option<&Path>, preset: Preset) -> Result<Self, ConfigError> {
        Self::build(path, preset, environment())
    }

    fn build(path: Option<&Path>, preset: Preset, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::from_preset(preset))?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder.add_source(env).build()?.try_deserialize()
    }

    pub fn intrinsics(&self) -> Result<CameraIntrinsics, PoseError> {
        CameraIntrinsics::from_image_size(self.camera.width, self.camera.height)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}
