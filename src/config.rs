//! Scene configuration
//!
//! One JSON file holds every tunable: atmosphere, wave and burst parameters.
//! Components own their parameters at runtime; this is just the serialized
//! form plus save/load.

use crate::fireworks::BurstTuning;
use crate::sky::SkyParams;
use crate::water::WaveParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "seafire.json";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub sky: SkyParams,
    pub water: WaveParams,
    pub bursts: BurstTuning,
}

impl SceneConfig {
    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Load config from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let json = fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&json).map_err(|e| e.to_string())
    }
}
