use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub static CONFIG_PATH: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("FACEFIT_CONFIG_PATH").unwrap_or("/usr/local/etc/facefit/config.toml"))
});

pub static TRYON_STORE_PREFIX: Lazy<&'static Path> = Lazy::new(|| {
    Path::new(option_env!("FACEFIT_TRYON_STORE_PREFIX").unwrap_or("/usr/local/etc/facefit"))
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub camera: String,
    /// Minimum spacing between live-mode detections, milliseconds.
    pub frame_interval_ms: u64,
    /// Frame cap for the uploaded-video path.
    pub max_video_frames: usize,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub refine_landmarks: bool,
    /// Mirror the live preview frame, selfie style.
    pub mirror_preview: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: "/dev/video0".to_string(),
            frame_interval_ms: 33,
            max_video_frames: 150,
            min_detection_confidence: 0.6,
            min_tracking_confidence: 0.6,
            refine_landmarks: true,
            mirror_preview: true,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = path.unwrap_or(&CONFIG_PATH);
    if !path.exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config at {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

pub fn save_config(cfg: &Config, path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(&CONFIG_PATH);
    let data = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}
