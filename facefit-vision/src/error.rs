use std::path::PathBuf;

use thiserror::Error;

/// Session-level failures of the overlay pipeline.
///
/// Per-frame outcomes (no face detected, a required landmark missing,
/// the sprite not loaded yet) are not errors: they surface as `None` /
/// empty placement plans and the pipeline skips the overlay for that
/// frame.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("camera permission denied")]
    CameraPermissionDenied,

    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("landmark detector failed to initialize: {0}")]
    DetectorInit(String),

    #[error("landmark detection failed: {0}")]
    Detection(String),

    #[error("failed to load product sprite {path}: {reason}")]
    SpriteLoad { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
