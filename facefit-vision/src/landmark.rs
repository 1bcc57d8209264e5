use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

/// Cardinality of a full face mesh as produced by the external detector
/// (468 base points plus 10 refined iris points).
pub const LANDMARK_COUNT: usize = 478;

/// Face mesh indices used for overlay placement.
pub mod index {
    pub const LEFT_EYE: usize = 33;
    pub const NOSE_BRIDGE: usize = 168;
    pub const LEFT_EAR: usize = 234;
    pub const RIGHT_EYE: usize = 263;
    pub const RIGHT_EAR: usize = 454;
}

/// A single detected face point, normalized to [0,1] relative to the
/// source frame. `z` is relative depth with detector-defined scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

/// The full landmark set for one face in one frame.
///
/// Produced fresh per frame and discarded with it; placement code must
/// never retain a set across frames.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index lookup that tolerates a truncated set.
    pub fn get(&self, idx: usize) -> Option<Landmark> {
        self.points.get(idx).copied()
    }
}

/// Detector configuration, mirroring the external capability's options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorOptions {
    pub max_faces: u32,
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            max_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.6,
            min_tracking_confidence: 0.6,
        }
    }
}

/// The external landmark detection capability.
///
/// `detect` submits one frame and returns its result directly: `Ok(None)`
/// means the detector ran but found no face. Implementations must accept
/// repeated `configure` calls on a live instance, because the same
/// detector is reused across try-on sessions.
pub trait LandmarkSource: Send {
    fn configure(&mut self, options: DetectorOptions) -> Result<(), OverlayError>;

    fn detect(&mut self, frame: &RgbaImage) -> Result<Option<LandmarkSet>, OverlayError>;
}

/// Shared-ownership handle to a long-lived detector instance.
pub type SharedSource = Arc<Mutex<dyn LandmarkSource>>;

pub fn shared(source: impl LandmarkSource + 'static) -> SharedSource {
    Arc::new(Mutex::new(source))
}

#[derive(Debug, Deserialize)]
struct LandmarkScript {
    /// One entry per frame; an empty point list means no face that frame.
    frames: Vec<Vec<Landmark>>,
}

/// Landmark source backed by a JSON script of per-frame landmark sets.
///
/// Stands in for the external face-mesh model: each `detect` call yields
/// the next scripted frame. With `looped` set the script wraps around,
/// which is what live mode needs.
pub struct JsonLandmarkSource {
    frames: Vec<Vec<Landmark>>,
    cursor: usize,
    looped: bool,
    options: DetectorOptions,
}

impl JsonLandmarkSource {
    pub fn from_path(path: &Path, looped: bool) -> Result<Self, OverlayError> {
        let raw = fs::read_to_string(path)?;
        let script: LandmarkScript = serde_json::from_str(&raw)
            .map_err(|e| OverlayError::DetectorInit(format!("{}: {e}", path.display())))?;
        if script.frames.is_empty() {
            return Err(OverlayError::DetectorInit(format!(
                "{}: landmark script has no frames",
                path.display()
            )));
        }
        Ok(Self {
            frames: script.frames,
            cursor: 0,
            looped,
            options: DetectorOptions::default(),
        })
    }

    pub fn from_frames(frames: Vec<Vec<Landmark>>, looped: bool) -> Self {
        Self {
            frames,
            cursor: 0,
            looped,
            options: DetectorOptions::default(),
        }
    }

    pub fn options(&self) -> DetectorOptions {
        self.options
    }
}

impl LandmarkSource for JsonLandmarkSource {
    fn configure(&mut self, options: DetectorOptions) -> Result<(), OverlayError> {
        self.options = options;
        Ok(())
    }

    fn detect(&mut self, _frame: &RgbaImage) -> Result<Option<LandmarkSet>, OverlayError> {
        if self.cursor >= self.frames.len() {
            if !self.looped {
                // Past the end of the script: behave like a lost face.
                return Ok(None);
            }
            self.cursor = 0;
        }
        let points = self.frames[self.cursor].clone();
        self.cursor += 1;
        if points.is_empty() {
            Ok(None)
        } else {
            Ok(Some(LandmarkSet::new(points)))
        }
    }
}
