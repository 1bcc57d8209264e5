pub mod camera;
pub mod compositor;
pub mod error;
pub mod geometry;
pub mod landmark;
pub mod placement;
pub mod pump;
pub mod sprite;

// Re-export commonly used types
pub use camera::Camera;
pub use compositor::Surface;
pub use error::OverlayError;
pub use landmark::{DetectorOptions, JsonLandmarkSource, Landmark, LandmarkSet, LandmarkSource, SharedSource};
pub use placement::PlacementTransform;
pub use pump::{FrameFeed, FramePump, PumpState, StopHandle};
pub use sprite::{Category, ProductSprite};
