pub mod config;
pub mod history;
pub mod session;

// Re-export vision types for convenience
pub use facefit_vision::{
    compositor, geometry, landmark, placement, pump, Camera, Category, FramePump, OverlayError,
    ProductSprite,
};
